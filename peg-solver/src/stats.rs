//! Search statistics and progress logging.

use std::time::Instant;

use tracing::info;

/// Get current process memory usage in bytes (RSS - Resident Set Size).
/// Returns None if unable to determine.
#[cfg(target_os = "macos")]
pub fn get_memory_usage() -> Option<u64> {
    use std::mem::MaybeUninit;

    extern "C" {
        fn mach_task_self() -> u32;
        fn task_info(
            target_task: u32,
            flavor: i32,
            task_info_out: *mut libc::c_void,
            task_info_out_cnt: *mut u32,
        ) -> i32;
    }

    #[repr(C)]
    struct TaskBasicInfo {
        suspend_count: i32,
        virtual_size: u64,
        resident_size: u64,
        user_time: (i32, i32),
        system_time: (i32, i32),
        policy: i32,
    }

    const TASK_BASIC_INFO_64: i32 = 5;
    const TASK_BASIC_INFO_64_COUNT: u32 = 10;

    unsafe {
        let mut info = MaybeUninit::<TaskBasicInfo>::uninit();
        let mut count = TASK_BASIC_INFO_64_COUNT;
        let result = task_info(
            mach_task_self(),
            TASK_BASIC_INFO_64,
            info.as_mut_ptr() as *mut libc::c_void,
            &mut count,
        );
        if result == 0 {
            Some(info.assume_init().resident_size)
        } else {
            None
        }
    }
}

#[cfg(target_os = "linux")]
pub fn get_memory_usage() -> Option<u64> {
    let status = std::fs::read_to_string("/proc/self/status").ok()?;
    let line = status.lines().find(|l| l.starts_with("VmRSS:"))?;
    let kb: u64 = line.split_whitespace().nth(1)?.parse().ok()?;
    Some(kb * 1024)
}

#[cfg(not(any(target_os = "macos", target_os = "linux")))]
pub fn get_memory_usage() -> Option<u64> {
    None
}

/// Format bytes as human-readable string.
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// A snapshot of the scheduler for a progress line.
#[derive(Debug, Clone, Copy, Default)]
pub struct Progress {
    pub frontier: usize,
    /// Fewest and most pegs among frontier states
    pub peg_range: Option<(u32, u32)>,
    pub seen: usize,
    pub best_count: u32,
    pub best_iou: f64,
}

/// Counters kept by the scheduler.
#[derive(Debug, Default)]
pub struct SearchStats {
    /// States popped from the frontier
    pub moves_evaluated: u64,

    /// Successors discarded, pruned or already seen
    pub moves_skipped: u64,

    /// Successors rejected by the pruning checks (this session only)
    pub pruned: u64,

    /// Successors already in the seen-set (this session only)
    pub duplicates: u64,

    /// Popped states with no accepted successor
    pub dead_ends: u64,

    start_time: Option<Instant>,
    last_log_time: Option<Instant>,
    last_log_evaluated: u64,
}

impl SearchStats {
    pub fn new() -> Self {
        Self {
            start_time: Some(Instant::now()),
            last_log_time: Some(Instant::now()),
            ..Default::default()
        }
    }

    /// Counters carried over from a checkpoint.
    pub fn resumed(moves_evaluated: u64, moves_skipped: u64) -> Self {
        Self {
            moves_evaluated,
            moves_skipped,
            last_log_evaluated: moves_evaluated,
            ..Self::new()
        }
    }

    pub fn record_pruned(&mut self) {
        self.pruned += 1;
        self.moves_skipped += 1;
    }

    pub fn record_duplicate(&mut self) {
        self.duplicates += 1;
        self.moves_skipped += 1;
    }

    /// States evaluated per second since this session started.
    pub fn evaluated_per_sec(&self, since_start: u64) -> f64 {
        match self.start_time {
            Some(start) => {
                let elapsed = start.elapsed().as_secs_f64();
                if elapsed > 0.0 {
                    since_start as f64 / elapsed
                } else {
                    0.0
                }
            }
            None => 0.0,
        }
    }

    /// Check if we should log progress
    pub fn should_log(&self, interval_secs: u64) -> bool {
        match self.last_log_time {
            Some(last) => last.elapsed().as_secs() >= interval_secs,
            None => true,
        }
    }

    /// Log progress and reset log timer
    pub fn log_progress(&mut self, progress: &Progress) {
        let now = Instant::now();
        let elapsed_total = self.start_time.map(|s| s.elapsed().as_secs()).unwrap_or(0);

        let rate = match self.last_log_time {
            Some(last) => {
                let elapsed = last.elapsed().as_secs_f64();
                let evaluated = self.moves_evaluated - self.last_log_evaluated;
                if elapsed > 0.0 {
                    evaluated as f64 / elapsed
                } else {
                    0.0
                }
            }
            None => 0.0,
        };

        let (min_pegs, max_pegs) = progress.peg_range.unwrap_or((0, 0));
        let mem = get_memory_usage().map(format_bytes).unwrap_or_else(|| "?".into());

        info!(
            event = "progress",
            elapsed = %format!(
                "{:02}:{:02}:{:02}",
                elapsed_total / 3600,
                (elapsed_total % 3600) / 60,
                elapsed_total % 60
            ),
            evaluated = self.moves_evaluated,
            skipped = self.moves_skipped,
            frontier = progress.frontier,
            min_pegs,
            max_pegs,
            seen = progress.seen,
            best_pegs = progress.best_count,
            best_iou = %format!("{:.3}", progress.best_iou),
            rate = %format!("{:.0}/s", rate),
            mem = %mem,
        );

        self.last_log_time = Some(now);
        self.last_log_evaluated = self.moves_evaluated;
    }

    /// Log final summary
    pub fn log_summary(&self, session_evaluated: u64) {
        let elapsed = self.start_time.map(|s| s.elapsed().as_secs_f64()).unwrap_or(0.0);
        info!(
            event = "summary",
            evaluated = self.moves_evaluated,
            skipped = self.moves_skipped,
            pruned = self.pruned,
            duplicates = self.duplicates,
            dead_ends = self.dead_ends,
            seconds = %format!("{:.2}", elapsed),
            rate = %format!("{:.0}/s", self.evaluated_per_sec(session_evaluated)),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KB");
        assert_eq!(format_bytes(3 * 1024 * 1024), "3.0 MB");
        assert_eq!(format_bytes(5 * 1024 * 1024 * 1024), "5.00 GB");
    }

    #[test]
    fn test_skip_counters() {
        let mut stats = SearchStats::resumed(10, 4);
        stats.record_pruned();
        stats.record_duplicate();
        stats.record_duplicate();
        assert_eq!(stats.moves_skipped, 7);
        assert_eq!(stats.pruned, 1);
        assert_eq!(stats.duplicates, 2);
        assert_eq!(stats.moves_evaluated, 10);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_memory_usage_linux() {
        assert!(get_memory_usage().unwrap() > 0);
    }
}
