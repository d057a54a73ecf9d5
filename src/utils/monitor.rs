use std::sync::Mutex;
use std::time::{Duration, Instant};
#[cfg(feature = "cli")]
use sysinfo::{Pid, ProcessesToUpdate, System};

#[derive(Debug, Clone)]
pub struct PhaseStats {
    pub phase: String,
    pub elapsed: Duration,
    pub memory_mb: Option<u64>,
}

/// Logs wall time per pipeline phase, plus process memory/CPU when the `cli`
/// feature is on and monitoring was requested.
pub struct RunMonitor {
    #[cfg(feature = "cli")]
    system: Option<Mutex<System>>,
    #[cfg(feature = "cli")]
    pid: Option<Pid>,
    start_time: Instant,
    last_mark: Mutex<Instant>,
    peak_memory_mb: Mutex<u64>,
    enabled: bool,
}

impl RunMonitor {
    pub fn new(enabled: bool) -> Self {
        let now = Instant::now();
        Self {
            #[cfg(feature = "cli")]
            system: enabled.then(|| Mutex::new(System::new_all())),
            #[cfg(feature = "cli")]
            pid: sysinfo::get_current_pid().ok(),
            start_time: now,
            last_mark: Mutex::new(now),
            peak_memory_mb: Mutex::new(0),
            enabled,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    #[cfg(feature = "cli")]
    fn sample(&self) -> Option<(u64, f32)> {
        let pid = self.pid?;
        let mut system = self.system.as_ref()?.lock().ok()?;
        system.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);
        let process = system.process(pid)?;
        Some((process.memory() / 1024 / 1024, process.cpu_usage()))
    }

    #[cfg(not(feature = "cli"))]
    fn sample(&self) -> Option<(u64, f32)> {
        None
    }

    /// 記錄一個階段結束，回傳自上次標記以來的耗時
    pub fn mark(&self, phase: &str) -> PhaseStats {
        let now = Instant::now();
        let elapsed = match self.last_mark.lock() {
            Ok(mut last) => {
                let elapsed = now.duration_since(*last);
                *last = now;
                elapsed
            }
            Err(_) => Duration::ZERO,
        };

        let sample = if self.enabled { self.sample() } else { None };
        if let Some((memory_mb, cpu)) = sample {
            if let Ok(mut peak) = self.peak_memory_mb.lock() {
                *peak = (*peak).max(memory_mb);
            }
            tracing::info!(
                "📊 {} - {:?}, CPU: {:.1}%, Memory: {}MB",
                phase,
                elapsed,
                cpu,
                memory_mb
            );
        } else {
            tracing::debug!("⏱️ {} finished in {:?}", phase, elapsed);
        }

        PhaseStats {
            phase: phase.to_string(),
            elapsed,
            memory_mb: sample.map(|(memory, _)| memory),
        }
    }

    pub fn log_final_stats(&self) {
        if !self.enabled {
            return;
        }
        let peak = self.peak_memory_mb.lock().map(|p| *p).unwrap_or(0);
        tracing::info!(
            "📊 Final Stats - Total Time: {:?}, Peak Memory: {}MB",
            self.start_time.elapsed(),
            peak
        );
    }
}

impl Default for RunMonitor {
    fn default() -> Self {
        Self::new(false)
    }
}
