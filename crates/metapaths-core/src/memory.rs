//! Injected memory probe for progress reporting.
//!
//! Profiling and long enumerations report resident memory alongside
//! progress. The probe is a capability with a single method so it stays
//! portable and mockable; the Linux implementation reads
//! `/proc/self/statm`, everywhere else the no-op probe reports nothing.

pub trait MemoryProbe {
    /// Current resident set size in bytes, if the platform can tell.
    fn resident_bytes(&self) -> Option<u64>;

    /// Resident set size in whole megabytes, for log lines.
    fn resident_mb(&self) -> Option<u64> {
        self.resident_bytes().map(|b| b / (1024 * 1024))
    }
}

/// Probe that never reports; used in tests and on unsupported platforms.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopProbe;

impl MemoryProbe for NoopProbe {
    fn resident_bytes(&self) -> Option<u64> {
        None
    }
}

#[cfg(target_os = "linux")]
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcStatmProbe;

#[cfg(target_os = "linux")]
impl MemoryProbe for ProcStatmProbe {
    fn resident_bytes(&self) -> Option<u64> {
        let statm = std::fs::read_to_string("/proc/self/statm").ok()?;
        let resident_pages: u64 = statm.split_whitespace().nth(1)?.parse().ok()?;
        Some(resident_pages * page_size())
    }
}

#[cfg(target_os = "linux")]
fn page_size() -> u64 {
    // The kernel exports statm in pages; 4 KiB everywhere we deploy.
    4096
}

/// The best probe available on this platform.
pub fn default_probe() -> Box<dyn MemoryProbe> {
    #[cfg(target_os = "linux")]
    {
        Box::new(ProcStatmProbe)
    }
    #[cfg(not(target_os = "linux"))]
    {
        Box::new(NoopProbe)
    }
}
