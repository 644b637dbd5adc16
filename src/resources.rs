use std::time::Instant;

use serde::Serialize;

/// Point-in-time process resource usage, reported by the stats endpoint and
/// the detailed health probe.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceSnapshot {
    /// Resident set size; `None` on platforms without `/proc`.
    pub memory_rss_bytes: Option<u64>,
    pub uptime_secs: u64,
}

pub fn snapshot(started_at: Instant) -> ResourceSnapshot {
    ResourceSnapshot {
        memory_rss_bytes: resident_set_bytes(),
        uptime_secs: started_at.elapsed().as_secs(),
    }
}

#[cfg(target_os = "linux")]
fn resident_set_bytes() -> Option<u64> {
    // Second field of /proc/self/statm is the resident page count.
    let statm = std::fs::read_to_string("/proc/self/statm").ok()?;
    let pages: u64 = statm.split_whitespace().nth(1)?.parse().ok()?;
    let page_size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    if page_size <= 0 {
        return None;
    }
    Some(pages * page_size as u64)
}

#[cfg(not(target_os = "linux"))]
fn resident_set_bytes() -> Option<u64> {
    None
}
