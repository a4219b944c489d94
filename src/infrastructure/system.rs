//! Host resource detection used to size default caches.

/// Fallback memory value when detection fails (8 GiB).
const FALLBACK_MEMORY: u64 = 8 * 1024 * 1024 * 1024;

/// Detects total system memory in bytes.
///
/// Parses `MemTotal` from `/proc/meminfo` on Linux; other platforms use an
/// 8 GiB fallback.
#[cfg(target_os = "linux")]
#[must_use]
pub fn detect_total_memory() -> u64 {
    std::fs::read_to_string("/proc/meminfo")
        .ok()
        .and_then(|content| parse_meminfo(&content))
        .unwrap_or(FALLBACK_MEMORY)
}

/// Detects total system memory in bytes.
#[cfg(not(target_os = "linux"))]
#[must_use]
pub fn detect_total_memory() -> u64 {
    FALLBACK_MEMORY
}

/// Extracts `MemTotal` (reported in kB) as bytes.
#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
fn parse_meminfo(content: &str) -> Option<u64> {
    content
        .lines()
        .find(|line| line.starts_with("MemTotal:"))
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|kb| kb.parse::<u64>().ok())
        .map(|kb| kb * 1024)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_total_memory_returns_positive() {
        assert!(detect_total_memory() > 0);
    }

    #[test]
    fn test_parse_meminfo() {
        let content = "MemTotal:       16384000 kB\nMemFree:         1024 kB\n";
        assert_eq!(parse_meminfo(content), Some(16_384_000 * 1024));
        assert_eq!(parse_meminfo("MemFree: 12 kB"), None);
    }
}
