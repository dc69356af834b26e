//! Echo-train summary parsing
//!
//! `ping -q` ends with a loss line and an rtt line:
//!
//! ```text
//! 100 packets transmitted, 100 received, 0% packet loss, time 4951ms
//! rtt min/avg/max/mdev = 0.123/0.456/0.789/0.012 ms
//! ```
//!
//! BSD and macOS builds print `round-trip min/avg/max/stddev` instead.

use crate::models::ProbeStats;
use regex::Regex;
use std::sync::LazyLock;

static RTT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?m)(?:rtt|round-trip)\s+min/avg/max/(?:mdev|stddev)\s*=\s*([0-9]+(?:\.[0-9]+)?)/([0-9]+(?:\.[0-9]+)?)/([0-9]+(?:\.[0-9]+)?)/([0-9]+(?:\.[0-9]+)?)\s*ms",
    )
    .unwrap()
});

static LOSS_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([0-9]+(?:\.[0-9]+)?)%\s+packet\s+loss").unwrap());

/// Extract latency statistics from raw echo-train output.
///
/// Returns `None` when the rtt summary line is absent or malformed. A missing
/// loss line is read as 0% loss.
pub fn parse_ping_summary(output: &str) -> Option<ProbeStats> {
    let caps = RTT_PATTERN.captures(output)?;

    let field = |i: usize| -> Option<f64> { caps.get(i)?.as_str().parse::<f64>().ok() };
    let min_ms = field(1)?;
    let avg_ms = field(2)?;
    let max_ms = field(3)?;
    let mdev_ms = field(4)?;

    let packet_loss_pct = LOSS_PATTERN
        .captures(output)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .unwrap_or(0.0);

    Some(ProbeStats {
        min_ms,
        avg_ms,
        max_ms,
        mdev_ms,
        packet_loss_pct,
    })
}

/// At most `limit` characters of `output`, cut on a char boundary
pub fn truncate_output(output: &str, limit: usize) -> String {
    output.chars().take(limit).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const LINUX_OUTPUT: &str = "PING 10.0.2.10 (10.0.2.10) 56(84) bytes of data.\n\n\
        --- 10.0.2.10 ping statistics ---\n\
        100 packets transmitted, 98 received, 2% packet loss, time 4951ms\n\
        rtt min/avg/max/mdev = 0.123/0.456/0.789/0.012 ms\n";

    #[test]
    fn test_parse_linux_summary() {
        let stats = parse_ping_summary(LINUX_OUTPUT).unwrap();
        assert_eq!(stats.min_ms, 0.123);
        assert_eq!(stats.avg_ms, 0.456);
        assert_eq!(stats.max_ms, 0.789);
        assert_eq!(stats.mdev_ms, 0.012);
        assert_eq!(stats.packet_loss_pct, 2.0);
    }

    #[test]
    fn test_parse_bare_rtt_line() {
        let stats = parse_ping_summary("rtt min/avg/max/mdev = 0.123/0.456/0.789/0.012 ms").unwrap();
        assert_eq!(stats.avg_ms, 0.456);
        assert_eq!(stats.packet_loss_pct, 0.0);
    }

    #[test]
    fn test_parse_bsd_summary() {
        let output = "--- 10.0.0.5 ping statistics ---\n\
            5 packets transmitted, 5 packets received, 0.0% packet loss\n\
            round-trip min/avg/max/stddev = 1.101/1.250/1.402/0.105 ms\n";
        let stats = parse_ping_summary(output).unwrap();
        assert_eq!(stats.min_ms, 1.101);
        assert_eq!(stats.mdev_ms, 0.105);
        assert_eq!(stats.packet_loss_pct, 0.0);
    }

    #[test]
    fn test_missing_rtt_segment() {
        assert!(parse_ping_summary("min/avg/max/mdev = 0.123/0.456/0.789/0.012 ms").is_none());
        assert!(parse_ping_summary("100 packets transmitted, 0 received, 100% packet loss").is_none());
        assert!(parse_ping_summary("").is_none());
    }

    #[test]
    fn test_malformed_values() {
        assert!(parse_ping_summary("rtt min/avg/max/mdev = 0.123/abc/0.789/0.012 ms").is_none());
        assert!(parse_ping_summary("rtt min/avg/max/mdev = 0.123/0.456/0.789 ms").is_none());
    }

    #[test]
    fn test_truncate_is_char_safe() {
        let text = "é".repeat(600);
        let cut = truncate_output(&text, 500);
        assert_eq!(cut.chars().count(), 500);
        assert_eq!(truncate_output("short", 500), "short");
    }
}
