//! Remote probe execution
//!
//! One probe runs a fixed-count ICMP echo train from a pair's source node to
//! the target's private address and turns whatever happens into exactly one
//! [`Measurement`]. Nothing here returns an error to the caller.

pub mod parser;
pub mod ssh;

pub use parser::{parse_ping_summary, truncate_output};
pub use ssh::{CommandOutput, RemoteChannel, SshChannel};

use crate::{
    defaults::{DEFAULT_SSH_USERS, FALLBACK_SSH_USER, PARSE_DETAIL_LIMIT},
    error::AppError,
    models::{Config, Measurement, Node, Pair},
    types::ProbeErrorKind,
};
use async_trait::async_trait;
use std::time::Duration;
use tokio::time::timeout;

/// Produces one terminal measurement per pair
#[async_trait]
pub trait ProbeExecutor: Send + Sync {
    async fn probe(&self, pair: &Pair) -> Measurement;
}

/// Parameters shared by every probe of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeSettings {
    pub probe_count: u32,
    pub interval: Duration,
    /// Upper bound on channel setup plus the whole echo train
    pub timeout: Duration,
    pub ssh_user: Option<String>,
}

impl From<&Config> for ProbeSettings {
    fn from(config: &Config) -> Self {
        Self {
            probe_count: config.ping_count,
            interval: config.probe_interval(),
            timeout: config.probe_timeout(),
            ssh_user: config.ssh_user.clone(),
        }
    }
}

impl ProbeSettings {
    /// Echo-train command aimed at `target`
    pub fn ping_command(&self, target: &str) -> String {
        format!(
            "ping -c {} -i {} -q {}",
            self.probe_count,
            format_interval(self.interval),
            target
        )
    }
}

/// Seconds with up to three decimals and no trailing zeros (`50ms` → `0.05`)
fn format_interval(interval: Duration) -> String {
    let formatted = format!("{:.3}", interval.as_secs_f64());
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    if trimmed.is_empty() || trimmed == "0" {
        "0.001".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Login user for a source node: explicit override, else per-cloud default
pub fn ssh_user_for(node: &Node, override_user: Option<&str>) -> String {
    if let Some(user) = override_user {
        return user.to_string();
    }

    let cloud = node.cloud_or_default();
    DEFAULT_SSH_USERS
        .iter()
        .find(|(name, _)| *name == cloud)
        .map(|(_, user)| *user)
        .unwrap_or(FALLBACK_SSH_USER)
        .to_string()
}

/// [`ProbeExecutor`] that runs `ping` on the source node through a [`RemoteChannel`]
pub struct RemoteProbeExecutor<C> {
    channel: C,
    settings: ProbeSettings,
}

impl<C: RemoteChannel> RemoteProbeExecutor<C> {
    pub fn new(channel: C, settings: ProbeSettings) -> Self {
        Self { channel, settings }
    }

    pub fn settings(&self) -> &ProbeSettings {
        &self.settings
    }
}

#[async_trait]
impl<C: RemoteChannel> ProbeExecutor for RemoteProbeExecutor<C> {
    async fn probe(&self, pair: &Pair) -> Measurement {
        // Planning never emits these; kept representable.
        if pair.source.az_id == pair.target.az_id {
            return Measurement::skip(pair, "same_az");
        }

        let Some(host) = pair.source.public_address.as_deref() else {
            return Measurement::error(
                pair,
                ProbeErrorKind::ProbeFailed,
                Some(format!("source node '{}' has no public address", pair.source.id)),
            );
        };

        let user = ssh_user_for(&pair.source, self.settings.ssh_user.as_deref());
        let command = self.settings.ping_command(&pair.target.private_address);

        let outcome = timeout(self.settings.timeout, self.channel.execute(host, &user, &command)).await;

        match outcome {
            Err(_) => Measurement::error(
                pair,
                ProbeErrorKind::Timeout,
                Some(format!("no complete answer within {}s", self.settings.timeout.as_secs())),
            ),
            Ok(Err(AppError::Timeout(msg))) => Measurement::error(pair, ProbeErrorKind::Timeout, Some(msg)),
            Ok(Err(e)) => Measurement::error(pair, ProbeErrorKind::ProbeFailed, Some(e.to_string())),
            Ok(Ok(output)) if !output.success() => {
                Measurement::error(pair, ProbeErrorKind::ProbeFailed, Some(describe_failure(&output)))
            }
            Ok(Ok(output)) => match parse_ping_summary(&output.stdout) {
                Some(stats) => Measurement::result(pair, stats, self.settings.probe_count),
                None => Measurement::error(
                    pair,
                    ProbeErrorKind::ParseFailed,
                    Some(truncate_output(&output.stdout, PARSE_DETAIL_LIMIT)),
                ),
            },
        }
    }
}

fn describe_failure(output: &CommandOutput) -> String {
    let status = match output.exit_code {
        Some(code) => format!("exit status {}", code),
        None => "terminated by signal".to_string(),
    };

    let stderr = output.stderr.trim();
    if stderr.is_empty() {
        status
    } else {
        format!("{}: {}", status, truncate_output(stderr, PARSE_DETAIL_LIMIT))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::models::node::fixtures::node;
    use crate::types::MeasurementKind;
    use std::sync::Mutex;

    /// Channel returning a canned outcome and recording what it was asked to run
    struct ScriptedChannel {
        outcome: fn() -> Result<CommandOutput>,
        delay: Duration,
        calls: Mutex<Vec<(String, String, String)>>,
    }

    impl ScriptedChannel {
        fn new(outcome: fn() -> Result<CommandOutput>) -> Self {
            Self { outcome, delay: Duration::ZERO, calls: Mutex::new(Vec::new()) }
        }

        fn slow(outcome: fn() -> Result<CommandOutput>, delay: Duration) -> Self {
            Self { delay, ..Self::new(outcome) }
        }
    }

    #[async_trait]
    impl RemoteChannel for ScriptedChannel {
        async fn execute(&self, host: &str, user: &str, command: &str) -> Result<CommandOutput> {
            self.calls
                .lock()
                .unwrap()
                .push((host.to_string(), user.to_string(), command.to_string()));
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            (self.outcome)()
        }
    }

    fn settings() -> ProbeSettings {
        ProbeSettings {
            probe_count: 100,
            interval: Duration::from_millis(50),
            timeout: Duration::from_secs(60),
            ssh_user: None,
        }
    }

    fn pair() -> Pair {
        Pair::new("us-east-1", node("us-east-1", "use1-az1"), node("us-east-1", "use1-az2"))
    }

    fn ok_output() -> Result<CommandOutput> {
        Ok(CommandOutput {
            exit_code: Some(0),
            stdout: "100 packets transmitted, 100 received, 0% packet loss, time 4950ms\n\
                     rtt min/avg/max/mdev = 0.123/0.456/0.789/0.012 ms\n"
                .to_string(),
            stderr: String::new(),
        })
    }

    #[tokio::test]
    async fn test_successful_probe() {
        let executor = RemoteProbeExecutor::new(ScriptedChannel::new(ok_output), settings());
        let m = executor.probe(&pair()).await;

        let result = m.as_result().unwrap();
        assert_eq!(result.avg_ms, 0.456);
        assert_eq!(result.probe_count, 100);
        assert_eq!(result.target_address, pair().target.private_address);

        let calls = executor.channel.calls.lock().unwrap();
        let (host, user, command) = &calls[0];
        assert_eq!(host, pair().source.public_address.as_deref().unwrap());
        assert_eq!(user, "ec2-user");
        assert_eq!(command, &format!("ping -c 100 -i 0.05 -q {}", pair().target.private_address));
    }

    #[tokio::test]
    async fn test_unparseable_output() {
        fn garbage() -> Result<CommandOutput> {
            Ok(CommandOutput { exit_code: Some(0), stdout: "x".repeat(900), stderr: String::new() })
        }
        let executor = RemoteProbeExecutor::new(ScriptedChannel::new(garbage), settings());
        let m = executor.probe(&pair()).await;

        assert_eq!(m.error_kind(), Some(ProbeErrorKind::ParseFailed));
        if let Measurement::Error(e) = m {
            assert_eq!(e.detail.unwrap().len(), 500);
        }
    }

    #[tokio::test]
    async fn test_non_zero_exit_is_probe_failed() {
        fn refused() -> Result<CommandOutput> {
            Ok(CommandOutput {
                exit_code: Some(255),
                stdout: String::new(),
                stderr: "ssh: connect to host 3.80.1.2 port 22: Connection refused\n".to_string(),
            })
        }
        let executor = RemoteProbeExecutor::new(ScriptedChannel::new(refused), settings());
        let m = executor.probe(&pair()).await;

        assert_eq!(m.error_kind(), Some(ProbeErrorKind::ProbeFailed));
        if let Measurement::Error(e) = m {
            assert!(e.detail.unwrap().contains("Connection refused"));
        }
    }

    #[tokio::test]
    async fn test_channel_error_is_probe_failed() {
        fn broken() -> Result<CommandOutput> {
            Err(AppError::remote("failed to start ssh"))
        }
        let executor = RemoteProbeExecutor::new(ScriptedChannel::new(broken), settings());
        assert_eq!(executor.probe(&pair()).await.error_kind(), Some(ProbeErrorKind::ProbeFailed));
    }

    #[tokio::test]
    async fn test_connect_timeout_is_timeout() {
        fn timed_out() -> Result<CommandOutput> {
            Err(AppError::timeout("connection timed out"))
        }
        let executor = RemoteProbeExecutor::new(ScriptedChannel::new(timed_out), settings());
        assert_eq!(executor.probe(&pair()).await.error_kind(), Some(ProbeErrorKind::Timeout));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_channel_is_bounded_by_timeout() {
        let mut settings = settings();
        settings.timeout = Duration::from_secs(2);
        let executor = RemoteProbeExecutor::new(
            ScriptedChannel::slow(ok_output, Duration::from_secs(3600)),
            settings,
        );

        let started = tokio::time::Instant::now();
        let m = executor.probe(&pair()).await;
        assert_eq!(m.error_kind(), Some(ProbeErrorKind::Timeout));
        assert!(started.elapsed() < Duration::from_secs(3));
    }

    #[tokio::test]
    async fn test_same_az_is_skipped_without_dialing() {
        let executor = RemoteProbeExecutor::new(ScriptedChannel::new(ok_output), settings());
        let same = Pair::new("r", node("r", "az-a"), node("r", "az-a"));
        let m = executor.probe(&same).await;

        assert_eq!(m.kind(), MeasurementKind::Skip);
        assert!(executor.channel.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_public_address_is_probe_failed() {
        let executor = RemoteProbeExecutor::new(ScriptedChannel::new(ok_output), settings());
        let mut p = pair();
        p.source.public_address = None;
        assert_eq!(executor.probe(&p).await.error_kind(), Some(ProbeErrorKind::ProbeFailed));
    }

    #[test]
    fn test_ssh_user_selection() {
        let mut n = node("r", "a");
        assert_eq!(ssh_user_for(&n, None), "ec2-user");
        n.cloud = Some("azure".to_string());
        assert_eq!(ssh_user_for(&n, None), "azureuser");
        n.cloud = Some("gcp".to_string());
        assert_eq!(ssh_user_for(&n, None), "ec2-user");
        assert_eq!(ssh_user_for(&n, Some("admin")), "admin");
    }

    #[test]
    fn test_interval_formatting() {
        assert_eq!(format_interval(Duration::from_millis(50)), "0.05");
        assert_eq!(format_interval(Duration::from_millis(200)), "0.2");
        assert_eq!(format_interval(Duration::from_secs(1)), "1");
        assert_eq!(format_interval(Duration::from_micros(10)), "0.001");
    }
}
