//! Scripted terminal sequences and the admin console command set.
//!
//! Sequences are theatre: fixed lines on a timer. The only behavior that matters is
//! that cancellation (the view going away) stops them cleanly.

use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::Rng;
use tokio_util::sync::CancellationToken;

use crate::config::Pacing;
use crate::models::SiteConfig;

pub const UPLINK_LINES: [&str; 6] = [
    "> INITIALIZING SECURE UPLINK...",
    "> HANDSHAKE PROTOCOL: ESTABLISHED",
    "> VERIFYING CLEARANCE LEVEL 5...",
    "> DECRYPTING VISUAL ASSETS...",
    "> BYPASSING FIREWALL [██████████] 100%",
    "> ACCESS GRANTED.",
];

pub const ADMIN_VERIFICATION_LINES: [&str; 4] = [
    "INITIATING HANDSHAKE...",
    "VERIFYING BIOMETRICS...",
    "DECRYPTING KEY...",
    "CHECKING CLEARANCE LEVEL...",
];

pub const ADMIN_GRANTED_LINE: &str = "ACCESS GRANTED.";
pub const ADMIN_DENIED_LINE: &str = "ACCESS DENIED: INVALID KEY";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceOutcome {
    Granted,
    Denied,
    Cancelled,
}

/// Sleep unless cancelled first. Returns false on cancellation.
async fn pause(delay: Duration, cancel: &CancellationToken) -> bool {
    tokio::select! {
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(delay) => true,
    }
}

fn jittered(base: Duration, jitter: Duration) -> Duration {
    let max = jitter.as_millis() as u64;
    if max == 0 {
        return base;
    }
    let extra = rand::rng().random_range(0..max);
    base + Duration::from_millis(extra)
}

/// Uplink sequence shown before the gallery opens. Returns true once the content
/// may be revealed, false if cancelled first.
pub async fn run_uplink(pacing: &Pacing, cancel: &CancellationToken, mut emit: impl FnMut(&str)) -> bool {
    for line in UPLINK_LINES {
        if !pause(jittered(pacing.uplink_line, pacing.uplink_jitter), cancel).await {
            return false;
        }
        emit(line);
    }
    pause(pacing.reveal_buffer, cancel).await
}

/// Admin verification: four status lines, then the verdict, then a hold before the
/// login screen moves on.
pub async fn run_admin_verification(
    accepted: bool,
    pacing: &Pacing,
    cancel: &CancellationToken,
    mut emit: impl FnMut(&str),
) -> SequenceOutcome {
    for line in ADMIN_VERIFICATION_LINES {
        if !pause(pacing.admin_step, cancel).await {
            return SequenceOutcome::Cancelled;
        }
        emit(line);
    }
    if !pause(pacing.admin_step, cancel).await {
        return SequenceOutcome::Cancelled;
    }

    let (line, hold, outcome) = if accepted {
        (ADMIN_GRANTED_LINE, pacing.admin_grant_hold, SequenceOutcome::Granted)
    } else {
        (ADMIN_DENIED_LINE, pacing.admin_deny_hold, SequenceOutcome::Denied)
    };
    emit(line);

    if !pause(hold, cancel).await {
        return SequenceOutcome::Cancelled;
    }
    outcome
}

/// What the admin console does with one input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleReply {
    Text(String),
    Clear,
    Reboot(String),
    Nothing,
}

pub const CONSOLE_BANNER: [&str; 3] = [
    "SYSTEM_READY",
    "LISTENING ON PORT 445...",
    "TYPE 'help' FOR COMMANDS, 'exit' TO LEAVE",
];

/// Only the first word counts, case-insensitively.
pub fn respond(input: &str, config: &SiteConfig, now: DateTime<Utc>) -> ConsoleReply {
    let lowered = input.trim().to_lowercase();
    let command = lowered.split(' ').next().unwrap_or_default();

    match command {
        "" => ConsoleReply::Nothing,
        "help" => ConsoleReply::Text("COMMANDS: status, clear, reboot, ls, whoami, date".to_string()),
        "clear" => ConsoleReply::Clear,
        "status" => {
            let uplink = if config.maintenance_mode { "MAINTENANCE" } else { "STABLE" };
            ConsoleReply::Text(format!(
                "SYSTEM STATUS: {} // UPLINK: {uplink} // CPU: 34%",
                config.station_status
            ))
        }
        "reboot" => ConsoleReply::Reboot("INITIATING REBOOT SEQUENCE...".to_string()),
        "ls" => ConsoleReply::Text("DIR: /var/logs/station  /sys/config  /usr/admin".to_string()),
        "whoami" => ConsoleReply::Text("USER: SYS_ADMIN // CLEARANCE: LEVEL 5".to_string()),
        "date" => ConsoleReply::Text(now.format("%a, %d %b %Y %H:%M:%S GMT").to_string()),
        other => ConsoleReply::Text(format!("ERR: UNKNOWN COMMAND '{other}'")),
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::defaults::default_site_config;
    use crate::models::StationStatus;

    #[tokio::test]
    async fn uplink_emits_every_line_then_reveals() {
        let cancel = CancellationToken::new();
        let mut lines = Vec::new();
        let revealed = run_uplink(&Pacing::instant(), &cancel, |l| lines.push(l.to_string())).await;
        assert!(revealed);
        assert_eq!(lines, UPLINK_LINES);
    }

    #[tokio::test]
    async fn cancelled_uplink_never_reveals() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let mut lines = Vec::new();
        let pacing = Pacing {
            uplink_line: Duration::from_secs(60),
            ..Pacing::instant()
        };
        let revealed = run_uplink(&pacing, &cancel, |l| lines.push(l.to_string())).await;
        assert!(!revealed);
        assert!(lines.is_empty());
    }

    #[tokio::test]
    async fn uplink_stops_when_cancelled_midway() {
        let cancel = CancellationToken::new();
        let pacing = Pacing {
            uplink_line: Duration::from_millis(20),
            ..Pacing::instant()
        };
        let canceller = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            canceller.cancel();
        });

        let mut count = 0;
        let revealed = run_uplink(&pacing, &cancel, |_| count += 1).await;
        assert!(!revealed);
        assert!(count < UPLINK_LINES.len());
    }

    #[tokio::test]
    async fn admin_verification_verdicts() {
        let cancel = CancellationToken::new();

        let mut lines = Vec::new();
        let outcome = run_admin_verification(true, &Pacing::instant(), &cancel, |l| lines.push(l.to_string())).await;
        assert_eq!(outcome, SequenceOutcome::Granted);
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[..4], ADMIN_VERIFICATION_LINES);
        assert_eq!(lines[4], ADMIN_GRANTED_LINE);

        let mut lines = Vec::new();
        let outcome = run_admin_verification(false, &Pacing::instant(), &cancel, |l| lines.push(l.to_string())).await;
        assert_eq!(outcome, SequenceOutcome::Denied);
        assert_eq!(lines[4], ADMIN_DENIED_LINE);
    }

    #[test]
    fn jitter_stays_in_range() {
        for _ in 0..100 {
            let d = jittered(Duration::from_millis(600), Duration::from_millis(400));
            assert!(d >= Duration::from_millis(600));
            assert!(d < Duration::from_millis(1000));
        }
    }

    #[test]
    fn console_commands() {
        let config = default_site_config();
        let now = Utc.with_ymd_and_hms(2026, 10, 19, 8, 30, 0).unwrap();

        assert_eq!(
            respond("HELP", &config, now),
            ConsoleReply::Text("COMMANDS: status, clear, reboot, ls, whoami, date".to_string())
        );
        assert_eq!(respond("clear", &config, now), ConsoleReply::Clear);
        assert_eq!(respond("   ", &config, now), ConsoleReply::Nothing);
        assert!(matches!(respond("reboot now", &config, now), ConsoleReply::Reboot(_)));
        assert_eq!(
            respond("date", &config, now),
            ConsoleReply::Text("Mon, 19 Oct 2026 08:30:00 GMT".to_string())
        );
        assert_eq!(
            respond("sudo rm", &config, now),
            ConsoleReply::Text("ERR: UNKNOWN COMMAND 'sudo'".to_string())
        );
    }

    #[test]
    fn console_status_reflects_site_config() {
        let mut config = default_site_config();
        config.station_status = StationStatus::Critical;
        config.maintenance_mode = true;
        assert_eq!(
            respond("status", &config, Utc::now()),
            ConsoleReply::Text("SYSTEM STATUS: CRITICAL // UPLINK: MAINTENANCE // CPU: 34%".to_string())
        );
    }
}
