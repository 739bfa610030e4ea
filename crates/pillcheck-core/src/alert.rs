//! Wire protocol of the downstream alert bridge
//!
//! Pure command rendering, line parsing and timing policy. The serial
//! transport itself lives in a separate bridge process; everything here
//! takes caller-supplied timestamps so the core stays deterministic.

use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};

/// Extract the numeric id from a container identifier such as
/// `"container2"`. Identifiers without digits map to 0.
pub fn container_number(container: &str) -> u32 {
    let digits: String = container.chars().filter(|c| c.is_ascii_digit()).collect();
    digits.parse().unwrap_or(0)
}

/// Command sent over the serial link to the alert hardware.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlertCommand {
    /// Pill mismatch alert for a container.
    PillAlert { container: u32 },
    /// Scheduled alarm firing; the date is optional and the time is
    /// `HH:MM` (the firmware parses the last time token on the line).
    AlarmTriggered {
        container: u32,
        date: Option<String>,
        time: String,
    },
}

impl fmt::Display for AlertCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertCommand::PillAlert { container } => write!(f, "PILLALERT C{container}"),
            AlertCommand::AlarmTriggered {
                container,
                date: Some(date),
                time,
            } => write!(f, "ALARM_TRIGGERED C{container} {date} {time}"),
            AlertCommand::AlarmTriggered {
                container,
                date: None,
                time,
            } => write!(f, "ALARM_TRIGGERED C{container} {time}"),
        }
    }
}

impl AlertCommand {
    /// Render the newline-terminated wire form.
    pub fn to_line(&self) -> String {
        format!("{self}\n")
    }
}

/// Inbound alarm-stopped notification parsed from a serial line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StopEvent {
    pub container: u32,
}

/// Detect an `ALARM_STOPPED` notification in a serial line.
///
/// Matching is case-insensitive and the `C<n>` container tag is
/// optional; lines without one default to container 1, matching the
/// firmware behavior.
pub fn parse_stop_line(line: &str) -> Option<StopEvent> {
    let upper = line.to_uppercase();
    if !upper.contains("ALARM_STOPPED") {
        return None;
    }

    let container = find_container_tag(&upper).unwrap_or(1);
    Some(StopEvent { container })
}

/// First `C<digits>` token with a positive number.
fn find_container_tag(upper: &str) -> Option<u32> {
    let bytes = upper.as_bytes();
    for (i, &b) in bytes.iter().enumerate() {
        if b != b'C' {
            continue;
        }
        let start = i + 1;
        let end = start
            + bytes[start..]
                .iter()
                .take_while(|b| b.is_ascii_digit())
                .count();
        if end > start {
            if let Ok(n) = upper[start..end].parse::<u32>() {
                if n > 0 {
                    return Some(n);
                }
            }
        }
    }
    None
}

/// Per-container suppression of repeated stop notifications.
///
/// The hardware can emit the same stop event several times in quick
/// succession; events landing inside the window are duplicates.
#[derive(Debug)]
pub struct StopDebouncer {
    window: Duration,
    last_seen: HashMap<u32, Instant>,
}

impl StopDebouncer {
    pub const DEFAULT_WINDOW: Duration = Duration::from_secs(5);

    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_seen: HashMap::new(),
        }
    }

    /// Record a stop event; returns true when it should be acted on.
    pub fn observe(&mut self, container: u32, at: Instant) -> bool {
        match self.last_seen.get(&container) {
            Some(&last) if at.duration_since(last) < self.window => false,
            _ => {
                self.last_seen.insert(container, at);
                true
            }
        }
    }
}

impl Default for StopDebouncer {
    fn default() -> Self {
        Self::new(Self::DEFAULT_WINDOW)
    }
}

/// Rate limit on serial reconnection attempts, keeping a contended port
/// from being hammered.
#[derive(Debug)]
pub struct ReconnectGate {
    interval: Duration,
    last_attempt: Option<Instant>,
}

impl ReconnectGate {
    pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(5);

    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_attempt: None,
        }
    }

    /// Whether a connection attempt may proceed now; records the
    /// attempt when it may.
    ///
    /// The first call always passes.
    pub fn should_attempt(&mut self, at: Instant) -> bool {
        match self.last_attempt {
            Some(last) if at.duration_since(last) < self.interval => false,
            _ => {
                self.last_attempt = Some(at);
                true
            }
        }
    }
}

impl Default for ReconnectGate {
    fn default() -> Self {
        Self::new(Self::DEFAULT_INTERVAL)
    }
}
