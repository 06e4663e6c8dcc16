//! Input session configuration.

use portamento_midi::{QueueConfig, StatusCode};
use serde::{Deserialize, Serialize};

pub const DEFAULT_CLIENT_NAME: &str = "portamento";

/// Message types dropped after decoding. The transport itself always
/// forwards everything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IgnoreTypes {
    pub sysex: bool,
    /// MIDI time code and timing clock.
    pub timing: bool,
    pub active_sensing: bool,
}

impl IgnoreTypes {
    pub fn new(sysex: bool, timing: bool, active_sensing: bool) -> Self {
        Self {
            sysex,
            timing,
            active_sensing,
        }
    }

    pub fn ignores(&self, status: StatusCode) -> bool {
        match status {
            StatusCode::SysEx | StatusCode::SysExEnd => self.sysex,
            StatusCode::TimeCode | StatusCode::TimingClock => self.timing,
            StatusCode::ActiveSensing => self.active_sensing,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Client name registered with the MIDI driver.
    pub client_name: String,
    pub queue: QueueConfig,
    pub ignore: IgnoreTypes,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            client_name: DEFAULT_CLIENT_NAME.to_string(),
            queue: QueueConfig::default(),
            ignore: IgnoreTypes::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use portamento_midi::OverflowPolicy;

    #[test]
    fn test_ignore_types() {
        let ignore = IgnoreTypes::new(true, true, false);
        assert!(ignore.ignores(StatusCode::SysEx));
        assert!(ignore.ignores(StatusCode::TimingClock));
        assert!(ignore.ignores(StatusCode::TimeCode));
        assert!(!ignore.ignores(StatusCode::ActiveSensing));
        assert!(!ignore.ignores(StatusCode::NoteOn));
        assert!(!IgnoreTypes::default().ignores(StatusCode::SysEx));
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: SessionConfig =
            serde_json::from_str(r#"{ "ignore": { "timing": true } }"#).unwrap();
        assert_eq!(config.client_name, DEFAULT_CLIENT_NAME);
        assert_eq!(config.queue.capacity, portamento_midi::DEFAULT_QUEUE_CAPACITY);
        assert_eq!(config.queue.overflow, OverflowPolicy::DropOldest);
        assert!(config.ignore.timing);
        assert!(!config.ignore.sysex);
    }

    #[test]
    fn test_block_policy_from_json() {
        let config: SessionConfig = serde_json::from_str(
            r#"{ "queue": { "capacity": 8, "overflow": { "Block": { "timeout": { "secs": 0, "nanos": 1000000 } } } } }"#,
        )
        .unwrap();
        assert_eq!(config.queue.capacity, 8);
        assert_eq!(
            config.queue.overflow,
            OverflowPolicy::Block {
                timeout: std::time::Duration::from_millis(1)
            }
        );
    }
}
