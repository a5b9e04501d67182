//! Script parser: scripted device events for the simulator
//!
//! One event per line. Blank lines and `#` comments are skipped, lines
//! starting with `{` are parsed as JSON.
//!
//! ```text
//! sample 30 30 30
//! user 7
//! disable 7 | enable 7
//! screen locked | screen unlocked
//! power on | power off
//! fail screen|power|lock|sensor
//! heal
//! status
//! ```

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::core::simulated::SimulatedDevice;
use crate::types::{Sample, ScriptError, UserId};

lazy_static! {
    static ref RE_SAMPLE: Regex = Regex::new(r"(?i)^sample\s+(\S+)\s+(\S+)\s+(\S+)$").unwrap();
    static ref RE_USER: Regex = Regex::new(r"(?i)^user\s+(\S+)$").unwrap();
    static ref RE_TOGGLE: Regex = Regex::new(r"(?i)^(enable|disable)\s+(\S+)$").unwrap();
    static ref RE_SCREEN: Regex = Regex::new(r"(?i)^screen\s+(locked|unlocked)$").unwrap();
    static ref RE_POWER: Regex = Regex::new(r"(?i)^power\s+(on|off)$").unwrap();
    static ref RE_FAIL: Regex = Regex::new(r"(?i)^fail\s+(screen|power|lock|sensor)$").unwrap();
}

/// Capability whose failure can be injected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailTarget {
    Screen,
    Power,
    Lock,
    /// The device loses its accelerometer
    Sensor,
}

/// One scripted event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ScriptEvent {
    Sample { x: f64, y: f64, z: f64 },
    SwitchUser { user: UserId },
    SetDisabled { user: UserId, disabled: bool },
    Screen { locked: bool },
    Power { interactive: bool },
    Fail { target: FailTarget },
    Heal,
    Status,
}

impl ScriptEvent {
    /// Apply to the simulated device. Returns the number of listeners a
    /// sample reached (0 for every other event).
    pub fn apply(&self, device: &SimulatedDevice) -> usize {
        match *self {
            ScriptEvent::Sample { x, y, z } => return device.deliver(Sample::new(x, y, z)),
            ScriptEvent::SwitchUser { user } => device.switch_user(user),
            ScriptEvent::SetDisabled { user, disabled } => device.set_gesture_disabled(user, disabled),
            ScriptEvent::Screen { locked } => device.set_screen_locked(locked),
            ScriptEvent::Power { interactive } => device.set_interactive(interactive),
            ScriptEvent::Fail { target } => match target {
                FailTarget::Screen => device.fail_screen(true),
                FailTarget::Power => device.fail_power(true),
                FailTarget::Lock => device.fail_lock(true),
                FailTarget::Sensor => device.remove_sensor(),
            },
            ScriptEvent::Heal => device.heal(),
            ScriptEvent::Status => {}
        }
        0
    }
}

/// Text and JSON parser for scripted events
#[derive(Debug, Default)]
pub struct ScriptParser;

impl ScriptParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse one line. Ok(None) for blank lines and comments.
    pub fn parse_line(&self, line: &str) -> Result<Option<ScriptEvent>, ScriptError> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(None);
        }
        if line.starts_with('{') {
            return serde_json::from_str(line)
                .map(Some)
                .map_err(|e| ScriptError::Json(e.to_string()));
        }

        let event = if let Some(caps) = RE_SAMPLE.captures(line) {
            ScriptEvent::Sample {
                x: parse_number(line, &caps[1])?,
                y: parse_number(line, &caps[2])?,
                z: parse_number(line, &caps[3])?,
            }
        } else if let Some(caps) = RE_USER.captures(line) {
            ScriptEvent::SwitchUser { user: parse_number(line, &caps[1])? }
        } else if let Some(caps) = RE_TOGGLE.captures(line) {
            ScriptEvent::SetDisabled {
                user: parse_number(line, &caps[2])?,
                disabled: caps[1].eq_ignore_ascii_case("disable"),
            }
        } else if let Some(caps) = RE_SCREEN.captures(line) {
            ScriptEvent::Screen { locked: caps[1].eq_ignore_ascii_case("locked") }
        } else if let Some(caps) = RE_POWER.captures(line) {
            ScriptEvent::Power { interactive: caps[1].eq_ignore_ascii_case("on") }
        } else if let Some(caps) = RE_FAIL.captures(line) {
            let target = match caps[1].to_ascii_lowercase().as_str() {
                "screen" => FailTarget::Screen,
                "power" => FailTarget::Power,
                "lock" => FailTarget::Lock,
                _ => FailTarget::Sensor,
            };
            ScriptEvent::Fail { target }
        } else if line.eq_ignore_ascii_case("heal") {
            ScriptEvent::Heal
        } else if line.eq_ignore_ascii_case("status") {
            ScriptEvent::Status
        } else {
            return Err(ScriptError::Unrecognized(line.to_string()));
        };
        Ok(Some(event))
    }

    /// Parse a whole script, stopping at the first bad line
    pub fn parse_script(&self, text: &str) -> Result<Vec<ScriptEvent>, ScriptError> {
        let mut events = Vec::new();
        for line in text.lines() {
            if let Some(event) = self.parse_line(line)? {
                events.push(event);
            }
        }
        Ok(events)
    }
}

fn parse_number<T: std::str::FromStr>(line: &str, value: &str) -> Result<T, ScriptError> {
    value.parse().map_err(|_| ScriptError::InvalidNumber {
        line: line.to_string(),
        value: value.to_string(),
    })
}
