//! Feedback LEDs of CAN control modules.
//!
//! The gateway describes an LED link with two fields: the id of the LED and
//! an enumerator string such as `"Fast blink B12 Inverted"` (mode, brightness
//! on a 0-16 scale, optional inversion).

use serde::{Deserialize, Serialize};
use serde_json::Value;
use switchboard_config::parse_int;

/// Enumerator of an LED link that is not fully configured.
pub const UNKNOWN: &str = "UNKNOWN";

/// LED id meaning "no LED linked".
pub const UNLINKED: i64 = 255;

/// Blink mode of an LED.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedMode {
    On,
    Fast,
    Medium,
    Slow,
    Swing,
    /// Lit while the output is off; stored as an inverted link.
    Off,
}

impl LedMode {
    /// Modes the gateway can encode.
    pub const ALL: [LedMode; 5] = [Self::On, Self::Fast, Self::Medium, Self::Slow, Self::Swing];

    /// The gateway's label for this mode. `Off` has none of its own and is
    /// encoded as an inverted `On`.
    pub const fn label(self) -> &'static str {
        match self {
            Self::On | Self::Off => "On",
            Self::Fast => "Fast blink",
            Self::Medium => "Medium blink",
            Self::Slow => "Slow blink",
            Self::Swing => "Swinging",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|mode| mode.label() == label)
    }
}

/// One LED link.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Led {
    pub id: Option<i64>,
    pub brightness: Option<i64>,
    pub inverted: Option<bool>,
    pub mode: Option<LedMode>,
}

impl Led {
    /// Parses an enumerator. Anything that does not follow the
    /// `"<mode> B<brightness>[ Inverted]"` shape leaves the matching parts
    /// unset, which makes [`Led::enumerator`] report [`UNKNOWN`].
    pub fn parse(id: i64, enumerator: &str) -> Self {
        let mut led = Self {
            id: Some(id),
            ..Self::default()
        };
        if enumerator == UNKNOWN {
            return led;
        }
        let (label, rest) = match enumerator.split_once(" B") {
            Some((label, rest)) => (label, Some(rest)),
            None => (enumerator, None),
        };
        led.mode = LedMode::from_label(label);
        if let Some(rest) = rest {
            let (digits, inverted) = match rest.find(" Inverted") {
                Some(index) => (&rest[..index], true),
                None => (rest, false),
            };
            let brightness = parse_int(&Value::from(digits));
            if brightness >= 0 {
                led.brightness = Some(brightness);
                led.inverted = Some(inverted);
            }
        }
        led
    }

    /// Changes the mode. Leaving `Off` clears the inversion; entering it sets it.
    pub fn set_mode(&mut self, mode: LedMode) {
        if self.mode == Some(LedMode::Off) && mode != LedMode::Off {
            self.inverted = Some(false);
        }
        self.mode = Some(mode);
        if mode == LedMode::Off {
            self.inverted = Some(true);
        }
    }

    /// The enumerator string the gateway stores for this link.
    pub fn enumerator(&self) -> String {
        match (self.mode, self.brightness, self.inverted) {
            (Some(mode), Some(brightness), Some(inverted)) => format!(
                "{} B{brightness}{}",
                mode.label(),
                if inverted { " Inverted" } else { "" }
            ),
            _ => UNKNOWN.to_string(),
        }
    }

    /// True when an LED is linked and fully configured.
    pub fn enabled(&self) -> bool {
        self.id != Some(UNLINKED) && self.enumerator() != UNKNOWN
    }

    /// Brightness as a percentage, rounded to steps of 5.
    pub fn brightness_percent(&self) -> Option<i64> {
        self.brightness
            .map(|brightness| ((brightness as f64) / 16.0 * 20.0).round() as i64 * 5)
    }
}
