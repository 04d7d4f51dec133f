//! Command names.
//!
//! The device defines which names it accepts, so the vocabulary is open:
//! any non-empty string is sent as-is. Known names:
//! - `LED_ON` / `LED_OFF` - Drive the on-board LED
//! - `GET_STATUS` - Ask for a `system_info` and `filesystem_status` frame
//! - `RESTART` - Reboot the device

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A command name such as `LED_ON`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CommandName(String);

impl CommandName {
    /// `LED_ON`
    pub fn led_on() -> Self {
        Self("LED_ON".to_string())
    }

    /// `LED_OFF`
    pub fn led_off() -> Self {
        Self("LED_OFF".to_string())
    }

    /// `GET_STATUS`
    pub fn get_status() -> Self {
        Self("GET_STATUS".to_string())
    }

    /// `RESTART`
    pub fn restart() -> Self {
        Self("RESTART".to_string())
    }

    /// The name as sent on the wire.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CommandName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for CommandName {
    type Err = CommandNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(CommandNameError::Empty);
        }
        Ok(Self(s.to_string()))
    }
}

impl TryFrom<String> for CommandName {
    type Error = CommandNameError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<CommandName> for String {
    fn from(name: CommandName) -> Self {
        name.0
    }
}

/// Error parsing a command name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandNameError {
    #[error("command name cannot be empty")]
    Empty,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_known() {
        let name: CommandName = "LED_ON".parse().unwrap();
        assert_eq!(name, CommandName::led_on());
        assert_eq!(name.as_str(), "LED_ON");
    }

    #[test]
    fn parse_custom() {
        let name: CommandName = "BLINK_3".parse().unwrap();
        assert_eq!(name.to_string(), "BLINK_3");
    }

    #[test]
    fn reject_empty() {
        assert_eq!("".parse::<CommandName>(), Err(CommandNameError::Empty));
    }

    #[test]
    fn any_other_text_is_kept_verbatim() {
        let name: CommandName = "SET COLOR\tred".parse().unwrap();
        assert_eq!(name.as_str(), "SET COLOR\tred");
        assert_eq!(" ".parse::<CommandName>().unwrap().as_str(), " ");
    }
}
