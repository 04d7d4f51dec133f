//! Keyboard input.
//!
//! One request per line. Digits mirror the control page's Ctrl+1/2/3
//! shortcuts; anything else that looks like a command name is sent as is.

use devlink_client::UiRequest;
use devlink_core::CommandName;

pub const HELP: &str = "\
commands:
  1 | on        LED_ON
  2 | off       LED_OFF
  3 | status    GET_STATUS
  restart       RESTART
  send NAME     any other command
  clear         clear the message log
  scroll        toggle auto-scroll
  quit          exit";

/// What a line of input asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Request(UiRequest),
    Help,
    Invalid(String),
    Empty,
}

pub fn parse_line(line: &str) -> Input {
    let line = line.trim();
    let command = |name: CommandName| Input::Request(UiRequest::SendCommand(name));

    match line {
        "" => Input::Empty,
        "1" | "on" => command(CommandName::led_on()),
        "2" | "off" => command(CommandName::led_off()),
        "3" | "status" => command(CommandName::get_status()),
        "restart" => command(CommandName::restart()),
        "clear" => Input::Request(UiRequest::ClearMessages),
        "scroll" => Input::Request(UiRequest::ToggleAutoScroll),
        "quit" | "exit" => Input::Request(UiRequest::Shutdown),
        "help" | "?" => Input::Help,
        _ => match line.strip_prefix("send ") {
            Some(name) => match name.trim().parse() {
                Ok(name) => command(name),
                Err(e) => Input::Invalid(e.to_string()),
            },
            None => Input::Invalid(format!("unknown input: {line}")),
        },
    }
}
