//! Line commands typed at the console prompt.

use client_core::fields;
use thiserror::Error;

use crate::controller::view_state::{Tab, UnknownTab};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleAction {
    SwitchTab(Tab),
    SetField { name: String, value: String },
    Submit,
    Mine,
    Show,
    ShowForm,
    ClearForm,
    UserLevel { address: String },
    ReadData { data_id: String, user_address: String },
    Help,
    Quit,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InputError {
    #[error("unknown command '{0}' (type 'help')")]
    UnknownCommand(String),
    #[error("usage: {0}")]
    Usage(&'static str),
    #[error("unknown field '{0}'")]
    UnknownField(String),
    #[error(transparent)]
    Tab(#[from] UnknownTab),
}

/// `Ok(None)` for a blank line.
pub fn parse_line(line: &str) -> Result<Option<ConsoleAction>, InputError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim_start()),
        None => (line, ""),
    };

    let action = match verb.to_ascii_lowercase().as_str() {
        "tab" => {
            if rest.is_empty() {
                return Err(InputError::Usage("tab <dashboard|transfer|permissions|intel>"));
            }
            ConsoleAction::SwitchTab(rest.parse()?)
        }
        "set" => {
            let (name, value) = match rest.split_once(char::is_whitespace) {
                Some((name, value)) => (name, value),
                None => (rest, ""),
            };
            if name.is_empty() {
                return Err(InputError::Usage("set <field> <value>"));
            }
            let name = name.to_ascii_lowercase();
            if !fields::ALL.contains(&name.as_str()) {
                return Err(InputError::UnknownField(name));
            }
            // the value is taken as typed, so content may contain spaces
            ConsoleAction::SetField {
                name,
                value: value.to_string(),
            }
        }
        "submit" => ConsoleAction::Submit,
        "mine" => ConsoleAction::Mine,
        "show" | "dashboard" => ConsoleAction::Show,
        "form" => ConsoleAction::ShowForm,
        "clear" => ConsoleAction::ClearForm,
        "level" => match rest.split_whitespace().collect::<Vec<_>>().as_slice() {
            [address] => ConsoleAction::UserLevel {
                address: address.to_string(),
            },
            _ => return Err(InputError::Usage("level <address>")),
        },
        "read" => match rest.split_whitespace().collect::<Vec<_>>().as_slice() {
            [data_id, user_address] => ConsoleAction::ReadData {
                data_id: data_id.to_string(),
                user_address: user_address.to_string(),
            },
            _ => return Err(InputError::Usage("read <data_id> <address>")),
        },
        "help" | "?" => ConsoleAction::Help,
        "quit" | "exit" => ConsoleAction::Quit,
        other => return Err(InputError::UnknownCommand(other.to_string())),
    };
    Ok(Some(action))
}
