//! Active tab and the operator's in-progress form.

use std::{fmt, str::FromStr};

use client_core::{fields, FormState};
use shared::domain::CommandKind;
use thiserror::Error;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Tab {
    #[default]
    Dashboard,
    Transfer,
    Permissions,
    Intel,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown tab '{0}' (expected dashboard, transfer, permissions or intel)")]
pub struct UnknownTab(pub String);

impl Tab {
    pub const ALL: [Tab; 4] = [Tab::Dashboard, Tab::Transfer, Tab::Permissions, Tab::Intel];

    /// The command `submit` sends from this tab.
    pub fn command(self) -> CommandKind {
        match self {
            Tab::Dashboard => CommandKind::Mine,
            Tab::Transfer => CommandKind::Transfer,
            Tab::Permissions => CommandKind::Promote,
            Tab::Intel => CommandKind::StoreData,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Tab::Dashboard => "dashboard",
            Tab::Transfer => "transfer",
            Tab::Permissions => "permissions",
            Tab::Intel => "intel",
        }
    }

    /// Form fields the tab's command reads, in display order.
    pub fn fields(self) -> &'static [&'static str] {
        match self {
            Tab::Dashboard => &[],
            Tab::Transfer => &[
                fields::SENDER,
                fields::RECIPIENT,
                fields::AMOUNT,
                fields::PRIVATE_KEY,
            ],
            Tab::Permissions => &[
                fields::SENDER,
                fields::TARGET,
                fields::LEVEL,
                fields::PRIVATE_KEY,
            ],
            Tab::Intel => &[
                fields::SENDER,
                fields::DATA_ID,
                fields::CONTENT,
                fields::LEVEL,
                fields::PRIVATE_KEY,
            ],
        }
    }
}

impl fmt::Display for Tab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Tab {
    type Err = UnknownTab;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Tab::ALL
            .into_iter()
            .find(|tab| tab.label() == wanted)
            .ok_or_else(|| UnknownTab(s.trim().to_string()))
    }
}

/// Owned by the console controller; nothing else writes the form.
#[derive(Debug, Default)]
pub struct ViewState {
    active_tab: Tab,
    form: FormState,
}

impl ViewState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active_tab(&self) -> Tab {
        self.active_tab
    }

    /// Any tab is reachable from any tab. Field values are kept.
    pub fn set_active_tab(&mut self, tab: Tab) {
        self.active_tab = tab;
    }

    pub fn set_field(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.form.set(name, value);
    }

    pub fn form(&self) -> &FormState {
        &self.form
    }

    pub fn clear_form(&mut self) {
        self.form.clear();
    }

    /// Called after a command was accepted: the signing key never outlives
    /// the command it authorised.
    pub fn forget_secrets(&mut self) {
        for name in fields::ALL {
            if fields::is_secret(name) {
                self.form.remove(name);
            }
        }
    }
}
