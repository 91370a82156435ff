//! Outcomes of operator actions and sync status tracking for the console.

use client_core::{CommandError, CommandErrorKind, ServiceError, SyncEvent, SyncStatus};
use shared::{domain::CommandKind, protocol::CommandAck};

#[derive(Debug, Clone, PartialEq)]
pub enum Feedback {
    Accepted {
        kind: CommandKind,
        ack: CommandAck,
    },
    Rejected {
        kind: CommandKind,
        error: CommandError,
    },
    Lookup(String),
    LookupFailed(ServiceError),
}

impl Feedback {
    /// Hint shown under a rejection, keyed by error kind.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Feedback::Rejected { error, .. } => Some(match error.kind() {
                CommandErrorKind::Validation => "fix the field with 'set' and submit again",
                CommandErrorKind::Transport => "ledger unreachable; nothing was submitted",
                CommandErrorKind::Remote => "the ledger refused the command",
            }),
            Feedback::LookupFailed(ServiceError::Transport(_)) => {
                Some("ledger unreachable; check the server url")
            }
            _ => None,
        }
    }
}

/// Remembers the last status line announced so the run loop only prints
/// transitions and height changes, not every round.
#[derive(Debug, Default)]
pub struct SyncWatch {
    last: Option<(SyncStatus, Option<u64>)>,
}

impl SyncWatch {
    pub fn observe(&mut self, event: &SyncEvent) -> Option<String> {
        let (next, line) = match event {
            SyncEvent::Published(view) => (
                (SyncStatus::Online, Some(view.info.height)),
                format!(
                    "[sync] online height={} pending={}",
                    view.info.height, view.info.pending_transactions
                ),
            ),
            SyncEvent::RoundFailed { error, .. } => {
                let height = self.last.and_then(|(_, height)| height);
                (
                    (SyncStatus::Connecting, height),
                    format!("[sync] connecting: {error}"),
                )
            }
        };
        if self.last == Some(next) {
            return None;
        }
        self.last = Some(next);
        Some(line)
    }
}
