//! Routes console actions to the command gateway and the ledger service.

use client_core::{Command, CommandGateway, LedgerService};
use shared::domain::CommandKind;
use tracing::debug;

use super::{events::Feedback, view_state::ViewState};

/// Submits the command bound to the active tab using the current form.
/// The private key is dropped only when the ledger accepted the command.
pub async fn submit_active_tab(gateway: &CommandGateway, view_state: &mut ViewState) -> Feedback {
    let kind = view_state.active_tab().command();
    debug!(command = %kind, tab = %view_state.active_tab(), "submitting from tab");
    match gateway.submit(kind, view_state.form()).await {
        Ok(ack) => {
            view_state.forget_secrets();
            Feedback::Accepted { kind, ack }
        }
        Err(error) => Feedback::Rejected { kind, error },
    }
}

pub async fn mine(gateway: &CommandGateway) -> Feedback {
    match gateway.dispatch(Command::Mine).await {
        Ok(ack) => Feedback::Accepted {
            kind: CommandKind::Mine,
            ack,
        },
        Err(error) => Feedback::Rejected {
            kind: CommandKind::Mine,
            error,
        },
    }
}

pub async fn lookup_level(service: &dyn LedgerService, address: &str) -> Feedback {
    match service.user_level(address).await {
        Ok(user) => Feedback::Lookup(match user.level {
            Some(level) => format!("{} has security level {level}", user.address),
            None => format!("{} has no security level assigned", user.address),
        }),
        Err(err) => Feedback::LookupFailed(err),
    }
}

pub async fn read_data(service: &dyn LedgerService, data_id: &str, user_address: &str) -> Feedback {
    match service.access_data(data_id, user_address).await {
        Ok(access) => {
            let content = match &access.content {
                serde_json::Value::String(text) => text.clone(),
                serde_json::Value::Null => String::new(),
                other => other.to_string(),
            };
            let status = access.status.as_deref().unwrap_or("ok");
            Feedback::Lookup(format!("{data_id} ({status}): {content}"))
        }
        Err(err) => Feedback::LookupFailed(err),
    }
}
