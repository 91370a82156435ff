//! Validation and dispatch of operator commands.

use std::sync::Arc;

use shared::{
    domain::{CommandKind, SecurityLevel},
    protocol::{CommandAck, PromoteRequest, StoreDataRequest, TransferRequest},
};
use tracing::{debug, info, warn};

use crate::{
    error::CommandError,
    form::{fields, FormState},
    service::LedgerService,
    sync_engine::SyncEngine,
};

/// A command that passed local validation and is ready to send.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Transfer(TransferRequest),
    Promote(PromoteRequest),
    StoreData(StoreDataRequest),
    Mine,
}

impl Command {
    pub fn kind(&self) -> CommandKind {
        match self {
            Command::Transfer(_) => CommandKind::Transfer,
            Command::Promote(_) => CommandKind::Promote,
            Command::StoreData(_) => CommandKind::StoreData,
            Command::Mine => CommandKind::Mine,
        }
    }

    pub fn from_form(kind: CommandKind, form: &FormState) -> Result<Self, CommandError> {
        let command = match kind {
            CommandKind::Transfer => Command::Transfer(TransferRequest {
                sender: required(form, fields::SENDER)?,
                recipient: required(form, fields::RECIPIENT)?,
                amount: amount(form)?,
                private_key: required(form, fields::PRIVATE_KEY)?,
            }),
            CommandKind::Promote => Command::Promote(PromoteRequest {
                sender: required(form, fields::SENDER)?,
                target: required(form, fields::TARGET)?,
                level: level(form)?,
                private_key: required(form, fields::PRIVATE_KEY)?,
            }),
            CommandKind::StoreData => Command::StoreData(StoreDataRequest {
                sender: required(form, fields::SENDER)?,
                data_id: required(form, fields::DATA_ID)?,
                content: form.get(fields::CONTENT).unwrap_or_default().to_string(),
                security_level: level(form)?,
                private_key: required(form, fields::PRIVATE_KEY)?,
            }),
            CommandKind::Mine => Command::Mine,
        };
        Ok(command)
    }
}

fn required(form: &FormState, field: &str) -> Result<String, CommandError> {
    match form.get(field).map(str::trim) {
        Some(value) if !value.is_empty() => Ok(value.to_string()),
        _ => Err(CommandError::Validation(format!("{field} is required"))),
    }
}

fn amount(form: &FormState) -> Result<f64, CommandError> {
    let raw = required(form, fields::AMOUNT)?;
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(CommandError::Validation(format!(
            "{} must be a finite number, got {raw:?}",
            fields::AMOUNT
        ))),
    }
}

fn level(form: &FormState) -> Result<SecurityLevel, CommandError> {
    let raw = required(form, fields::LEVEL)?;
    raw.parse::<SecurityLevel>()
        .map_err(|err| CommandError::Validation(format!("{}: {err}", fields::LEVEL)))
}

/// Sends one command per call and nudges the sync engine after every accepted
/// write. Nothing is retried.
#[derive(Clone)]
pub struct CommandGateway {
    service: Arc<dyn LedgerService>,
    sync: SyncEngine,
}

impl CommandGateway {
    pub fn new(service: Arc<dyn LedgerService>, sync: SyncEngine) -> Self {
        Self { service, sync }
    }

    pub async fn submit(
        &self,
        kind: CommandKind,
        params: &FormState,
    ) -> Result<CommandAck, CommandError> {
        let command = Command::from_form(kind, params).inspect_err(|err| {
            debug!(command = %kind, error = %err, "gateway: rejected before dispatch");
        })?;
        self.dispatch(command).await
    }

    pub async fn dispatch(&self, command: Command) -> Result<CommandAck, CommandError> {
        let kind = command.kind();
        info!(command = %kind, "gateway: submitting command");

        let result = match &command {
            Command::Transfer(request) => self.service.transfer(request).await,
            Command::Promote(request) => self.service.promote(request).await,
            Command::StoreData(request) => self.service.store_data(request).await,
            Command::Mine => self.service.mine().await,
        };

        match result {
            Ok(ack) => {
                info!(command = %kind, ack = %ack.summary(), "gateway: command accepted");
                if !self.sync.trigger_now() {
                    debug!(command = %kind, "gateway: sync engine stopped, skipping refresh");
                }
                Ok(ack)
            }
            Err(err) => {
                warn!(command = %kind, error = %err, "gateway: command failed");
                Err(err.into())
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/command_gateway_tests.rs"]
mod tests;
