//! Client engine for a remote permissioned ledger: periodic chain sync,
//! validated command submission, and the HTTP service boundary.

pub mod command_gateway;
pub mod error;
pub mod form;
pub mod service;
pub mod sync_engine;

pub use command_gateway::{Command, CommandGateway};
pub use error::{CommandError, CommandErrorKind, ServiceError, ServiceSetupError};
pub use form::{fields, FormState};
pub use service::{HttpLedgerService, LedgerService};
pub use sync_engine::{newest_first, ChainView, SyncEngine, SyncEvent, SyncHandle, SyncStatus};

#[cfg(test)]
#[path = "tests/support.rs"]
pub(crate) mod test_support;
