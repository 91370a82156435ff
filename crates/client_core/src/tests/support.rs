use std::{
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use async_trait::async_trait;
use serde_json::json;
use shared::protocol::{
    Block, ChainInfo, CommandAck, DataAccess, PromoteRequest, StoreDataRequest, Transaction,
    TransferRequest, UserLevel,
};
use tokio::sync::Semaphore;

use crate::{error::ServiceError, service::LedgerService};

pub(crate) fn chain_info(height: u64) -> ChainInfo {
    ChainInfo {
        chain_id: "test-chain".into(),
        height,
        consensus: "ProofOfAuthority".into(),
        pending_transactions: 0,
        last_block_hash: None,
        total_transactions: None,
        validators: None,
    }
}

pub(crate) fn block(height: u64, tx_count: usize) -> Block {
    Block {
        hash: format!("hash-{height}"),
        height,
        transactions: (0..tx_count)
            .map(|i| Transaction(json!({"hash": format!("tx-{height}-{i}")})))
            .collect(),
        previous_hash: None,
        validator_address: None,
        timestamp: None,
    }
}

pub(crate) fn chain(height: u64) -> Vec<Block> {
    (0..=height).map(|h| block(h, h as usize % 3)).collect()
}

/// In-memory ledger with switchable responses, call counters and an optional
/// gate that holds block queries until permits are released.
pub(crate) struct FakeLedger {
    info: Mutex<Result<ChainInfo, ServiceError>>,
    blocks: Mutex<Result<Vec<Block>, ServiceError>>,
    command_result: Mutex<Result<CommandAck, ServiceError>>,
    block_delay: Mutex<Duration>,
    gated: AtomicBool,
    gate: Semaphore,
    pub info_calls: AtomicUsize,
    pub blocks_calls: AtomicUsize,
    concurrent_rounds: AtomicUsize,
    pub max_concurrent_rounds: AtomicUsize,
    pub commands: Mutex<Vec<String>>,
}

impl FakeLedger {
    pub(crate) fn at_height(height: u64) -> Arc<Self> {
        Arc::new(Self {
            info: Mutex::new(Ok(chain_info(height))),
            blocks: Mutex::new(Ok(chain(height))),
            command_result: Mutex::new(Ok(CommandAck {
                status: Some("submitted".into()),
                ..CommandAck::default()
            })),
            block_delay: Mutex::new(Duration::ZERO),
            gated: AtomicBool::new(false),
            gate: Semaphore::new(0),
            info_calls: AtomicUsize::new(0),
            blocks_calls: AtomicUsize::new(0),
            concurrent_rounds: AtomicUsize::new(0),
            max_concurrent_rounds: AtomicUsize::new(0),
            commands: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn set_height(&self, height: u64) {
        *self.info.lock().expect("info lock") = Ok(chain_info(height));
        *self.blocks.lock().expect("blocks lock") = Ok(chain(height));
    }

    pub(crate) fn fail_info(&self, error: ServiceError) {
        *self.info.lock().expect("info lock") = Err(error);
    }

    pub(crate) fn fail_blocks(&self, error: ServiceError) {
        *self.blocks.lock().expect("blocks lock") = Err(error);
    }

    pub(crate) fn set_command_result(&self, result: Result<CommandAck, ServiceError>) {
        *self.command_result.lock().expect("command lock") = result;
    }

    pub(crate) fn set_block_delay(&self, delay: Duration) {
        *self.block_delay.lock().expect("delay lock") = delay;
    }

    pub(crate) fn hold_blocks(&self) {
        self.gated.store(true, Ordering::SeqCst);
    }

    pub(crate) fn release_blocks(&self, permits: usize) {
        self.gate.add_permits(permits);
    }

    pub(crate) fn blocks_calls(&self) -> usize {
        self.blocks_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn command_log(&self) -> Vec<String> {
        self.commands.lock().expect("commands lock").clone()
    }

    fn record(&self, name: &str) -> Result<CommandAck, ServiceError> {
        self.commands
            .lock()
            .expect("commands lock")
            .push(name.to_string());
        self.command_result.lock().expect("command lock").clone()
    }
}

/// Keeps the concurrency counter honest when a round drops the query early.
struct InRound<'a>(&'a AtomicUsize);

impl Drop for InRound<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl LedgerService for FakeLedger {
    async fn chain_info(&self) -> Result<ChainInfo, ServiceError> {
        self.info_calls.fetch_add(1, Ordering::SeqCst);
        self.info.lock().expect("info lock").clone()
    }

    async fn recent_blocks(&self) -> Result<Vec<Block>, ServiceError> {
        self.blocks_calls.fetch_add(1, Ordering::SeqCst);
        let now = self.concurrent_rounds.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_concurrent_rounds.fetch_max(now, Ordering::SeqCst);
        let _in_round = InRound(&self.concurrent_rounds);

        let delay = *self.block_delay.lock().expect("delay lock");
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if self.gated.load(Ordering::SeqCst) {
            if let Ok(permit) = self.gate.acquire().await {
                permit.forget();
            }
        }

        self.blocks.lock().expect("blocks lock").clone()
    }

    async fn transfer(&self, _request: &TransferRequest) -> Result<CommandAck, ServiceError> {
        self.record("transfer")
    }

    async fn promote(&self, _request: &PromoteRequest) -> Result<CommandAck, ServiceError> {
        self.record("promote")
    }

    async fn store_data(&self, _request: &StoreDataRequest) -> Result<CommandAck, ServiceError> {
        self.record("store_data")
    }

    async fn mine(&self) -> Result<CommandAck, ServiceError> {
        self.record("mine")
    }

    async fn user_level(&self, address: &str) -> Result<UserLevel, ServiceError> {
        Ok(UserLevel {
            address: address.to_string(),
            level: Some(1),
        })
    }

    async fn access_data(
        &self,
        data_id: &str,
        _user_address: &str,
    ) -> Result<DataAccess, ServiceError> {
        Ok(DataAccess {
            status: Some("granted".into()),
            content: json!(data_id),
        })
    }
}

/// Polls `condition` until it holds or two seconds pass.
pub(crate) async fn eventually(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    condition()
}
