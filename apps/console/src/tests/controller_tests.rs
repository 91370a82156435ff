use std::sync::{
    atomic::{AtomicU64, AtomicUsize, Ordering},
    Mutex,
};

use async_trait::async_trait;
use client_core::{fields, ServiceError};
use serde_json::json;
use shared::protocol::{
    Block, ChainInfo, CommandAck, DataAccess, PromoteRequest, StoreDataRequest, Transaction,
    TransferRequest, UserLevel,
};

use super::*;
use crate::controller::view_state::Tab;

const NEVER: Duration = Duration::from_secs(3600);

/// Ledger that seals every pending transfer on `mine` and can be told to
/// reject the next write.
#[derive(Default)]
struct ScriptedLedger {
    height: AtomicU64,
    pending: AtomicU64,
    write_calls: AtomicUsize,
    reject_next: Mutex<Option<ServiceError>>,
    transfers: Mutex<Vec<(String, String)>>,
}

impl ScriptedLedger {
    fn reject_next(&self, error: ServiceError) {
        *self.reject_next.lock().expect("reject lock") = Some(error);
    }

    fn write(&self) -> Result<(), ServiceError> {
        self.write_calls.fetch_add(1, Ordering::SeqCst);
        match self.reject_next.lock().expect("reject lock").take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl LedgerService for ScriptedLedger {
    async fn chain_info(&self) -> Result<ChainInfo, ServiceError> {
        Ok(ChainInfo {
            chain_id: "console-test".into(),
            height: self.height.load(Ordering::SeqCst),
            consensus: "ProofOfAuthority".into(),
            pending_transactions: self.pending.load(Ordering::SeqCst),
            last_block_hash: None,
            total_transactions: None,
            validators: None,
        })
    }

    async fn recent_blocks(&self) -> Result<Vec<Block>, ServiceError> {
        let height = self.height.load(Ordering::SeqCst);
        Ok((0..=height)
            .map(|h| Block {
                hash: format!("{h:0>16}"),
                height: h,
                transactions: vec![Transaction(json!({"hash": format!("tx-{h}")}))],
                previous_hash: None,
                validator_address: None,
                timestamp: None,
            })
            .collect())
    }

    async fn transfer(&self, request: &TransferRequest) -> Result<CommandAck, ServiceError> {
        self.write()?;
        self.pending.fetch_add(1, Ordering::SeqCst);
        let mut transfers = self.transfers.lock().expect("transfers lock");
        transfers.push((request.sender.clone(), request.private_key.clone()));
        Ok(CommandAck {
            status: Some("submitted".into()),
            hash: Some(format!("tx-{}", transfers.len())),
            ..CommandAck::default()
        })
    }

    async fn promote(&self, _request: &PromoteRequest) -> Result<CommandAck, ServiceError> {
        self.write()?;
        Ok(CommandAck {
            status: Some("submitted".into()),
            ..CommandAck::default()
        })
    }

    async fn store_data(&self, _request: &StoreDataRequest) -> Result<CommandAck, ServiceError> {
        self.write()?;
        Ok(CommandAck {
            status: Some("submitted".into()),
            ..CommandAck::default()
        })
    }

    async fn mine(&self) -> Result<CommandAck, ServiceError> {
        self.write()?;
        let height = self.height.fetch_add(1, Ordering::SeqCst) + 1;
        let tx_count = self.pending.swap(0, Ordering::SeqCst);
        Ok(CommandAck {
            status: Some("mined".into()),
            block_height: Some(height),
            tx_count: Some(tx_count),
            ..CommandAck::default()
        })
    }

    async fn user_level(&self, address: &str) -> Result<UserLevel, ServiceError> {
        Ok(UserLevel {
            address: address.to_string(),
            level: (address == "0xadmin").then_some(5),
        })
    }

    async fn access_data(
        &self,
        data_id: &str,
        _user_address: &str,
    ) -> Result<DataAccess, ServiceError> {
        if data_id == "missing" {
            return Err(ServiceError::Remote {
                status: 404,
                detail: "Data not found".into(),
            });
        }
        Ok(DataAccess {
            status: Some("granted".into()),
            content: json!("rendezvous at dawn"),
        })
    }
}

fn controller() -> (Arc<ScriptedLedger>, ConsoleController) {
    let ledger = Arc::new(ScriptedLedger::default());
    let controller = ConsoleController::new(ledger.clone(), NEVER);
    (ledger, controller)
}

async fn wait_for_height(controller: &ConsoleController, height: u64) -> Arc<ChainView> {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    loop {
        if let Some(view) = controller.view().await {
            if view.info.height == height {
                return view;
            }
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "chain view never reached height {height}"
        );
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

async fn text(controller: &mut ConsoleController, line: &str) -> String {
    let action = input::parse_line(line)
        .expect("valid input")
        .expect("non-empty input");
    match controller.apply(action).await {
        Reply::Text(text) => text,
        Reply::Quit => panic!("unexpected quit for {line:?}"),
    }
}

#[tokio::test]
async fn scripted_session_submits_transfer_and_forgets_key() {
    let (ledger, mut controller) = controller();
    let script = b"tab transfer\n\
set sender alice\n\
set recipient bob\n\
set amount 10\n\
set private_key k1\n\
deploy\n\
submit\n\
form\n\
quit\n\
show\n";
    let mut out = Vec::new();
    controller
        .run(&script[..], &mut out)
        .await
        .expect("console run");
    let out = String::from_utf8(out).expect("utf8 output");

    assert!(out.contains("error: unknown command 'deploy' (type 'help')"));
    assert!(out.contains("ok: transfer submitted hash=tx-1"));
    assert!(out.contains("private_key = (unset)"));
    assert!(out.contains("amount      = \"10\""));
    assert!(!out.contains("k1"));
    assert!(!out.contains("status:"), "input after quit is not read");

    assert_eq!(
        *ledger.transfers.lock().expect("transfers lock"),
        vec![("alice".to_string(), "k1".to_string())]
    );
    assert!(!controller.is_mounted());
    assert_eq!(controller.view_state().form().get(fields::AMOUNT), Some("10"));
    assert_eq!(controller.view_state().form().get(fields::PRIVATE_KEY), None);
}

#[tokio::test]
async fn end_of_input_stops_sync() {
    let (_ledger, mut controller) = controller();
    let mut out = Vec::new();
    controller
        .run(&b"help\n"[..], &mut out)
        .await
        .expect("console run");
    let out = String::from_utf8(out).expect("utf8 output");
    assert!(out.contains("level <address>"));
    assert!(!controller.is_mounted());
}

#[tokio::test]
async fn rejected_submit_keeps_the_form_for_correction() {
    let (ledger, mut controller) = controller();
    ledger.reject_next(ServiceError::Remote {
        status: 403,
        detail: "insufficient permission".into(),
    });
    text(&mut controller, "tab permissions").await;
    text(&mut controller, "set sender 0xuser").await;
    text(&mut controller, "set target 0xother").await;
    text(&mut controller, "set level 4").await;
    text(&mut controller, "set private_key user-key").await;

    let reply = text(&mut controller, "submit").await;
    assert!(reply.starts_with("promote failed: remote error: insufficient permission"));
    assert_eq!(
        controller.view_state().form().get(fields::PRIVATE_KEY),
        Some("user-key")
    );

    let reply = text(&mut controller, "submit").await;
    assert_eq!(reply, "ok: promote submitted");
    assert_eq!(ledger.write_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn invalid_amount_never_reaches_the_ledger() {
    let (ledger, mut controller) = controller();
    text(&mut controller, "tab transfer").await;
    text(&mut controller, "set sender alice").await;
    text(&mut controller, "set recipient bob").await;
    text(&mut controller, "set amount abc").await;
    text(&mut controller, "set private_key k1").await;

    let reply = text(&mut controller, "submit").await;
    assert!(reply.contains("validation error: amount must be a finite number"));
    assert!(reply.contains("hint: fix the field"));
    assert_eq!(ledger.write_calls.load(Ordering::SeqCst), 0);
    assert_eq!(
        controller.view_state().form().get(fields::PRIVATE_KEY),
        Some("k1")
    );
}

#[tokio::test]
async fn mining_from_dashboard_refreshes_without_waiting_for_the_timer() {
    let (_ledger, mut controller) = controller();
    controller.mount();
    let genesis = wait_for_height(&controller, 0).await;
    assert_eq!(genesis.blocks.len(), 1);

    assert_eq!(controller.view_state().active_tab(), Tab::Dashboard);
    let reply = text(&mut controller, "submit").await;
    assert_eq!(reply, "ok: mine mined block_height=1 tx_count=0");

    let view = wait_for_height(&controller, 1).await;
    assert_eq!(view.blocks[0].height, 1);

    let dashboard = text(&mut controller, "show").await;
    assert!(dashboard.starts_with("status: ONLINE  chain=console-test"));
    assert!(dashboard.contains("#1      000000000000"));
    controller.teardown();
    assert!(!controller.is_mounted());
}

#[tokio::test]
async fn lookups_report_service_answers() {
    let (_ledger, mut controller) = controller();
    assert_eq!(
        text(&mut controller, "level 0xadmin").await,
        "0xadmin has security level 5"
    );
    assert_eq!(
        text(&mut controller, "level 0xnew").await,
        "0xnew has no security level assigned"
    );
    assert_eq!(
        text(&mut controller, "read intel-7 0xadmin").await,
        "intel-7 (granted): rendezvous at dawn"
    );
    assert_eq!(
        text(&mut controller, "read missing 0xadmin").await,
        "lookup failed: service rejected request (HTTP 404): Data not found"
    );
}

#[tokio::test]
async fn clear_resets_every_field() {
    let (_ledger, mut controller) = controller();
    text(&mut controller, "set sender alice").await;
    text(&mut controller, "tab intel").await;
    assert_eq!(controller.view_state().form().get(fields::SENDER), Some("alice"));
    assert_eq!(text(&mut controller, "clear").await, "form cleared");
    assert!(controller.view_state().form().is_empty());
}
