//! Plain-text views written to stdout.

use std::fmt::Write as _;

use client_core::{fields, ChainView, SyncStatus};

use crate::controller::{
    events::Feedback,
    view_state::{Tab, ViewState},
};

const SHORT_HASH_LEN: usize = 12;
const MASK: &str = "********";

pub fn short_hash(hash: &str) -> &str {
    match hash.char_indices().nth(SHORT_HASH_LEN) {
        Some((idx, _)) => &hash[..idx],
        None => hash,
    }
}

pub fn status_line(status: SyncStatus, view: Option<&ChainView>) -> String {
    let label = match status {
        SyncStatus::Online => "ONLINE",
        SyncStatus::Connecting => "CONNECTING",
    };
    match view {
        Some(view) => format!(
            "status: {label}  chain={} consensus={} height={} pending={} (synced {})",
            view.info.chain_id,
            view.info.consensus,
            view.info.height,
            view.info.pending_transactions,
            view.synced_at.format("%H:%M:%S"),
        ),
        None => format!("status: {label}  no chain data yet"),
    }
}

pub fn dashboard(status: SyncStatus, view: Option<&ChainView>) -> String {
    let mut out = status_line(status, view);
    let Some(view) = view else {
        return out;
    };
    out.push_str("\nblocks (newest first):");
    if view.blocks.is_empty() {
        out.push_str("\n  (none)");
    }
    for block in &view.blocks {
        let _ = write!(
            out,
            "\n  #{:<6} {:<12}  {:>3} tx",
            block.height,
            short_hash(&block.hash),
            block.transaction_count()
        );
        if let Some(at) = block.timestamp_utc() {
            let _ = write!(out, "  {}", at.format("%Y-%m-%d %H:%M:%S UTC"));
        }
    }
    out
}

pub fn form(view_state: &ViewState) -> String {
    let tab = view_state.active_tab();
    let mut out = format!("tab: {tab} (submit sends {})", tab.command());
    if tab == Tab::Dashboard {
        out.push_str("\n  no fields; 'submit' or 'mine' seals pending transactions");
        return out;
    }
    for &name in tab.fields() {
        let shown = match view_state.form().get(name) {
            Some(_) if fields::is_secret(name) => MASK.to_string(),
            Some(value) => format!("{value:?}"),
            None => "(unset)".to_string(),
        };
        let _ = write!(out, "\n  {name:<12}= {shown}");
    }
    out
}

pub fn feedback(feedback: &Feedback) -> String {
    let mut out = match feedback {
        Feedback::Accepted { kind, ack } => format!("ok: {kind} {}", ack.summary()),
        Feedback::Rejected { kind, error } => format!("{kind} failed: {error}"),
        Feedback::Lookup(text) => text.clone(),
        Feedback::LookupFailed(err) => format!("lookup failed: {err}"),
    };
    if let Some(hint) = feedback.hint() {
        let _ = write!(out, "\n  hint: {hint}");
    }
    out
}

pub fn help() -> &'static str {
    "commands:
  tab <dashboard|transfer|permissions|intel>  switch the active tab
  set <field> <value>                         set a form field (sender, recipient, amount,
                                              private_key, target, level, data_id, content)
  form                                        show the active tab's form
  submit                                      send the active tab's command
  mine                                        seal pending transactions into a block
  show                                        show chain summary and recent blocks
  clear                                       reset every form field
  level <address>                             look up a user's security level
  read <data_id> <address>                    read stored data as a user
  help                                        this text
  quit                                        leave the console"
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use client_core::CommandError;
    use shared::{
        domain::CommandKind,
        protocol::{Block, ChainInfo, CommandAck},
    };

    use super::*;

    fn view() -> ChainView {
        let info: ChainInfo = serde_json::from_value(serde_json::json!({
            "chain_id": "api-node-01",
            "height": 1,
            "consensus": "ProofOfAuthority",
            "pending_transactions": 2
        }))
        .expect("info");
        let blocks: Vec<Block> = serde_json::from_value(serde_json::json!([
            {"hash": "9f86d081884c7d659a2feaa0c55ad015", "height": 1,
             "transactions": [{"hash": "t1"}, {"hash": "t2"}], "timestamp": 1704067200.0},
            {"hash": "genesis", "height": 0, "transactions": []}
        ]))
        .expect("blocks");
        ChainView {
            round: 1,
            info,
            blocks,
            synced_at: Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 5).unwrap(),
        }
    }

    #[test]
    fn dashboard_lists_blocks_in_view_order() {
        let text = dashboard(SyncStatus::Online, Some(&view()));
        assert!(text.starts_with("status: ONLINE  chain=api-node-01"));
        assert!(text.contains("pending=2 (synced 12:00:05)"));
        let first = text.find("9f86d081884c").expect("short hash");
        let second = text.find("genesis").expect("genesis");
        assert!(first < second);
        assert!(!text.contains("9f86d081884c7"));
        assert!(text.contains("2 tx  2024-01-01 00:00:00 UTC"));
    }

    #[test]
    fn dashboard_without_data_shows_only_status() {
        assert_eq!(
            dashboard(SyncStatus::Connecting, None),
            "status: CONNECTING  no chain data yet"
        );
    }

    #[test]
    fn form_masks_private_key() {
        let mut state = ViewState::new();
        state.set_active_tab(Tab::Transfer);
        state.set_field(fields::SENDER, "alice");
        state.set_field(fields::PRIVATE_KEY, "super-secret");
        let text = form(&state);
        assert!(text.contains("submit sends transfer"));
        assert!(text.contains("sender      = \"alice\""));
        assert!(text.contains("recipient   = (unset)"));
        assert!(text.contains(MASK));
        assert!(!text.contains("super-secret"));
    }

    #[test]
    fn feedback_lines() {
        let accepted = Feedback::Accepted {
            kind: CommandKind::Mine,
            ack: CommandAck {
                status: Some("mined".into()),
                block_height: Some(7),
                tx_count: Some(3),
                ..CommandAck::default()
            },
        };
        assert_eq!(feedback(&accepted), "ok: mine mined block_height=7 tx_count=3");

        let rejected = Feedback::Rejected {
            kind: CommandKind::Promote,
            error: CommandError::Remote {
                status: 403,
                detail: "insufficient permission".into(),
            },
        };
        let text = feedback(&rejected);
        assert!(text.starts_with("promote failed: remote error: insufficient permission"));
        assert!(text.contains("hint: the ledger refused the command"));
    }

    #[test]
    fn short_hash_handles_short_input() {
        assert_eq!(short_hash("abc"), "abc");
        assert_eq!(short_hash("0123456789abcdef"), "0123456789ab");
    }
}
