//! Controller layer: view state, action outcomes and command orchestration,
//! plus the run loop tying stdin, sync events and Ctrl-C together.

pub mod events;
pub mod orchestration;
pub mod view_state;

use std::{io, io::Write, sync::Arc, time::Duration};

use client_core::{
    ChainView, CommandGateway, LedgerService, SyncEngine, SyncEvent, SyncHandle, SyncStatus,
};
use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt},
    sync::broadcast::{self, error::RecvError},
};
use tracing::{debug, info, warn};

use crate::{
    input::{self, ConsoleAction},
    render,
};

use self::{events::SyncWatch, view_state::ViewState};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Text(String),
    Quit,
}

pub struct ConsoleController {
    engine: SyncEngine,
    gateway: CommandGateway,
    service: Arc<dyn LedgerService>,
    view_state: ViewState,
    poll_interval: Duration,
    handle: Option<SyncHandle>,
}

impl ConsoleController {
    pub fn new(service: Arc<dyn LedgerService>, poll_interval: Duration) -> Self {
        let engine = SyncEngine::new(service.clone());
        let gateway = CommandGateway::new(service.clone(), engine.clone());
        Self {
            engine,
            gateway,
            service,
            view_state: ViewState::new(),
            poll_interval,
            handle: None,
        }
    }

    /// Starts periodic sync. Mounting twice keeps the running timer.
    pub fn mount(&mut self) {
        if !self.is_mounted() {
            debug!(interval_ms = self.poll_interval.as_millis() as u64, "mounting console");
            self.handle = Some(self.engine.start(self.poll_interval));
        }
    }

    pub fn teardown(&mut self) {
        if let Some(handle) = self.handle.take() {
            debug!("tearing down console");
            self.engine.stop(handle);
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.handle.is_some()
    }

    pub async fn view(&self) -> Option<Arc<ChainView>> {
        self.engine.view().await
    }

    pub async fn status(&self) -> SyncStatus {
        self.engine.status().await
    }

    pub fn view_state(&self) -> &ViewState {
        &self.view_state
    }

    pub async fn apply(&mut self, action: ConsoleAction) -> Reply {
        let text = match action {
            ConsoleAction::SwitchTab(tab) => {
                self.view_state.set_active_tab(tab);
                render::form(self.view_state())
            }
            ConsoleAction::SetField { name, value } => {
                let line = format!("{name} set");
                self.view_state.set_field(name, value);
                line
            }
            ConsoleAction::Submit => {
                let feedback =
                    orchestration::submit_active_tab(&self.gateway, &mut self.view_state).await;
                render::feedback(&feedback)
            }
            ConsoleAction::Mine => render::feedback(&orchestration::mine(&self.gateway).await),
            ConsoleAction::Show => {
                let view = self.view().await;
                render::dashboard(self.status().await, view.as_deref())
            }
            ConsoleAction::ShowForm => render::form(self.view_state()),
            ConsoleAction::ClearForm => {
                self.view_state.clear_form();
                "form cleared".to_string()
            }
            ConsoleAction::UserLevel { address } => render::feedback(
                &orchestration::lookup_level(self.service.as_ref(), &address).await,
            ),
            ConsoleAction::ReadData {
                data_id,
                user_address,
            } => render::feedback(
                &orchestration::read_data(self.service.as_ref(), &data_id, &user_address).await,
            ),
            ConsoleAction::Help => render::help().to_string(),
            ConsoleAction::Quit => return Reply::Quit,
        };
        Reply::Text(text)
    }

    /// Reads commands until `quit`, end of input or Ctrl-C. Sync status
    /// changes are printed between commands. Sync is stopped on every exit path.
    pub async fn run<R, W>(&mut self, reader: R, out: &mut W) -> io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        let events = self.engine.subscribe();
        self.mount();
        let result = self.event_loop(reader, out, events).await;
        self.teardown();
        result
    }

    async fn event_loop<R, W>(
        &mut self,
        reader: R,
        out: &mut W,
        mut events: broadcast::Receiver<SyncEvent>,
    ) -> io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        let mut lines = reader.lines();
        let mut watch = SyncWatch::default();
        let mut sync_open = true;
        let interrupt = tokio::signal::ctrl_c();
        tokio::pin!(interrupt);
        let mut interrupt_armed = true;
        writeln!(out, "type 'help' for commands")?;
        out.flush()?;

        loop {
            tokio::select! {
                line = lines.next_line() => {
                    let Some(line) = line? else {
                        debug!("console input closed");
                        return Ok(());
                    };
                    match input::parse_line(&line) {
                        Ok(None) => {}
                        Ok(Some(action)) => match self.apply(action).await {
                            Reply::Text(text) => writeln!(out, "{text}")?,
                            Reply::Quit => return Ok(()),
                        },
                        Err(err) => writeln!(out, "error: {err}")?,
                    }
                }
                event = events.recv(), if sync_open => match event {
                    Ok(event) => {
                        if let Some(text) = watch.observe(&event) {
                            writeln!(out, "{text}")?;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        debug!(skipped, "console fell behind sync events");
                    }
                    Err(RecvError::Closed) => {
                        warn!("sync event channel closed");
                        sync_open = false;
                    }
                },
                signal = &mut interrupt, if interrupt_armed => match signal {
                    Ok(()) => {
                        info!("interrupted");
                        return Ok(());
                    }
                    Err(err) => {
                        warn!(%err, "ctrl-c handler unavailable");
                        interrupt_armed = false;
                    }
                },
            }
            out.flush()?;
        }
    }
}

impl Drop for ConsoleController {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
#[path = "../tests/controller_tests.rs"]
mod tests;
