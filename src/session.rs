//! Interactive generation session.
//!
//! The session owns the current payload, logo and parameters, runs at most one
//! generation at a time and publishes results through a `watch` channel. When
//! a logo is set, changing it or its parameters re-generates after
//! [`DEBOUNCE`] of quiet, so a burst of slider moves costs one run.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, warn};

use crate::debounce::Debouncer;
use crate::error::GenerateError;
use crate::generate::{GenerateRequest, GenerationFlow, Generator, Outcome, Snapshot};
use crate::layout::CompositionParams;

pub const DEBOUNCE: Duration = Duration::from_millis(250);

/// Requests sent to a running session.
#[derive(Debug, Clone)]
pub enum Command {
    SetPayload(String),
    SetLogo(Option<Vec<u8>>),
    SetParams(CompositionParams),
    Generate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Trigger {
    Regenerate,
}

/// Client side of a session. Dropping every handle stops the session once
/// any in-flight run has finished.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    commands: mpsc::UnboundedSender<Command>,
    snapshots: watch::Receiver<Snapshot>,
}

impl SessionHandle {
    /// Returns `false` if the session has stopped.
    pub fn send(&self, command: Command) -> bool {
        self.commands.send(command).is_ok()
    }

    pub fn set_payload(&self, payload: impl Into<String>) -> bool {
        self.send(Command::SetPayload(payload.into()))
    }

    pub fn set_logo(&self, logo: Option<Vec<u8>>) -> bool {
        self.send(Command::SetLogo(logo))
    }

    pub fn set_params(&self, params: CompositionParams) -> bool {
        self.send(Command::SetParams(params))
    }

    pub fn generate(&self) -> bool {
        self.send(Command::Generate)
    }

    pub fn snapshot(&self) -> Snapshot {
        self.snapshots.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.snapshots.clone()
    }

    /// Waits until `runs` generations have completed and returns the snapshot.
    pub async fn wait_for_runs(&self, runs: u64) -> Option<Snapshot> {
        let mut snapshots = self.snapshots.clone();
        let snapshot = snapshots.wait_for(|snapshot| snapshot.runs >= runs).await.ok()?;
        Some(snapshot.clone())
    }
}

pub struct Session {
    generator: Generator,
    commands: mpsc::UnboundedReceiver<Command>,
    publisher: watch::Sender<Snapshot>,
    flow: GenerationFlow,
    payload: String,
    logo: Option<Arc<[u8]>>,
    params: CompositionParams,
    debouncer: Debouncer<Trigger>,
    in_flight: Option<JoinHandle<Outcome>>,
}

impl Session {
    pub fn new(generator: Generator) -> (Self, SessionHandle) {
        let flow = GenerationFlow::new();
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (publisher, snapshots) = watch::channel(flow.snapshot());
        let session = Self {
            generator,
            commands: command_rx,
            publisher,
            flow,
            payload: String::new(),
            logo: None,
            params: CompositionParams::default(),
            debouncer: Debouncer::new(DEBOUNCE),
            in_flight: None,
        };
        let handle = SessionHandle {
            commands: command_tx,
            snapshots,
        };
        (session, handle)
    }

    /// Spawns the session on the current runtime.
    pub fn spawn(generator: Generator) -> SessionHandle {
        let (session, handle) = Self::new(generator);
        tokio::spawn(session.run());
        handle
    }

    pub async fn run(mut self) {
        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(command) => self.handle(command),
                    None => break,
                },
                trigger = self.debouncer.next(), if !self.debouncer.is_empty() => {
                    self.on_debounced(trigger);
                }
                joined = join_in_flight(&mut self.in_flight), if self.in_flight.is_some() => {
                    self.in_flight = None;
                    self.finish(joined);
                }
            }
        }

        if let Some(handle) = self.in_flight.take() {
            let joined = handle.await;
            self.finish(joined);
        }
        debug!("session stopped");
    }

    fn handle(&mut self, command: Command) {
        match command {
            Command::SetPayload(payload) => {
                self.payload = payload;
            }
            Command::SetLogo(logo) => {
                self.logo = logo.map(Arc::from);
                if self.logo.is_some() {
                    self.schedule_regenerate();
                } else {
                    self.debouncer.cancel(&Trigger::Regenerate);
                }
            }
            Command::SetParams(params) => {
                self.params = params;
                if self.logo.is_some() {
                    self.schedule_regenerate();
                }
            }
            Command::Generate => {
                // A dropped trigger leaves a pending re-render in place.
                if self.start_run() {
                    self.debouncer.cancel(&Trigger::Regenerate);
                }
            }
        }
    }

    // Re-generation only follows a change once something has been generated.
    fn schedule_regenerate(&mut self) {
        if self.flow.has_result() || self.flow.is_generating() {
            self.debouncer.schedule(Trigger::Regenerate);
        }
    }

    fn on_debounced(&mut self, trigger: Trigger) {
        match trigger {
            Trigger::Regenerate if self.flow.is_generating() => {
                // Wait for the current run, then render the latest parameters.
                self.debouncer.schedule(Trigger::Regenerate);
            }
            Trigger::Regenerate => {
                self.start_run();
            }
        }
    }

    /// Returns `false` when a run is already in flight.
    fn start_run(&mut self) -> bool {
        if !self.flow.try_begin() {
            debug!("generation already running, trigger dropped");
            return false;
        }
        self.publisher.send_replace(self.flow.snapshot());

        let request = GenerateRequest {
            payload: self.payload.clone(),
            logo: self.logo.clone(),
            params: self.params,
        };
        let generator = self.generator.clone();
        self.in_flight = Some(tokio::spawn(async move {
            generator.run(request).await.map_err(GenerateError::from)
        }));
        true
    }

    fn finish(&mut self, joined: Result<Outcome, JoinError>) {
        let outcome = joined.unwrap_or_else(|err| {
            warn!(error = %err, "generation task did not complete");
            Err(GenerateError::Task(err.to_string()))
        });
        if let Err(err) = &outcome {
            warn!(error = %err, "generation failed");
        }
        self.flow.complete(outcome);
        self.publisher.send_replace(self.flow.snapshot());
    }
}

async fn join_in_flight(slot: &mut Option<JoinHandle<Outcome>>) -> Result<Outcome, JoinError> {
    match slot {
        Some(handle) => handle.await,
        None => std::future::pending().await,
    }
}
