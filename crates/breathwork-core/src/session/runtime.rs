//! Real-time host: a tokio task that owns the controller.
//!
//! Frames and ticks are spawned timer tasks that post back into the same
//! channel as user commands, so every mutation happens on the actor task in
//! arrival order. Cancelling a wake-up aborts its task; a wake-up already in
//! the channel is dropped by the controller's stale-handle check.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, warn};

use crate::catalog::Catalog;
use crate::error::{ConfigError, CoreError};
use crate::storage::SessionSettings;
use crate::timer::{FrameHandle, Scheduler, TickerHandle, TICK_INTERVAL_MS};

use super::collaborators::Collaborators;
use super::controller::{SessionController, SessionSnapshot, SessionState};

/// Roughly one 60 Hz display refresh.
pub const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_millis(16);

enum Message {
    Frame(FrameHandle),
    Tick(TickerHandle),
    Command(Command),
}

enum Command {
    Toggle(oneshot::Sender<Result<SessionState, ConfigError>>),
    Start(oneshot::Sender<Result<SessionState, ConfigError>>),
    Pause(oneshot::Sender<SessionState>),
    Stop(oneshot::Sender<SessionState>),
    Reset(oneshot::Sender<SessionState>),
    ChangeTechnique(String, oneshot::Sender<Result<(), ConfigError>>),
    StartPreset(String, oneshot::Sender<Result<SessionState, ConfigError>>),
    Snapshot(oneshot::Sender<SessionSnapshot>),
    TakeErrors(oneshot::Sender<Vec<CoreError>>),
    Shutdown(oneshot::Sender<SessionSnapshot>),
}

/// [`Scheduler`] backed by tokio timer tasks.
pub struct TokioScheduler {
    tx: mpsc::UnboundedSender<Message>,
    epoch: Instant,
    frame_interval: Duration,
    next_id: u64,
    frames: HashMap<FrameHandle, JoinHandle<()>>,
    tickers: HashMap<TickerHandle, JoinHandle<()>>,
}

impl TokioScheduler {
    fn new(tx: mpsc::UnboundedSender<Message>, frame_interval: Duration) -> Self {
        Self {
            tx,
            epoch: Instant::now(),
            frame_interval,
            next_id: 0,
            frames: HashMap::new(),
            tickers: HashMap::new(),
        }
    }

    fn frame_delivered(&mut self, handle: FrameHandle) {
        self.frames.remove(&handle);
    }

    fn abort_all(&mut self) {
        for (_, task) in self.frames.drain() {
            task.abort();
        }
        for (_, task) in self.tickers.drain() {
            task.abort();
        }
    }

    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

impl Scheduler for TokioScheduler {
    fn request_frame(&mut self) -> FrameHandle {
        let handle = FrameHandle(self.next_id());
        let tx = self.tx.clone();
        let delay = self.frame_interval;
        let task = tokio::spawn(async move {
            time::sleep(delay).await;
            let _ = tx.send(Message::Frame(handle));
        });
        self.frames.insert(handle, task);
        handle
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        if let Some(task) = self.frames.remove(&handle) {
            task.abort();
        }
    }

    fn start_ticker(&mut self, first_due_ms: u64) -> TickerHandle {
        let handle = TickerHandle(self.next_id());
        let tx = self.tx.clone();
        let first = Duration::from_millis(first_due_ms);
        let period = Duration::from_millis(TICK_INTERVAL_MS);
        let task = tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + first, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Burst);
            loop {
                interval.tick().await;
                if tx.send(Message::Tick(handle)).is_err() {
                    break;
                }
            }
        });
        self.tickers.insert(handle, task);
        handle
    }

    fn cancel_ticker(&mut self, handle: TickerHandle) {
        if let Some(task) = self.tickers.remove(&handle) {
            task.abort();
        }
    }

    /// Milliseconds since the runtime started.
    fn now_ms(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }
}

impl Drop for TokioScheduler {
    fn drop(&mut self) {
        self.abort_all();
    }
}

/// Spawns the session actor.
pub struct SessionRuntime;

impl SessionRuntime {
    /// Start an idle session on the current tokio runtime.
    ///
    /// # Errors
    /// Returns a [`ConfigError`] if the controller cannot be built.
    pub fn spawn(
        catalog: Catalog,
        settings: SessionSettings,
        collaborators: Collaborators,
    ) -> Result<SessionHandle, ConfigError> {
        Self::spawn_with_frame_interval(catalog, settings, collaborators, DEFAULT_FRAME_INTERVAL)
    }

    /// # Errors
    /// Returns a [`ConfigError`] if the controller cannot be built.
    pub fn spawn_with_frame_interval(
        catalog: Catalog,
        settings: SessionSettings,
        collaborators: Collaborators,
        frame_interval: Duration,
    ) -> Result<SessionHandle, ConfigError> {
        let (tx, rx) = mpsc::unbounded_channel();
        let scheduler = TokioScheduler::new(tx.clone(), frame_interval);
        let controller = SessionController::new(catalog, settings, scheduler, collaborators)?;
        let task = tokio::spawn(run_actor(controller, rx));
        Ok(SessionHandle {
            tx,
            task: Some(task),
        })
    }
}

async fn run_actor(
    mut controller: SessionController<TokioScheduler>,
    mut rx: mpsc::UnboundedReceiver<Message>,
) {
    while let Some(message) = rx.recv().await {
        match message {
            Message::Frame(handle) => {
                controller.scheduler_mut().frame_delivered(handle);
                let now_ms = controller.scheduler().now_ms();
                controller.on_frame(handle, now_ms);
            }
            Message::Tick(handle) => controller.on_tick(handle),
            Message::Command(command) => {
                if !apply(&mut controller, command) {
                    debug!("session actor shut down");
                    break;
                }
            }
        }
    }
    controller.scheduler_mut().abort_all();
}

/// Run one command. Returns false once the actor should exit.
fn apply(controller: &mut SessionController<TokioScheduler>, command: Command) -> bool {
    // A dropped reply receiver only means the caller stopped waiting.
    match command {
        Command::Toggle(reply) => {
            let _ = reply.send(controller.toggle());
        }
        Command::Start(reply) => {
            let _ = reply.send(controller.start());
        }
        Command::Pause(reply) => {
            let _ = reply.send(controller.pause());
        }
        Command::Stop(reply) => {
            let _ = reply.send(controller.stop());
        }
        Command::Reset(reply) => {
            let _ = reply.send(controller.reset());
        }
        Command::ChangeTechnique(id, reply) => {
            let _ = reply.send(controller.change_technique(&id));
        }
        Command::StartPreset(id, reply) => {
            let _ = reply.send(controller.start_preset(&id));
        }
        Command::Snapshot(reply) => {
            let _ = reply.send(controller.snapshot());
        }
        Command::TakeErrors(reply) => {
            let _ = reply.send(controller.take_errors());
        }
        Command::Shutdown(reply) => {
            controller.reset();
            let _ = reply.send(controller.snapshot());
            return false;
        }
    }
    true
}

/// Front end to a running session actor. Dropping it without
/// [`shutdown`](Self::shutdown) still resets and stops the actor.
pub struct SessionHandle {
    tx: mpsc::UnboundedSender<Message>,
    task: Option<JoinHandle<()>>,
}

impl SessionHandle {
    /// # Errors
    /// A configuration error from the controller, or
    /// [`CoreError::Custom`] if the actor has stopped.
    pub async fn toggle(&self) -> Result<SessionState, CoreError> {
        Ok(self.request(Command::Toggle).await??)
    }

    /// # Errors
    /// See [`toggle`](Self::toggle).
    pub async fn start(&self) -> Result<SessionState, CoreError> {
        Ok(self.request(Command::Start).await??)
    }

    /// # Errors
    /// [`CoreError::Custom`] if the actor has stopped.
    pub async fn pause(&self) -> Result<SessionState, CoreError> {
        self.request(Command::Pause).await
    }

    /// # Errors
    /// [`CoreError::Custom`] if the actor has stopped.
    pub async fn stop(&self) -> Result<SessionState, CoreError> {
        self.request(Command::Stop).await
    }

    /// # Errors
    /// [`CoreError::Custom`] if the actor has stopped.
    pub async fn reset(&self) -> Result<SessionState, CoreError> {
        self.request(Command::Reset).await
    }

    /// # Errors
    /// See [`toggle`](Self::toggle).
    pub async fn change_technique(&self, id: &str) -> Result<(), CoreError> {
        let id = id.to_string();
        Ok(self.request(|reply| Command::ChangeTechnique(id, reply)).await??)
    }

    /// # Errors
    /// See [`toggle`](Self::toggle).
    pub async fn start_preset(&self, id: &str) -> Result<SessionState, CoreError> {
        let id = id.to_string();
        Ok(self.request(|reply| Command::StartPreset(id, reply)).await??)
    }

    /// # Errors
    /// [`CoreError::Custom`] if the actor has stopped.
    pub async fn snapshot(&self) -> Result<SessionSnapshot, CoreError> {
        self.request(Command::Snapshot).await
    }

    /// # Errors
    /// [`CoreError::Custom`] if the actor has stopped.
    pub async fn take_errors(&self) -> Result<Vec<CoreError>, CoreError> {
        self.request(Command::TakeErrors).await
    }

    /// Reset (finalizing any unexported time) and stop the actor.
    ///
    /// # Errors
    /// [`CoreError::Custom`] if the actor had already stopped.
    pub async fn shutdown(mut self) -> Result<SessionSnapshot, CoreError> {
        let snapshot = self.request(Command::Shutdown).await?;
        if let Some(task) = self.task.take() {
            if let Err(err) = task.await {
                warn!("session actor join failed: {err}");
            }
        }
        Ok(snapshot)
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, CoreError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Message::Command(command(reply)))
            .map_err(|_| actor_gone())?;
        rx.await.map_err(|_| actor_gone())
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        if self.task.is_some() {
            let (reply, _) = oneshot::channel();
            let _ = self.tx.send(Message::Command(Command::Shutdown(reply)));
        }
    }
}

fn actor_gone() -> CoreError {
    CoreError::Custom("session actor is not running".to_string())
}
