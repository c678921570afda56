//! The serialized command runner of a dashboard instance.
//!
//! A single tokio task owns the write side of the state and processes
//! commands from a bounded `mpsc` queue, one at a time, in arrival order.
//! A handler may suspend on backend calls; the next command is not started
//! until the current one has committed its mutations and emitted its event.
//!
//! The committed snapshot is published through a `watch` channel, so
//! readers can take it at any time and never observe a half-applied
//! command. Events go out on a `broadcast` channel in command order.
//!
//! Reset and unmount cancel queued commands by advancing a shared
//! generation counter. Every queued message carries the generation it was
//! enqueued under; a message from an older generation is answered with
//! [`DispatchError::Cancelled`] without running. A running command is
//! never interrupted.
//!
//! Public API: [`DashboardHandle`] (cloneable async handle) and
//! [`CommandTicket`] (awaitable terminal event of a submitted command).

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::task::{Context, Poll};

use tokio::sync::{Mutex, broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio_stream::Stream;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tracing::Instrument;

use crate::command::{self, CommandPayload, DashboardCommand};
use crate::document::DashboardDocument;
use crate::error::DispatchError;
use crate::event::{DashboardEvent, EventPayload};
use crate::handler::{DashboardContext, handle};
use crate::state::DashboardState;

type Reply = oneshot::Sender<Result<DashboardEvent, DispatchError>>;

/// Messages sent from [`DashboardHandle`] to the runner task.
pub(crate) enum RunnerMessage {
    Dispatch {
        /// Generation current when the command was enqueued.
        generation: u64,
        cmd: DashboardCommand,
        reply: Reply,
    },
    /// Stop after the messages queued before this one.
    Shutdown,
}

/// Write side of the runner, owned by the task.
struct Runner {
    ctx: DashboardContext,
    state: watch::Sender<Arc<DashboardState>>,
    events: broadcast::Sender<DashboardEvent>,
    generation: Arc<AtomicU64>,
}

impl Runner {
    async fn run(self, mut rx: mpsc::Receiver<RunnerMessage>) {
        while let Some(msg) = rx.recv().await {
            match msg {
                RunnerMessage::Dispatch {
                    generation,
                    cmd,
                    reply,
                } => {
                    if generation < self.generation.load(Ordering::Acquire) {
                        tracing::debug!(
                            command = cmd.tag(),
                            correlation_id = ?cmd.correlation_id,
                            "dropping command queued before reset"
                        );
                        let _ = reply.send(Err(DispatchError::Cancelled));
                        continue;
                    }

                    let event = self.execute(cmd).await;
                    // No subscribers is not an error.
                    let _ = self.events.send(event.clone());
                    let _ = reply.send(Ok(event));
                }
                RunnerMessage::Shutdown => break,
            }
        }
        tracing::debug!("dashboard runner stopped");
    }

    /// Run one command to completion and commit its mutations.
    async fn execute(&self, cmd: DashboardCommand) -> DashboardEvent {
        let span = tracing::info_span!(
            "command",
            command = cmd.tag(),
            correlation_id = ?cmd.correlation_id,
        );

        async move {
            let snapshot = Arc::clone(&self.state.borrow());
            let output = handle(&self.ctx, &snapshot, cmd).await;

            let committed = output.mutations.len();
            let version = if committed == 0 {
                snapshot.version
            } else {
                let next = DashboardState::clone(&snapshot).reduce(&output.mutations);
                let version = next.version;
                self.state.send_replace(Arc::new(next));
                version
            };

            if let EventPayload::CommandRejected { kind, reason, .. } = &output.event.payload {
                tracing::warn!(?kind, %reason, mutations = committed, "command rejected");
            } else {
                tracing::info!(mutations = committed, version, "command completed");
            }
            output.event
        }
        .instrument(span)
        .await
    }
}

/// Awaitable terminal event of a submitted command.
///
/// Resolves to the command's event, to [`DispatchError::Cancelled`] if a
/// reset or unmount dropped it from the queue, or to
/// [`DispatchError::RunnerGone`] if the runner stopped.
#[derive(Debug)]
pub struct CommandTicket {
    correlation_id: Option<String>,
    rx: oneshot::Receiver<Result<DashboardEvent, DispatchError>>,
}

impl CommandTicket {
    /// Correlation id of the submitted command.
    pub fn correlation_id(&self) -> Option<&str> {
        self.correlation_id.as_deref()
    }
}

impl Future for CommandTicket {
    type Output = Result<DashboardEvent, DispatchError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|res| res.unwrap_or(Err(DispatchError::RunnerGone)))
    }
}

/// Async handle to a running dashboard.
///
/// Lightweight, cloneable, and `Send + Sync`. All clones address the same
/// runner task.
#[derive(Debug, Clone)]
pub struct DashboardHandle {
    sender: mpsc::Sender<RunnerMessage>,
    state: watch::Receiver<Arc<DashboardState>>,
    events: broadcast::Sender<DashboardEvent>,
    generation: Arc<AtomicU64>,
    task: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl std::fmt::Debug for RunnerMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunnerMessage::Dispatch {
                generation, cmd, ..
            } => f
                .debug_struct("Dispatch")
                .field("generation", generation)
                .field("command", &cmd.tag())
                .finish_non_exhaustive(),
            RunnerMessage::Shutdown => f.write_str("Shutdown"),
        }
    }
}

impl DashboardHandle {
    /// Enqueue a command without waiting for it to run.
    ///
    /// Waits only if the queue is full. A `ResetDashboard` command first
    /// drops every command still queued, the same as [`reset`](Self::reset).
    ///
    /// # Errors
    ///
    /// [`DispatchError::RunnerGone`] if the dashboard was unmounted.
    pub async fn submit(&self, cmd: DashboardCommand) -> Result<CommandTicket, DispatchError> {
        let generation = if matches!(cmd.payload, CommandPayload::ResetDashboard) {
            self.generation.fetch_add(1, Ordering::AcqRel) + 1
        } else {
            self.generation.load(Ordering::Acquire)
        };
        self.enqueue(generation, cmd).await
    }

    /// Enqueue a command and wait for its terminal event.
    ///
    /// A rejected command is still `Ok`: the event is `CommandRejected`.
    ///
    /// # Errors
    ///
    /// [`DispatchError::Cancelled`] if a reset or unmount dropped the
    /// command before it ran, [`DispatchError::RunnerGone`] if the runner
    /// is not alive.
    pub async fn execute(&self, cmd: DashboardCommand) -> Result<DashboardEvent, DispatchError> {
        self.submit(cmd).await?.await
    }

    /// The latest committed snapshot.
    pub fn state(&self) -> Arc<DashboardState> {
        Arc::clone(&self.state.borrow())
    }

    /// Receiver notified after every commit.
    pub fn watch_state(&self) -> watch::Receiver<Arc<DashboardState>> {
        self.state.clone()
    }

    /// The working copy of the persisted sections of the dashboard.
    pub fn document(&self) -> DashboardDocument {
        self.state().document()
    }

    /// Subscribe to events emitted after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<DashboardEvent> {
        self.events.subscribe()
    }

    /// [`subscribe`](Self::subscribe) as a stream. A subscriber that falls
    /// behind skips the events it missed.
    pub fn event_stream(&self) -> impl Stream<Item = DashboardEvent> + Send + 'static {
        BroadcastStream::new(self.subscribe()).filter_map(|res| match res {
            Ok(event) => Some(event),
            Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "event subscriber lagged");
                None
            }
        })
    }

    /// Drop every queued command, then reset the dashboard to its persisted
    /// document.
    ///
    /// # Errors
    ///
    /// [`DispatchError::RunnerGone`] if the runner is not alive.
    pub async fn reset(
        &self,
        correlation_id: Option<String>,
    ) -> Result<DashboardEvent, DispatchError> {
        let mut cmd = command::reset_dashboard();
        cmd.correlation_id = correlation_id;
        self.execute(cmd).await
    }

    /// Drop every queued command, let the running one finish, and stop the
    /// runner. Calling it again is a no-op.
    pub async fn unmount(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
        let Some(task) = self.task.lock().await.take() else {
            return;
        };
        // A send error means the task has already stopped.
        let _ = self.sender.send(RunnerMessage::Shutdown).await;
        if let Err(e) = task.await {
            tracing::error!(error = %e, "dashboard runner task failed");
        }
    }

    /// Whether the runner task is still accepting commands.
    pub fn is_alive(&self) -> bool {
        !self.sender.is_closed()
    }

    async fn enqueue(
        &self,
        generation: u64,
        cmd: DashboardCommand,
    ) -> Result<CommandTicket, DispatchError> {
        let (tx, rx) = oneshot::channel();
        let correlation_id = cmd.correlation_id.clone();
        self.sender
            .send(RunnerMessage::Dispatch {
                generation,
                cmd,
                reply: tx,
            })
            .await
            .map_err(|_| DispatchError::RunnerGone)?;
        Ok(CommandTicket { correlation_id, rx })
    }
}

/// Capacities of the runner channels.
pub(crate) struct RunnerConfig {
    pub queue_capacity: usize,
    pub event_capacity: usize,
}

/// Spawn the runner task for `initial` on the current tokio runtime.
pub(crate) fn spawn_runner(
    ctx: DashboardContext,
    initial: DashboardState,
    config: RunnerConfig,
) -> DashboardHandle {
    let (tx, rx) = mpsc::channel(config.queue_capacity.max(1));
    let (state_tx, state_rx) = watch::channel(Arc::new(initial));
    let (events, _) = broadcast::channel(config.event_capacity.max(1));
    let generation = Arc::new(AtomicU64::new(0));

    let runner = Runner {
        ctx,
        state: state_tx,
        events: events.clone(),
        generation: Arc::clone(&generation),
    };
    let task = tokio::spawn(runner.run(rx));

    DashboardHandle {
        sender: tx,
        state: state_rx,
        events,
        generation,
        task: Arc::new(Mutex::new(Some(task))),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::backend::memory::InMemoryBackend;
    use crate::command::MeasureHeader;
    use crate::handler::test_support::{context, context_with, fixture_backend};
    use crate::state::RenderMode;
    use crate::state::test_fixtures::sample_document;
    use crate::widget::{ObjRef, WidgetHeader};

    fn w(id: &str) -> ObjRef {
        ObjRef::new(id)
    }

    fn spawn_with(ctx: DashboardContext, mode: RenderMode) -> DashboardHandle {
        spawn_runner(
            ctx,
            DashboardState::new(sample_document(), mode),
            RunnerConfig {
                queue_capacity: 8,
                event_capacity: 16,
            },
        )
    }

    #[tokio::test]
    async fn execute_commits_and_returns_event() {
        let handle = spawn_with(context(), RenderMode::View);

        let event = handle
            .execute(
                command::change_kpi_widget_header(w("w1"), WidgetHeader::titled("Sales"))
                    .with_correlation_id("c-1"),
            )
            .await
            .unwrap();

        assert_eq!(event.correlation_id.as_deref(), Some("c-1"));
        let state = handle.state();
        assert_eq!(state.version, 1);
        assert_eq!(
            state.kpi_widget(&w("w1")).unwrap().header.title.as_deref(),
            Some("Sales")
        );
    }

    #[tokio::test]
    async fn rejection_keeps_version() {
        let handle = spawn_with(context(), RenderMode::View);
        let event = handle
            .execute(command::refresh_kpi_widget(w("missing")))
            .await
            .unwrap();
        assert!(event.is_rejection());
        assert_eq!(handle.state().version, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn state_is_readable_while_handler_is_suspended() {
        let backend = fixture_backend().with_latency("m.margin", Duration::from_secs(5));
        let handle = spawn_with(context_with(backend, true), RenderMode::View);

        let ticket = handle
            .submit(command::change_kpi_widget_measure(
                w("w1"),
                w("m.margin"),
                Some(MeasureHeader::from_measure()),
            ))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_secs(1)).await;
        let mid = handle.state();
        assert_eq!(mid.version, 0);
        assert_eq!(mid.kpi_widget(&w("w1")).unwrap().measure, w("m.revenue"));

        ticket.await.unwrap();
        assert_eq!(handle.state().kpi_widget(&w("w1")).unwrap().measure, w("m.margin"));
    }

    #[tokio::test(start_paused = true)]
    async fn reset_cancels_queued_but_not_running() {
        let backend = fixture_backend().with_latency("m.margin", Duration::from_secs(5));
        let handle = spawn_with(context_with(backend, true), RenderMode::Edit);

        let running = handle
            .submit(command::change_kpi_widget_measure(
                w("w1"),
                w("m.margin"),
                Some(MeasureHeader::from_measure()),
            ))
            .await
            .unwrap();
        // Let the runner pick it up and suspend on the backend.
        tokio::time::sleep(Duration::from_millis(1)).await;
        let queued = handle
            .submit(command::remove_section_item(0, 0))
            .await
            .unwrap();

        let reset = handle.reset(Some("r-1".into())).await.unwrap();
        assert_eq!(reset.payload, EventPayload::DashboardWasReset);
        assert_eq!(reset.correlation_id.as_deref(), Some("r-1"));

        assert!(!running.await.unwrap().is_rejection());
        assert_eq!(queued.await, Err(DispatchError::Cancelled));
        assert_eq!(handle.document(), sample_document());
    }

    #[tokio::test(start_paused = true)]
    async fn submitted_reset_command_cancels_queued() {
        let backend = fixture_backend().with_latency("m.margin", Duration::from_secs(5));
        let handle = spawn_with(context_with(backend, true), RenderMode::Edit);

        let running = handle
            .submit(command::change_kpi_widget_measure(
                w("w1"),
                w("m.margin"),
                Some(MeasureHeader::from_measure()),
            ))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(1)).await;
        let queued = handle
            .submit(command::refresh_kpi_widget(w("w1")))
            .await
            .unwrap();

        let reset = handle
            .submit(command::reset_dashboard().with_correlation_id("r-2"))
            .await
            .unwrap();

        assert!(!running.await.unwrap().is_rejection());
        assert_eq!(queued.await, Err(DispatchError::Cancelled));
        let reset = reset.await.unwrap();
        assert_eq!(reset.payload, EventPayload::DashboardWasReset);
        assert_eq!(reset.correlation_id.as_deref(), Some("r-2"));
        assert_eq!(handle.document(), sample_document());
    }

    #[tokio::test]
    async fn unmount_stops_runner() {
        let handle = spawn_with(context(), RenderMode::View);
        handle.unmount().await;
        assert!(!handle.is_alive());
        assert_eq!(
            handle.execute(command::reset_dashboard()).await,
            Err(DispatchError::RunnerGone)
        );
        // Second unmount is a no-op.
        handle.unmount().await;
    }

    #[tokio::test]
    async fn subscribers_receive_events_in_order() {
        let handle = spawn_with(context_with(InMemoryBackend::new(), true), RenderMode::View);
        let mut events = handle.subscribe();

        for id in ["a", "b", "c"] {
            handle
                .submit(command::select_widget(Some(w("w1"))).with_correlation_id(id))
                .await
                .unwrap();
        }
        let mut seen = Vec::new();
        for _ in 0..3 {
            seen.push(events.recv().await.unwrap().correlation_id.unwrap());
        }
        assert_eq!(seen, vec!["a", "b", "c"]);
    }
}
