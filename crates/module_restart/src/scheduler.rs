//! # Restart Scheduler
//!
//! One scheduler runs per region as a tokio task that owns the countdown.
//! The public [`RestartScheduler`] handle only enqueues commands; the task
//! processes them and its own timer elapses strictly one at a time, so the
//! alert list and the timer are never touched from two places at once.
//!
//! ## Countdown
//!
//! 1. `schedule_restart` sorts the offsets, announces the largest and arms
//!    the timer for the gap to the next one
//! 2. Every elapse announces the next offset and re-arms
//! 3. Reaching offset `0` announces "0 seconds" and restarts; running out of
//!    offsets restarts without a further notice
//!
//! `delay_restart` rebuilds the countdown from the top with an extra leading
//! offset and `abort_restart` drops it.

use crate::alerts::AlertQueue;
use crate::error::RestartError;
use crate::marker::MarkerFile;
use crate::notice::{format_countdown, render_notice};
use crate::settings::RestartSettings;
use region_event_system::{
    current_timestamp, AgentId, Event, RegionId, RegionRestartingEvent, RestartAbortedEvent,
    RestartNoticeEvent, RestartScheduledEvent, SceneContext,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

/// Source name shown on blue-box region notifications.
pub const NOTIFICATION_SOURCE: &str = "System";

/// Deadlines further out than this are clamped, so huge offsets never
/// overflow `Instant`.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// Lifecycle of a region's countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownState {
    /// No countdown is running
    Idle,
    /// Waiting for the next timer elapse
    Counting,
    /// Announcing a notice or performing the restart
    Firing,
}

/// Snapshot of a region's countdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestartStatus {
    pub state: CountdownState,
    /// Time left until the restart fires
    pub time_until_restart: Option<Duration>,
    /// Offsets still to be announced, largest first
    pub pending_alerts: Vec<u64>,
    pub initiator: Option<AgentId>,
    /// Whether notices go out as general alerts rather than region notifications
    pub notice: bool,
}

impl RestartStatus {
    fn idle(state: CountdownState) -> Self {
        Self {
            state,
            time_until_restart: None,
            pending_alerts: Vec::new(),
            initiator: None,
            notice: false,
        }
    }

    pub fn is_active(&self) -> bool {
        self.time_until_restart.is_some()
    }
}

#[derive(Debug)]
enum SchedulerCommand {
    Schedule {
        initiator: AgentId,
        message: String,
        alerts: Option<Vec<u64>>,
        notice: bool,
    },
    Delay {
        seconds: u64,
        message: String,
    },
    Abort {
        message: String,
    },
    Status {
        reply: oneshot::Sender<RestartStatus>,
    },
    Stop,
}

/// Handle to a region's scheduler task.
#[derive(Debug, Clone)]
pub struct RestartScheduler {
    region_id: RegionId,
    commands: mpsc::UnboundedSender<SchedulerCommand>,
}

impl RestartScheduler {
    /// Starts the scheduler task for `scene`.
    pub fn spawn(scene: Arc<dyn SceneContext>, settings: RestartSettings) -> (Self, JoinHandle<()>) {
        let region_id = scene.region_info().region_id;
        let (sender, receiver) = mpsc::unbounded_channel();

        let actor = SchedulerActor {
            marker: settings
                .marker_path
                .as_deref()
                .map(|directory| MarkerFile::new(directory, region_id)),
            scene,
            region_id,
            settings,
            state: CountdownState::Idle,
            countdown: None,
            commands: receiver,
        };
        let task = tokio::spawn(actor.run());

        (
            Self {
                region_id,
                commands: sender,
            },
            task,
        )
    }

    pub fn region_id(&self) -> RegionId {
        self.region_id
    }

    /// Starts (or replaces) the countdown.
    ///
    /// `alerts` are second offsets before the restart at which a notice is
    /// sent; `None` restarts immediately without any notice. `message` may
    /// contain `{0}`, replaced by the remaining time.
    pub fn schedule_restart(
        &self,
        initiator: AgentId,
        message: impl Into<String>,
        alerts: Option<Vec<u64>>,
        notice: bool,
    ) -> Result<(), RestartError> {
        self.send(SchedulerCommand::Schedule {
            initiator,
            message: message.into(),
            alerts,
            notice,
        })
    }

    /// Pushes the active countdown back by `seconds`. Ignored when idle.
    pub fn delay_restart(&self, seconds: u64, message: impl Into<String>) -> Result<(), RestartError> {
        self.send(SchedulerCommand::Delay {
            seconds,
            message: message.into(),
        })
    }

    /// Cancels the active countdown. Ignored when idle.
    pub fn abort_restart(&self, message: impl Into<String>) -> Result<(), RestartError> {
        self.send(SchedulerCommand::Abort {
            message: message.into(),
        })
    }

    pub async fn status(&self) -> Result<RestartStatus, RestartError> {
        let (reply, response) = oneshot::channel();
        self.send(SchedulerCommand::Status { reply })?;
        response
            .await
            .map_err(|_| RestartError::SchedulerStopped(self.region_id))
    }

    /// Remaining time of the active countdown, `None` when idle.
    pub async fn time_until_restart(&self) -> Result<Option<Duration>, RestartError> {
        Ok(self.status().await?.time_until_restart)
    }

    /// Stops the scheduler task, dropping any countdown.
    pub fn stop(&self) {
        let _ = self.commands.send(SchedulerCommand::Stop);
    }

    pub fn is_running(&self) -> bool {
        !self.commands.is_closed()
    }

    fn send(&self, command: SchedulerCommand) -> Result<(), RestartError> {
        self.commands
            .send(command)
            .map_err(|_| RestartError::SchedulerStopped(self.region_id))
    }
}

/// Active countdown owned by the scheduler task.
#[derive(Debug)]
struct Countdown {
    initiator: AgentId,
    message: String,
    notice: bool,
    /// Offsets as first scheduled, kept for delays
    offsets: Vec<u64>,
    queue: AlertQueue,
    next_tick: Instant,
    restart_at: Instant,
}

struct SchedulerActor {
    scene: Arc<dyn SceneContext>,
    region_id: RegionId,
    settings: RestartSettings,
    marker: Option<MarkerFile>,
    state: CountdownState,
    countdown: Option<Countdown>,
    commands: mpsc::UnboundedReceiver<SchedulerCommand>,
}

impl SchedulerActor {
    async fn run(mut self) {
        debug!("⏱️ Restart scheduler started for region {}", self.region_id);

        loop {
            let next_tick = self.countdown.as_ref().map(|countdown| countdown.next_tick);

            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(SchedulerCommand::Stop) | None => break,
                    Some(command) => self.handle(command).await,
                },
                _ = wait_until(next_tick) => self.on_tick().await,
            }
        }

        if self.countdown.take().is_some() {
            info!("🛑 Restart countdown for region {} dropped: scheduler stopped", self.region_id);
        }
        debug!("⏱️ Restart scheduler stopped for region {}", self.region_id);
    }

    async fn handle(&mut self, command: SchedulerCommand) {
        match command {
            SchedulerCommand::Schedule {
                initiator,
                message,
                alerts,
                notice,
            } => self.schedule(initiator, message, alerts, notice).await,
            SchedulerCommand::Delay { seconds, message } => self.delay(seconds, message).await,
            SchedulerCommand::Abort { message } => self.abort(message).await,
            SchedulerCommand::Status { reply } => {
                let _ = reply.send(self.status());
            }
            SchedulerCommand::Stop => {}
        }
    }

    async fn schedule(
        &mut self,
        initiator: AgentId,
        message: String,
        alerts: Option<Vec<u64>>,
        notice: bool,
    ) {
        if self.countdown.take().is_some() {
            info!("🔁 Replacing active restart countdown for region {}", self.region_id);
        }

        let Some(offsets) = alerts else {
            info!("🔄 Immediate restart requested for region {}", self.region_id);
            self.restart().await;
            return;
        };

        let queue = AlertQueue::new(offsets.iter().copied());
        let total = queue.head().unwrap_or(0);
        info!(
            "⏳ Region {} restart scheduled in {} ({} notices)",
            self.region_id,
            format_countdown(total),
            queue.len()
        );
        self.emit(
            "restart_scheduled",
            &RestartScheduledEvent {
                region_id: self.region_id,
                initiator,
                seconds_until_restart: total,
                timestamp: current_timestamp(),
            },
        )
        .await;

        if self.region_is_empty() {
            info!("🏃 Region {} is empty, skipping restart delay", self.region_id);
            self.restart().await;
            return;
        }

        let now = Instant::now();
        self.countdown = Some(Countdown {
            initiator,
            message,
            notice,
            offsets,
            queue,
            next_tick: now,
            restart_at: deadline_after(now, total),
        });
        self.advance(true).await;
    }

    async fn delay(&mut self, seconds: u64, message: String) {
        let Some(mut countdown) = self.countdown.take() else {
            debug!("No restart countdown in region {}; delay ignored", self.region_id);
            return;
        };

        let top = countdown.offsets.iter().copied().max().unwrap_or(0);
        let total = top.saturating_add(seconds);
        countdown.queue = AlertQueue::new(countdown.offsets.iter().copied().chain([total]));
        countdown.restart_at = deadline_after(Instant::now(), total);

        info!(
            "⏸️ Region {} restart delayed by {}, now in {}",
            self.region_id,
            format_countdown(seconds),
            format_countdown(total)
        );

        if !message.is_empty() {
            let text = render_notice(&message, total);
            self.deliver(countdown.initiator, countdown.notice, &text);
        }
        self.emit(
            "restart_scheduled",
            &RestartScheduledEvent {
                region_id: self.region_id,
                initiator: countdown.initiator,
                seconds_until_restart: total,
                timestamp: current_timestamp(),
            },
        )
        .await;

        self.countdown = Some(countdown);
        self.advance(false).await;
    }

    async fn abort(&mut self, message: String) {
        if self.countdown.take().is_none() {
            debug!("No restart countdown in region {}; abort ignored", self.region_id);
            return;
        }
        self.state = CountdownState::Idle;

        if let Some(marker) = &self.marker {
            marker.delete().await;
        }
        if !message.is_empty() {
            match self.scene.dialog() {
                Some(dialog) => dialog.send_general_alert(&message),
                None => debug!("No dialog module in region {}; abort message dropped", self.region_id),
            }
        }

        info!("🛑 Region {} restart aborted", self.region_id);
        self.emit(
            "restart_aborted",
            &RestartAbortedEvent {
                region_id: self.region_id,
                message,
                timestamp: current_timestamp(),
            },
        )
        .await;
    }

    async fn on_tick(&mut self) {
        if self.region_is_empty() {
            info!("🏃 Region {} emptied during countdown, restarting now", self.region_id);
            self.countdown = None;
            self.restart().await;
            return;
        }
        self.advance(true).await;
    }

    /// Moves the countdown one step: announce the head offset and re-arm, or
    /// restart once the queue is due.
    async fn advance(&mut self, announce: bool) {
        let Some(mut countdown) = self.countdown.take() else {
            self.state = CountdownState::Idle;
            return;
        };
        self.state = CountdownState::Firing;

        if countdown.queue.is_due() {
            if announce && countdown.queue.head() == Some(0) {
                self.announce(&countdown, 0).await;
            }
            self.restart().await;
            return;
        }

        let Some(step) = countdown.queue.pop() else {
            self.restart().await;
            return;
        };
        let now = Instant::now();
        countdown.next_tick = deadline_after(now, step.next_interval);
        countdown.restart_at = deadline_after(now, step.remaining);

        if announce {
            self.announce(&countdown, step.remaining).await;
        } else {
            debug!(
                "Region {} countdown resumed silently at {}",
                self.region_id,
                format_countdown(step.remaining)
            );
        }

        self.countdown = Some(countdown);
        self.state = CountdownState::Counting;
    }

    async fn announce(&self, countdown: &Countdown, remaining: u64) {
        let text = render_notice(&countdown.message, remaining);
        let delivered = if text.is_empty() {
            debug!("Empty restart notice for region {}; skipped", self.region_id);
            false
        } else {
            self.deliver(countdown.initiator, countdown.notice, &text)
        };

        info!("📢 Region {} restart notice: {}", self.region_id, format_countdown(remaining));
        self.emit(
            "restart_notice",
            &RestartNoticeEvent {
                region_id: self.region_id,
                seconds_remaining: remaining,
                message: text,
                delivered,
            },
        )
        .await;
    }

    /// Sends text through the dialog module. Returns whether it was handed off.
    fn deliver(&self, initiator: AgentId, notice: bool, text: &str) -> bool {
        let Some(dialog) = self.scene.dialog() else {
            debug!("No dialog module in region {}; notice dropped", self.region_id);
            return false;
        };

        if notice {
            dialog.send_general_alert(text);
        } else {
            dialog.send_notification_to_users_in_region(initiator, NOTIFICATION_SOURCE, text);
        }
        true
    }

    async fn restart(&mut self) {
        self.state = CountdownState::Firing;
        self.countdown = None;

        if let Some(marker) = &self.marker {
            marker.create().await;
        }

        let shutting_down = self.settings.inworld_restart_shuts_down;
        self.emit(
            "region_restarting",
            &RegionRestartingEvent {
                region_id: self.region_id,
                shutting_down,
                timestamp: current_timestamp(),
            },
        )
        .await;

        let result = if shutting_down {
            warn!("🔌 Region {} restart shuts the simulator down", self.region_id);
            self.scene.request_shutdown().await
        } else {
            info!("🔄 Restarting region {}", self.region_id);
            self.scene.restart_now().await
        };
        if let Err(e) = result {
            error!("❌ Region {} restart request failed: {}", self.region_id, e);
        }

        self.state = CountdownState::Idle;
    }

    fn status(&self) -> RestartStatus {
        let Some(countdown) = &self.countdown else {
            return RestartStatus::idle(self.state);
        };

        RestartStatus {
            state: self.state,
            time_until_restart: Some(countdown.restart_at.saturating_duration_since(Instant::now())),
            pending_alerts: countdown.queue.as_slice().to_vec(),
            initiator: Some(countdown.initiator),
            notice: countdown.notice,
        }
    }

    fn region_is_empty(&self) -> bool {
        self.settings.skip_delay_on_empty_region && self.scene.root_agent_count() == 0
    }

    async fn emit<T: Event>(&self, event_name: &str, event: &T) {
        if let Err(e) = self.scene.events().emit_core(event_name, event).await {
            warn!("⚠️ Failed to emit {} for region {}: {}", event_name, self.region_id, e);
        }
    }
}

fn deadline_after(now: Instant, seconds: u64) -> Instant {
    let offset = Duration::from_secs(seconds).min(FAR_FUTURE);
    now.checked_add(offset).unwrap_or(now)
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending::<()>().await,
    }
}
