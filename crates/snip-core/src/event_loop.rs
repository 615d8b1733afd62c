use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use kanal::{AsyncReceiver, AsyncSender};
use snip_config::Config;
use snip_types::{Region, SessionId, ToastId};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::coordinator::{CaptureCoordinator, completion_report};
use crate::effects::{Effect, Effects, SurfaceCommand, TimerKey, ToastCommand};
use crate::events::{LoopEvent, OverlayInput, ToastInput};
use crate::pipeline::{CaptureBackend, DestinationSink, RecognitionEngine};
use crate::stats::SessionStats;
use crate::toast::ToastRegistry;

/// The selection surface as seen from the loop
pub trait OverlayPresenter: Send {
    /// Frame of the display the overlay should cover, `None` if there is none
    fn screen_frame(&self) -> Option<Region>;

    fn apply(&mut self, session: SessionId, command: SurfaceCommand);
}

pub trait ToastPresenter: Send {
    fn apply(&mut self, toast: ToastId, command: ToastCommand);
}

pub type CompletionCallback = Box<dyn FnMut(bool, Option<String>) + Send>;

#[derive(Clone)]
pub struct Collaborators {
    pub capture: Arc<dyn CaptureBackend>,
    pub recognizer: Arc<dyn RecognitionEngine>,
    pub sink: Arc<dyn DestinationSink>,
}

/// Cloneable way into the loop, usable from any thread
#[derive(Clone)]
pub struct LoopHandle {
    tx: AsyncSender<LoopEvent>,
}

impl LoopHandle {
    /// Returns false once the loop is gone
    pub fn post(&self, event: LoopEvent) -> bool {
        match self.tx.try_send(event) {
            Ok(sent) => sent,
            Err(e) => {
                tracing::debug!("[EVENT_LOOP] post failed: {}", e);
                false
            }
        }
    }

    pub fn trigger(&self) -> bool {
        self.post(LoopEvent::Trigger)
    }

    pub fn cancel(&self) -> bool {
        self.post(LoopEvent::Cancel)
    }

    pub fn shutdown(&self) -> bool {
        self.post(LoopEvent::Shutdown)
    }

    pub fn overlay(&self, session: SessionId, input: OverlayInput) -> bool {
        self.post(LoopEvent::overlay(session, input))
    }

    pub fn toast(&self, toast: ToastId, input: ToastInput) -> bool {
        self.post(LoopEvent::Toast { toast, input })
    }
}

struct ArmedTimer {
    generation: u64,
    repeat: bool,
    task: JoinHandle<()>,
}

pub struct EventLoop {
    coordinator: CaptureCoordinator,
    overlay: Box<dyn OverlayPresenter>,
    toasts: Box<dyn ToastPresenter>,
    collaborators: Collaborators,
    on_complete: CompletionCallback,
    tx: AsyncSender<LoopEvent>,
    rx: AsyncReceiver<LoopEvent>,
    timers: HashMap<TimerKey, ArmedTimer>,
    generation: u64,
    cancel_token: CancellationToken,
}

impl EventLoop {
    pub fn new(
        config: &Config,
        overlay: Box<dyn OverlayPresenter>,
        toasts: Box<dyn ToastPresenter>,
        collaborators: Collaborators,
        on_complete: CompletionCallback,
    ) -> Self {
        let (tx, rx) = kanal::unbounded_async();
        Self {
            coordinator: CaptureCoordinator::new(config, ToastRegistry::new()),
            overlay,
            toasts,
            collaborators,
            on_complete,
            tx,
            rx,
            timers: HashMap::new(),
            generation: 0,
            cancel_token: CancellationToken::new(),
        }
    }

    pub fn handle(&self) -> LoopHandle {
        LoopHandle {
            tx: self.tx.clone(),
        }
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    pub fn coordinator(&self) -> &CaptureCoordinator {
        &self.coordinator
    }

    /// Process events until shutdown, returning the final statistics
    pub async fn run(mut self) -> anyhow::Result<SessionStats> {
        tracing::info!("[EVENT_LOOP] Starting capture loop");
        let cancel = self.cancel_token.clone();

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("[EVENT_LOOP] Cancelled");
                    break;
                }
                event = self.rx.recv() => {
                    let Ok(event) = event else {
                        tracing::warn!("[EVENT_LOOP] Channel closed");
                        break;
                    };
                    if !self.dispatch(event) {
                        break;
                    }
                }
            }
        }

        for (_, timer) in self.timers.drain() {
            timer.task.abort();
        }
        let stats = self.coordinator.stats().clone();
        tracing::info!(
            sessions = stats.sessions,
            completed = stats.completed(),
            successes = stats.successes,
            failures = stats.failures,
            "[EVENT_LOOP] Stopped"
        );
        Ok(stats)
    }

    /// Handle one event to completion. Returns false on shutdown.
    pub fn dispatch(&mut self, event: LoopEvent) -> bool {
        tracing::trace!(event = event.name(), "[EVENT_LOOP] dispatch");
        let mut fx = Effects::new();

        match event {
            LoopEvent::Trigger => {
                let frame = self.overlay.screen_frame();
                match self.coordinator.start(frame, &mut fx) {
                    Ok(session) => tracing::info!(%session, "[EVENT_LOOP] Capture triggered"),
                    Err(e) => tracing::info!("[EVENT_LOOP] Trigger rejected: {}", e),
                }
            }
            LoopEvent::Cancel => self.coordinator.cancel(&mut fx),
            LoopEvent::Shutdown => {
                tracing::info!("[EVENT_LOOP] Shutdown requested");
                self.coordinator.shutdown(&mut fx);
                self.apply(fx);
                self.cancel_token.cancel();
                return false;
            }
            LoopEvent::Timer { key, generation } => {
                let Some(timer) = self.timers.get(&key) else {
                    return true;
                };
                if timer.generation != generation {
                    tracing::trace!(?key, "[EVENT_LOOP] stale timer");
                    return true;
                }
                if !timer.repeat {
                    self.timers.remove(&key);
                }
                self.coordinator.on_timer(key, &mut fx);
            }
            other => self.coordinator.handle(other, &mut fx),
        }

        self.apply(fx);
        true
    }

    fn apply(&mut self, mut fx: Effects) {
        for effect in fx.drain() {
            match effect {
                Effect::Surface(session, command) => self.overlay.apply(session, command),
                Effect::Toast(toast, command) => self.toasts.apply(toast, command),
                Effect::StartTimer { key, after, repeat } => self.start_timer(key, after, repeat),
                Effect::CancelTimer(key) => self.cancel_timer(key),
                Effect::Defer(event) => {
                    if let Err(e) = self.tx.try_send(event) {
                        tracing::error!("[EVENT_LOOP] failed to defer event: {}", e);
                    }
                }
                Effect::Capture(session, region) => {
                    let backend = self.collaborators.capture.clone();
                    let tx = self.tx.clone();
                    tokio::spawn(async move {
                        let result = backend.capture(region).await;
                        let _ = tx.send(LoopEvent::Captured { session, result }).await;
                    });
                }
                Effect::Recognize(session, image) => {
                    let engine = self.collaborators.recognizer.clone();
                    let tx = self.tx.clone();
                    tokio::spawn(async move {
                        let result = engine.recognize(image).await;
                        let _ = tx.send(LoopEvent::Recognized { session, result }).await;
                    });
                }
                Effect::Write(session, text) => {
                    let sink = self.collaborators.sink.clone();
                    let tx = self.tx.clone();
                    tokio::spawn(async move {
                        let result = sink.write(&text);
                        let _ = tx.send(LoopEvent::Written { session, result }).await;
                    });
                }
                Effect::Complete { session, outcome } => {
                    let (success, message) = completion_report(&outcome);
                    tracing::debug!(%session, success, "[EVENT_LOOP] Session complete");
                    (self.on_complete)(success, message);
                }
            }
        }
    }

    fn start_timer(&mut self, key: TimerKey, after: Duration, repeat: bool) {
        self.cancel_timer(key);
        self.generation += 1;
        let generation = self.generation;
        let tx = self.tx.clone();

        let task = tokio::spawn(async move {
            if repeat {
                let mut interval = tokio::time::interval_at(Instant::now() + after, after);
                interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
                loop {
                    interval.tick().await;
                    if tx.send(LoopEvent::Timer { key, generation }).await.is_err() {
                        break;
                    }
                }
            } else {
                tokio::time::sleep(after).await;
                let _ = tx.send(LoopEvent::Timer { key, generation }).await;
            }
        });

        self.timers.insert(
            key,
            ArmedTimer {
                generation,
                repeat,
                task,
            },
        );
    }

    fn cancel_timer(&mut self, key: TimerKey) {
        if let Some(timer) = self.timers.remove(&key) {
            timer.task.abort();
        }
    }
}
