//! Fake surfaces and collaborators for driving a real `EventLoop`.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use kanal::{AsyncReceiver, AsyncSender};
use snip_config::Config;
use snip_types::{
    CaptureError, Point, RasterImage, RecognitionError, RecognizedText, Region, SessionId,
    SinkError, ToastId,
};
use tokio::task::JoinHandle;
use tokio::time::{Instant, timeout};

use crate::{
    CaptureBackend, Collaborators, DestinationSink, EventLoop, FocusSignals, LoopHandle,
    OverlayInput, OverlayPresenter, RecognitionEngine, SessionStats, SurfaceCommand,
    ToastCommand, ToastInput, ToastPresenter,
};

pub const FRAME: Region = Region::new(0, 0, 1920, 1080);

#[derive(Debug, Clone, Copy)]
pub enum UserAction {
    Drag(Point, Point),
    Escape,
    Nothing,
}

pub struct Scenario {
    pub text: &'static str,
    pub action: UserAction,
    pub signals: FocusSignals,
    pub frame: Option<Region>,
}

impl Default for Scenario {
    fn default() -> Self {
        Self {
            text: "HELLO WORLD",
            action: UserAction::Drag(Point::new(100, 100), Point::new(500, 180)),
            signals: FocusSignals::ACQUIRED,
            frame: Some(FRAME),
        }
    }
}

struct ChannelSurface {
    frame: Option<Region>,
    tx: AsyncSender<(SessionId, SurfaceCommand)>,
}

impl OverlayPresenter for ChannelSurface {
    fn screen_frame(&self) -> Option<Region> {
        self.frame
    }

    fn apply(&mut self, session: SessionId, command: SurfaceCommand) {
        let _ = self.tx.try_send((session, command));
    }
}

struct ChannelToasts {
    tx: AsyncSender<(ToastId, ToastCommand)>,
}

impl ToastPresenter for ChannelToasts {
    fn apply(&mut self, toast: ToastId, command: ToastCommand) {
        let _ = self.tx.try_send((toast, command));
    }
}

struct SolidCapture;

#[async_trait]
impl CaptureBackend for SolidCapture {
    async fn capture(&self, region: Region) -> Result<RasterImage, CaptureError> {
        let len = (region.width * region.height * 4) as usize;
        Ok(RasterImage::new(region.width, region.height, vec![255; len]))
    }
}

struct FixedRecognizer(&'static str);

#[async_trait]
impl RecognitionEngine for FixedRecognizer {
    async fn recognize(&self, _image: RasterImage) -> Result<RecognizedText, RecognitionError> {
        Ok(RecognizedText::new(self.0))
    }
}

#[derive(Clone, Default)]
pub struct RecordingSink {
    writes: Arc<Mutex<Vec<String>>>,
}

impl RecordingSink {
    pub fn writes(&self) -> Vec<String> {
        self.writes.lock().unwrap().clone()
    }
}

impl DestinationSink for RecordingSink {
    fn write(&self, text: &str) -> Result<(), SinkError> {
        self.writes.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

pub type ToastLog = Arc<Mutex<Vec<(Instant, ToastId, ToastCommand)>>>;
pub type CompletionLog = Arc<Mutex<Vec<(bool, Option<String>)>>>;

pub struct Harness {
    pub handle: LoopHandle,
    pub sink: RecordingSink,
    completions: AsyncReceiver<(bool, Option<String>)>,
    completion_log: CompletionLog,
    surface_log: Arc<Mutex<Vec<SurfaceCommand>>>,
    toast_log: ToastLog,
    task: JoinHandle<anyhow::Result<SessionStats>>,
}

impl Harness {
    pub fn start(scenario: Scenario) -> Self {
        let (surface_tx, surface_rx) = kanal::unbounded_async();
        let (toast_tx, toast_rx) = kanal::unbounded_async();
        let (done_tx, done_rx) = kanal::unbounded_async();
        let sink = RecordingSink::default();
        let completion_log: CompletionLog = Arc::new(Mutex::new(Vec::new()));

        let collaborators = Collaborators {
            capture: Arc::new(SolidCapture),
            recognizer: Arc::new(FixedRecognizer(scenario.text)),
            sink: Arc::new(sink.clone()),
        };
        let event_loop = EventLoop::new(
            &Config::default(),
            Box::new(ChannelSurface {
                frame: scenario.frame,
                tx: surface_tx,
            }),
            Box::new(ChannelToasts { tx: toast_tx }),
            collaborators,
            Box::new({
                let completion_log = completion_log.clone();
                move |success, message: Option<String>| {
                    completion_log.lock().unwrap().push((success, message.clone()));
                    let _ = done_tx.try_send((success, message));
                }
            }),
        );
        let handle = event_loop.handle();

        let surface_log = Arc::new(Mutex::new(Vec::new()));
        let toast_log: ToastLog = Arc::new(Mutex::new(Vec::new()));
        tokio::spawn(simulate_surface(
            surface_rx,
            handle.clone(),
            scenario.signals,
            scenario.action,
            surface_log.clone(),
        ));
        tokio::spawn(simulate_toasts(toast_rx, handle.clone(), toast_log.clone()));
        let task = tokio::spawn(event_loop.run());

        Self {
            handle,
            sink,
            completions: done_rx,
            completion_log,
            surface_log,
            toast_log,
            task,
        }
    }

    pub async fn next_completion(&self) -> (bool, Option<String>) {
        timeout(Duration::from_secs(10), self.completions.recv())
            .await
            .expect("completion timed out")
            .expect("loop closed")
    }

    pub fn pending_completions(&self) -> usize {
        self.completions.len()
    }

    pub fn surface_commands(&self) -> Vec<SurfaceCommand> {
        self.surface_log.lock().unwrap().clone()
    }

    pub fn toast_events(&self) -> Vec<(Instant, ToastId, ToastCommand)> {
        self.toast_log.lock().unwrap().clone()
    }

    /// Wait until `count` toasts have been released
    pub async fn toasts_released(&self, count: usize) {
        let released = async {
            loop {
                let done = self
                    .toast_log
                    .lock()
                    .unwrap()
                    .iter()
                    .filter(|(_, _, c)| *c == ToastCommand::Release)
                    .count();
                if done >= count {
                    return;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        };
        timeout(Duration::from_secs(10), released)
            .await
            .expect("toast never released");
    }

    /// Every completion the loop reported, including ones already received
    pub fn completion_log(&self) -> CompletionLog {
        self.completion_log.clone()
    }

    pub async fn shutdown(self) -> SessionStats {
        self.handle.shutdown();
        self.task
            .await
            .expect("loop panicked")
            .expect("loop failed")
    }
}

/// Plays the part of the windowing toolkit and the user
async fn simulate_surface(
    rx: AsyncReceiver<(SessionId, SurfaceCommand)>,
    handle: LoopHandle,
    signals: FocusSignals,
    action: UserAction,
    log: Arc<Mutex<Vec<SurfaceCommand>>>,
) {
    let mut acted = HashSet::new();

    while let Ok((session, command)) = rx.recv().await {
        log.lock().unwrap().push(command.clone());

        match command {
            SurfaceCommand::ProbeFocus => {
                handle.overlay(session, OverlayInput::FocusProbed(signals));
                if acted.insert(session) {
                    perform(&handle, session, action);
                }
            }
            SurfaceCommand::SetNativeCrosshair(true) => {
                handle.overlay(session, OverlayInput::NativeCursorUpdated);
            }
            SurfaceCommand::Close => {
                handle.overlay(session, OverlayInput::SurfaceClosed);
            }
            _ => {}
        }
    }
}

fn perform(handle: &LoopHandle, session: SessionId, action: UserAction) {
    match action {
        UserAction::Drag(from, to) => {
            handle.overlay(session, OverlayInput::PointerDown(from));
            handle.overlay(session, OverlayInput::PointerDragged(to));
            handle.overlay(session, OverlayInput::PointerUp(to));
        }
        UserAction::Escape => {
            handle.overlay(session, OverlayInput::CancelKey);
        }
        UserAction::Nothing => {}
    }
}

async fn simulate_toasts(
    rx: AsyncReceiver<(ToastId, ToastCommand)>,
    handle: LoopHandle,
    log: ToastLog,
) {
    while let Ok((toast, command)) = rx.recv().await {
        log.lock().unwrap().push((Instant::now(), toast, command.clone()));

        if let ToastCommand::AnimateContent { alpha, over } = command {
            let handle = handle.clone();
            tokio::spawn(async move {
                tokio::time::sleep(over).await;
                let input = if alpha > 0.0 {
                    ToastInput::FadedIn
                } else {
                    ToastInput::FadedOut
                };
                handle.toast(toast, input);
            });
        }
    }
}
