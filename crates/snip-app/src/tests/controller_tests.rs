use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use kanal::AsyncReceiver;
use snip_config::Config;
use snip_core::{
    CaptureBackend, Collaborators, DestinationSink, EventLoop, LoopHandle, RecognitionEngine,
    SurfaceCommand,
};
use snip_types::{
    CaptureError, RasterImage, RecognitionError, RecognizedText, Region, SinkError,
};
use snip_ui::{UiBridge, UiCommand};
use tokio::task::JoinSet;
use tokio::time::timeout;

use crate::controller::{AppController, join_tasks};

const FRAME: Region = Region::new(0, 0, 1280, 720);

struct BlankCapture;

#[async_trait]
impl CaptureBackend for BlankCapture {
    async fn capture(&self, region: Region) -> Result<RasterImage, CaptureError> {
        let len = (region.width * region.height * 4) as usize;
        Ok(RasterImage::new(region.width, region.height, vec![0; len]))
    }
}

struct EchoRecognizer;

#[async_trait]
impl RecognitionEngine for EchoRecognizer {
    async fn recognize(&self, _image: RasterImage) -> Result<RecognizedText, RecognitionError> {
        Ok(RecognizedText::new("text"))
    }
}

struct NullSink;

impl DestinationSink for NullSink {
    fn write(&self, _text: &str) -> Result<(), SinkError> {
        Ok(())
    }
}

fn start(controller: &AppController) -> (LoopHandle, AsyncReceiver<UiCommand>, JoinSet<anyhow::Result<()>>) {
    let bridge = UiBridge::new(Box::new(|| Some(FRAME)));
    let event_loop = EventLoop::new(
        &Config::default(),
        Box::new(bridge.surface),
        Box::new(bridge.toasts),
        Collaborators {
            capture: Arc::new(BlankCapture),
            recognizer: Arc::new(EchoRecognizer),
            sink: Arc::new(NullSink),
        },
        Box::new(|_, _| {}),
    );
    let (handle, tasks) = controller.spawn_tasks(event_loop, None);
    (handle, bridge.commands, tasks)
}

#[tokio::test]
async fn trigger_reaches_the_ui_thread() {
    let controller = AppController::new(Config::default());
    let (handle, commands, tasks) = start(&controller);

    assert!(handle.trigger());
    let first = timeout(Duration::from_secs(5), commands.recv())
        .await
        .expect("no ui command")
        .expect("bridge closed");
    assert!(matches!(
        first,
        UiCommand::Surface(_, SurfaceCommand::Show { frame }) if frame == FRAME
    ));

    controller.shutdown();
    timeout(Duration::from_secs(5), join_tasks(tasks))
        .await
        .expect("tasks did not stop");
}

#[tokio::test]
async fn shutdown_closes_the_active_overlay_and_stops_the_loop() {
    let controller = AppController::new(Config::default());
    let (handle, commands, tasks) = start(&controller);

    assert!(handle.trigger());
    controller.shutdown();
    timeout(Duration::from_secs(5), join_tasks(tasks))
        .await
        .expect("tasks did not stop");

    let mut closed = false;
    while let Ok(Some(command)) = commands.try_recv() {
        closed |= matches!(command, UiCommand::Surface(_, SurfaceCommand::Close));
    }
    assert!(closed, "overlay left open after shutdown");
    assert!(!handle.trigger(), "loop still accepting events");
}
