use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use snip_capture::{HotkeyManager, ScreenCapture, SystemRecognizer};
use snip_config::Config;
use snip_config::log::LogFormat;
use snip_core::{Collaborators, EventLoop};
use snip_io::ClipboardSink;
use snip_ui::{UiBridge, UiOptions};
use tokio::signal;

use self::controller::{AppController, join_tasks};

mod controller;
mod logging;
mod profile;

#[cfg(test)]
mod tests;

#[derive(Parser, Debug)]
#[command(name = "snip", version, about = "Select a screen region and copy its text")]
struct Args {
    /// Profile to load from the user config directory
    #[arg(long, default_value = "main")]
    profile: String,

    /// Start a capture session immediately
    #[arg(long)]
    capture_now: bool,

    /// Override the configured log format (pretty, compact, json)
    #[arg(long, value_parser = parse_log_format)]
    log_format: Option<LogFormat>,

    /// Create a new profile cloned from main and exit
    #[arg(long, value_name = "NAME")]
    new_profile: Option<String>,
}

fn parse_log_format(value: &str) -> Result<LogFormat, String> {
    LogFormat::parse(value).ok_or_else(|| format!("unknown log format '{value}'"))
}

/// Profile, then environment, then command line
fn load_config(args: &Args) -> (Config, Option<anyhow::Error>) {
    let (base, error) = match profile::init_user_config()
        .and_then(|()| profile::load_user_profile(&args.profile))
    {
        Ok(config) => (config, None),
        Err(e) => (Config::default(), Some(e)),
    };

    let mut config = base.with_env();
    if let Some(format) = args.log_format {
        config.log.format = format;
    }
    (config, error)
}

fn report_completion(success: bool, message: Option<String>) {
    match (success, message) {
        (true, Some(text)) => {
            tracing::info!(chars = text.chars().count(), "recognized text copied")
        }
        (false, Some(error)) => tracing::info!(%error, "capture session ended without text"),
        (_, None) => tracing::info!("capture session ended"),
    }
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let (config, profile_error) = load_config(&args);
    logging::init(&config.log)?;
    if let Some(e) = profile_error {
        tracing::warn!("Failed to load profile '{}', using defaults: {e:#}", args.profile);
    }

    if let Some(name) = &args.new_profile {
        let path = profile::add_profile_from_default(name)?;
        println!("{}", path.display());
        return Ok(());
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to build tokio runtime")?;

    // Registered on the thread that will run the platform event loop
    let hotkey = match HotkeyManager::register(&config.hotkey) {
        Ok(manager) => Some(manager),
        Err(e) => {
            tracing::warn!("Capture hotkey unavailable: {e:#}");
            None
        }
    };

    match snip_capture::monitor_frames() {
        Ok(frames) => tracing::info!(displays = frames.len(), ?frames, "displays detected"),
        Err(e) => tracing::warn!("Failed to enumerate displays: {e:#}"),
    }

    let recognizer = SystemRecognizer::new(config.ocr.language.clone());
    match recognizer.probe() {
        Ok(tag) => tracing::info!(language = %tag, "text recognizer ready"),
        Err(e) => tracing::warn!("Text recognizer unavailable: {e:#}"),
    }
    let collaborators = Collaborators {
        capture: Arc::new(ScreenCapture::new()),
        recognizer: Arc::new(recognizer),
        sink: Arc::new(ClipboardSink::new()),
    };

    let bridge = UiBridge::new(Box::new(snip_capture::primary_frame));
    let event_loop = EventLoop::new(
        &config,
        Box::new(bridge.surface),
        Box::new(bridge.toasts),
        collaborators,
        Box::new(report_completion),
    );

    let controller = AppController::new(config.clone());
    let (handle, tasks) = {
        let _runtime = runtime.enter();
        controller.spawn_tasks(event_loop, hotkey.as_ref().map(HotkeyManager::id))
    };

    // Ctrl+C leaves the UI loop, which in turn shuts everything down
    {
        let quitter = bridge.quitter.clone();
        let cancel = controller.cancel_token();
        runtime.spawn(async move {
            tokio::select! {
                result = signal::ctrl_c() => {
                    if let Err(e) = result {
                        tracing::error!("failed to listen for ctrl+c: {e}");
                        return;
                    }
                    tracing::info!("Shutdown requested");
                }
                _ = cancel.cancelled() => {}
            }
            quitter.quit();
        });
    }

    if args.capture_now {
        handle.trigger();
    }

    let options = UiOptions::from_config(&config, snip_capture::primary_frame());
    let ui_result = snip_ui::run(bridge.commands, handle, options);

    controller.shutdown();
    runtime.block_on(join_tasks(tasks));
    drop(hotkey);
    ui_result
}
