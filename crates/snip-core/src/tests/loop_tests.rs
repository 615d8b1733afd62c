use std::time::Duration;

use snip_types::Point;

use super::harness::{Harness, Scenario, UserAction};
use crate::{FocusSignals, SurfaceCommand, ToastCommand};

#[tokio::test(start_paused = true)]
async fn hello_world_reaches_the_sink() {
    let harness = Harness::start(Scenario::default());
    assert!(harness.handle.trigger());

    let (success, message) = harness.next_completion().await;
    assert!(success);
    assert_eq!(message.as_deref(), Some("HELLO WORLD"));
    assert_eq!(harness.sink.writes(), vec!["HELLO WORLD".to_string()]);

    harness.toasts_released(1).await;
    let presents: Vec<_> = harness
        .toast_events()
        .into_iter()
        .filter_map(|(_, _, c)| match c {
            ToastCommand::Present { message } => Some(message),
            _ => None,
        })
        .collect();
    assert_eq!(presents, vec!["Copied to clipboard".to_string()]);

    let stats = harness.shutdown().await;
    assert_eq!((stats.sessions, stats.successes), (1, 1));
}

#[tokio::test(start_paused = true)]
async fn empty_text_is_reported_not_written() {
    let harness = Harness::start(Scenario {
        text: "   ",
        ..Scenario::default()
    });
    harness.handle.trigger();

    let (success, message) = harness.next_completion().await;
    assert!(!success);
    assert_eq!(message.as_deref(), Some("No text found"));
    assert!(harness.sink.writes().is_empty());

    harness.toasts_released(1).await;
    assert!(harness.toast_events().iter().any(|(_, _, c)| matches!(
        c,
        ToastCommand::Present { message } if message == "No text found"
    )));
    harness.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn escape_cancels_silently() {
    let harness = Harness::start(Scenario {
        action: UserAction::Escape,
        ..Scenario::default()
    });
    harness.handle.trigger();

    let (success, message) = harness.next_completion().await;
    assert!(!success);
    assert_eq!(message.as_deref(), Some("Capture cancelled"));
    assert!(harness.sink.writes().is_empty());

    tokio::time::sleep(Duration::from_secs(3)).await;
    assert!(harness.toast_events().is_empty());
    let stats = harness.shutdown().await;
    assert_eq!(stats.cancellations, 1);
}

#[tokio::test(start_paused = true)]
async fn small_drag_cancels() {
    let harness = Harness::start(Scenario {
        action: UserAction::Drag(Point::new(100, 100), Point::new(108, 400)),
        ..Scenario::default()
    });
    harness.handle.trigger();

    let (success, message) = harness.next_completion().await;
    assert!(!success);
    assert_eq!(message.as_deref(), Some("Capture cancelled"));
    harness.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn second_trigger_while_active_is_rejected() {
    let harness = Harness::start(Scenario::default());
    harness.handle.trigger();
    harness.handle.trigger();

    let (success, _) = harness.next_completion().await;
    assert!(success);
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(harness.pending_completions(), 0, "rejected start must not complete");

    let shows = harness
        .surface_commands()
        .iter()
        .filter(|c| matches!(c, SurfaceCommand::Show { .. }))
        .count();
    assert_eq!(shows, 1);
    assert_eq!(harness.sink.writes().len(), 1);

    let stats = harness.shutdown().await;
    assert_eq!((stats.sessions, stats.rejected), (1, 1));
}

#[tokio::test(start_paused = true)]
async fn new_session_allowed_after_completion() {
    let harness = Harness::start(Scenario::default());

    harness.handle.trigger();
    assert!(harness.next_completion().await.0);
    harness.handle.trigger();
    assert!(harness.next_completion().await.0);

    assert_eq!(harness.sink.writes().len(), 2);
    let stats = harness.shutdown().await;
    assert_eq!((stats.sessions, stats.rejected), (2, 0));
}

#[tokio::test(start_paused = true)]
async fn toast_lives_at_least_its_duration() {
    let harness = Harness::start(Scenario::default());
    harness.handle.trigger();
    harness.next_completion().await;
    harness.toasts_released(1).await;

    let events = harness.toast_events();
    let commands: Vec<&ToastCommand> = events.iter().map(|(_, _, c)| c).collect();
    let present = position(&commands, |c| matches!(c, ToastCommand::Present { .. }));
    let fade_out = position(&commands, |c| {
        matches!(c, ToastCommand::AnimateContent { alpha, .. } if *alpha == 0.0)
    });
    let hide = position(&commands, |c| *c == ToastCommand::Hide);
    let release = position(&commands, |c| *c == ToastCommand::Release);

    assert!(present < fade_out && fade_out < hide && hide < release);
    let shown_for = events[release].0 - events[present].0;
    assert!(shown_for >= Duration::from_millis(2200), "released after {shown_for:?}");
    harness.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn fallback_session_restores_pointer_once() {
    let harness = Harness::start(Scenario {
        signals: FocusSignals {
            on_active_workspace: false,
            ..FocusSignals::ACQUIRED
        },
        ..Scenario::default()
    });
    harness.handle.trigger();
    assert!(harness.next_completion().await.0);

    let commands = harness.surface_commands();
    let hidden = commands
        .iter()
        .filter(|c| **c == SurfaceCommand::SetSystemPointerVisible(false))
        .count();
    let restored = commands
        .iter()
        .filter(|c| **c == SurfaceCommand::SetSystemPointerVisible(true))
        .count();
    assert_eq!((hidden, restored), (1, 1));
    harness.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn external_cancel_ends_selection() {
    let harness = Harness::start(Scenario {
        action: UserAction::Nothing,
        ..Scenario::default()
    });
    harness.handle.trigger();
    tokio::time::sleep(Duration::from_millis(500)).await;
    harness.handle.cancel();

    let (success, message) = harness.next_completion().await;
    assert!(!success);
    assert_eq!(message.as_deref(), Some("Capture cancelled"));
    assert!(harness.surface_commands().contains(&SurfaceCommand::Close));
    harness.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn missing_display_fails_without_overlay() {
    let harness = Harness::start(Scenario {
        frame: None,
        ..Scenario::default()
    });
    harness.handle.trigger();

    let (success, message) = harness.next_completion().await;
    assert!(!success);
    assert!(message.is_some_and(|m| m.contains("no capturable display")));
    assert!(harness.surface_commands().is_empty());
    harness.shutdown().await;
}

fn position(commands: &[&ToastCommand], wanted: impl Fn(&ToastCommand) -> bool) -> usize {
    commands
        .iter()
        .position(|c| wanted(c))
        .expect("toast command missing")
}

#[tokio::test(start_paused = true)]
async fn shutdown_during_selection_still_completes() {
    let harness = Harness::start(Scenario {
        action: UserAction::Nothing,
        ..Scenario::default()
    });
    harness.handle.trigger();
    tokio::time::sleep(Duration::from_millis(500)).await;

    let commands = harness.surface_commands();
    assert!(commands.iter().any(|c| matches!(c, SurfaceCommand::Show { .. })));
    assert_eq!(harness.pending_completions(), 0);

    let completions = harness.completion_log();
    let stats = harness.shutdown().await;
    assert_eq!((stats.sessions, stats.completed()), (1, 1));
    assert_eq!(stats.cancellations, 1);
    assert_eq!(
        *completions.lock().unwrap(),
        vec![(false, Some("Capture cancelled".to_string()))]
    );
}
