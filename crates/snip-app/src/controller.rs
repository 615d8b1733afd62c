use std::time::Duration;

use snip_capture::listen_for_hotkey;
use snip_config::Config;
use snip_core::{EventLoop, LoopHandle};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// Application controller for task spawning and lifecycle
pub struct AppController {
    config: Config,
    cancel_token: CancellationToken,
}

impl AppController {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            cancel_token: CancellationToken::new(),
        }
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    /// Spawn the capture loop, its shutdown relay and, when a hotkey was
    /// registered, the hotkey listener. Must be called inside a runtime.
    pub fn spawn_tasks(
        &self,
        event_loop: EventLoop,
        hotkey: Option<u32>,
    ) -> (LoopHandle, JoinSet<anyhow::Result<()>>) {
        let mut tasks = JoinSet::new();
        let handle = event_loop.handle();

        // Capture loop
        tasks.spawn(async move {
            let stats = event_loop.run().await?;
            tracing::info!(
                sessions = stats.sessions,
                completed = stats.completed(),
                successes = stats.successes,
                cancellations = stats.cancellations,
                failures = stats.failures,
                rejected = stats.rejected,
                "final session statistics"
            );
            Ok(())
        });

        // Shutdown relay
        {
            let handle = handle.clone();
            let cancel = self.cancel_token.clone();
            tasks.spawn(async move {
                cancel.cancelled().await;
                handle.shutdown();
                Ok(())
            });
        }

        // Hotkey listener
        if let Some(id) = hotkey {
            let interval = Duration::from_millis(self.config.delta_time.max(1));
            tasks.spawn(listen_for_hotkey_task(
                id,
                handle.clone(),
                interval,
                self.cancel_token.child_token(),
            ));
        }

        (handle, tasks)
    }

    pub fn shutdown(&self) {
        self.cancel_token.cancel();
    }
}

async fn listen_for_hotkey_task(
    id: u32,
    handle: LoopHandle,
    interval: Duration,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    listen_for_hotkey(id, handle, interval, cancel).await;
    Ok(())
}

/// Wait for every task, logging failures instead of propagating them
pub async fn join_tasks(mut tasks: JoinSet<anyhow::Result<()>>) {
    while let Some(result) = tasks.join_next().await {
        match result {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::error!("task failed: {e:#}"),
            Err(e) => tracing::error!("task panicked: {e}"),
        }
    }
}
