use std::sync::Mutex;

use anyhow::{Context, Result};
use arboard::Clipboard;
use snip_core::DestinationSink;
use snip_types::SinkError;

/// Anything that can take plain text the way the system clipboard does
pub trait TextClipboard: Send {
    fn set_text(&mut self, text: &str) -> Result<()>;
}

impl TextClipboard for Clipboard {
    fn set_text(&mut self, text: &str) -> Result<()> {
        Clipboard::set_text(self, text).context("Failed to set clipboard text")
    }
}

type Opener<C> = Box<dyn Fn() -> Result<C> + Send + Sync>;

/// Writes recognized text to the clipboard.
///
/// The handle is opened on first use and reopened after a failed write, so a
/// clipboard that was briefly locked by another process does not stay broken.
pub struct ClipboardSink<C: TextClipboard = Clipboard> {
    opener: Opener<C>,
    clipboard: Mutex<Option<C>>,
}

impl ClipboardSink<Clipboard> {
    pub fn new() -> Self {
        Self::with_opener(|| Clipboard::new().context("Failed to open clipboard"))
    }
}

impl Default for ClipboardSink<Clipboard> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: TextClipboard> ClipboardSink<C> {
    pub fn with_opener(opener: impl Fn() -> Result<C> + Send + Sync + 'static) -> Self {
        Self {
            opener: Box::new(opener),
            clipboard: Mutex::new(None),
        }
    }
}

impl<C: TextClipboard> DestinationSink for ClipboardSink<C> {
    fn write(&self, text: &str) -> Result<(), SinkError> {
        let mut slot = self
            .clipboard
            .lock()
            .map_err(|_| SinkError::Unavailable("clipboard lock poisoned".into()))?;

        if slot.is_none() {
            let opened = (self.opener)().map_err(|e| SinkError::Unavailable(format!("{e:#}")))?;
            *slot = Some(opened);
        }
        let Some(clipboard) = slot.as_mut() else {
            return Err(SinkError::Unavailable("clipboard not open".into()));
        };

        match clipboard.set_text(text) {
            Ok(()) => {
                tracing::debug!(chars = text.chars().count(), "text copied to clipboard");
                Ok(())
            }
            Err(e) => {
                *slot = None;
                tracing::warn!("clipboard write failed: {:#}", e);
                Err(SinkError::Rejected(format!("{e:#}")))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[derive(Default)]
    struct MemoryClipboard {
        contents: Arc<Mutex<Vec<String>>>,
        fail: bool,
    }

    impl TextClipboard for MemoryClipboard {
        fn set_text(&mut self, text: &str) -> Result<()> {
            anyhow::ensure!(!self.fail, "clipboard busy");
            self.contents.lock().unwrap().push(text.to_string());
            Ok(())
        }
    }

    #[test]
    fn writes_go_to_one_clipboard() {
        let contents = Arc::new(Mutex::new(Vec::new()));
        let opens = Arc::new(AtomicUsize::new(0));
        let sink = {
            let contents = contents.clone();
            let opens = opens.clone();
            ClipboardSink::with_opener(move || {
                opens.fetch_add(1, Ordering::SeqCst);
                Ok(MemoryClipboard {
                    contents: contents.clone(),
                    fail: false,
                })
            })
        };

        sink.write("HELLO WORLD").unwrap();
        sink.write("again").unwrap();

        assert_eq!(*contents.lock().unwrap(), vec!["HELLO WORLD", "again"]);
        assert_eq!(opens.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn open_failure_is_unavailable() {
        let sink = ClipboardSink::<MemoryClipboard>::with_opener(|| anyhow::bail!("no display server"));
        let err = sink.write("x").unwrap_err();
        assert!(matches!(err, SinkError::Unavailable(ref m) if m.contains("no display server")));
    }

    #[test]
    fn failed_write_reopens_next_time() {
        let opens = Arc::new(AtomicUsize::new(0));
        let sink = {
            let opens = opens.clone();
            ClipboardSink::with_opener(move || {
                let n = opens.fetch_add(1, Ordering::SeqCst);
                Ok(MemoryClipboard {
                    fail: n == 0,
                    ..MemoryClipboard::default()
                })
            })
        };

        assert!(matches!(sink.write("x"), Err(SinkError::Rejected(_))));
        assert!(sink.write("x").is_ok());
        assert_eq!(opens.load(Ordering::SeqCst), 2);
    }
}
