mod clipboard;

pub use clipboard::{ClipboardSink, TextClipboard};
