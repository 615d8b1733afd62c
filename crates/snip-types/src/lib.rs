pub mod error;
pub mod types;

pub use error::{CaptureError, RecognitionError, SessionError, SinkError};
pub use types::{Point, RasterImage, RecognizedText, Region, SessionId, ToastId};
