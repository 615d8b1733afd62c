//! Collaborator seams for the capture pipeline.

use async_trait::async_trait;
use snip_types::{
    CaptureError, RasterImage, RecognitionError, RecognizedText, Region, SinkError,
};

/// Grabs the pixels inside a screen-coordinate region
#[async_trait]
pub trait CaptureBackend: Send + Sync {
    async fn capture(&self, region: Region) -> Result<RasterImage, CaptureError>;
}

#[async_trait]
pub trait RecognitionEngine: Send + Sync {
    async fn recognize(&self, image: RasterImage) -> Result<RecognizedText, RecognitionError>;
}

/// Where recognized text ends up (the system clipboard in the app)
pub trait DestinationSink: Send + Sync {
    fn write(&self, text: &str) -> Result<(), SinkError>;
}
