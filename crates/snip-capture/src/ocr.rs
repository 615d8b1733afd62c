use std::time::Instant;

use async_trait::async_trait;
use snip_core::RecognitionEngine;
use snip_types::{RasterImage, RecognitionError, RecognizedText};

/// The platform's built-in text recognizer.
///
/// On Windows this is `Windows.Media.Ocr`; each recognition runs on the
/// blocking pool with its own COM apartment. Elsewhere every call fails with
/// `EngineUnavailable`.
#[derive(Debug, Clone)]
pub struct SystemRecognizer {
    language: String,
}

impl SystemRecognizer {
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
        }
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    /// Check that an engine can be created for the configured language
    pub fn probe(&self) -> anyhow::Result<String> {
        platform::probe(&self.language)
    }
}

#[async_trait]
impl RecognitionEngine for SystemRecognizer {
    async fn recognize(&self, image: RasterImage) -> Result<RecognizedText, RecognitionError> {
        if image.width == 0 || image.height == 0 {
            return Err(RecognitionError::InvalidImage(format!(
                "empty image {}x{}",
                image.width, image.height
            )));
        }

        let language = self.language.clone();
        tokio::task::spawn_blocking(move || {
            let start = Instant::now();
            let result = platform::recognize(&language, &image);
            tracing::debug!(
                language = %language,
                elapsed_ms = start.elapsed().as_millis() as u64,
                ok = result.is_ok(),
                "recognition finished"
            );
            result
        })
        .await
        .map_err(|e| RecognitionError::Engine(format!("recognition task failed: {e}")))?
    }
}

#[cfg(windows)]
mod platform {
    use anyhow::{Context, Result};
    use snip_types::{RasterImage, RecognitionError, RecognizedText};
    use windows::{
        Globalization::Language,
        Graphics::Imaging::BitmapDecoder,
        Media::Ocr::OcrEngine as WinOcrEngine,
        Storage::Streams::{DataWriter, InMemoryRandomAccessStream},
        core::HSTRING,
    };

    use crate::capture::encode_png;
    use crate::apartment::{Apartment, with_apartment};

    fn create_engine(language_code: &str) -> Result<WinOcrEngine> {
        let language = Language::CreateLanguage(&HSTRING::from(language_code))
            .context("Failed to create language")?;
        WinOcrEngine::TryCreateFromLanguage(&language)
            .with_context(|| format!("No OCR engine for language '{language_code}'"))
    }

    pub fn probe(language_code: &str) -> Result<String> {
        with_apartment(|| {
            create_engine(language_code)?
                .RecognizerLanguage()
                .context("Failed to get recognizer language")?
                .LanguageTag()
                .map(|tag| tag.to_string())
                .context("Failed to get language tag")
        })
    }

    pub fn recognize(
        language_code: &str,
        image: &RasterImage,
    ) -> Result<RecognizedText, RecognitionError> {
        let _apartment = Apartment::join()
            .map_err(|e| RecognitionError::EngineUnavailable(format!("{e:#}")))?;
        let engine = create_engine(language_code)
            .map_err(|e| RecognitionError::EngineUnavailable(format!("{e:#}")))?;
        let png = encode_png(image).map_err(|e| RecognitionError::InvalidImage(format!("{e:#}")))?;

        recognize_png(&engine, &png)
            .map(RecognizedText::new)
            .map_err(|e| RecognitionError::Engine(format!("{e:#}")))
    }

    fn recognize_png(engine: &WinOcrEngine, image_bytes: &[u8]) -> Result<String> {
        let stream = InMemoryRandomAccessStream::new().context("Failed to create stream")?;
        let writer = DataWriter::CreateDataWriter(&stream).context("Failed to create writer")?;

        writer
            .WriteBytes(image_bytes)
            .context("Failed to write image bytes")?;
        writer
            .StoreAsync()
            .context("Failed to store async")?
            .get()
            .context("Failed to store data")?;
        writer.FlushAsync().context("Failed to flush")?.get()?;
        stream.Seek(0).context("Failed to seek")?;

        let decoder = BitmapDecoder::CreateAsync(&stream)
            .context("Failed to create decoder async")?
            .get()
            .context("Failed to get decoder")?;
        let bitmap = decoder
            .GetSoftwareBitmapAsync()
            .context("Failed to get bitmap async")?
            .get()
            .context("Failed to get software bitmap")?;

        let result = engine
            .RecognizeAsync(&bitmap)
            .context("Failed to recognize async")?
            .get()
            .context("Failed to get OCR result")?;

        Ok(result.Text().context("Failed to get text")?.to_string())
    }
}

#[cfg(not(windows))]
mod platform {
    use snip_types::{RasterImage, RecognitionError, RecognizedText};

    const UNSUPPORTED: &str = "no built-in OCR engine on this platform";

    pub fn probe(_language_code: &str) -> anyhow::Result<String> {
        anyhow::bail!(UNSUPPORTED)
    }

    pub fn recognize(
        _language_code: &str,
        _image: &RasterImage,
    ) -> Result<RecognizedText, RecognitionError> {
        Err(RecognitionError::EngineUnavailable(UNSUPPORTED.to_string()))
    }
}
