use serde::{Deserialize, Serialize};

fn default_language() -> String {
    "en".to_string()
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct OcrConfig {
    /// BCP-47 tag handed to the recognition engine
    #[serde(default = "default_language")]
    pub language: String,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            language: default_language(),
        }
    }
}
