use serde::{Deserialize, Serialize};

fn default_modifiers() -> String {
    "ctrl+shift".to_string()
}

fn default_key() -> String {
    "KeyT".to_string()
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct HotkeyConfig {
    /// `+`-separated modifier names, e.g. "ctrl+shift"
    #[serde(default = "default_modifiers")]
    pub modifiers: String,
    /// Key code name, e.g. "KeyT" or "F9"
    #[serde(default = "default_key")]
    pub key: String,
}

impl HotkeyConfig {
    /// Accelerator string understood by the hotkey parser
    pub fn accelerator(&self) -> String {
        if self.modifiers.trim().is_empty() {
            self.key.clone()
        } else {
            format!("{}+{}", self.modifiers, self.key)
        }
    }
}

impl Default for HotkeyConfig {
    fn default() -> Self {
        Self {
            modifiers: default_modifiers(),
            key: default_key(),
        }
    }
}
