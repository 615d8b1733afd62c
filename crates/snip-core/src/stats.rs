use std::time::SystemTime;

use snip_types::SessionError;

/// Running totals over every accepted capture session
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub sessions: u64,
    pub successes: u64,
    pub cancellations: u64,
    pub failures: u64,
    /// Requests rejected because a session was already active
    pub rejected: u64,
    pub last_outcome_time: Option<SystemTime>,
    pub current_message: String,
}

impl SessionStats {
    pub fn record_started(&mut self) {
        self.sessions += 1;
    }

    pub fn record_rejected(&mut self) {
        self.rejected += 1;
    }

    pub fn record_outcome(&mut self, outcome: &Result<String, SessionError>) {
        match outcome {
            Ok(_) => {
                self.successes += 1;
                self.current_message = "Copied to clipboard".to_string();
            }
            Err(SessionError::SelectionCancelled) => {
                self.cancellations += 1;
                self.current_message = SessionError::SelectionCancelled.to_string();
            }
            Err(err) => {
                self.failures += 1;
                self.current_message = err.to_string();
            }
        }
        self.last_outcome_time = Some(SystemTime::now());
    }

    pub fn completed(&self) -> u64 {
        self.successes + self.cancellations + self.failures
    }
}
