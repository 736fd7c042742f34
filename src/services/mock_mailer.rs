//! Recording mail transport for tests.

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::notifier::error::MailError;
use crate::notifier::provider::EmailSender;

/// A recorded outbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Test double that records every delivered message. Addresses scripted
/// via [`failing_for`](RecordingMailer::failing_for) fail instead of
/// recording, so tests can exercise per-recipient failure isolation.
#[derive(Debug, Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<SentEmail>>,
    failing: HashSet<String>,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_for(mut self, address: &str) -> Self {
        self.failing.insert(address.to_string());
        self
    }

    /// Everything delivered so far, in delivery order.
    pub fn sent(&self) -> Vec<SentEmail> {
        self.sent.lock().expect("sent lock").clone()
    }
}

#[async_trait]
impl EmailSender for RecordingMailer {
    async fn send_email(&self, to: &str, subject: &str, body: &str) -> Result<(), MailError> {
        if self.failing.contains(to) {
            return Err(MailError::InvalidAddress(to.to_string()));
        }

        self.sent.lock().expect("sent lock").push(SentEmail {
            to: to.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }
}
