//! In-memory waitlist collector.
//!
//! Accepts email signups, normalises them (trim + lowercase), rejects
//! anything without an `@`, and deduplicates. Independent of the canvas
//! model.

use serde::Serialize;
use std::collections::HashSet;
use thiserror::Error;

/// Reported as `source` by [`WaitlistCollector::count`].
pub const MEMORY_SOURCE: &str = "memory";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Valid email required")]
    InvalidEmail,
}

/// Response to a signup request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Signup {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub already_exists: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<usize>,
}

/// Response to a count request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WaitlistCount {
    pub count: usize,
    pub source: &'static str,
}

#[derive(Debug, Default)]
pub struct WaitlistCollector {
    emails: Vec<String>,
    seen: HashSet<String>,
}

impl WaitlistCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn submit(&mut self, email: &str) -> Result<Signup, ValidationError> {
        if email.trim().is_empty() || !email.contains('@') {
            return Err(ValidationError::InvalidEmail);
        }
        let normalized = email.trim().to_lowercase();

        if self.seen.contains(&normalized) {
            return Ok(Signup {
                message: "Already on the waitlist!".into(),
                already_exists: Some(true),
                position: None,
            });
        }

        self.seen.insert(normalized.clone());
        self.emails.push(normalized);
        log::info!("waitlist signup accepted, total={}", self.emails.len());

        Ok(Signup {
            message: "Successfully joined the waitlist!".into(),
            already_exists: None,
            position: Some(self.emails.len()),
        })
    }

    pub fn count(&self) -> WaitlistCount {
        WaitlistCount {
            count: self.emails.len(),
            source: MEMORY_SOURCE,
        }
    }

    /// Signups in arrival order.
    pub fn emails(&self) -> &[String] {
        &self.emails
    }
}
