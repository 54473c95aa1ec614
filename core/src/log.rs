//! Per-call request log and call result.
//!
//! # Design
//! Every `Client::call` starts from an empty `RequestLog` and hands it back
//! inside the `Response`, so a log only ever describes the request it came
//! with. Error entries are either positional or keyed (by method name, or
//! `response_info` for a non-JSON reply); a keyed entry replaces an earlier
//! one under the same key.

use serde::Serialize;
use serde_json::Value;

use crate::config::ErrorPolicy;
use crate::error::{OrmError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    pub key: Option<String>,
    pub message: String,
}

impl LogEntry {
    /// The message as it reads when raised: `"key: message"` for keyed entries.
    pub fn composed(&self) -> String {
        match &self.key {
            Some(key) => format!("{key}: {}", self.message),
            None => self.message.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RequestLog {
    errors: Vec<LogEntry>,
    warnings: Vec<String>,
}

impl RequestLog {
    pub fn errors(&self) -> &[LogEntry] {
        &self.errors
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Keyed error lookup.
    pub fn error(&self, key: &str) -> Option<&str> {
        self.errors
            .iter()
            .find(|entry| entry.key.as_deref() == Some(key))
            .map(|entry| entry.message.as_str())
    }

    /// Record a failure, or raise it when `policy` is `Throw`.
    ///
    /// An empty `message` makes `key` the positional message, so callers can
    /// pass a single string either way.
    pub(crate) fn record_error(
        &mut self,
        policy: ErrorPolicy,
        key: Option<&str>,
        message: &str,
    ) -> Result<()> {
        let entry = match key {
            Some(key) if !message.is_empty() => LogEntry {
                key: Some(key.to_string()),
                message: message.to_string(),
            },
            Some(key) => LogEntry {
                key: None,
                message: key.to_string(),
            },
            None => LogEntry {
                key: None,
                message: message.to_string(),
            },
        };

        if policy == ErrorPolicy::Throw {
            return Err(OrmError::Request(entry.composed()));
        }

        let existing = entry
            .key
            .as_ref()
            .and_then(|key| self.errors.iter().position(|e| e.key.as_ref() == Some(key)));
        match existing {
            Some(index) => self.errors[index] = entry,
            None => self.errors.push(entry),
        }
        Ok(())
    }

    pub(crate) fn record_warning(&mut self, message: &str) {
        self.warnings.push(message.to_string());
    }

    /// Turn a logged failure into a raised one.
    ///
    /// Errors always raise `ActionFailed`; warnings raise `ActionWarning`
    /// only when `throw_on_warning` is set.
    pub fn check(&self, throw_on_warning: bool) -> Result<()> {
        if self.has_errors() {
            return Err(OrmError::ActionFailed);
        }
        if throw_on_warning && self.has_warnings() {
            return Err(OrmError::ActionWarning);
        }
        Ok(())
    }
}

/// Outcome of one `Client::call`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Response {
    /// The body's `result`; `None` when the call failed or the vendor sent null.
    pub result: Option<Value>,
    pub log: RequestLog,
}

impl Response {
    /// The result, provided nothing was logged as an error.
    pub fn into_result(self) -> Result<Option<Value>> {
        self.log.check(false)?;
        Ok(self.result)
    }
}
