//! Client configuration.
//!
//! # Design
//! A `ClientConfig` is owned by exactly one `Client`. Reconfiguring means
//! building a new client from a new config, so there is no process-wide
//! state and no ordering concern between configuration and requests.

use std::time::Duration;

use serde::Deserialize;

/// Host template; `{lang}` is replaced with the configured language code.
pub const DEFAULT_HOST_TEMPLATE: &str = "https://api.unisender.com/{lang}/api/";

/// What the client does with a failure it would otherwise write to the
/// request error log.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorPolicy {
    /// Record the failure in the `RequestLog` returned with the call.
    #[default]
    Log,
    /// Return `OrmError::Request` carrying the same message instead.
    Throw,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClientConfig {
    pub api_key: String,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default = "default_encoding")]
    pub encoding: String,
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,
    /// Per-attempt timeout in seconds; `0` waits indefinitely.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub compression: bool,
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub error_policy: ErrorPolicy,
    /// Replaces the vendor host entirely, e.g. `http://127.0.0.1:3000/en/api/`.
    #[serde(default)]
    pub api_host: Option<String>,
}

fn default_language() -> String {
    "ru".to_string()
}

fn default_encoding() -> String {
    "UTF-8".to_string()
}

fn default_retry_count() -> u32 {
    4
}

fn default_timeout_secs() -> u64 {
    1
}

impl ClientConfig {
    pub fn new(api_key: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            language: default_language(),
            encoding: default_encoding(),
            retry_count: default_retry_count(),
            timeout_secs: default_timeout_secs(),
            compression: false,
            platform: None,
            error_policy: ErrorPolicy::Log,
            api_host: None,
        }
    }

    pub fn with_language(mut self, language: &str) -> Self {
        self.language = language.to_string();
        self
    }

    pub fn with_encoding(mut self, encoding: &str) -> Self {
        self.encoding = encoding.to_string();
        self
    }

    pub fn with_retry_count(mut self, retry_count: u32) -> Self {
        self.retry_count = retry_count;
        self
    }

    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn with_compression(mut self, compression: bool) -> Self {
        self.compression = compression;
        self
    }

    pub fn with_platform(mut self, platform: &str) -> Self {
        self.platform = Some(platform.to_string());
        self
    }

    pub fn with_error_policy(mut self, policy: ErrorPolicy) -> Self {
        self.error_policy = policy;
        self
    }

    pub fn with_api_host(mut self, api_host: &str) -> Self {
        self.api_host = Some(api_host.to_string());
        self
    }

    /// Base URL every method name is appended to. Always ends with `/`.
    pub fn api_host(&self) -> String {
        let host = match &self.api_host {
            Some(host) => host.clone(),
            None => DEFAULT_HOST_TEMPLATE.replace("{lang}", &self.language),
        };
        if host.ends_with('/') {
            host
        } else {
            format!("{host}/")
        }
    }

    pub fn is_utf8(&self) -> bool {
        self.encoding.eq_ignore_ascii_case("UTF-8") || self.encoding.eq_ignore_ascii_case("UTF8")
    }

    pub fn timeout(&self) -> Option<Duration> {
        match self.timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    /// The platform name, if one is configured and non-empty.
    pub fn platform(&self) -> Option<&str> {
        self.platform.as_deref().filter(|p| !p.is_empty())
    }
}
