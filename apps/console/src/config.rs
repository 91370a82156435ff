use std::{fs, path::Path, time::Duration};

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub server_url: String,
    pub poll_interval_ms: u64,
    pub blocks_limit: Option<u32>,
    pub request_timeout_secs: u64,
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:8000".into(),
            poll_interval_ms: 3000,
            blocks_limit: None,
            request_timeout_secs: 10,
            log_filter: "info".into(),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("poll interval must be greater than zero")]
    ZeroPollInterval,
    #[error("request timeout must be greater than zero")]
    ZeroRequestTimeout,
    #[error("server url must not be empty")]
    EmptyServerUrl,
}

/// Values given on the command line; they win over every other source.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub server_url: Option<String>,
    pub poll_interval_ms: Option<u64>,
    pub blocks_limit: Option<u32>,
    pub log_filter: Option<String>,
}

impl Settings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.server_url.trim().is_empty() {
            return Err(SettingsError::EmptyServerUrl);
        }
        if self.poll_interval_ms == 0 {
            return Err(SettingsError::ZeroPollInterval);
        }
        if self.request_timeout_secs == 0 {
            return Err(SettingsError::ZeroRequestTimeout);
        }
        Ok(())
    }

    pub fn apply_overrides(&mut self, overrides: &Overrides) {
        if let Some(v) = &overrides.server_url {
            self.server_url = v.clone();
        }
        if let Some(v) = overrides.poll_interval_ms {
            self.poll_interval_ms = v;
        }
        if let Some(v) = overrides.blocks_limit {
            self.blocks_limit = Some(v);
        }
        if let Some(v) = &overrides.log_filter {
            self.log_filter = v.clone();
        }
    }

    /// Applies `console.toml` key by key. A bad value only loses its own key.
    fn apply_file(&mut self, table: toml::Table, warnings: &mut Vec<String>) {
        for (key, value) in table {
            match key.as_str() {
                "server_url" => match value.as_str() {
                    Some(v) => self.server_url = v.to_string(),
                    None => warnings.push(bad_file_value(&key, &value, "a string")),
                },
                "poll_interval_ms" => match file_number(&value) {
                    Some(v) => self.poll_interval_ms = v,
                    None => warnings.push(bad_file_value(&key, &value, "a number")),
                },
                "blocks_limit" => match file_number(&value).and_then(|v| u32::try_from(v).ok()) {
                    Some(v) => self.blocks_limit = Some(v),
                    None => warnings.push(bad_file_value(&key, &value, "a number")),
                },
                "request_timeout_secs" => match file_number(&value) {
                    Some(v) => self.request_timeout_secs = v,
                    None => warnings.push(bad_file_value(&key, &value, "a number")),
                },
                "log_filter" => match value.as_str() {
                    Some(v) => self.log_filter = v.to_string(),
                    None => warnings.push(bad_file_value(&key, &value, "a string")),
                },
                _ => warnings.push(format!("ignoring unknown config key '{key}'")),
            }
        }
    }

    fn apply_env(&mut self, env: impl Fn(&str) -> Option<String>, warnings: &mut Vec<String>) {
        if let Some(v) = env("LEDGER_SERVER_URL") {
            self.server_url = v;
        }
        if let Some(v) = env("APP__SERVER_URL") {
            self.server_url = v;
        }
        if let Some(v) = env("APP__POLL_INTERVAL_MS") {
            match v.parse::<u64>() {
                Ok(parsed) => self.poll_interval_ms = parsed,
                Err(_) => warnings.push(format!("ignoring APP__POLL_INTERVAL_MS={v:?}: not a number")),
            }
        }
        if let Some(v) = env("APP__BLOCKS_LIMIT") {
            match v.parse::<u32>() {
                Ok(parsed) => self.blocks_limit = Some(parsed),
                Err(_) => warnings.push(format!("ignoring APP__BLOCKS_LIMIT={v:?}: not a number")),
            }
        }
        if let Some(v) = env("APP__REQUEST_TIMEOUT_SECS") {
            match v.parse::<u64>() {
                Ok(parsed) => self.request_timeout_secs = parsed,
                Err(_) => {
                    warnings.push(format!("ignoring APP__REQUEST_TIMEOUT_SECS={v:?}: not a number"))
                }
            }
        }
        if let Some(v) = env("RUST_LOG") {
            self.log_filter = v;
        }
    }
}

/// Defaults, then the config file (if present), then the environment.
/// Problems with either source are returned as warnings rather than failing
/// startup, since logging is not initialised yet.
pub fn load_settings(path: &Path) -> (Settings, Vec<String>) {
    load_settings_from(path, |key| std::env::var(key).ok())
}

fn load_settings_from(
    path: &Path,
    env: impl Fn(&str) -> Option<String>,
) -> (Settings, Vec<String>) {
    let mut settings = Settings::default();
    let mut warnings = Vec::new();

    if let Ok(raw) = fs::read_to_string(path) {
        match raw.parse::<toml::Table>() {
            Ok(table) => settings.apply_file(table, &mut warnings),
            Err(err) => warnings.push(format!(
                "ignoring config file '{}': {err}",
                path.display()
            )),
        }
    }

    settings.apply_env(env, &mut warnings);
    (settings, warnings)
}

/// Integers, or strings holding one, as hand-edited files often quote them.
fn file_number(value: &toml::Value) -> Option<u64> {
    match value {
        toml::Value::Integer(n) => u64::try_from(*n).ok(),
        toml::Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

fn bad_file_value(key: &str, value: &toml::Value, expected: &str) -> String {
    format!("ignoring config key '{key}' = {value}: expected {expected}")
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
