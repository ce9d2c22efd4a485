//! Application configuration. Backend endpoint, paths, poll pacing.

use serde::Deserialize;

/// Default delay between status polls.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 3_000;

/// Default number of polls to wait for the primary extraction payload.
pub const DEFAULT_POLL_ATTEMPTS: u32 = 100;

/// Default total polls (primary + secondary). Must exceed the primary
/// deadline; the extra window waits for the certificate-comparison payload.
pub const DEFAULT_COMPARISON_POLL_ATTEMPTS: u32 = 140;

#[derive(Debug, Deserialize, Default)]
pub struct AppConfig {
    /// Backend base URL (e.g. "https://intake.example.com"). Read from
    /// INTAKE_API_BASE_URL. When unset the mock gateway is used.
    #[serde(default)]
    pub api_base_url: Option<String>,

    /// Data directory for session, history, and reports. Read from INTAKE_DATA_DIR.
    #[serde(default)]
    pub data_dir: Option<String>,

    /// Session file path (profile-scoped). Read from INTAKE_SESSION_PATH.
    /// Defaults to "{data_dir}/session.json".
    #[serde(default)]
    pub session_path: Option<String>,

    /// Delay in ms between status polls. Read from INTAKE_POLL_INTERVAL_MS.
    #[serde(default)]
    pub poll_interval_ms: Option<u64>,

    /// Polls to wait for the primary extraction payload. Read from INTAKE_POLL_ATTEMPTS.
    #[serde(default)]
    pub poll_attempts: Option<u32>,

    /// Total polls including the secondary (comparison) window.
    /// Read from INTAKE_COMPARISON_POLL_ATTEMPTS.
    #[serde(default)]
    pub comparison_poll_attempts: Option<u32>,

    /// Per-request HTTP timeout in seconds. Read from INTAKE_HTTP_TIMEOUT_SECS.
    #[serde(default)]
    pub http_timeout_secs: Option<u64>,
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenv::dotenv().ok();
        let mut c = config::Config::builder();
        c = c.add_source(config::Environment::with_prefix("INTAKE"));
        if let Ok(path) = std::env::var("INTAKE_CONFIG") {
            c = c.add_source(config::File::with_name(&path));
        }
        let mut cfg: Self = c.build()?.try_deserialize()?;
        // Numeric env values arrive as strings through some providers; read
        // the pacing knobs directly so .env can use plain integers.
        if let Ok(s) = std::env::var("INTAKE_POLL_INTERVAL_MS") {
            if let Ok(ms) = s.parse::<u64>() {
                cfg.poll_interval_ms = Some(ms);
            }
        }
        if let Ok(s) = std::env::var("INTAKE_POLL_ATTEMPTS") {
            if let Ok(n) = s.parse::<u32>() {
                cfg.poll_attempts = Some(n);
            }
        }
        if let Ok(s) = std::env::var("INTAKE_COMPARISON_POLL_ATTEMPTS") {
            if let Ok(n) = s.parse::<u32>() {
                cfg.comparison_poll_attempts = Some(n);
            }
        }
        Ok(cfg)
    }

    /// Returns true when a real backend endpoint is configured.
    pub fn is_backend_configured(&self) -> bool {
        self.api_base_url
            .as_deref()
            .is_some_and(|url| !url.trim().is_empty())
    }

    /// Backend base URL without a trailing slash.
    pub fn api_base_url_or_default(&self) -> String {
        self.api_base_url
            .as_deref()
            .unwrap_or("http://localhost:8000")
            .trim_end_matches('/')
            .to_string()
    }

    pub fn data_dir_or_default(&self) -> String {
        self.data_dir.as_deref().unwrap_or("./data").to_string()
    }

    /// Session file path. Defaults to "{data_dir}/session.json".
    pub fn session_path_or_default(&self) -> String {
        self.session_path
            .clone()
            .unwrap_or_else(|| format!("{}/session.json", self.data_dir_or_default()))
    }

    /// Returns the poll interval in milliseconds. Defaults to 3000 if unset.
    pub fn poll_interval_ms_or_default(&self) -> u64 {
        self.poll_interval_ms.unwrap_or(DEFAULT_POLL_INTERVAL_MS)
    }

    /// Returns the primary poll deadline in attempts. Defaults to 100 if unset.
    pub fn poll_attempts_or_default(&self) -> u32 {
        self.poll_attempts.unwrap_or(DEFAULT_POLL_ATTEMPTS)
    }

    /// Returns the total number of polls including the comparison window.
    /// Clamped to at least the primary deadline.
    pub fn comparison_poll_attempts_or_default(&self) -> u32 {
        self.comparison_poll_attempts
            .unwrap_or(DEFAULT_COMPARISON_POLL_ATTEMPTS)
            .max(self.poll_attempts_or_default())
    }

    /// Per-request HTTP timeout. Defaults to 60s (uploads carry PDF bytes).
    pub fn http_timeout_secs_or_default(&self) -> u64 {
        self.http_timeout_secs.unwrap_or(60)
    }
}
