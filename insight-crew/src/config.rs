//! Process configuration loaded from the environment.
//!
//! Settings are read exactly once at startup (after loading `.env` via
//! dotenv) and handed by reference to every component that needs them.
//! There is no global settings singleton.

use serde::Serialize;
use std::env;
use std::str::FromStr;

/// Which runtime backs the agents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RuntimeMode {
    /// Hosted LLM via the Claude agent SDK
    Claude,
    /// Deterministic local implementation, no credentials needed
    Local,
}

impl RuntimeMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuntimeMode::Claude => "claude",
            RuntimeMode::Local => "local",
        }
    }
}

impl std::fmt::Display for RuntimeMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RuntimeMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "claude" => Ok(RuntimeMode::Claude),
            "local" | "demo" => Ok(RuntimeMode::Local),
            other => Err(format!("Unknown runtime mode: {}", other)),
        }
    }
}

/// Process-wide configuration, constructed once at startup
#[derive(Debug, Clone, Serialize)]
pub struct Settings {
    /// Model identifier passed to the agent SDK
    pub model_id: String,
    /// Which agent runtime to construct
    pub runtime: RuntimeMode,
    /// Maximum agent reasoning iterations
    pub max_iterations: u32,
    /// Per-agent-call timeout
    pub agent_timeout_secs: u64,
    /// Per-tool-call timeout (webpage fetches)
    pub tool_timeout_secs: u64,
    /// Largest data file the analyst tools will load
    pub max_file_size_mb: u64,
    /// Maximum concurrent tasks per scheduler wave
    pub batch_size: usize,
    /// Whether to emit structured trace events
    pub enable_tracing: bool,
    /// Log verbosity
    pub log_level: String,
    /// Deployment environment label
    pub environment: String,
    pub app_name: String,
    pub app_version: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            model_id: "claude-sonnet-4".to_string(),
            runtime: RuntimeMode::Claude,
            max_iterations: 10,
            agent_timeout_secs: 300,
            tool_timeout_secs: 30,
            max_file_size_mb: 100,
            batch_size: 2,
            enable_tracing: true,
            log_level: "info".to_string(),
            environment: "development".to_string(),
            app_name: "Insight Crew Multi-Agent System".to_string(),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl Settings {
    /// Load settings from `.env` and the process environment
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();

        let defaults = Settings::default();
        Settings {
            model_id: string_var("CREW_MODEL_ID", defaults.model_id),
            runtime: parsed_var("CREW_RUNTIME", defaults.runtime),
            max_iterations: parsed_var("AGENT_MAX_ITERATIONS", defaults.max_iterations),
            agent_timeout_secs: parsed_var("AGENT_TIMEOUT_SECONDS", defaults.agent_timeout_secs),
            tool_timeout_secs: parsed_var("TOOL_TIMEOUT_SECONDS", defaults.tool_timeout_secs),
            max_file_size_mb: parsed_var("MAX_FILE_SIZE_MB", defaults.max_file_size_mb),
            batch_size: parsed_var("CREW_BATCH_SIZE", defaults.batch_size),
            enable_tracing: parsed_var("ENABLE_TRACING", defaults.enable_tracing),
            log_level: string_var("LOG_LEVEL", defaults.log_level),
            environment: string_var("ENVIRONMENT", defaults.environment),
            app_name: string_var("APP_NAME", defaults.app_name),
            app_version: defaults.app_version,
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }

    pub fn max_file_size_bytes(&self) -> u64 {
        self.max_file_size_mb * 1024 * 1024
    }

    /// Snapshot for the `status` CLI subcommand
    pub fn status_snapshot(&self) -> serde_json::Value {
        serde_json::json!({
            "app": self.app_name,
            "version": self.app_version,
            "environment": self.environment,
            "model": self.model_id,
            "runtime": self.runtime,
            "max_iterations": self.max_iterations,
            "agent_timeout_secs": self.agent_timeout_secs,
            "tracing": if self.enable_tracing { "enabled" } else { "disabled" },
            "log_level": self.log_level,
        })
    }
}

fn string_var(name: &str, default: String) -> String {
    env::var(name).ok().filter(|v| !v.is_empty()).unwrap_or(default)
}

fn parsed_var<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.runtime, RuntimeMode::Claude);
        assert_eq!(settings.max_iterations, 10);
        assert_eq!(settings.batch_size, 2);
        assert_eq!(settings.max_file_size_bytes(), 100 * 1024 * 1024);
        assert!(!settings.is_production());
    }

    #[test]
    fn test_runtime_mode_parse() {
        assert_eq!("claude".parse::<RuntimeMode>().unwrap(), RuntimeMode::Claude);
        assert_eq!("LOCAL".parse::<RuntimeMode>().unwrap(), RuntimeMode::Local);
        assert_eq!("demo".parse::<RuntimeMode>().unwrap(), RuntimeMode::Local);
        assert!("cloud".parse::<RuntimeMode>().is_err());
    }

    #[test]
    fn test_status_snapshot_fields() {
        let snapshot = Settings::default().status_snapshot();
        assert_eq!(snapshot["tracing"], "enabled");
        assert_eq!(snapshot["runtime"], "claude");
    }
}
