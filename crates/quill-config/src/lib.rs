//! Configuration module for the Quill marketplace service.
//!
//! Configuration is read from TOML. String values may reference environment
//! variables as `${NAME}` or `${NAME:-default}`, and a file may split its
//! sections across several files with `include = ["roles.toml", ...]`.
//! Every top-level section must appear in exactly one file.

mod loader;

pub use loader::ConfigLoader;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Largest configuration input accepted by [`resolve_env_vars`].
const MAX_INPUT_SIZE: usize = 1024 * 1024;

static ENV_VAR_PATTERN: Lazy<Regex> = Lazy::new(|| {
	Regex::new(r"\$\{([A-Z_][A-Z0-9_]{0,127})(?::-([^}]{0,256}))?\}")
		.expect("environment variable pattern is valid")
});

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	#[error("Configuration error: {0}")]
	Parse(String),
	#[error("Validation error: {0}")]
	Validation(String),
}

impl From<toml::de::Error> for ConfigError {
	fn from(err: toml::de::Error) -> Self {
		// The full error embeds the whole input; keep only the message.
		ConfigError::Parse(err.message().to_string())
	}
}

/// Top-level configuration of a marketplace instance.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
	pub marketplace: MarketplaceConfig,
	#[serde(default)]
	pub engine: EngineConfig,
	/// Order document storage.
	pub storage: BackendConfig,
	/// User to role associations consulted on writer assignment.
	pub roles: BackendConfig,
	/// Reference data tables used to enrich listings.
	pub reference: BackendConfig,
	/// Payment gateway.
	pub payment: BackendConfig,
	/// HTTP server. Absent means the server is not started.
	pub api: Option<ApiConfig>,
}

/// Identity of this marketplace instance.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MarketplaceConfig {
	pub id: String,
}

/// Lifecycle engine tuning.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct EngineConfig {
	/// Bound applied to every storage, role and payment call.
	#[serde(default = "default_call_timeout_ms")]
	pub call_timeout_ms: u64,
	/// Number of feedback rounds a customer may request per order.
	#[serde(default = "default_feedback_request_limit")]
	pub feedback_request_limit: u32,
	#[serde(default = "default_page_size")]
	pub default_page_size: u32,
	#[serde(default = "default_max_page_size")]
	pub max_page_size: u32,
}

impl EngineConfig {
	pub fn call_timeout(&self) -> Duration {
		Duration::from_millis(self.call_timeout_ms)
	}
}

impl Default for EngineConfig {
	fn default() -> Self {
		Self {
			call_timeout_ms: default_call_timeout_ms(),
			feedback_request_limit: default_feedback_request_limit(),
			default_page_size: default_page_size(),
			max_page_size: default_max_page_size(),
		}
	}
}

fn default_call_timeout_ms() -> u64 {
	5_000
}

fn default_feedback_request_limit() -> u32 {
	4
}

fn default_page_size() -> u32 {
	10
}

fn default_max_page_size() -> u32 {
	100
}

/// A pluggable concern: which implementation to use, and the raw
/// configuration table of each available implementation.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BackendConfig {
	pub primary: String,
	#[serde(default)]
	pub implementations: HashMap<String, toml::Value>,
}

impl BackendConfig {
	/// Configuration table of the primary implementation.
	pub fn primary_config(&self) -> Option<&toml::Value> {
		self.implementations.get(&self.primary)
	}
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
	#[serde(default = "default_api_enabled")]
	pub enabled: bool,
	#[serde(default = "default_api_host")]
	pub host: String,
	#[serde(default = "default_api_port")]
	pub port: u16,
	/// Request timeout in seconds.
	#[serde(default = "default_api_timeout")]
	pub timeout_seconds: u64,
	pub cors: Option<CorsConfig>,
}

/// CORS configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CorsConfig {
	/// Allowed origins. `"*"` allows any origin.
	pub allowed_origins: Vec<String>,
}

fn default_api_enabled() -> bool {
	true
}

fn default_api_host() -> String {
	"127.0.0.1".to_string()
}

fn default_api_port() -> u16 {
	8080
}

fn default_api_timeout() -> u64 {
	30
}

/// Resolves environment variables in a string.
///
/// Replaces `${VAR_NAME}` with the value of `VAR_NAME`, or with the default
/// in `${VAR_NAME:-default}` when the variable is unset. An unset variable
/// without a default is an error.
pub(crate) fn resolve_env_vars(input: &str) -> Result<String, ConfigError> {
	if input.len() > MAX_INPUT_SIZE {
		return Err(ConfigError::Validation(format!(
			"Configuration file too large: {} bytes (max: {} bytes)",
			input.len(),
			MAX_INPUT_SIZE
		)));
	}

	let mut result = String::with_capacity(input.len());
	let mut last = 0;

	for cap in ENV_VAR_PATTERN.captures_iter(input) {
		let (Some(whole), Some(name)) = (cap.get(0), cap.get(1)) else {
			continue;
		};

		let value = match (std::env::var(name.as_str()), cap.get(2)) {
			(Ok(value), _) => value,
			(Err(_), Some(default)) => default.as_str().to_string(),
			(Err(_), None) => {
				return Err(ConfigError::Validation(format!(
					"Environment variable '{}' not found",
					name.as_str()
				)))
			},
		};

		result.push_str(&input[last..whole.start()]);
		result.push_str(&value);
		last = whole.end();
	}

	result.push_str(&input[last..]);
	Ok(result)
}

impl Config {
	/// Loads configuration from a file, following `include` directives.
	pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let path = path.as_ref();
		let base_dir = path
			.parent()
			.filter(|p| !p.as_os_str().is_empty())
			.unwrap_or_else(|| Path::new("."));
		let file_name = path.file_name().ok_or_else(|| {
			ConfigError::Validation(format!("Invalid path: {}", path.display()))
		})?;

		ConfigLoader::new(base_dir).load_config(file_name).await
	}

	fn validate(&self) -> Result<(), ConfigError> {
		if self.marketplace.id.trim().is_empty() {
			return Err(ConfigError::Validation(
				"Marketplace ID cannot be empty".into(),
			));
		}

		for (section, backend) in [
			("storage", &self.storage),
			("roles", &self.roles),
			("reference", &self.reference),
			("payment", &self.payment),
		] {
			if backend.primary.is_empty() {
				return Err(ConfigError::Validation(format!(
					"[{}] primary implementation cannot be empty",
					section
				)));
			}
			if backend.primary_config().is_none() {
				return Err(ConfigError::Validation(format!(
					"[{}] primary implementation '{}' has no [{}.implementations.{}] table",
					section, backend.primary, section, backend.primary
				)));
			}
		}

		let engine = &self.engine;
		if engine.call_timeout_ms == 0 || engine.call_timeout_ms > 60_000 {
			return Err(ConfigError::Validation(format!(
				"engine.call_timeout_ms must be between 1 and 60000, got {}",
				engine.call_timeout_ms
			)));
		}
		if engine.feedback_request_limit == 0 {
			return Err(ConfigError::Validation(
				"engine.feedback_request_limit must be at least 1".into(),
			));
		}
		if engine.max_page_size == 0 {
			return Err(ConfigError::Validation(
				"engine.max_page_size must be at least 1".into(),
			));
		}
		if engine.default_page_size == 0 || engine.default_page_size > engine.max_page_size {
			return Err(ConfigError::Validation(format!(
				"engine.default_page_size must be between 1 and {}, got {}",
				engine.max_page_size, engine.default_page_size
			)));
		}

		if let Some(api) = &self.api {
			if api.enabled && api.host.trim().is_empty() {
				return Err(ConfigError::Validation("api.host cannot be empty".into()));
			}
		}

		Ok(())
	}
}

/// Parses a configuration string, resolving environment variables and
/// validating the result.
impl FromStr for Config {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let resolved = resolve_env_vars(s)?;
		let config: Config = toml::from_str(&resolved)?;
		config.validate()?;
		Ok(config)
	}
}
