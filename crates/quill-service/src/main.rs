//! Main entry point for the Quill marketplace service.
//!
//! Loads the configuration, wires the configured storage, role, reference
//! and payment implementations into the lifecycle engine, and serves the
//! HTTP API in front of it.

use clap::Parser;
use quill_config::Config;
use quill_core::{LifecycleBuilder, LifecycleFactories, OrderLifecycle};
use std::path::PathBuf;
use std::sync::Arc;

mod apis;
mod server;

use quill_payment::implementations::mock::create_gateway as create_mock_gateway;
use quill_reference::implementations::memory::create_reference as create_memory_reference;
use quill_roles::implementations::memory::create_roles as create_memory_roles;
use quill_storage::implementations::file::create_storage as create_file_storage;
use quill_storage::implementations::memory::create_storage as create_memory_storage;

/// Command-line arguments for the marketplace service.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
	/// Path to configuration file
	#[arg(short, long, default_value = "config.toml", env = "QUILL_CONFIG")]
	config: PathBuf,

	/// Log level (trace, debug, info, warn, error)
	#[arg(short, long, default_value = "info")]
	log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	use tracing_subscriber::{fmt, EnvFilter};

	let env_filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

	fmt()
		.with_env_filter(env_filter)
		.with_thread_ids(true)
		.with_target(true)
		.init();

	let config = Config::from_file(&args.config).await?;
	tracing::info!(marketplace = %config.marketplace.id, "Loaded configuration");

	let api_config = config.api.clone().filter(|api| api.enabled);
	let engine = Arc::new(build_engine(config)?);

	match api_config {
		Some(api_config) => {
			server::start_server(api_config, engine).await?;
		},
		None => {
			tracing::warn!("API server disabled in configuration; nothing to serve");
		},
	}

	tracing::info!("Stopped marketplace service");
	Ok(())
}

/// Builds a factory map with the signature shared by every pluggable concern.
macro_rules! create_factory_map {
    ($interface:path, $error:path, $( $name:literal => $factory:expr ),* $(,)?) => {{
        let mut factories = std::collections::HashMap::new();
        $(
            factories.insert(
                $name.to_string(),
                $factory as fn(&toml::Value) -> Result<Box<dyn $interface>, $error>
            );
        )*
        factories
    }};
}

/// Builds the lifecycle engine with every available implementation.
pub(crate) fn build_engine(config: Config) -> Result<OrderLifecycle, Box<dyn std::error::Error>> {
	let storage_factories = create_factory_map!(
		quill_storage::StorageInterface,
		quill_storage::StorageError,
		"file" => create_file_storage,
		"memory" => create_memory_storage,
	);

	let role_factories = create_factory_map!(
		quill_roles::RoleInterface,
		quill_roles::RoleError,
		"memory" => create_memory_roles,
	);

	let reference_factories = create_factory_map!(
		quill_reference::ReferenceInterface,
		quill_reference::ReferenceError,
		"memory" => create_memory_reference,
	);

	let payment_factories = create_factory_map!(
		quill_payment::PaymentInterface,
		quill_payment::PaymentError,
		"mock" => create_mock_gateway,
	);

	let factories = LifecycleFactories {
		storage_factories,
		role_factories,
		reference_factories,
		payment_factories,
	};

	Ok(LifecycleBuilder::new(config).build(factories)?)
}

#[cfg(test)]
mod tests {
	use super::*;
	use tempfile::tempdir;

	pub(crate) const TEST_CONFIG: &str = r#"
[marketplace]
id = "test-marketplace"

[engine]
call_timeout_ms = 2000
feedback_request_limit = 2

[storage]
primary = "memory"
[storage.implementations.memory]

[roles]
primary = "memory"
[roles.implementations.memory]
assignments = [
    { user_id = "writer-a", role = "writer" },
    { user_id = "writer-b", role = "writer" },
]

[reference]
primary = "memory"
[reference.implementations.memory]
levels = { "lvl-1" = "Undergraduate" }
urgency = { "urg-1" = "3 days" }

[payment]
primary = "mock"
[payment.implementations.mock]
approve = true
"#;

	#[test]
	fn test_args_default_values() {
		let args = Args::parse_from(["quill"]);
		assert_eq!(args.config, PathBuf::from("config.toml"));
		assert_eq!(args.log_level, "info");
	}

	#[test]
	fn test_args_custom_values() {
		let args = Args::parse_from(["quill", "--config", "custom.toml", "-l", "debug"]);
		assert_eq!(args.config, PathBuf::from("custom.toml"));
		assert_eq!(args.log_level, "debug");
	}

	#[test]
	fn test_create_factory_map_multiple_entries() {
		let factories = create_factory_map!(
			quill_storage::StorageInterface,
			quill_storage::StorageError,
			"memory" => create_memory_storage,
			"file" => create_file_storage,
		);

		assert_eq!(factories.len(), 2);
		assert!(factories.contains_key("memory"));
		assert!(factories.contains_key("file"));
	}

	#[test]
	fn test_build_engine_with_test_config() {
		let config: Config = TEST_CONFIG.parse().unwrap();
		let engine = build_engine(config).unwrap();
		assert_eq!(engine.settings().feedback_request_limit, 2);
		assert_eq!(engine.settings().call_timeout_ms, 2000);
	}

	#[tokio::test]
	async fn test_build_engine_with_file_storage() {
		let temp_dir = tempdir().unwrap();
		let config_path = temp_dir.path().join("config.toml");
		let storage_dir = temp_dir.path().join("orders");
		let content = TEST_CONFIG.replace(
			"[storage]\nprimary = \"memory\"\n[storage.implementations.memory]",
			&format!(
				"[storage]\nprimary = \"file\"\n[storage.implementations.file]\nstorage_path = \"{}\"",
				storage_dir.display()
			),
		);
		std::fs::write(&config_path, content).unwrap();

		let config = Config::from_file(&config_path).await.unwrap();
		assert_eq!(config.storage.primary, "file");
		assert!(build_engine(config).is_ok());
	}

	#[test]
	fn test_unknown_primary_fails_to_build() {
		let config: Config = TEST_CONFIG
			.replace("primary = \"mock\"", "primary = \"card\"")
			.replace("[payment.implementations.mock]", "[payment.implementations.card]")
			.parse()
			.unwrap();
		let err = build_engine(config).err().unwrap();
		assert!(err.to_string().contains("payment"));
	}
}
