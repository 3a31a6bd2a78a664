//! Command-line client for the PackNow on-demand packaging service.
//!
//! Lets a customer register and log in, compose an order and review its
//! estimate before placing it, and follow existing orders as packers pick
//! them up.

use clap::{Parser, Subcommand};
use packnow_config::{Config, ConfigError};
use packnow_core::PackNowClient;
use packnow_types::{Category, FragilityLevel, OrderId, Urgency};
use std::path::{Path, PathBuf};

mod commands;
mod render;

use commands::{CliError, CreateArgs, RegisterArgs};

const DEFAULT_CONFIG: &str = "packnow.toml";

/// Command-line arguments for the PackNow client.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
	/// Path to configuration file. Built-in defaults apply when the default
	/// file does not exist.
	#[arg(short, long, env = "PACKNOW_CONFIG", default_value = DEFAULT_CONFIG)]
	config: PathBuf,

	/// Log level (trace, debug, info, warn, error)
	#[arg(short, long, default_value = "warn")]
	log_level: String,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Create an account and log in
	Register {
		#[arg(long)]
		name: String,
		#[arg(long)]
		phone: String,
		#[arg(long)]
		email: Option<String>,
		#[arg(long, env = "PACKNOW_PASSWORD", hide_env_values = true)]
		password: String,
		#[arg(long, requires = "lng", allow_negative_numbers = true)]
		lat: Option<f64>,
		#[arg(long, requires = "lat", allow_negative_numbers = true)]
		lng: Option<f64>,
	},
	/// Log in with phone number and password
	Login {
		#[arg(long)]
		phone: String,
		#[arg(long, env = "PACKNOW_PASSWORD", hide_env_values = true)]
		password: String,
	},
	/// Forget the stored session
	Logout,
	/// Show the logged-in user
	Whoami,
	/// Inspect existing orders
	Orders {
		#[command(subcommand)]
		command: OrdersCommand,
	},
	/// Place a new order
	Order {
		#[command(subcommand)]
		command: OrderCommand,
	},
}

#[derive(Subcommand, Debug)]
enum OrdersCommand {
	/// List all orders, newest first
	List,
	/// Show one order with its status timeline
	Show { id: OrderId },
	/// Follow status changes until the order completes
	Track { id: OrderId },
	/// Cancel an order that is still open
	Cancel { id: OrderId },
}

#[derive(Subcommand, Debug)]
enum OrderCommand {
	/// Get an estimate and, once confirmed, create the order
	Create {
		/// gift, electronics, food, documents, business_orders,
		/// fragile_items or house_shifting
		#[arg(long)]
		category: Option<Category>,
		/// Length in cm
		#[arg(long)]
		length: String,
		/// Width in cm
		#[arg(long)]
		width: String,
		/// Height in cm
		#[arg(long)]
		height: String,
		/// Weight in kg
		#[arg(long)]
		weight: String,
		#[arg(long, default_value = "low")]
		fragility: FragilityLevel,
		#[arg(long, default_value = "normal")]
		urgency: Urgency,
		/// Pickup address
		#[arg(long)]
		address: String,
		#[arg(long, allow_negative_numbers = true)]
		lat: Option<f64>,
		#[arg(long, allow_negative_numbers = true)]
		lng: Option<f64>,
		/// Place the order without asking for confirmation
		#[arg(short, long)]
		yes: bool,
	},
}

/// Main entry point for the PackNow client.
///
/// Logs go to stderr so command output on stdout stays clean. A failed
/// command prints its message and exits with status 1.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	use tracing_subscriber::{fmt, EnvFilter};

	let env_filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
	fmt()
		.with_env_filter(env_filter)
		.with_target(true)
		.with_writer(std::io::stderr)
		.init();

	let config = load_config(&args.config).await?;
	tracing::debug!(base_url = %config.api.base_url, "Loaded configuration");
	let client = PackNowClient::from_config(config)?;

	if let Err(e) = run(&client, args.command).await {
		tracing::debug!(error = ?e, "Command failed");
		eprintln!("Error: {}", e);
		std::process::exit(1);
	}
	Ok(())
}

/// Reads `path`, falling back to built-in defaults only when the default
/// file is absent.
async fn load_config(path: &Path) -> Result<Config, CliError> {
	if path == Path::new(DEFAULT_CONFIG) && !tokio::fs::try_exists(path).await? {
		tracing::debug!("No {} found, using defaults", DEFAULT_CONFIG);
		return Ok(Config::default());
	}
	let config = Config::from_file(path).await?;
	require_persistent_sessions(&config)?;
	Ok(config)
}

/// Every command runs in its own process, so a session kept in memory is
/// gone before the next command could use it.
fn require_persistent_sessions(config: &Config) -> Result<(), ConfigError> {
	if config.session.primary == "memory" {
		return Err(ConfigError::Validation(
			"Session storage 'memory' does not survive between commands, use 'file'".into(),
		));
	}
	Ok(())
}

async fn run(client: &PackNowClient, command: Command) -> Result<(), CliError> {
	match command {
		Command::Register {
			name,
			phone,
			email,
			password,
			lat,
			lng,
		} => {
			let args = RegisterArgs {
				name,
				phone,
				email,
				password,
				lat,
				lng,
			};
			commands::register(client, args).await
		}
		Command::Login { phone, password } => commands::login(client, &phone, password).await,
		Command::Logout => commands::logout(client).await,
		Command::Whoami => commands::whoami(client).await,
		Command::Orders { command } => match command {
			OrdersCommand::List => commands::list_orders(client).await,
			OrdersCommand::Show { id } => commands::show_order(client, id).await,
			OrdersCommand::Track { id } => commands::track_order(client, id).await,
			OrdersCommand::Cancel { id } => commands::cancel_order(client, id).await,
		},
		Command::Order {
			command:
				OrderCommand::Create {
					category,
					length,
					width,
					height,
					weight,
					fragility,
					urgency,
					address,
					lat,
					lng,
					yes,
				},
		} => {
			let args = CreateArgs {
				category,
				length,
				width,
				height,
				weight,
				fragility,
				urgency,
				address,
				lat,
				lng,
				yes,
			};
			commands::create_order(client, args).await
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use clap::CommandFactory;

	#[test]
	fn test_cli_definition() {
		Args::command().debug_assert();
	}

	#[test]
	fn test_parse_create() {
		let args = Args::try_parse_from([
			"packnow",
			"order",
			"create",
			"--category",
			"gift",
			"--length",
			"10",
			"--width",
			"10",
			"--height",
			"10",
			"--weight",
			"1",
			"--urgency",
			"urgent",
			"--address",
			"14 Hill Road",
			"--yes",
		])
		.unwrap();

		match args.command {
			Command::Order {
				command:
					OrderCommand::Create {
						category,
						urgency,
						fragility,
						yes,
						..
					},
			} => {
				assert_eq!(category, Some(Category::Gift));
				assert_eq!(urgency, Urgency::Urgent);
				assert_eq!(fragility, FragilityLevel::Low);
				assert!(yes);
			}
			other => panic!("unexpected command: {:?}", other),
		}
	}

	#[test]
	fn test_parse_order_id_with_hash() {
		let args = Args::try_parse_from(["packnow", "orders", "show", "#42"]).unwrap();
		assert!(matches!(
			args.command,
			Command::Orders {
				command: OrdersCommand::Show { id: OrderId(42) }
			}
		));
	}

	#[test]
	fn test_memory_sessions_rejected() {
		let config: Config = r#"
			[session]
			primary = "memory"
			[session.implementations.memory]
		"#
		.parse()
		.unwrap();
		let err = require_persistent_sessions(&config).unwrap_err();
		assert!(err.to_string().contains("'memory' does not survive"));

		assert!(require_persistent_sessions(&Config::default()).is_ok());
	}

	#[tokio::test]
	async fn test_load_config_rejects_memory_sessions() {
		let dir = std::env::temp_dir().join(format!("packnow-cli-{}", std::process::id()));
		std::fs::create_dir_all(&dir).unwrap();
		let path = dir.join("memory.toml");
		std::fs::write(
			&path,
			"[session]\nprimary = \"memory\"\n[session.implementations.memory]\n",
		)
		.unwrap();

		let result = load_config(&path).await;
		std::fs::remove_dir_all(&dir).unwrap();
		assert!(matches!(result, Err(CliError::Config(ConfigError::Validation(_)))));
	}

	#[test]
	fn test_unknown_category_is_rejected() {
		let result = Args::try_parse_from([
			"packnow", "order", "create", "--category", "furniture", "--length", "1", "--width",
			"1", "--height", "1", "--weight", "1", "--address", "x",
		]);
		assert!(result.is_err());
	}
}
