//! Evently CLI - Command-line interface
//!
//! Usage:
//!   evently hash-password <password> [--cost N]
//!   evently issue-token --id <uuid> --email <email> --role <role> [--inactive]
//!   evently check-config

use anyhow::Context;
use clap::{Parser, Subcommand};
use evently_api::auth::{hash_password, PasswordConfig, TokenIssuer};
use evently_core::config::DEFAULT_HASH_COST_FACTOR;
use evently_core::{AppConfig, Principal, Role};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "evently")]
#[command(about = "Evently credential and configuration tools")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print an Argon2 PHC hash for seeding accounts
    HashPassword {
        /// Plaintext password
        password: String,
        /// Argon2 time cost
        #[arg(long, env = "HASH_COST_FACTOR", default_value_t = DEFAULT_HASH_COST_FACTOR)]
        cost: u32,
    },
    /// Issue a session token with the configured secret and TTL
    IssueToken {
        /// Subject id
        #[arg(long)]
        id: Uuid,
        /// Subject email
        #[arg(long)]
        email: String,
        /// Admin, Organizer or Customer
        #[arg(long, value_parser = parse_role)]
        role: Role,
        /// Mark the subject inactive in the claims
        #[arg(long)]
        inactive: bool,
    },
    /// Load configuration from the environment and report problems
    CheckConfig,
}

fn parse_role(value: &str) -> Result<Role, String> {
    value.parse().map_err(|e: evently_core::EventlyError| e.to_string())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::HashPassword { password, cost } => {
            let hash = hash_password(&password, &PasswordConfig::with_cost_factor(cost))
                .context("Failed to hash password")?;
            println!("{hash}");
        }
        Commands::IssueToken {
            id,
            email,
            role,
            inactive,
        } => {
            let config = AppConfig::from_env().context("Invalid configuration")?;
            let issuer = TokenIssuer::from_config(&config.auth)?;
            let principal = Principal {
                id,
                email,
                is_active: !inactive,
                role,
                first_name: None,
                last_name: None,
            };

            let token = issuer.issue(&principal).context("Failed to sign token")?;
            tracing::info!(
                subject_id = %principal.id,
                ttl_secs = issuer.ttl().as_secs(),
                "Issued token"
            );
            println!("{token}");
        }
        Commands::CheckConfig => match AppConfig::from_env() {
            Ok(config) => {
                println!("Configuration OK");
                println!("  server:   {}:{}", config.server.host, config.server.port);
                println!(
                    "  database: {}",
                    if config.database.postgres_url.is_some() {
                        "postgres"
                    } else {
                        "in-memory"
                    }
                );
                println!("  auth:     {:?}", config.auth);
                println!("  logging:  {:?}", config.logging);
            }
            Err(e) => {
                eprintln!("Configuration error: {e}");
                std::process::exit(1);
            }
        },
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_role_argument_is_case_sensitive() {
        assert_eq!(parse_role("Organizer"), Ok(Role::Organizer));
        assert!(parse_role("organizer").is_err());
    }

    #[test]
    fn test_issue_token_arguments() {
        let id = Uuid::new_v4();
        let id_arg = id.to_string();
        let cli = Cli::try_parse_from([
            "evently",
            "issue-token",
            "--id",
            id_arg.as_str(),
            "--email",
            "a@b.com",
            "--role",
            "Admin",
            "--inactive",
        ])
        .unwrap();

        match cli.command {
            Commands::IssueToken {
                id: parsed,
                role,
                inactive,
                ..
            } => {
                assert_eq!(parsed, id);
                assert_eq!(role, Role::Admin);
                assert!(inactive);
            }
            _ => panic!("expected issue-token"),
        }
    }
}
