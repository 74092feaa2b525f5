//! Command-line interface for strictly_arbiter.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Strictly Arbiter - authoritative tic-tac-toe sessions against a move engine
#[derive(Parser, Debug)]
#[command(name = "strictly_arbiter")]
#[command(about = "Game session and turn arbitration service", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to the database file (overrides config and environment)
    #[arg(long, global = true)]
    pub db_path: Option<String>,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP service
    Serve {
        /// Port to bind to
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Decision engine base URL
        #[arg(long)]
        engine_url: Option<String>,
    },

    /// Apply pending database migrations and exit
    Migrate,

    /// Register a player display name, or show the existing profile
    AddUser {
        /// Display name shown on the leaderboard
        name: String,
    },

    /// List registered player profiles
    Users,

    /// Probe the decision engine once and print its health report
    EngineHealth {
        /// Decision engine base URL
        #[arg(long)]
        engine_url: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_add_user() {
        let cli = Cli::parse_from(["strictly_arbiter", "--db-path", "games.db", "add-user", "Alice"]);
        assert_eq!(cli.db_path.as_deref(), Some("games.db"));
        match cli.command {
            Command::AddUser { name } => assert_eq!(name, "Alice"),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_users() {
        let cli = Cli::parse_from(["strictly_arbiter", "users"]);
        assert!(matches!(cli.command, Command::Users));
    }
}
