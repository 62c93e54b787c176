// SPDX-FileCopyrightText: 2026 Wabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wabot - multi-tenant WhatsApp AI bot backend.
//!
//! This is the binary entry point: the webhook server plus operator commands
//! for provisioning bots and maintaining conversations.

mod admin;
mod serve;
mod shutdown;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use wabot_config::WabotConfig;

/// Wabot - multi-tenant WhatsApp AI bot backend.
#[derive(Parser, Debug)]
#[command(name = "wabot", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the webhook server.
    Serve,
    /// Manage bots.
    Bot {
        #[command(subcommand)]
        action: BotCommand,
    },
    /// Query the gateway for every active bot and store its connection status.
    SyncStatus,
    /// Manage conversations.
    Conversation {
        #[command(subcommand)]
        action: ConversationCommand,
    },
}

#[derive(Subcommand, Debug)]
enum BotCommand {
    /// Register a new bot for a user.
    Add(BotAddArgs),
    /// List bots with their connection status.
    List {
        /// Include deactivated bots.
        #[arg(long)]
        all: bool,
    },
    /// Deactivate a bot. Its conversations are kept.
    Deactivate {
        /// Bot id.
        id: String,
    },
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct BotAddArgs {
    /// Owning user id; created if missing.
    #[arg(long)]
    pub user: String,
    /// Company the bot speaks for.
    #[arg(long)]
    pub company: String,
    /// Tone of voice, e.g. "friendly".
    #[arg(long)]
    pub tone: String,
    /// Free-form instructions for the assistant.
    #[arg(long, default_value = "")]
    pub instructions: String,
    /// Gateway instance the bot answers for.
    #[arg(long)]
    pub instance: Option<String>,
}

#[derive(Subcommand, Debug)]
enum ConversationCommand {
    /// Close a conversation; the customer's next message opens a new one.
    Close {
        /// Conversation id.
        id: String,
    },
}

fn load_config(path: Option<&PathBuf>) -> Option<WabotConfig> {
    let result = match path {
        Some(path) => wabot_config::load_and_validate_path(path),
        None => wabot_config::load_and_validate(),
    };
    match result {
        Ok(config) => Some(config),
        Err(errors) => {
            wabot_config::render_errors(&errors);
            None
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let Some(config) = load_config(cli.config.as_ref()) else {
        return ExitCode::FAILURE;
    };

    let result = match cli.command {
        Commands::Serve => serve::run_serve(config).await,
        Commands::Bot { action } => {
            serve::init_tracing(&config.service.log_level);
            match action {
                BotCommand::Add(args) => admin::run_bot_add(&config, args).await,
                BotCommand::List { all } => admin::run_bot_list(&config, all).await,
                BotCommand::Deactivate { id } => admin::run_bot_deactivate(&config, &id).await,
            }
        }
        Commands::SyncStatus => {
            serve::init_tracing(&config.service.log_level);
            admin::run_sync_status(&config).await
        }
        Commands::Conversation {
            action: ConversationCommand::Close { id },
        } => {
            serve::init_tracing(&config.service.log_level);
            admin::run_conversation_close(&config, &id).await
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("wabot: {e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_bot_add() {
        let cli = Cli::try_parse_from([
            "wabot",
            "bot",
            "add",
            "--user",
            "u1",
            "--company",
            "Acme",
            "--tone",
            "friendly",
            "--instance",
            "acme-main",
        ])
        .unwrap();
        match cli.command {
            Commands::Bot {
                action: BotCommand::Add(args),
            } => {
                assert_eq!(args.user, "u1");
                assert_eq!(args.instructions, "");
                assert_eq!(args.instance.as_deref(), Some("acme-main"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parses_global_config_flag_after_subcommand() {
        let cli = Cli::try_parse_from(["wabot", "sync-status", "--config", "/tmp/wabot.toml"]).unwrap();
        assert!(matches!(cli.command, Commands::SyncStatus));
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/wabot.toml")));
    }

    #[test]
    fn parses_conversation_close() {
        let cli = Cli::try_parse_from(["wabot", "conversation", "close", "c-1"]).unwrap();
        match cli.command {
            Commands::Conversation {
                action: ConversationCommand::Close { id },
            } => assert_eq!(id, "c-1"),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn bot_add_requires_company() {
        assert!(Cli::try_parse_from(["wabot", "bot", "add", "--user", "u1", "--tone", "x"]).is_err());
    }

    #[test]
    fn subcommand_is_required() {
        assert!(Cli::try_parse_from(["wabot"]).is_err());
    }
}
