//! mentor CLI: terminal chat client for the CyberMentor chat service

use clap::{Parser, Subcommand};
use mentor_engine::{
    init_logging, ChatRequest, ChatService, ChatSession, Config, ConfigError, HttpChatService,
    LogTarget,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// Chat with the CyberMentor tutor from the terminal
#[derive(Parser)]
#[command(name = "mentor")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file (default: .mentor/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Chat service base URL
    #[arg(long, global = true)]
    endpoint: Option<String>,

    /// Learning platform id sent with each message
    #[arg(long, global = true)]
    platform: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the chat page (default when no command specified)
    Tui,

    /// Send one message and print the reply
    Send {
        /// Message text
        message: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check that the chat service is up
    Health {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the learning platforms the service knows
    Platforms {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the service's conversation history
    History {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Clear the service's conversation history
    ClearHistory,

    /// Write a default config file
    Init,
}

/// Exit code for a message rejected before sending.
const EXIT_USAGE: i32 = 2;

fn main() {
    let cli = Cli::parse();
    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);

    let config = match resolve_config(&cli, &config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: failed to load {}: {e}", config_path.display());
            std::process::exit(1);
        }
    };

    let command = cli.command.unwrap_or(Commands::Tui);

    // The chat page owns the terminal, so its diagnostics go to a file.
    let target = match command {
        Commands::Tui => LogTarget::File(config.log_file.clone()),
        _ => LogTarget::Stderr,
    };
    let _log_guard = match init_logging(&target) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Warning: logging disabled: {e}");
            None
        }
    };

    if let Commands::Init = command {
        cmd_init(&config, &config_path);
        return;
    }

    let service = match HttpChatService::new(&config.endpoint, config.request_timeout()) {
        Ok(service) => service,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error: failed to start runtime: {e}");
            std::process::exit(1);
        }
    };

    let code = rt.block_on(async {
        match command {
            Commands::Tui => cmd_tui(&config, service).await,
            Commands::Send { message, json } => cmd_send(&config, &service, message, json).await,
            Commands::Health { json } => cmd_health(&service, json).await,
            Commands::Platforms { json } => cmd_platforms(&service, json).await,
            Commands::History { json } => cmd_history(&service, json).await,
            Commands::ClearHistory => cmd_clear_history(&service).await,
            Commands::Init => 0,
        }
    });

    // Abandon requests still in flight instead of waiting on them.
    rt.shutdown_background();

    if code != 0 {
        std::process::exit(code);
    }
}

/// File, then environment, then flags.
fn resolve_config(cli: &Cli, path: &Path) -> Result<Config, ConfigError> {
    resolve_config_with(cli, path, |key| std::env::var(key).ok())
}

fn resolve_config_with<F>(cli: &Cli, path: &Path, lookup: F) -> Result<Config, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = Config::load_or_default(path)?.with_env_from(lookup);
    if let Some(endpoint) = &cli.endpoint {
        config.endpoint.clone_from(endpoint);
    }
    if let Some(platform) = &cli.platform {
        config.platform = Some(platform.clone()).filter(|p| !p.trim().is_empty());
    }
    Ok(config)
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> i32 {
    match serde_json::to_string_pretty(value) {
        Ok(text) => {
            println!("{text}");
            0
        }
        Err(e) => {
            eprintln!("Error: failed to serialize: {e}");
            1
        }
    }
}

async fn cmd_tui(config: &Config, service: HttpChatService) -> i32 {
    let session = ChatSession::new(Arc::new(service)).with_platform(config.platform.clone());
    match mentor_tui::run_tui(config, session).await {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("Error: {e}");
            1
        }
    }
}

async fn cmd_send(config: &Config, service: &HttpChatService, message: String, json: bool) -> i32 {
    if message.trim().is_empty() {
        eprintln!("Error: message is empty");
        return EXIT_USAGE;
    }

    let request = ChatRequest::new(message).with_platform(config.platform.clone());
    match service.send_message(&request).await {
        Ok(reply) => {
            info!(sources_used = ?reply.sources_used, "reply received");
            if json {
                print_json(&reply)
            } else {
                println!("{}", reply.response);
                0
            }
        }
        Err(e) => {
            warn!(error = %e, "chat request failed");
            eprintln!("Error: {e}");
            1
        }
    }
}

async fn cmd_health(service: &HttpChatService, json: bool) -> i32 {
    match service.health().await {
        Ok(health) if json => print_json(&health),
        Ok(health) => {
            println!("Service: {}", service.base_url());
            println!("  Status: {}", health.status);
            println!(
                "  Chatbot: {}",
                if health.chatbot_initialized {
                    "ready"
                } else {
                    "not initialized"
                }
            );
            if let Some(version) = &health.version {
                println!("  Version: {version}");
            }
            0
        }
        Err(e) => {
            eprintln!("Error: {e}");
            1
        }
    }
}

async fn cmd_platforms(service: &HttpChatService, json: bool) -> i32 {
    match service.platforms().await {
        Ok(platforms) if json => print_json(&platforms),
        Ok(platforms) => {
            if platforms.is_empty() {
                println!("No platforms available");
            }
            for platform in &platforms {
                println!("  {} - {}", platform.id, platform.name);
                if !platform.description.is_empty() {
                    println!("    {}", platform.description);
                }
            }
            0
        }
        Err(e) => {
            eprintln!("Error: {e}");
            1
        }
    }
}

async fn cmd_history(service: &HttpChatService, json: bool) -> i32 {
    match service.history().await {
        Ok(history) if json => print_json(&history),
        Ok(history) => {
            if history.is_empty() {
                println!("No history");
            }
            for entry in &history {
                let platform = entry.platform.as_deref().unwrap_or("general");
                println!("[{}] ({platform})", entry.timestamp);
                println!("  You: {}", entry.user);
                println!("  Bot: {}", entry.bot);
                println!();
            }
            0
        }
        Err(e) => {
            eprintln!("Error: {e}");
            1
        }
    }
}

async fn cmd_clear_history(service: &HttpChatService) -> i32 {
    match service.clear_history().await {
        Ok(message) => {
            println!("{message}");
            0
        }
        Err(e) => {
            eprintln!("Error: {e}");
            1
        }
    }
}

fn cmd_init(config: &Config, path: &Path) {
    if path.exists() {
        println!("Config already exists at {}", path.display());
        return;
    }

    match config.save(path) {
        Ok(()) => {
            println!("Created {}", path.display());
            println!("Chat service: {}", config.endpoint);
        }
        Err(e) => {
            eprintln!("Failed to write config: {e}");
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mentor_engine::config::{ENV_ENDPOINT, ENV_PLATFORM};
    use tempfile::TempDir;

    fn service_for(server: &mockito::ServerGuard) -> HttpChatService {
        HttpChatService::new(&server.url(), None).unwrap()
    }

    #[test]
    fn test_defaults_to_tui() {
        let cli = Cli::try_parse_from(["mentor"]).unwrap();
        assert!(cli.command.is_none());
        assert!(cli.endpoint.is_none());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "mentor",
            "send",
            "What is XSS?",
            "--json",
            "--endpoint",
            "http://example.test",
        ])
        .unwrap();
        assert_eq!(cli.endpoint.as_deref(), Some("http://example.test"));
        match cli.command {
            Some(Commands::Send { message, json }) => {
                assert_eq!(message, "What is XSS?");
                assert!(json);
            }
            _ => panic!("expected send"),
        }
    }

    #[test]
    fn test_flags_override_file_defaults() {
        let cli = Cli::try_parse_from(["mentor", "--platform", "tryhackme", "health"]).unwrap();
        let config = resolve_config(&cli, Path::new("/nonexistent/mentor.json")).unwrap();
        assert_eq!(config.platform.as_deref(), Some("tryhackme"));
    }

    #[test]
    fn test_clear_history_command_name() {
        let cli = Cli::try_parse_from(["mentor", "clear-history"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::ClearHistory)));
    }

    #[test]
    fn test_env_beats_file_and_flag_beats_env() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        let file = Config {
            endpoint: "http://file.test".into(),
            platform: Some("picoCTF".into()),
            ..Config::default()
        };
        file.save(&path).unwrap();

        let env = |key: &str| match key {
            ENV_ENDPOINT => Some("http://env.test".to_string()),
            ENV_PLATFORM => Some("hackthebox".to_string()),
            _ => None,
        };

        let cli = Cli::try_parse_from(["mentor", "--platform", "tryhackme"]).unwrap();
        let config = resolve_config_with(&cli, &path, env).unwrap();
        assert_eq!(config.endpoint, "http://env.test");
        assert_eq!(config.platform.as_deref(), Some("tryhackme"));

        let cli = Cli::try_parse_from(["mentor", "--endpoint", "http://flag.test"]).unwrap();
        let config = resolve_config_with(&cli, &path, env).unwrap();
        assert_eq!(config.endpoint, "http://flag.test");
        assert_eq!(config.platform.as_deref(), Some("hackthebox"));

        let cli = Cli::try_parse_from(["mentor"]).unwrap();
        let config = resolve_config_with(&cli, &path, |_| None).unwrap();
        assert_eq!(config, file);
    }

    #[tokio::test]
    async fn test_send_blank_message_is_usage_error() {
        let mut server = mockito::Server::new_async().await;
        let mock = server.mock("POST", "/chat").expect(0).create_async().await;

        let code = cmd_send(&Config::default(), &service_for(&server), "   ".into(), false).await;

        assert_eq!(code, EXIT_USAGE);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_send_reply_exits_zero() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat")
            .match_body(mockito::Matcher::JsonString(r#"{"message":"Hi"}"#.into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"response":"Hello!"}"#)
            .create_async()
            .await;

        let code = cmd_send(&Config::default(), &service_for(&server), "Hi".into(), false).await;

        assert_eq!(code, 0);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_send_failure_exits_one() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat")
            .with_status(500)
            .create_async()
            .await;

        let code = cmd_send(&Config::default(), &service_for(&server), "Hi".into(), true).await;

        assert_eq!(code, 1);
        mock.assert_async().await;
    }
}
