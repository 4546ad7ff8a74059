//! tenantgate - command-line front end for the tenantgate login module.
//!
//! Logs in against the configured accounts, reports and clears the persisted
//! session, and replays addresses carrying a logout directive.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tenantgate_core::auth::{CredentialService, Credentials, LoginType, SessionStore};
use tenantgate_core::config::{AppConfig, AuthConfig, DEFAULT_ENV_PREFIX};
use tenantgate_core::navigation::Location;
use tenantgate_core::storage::{FileStore, KeyValueStore, KeyringStore, MemoryStore};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Rolling log file name inside `--log-dir`
const LOG_FILE_NAME: &str = "tenantgate.log";

#[derive(Parser, Debug)]
#[command(name = "tenantgate", version, about = "Configuration-driven login gate")]
struct Cli {
    /// Directory holding the persisted session (defaults to the user data dir)
    #[arg(long, env = "TENANTGATE_STORAGE_DIR", global = true)]
    storage_dir: Option<PathBuf>,

    /// Where the session is persisted
    #[arg(long, value_enum, default_value_t = Backend::File, global = true)]
    backend: Backend,

    /// Prefix of the `<CLASS>_USERNAME` / `<CLASS>_PASSWORD` variables
    #[arg(long, env = "TENANTGATE_ENV_PREFIX", default_value = DEFAULT_ENV_PREFIX, global = true)]
    env_prefix: String,

    /// Also write logs to a daily rolling file in this directory
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Backend {
    File,
    Keyring,
    Memory,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Log in with a configured account
    Login(LoginArgs),
    /// Show whether a session is active (never processes logout directives)
    Status,
    /// Check an address the way a page load would, honouring `?logout=true`
    Visit {
        /// Address such as `/dashboard?logout=true`
        url: String,
    },
    /// End the current session
    Logout,
    /// Print the logged-in username and role
    Whoami,
}

#[derive(Args, Debug)]
struct LoginArgs {
    /// Only accept administrator accounts
    #[arg(long, conflicts_with = "tenant")]
    admin: bool,

    /// Only accept tenant accounts
    #[arg(long)]
    tenant: bool,

    /// Username (prompted for when omitted)
    #[arg(short, long)]
    username: Option<String>,
}

impl LoginArgs {
    fn login_type(&self) -> Option<LoginType> {
        if self.admin {
            Some(LoginType::Admin)
        } else if self.tenant {
            Some(LoginType::Tenant)
        } else {
            None
        }
    }
}

/// Initialize the tracing subscriber for logging
fn init_tracing(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_NAME);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_ansi(false).with_writer(writer)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

fn open_storage(backend: Backend, config: &AppConfig, dir_override: Option<PathBuf>) -> Result<Arc<dyn KeyValueStore>> {
    let storage: Arc<dyn KeyValueStore> = match backend {
        Backend::File => {
            let dir = match dir_override {
                Some(dir) => dir,
                None => config.storage_dir()?,
            };
            Arc::new(FileStore::new(&dir).with_context(|| {
                format!("Failed to open session storage in {}", dir.display())
            })?)
        }
        Backend::Keyring => Arc::new(KeyringStore::default()),
        Backend::Memory => Arc::new(MemoryStore::new()),
    };
    Ok(storage)
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let _guard = init_tracing(cli.log_dir.as_deref());
    info!("tenantgate starting");

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let mut app_config = AppConfig::load().unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        AppConfig::default()
    });

    let auth_config = AuthConfig::from_env(cli.env_prefix.clone())?;
    let registry = auth_config.registry_from_env()?;

    let storage = open_storage(cli.backend, &app_config, cli.storage_dir.clone())?;
    let service = CredentialService::new(registry, SessionStore::load(storage));

    match cli.command {
        Command::Login(args) => login(&service, &mut app_config, args).await,
        Command::Status => {
            let logged_in = service.is_logged_in_read_only().await;
            println!("{}", if logged_in { "logged in" } else { "logged out" });
            Ok(ExitCode::SUCCESS)
        }
        Command::Visit { url } => {
            let mut location = Location::parse(&url);
            let logged_in = service.is_logged_in(&mut location).await;
            println!("logged_in: {}", logged_in);
            println!("location: {}", location);
            Ok(ExitCode::SUCCESS)
        }
        Command::Logout => {
            if service.logout().await {
                println!("Logged out");
                Ok(ExitCode::SUCCESS)
            } else {
                eprintln!("Logged out for this run, but the stored session could not be erased");
                Ok(ExitCode::FAILURE)
            }
        }
        Command::Whoami => {
            let session = service.current_session().await;
            match (session.username, session.role) {
                (Some(username), Some(role)) => println!("{} ({})", username, role),
                _ => println!("not logged in"),
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn login(service: &CredentialService, config: &mut AppConfig, args: LoginArgs) -> Result<ExitCode> {
    let username = match args.username.clone() {
        Some(username) => username,
        None => prompt_username(config.last_username.as_deref())?,
    };
    let password = rpassword::prompt_password("Password: ")?;

    let outcome = service
        .login(&Credentials::new(username.clone(), password), args.login_type())
        .await;
    println!("{}", outcome.message);

    if !outcome.success {
        return Ok(ExitCode::FAILURE);
    }

    config.last_username = Some(username);
    if let Err(e) = config.save() {
        warn!(error = %e, "Failed to save config");
    }
    Ok(ExitCode::SUCCESS)
}

fn prompt_username(last: Option<&str>) -> Result<String> {
    match last {
        Some(last) => print!("Username [{}]: ", last),
        None => print!("Username: "),
    }
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let input = input.trim();

    match (input.is_empty(), last) {
        (true, Some(last)) => Ok(last.to_string()),
        _ => Ok(input.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tenantgate_core::navigation::NavigationContext;

    #[test]
    fn test_cli_parses_login_scope() {
        let cli = Cli::try_parse_from(["tenantgate", "login", "--admin", "-u", "root"]).unwrap();
        match cli.command {
            Command::Login(args) => {
                assert_eq!(args.login_type(), Some(LoginType::Admin));
                assert_eq!(args.username.as_deref(), Some("root"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_cli_rejects_conflicting_scopes() {
        assert!(Cli::try_parse_from(["tenantgate", "login", "--admin", "--tenant"]).is_err());
    }

    #[test]
    fn test_cli_visit_and_backend() {
        let cli =
            Cli::try_parse_from(["tenantgate", "--backend", "memory", "visit", "/?logout=true"])
                .unwrap();
        assert_eq!(cli.backend, Backend::Memory);
        assert!(matches!(cli.command, Command::Visit { ref url } if url == "/?logout=true"));
    }

    #[tokio::test]
    async fn test_visit_flow_against_memory_backend() {
        let config = AppConfig::default();
        let storage = open_storage(Backend::Memory, &config, None).unwrap();
        let registry = AuthConfig::new("T_")
            .registry_from_pairs([("T_ADMIN_USERNAME", "root"), ("T_ADMIN_PASSWORD", "hunter2")])
            .unwrap();
        let service = CredentialService::new(registry, SessionStore::load(storage));

        let outcome = service
            .login(&Credentials::new("root", "hunter2"), Some(LoginType::Admin))
            .await;
        assert!(outcome.success);

        let mut location = Location::parse("/admin?logout=true");
        assert!(!service.is_logged_in(&mut location).await);
        assert_eq!(location.path(), "/admin");
        assert_eq!(location.to_string(), "/admin");
    }
}
