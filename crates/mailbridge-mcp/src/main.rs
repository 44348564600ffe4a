//! mailbridge MCP gateway entry point.

use std::sync::Arc;

use clap::{Args, Parser, Subcommand};

use mailbridge::Credentials;
use mailbridge_mcp::config::{
    display_path, load_google_client, non_empty, resolve_credential_paths, Settings, DEFAULT_HOST,
    DEFAULT_PORT,
};
use mailbridge_mcp::tools::google_definitions;
use mailbridge_mcp::types::{InitializeResult, SERVER_NAME, SERVER_VERSION};
use mailbridge_mcp::{
    login, standard_registry, AuthContext, GatewayServer, GatewayState, ProtocolHandler,
    SessionStore, StdioTransport,
};

#[derive(Parser)]
#[command(
    name = "mailbridge-mcp",
    about = "MCP gateway for Gmail, Google Calendar and web tools",
    version
)]
struct Cli {
    /// Log level (trace, debug, info, warn, error). RUST_LOG takes precedence.
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    /// API key for the chat tool, used when a request carries none.
    #[arg(long, env = "CHAT_GPT_API_KEY", global = true, hide_env_values = true)]
    api_key: Option<String>,

    #[command(flatten)]
    listen: ListenArgs,

    #[command(flatten)]
    google: GoogleArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args)]
struct ListenArgs {
    /// Listen host for the HTTP gateway.
    #[arg(long, env = "HOST", default_value = DEFAULT_HOST, global = true)]
    host: String,

    /// Listen port for the HTTP gateway.
    #[arg(long, env = "PORT", default_value_t = DEFAULT_PORT, global = true)]
    port: u16,
}

#[derive(Args)]
struct GoogleArgs {
    /// OAuth client keys file.
    #[arg(long, env = "GMAIL_OAUTH_PATH", global = true)]
    oauth_path: Option<String>,

    /// Stored OAuth tokens file.
    #[arg(long, env = "GMAIL_CREDENTIALS_PATH", global = true)]
    credentials_path: Option<String>,

    /// Do not load Google credentials; mail and calendar tools are disabled.
    #[arg(long, global = true)]
    without_google: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP gateway (default).
    Serve,

    /// Serve a single session over stdin/stdout.
    Stdio {
        /// Token for tools that call authenticated APIs.
        #[arg(long, env = "MCP_TOKEN", hide_env_values = true)]
        token: Option<String>,
    },

    /// Run the interactive Google OAuth flow and store the tokens.
    Auth,

    /// Print server capabilities and tools as JSON.
    Info,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let settings = Settings {
        host: cli.listen.host,
        port: cli.listen.port,
        default_api_key: non_empty(cli.api_key),
        credential_paths: resolve_credential_paths(
            non_empty(cli.google.oauth_path).as_deref(),
            non_empty(cli.google.credentials_path).as_deref(),
        ),
        google_enabled: !cli.google.without_google,
    };
    let credentials = Credentials::new(settings.credential_paths.clone(), None);
    let http = reqwest::Client::builder()
        .user_agent(format!("{SERVER_NAME}/{SERVER_VERSION}"))
        .build()?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            let google = load_google_client(&credentials, settings.google_enabled).await?;
            let registry = Arc::new(standard_registry(http, google)?);

            tracing::info!("mailbridge MCP gateway v{SERVER_VERSION}");
            tracing::info!("Tools: {}", registry.len());
            if settings.default_api_key.is_some() {
                tracing::info!("Default chat API key configured");
            }

            let state = GatewayState::new(ProtocolHandler::new(registry), Arc::new(SessionStore::new()))
                .with_default_api_key(settings.default_api_key.clone());
            GatewayServer::new(state).run(&settings.bind_addr()).await?;
        }

        Commands::Stdio { token } => {
            let google = load_google_client(&credentials, settings.google_enabled).await?;
            let registry = Arc::new(standard_registry(http, google)?);
            let auth = AuthContext::new(
                non_empty(token).unwrap_or_default(),
                settings.default_api_key.clone().unwrap_or_default(),
            );
            StdioTransport::new(ProtocolHandler::new(registry), auth)
                .run()
                .await?;
        }

        Commands::Auth => {
            tracing::info!(
                "Using OAuth keys at {}",
                display_path(&settings.credential_paths.oauth_keys)
            );
            login::authenticate(&credentials).await?;
        }

        Commands::Info => {
            let registry = standard_registry(http, None)?;
            let init = InitializeResult::default_result();
            let info = serde_json::json!({
                "server": init.server_info,
                "protocol_version": init.protocol_version,
                "capabilities": init.capabilities,
                "tools": registry.list().into_iter().map(|t| t.name).collect::<Vec<_>>(),
                "google_tools": google_definitions().into_iter().map(|t| t.name).collect::<Vec<_>>(),
                "listen": settings.bind_addr(),
                "credentials": {
                    "oauth_keys": display_path(&settings.credential_paths.oauth_keys),
                    "credentials": display_path(&settings.credential_paths.credentials),
                },
            });
            println!("{}", serde_json::to_string_pretty(&info)?);
        }
    }

    Ok(())
}
