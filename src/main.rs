use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;
use una_chat::auth::token::authorize_url;
use una_chat::auth::{AuthError, StaticTokenProvider};
use una_chat::chat::color::{preferred_color, set_preferred_color};
use una_chat::chat::{ChatError, ChatMessage, ChatState, ConnectionStatus, HealthMonitor};
use una_chat::config::ConfigError;
use una_chat::net::{ApiError, WsConnector};
use una_chat::verify::verify_integration;
use una_chat::view::page::{ChatPageProps, render_chat_page, render_document};
use una_chat::view::{Composer, terminal};
use una_chat::{App, AppError, ClientConfig, Route};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    App(#[from] AppError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Chat(#[from] ChatError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("backend reported unhealthy")]
    Unhealthy,
    #[error("timed out waiting for the realtime channel")]
    ConnectTimeout,
    #[error("integration check failed")]
    VerifyFailed,
    #[error("session expired; please log in again")]
    LoggedOut,
}

#[derive(Parser, Debug)]
#[command(name = "una-chat", about = "Una Chat command-line client")]
struct Cli {
    /// REST base URL (overrides UNA_CHAT_API_URL).
    #[arg(long)]
    api_url: Option<String>,

    /// Realtime endpoint (overrides UNA_CHAT_SOCKET_URL).
    #[arg(long)]
    socket_url: Option<String>,

    /// Bearer token issued by the identity provider.
    #[arg(long, env = "UNA_CHAT_TOKEN", hide_env_values = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check `GET /health`.
    Health,
    /// Print recent history.
    History {
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Send one message and exit.
    Send {
        #[arg(long)]
        name: String,
        #[arg(long)]
        color: Option<String>,
        text: String,
    },
    /// Interactive chat: history, live messages and a stdin composer.
    Chat {
        #[arg(long)]
        name: String,
        #[arg(long)]
        color: Option<String>,
    },
    /// Write an HTML transcript of recent history.
    Render {
        #[arg(long)]
        out: PathBuf,
        #[arg(long)]
        name: Option<String>,
    },
    /// Check API health and the socket handshake.
    Verify {
        #[arg(long, default_value_t = 5000)]
        timeout_ms: u64,
    },
    /// Print the identity provider login URL.
    LoginUrl,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();
    let config = ClientConfig::from_env()?.with_overrides(cli.api_url, cli.socket_url)?;
    let app = App::new(config, Arc::new(WsConnector))?;
    let provider = StaticTokenProvider::new(cli.token);

    match cli.command {
        Command::Health => run_health(&app, &provider).await,
        Command::History { limit } => run_history(&app, &provider, limit).await,
        Command::Send { name, color, text } => run_send(&app, &provider, name, color, &text).await,
        Command::Chat { name, color } => run_chat(&app, &provider, name, color).await,
        Command::Render { out, name } => run_render(&app, &provider, out, name.as_deref()).await,
        Command::Verify { timeout_ms } => run_verify(&app, &provider, timeout_ms).await,
        Command::LoginUrl => run_login_url(&app),
    }
}

// =============================================================================
// COMMANDS
// =============================================================================

async fn run_health(app: &App, provider: &StaticTokenProvider) -> Result<(), CliError> {
    use_token_if_any(app, provider).await;
    let monitor = HealthMonitor::new(app.api().clone());
    if monitor.check().await == Some(true) {
        println!("ok");
        return Ok(());
    }
    if let Some(error) = monitor.snapshot().error {
        eprintln!("{error}");
    }
    Err(CliError::Unhealthy)
}

async fn run_history(app: &App, provider: &StaticTokenProvider, limit: Option<usize>) -> Result<(), CliError> {
    use_token_if_any(app, provider).await;
    let limit = limit.unwrap_or(app.config().history_limit);
    for message in app.api().fetch_history(limit).await? {
        println!("{}", terminal::format_message_line(&message.received(), false));
    }
    Ok(())
}

async fn run_send(
    app: &App,
    provider: &StaticTokenProvider,
    name: String,
    color: Option<String>,
    text: &str,
) -> Result<(), CliError> {
    app.login(provider).await?;
    wait_connected(app).await?;

    let chat = app.chat();
    let draft = ChatMessage { name, text: text.to_owned(), color: pick_color(app, color), timestamp: String::new() };
    let result = chat.send_message(&draft).await;
    app.logout();
    result?;
    eprintln!("sent");
    Ok(())
}

async fn run_chat(app: &App, provider: &StaticTokenProvider, name: String, color: Option<String>) -> Result<(), CliError> {
    app.login(provider).await?;
    let color = pick_color(app, color);
    let chat = app.chat();
    chat.activate().await;

    let printer = tokio::spawn(print_messages(chat.subscribe(), name.clone()));
    let mut route = app.subscribe_route();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut composer = Composer::new();
    eprintln!("{}", terminal::status_line(status(app), None));

    let outcome = loop {
        tokio::select! {
            changed = route.changed() => {
                if changed.is_err() || *route.borrow() == Route::Login {
                    break Err(CliError::LoggedOut);
                }
            }
            line = lines.next_line() => {
                let line = match line {
                    Ok(Some(line)) => line,
                    Ok(None) => break Ok(()),
                    Err(e) => break Err(e.into()),
                };
                match line.trim() {
                    "/quit" => break Ok(()),
                    "/clear" => {
                        chat.clear_messages();
                        continue;
                    }
                    "/status" => {
                        eprintln!("{}", terminal::status_line(status(app), chat.snapshot().error.as_deref()));
                        continue;
                    }
                    _ => {}
                }
                if !composer.set_text(&line) {
                    eprintln!("message too long");
                    continue;
                }
                let Some(text) = composer.submit(false) else {
                    continue;
                };
                let draft = ChatMessage { name: name.clone(), text, color: color.clone(), timestamp: String::new() };
                if let Err(e) = chat.send_message(&draft).await {
                    eprintln!("{}", terminal::status_line(status(app), Some(&e.to_string())));
                }
            }
        }
    };

    chat.deactivate();
    printer.abort();
    app.logout();
    outcome
}

async fn run_render(
    app: &App,
    provider: &StaticTokenProvider,
    out: PathBuf,
    name: Option<&str>,
) -> Result<(), CliError> {
    use_token_if_any(app, provider).await;
    let chat = app.chat();
    chat.activate().await;
    let state = chat.snapshot();
    chat.deactivate();

    let monitor = HealthMonitor::new(app.api().clone());
    monitor.check().await;
    let composer = Composer::new();
    let page = render_chat_page(&ChatPageProps {
        state: &state,
        status: monitor.status(false),
        current_user: name,
        composer: &composer,
    });
    std::fs::write(&out, render_document(&page))?;
    eprintln!("wrote {} messages to {}", state.messages.len(), out.display());
    Ok(())
}

async fn run_verify(app: &App, provider: &StaticTokenProvider, timeout_ms: u64) -> Result<(), CliError> {
    let token = provider_token(provider).await;
    let report =
        verify_integration(app.api(), app.channel(), token.as_deref(), Duration::from_millis(timeout_ms)).await;
    for finding in &report.findings {
        println!("{finding}");
    }
    if report.ok { Ok(()) } else { Err(CliError::VerifyFailed) }
}

fn run_login_url(app: &App) -> Result<(), CliError> {
    let state = uuid::Uuid::new_v4().to_string();
    println!("{}", authorize_url(&app.config().identity, &state)?);
    Ok(())
}

// =============================================================================
// HELPERS
// =============================================================================

async fn provider_token(provider: &StaticTokenProvider) -> Option<String> {
    use una_chat::auth::TokenProvider;
    provider.access_token().await.ok()
}

async fn use_token_if_any(app: &App, provider: &StaticTokenProvider) {
    if let Some(token) = provider_token(provider).await {
        app.api().set_token(Some(token));
    }
}

fn pick_color(app: &App, explicit: Option<String>) -> String {
    if let Some(color) = explicit {
        if set_preferred_color(app.session(), &color) {
            return color;
        }
    }
    preferred_color(app.session())
}

fn status(app: &App) -> ConnectionStatus {
    ConnectionStatus::from_parts(app.channel().is_connected(), true)
}

async fn wait_connected(app: &App) -> Result<(), CliError> {
    tokio::time::timeout(CONNECT_TIMEOUT, async {
        while !app.channel().is_connected() {
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    })
    .await
    .map_err(|_| CliError::ConnectTimeout)
}

async fn print_messages(mut state: tokio::sync::watch::Receiver<ChatState>, me: String) {
    let mut printed: Vec<ChatMessage> = Vec::new();
    loop {
        let messages = state.borrow_and_update().messages.clone();
        for message in terminal::unprinted(&printed, &messages) {
            println!("{}", terminal::format_message_line(message, message.name == me));
        }
        printed = messages;
        if state.changed().await.is_err() {
            break;
        }
    }
}
