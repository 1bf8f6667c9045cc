//! `chatwire`: terminal front end for a streaming chat backend.

mod config;
mod render;

use chatwire_client::{ChatClient, ErrorClassifier, TurnOutcome};
use chatwire_transport::{build_transport, TransportKind};
use clap::{Parser, Subcommand};
use config::{ChatwireConfig, Overrides};
use render::Renderer;
use std::io::Write;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "chatwire", about = "Chatwire: streaming chat client")]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "chatwire.toml")]
    config: PathBuf,

    /// Transport to use: socket or http (overrides config)
    #[arg(short, long)]
    transport: Option<TransportKind>,

    /// Question socket URL (overrides config)
    #[arg(long)]
    socket_url: Option<String>,

    /// Webhook URL for the http transport (overrides config)
    #[arg(long)]
    webhook_url: Option<String>,

    /// Environment variable holding the bearer token (overrides config)
    #[arg(long)]
    token_env: Option<String>,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive conversation; `/new` starts a new session, `/quit` exits
    Chat,
    /// Ask one question and print the reply
    Ask {
        /// The question to send
        question: String,
    },
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    if let Ok(path) = dotenvy::dotenv() {
        info!(path = %path.display(), "Loaded environment file");
    }

    let mut config = ChatwireConfig::load(&cli.config).await?;
    config.apply(Overrides {
        transport: cli.transport,
        socket_url: cli.socket_url,
        webhook_url: cli.webhook_url,
        token_env: cli.token_env,
    });

    let transport = build_transport(&config.endpoint)?;
    let mut client = ChatClient::new(transport, config.token_provider())
        .with_classifier(ErrorClassifier::new(config.notices.clone()));

    match cli.command {
        Commands::Chat => chat(&mut client).await?,
        Commands::Ask { question } => {
            let mut renderer = Renderer::new(client.subscribe()).echo_user(true);
            let outcome = run_turn(&mut client, &mut renderer, &question).await?;
            client.shutdown();
            if let Some(TurnOutcome::Failed(category)) = outcome {
                anyhow::bail!("reply failed ({category:?})");
            }
        }
    }

    Ok(())
}

async fn chat(client: &mut ChatClient) -> anyhow::Result<()> {
    let mut renderer = Renderer::new(client.subscribe());
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!(
        "Connected via {} (session {}). /new starts over, /quit exits.",
        client.transport_kind(),
        client.session().id()
    );

    loop {
        print!("you> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        match line.trim() {
            "" => continue,
            "/quit" | "/exit" => break,
            "/new" => {
                client.start_session();
                renderer.flush(&mut std::io::stdout())?;
            }
            question => {
                run_turn(client, &mut renderer, question).await?;
            }
        }
    }

    client.shutdown();
    info!("Goodbye");
    Ok(())
}

/// Submits one question and streams the reply to stdout. Ctrl-C abandons
/// the reply.
async fn run_turn(
    client: &mut ChatClient,
    renderer: &mut Renderer,
    question: &str,
) -> anyhow::Result<Option<TurnOutcome>> {
    let mut stdout = std::io::stdout();

    match client.submit_question(question).await {
        Ok(None) => {}
        Ok(Some(outcome)) => {
            renderer.flush(&mut stdout)?;
            return Ok(Some(outcome));
        }
        Err(e) => {
            warn!(error = %e, "Question not sent");
            eprintln!("{e}");
            return Ok(None);
        }
    }
    renderer.flush(&mut stdout)?;

    let mut outcome = None;
    while client.is_streaming() {
        tokio::select! {
            step = client.step() => {
                outcome = step;
            }
            _ = tokio::signal::ctrl_c() => {
                outcome = client.cancel();
            }
        }
        renderer.flush(&mut stdout)?;
    }
    Ok(outcome)
}
