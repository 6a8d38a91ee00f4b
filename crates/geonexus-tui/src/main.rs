use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use geonexus_core::{parse_response, ChatExchange, Config, QueryClient, Sender};

mod app;
mod handler;
mod logging;
mod tui;
mod ui;

use app::App;
use tui::{EventHandler, Tui};

#[derive(Parser)]
#[command(name = "geonexus")]
#[command(version, about = "Terminal chat client for the MOSDAC GeoNexus query assistant")]
struct Cli {
    /// Query endpoint URL (overrides config and GEONEXUS_ENDPOINT)
    #[arg(short, long, global = true)]
    endpoint: Option<String>,

    /// Request timeout in seconds
    #[arg(short, long, global = true)]
    timeout: Option<u64>,

    /// Config file to use instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask a single question and print the reply
    Ask {
        /// Your question
        query: String,
        /// Print only the extracted answer
        #[arg(short, long)]
        answer_only: bool,
    },
    /// Show the effective configuration
    Config {
        /// Persist --endpoint/--timeout to the config file
        #[arg(long)]
        save: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let (config_path, mut config) = match &cli.config {
        Some(path) => (path.clone(), Config::load_from(path)?),
        None => (Config::get_config_path()?, Config::load()?),
    };
    if cli.endpoint.is_some() {
        config.endpoint = cli.endpoint.clone();
    }
    if cli.timeout.is_some() {
        config.timeout_secs = cli.timeout;
    }

    // Flags beat the environment, which beats the file
    let endpoint = cli.endpoint.clone().unwrap_or_else(|| config.endpoint());
    let client = QueryClient::new(&endpoint, config.timeout());

    match cli.command {
        None => {
            let _guard = logging::init_file()?;
            tracing::info!(endpoint = %client.endpoint(), timeout = ?client.timeout(), "starting TUI");
            run_tui(client).await
        }
        Some(Commands::Ask { query, answer_only }) => {
            logging::init_stderr()?;
            let report = ask(&client, &query, answer_only).await?;
            if report.failed {
                eprintln!("{}", report.text);
            } else {
                println!("{}", report.text);
            }
            std::process::exit(report.exit_code());
        }
        Some(Commands::Config { save }) => {
            if save {
                match &cli.config {
                    Some(path) => config.save_to(path)?,
                    None => config.save()?,
                }
                println!("Saved {}", config_path.display());
            }
            println!("config:   {}", config_path.display());
            println!("endpoint: {}", endpoint);
            println!("timeout:  {}s", config.timeout().as_secs());
            println!("log dir:  {}", logging::log_dir().display());
            Ok(())
        }
    }
}

async fn run_tui(client: QueryClient) -> Result<()> {
    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = EventHandler::new();
    let mut app = App::new(client);

    let result = run_loop(&mut terminal, &mut app, &mut events).await;

    app.shutdown();
    tui::restore()?;
    result
}

async fn run_loop(terminal: &mut Tui, app: &mut App, events: &mut EventHandler) -> Result<()> {
    let tx = events.sender();
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(app, event, &tx)?,
            None => break,
        }
    }
    Ok(())
}

/// What a one-shot question produced: the text to print and whether it failed
#[derive(Debug)]
struct AskReport {
    text: String,
    failed: bool,
}

impl AskReport {
    fn exit_code(&self) -> i32 {
        if self.failed { 1 } else { 0 }
    }
}

async fn ask(client: &QueryClient, query: &str, answer_only: bool) -> Result<AskReport> {
    let mut chat = ChatExchange::new();
    let Some(pending) = chat.begin_submit(query) else {
        anyhow::bail!("Query is empty");
    };

    let outcome = client.query(&pending.query).await;
    let failed = outcome.is_err();
    chat.complete(pending.ticket, outcome);

    let Some(reply) = chat.messages().last().filter(|m| m.sender == Sender::Assistant) else {
        anyhow::bail!("No reply recorded");
    };

    let text = if failed {
        reply.text.clone()
    } else if answer_only {
        parse_response(&reply.text).answer_or_default().to_string()
    } else {
        ChatExchange::render(reply).to_plain_text()
    };
    Ok(AskReport { text, failed })
}
