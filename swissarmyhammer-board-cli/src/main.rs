use clap::Parser;
use std::process;
use std::sync::Arc;
use swissarmyhammer_board::host::{RecordingSink, StaticPrompt};
use swissarmyhammer_board::{
    BoardConfig, DispatchOutcome, Dispatcher, DocumentStore, FsDocumentIo, Message, Prompt,
};

mod cli;
mod logging;
mod prompt;
mod surface;

use cli::{Cli, Commands};
use prompt::TerminalPrompt;

const EXIT_SUCCESS: i32 = 0;
/// The command ran but the message was not applied
const EXIT_WARNING: i32 = 1;
const EXIT_ERROR: i32 = 2;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match BoardConfig::load_from(&cli.config_dir) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Warning: Configuration loading failed: {}", e);
            eprintln!("Continuing with default configuration...");
            BoardConfig::default()
        }
    };
    let config = cli.apply_overrides(config);
    logging::configure_logging(&config.log_level);

    let exit_code = match run(&cli.command, &config).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            EXIT_ERROR
        }
    };
    process::exit(exit_code);
}

async fn run(command: &Commands, config: &BoardConfig) -> anyhow::Result<i32> {
    match command {
        Commands::Show => {
            surface::show(config, &mut tokio::io::stdout()).await?;
            Ok(EXIT_SUCCESS)
        }
        Commands::Apply { message, title } => apply(config, message, title.clone()).await,
        Commands::Serve { .. } => {
            let input = tokio::io::BufReader::new(tokio::io::stdin());
            surface::serve(config, input, &mut tokio::io::stdout()).await?;
            Ok(EXIT_SUCCESS)
        }
    }
}

async fn apply(config: &BoardConfig, raw: &str, title: Option<String>) -> anyhow::Result<i32> {
    let message: Message = serde_json::from_str(raw)
        .map_err(|e| anyhow::anyhow!("not a board message: {e}"))?;

    let io = Arc::new(FsDocumentIo::new(&config.document));
    let store = DocumentStore::open(io, config.template).await?;
    let mut dispatcher = Dispatcher::new(store, Arc::new(RecordingSink::new()));

    let prompt: Box<dyn Prompt> = match title {
        Some(title) => Box::new(StaticPrompt::answer(title)),
        None => Box::new(TerminalPrompt::new()),
    };
    let outcome = dispatcher.dispatch(message, prompt.as_ref()).await;

    let code = match &outcome {
        DispatchOutcome::Committed | DispatchOutcome::Unchanged | DispatchOutcome::Resynced => {
            EXIT_SUCCESS
        }
        DispatchOutcome::PersistFailed(e) | DispatchOutcome::Dropped(e) => {
            eprintln!("Warning: {}", e);
            EXIT_WARNING
        }
        DispatchOutcome::Cancelled => {
            eprintln!("Cancelled");
            EXIT_WARNING
        }
    };

    println!("{}", serde_json::to_string_pretty(dispatcher.board())?);
    Ok(code)
}
