use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use swissarmyhammer_board::{BoardConfig, Template};

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq)]
pub enum TemplateArg {
    Default,
    Empty,
}

impl From<TemplateArg> for Template {
    fn from(arg: TemplateArg) -> Self {
        match arg {
            TemplateArg::Default => Template::Default,
            TemplateArg::Empty => Template::Empty,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "board")]
#[command(version)]
#[command(about = "Keep a JSON board document in sync with a render surface")]
#[command(long_about = "
board opens a single JSON document holding columns of cards and applies
surface messages (add, rename, delete, move) to it, one at a time.

In `serve` mode it speaks JSON lines: messages on stdin, board snapshots
on stdout, logs on stderr. Edits made to the document by other programs
are picked up and pushed out as fresh snapshots.
")]
pub struct Cli {
    /// Board document to open (created from the template when missing)
    #[arg(short, long, global = true)]
    pub document: Option<PathBuf>,

    /// Layout for a new document
    #[arg(long, value_enum, global = true)]
    pub template: Option<TemplateArg>,

    /// Log filter, e.g. `debug` or `swissarmyhammer_board=trace`
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Directory searched for board.toml / board.yaml
    #[arg(long, global = true, default_value = ".")]
    pub config_dir: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the board as JSON
    Show,
    /// Apply one message and print the resulting board
    #[command(long_about = "
Apply a single surface message given as JSON, for example:

  board apply '{\"type\":\"rename-column\",\"columnId\":\"intake\",\"newTitle\":\"Backlog\"}'

add-column and add-card need a title; pass --title or answer the prompt.
")]
    Apply {
        /// The message, as JSON
        message: String,
        /// Title for add-column / add-card instead of prompting
        #[arg(long)]
        title: Option<String>,
    },
    /// Run a session speaking JSON lines over stdin/stdout
    Serve {
        /// Don't watch the document for external edits
        #[arg(long)]
        no_watch: bool,
    },
}

impl Cli {
    /// Lay command line flags over the loaded configuration
    pub fn apply_overrides(&self, mut config: BoardConfig) -> BoardConfig {
        if let Some(document) = &self.document {
            config.document = document.clone();
        }
        if let Some(template) = self.template {
            config.template = template.into();
        }
        if let Some(level) = &self.log_level {
            config.log_level = level.clone();
        }
        if let Commands::Serve { no_watch: true } = self.command {
            config.watch = false;
        }
        config
    }
}
