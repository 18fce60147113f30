//! Terminal title prompt for one-shot commands.

use async_trait::async_trait;
use dialoguer::{theme::ColorfulTheme, Input};
use std::io::{self, IsTerminal};
use swissarmyhammer_board::{Prompt, PromptRequest};

/// Asks on the terminal with dialoguer. Without a terminal every prompt is
/// cancelled, so scripted runs never hang.
#[derive(Debug, Clone)]
pub struct TerminalPrompt {
    interactive: bool,
}

impl TerminalPrompt {
    pub fn new() -> Self {
        Self {
            interactive: io::stdin().is_terminal(),
        }
    }

    fn ask(request: &PromptRequest) -> Option<String> {
        let answer = Input::<String>::with_theme(&ColorfulTheme::default())
            .with_prompt(&request.label)
            .with_initial_text(&request.placeholder)
            .allow_empty(true)
            .interact_text();

        match answer {
            Ok(text) => Some(text),
            Err(e) => {
                tracing::warn!("failed to read title: {}", e);
                None
            }
        }
    }
}

impl Default for TerminalPrompt {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Prompt for TerminalPrompt {
    async fn prompt(&self, request: &PromptRequest) -> Option<String> {
        if !self.interactive {
            tracing::warn!("no terminal to ask for {}; pass --title", request.label);
            return None;
        }

        let request = request.clone();
        match tokio::task::spawn_blocking(move || Self::ask(&request)).await {
            Ok(answer) => answer,
            Err(e) => {
                tracing::error!("prompt task failed: {}", e);
                None
            }
        }
    }
}
