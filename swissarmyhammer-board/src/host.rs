//! Host collaborators: title prompting and the render channel.

use crate::message::RenderMessage;
use async_trait::async_trait;
use std::sync::Mutex;
use tokio::sync::{mpsc, oneshot};

/// What the engine is asking the user for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptRequest {
    /// Short label shown next to the input ("Column title")
    pub label: String,
    /// Placeholder text for the input box
    pub placeholder: String,
}

impl PromptRequest {
    pub fn new(label: impl Into<String>, placeholder: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            placeholder: placeholder.into(),
        }
    }
}

/// Asks the user for a line of text. `None` means the user cancelled.
///
/// Implementations may take as long as the user does; the engine keeps
/// processing other messages while a prompt is open.
#[async_trait]
pub trait Prompt: Send + Sync {
    async fn prompt(&self, request: &PromptRequest) -> Option<String>;
}

/// Always answers with the same value
#[derive(Debug, Clone, Default)]
pub struct StaticPrompt(pub Option<String>);

impl StaticPrompt {
    pub fn answer(text: impl Into<String>) -> Self {
        Self(Some(text.into()))
    }

    pub fn cancel() -> Self {
        Self(None)
    }
}

#[async_trait]
impl Prompt for StaticPrompt {
    async fn prompt(&self, _request: &PromptRequest) -> Option<String> {
        self.0.clone()
    }
}

/// A prompt that is waiting for an answer from whoever holds the receiver
#[derive(Debug)]
pub struct PendingPrompt {
    pub request: PromptRequest,
    reply: oneshot::Sender<Option<String>>,
}

impl PendingPrompt {
    /// Answer the prompt; `None` cancels it
    pub fn respond(self, answer: Option<String>) {
        // The asker may already be gone; nothing to do then
        let _ = self.reply.send(answer);
    }
}

/// Forwards prompts over a channel so another task (a UI, a test) can answer
/// them. Dropping a [`PendingPrompt`] without responding counts as a cancel.
#[derive(Debug, Clone)]
pub struct ChannelPrompt {
    tx: mpsc::UnboundedSender<PendingPrompt>,
}

impl ChannelPrompt {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<PendingPrompt>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl Prompt for ChannelPrompt {
    async fn prompt(&self, request: &PromptRequest) -> Option<String> {
        let (reply, answer) = oneshot::channel();
        let pending = PendingPrompt {
            request: request.clone(),
            reply,
        };
        self.tx.send(pending).ok()?;
        answer.await.ok().flatten()
    }
}

/// Receives render messages for the surface
pub trait RenderSink: Send + Sync {
    fn send(&self, message: RenderMessage);
}

/// Sends render messages into a tokio channel
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<RenderMessage>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<RenderMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl RenderSink for ChannelSink {
    fn send(&self, message: RenderMessage) {
        if self.tx.send(message).is_err() {
            tracing::debug!("render surface detached, dropping snapshot");
        }
    }
}

/// Keeps every render message, for inspection in tests
#[derive(Debug, Default)]
pub struct RecordingSink {
    messages: Mutex<Vec<RenderMessage>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything sent so far, oldest first
    pub fn messages(&self) -> Vec<RenderMessage> {
        self.messages.lock().map(|m| m.clone()).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.messages.lock().map(|m| m.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RenderSink for RecordingSink {
    fn send(&self, message: RenderMessage) {
        if let Ok(mut messages) = self.messages.lock() {
            messages.push(message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_channel_prompt_answer() {
        let (prompt, mut requests) = ChannelPrompt::new();
        let asking = tokio::spawn(async move {
            prompt
                .prompt(&PromptRequest::new("Card title", "New card"))
                .await
        });

        let pending = requests.recv().await.unwrap();
        assert_eq!(pending.request.label, "Card title");
        pending.respond(Some("Ship it".into()));

        assert_eq!(asking.await.unwrap(), Some("Ship it".to_string()));
    }

    #[tokio::test]
    async fn test_channel_prompt_dropped_is_cancel() {
        let (prompt, mut requests) = ChannelPrompt::new();
        let asking = tokio::spawn(async move {
            prompt.prompt(&PromptRequest::new("Column title", "")).await
        });

        drop(requests.recv().await.unwrap());
        assert_eq!(asking.await.unwrap(), None);
    }

    #[test]
    fn test_static_prompt() {
        let request = PromptRequest::new("x", "y");
        assert_eq!(
            tokio_test::block_on(StaticPrompt::answer("A").prompt(&request)),
            Some("A".into())
        );
        assert_eq!(tokio_test::block_on(StaticPrompt::cancel().prompt(&request)), None);
    }
}
