//! JSON-lines render surface over stdin/stdout.
//!
//! Inbound, one JSON object per line:
//! - a surface message (`{"type":"move-card",...}`)
//! - an answer to the oldest open prompt (`{"answer":"Title"}` or `{"answer":null}`)
//!
//! Outbound, one JSON object per line:
//! - `{"type":"data","data":<board>}` snapshots
//! - `{"type":"prompt","label":...,"placeholder":...}` when a title is needed

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;
use swissarmyhammer_board::{
    host::PendingPrompt, BoardConfig, ChannelPrompt, ChannelSink, Dispatcher, DocumentStore,
    DocumentWatcher, FsDocumentIo, Message, RenderMessage, Session,
};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Inbound {
    Answer(PromptAnswer),
    Message(Message),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PromptAnswer {
    answer: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename = "prompt")]
struct PromptLine<'a> {
    label: &'a str,
    placeholder: &'a str,
}

fn parse_line(line: &str) -> serde_json::Result<Inbound> {
    serde_json::from_str(line)
}

async fn write_line<W, T>(output: &mut W, value: &T) -> Result<()>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let mut line = serde_json::to_vec(value)?;
    line.push(b'\n');
    output.write_all(&line).await?;
    output.flush().await?;
    Ok(())
}

/// Run a session until `input` ends
pub async fn serve<R, W>(config: &BoardConfig, input: R, output: &mut W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let io = Arc::new(FsDocumentIo::new(&config.document));
    let store = DocumentStore::open(io, config.template)
        .await
        .with_context(|| format!("failed to open {}", config.document.display()))?;

    let (sink, mut renders) = ChannelSink::new();
    let (prompt, mut prompts) = ChannelPrompt::new();
    let dispatcher = Dispatcher::new(store, Arc::new(sink));
    let (session, handle) = Session::new(dispatcher, Arc::new(prompt));
    let session_task = tokio::spawn(session.run());

    let _watcher = if config.watch {
        Some(DocumentWatcher::start(&config.document, handle.clone())?)
    } else {
        None
    };

    let mut lines = input.lines();
    let mut open_prompts: VecDeque<PendingPrompt> = VecDeque::new();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read from surface")? else {
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                match parse_line(&line) {
                    Ok(Inbound::Message(message)) => {
                        if !handle.send(message) {
                            break;
                        }
                    }
                    Ok(Inbound::Answer(PromptAnswer { answer })) => match open_prompts.pop_front() {
                        Some(pending) => pending.respond(answer),
                        None => tracing::warn!("answer received with no prompt open"),
                    },
                    Err(e) => tracing::warn!("ignoring malformed surface line: {}", e),
                }
            }
            Some(render) = renders.recv() => {
                write_line(output, &render).await?;
            }
            Some(pending) = prompts.recv() => {
                let request = &pending.request;
                write_line(output, &PromptLine {
                    label: &request.label,
                    placeholder: &request.placeholder,
                }).await?;
                open_prompts.push_back(pending);
            }
        }
    }

    // Unanswered prompts are cancelled by dropping them
    drop(open_prompts);
    handle.shutdown();
    session_task.await.context("session task failed")?;

    while let Ok(render) = renders.try_recv() {
        write_line(output, &render).await?;
    }
    Ok(())
}

/// Print the current board
pub async fn show<W: AsyncWrite + Unpin>(config: &BoardConfig, output: &mut W) -> Result<()> {
    let io = Arc::new(FsDocumentIo::new(&config.document));
    let store = DocumentStore::open(io, config.template)
        .await
        .with_context(|| format!("failed to open {}", config.document.display()))?;

    let text = serde_json::to_string_pretty(&RenderMessage::snapshot(store.board()))?;
    output.write_all(text.as_bytes()).await?;
    output.write_all(b"\n").await?;
    output.flush().await?;
    Ok(())
}
