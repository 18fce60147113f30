//! Session - the single ordered processing point
//!
//! UI messages, external document changes and prompt answers all arrive on
//! one queue and are handled one at a time by one task, so the board never
//! sees two mutations at once. Prompts run in their own tasks and report back
//! through the same queue; while a prompt is open, later messages keep
//! flowing, and the creation is applied to whatever the board is when the
//! answer comes in.

use crate::dispatch::{DispatchOutcome, Dispatcher, PendingCreate, Step, SyncOutcome};
use crate::host::Prompt;
use crate::message::Message;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Everything the session reacts to
#[derive(Debug)]
pub enum SessionEvent {
    /// A message from the render surface
    Ui(Message),
    /// The change notifier saw the document change
    External,
    /// A prompt resolved (`None` = cancelled)
    PromptResolved {
        pending: PendingCreate,
        title: Option<String>,
    },
    /// Stop after the events already queued
    Shutdown,
}

/// Cloneable handle for feeding events into a running session
#[derive(Debug, Clone)]
pub struct SessionHandle {
    tx: mpsc::UnboundedSender<SessionEvent>,
}

impl SessionHandle {
    /// Queue a UI message. Returns false once the session has stopped.
    pub fn send(&self, message: Message) -> bool {
        self.tx.send(SessionEvent::Ui(message)).is_ok()
    }

    /// Report that the document changed on disk. The session re-reads it when
    /// the notification reaches the front of the queue.
    pub fn external_change(&self) -> bool {
        self.tx.send(SessionEvent::External).is_ok()
    }

    /// Ask the session to stop
    pub fn shutdown(&self) {
        let _ = self.tx.send(SessionEvent::Shutdown);
    }

    /// Whether the session has stopped
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Owns the dispatcher and drains the event queue
pub struct Session {
    dispatcher: Dispatcher,
    prompt: Arc<dyn Prompt>,
    rx: mpsc::UnboundedReceiver<SessionEvent>,
    /// Weak so that the queue closes once every external handle is gone and
    /// no prompt is outstanding
    tx: mpsc::WeakUnboundedSender<SessionEvent>,
    pending_prompts: usize,
}

impl Session {
    /// Create a session and the handle used to drive it
    pub fn new(dispatcher: Dispatcher, prompt: Arc<dyn Prompt>) -> (Self, SessionHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        let session = Self {
            dispatcher,
            prompt,
            rx,
            tx: tx.downgrade(),
            pending_prompts: 0,
        };
        (session, SessionHandle { tx })
    }

    /// Process events until shutdown or until every handle is dropped.
    /// Returns the dispatcher so callers can inspect the final board.
    pub async fn run(mut self) -> Dispatcher {
        info!("board session started");
        self.dispatcher.resync();

        while let Some(event) = self.rx.recv().await {
            match event {
                SessionEvent::Ui(message) => self.handle_message(message).await,
                SessionEvent::External => self.handle_external().await,
                SessionEvent::PromptResolved { pending, title } => {
                    self.pending_prompts = self.pending_prompts.saturating_sub(1);
                    let outcome = self.dispatcher.complete(pending, title).await;
                    report(&outcome);
                }
                SessionEvent::Shutdown => break,
            }
        }

        if self.pending_prompts > 0 {
            debug!(pending = self.pending_prompts, "abandoning open prompts");
        }
        info!("board session stopped");
        self.dispatcher
    }

    async fn handle_message(&mut self, message: Message) {
        match self.dispatcher.begin(message).await {
            Step::Done(outcome) => report(&outcome),
            Step::Prompt(pending) => self.spawn_prompt(pending),
        }
    }

    async fn handle_external(&mut self) {
        match self.dispatcher.external_change().await {
            SyncOutcome::Reloaded => {}
            SyncOutcome::Echo => debug!("ignored echo of our own write"),
            SyncOutcome::Rejected(e) => warn!(error = %e, "kept previous board"),
        }
    }

    fn spawn_prompt(&mut self, pending: PendingCreate) {
        let Some(tx) = self.tx.upgrade() else {
            return;
        };
        let prompt = Arc::clone(&self.prompt);
        self.pending_prompts += 1;

        tokio::spawn(async move {
            let title = prompt.prompt(&pending.request()).await;
            // Session may have shut down while the user was typing
            let _ = tx.send(SessionEvent::PromptResolved { pending, title });
        });
    }
}

fn report(outcome: &DispatchOutcome) {
    match outcome {
        DispatchOutcome::PersistFailed(e) => warn!(error = %e, "document write failed"),
        DispatchOutcome::Dropped(e) => debug!(error = %e, "message dropped"),
        DispatchOutcome::Cancelled => debug!("creation cancelled"),
        DispatchOutcome::Committed | DispatchOutcome::Unchanged | DispatchOutcome::Resynced => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{serialize, DocumentStore};
    use crate::host::{ChannelPrompt, RecordingSink, StaticPrompt};
    use crate::io::MemoryDocumentIo;
    use crate::types::{Board, Card, Column, Template};

    fn sample() -> Board {
        Board::new()
            .with_column(Column::new("a", "A").with_cards([Card::new("c1", "X")]))
            .with_column(Column::new("b", "B"))
    }

    async fn dispatcher() -> (Arc<MemoryDocumentIo>, Arc<RecordingSink>, Dispatcher) {
        let io = Arc::new(MemoryDocumentIo::with_content(serialize(&sample()).unwrap()));
        let sink = Arc::new(RecordingSink::new());
        let store = DocumentStore::open(io.clone(), Template::Empty).await.unwrap();
        let dispatcher = Dispatcher::new(store, sink.clone());
        (io, sink, dispatcher)
    }

    #[tokio::test]
    async fn test_session_sends_initial_snapshot_and_processes_in_order() {
        let (io, sink, dispatcher) = dispatcher().await;
        let (session, handle) = Session::new(dispatcher, Arc::new(StaticPrompt::cancel()));
        let running = tokio::spawn(session.run());

        handle.send(Message::RenameColumn {
            column_id: "b".into(),
            new_title: "Blocked".into(),
        });
        handle.send(Message::DeleteColumn {
            column_id: "a".into(),
        });
        drop(handle);

        let dispatcher = running.await.unwrap();
        let board = dispatcher.board();
        assert_eq!(board.columns.len(), 1);
        assert_eq!(board.columns[0].title, "Blocked");
        assert_eq!(io.write_count(), 2);
        // initial + one per non-drag mutation
        assert_eq!(sink.len(), 3);
    }

    #[tokio::test]
    async fn test_prompt_applies_against_board_at_resolution_time() {
        let (io, _sink, dispatcher) = dispatcher().await;
        let (prompt, mut requests) = ChannelPrompt::new();
        let (session, handle) = Session::new(dispatcher, Arc::new(prompt));
        let running = tokio::spawn(session.run());

        handle.send(Message::AddCard {
            column_id: "b".into(),
        });
        let pending = requests.recv().await.unwrap();

        // Edits made while the prompt is open must survive
        handle.send(Message::RenameColumn {
            column_id: "a".into(),
            new_title: "Inbox".into(),
        });
        handle.send(Message::MoveCard {
            from_column_id: "a".into(),
            to_column_id: "b".into(),
            card_id: "c1".into(),
            to_index: None,
        });

        pending.respond(Some("Late card".into()));
        // Shutdown queues behind the prompt answer only if we wait for it
        while io.write_count() < 3 {
            tokio::task::yield_now().await;
        }
        handle.shutdown();

        let dispatcher = running.await.unwrap();
        let board = dispatcher.board();
        assert_eq!(board.columns[0].title, "Inbox");
        let titles: Vec<_> = board.columns[1].cards.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, ["X", "Late card"]);
    }

    #[tokio::test]
    async fn test_prompt_for_deleted_column_is_dropped() {
        let (io, _sink, dispatcher) = dispatcher().await;
        let (prompt, mut requests) = ChannelPrompt::new();
        let (session, handle) = Session::new(dispatcher, Arc::new(prompt));
        let running = tokio::spawn(session.run());

        handle.send(Message::AddCard {
            column_id: "b".into(),
        });
        let pending = requests.recv().await.unwrap();
        handle.send(Message::DeleteColumn {
            column_id: "b".into(),
        });
        pending.respond(Some("Orphan".into()));
        drop(handle);

        let dispatcher = running.await.unwrap();
        assert_eq!(dispatcher.board().columns.len(), 1);
        assert_eq!(dispatcher.board().card_count(), 1);
        assert_eq!(io.write_count(), 1);
    }

    #[tokio::test]
    async fn test_external_change_overwrites_mirror() {
        let (io, sink, dispatcher) = dispatcher().await;
        let (session, handle) = Session::new(dispatcher, Arc::new(StaticPrompt::cancel()));
        let running = tokio::spawn(session.run());

        let edited = Board::new().with_column(Column::new("x", "Only"));
        io.replace_externally(serialize(&edited).unwrap());
        handle.external_change();
        drop(handle);

        let dispatcher = running.await.unwrap();
        assert_eq!(dispatcher.board(), &edited);
        assert_eq!(
            sink.messages().last(),
            Some(&crate::message::RenderMessage::snapshot(&edited))
        );
        assert_eq!(sink.len(), 2);
    }

    #[tokio::test]
    async fn test_notification_queued_between_own_writes_is_an_echo() {
        let (io, sink, dispatcher) = dispatcher().await;
        let (session, handle) = Session::new(dispatcher, Arc::new(StaticPrompt::cancel()));
        let running = tokio::spawn(session.run());

        handle.send(Message::RenameColumn {
            column_id: "a".into(),
            new_title: "Inbox".into(),
        });
        handle.external_change();
        handle.send(Message::DeleteColumn {
            column_id: "b".into(),
        });
        handle.external_change();
        drop(handle);

        let dispatcher = running.await.unwrap();
        assert_eq!(dispatcher.board().columns.len(), 1);
        assert_eq!(dispatcher.board().columns[0].title, "Inbox");
        assert_eq!(io.write_count(), 2);
        // initial + rename + delete, no reload snapshots
        assert_eq!(sink.len(), 3);
    }
}
