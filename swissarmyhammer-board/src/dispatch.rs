//! Mutation dispatcher
//!
//! [`reduce`] is the pure half: given a board and a message it returns the
//! next board, or says why it can't. [`Dispatcher`] is the effectful half: it
//! runs the reducer against the canonical board, persists through the
//! [`DocumentStore`], and pushes snapshots to the render sink.
//!
//! Messages that need a title from the user (`add-column`, `add-card`) come
//! out of the reducer as [`Reduction::NeedsTitle`]. The creation is finished
//! later by [`complete_create`], against whatever the board looks like by then.

use crate::document::DocumentStore;
use crate::error::{BoardError, Result};
use crate::host::{Prompt, PromptRequest, RenderSink};
use crate::message::{Message, RenderMessage};
use crate::reorder::resolve_column_move;
use crate::types::{Board, Card, Column, ColumnId};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A creation waiting for its title
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingCreate {
    Column,
    Card { column_id: ColumnId },
}

impl PendingCreate {
    /// What to ask the user
    pub fn request(&self) -> PromptRequest {
        match self {
            Self::Column => PromptRequest::new("Column title", "New column"),
            Self::Card { .. } => PromptRequest::new("Card title", "New card"),
        }
    }
}

/// Result of reducing one message
#[derive(Debug, Clone, PartialEq)]
pub enum Reduction {
    /// The board changed
    Changed(Board),
    /// Valid, but there is nothing to do
    Unchanged,
    /// The surface asked for a fresh snapshot
    Snapshot,
    /// A title has to be obtained before anything can happen
    NeedsTitle(PendingCreate),
}

/// Apply `message` to `board` without side effects
pub fn reduce(board: &Board, message: &Message) -> Result<Reduction> {
    match message {
        Message::Update { data } => {
            data.validate()?;
            if data == board {
                return Ok(Reduction::Unchanged);
            }
            Ok(Reduction::Changed(data.clone()))
        }
        Message::AddColumn => Ok(Reduction::NeedsTitle(PendingCreate::Column)),
        Message::AddCard { column_id } => {
            board.find_column(column_id)?;
            Ok(Reduction::NeedsTitle(PendingCreate::Card {
                column_id: column_id.clone(),
            }))
        }
        Message::RenameColumn {
            column_id,
            new_title,
        } => {
            let title = nonblank("newTitle", new_title)?;
            if board.find_column(column_id)?.title == title {
                return Ok(Reduction::Unchanged);
            }
            edit(board, |next| next.rename_column(column_id, title))
        }
        Message::RenameCard {
            column_id,
            card_id,
            new_title,
        } => {
            let title = nonblank("newTitle", new_title)?;
            if board.find_card(column_id, card_id)?.title == title {
                return Ok(Reduction::Unchanged);
            }
            edit(board, |next| next.rename_card(column_id, card_id, title))
        }
        Message::DeleteColumn { column_id } => {
            edit(board, |next| next.remove_column(column_id).map(drop))
        }
        Message::DeleteCard { column_id, card_id } => {
            edit(board, |next| next.remove_card(column_id, card_id).map(drop))
        }
        Message::MoveColumn { from_id, to_id } => {
            match resolve_column_move(board, from_id, to_id)? {
                Some(to_index) => edit(board, |next| next.move_column(from_id, to_index)),
                None => Ok(Reduction::Unchanged),
            }
        }
        Message::MoveCard {
            from_column_id,
            to_column_id,
            card_id,
            to_index,
        } => {
            let reduction = edit(board, |next| {
                next.move_card(from_column_id, to_column_id, card_id, *to_index)
            })?;
            match reduction {
                Reduction::Changed(next) if &next == board => Ok(Reduction::Unchanged),
                other => Ok(other),
            }
        }
        Message::Ready => Ok(Reduction::Snapshot),
    }
}

/// Finish a creation once the user has supplied `title`.
///
/// Runs against the board as it is now, not as it was when the prompt went
/// up; a card whose column vanished in the meantime is a `ColumnNotFound`.
pub fn complete_create(
    board: &Board,
    pending: &PendingCreate,
    title: &str,
    at: DateTime<Utc>,
) -> Result<Board> {
    let title = nonblank("title", title)?;
    let mut next = board.clone();

    match pending {
        PendingCreate::Column => {
            let id = next.unique_column_id(title, at);
            next.insert_column(Column::new(id, title), None)?;
        }
        PendingCreate::Card { column_id } => {
            let id = next.unique_card_id(title, at);
            next.insert_card(column_id, Card::new(id, title), None)?;
        }
    }

    Ok(next)
}

fn edit(board: &Board, f: impl FnOnce(&mut Board) -> Result<()>) -> Result<Reduction> {
    let mut next = board.clone();
    f(&mut next)?;
    Ok(Reduction::Changed(next))
}

fn nonblank<'a>(field: &str, value: &'a str) -> Result<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(BoardError::invalid_value(field, "must not be blank"));
    }
    Ok(trimmed)
}

/// How a dispatched message ended
#[derive(Debug)]
pub enum DispatchOutcome {
    /// Applied and written to the document
    Committed,
    /// Applied in memory, but the write failed; not retried
    PersistFailed(BoardError),
    /// Valid but had no effect
    Unchanged,
    /// A snapshot was sent on request
    Resynced,
    /// Rejected during validation and dropped
    Dropped(BoardError),
    /// The user declined to provide a title
    Cancelled,
}

/// First step of dispatching a message
#[derive(Debug)]
pub enum Step {
    /// Fully handled
    Done(DispatchOutcome),
    /// Waiting for a title; finish with [`Dispatcher::complete`]
    Prompt(PendingCreate),
}

/// How an external document change was handled
#[derive(Debug)]
pub enum SyncOutcome {
    /// Reloaded and a snapshot was sent
    Reloaded,
    /// The text was our own last write
    Echo,
    /// Unparseable; the previous board is still in place
    Rejected(BoardError),
}

/// Routes messages through the reducer into the document store
pub struct Dispatcher {
    store: DocumentStore,
    sink: Arc<dyn RenderSink>,
}

impl Dispatcher {
    pub fn new(store: DocumentStore, sink: Arc<dyn RenderSink>) -> Self {
        Self { store, sink }
    }

    /// The canonical board
    pub fn board(&self) -> &Board {
        self.store.board()
    }

    pub fn store(&self) -> &DocumentStore {
        &self.store
    }

    /// Push the current board to the render surface
    pub fn resync(&self) {
        self.sink.send(RenderMessage::snapshot(self.store.board()));
    }

    /// Handle a message end to end, awaiting `prompt` inline when a title is needed
    pub async fn dispatch(&mut self, message: Message, prompt: &dyn Prompt) -> DispatchOutcome {
        match self.begin(message).await {
            Step::Done(outcome) => outcome,
            Step::Prompt(pending) => {
                let title = prompt.prompt(&pending.request()).await;
                self.complete(pending, title).await
            }
        }
    }

    /// Handle everything about a message that doesn't need user input
    pub async fn begin(&mut self, message: Message) -> Step {
        let op = message.op();
        let drag = message.is_drag();

        let reduction = match reduce(self.store.board(), &message) {
            Ok(reduction) => reduction,
            Err(e) => return Step::Done(self.drop_message(op, e)),
        };

        match reduction {
            Reduction::Changed(next) => Step::Done(self.commit(op, next, !drag).await),
            Reduction::Unchanged => {
                debug!(op, "message had no effect");
                Step::Done(DispatchOutcome::Unchanged)
            }
            Reduction::Snapshot => {
                self.resync();
                Step::Done(DispatchOutcome::Resynced)
            }
            Reduction::NeedsTitle(pending) => {
                debug!(op, "waiting for title");
                Step::Prompt(pending)
            }
        }
    }

    /// Finish a creation after the prompt resolved
    pub async fn complete(
        &mut self,
        pending: PendingCreate,
        title: Option<String>,
    ) -> DispatchOutcome {
        let op = match pending {
            PendingCreate::Column => "add-column",
            PendingCreate::Card { .. } => "add-card",
        };

        let Some(title) = title.filter(|t| !t.trim().is_empty()) else {
            debug!(op, error = %BoardError::PromptCancelled, "creation abandoned");
            return DispatchOutcome::Cancelled;
        };

        match complete_create(self.store.board(), &pending, &title, Utc::now()) {
            Ok(next) => self.commit(op, next, true).await,
            Err(e) => self.drop_message(op, e),
        }
    }

    /// The document changed outside the engine; its current text wins
    pub async fn external_change(&mut self) -> SyncOutcome {
        match self.store.reload_external().await {
            Ok(Some(_)) => {
                info!("board document changed externally, resyncing");
                self.resync();
                SyncOutcome::Reloaded
            }
            Ok(None) => SyncOutcome::Echo,
            Err(e) => SyncOutcome::Rejected(e),
        }
    }

    async fn commit(&mut self, op: &'static str, next: Board, resync: bool) -> DispatchOutcome {
        let result = self.store.apply_and_persist(move |_| Ok(next)).await;
        let outcome = match result {
            Ok(_) => {
                info!(op, "committed");
                DispatchOutcome::Committed
            }
            Err(e @ BoardError::PersistFailure { .. }) => {
                warn!(op, error = %e, "mutation kept in memory but not persisted");
                DispatchOutcome::PersistFailed(e)
            }
            Err(e) => return self.drop_message(op, e),
        };

        // Snapshot comes from the board just computed, so generated ids reach
        // the surface without waiting for the change notification
        if resync {
            self.resync();
        }
        outcome
    }

    fn drop_message(&self, op: &'static str, error: BoardError) -> DispatchOutcome {
        if error.is_validation() {
            // Stale or invalid input from the surface
            debug!(op, stale = error.is_not_found(), error = %error, "dropping message");
        } else {
            warn!(op, error = %error, "dropping message");
        }
        DispatchOutcome::Dropped(error)
    }
}
