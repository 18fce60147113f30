//! Render mirror - the surface's copy of the board
//!
//! The mirror is never authoritative. It applies drag results optimistically
//! so the surface doesn't wait on disk, and it is overwritten wholesale by
//! every snapshot the engine sends.

use crate::dispatch::{reduce, Reduction};
use crate::message::{Message, RenderMessage};
use crate::reorder::DragContext;
use crate::types::Board;
use tracing::debug;

/// Surface-side copy of the board
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderMirror {
    board: Board,
}

impl RenderMirror {
    pub fn new() -> Self {
        Self::default()
    }

    /// The board as the surface currently shows it
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Apply a message from the engine. Snapshots always replace everything.
    pub fn receive(&mut self, message: RenderMessage) {
        match message {
            RenderMessage::Data { data } => self.board = data,
        }
    }

    /// Finish a drag gesture: update the local copy right away and return the
    /// message to send to the engine.
    pub fn finish_drag(&mut self, drag: DragContext) -> Option<Message> {
        let message = drag.drop()?;
        self.apply_optimistic(&message);
        Some(message)
    }

    /// Apply a drag commit locally ahead of the engine. Anything the local
    /// copy rejects is still sent; the engine decides.
    pub fn apply_optimistic(&mut self, message: &Message) {
        if !message.is_drag() {
            return;
        }
        match reduce(&self.board, message) {
            Ok(Reduction::Changed(next)) => self.board = next,
            Ok(_) => {}
            Err(e) => debug!(op = message.op(), error = %e, "optimistic apply skipped"),
        }
    }

    /// Build a bulk `update` carrying the whole local board
    pub fn commit_all(&self) -> Message {
        Message::Update {
            data: self.board.clone(),
        }
    }
}
