//! Wire messages between the render surface and the engine
//!
//! Both directions are JSON objects tagged by `type`. Inbound messages use
//! kebab-case tags and camelCase fields; the only outbound message is a full
//! board snapshot.

use crate::types::{Board, CardId, ColumnId};
use serde::{Deserialize, Serialize};

/// A request from the render surface
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Message {
    /// Replace the whole board (bulk reorder commit)
    Update { data: Board },
    /// Prompt for a title and append a new column
    AddColumn,
    /// Prompt for a title and append a new card to a column
    #[serde(rename_all = "camelCase")]
    AddCard { column_id: ColumnId },
    /// Set a column's title
    #[serde(rename_all = "camelCase")]
    RenameColumn { column_id: ColumnId, new_title: String },
    /// Set a card's title
    #[serde(rename_all = "camelCase")]
    RenameCard {
        column_id: ColumnId,
        card_id: CardId,
        new_title: String,
    },
    /// Remove a column and every card in it
    #[serde(rename_all = "camelCase")]
    DeleteColumn { column_id: ColumnId },
    /// Remove a card
    #[serde(rename_all = "camelCase")]
    DeleteCard { column_id: ColumnId, card_id: CardId },
    /// Reposition a column into another column's slot
    #[serde(rename_all = "camelCase")]
    MoveColumn { from_id: ColumnId, to_id: ColumnId },
    /// Move a card to an explicit index in a (possibly different) column
    #[serde(rename_all = "camelCase")]
    MoveCard {
        from_column_id: ColumnId,
        to_column_id: ColumnId,
        card_id: CardId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        to_index: Option<usize>,
    },
    /// The surface (re)attached and wants a snapshot
    Ready,
}

impl Message {
    /// Canonical op string for logging (e.g. "move-card")
    pub fn op(&self) -> &'static str {
        match self {
            Self::Update { .. } => "update",
            Self::AddColumn => "add-column",
            Self::AddCard { .. } => "add-card",
            Self::RenameColumn { .. } => "rename-column",
            Self::RenameCard { .. } => "rename-card",
            Self::DeleteColumn { .. } => "delete-column",
            Self::DeleteCard { .. } => "delete-card",
            Self::MoveColumn { .. } => "move-column",
            Self::MoveCard { .. } => "move-card",
            Self::Ready => "ready",
        }
    }

    /// Drag commits: the surface already shows the result optimistically, so
    /// they don't need a snapshot echoed back
    pub fn is_drag(&self) -> bool {
        matches!(
            self,
            Self::Update { .. } | Self::MoveColumn { .. } | Self::MoveCard { .. }
        )
    }
}

/// A message from the engine to the render surface
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum RenderMessage {
    /// Full board snapshot, never a diff
    Data { data: Board },
}

impl RenderMessage {
    /// Snapshot of `board`
    pub fn snapshot(board: &Board) -> Self {
        Self::Data {
            data: board.clone(),
        }
    }
}
