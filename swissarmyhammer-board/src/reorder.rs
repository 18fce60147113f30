//! Reorder engine: drop-index math and the per-gesture drag context.
//!
//! There are two kinds of move and they don't share logic. A column move
//! resolves straight to the dropped-on column's current slot. A card move is
//! driven by where the pointer was released relative to the other cards in
//! the target column; the resulting index travels in a `move-card` message
//! and is the only position information the board ever sees.

use crate::error::{BoardError, Result};
use crate::message::Message;
use crate::types::{Board, CardId, ColumnId};

/// Vertical extent of a rendered card, in surface coordinates
#[derive(Debug, Clone, PartialEq)]
pub struct CardBounds {
    pub id: CardId,
    pub top: f64,
    pub height: f64,
}

impl CardBounds {
    pub fn new(id: impl Into<CardId>, top: f64, height: f64) -> Self {
        Self {
            id: id.into(),
            top,
            height,
        }
    }

    /// Vertical midpoint
    pub fn center(&self) -> f64 {
        self.top + self.height / 2.0
    }
}

/// Index in the target column's card sequence at which a dropped card goes.
///
/// `siblings` are the target column's cards in display order. The card being
/// dragged (if it lives in this column) is skipped. The result is the
/// sequence position of the first remaining card whose center lies below
/// `drop_y`, or the sequence length if there is none. It is expressed before
/// the dragged card is removed, which is what [`Board::move_card`] expects.
pub fn card_drop_index(siblings: &[CardBounds], dragged: Option<&CardId>, drop_y: f64) -> usize {
    siblings
        .iter()
        .enumerate()
        .filter(|(_, bounds)| Some(&bounds.id) != dragged)
        .find(|(_, bounds)| bounds.center() > drop_y)
        .map_or(siblings.len(), |(index, _)| index)
}

/// Slot a column lands in when dropped onto `to_id`.
///
/// `Ok(None)` means the drop is onto itself and nothing should move.
pub fn resolve_column_move(
    board: &Board,
    from_id: &ColumnId,
    to_id: &ColumnId,
) -> Result<Option<usize>> {
    if board.column_index(from_id).is_none() {
        return Err(BoardError::ColumnNotFound {
            id: from_id.to_string(),
        });
    }
    let to_index = board.column_index(to_id).ok_or_else(|| BoardError::ColumnNotFound {
        id: to_id.to_string(),
    })?;

    if from_id == to_id {
        return Ok(None);
    }
    Ok(Some(to_index))
}

/// What is being dragged
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragSource {
    Card { column_id: ColumnId, card_id: CardId },
    Column { column_id: ColumnId },
}

/// Where the gesture is currently hovering
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropTarget {
    /// A slot inside a column's card list
    CardSlot { column_id: ColumnId, index: usize },
    /// Another column (for column drags)
    Column { column_id: ColumnId },
}

/// Interaction state for exactly one drag gesture.
///
/// Created on drag-start, updated on every drag-over, consumed on drop. A
/// gesture that is abandoned is simply dropped; there is nothing global to
/// reset.
#[derive(Debug, Clone, PartialEq)]
pub struct DragContext {
    source: DragSource,
    target: Option<DropTarget>,
}

impl DragContext {
    /// Start dragging a card out of `column_id`
    pub fn card(column_id: impl Into<ColumnId>, card_id: impl Into<CardId>) -> Self {
        Self {
            source: DragSource::Card {
                column_id: column_id.into(),
                card_id: card_id.into(),
            },
            target: None,
        }
    }

    /// Start dragging a whole column
    pub fn column(column_id: impl Into<ColumnId>) -> Self {
        Self {
            source: DragSource::Column {
                column_id: column_id.into(),
            },
            target: None,
        }
    }

    pub fn source(&self) -> &DragSource {
        &self.source
    }

    pub fn target(&self) -> Option<&DropTarget> {
        self.target.as_ref()
    }

    /// Pointer is over `column_id`'s card list at `drop_y`.
    ///
    /// Returns the insertion index for drawing the drop indicator. Ignored
    /// (returns `None`) when a column is being dragged.
    pub fn over_cards(
        &mut self,
        column_id: &ColumnId,
        siblings: &[CardBounds],
        drop_y: f64,
    ) -> Option<usize> {
        let DragSource::Card { card_id, .. } = &self.source else {
            return None;
        };
        let index = card_drop_index(siblings, Some(card_id), drop_y);
        self.target = Some(DropTarget::CardSlot {
            column_id: column_id.clone(),
            index,
        });
        Some(index)
    }

    /// Pointer is over another column's header. Only meaningful for column drags.
    pub fn over_column(&mut self, column_id: &ColumnId) -> bool {
        if !matches!(self.source, DragSource::Column { .. }) {
            return false;
        }
        self.target = Some(DropTarget::Column {
            column_id: column_id.clone(),
        });
        true
    }

    /// Finish the gesture, producing the message to send (if any)
    pub fn drop(self) -> Option<Message> {
        match (self.source, self.target?) {
            (
                DragSource::Card { column_id, card_id },
                DropTarget::CardSlot {
                    column_id: to,
                    index,
                },
            ) => Some(Message::MoveCard {
                from_column_id: column_id,
                to_column_id: to,
                card_id,
                to_index: Some(index),
            }),
            (DragSource::Column { column_id }, DropTarget::Column { column_id: to }) => {
                if column_id == to {
                    None
                } else {
                    Some(Message::MoveColumn {
                        from_id: column_id,
                        to_id: to,
                    })
                }
            }
            _ => None,
        }
    }
}
