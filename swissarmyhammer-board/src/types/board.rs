//! Board-level types: Board, Column, Card
//!
//! Every mutator either applies completely or leaves the board exactly as it
//! was and returns a not-found error. Callers routinely hand in identifiers
//! from a render surface that hasn't seen the latest snapshot yet, so stale
//! ids are an expected input, not a bug.

use super::ids::{CardId, ColumnId};
use crate::error::{BoardError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Starting layout for a board whose document doesn't exist yet
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Template {
    /// Three columns: Intake, In Progress, Done
    #[default]
    Default,
    /// No columns at all
    Empty,
}

/// The board: an ordered list of columns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    pub columns: Vec<Column>,
}

/// A column defines a workflow stage. Card order is priority order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub id: ColumnId,
    pub title: String,
    #[serde(default)]
    pub cards: Vec<Card>,
}

/// A single work item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub id: CardId,
    pub title: String,
}

impl Column {
    /// Create an empty column
    pub fn new(id: impl Into<ColumnId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            cards: Vec::new(),
        }
    }

    /// Builder: append cards
    pub fn with_cards(mut self, cards: impl IntoIterator<Item = Card>) -> Self {
        self.cards.extend(cards);
        self
    }

    /// Position of a card within this column
    pub fn card_index(&self, id: &CardId) -> Option<usize> {
        self.cards.iter().position(|c| &c.id == id)
    }
}

impl Card {
    /// Create a card
    pub fn new(id: impl Into<CardId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
        }
    }
}

impl Board {
    /// Create an empty board
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a board laid out according to `template`
    pub fn from_template(template: Template) -> Self {
        match template {
            Template::Default => Self {
                columns: Self::default_columns(),
            },
            Template::Empty => Self::new(),
        }
    }

    /// Builder: append a column
    pub fn with_column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    /// The default columns for a new board
    pub fn default_columns() -> Vec<Column> {
        vec![
            Column::new("intake", "Intake"),
            Column::new("in-progress", "In Progress"),
            Column::new("done", "Done"),
        ]
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    /// Position of a column in board order
    pub fn column_index(&self, id: &ColumnId) -> Option<usize> {
        self.columns.iter().position(|c| &c.id == id)
    }

    /// Find a column by id
    pub fn find_column(&self, id: &ColumnId) -> Result<&Column> {
        self.columns
            .iter()
            .find(|c| &c.id == id)
            .ok_or_else(|| column_not_found(id))
    }

    fn find_column_mut(&mut self, id: &ColumnId) -> Result<&mut Column> {
        self.columns
            .iter_mut()
            .find(|c| &c.id == id)
            .ok_or_else(|| column_not_found(id))
    }

    /// Find a card inside a specific column
    pub fn find_card(&self, column_id: &ColumnId, card_id: &CardId) -> Result<&Card> {
        self.find_column(column_id)?
            .cards
            .iter()
            .find(|c| &c.id == card_id)
            .ok_or_else(|| card_not_found(card_id))
    }

    /// Total number of cards across every column
    pub fn card_count(&self) -> usize {
        self.columns.iter().map(|c| c.cards.len()).sum()
    }

    /// Whether any column carries this id
    pub fn contains_column(&self, id: &ColumnId) -> bool {
        self.column_index(id).is_some()
    }

    /// Whether any column holds a card with this id
    pub fn contains_card(&self, id: &CardId) -> bool {
        self.columns
            .iter()
            .any(|col| col.cards.iter().any(|c| &c.id == id))
    }

    // =========================================================================
    // Structural edits
    // =========================================================================

    /// Insert a column at `at` (clamped), or append when `at` is `None`
    pub fn insert_column(&mut self, column: Column, at: Option<usize>) -> Result<()> {
        if self.contains_column(&column.id) {
            return Err(BoardError::duplicate_id("column", column.id.to_string()));
        }
        if let Some(card) = column.cards.iter().find(|c| self.contains_card(&c.id)) {
            return Err(BoardError::duplicate_id("card", card.id.to_string()));
        }

        let index = clamp(at, self.columns.len());
        self.columns.insert(index, column);
        Ok(())
    }

    /// Remove a column together with all its cards
    pub fn remove_column(&mut self, id: &ColumnId) -> Result<Column> {
        let index = self.column_index(id).ok_or_else(|| column_not_found(id))?;
        Ok(self.columns.remove(index))
    }

    /// Insert a card into a column at `at` (clamped), or append when `at` is `None`
    pub fn insert_card(
        &mut self,
        column_id: &ColumnId,
        card: Card,
        at: Option<usize>,
    ) -> Result<()> {
        if self.contains_card(&card.id) {
            return Err(BoardError::duplicate_id("card", card.id.to_string()));
        }

        let column = self.find_column_mut(column_id)?;
        let index = clamp(at, column.cards.len());
        column.cards.insert(index, card);
        Ok(())
    }

    /// Remove a card from a column
    pub fn remove_card(&mut self, column_id: &ColumnId, card_id: &CardId) -> Result<Card> {
        let column = self.find_column_mut(column_id)?;
        let index = column
            .card_index(card_id)
            .ok_or_else(|| card_not_found(card_id))?;
        Ok(column.cards.remove(index))
    }

    /// Move a card within or across columns.
    ///
    /// The card is removed from its source first. For a same-column move where
    /// the removal index is below `to_index`, the destination shifts left by
    /// one so the card lands where the drop indicator was. `None` appends.
    pub fn move_card(
        &mut self,
        from_column_id: &ColumnId,
        to_column_id: &ColumnId,
        card_id: &CardId,
        to_index: Option<usize>,
    ) -> Result<()> {
        let from_index = self
            .find_column(from_column_id)?
            .card_index(card_id)
            .ok_or_else(|| card_not_found(card_id))?;
        // Resolve the destination before touching anything
        self.find_column(to_column_id)?;

        let card = self.find_column_mut(from_column_id)?.cards.remove(from_index);

        let to_index = match to_index {
            Some(index) if from_column_id == to_column_id && from_index < index => Some(index - 1),
            other => other,
        };

        let destination = self.find_column_mut(to_column_id)?;
        let index = clamp(to_index, destination.cards.len());
        destination.cards.insert(index, card);
        Ok(())
    }

    /// Move a column so that it occupies `to_index` (clamped) in board order
    pub fn move_column(&mut self, id: &ColumnId, to_index: usize) -> Result<()> {
        let from_index = self.column_index(id).ok_or_else(|| column_not_found(id))?;
        let column = self.columns.remove(from_index);
        let index = to_index.min(self.columns.len());
        self.columns.insert(index, column);
        Ok(())
    }

    /// Set a column's title
    pub fn rename_column(&mut self, id: &ColumnId, title: impl Into<String>) -> Result<()> {
        self.find_column_mut(id)?.title = title.into();
        Ok(())
    }

    /// Set a card's title
    pub fn rename_card(
        &mut self,
        column_id: &ColumnId,
        card_id: &CardId,
        title: impl Into<String>,
    ) -> Result<()> {
        let card = self
            .find_column_mut(column_id)?
            .cards
            .iter_mut()
            .find(|c| &c.id == card_id)
            .ok_or_else(|| card_not_found(card_id))?;
        card.title = title.into();
        Ok(())
    }

    // =========================================================================
    // Identity
    // =========================================================================

    /// Mint a column id for `title` that no existing column uses
    pub fn unique_column_id(&self, title: &str, at: DateTime<Utc>) -> ColumnId {
        let base = ColumnId::generate(title, at);
        unique(base, |id| self.contains_column(id), ColumnId::with_suffix)
    }

    /// Mint a card id for `title` that no existing card uses
    pub fn unique_card_id(&self, title: &str, at: DateTime<Utc>) -> CardId {
        let base = CardId::generate(title, at);
        unique(base, |id| self.contains_card(id), CardId::with_suffix)
    }

    /// Check the identity invariants: column ids unique, card ids unique
    pub fn validate(&self) -> Result<()> {
        let mut columns = HashSet::new();
        let mut cards = HashSet::new();

        for column in &self.columns {
            if !columns.insert(&column.id) {
                return Err(BoardError::duplicate_id("column", column.id.to_string()));
            }
            for card in &column.cards {
                if !cards.insert(&card.id) {
                    return Err(BoardError::duplicate_id("card", card.id.to_string()));
                }
            }
        }

        Ok(())
    }
}

fn clamp(at: Option<usize>, len: usize) -> usize {
    at.map_or(len, |i| i.min(len))
}

fn unique<T>(base: T, taken: impl Fn(&T) -> bool, suffixed: impl Fn(&T, usize) -> T) -> T {
    if !taken(&base) {
        return base;
    }
    let mut n = 2;
    let mut candidate = suffixed(&base, n);
    while taken(&candidate) {
        n += 1;
        candidate = suffixed(&base, n);
    }
    candidate
}

fn column_not_found(id: &ColumnId) -> BoardError {
    BoardError::ColumnNotFound { id: id.to_string() }
}

fn card_not_found(id: &CardId) -> BoardError {
    BoardError::CardNotFound { id: id.to_string() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ids(column: &Column) -> Vec<&str> {
        column.cards.iter().map(|c| c.id.as_str()).collect()
    }

    fn sample() -> Board {
        Board::new()
            .with_column(Column::new("a", "A").with_cards([
                Card::new("c1", "X"),
                Card::new("c2", "Y"),
                Card::new("c3", "Z"),
            ]))
            .with_column(Column::new("b", "B"))
    }

    #[test]
    fn test_default_template() {
        let board = Board::from_template(Template::Default);
        let titles: Vec<_> = board.columns.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, ["Intake", "In Progress", "Done"]);
        assert_eq!(board.columns[1].id, "in-progress");
        assert!(Board::from_template(Template::Empty).columns.is_empty());
    }

    #[test]
    fn test_find_card() {
        let board = sample();
        assert_eq!(board.find_card(&"a".into(), &"c2".into()).unwrap().title, "Y");
        assert!(matches!(
            board.find_card(&"b".into(), &"c2".into()),
            Err(BoardError::CardNotFound { .. })
        ));
        assert!(matches!(
            board.find_card(&"zzz".into(), &"c2".into()),
            Err(BoardError::ColumnNotFound { .. })
        ));
    }

    #[test]
    fn test_move_card_same_column_forward_shifts_left() {
        let mut board = sample();
        board
            .move_card(&"a".into(), &"a".into(), &"c1".into(), Some(2))
            .unwrap();
        assert_eq!(ids(&board.columns[0]), ["c2", "c1", "c3"]);
    }

    #[test]
    fn test_move_card_same_column_backward() {
        let mut board = sample();
        board
            .move_card(&"a".into(), &"a".into(), &"c3".into(), Some(0))
            .unwrap();
        assert_eq!(ids(&board.columns[0]), ["c3", "c1", "c2"]);
    }

    #[test]
    fn test_move_card_across_columns() {
        let mut board = sample();
        board
            .move_card(&"a".into(), &"b".into(), &"c2".into(), Some(0))
            .unwrap();
        assert_eq!(ids(&board.columns[0]), ["c1", "c3"]);
        assert_eq!(ids(&board.columns[1]), ["c2"]);
    }

    #[test]
    fn test_move_card_without_index_appends() {
        let mut board = sample();
        board
            .move_card(&"a".into(), &"a".into(), &"c1".into(), None)
            .unwrap();
        assert_eq!(ids(&board.columns[0]), ["c2", "c3", "c1"]);
    }

    #[test]
    fn test_move_card_index_past_end_clamps() {
        let mut board = sample();
        board
            .move_card(&"a".into(), &"b".into(), &"c1".into(), Some(99))
            .unwrap();
        assert_eq!(ids(&board.columns[1]), ["c1"]);
    }

    #[test]
    fn test_move_card_stale_ids_leave_board_untouched() {
        let mut board = sample();
        let before = board.clone();

        let missing_card = board.move_card(&"a".into(), &"b".into(), &"gone".into(), Some(0));
        assert!(matches!(missing_card, Err(BoardError::CardNotFound { .. })));

        let missing_target = board.move_card(&"a".into(), &"gone".into(), &"c1".into(), Some(0));
        assert!(matches!(missing_target, Err(BoardError::ColumnNotFound { .. })));

        assert_eq!(board, before);
    }

    #[test]
    fn test_move_column() {
        let mut board = sample().with_column(Column::new("c", "C"));
        board.move_column(&"a".into(), 2).unwrap();
        let order: Vec<_> = board.columns.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(order, ["b", "c", "a"]);

        board.move_column(&"a".into(), 0).unwrap();
        let order: Vec<_> = board.columns.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(order, ["a", "b", "c"]);
    }

    #[test]
    fn test_insert_rejects_duplicates() {
        let mut board = sample();
        let dup_column = board.insert_column(Column::new("a", "Again"), None);
        assert!(matches!(dup_column, Err(BoardError::DuplicateId { .. })));

        let dup_card = board.insert_card(&"b".into(), Card::new("c1", "Copy"), None);
        assert!(matches!(dup_card, Err(BoardError::DuplicateId { .. })));
        assert!(board.columns[1].cards.is_empty());
    }

    #[test]
    fn test_remove_column_drops_its_cards() {
        let mut board = sample();
        let removed = board.remove_column(&"a".into()).unwrap();
        assert_eq!(removed.cards.len(), 3);
        assert_eq!(board.card_count(), 0);
        assert_eq!(board.columns.len(), 1);
    }

    #[test]
    fn test_unique_ids_get_suffixes_on_collision() {
        let at = Utc.timestamp_millis_opt(1000).unwrap();
        let mut board = Board::new();
        let first = board.unique_column_id("Review", at);
        board.insert_column(Column::new(first.clone(), "Review"), None).unwrap();

        let second = board.unique_column_id("Review", at);
        assert_eq!(first, "review-1000");
        assert_eq!(second, "review-1000-2");
    }

    #[test]
    fn test_validate_catches_duplicate_card_ids() {
        let board = Board::new()
            .with_column(Column::new("a", "A").with_cards([Card::new("x", "1")]))
            .with_column(Column::new("b", "B").with_cards([Card::new("x", "2")]));
        assert!(matches!(
            board.validate(),
            Err(BoardError::DuplicateId { .. })
        ));
        assert!(sample().validate().is_ok());
    }
}
