//! DocumentStore - owner of the canonical board
//!
//! The store holds the one authoritative [`Board`] and the collaborator that
//! reads and writes its serialized form. It is the only writer of the
//! document. Parsing never clobbers good state: malformed text is reported and
//! the previously held board stays in place.

use crate::error::{BoardError, Result};
use crate::io::DocumentIo;
use crate::types::{Board, Template};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Serialize a board the way it is written to disk: two-space pretty JSON in
/// field declaration order, terminated by a newline.
pub fn serialize(board: &Board) -> Result<String> {
    let mut text = serde_json::to_string_pretty(board)?;
    text.push('\n');
    Ok(text)
}

/// Parse document text into a board, enforcing identity invariants
pub fn parse(raw: &str) -> Result<Board> {
    let board: Board = serde_json::from_str(raw).map_err(|e| BoardError::parse(e.to_string()))?;
    board
        .validate()
        .map_err(|e| BoardError::parse(e.to_string()))?;
    Ok(board)
}

/// Owns the canonical board and persists every committed mutation
pub struct DocumentStore {
    io: Arc<dyn DocumentIo>,
    board: Board,
    /// Text of the most recent successful write, used to recognise our own
    /// writes coming back as change notifications
    last_written: Option<String>,
    /// Set when the in-memory board is ahead of the document
    dirty: bool,
}

impl DocumentStore {
    /// Create a store holding an empty board. Nothing is read or written.
    pub fn new(io: Arc<dyn DocumentIo>) -> Self {
        Self {
            io,
            board: Board::new(),
            last_written: None,
            dirty: false,
        }
    }

    /// Open the document, creating it from `template` when it doesn't exist.
    ///
    /// A document that exists but can't be parsed is an error here: there is
    /// no previous board to fall back on, and continuing with an empty one
    /// would overwrite the user's file on the first mutation.
    pub async fn open(io: Arc<dyn DocumentIo>, template: Template) -> Result<Self> {
        let mut store = Self::new(io);

        if store.io.exists().await {
            let raw = store.io.read().await?;
            store.load(&raw)?;
            info!(columns = store.board.columns.len(), "opened board document");
        } else {
            let board = Board::from_template(template);
            let text = serialize(&board)?;
            store.io.write(&text).await?;
            store.board = board;
            store.last_written = Some(text);
            info!(?template, "created board document");
        }

        Ok(store)
    }

    /// The current canonical board
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Whether the last attempted persist failed and the document lags behind
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Replace the held board with the parsed content of `raw`.
    ///
    /// On malformed input the previous board is kept and a
    /// [`BoardError::Parse`] is returned.
    pub fn load(&mut self, raw: &str) -> Result<&Board> {
        match parse(raw) {
            Ok(board) => {
                self.board = board;
                self.dirty = false;
                Ok(&self.board)
            }
            Err(e) => {
                warn!(error = %e, "ignoring unparseable board document");
                Err(e)
            }
        }
    }

    /// Handle a change notification for the document.
    ///
    /// The document is read now, when the notification is processed, rather
    /// than when the notifier fired. Text read earlier can be one of this
    /// store's own superseded writes, and reloading it would roll back later
    /// commits. Returns `Ok(None)` when the current text is exactly what this
    /// store last wrote.
    pub async fn reload_external(&mut self) -> Result<Option<&Board>> {
        let raw = self.io.read().await?;
        self.accept_external(&raw)
    }

    fn accept_external(&mut self, raw: &str) -> Result<Option<&Board>> {
        if self.last_written.as_deref() == Some(raw) {
            debug!("change notification matches our last write, skipping reload");
            return Ok(None);
        }
        self.last_written = None;
        self.load(raw).map(Some)
    }

    /// Compute the next board from the current one and write it out.
    ///
    /// If `mutation` fails the board is untouched and nothing is written. If
    /// the write fails the new board is kept in memory, the store is flagged
    /// dirty, and [`BoardError::PersistFailure`] is returned; the next
    /// successful persist carries the whole board, so no retry happens here.
    pub async fn apply_and_persist<F>(&mut self, mutation: F) -> Result<&Board>
    where
        F: FnOnce(&Board) -> Result<Board>,
    {
        let next = mutation(&self.board)?;
        let text = serialize(&next)?;

        self.board = next;
        self.dirty = true;

        match self.io.write(&text).await {
            Ok(()) => {
                self.dirty = false;
                self.last_written = Some(text);
                info!(
                    columns = self.board.columns.len(),
                    cards = self.board.card_count(),
                    "persisted board document"
                );
                Ok(&self.board)
            }
            Err(e) => {
                warn!(error = %e, "failed to persist board document");
                Err(BoardError::persist(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::MemoryDocumentIo;
    use crate::types::{Card, Column};

    fn sample() -> Board {
        Board::new()
            .with_column(Column::new("a", "A").with_cards([Card::new("c1", "X")]))
            .with_column(Column::new("b", "B"))
    }

    #[test]
    fn test_serialize_format() {
        let text = serialize(&Board::new().with_column(Column::new("a", "A"))).unwrap();
        let expected = concat!(
            "{\n",
            "  \"columns\": [\n",
            "    {\n",
            "      \"id\": \"a\",\n",
            "      \"title\": \"A\",\n",
            "      \"cards\": []\n",
            "    }\n",
            "  ]\n",
            "}\n",
        );
        assert_eq!(text, expected);
    }

    #[test]
    fn test_serialize_is_idempotent() {
        let board = sample();
        let text = serialize(&board).unwrap();
        let reparsed = parse(&text).unwrap();
        assert_eq!(reparsed, board);
        assert_eq!(serialize(&reparsed).unwrap(), text);
    }

    #[test]
    fn test_parse_tolerates_missing_cards() {
        let board = parse(r#"{"columns":[{"id":"a","title":"A"}]}"#).unwrap();
        assert!(board.columns[0].cards.is_empty());
    }

    #[test]
    fn test_parse_rejects_duplicate_columns() {
        let raw = r#"{"columns":[{"id":"a","title":"A"},{"id":"a","title":"B"}]}"#;
        assert!(matches!(parse(raw), Err(BoardError::Parse { .. })));
    }

    #[test]
    fn test_load_keeps_previous_board_on_parse_error() {
        let mut store = DocumentStore::new(Arc::new(MemoryDocumentIo::new()));
        store.load(&serialize(&sample()).unwrap()).unwrap();

        let result = store.load("{ \"columns\": [ oops");
        assert!(matches!(result, Err(BoardError::Parse { .. })));
        assert_eq!(store.board(), &sample());
    }

    #[tokio::test]
    async fn test_open_creates_from_template() {
        let io = Arc::new(MemoryDocumentIo::new());
        let store = DocumentStore::open(io.clone(), Template::Default).await.unwrap();

        assert_eq!(store.board().columns.len(), 3);
        assert_eq!(io.write_count(), 1);
        assert_eq!(parse(&io.content().unwrap()).unwrap(), *store.board());
    }

    #[tokio::test]
    async fn test_open_existing_document() {
        let io = Arc::new(MemoryDocumentIo::with_content(serialize(&sample()).unwrap()));
        let store = DocumentStore::open(io.clone(), Template::Default).await.unwrap();
        assert_eq!(store.board(), &sample());
        assert_eq!(io.write_count(), 0);
    }

    #[tokio::test]
    async fn test_open_corrupt_document_fails() {
        let io = Arc::new(MemoryDocumentIo::with_content("not json"));
        let result = DocumentStore::open(io, Template::Empty).await;
        assert!(matches!(result, Err(BoardError::Parse { .. })));
    }

    #[tokio::test]
    async fn test_apply_and_persist_writes_document() {
        let io = Arc::new(MemoryDocumentIo::with_content(serialize(&sample()).unwrap()));
        let mut store = DocumentStore::open(io.clone(), Template::Empty).await.unwrap();

        store
            .apply_and_persist(|board| {
                let mut next = board.clone();
                next.rename_column(&"b".into(), "Blocked")?;
                Ok(next)
            })
            .await
            .unwrap();

        let on_disk = parse(&io.content().unwrap()).unwrap();
        assert_eq!(on_disk.columns[1].title, "Blocked");
        assert!(!store.is_dirty());
    }

    #[tokio::test]
    async fn test_failed_mutation_writes_nothing() {
        let io = Arc::new(MemoryDocumentIo::with_content(serialize(&sample()).unwrap()));
        let mut store = DocumentStore::open(io.clone(), Template::Empty).await.unwrap();

        let result = store
            .apply_and_persist(|board| {
                let mut next = board.clone();
                next.remove_column(&"missing".into())?;
                Ok(next)
            })
            .await;

        assert!(matches!(result, Err(BoardError::ColumnNotFound { .. })));
        assert_eq!(io.write_count(), 0);
        assert_eq!(store.board(), &sample());
    }

    #[tokio::test]
    async fn test_persist_failure_keeps_mutated_board() {
        let io = Arc::new(MemoryDocumentIo::with_content(serialize(&sample()).unwrap()));
        let mut store = DocumentStore::open(io.clone(), Template::Empty).await.unwrap();
        io.set_fail_writes(true);

        let result = store
            .apply_and_persist(|board| {
                let mut next = board.clone();
                next.remove_column(&"b".into())?;
                Ok(next)
            })
            .await;

        assert!(matches!(result, Err(BoardError::PersistFailure { .. })));
        assert!(store.is_dirty());
        assert_eq!(store.board().columns.len(), 1);
        assert_eq!(parse(&io.content().unwrap()).unwrap(), sample());
    }

    #[tokio::test]
    async fn test_accept_external_skips_own_write() {
        let io = Arc::new(MemoryDocumentIo::new());
        let mut store = DocumentStore::open(io.clone(), Template::Default).await.unwrap();
        let own = io.content().unwrap();

        assert!(store.accept_external(&own).unwrap().is_none());

        let edited = serialize(&sample()).unwrap();
        let board = store.accept_external(&edited).unwrap().unwrap();
        assert_eq!(board, &sample());
    }

    #[tokio::test]
    async fn test_reload_external_reads_current_text() {
        let io = Arc::new(MemoryDocumentIo::new());
        let mut store = DocumentStore::open(io.clone(), Template::Default).await.unwrap();
        let first = io.content().unwrap();

        store
            .apply_and_persist(|board| {
                let mut next = board.clone();
                next.remove_column(&"done".into())?;
                Ok(next)
            })
            .await
            .unwrap();

        // A notification fired for `first` is handled after the second write
        assert_ne!(io.content().unwrap(), first);
        assert!(store.reload_external().await.unwrap().is_none());
        assert_eq!(store.board().columns.len(), 2);

        io.replace_externally(serialize(&sample()).unwrap());
        assert_eq!(store.reload_external().await.unwrap(), Some(&sample()));
    }

    #[tokio::test]
    async fn test_reload_external_unreadable_keeps_board() {
        let io = Arc::new(MemoryDocumentIo::with_content(serialize(&sample()).unwrap()));
        let mut store = DocumentStore::open(io.clone(), Template::Empty).await.unwrap();

        io.replace_externally("[1, 2");
        assert!(matches!(
            store.reload_external().await,
            Err(BoardError::Parse { .. })
        ));
        assert_eq!(store.board(), &sample());
    }
}
