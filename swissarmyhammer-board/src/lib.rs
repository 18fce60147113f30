//! Board document sync and reorder engine
//!
//! This crate keeps a small kanban-style board (columns of cards) consistent
//! between a single JSON document on disk and an interactive render surface
//! that shows it and drags things around.
//!
//! ## Overview
//!
//! - **One document = one board** - `{ "columns": [ { "id", "title", "cards": [...] } ] }`
//! - **Single writer** - every mutation goes through one [`Session`] queue and
//!   one [`DocumentStore`]
//! - **External edits win** - a change to the document made outside the engine
//!   replaces the board and is pushed to the surface as a full snapshot
//! - **Stale ids are harmless** - messages naming vanished columns or cards are
//!   dropped, never applied half-way
//!
//! ## Basic Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use swissarmyhammer_board::host::StaticPrompt;
//! use swissarmyhammer_board::{
//!     ChannelSink, Dispatcher, DocumentStore, FsDocumentIo, Message, Session, Template,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let io = Arc::new(FsDocumentIo::new("board.json"));
//! let store = DocumentStore::open(io, Template::Default).await?;
//!
//! let (sink, mut snapshots) = ChannelSink::new();
//! let dispatcher = Dispatcher::new(store, Arc::new(sink));
//! let (session, handle) = Session::new(dispatcher, Arc::new(StaticPrompt::answer("Ideas")));
//! tokio::spawn(session.run());
//!
//! handle.send(Message::AddColumn);
//! let snapshot = snapshots.recv().await;
//! # Ok(())
//! # }
//! ```
//!
//! ## Message protocol
//!
//! Surface → engine messages are JSON objects tagged by `type`
//! (`update`, `add-column`, `add-card`, `rename-column`, `rename-card`,
//! `delete-column`, `delete-card`, `move-column`, `move-card`, `ready`).
//! Engine → surface is always `{ "type": "data", "data": <board> }`.

pub mod config;
pub mod dispatch;
pub mod document;
mod error;
pub mod host;
pub mod io;
pub mod message;
pub mod mirror;
pub mod reorder;
pub mod session;
pub mod types;
pub mod watcher;

pub use config::BoardConfig;
pub use dispatch::{reduce, DispatchOutcome, Dispatcher, PendingCreate, Reduction, SyncOutcome};
pub use document::DocumentStore;
pub use error::{BoardError, Result};
pub use host::{ChannelPrompt, ChannelSink, Prompt, PromptRequest, RenderSink};
pub use io::{DocumentIo, FsDocumentIo, MemoryDocumentIo};
pub use message::{Message, RenderMessage};
pub use mirror::RenderMirror;
pub use reorder::{card_drop_index, CardBounds, DragContext};
pub use session::{Session, SessionHandle};
pub use watcher::DocumentWatcher;

// Re-export commonly used types
pub use types::{Board, Card, CardId, Column, ColumnId, Template};
