//! Core types for the board engine

mod board;
mod ids;

pub use board::{Board, Card, Column, Template};
pub use ids::{slugify, CardId, ColumnId};
