//! Identifier newtypes for columns and cards.
//!
//! Identifiers are minted once, at creation, from a slug of the title plus the
//! creation timestamp in milliseconds (`fix-login-1718000000000`). After that
//! they never change, even when the title does.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, $fallback:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap an existing identifier string
            pub fn from_string(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Mint a new identifier for an entity titled `title` created at `at`
            pub fn generate(title: &str, at: DateTime<Utc>) -> Self {
                Self(format!("{}-{}", slug_or(title, $fallback), at.timestamp_millis()))
            }

            /// Get the inner string value
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Derive a variant with a numeric suffix, used when a freshly
            /// minted id collides with an existing one
            pub(crate) fn with_suffix(&self, n: usize) -> Self {
                Self(format!("{}-{}", self.0, n))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }

        impl PartialEq<&str> for $name {
            fn eq(&self, other: &&str) -> bool {
                self.0 == *other
            }
        }
    };
}

define_id!(
    /// Identifier of a column, unique within a board
    ColumnId,
    "column"
);

define_id!(
    /// Identifier of a card, unique within a board
    CardId,
    "card"
);

/// Normalize a title into a slug: lowercase ASCII alphanumerics with every run
/// of other characters collapsed into a single `-`.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_dash = false;

    for ch in title.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }

    slug
}

fn slug_or(title: &str, fallback: &str) -> String {
    let slug = slugify(title);
    if slug.is_empty() {
        fallback.to_string()
    } else {
        slug
    }
}
