//! Bookmark value type and string syntax.
//!
//! A bookmark pins causal consistency to a point in a database's history:
//! `<database-uuid>:<tx-id>`. This module owns the pure string syntax; the
//! engine layers database resolution and mixture rules on top.

use smallvec::SmallVec;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Marker carried by the retired bookmark format. Strings containing it are
/// rejected outright rather than reinterpreted.
const LEGACY_MARKER: &str = ":bookmark:v1:tx";

/// A validated (database, transaction id) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Bookmark {
    pub database: Uuid,
    pub tx_id: u64,
}

impl Bookmark {
    pub fn new(database: Uuid, tx_id: u64) -> Self {
        Self { database, tx_id }
    }
}

/// Requests rarely carry more than a couple of bookmarks.
pub type BookmarkList = SmallVec<[Bookmark; 2]>;

/// Syntax-level bookmark parse failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BookmarkSyntaxError {
    #[error("bookmark '{0}' uses a retired format and is no longer supported")]
    LegacyFormat(String),
    #[error("bookmark '{0}' is not of the form <database-uuid>:<tx-id>")]
    Malformed(String),
    #[error("bookmark '{0}' carries an invalid database id")]
    BadDatabaseId(String),
    #[error("bookmark '{0}' carries an invalid transaction id")]
    BadTransactionId(String),
}

/// Does this string match the retired bookmark format?
pub fn is_legacy_format(s: &str) -> bool {
    s.contains(LEGACY_MARKER)
}

impl FromStr for Bookmark {
    type Err = BookmarkSyntaxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if is_legacy_format(s) {
            return Err(BookmarkSyntaxError::LegacyFormat(s.to_string()));
        }
        let (db, tx) = s
            .split_once(':')
            .ok_or_else(|| BookmarkSyntaxError::Malformed(s.to_string()))?;
        let database = Uuid::parse_str(db)
            .map_err(|_| BookmarkSyntaxError::BadDatabaseId(s.to_string()))?;
        let tx_id = tx
            .parse::<u64>()
            .map_err(|_| BookmarkSyntaxError::BadTransactionId(s.to_string()))?;
        Ok(Bookmark { database, tx_id })
    }
}

impl fmt::Display for Bookmark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.database, self.tx_id)
    }
}
