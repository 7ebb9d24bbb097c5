//! Bookmark validation and resolution.
//!
//! [`weft_proto::bookmark`] owns the string syntax; this module layers the
//! session-level rules on top: historical input forms, list homogeneity,
//! database resolution and the per-database maximum, plus the mixture rule
//! for requests that must stay within one database.

use crate::collab::DatabaseResolver;
use crate::error::Failure;
use weft_proto::bookmark::{Bookmark, BookmarkList, is_legacy_format};
use weft_proto::{RawBookmarks, Value};

/// Validate and resolve the bookmarks on one request.
///
/// Returns at most one bookmark per distinct database (the one with the
/// highest transaction id), ordered by first occurrence. With
/// `single_database` set, bookmarks spreading across databases raise the
/// mixture failure, a distinct kind from plain invalid-bookmark.
pub fn parse_bookmarks(
    raw: &RawBookmarks,
    resolver: &dyn DatabaseResolver,
    single_database: bool,
) -> Result<BookmarkList, Failure> {
    let mut out = BookmarkList::new();

    match raw {
        RawBookmarks::None => {}
        RawBookmarks::Single(s) => {
            if !s.is_empty() {
                merge(&mut out, parse_one(s, resolver)?);
            }
        }
        RawBookmarks::Many(entries) => {
            for entry in entries {
                match entry {
                    Value::Null => continue,
                    Value::String(s) if s.is_empty() => continue,
                    Value::String(s) => merge(&mut out, parse_one(s, resolver)?),
                    other => {
                        return Err(Failure::InvalidBookmark(format!(
                            "bookmark list entries must be strings, found {other}"
                        )));
                    }
                }
            }
        }
    }

    if single_database && out.len() > 1 {
        return Err(Failure::InvalidBookmarkMixture(format!(
            "bookmarks reference {} databases where one is allowed",
            out.len()
        )));
    }

    Ok(out)
}

fn parse_one(s: &str, resolver: &dyn DatabaseResolver) -> Result<Bookmark, Failure> {
    // Legacy strings poison the whole request, even alongside valid ones.
    if is_legacy_format(s) {
        return Err(Failure::InvalidBookmark(format!(
            "bookmark '{s}' uses a retired format and is no longer supported"
        )));
    }
    let bookmark: Bookmark = s
        .parse()
        .map_err(|e| Failure::InvalidBookmark(format!("{e}")))?;
    if resolver.resolve(bookmark.database).is_none() {
        return Err(Failure::InvalidBookmark(format!(
            "bookmark '{s}' references an unknown database"
        )));
    }
    Ok(bookmark)
}

/// Keep the highest transaction id per database, preserving first-seen
/// database order.
fn merge(out: &mut BookmarkList, bookmark: Bookmark) {
    if let Some(existing) = out.iter_mut().find(|b| b.database == bookmark.database) {
        if bookmark.tx_id > existing.tx_id {
            existing.tx_id = bookmark.tx_id;
        }
    } else {
        out.push(bookmark);
    }
}
