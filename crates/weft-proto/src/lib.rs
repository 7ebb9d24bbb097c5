//! Value types for the Weft graph wire protocol.
//!
//! This crate holds everything the engine and a transport need to agree on
//! without pulling in either side's machinery: decoded request messages, the
//! shape vocabulary used for dispatch, result records, wire error codes and
//! the bookmark value type with its string syntax.
//!
//! Byte-level encoding and decoding live in the transport, not here.

pub mod bookmark;
pub mod error;
pub mod request;
pub mod shape;
pub mod value;

pub use bookmark::{Bookmark, BookmarkList, BookmarkSyntaxError};
pub use error::ErrorCode;
pub use request::{
    AccessMode, Begin, Credentials, Discard, Hello, Pull, RawBookmarks, Request, Route, Run,
    TxExtra,
};
pub use shape::{RequestGroup, RequestKind, RequestShape};
pub use value::{Metadata, Record, Value};
