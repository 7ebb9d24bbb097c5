//! The dispatch shape vocabulary.
//!
//! Dispatch never walks a runtime type hierarchy. Requests carry a flat
//! [`RequestKind`] tag, and handlers register against a [`RequestShape`]:
//! either one exact kind, a named group of kinds, or the universal shape.
//! A group stands in for what a subtype family would be in an open
//! polymorphic design, with the subtype relation made explicit:
//! `Exact ⊂ Group ⊂ Any`.

use std::fmt;

/// Flat tag identifying a request's message type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RequestKind {
    Hello,
    Logon,
    Run,
    Begin,
    Commit,
    Rollback,
    Pull,
    Discard,
    Route,
    Reset,
}

impl RequestKind {
    /// Wire-level message name, used in error text and logs.
    pub const fn name(self) -> &'static str {
        match self {
            RequestKind::Hello => "HELLO",
            RequestKind::Logon => "LOGON",
            RequestKind::Run => "RUN",
            RequestKind::Begin => "BEGIN",
            RequestKind::Commit => "COMMIT",
            RequestKind::Rollback => "ROLLBACK",
            RequestKind::Pull => "PULL",
            RequestKind::Discard => "DISCARD",
            RequestKind::Route => "ROUTE",
            RequestKind::Reset => "RESET",
        }
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A named family of request kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestGroup {
    /// Result consumption: PULL and DISCARD.
    Results,
    /// Explicit transaction boundaries: COMMIT and ROLLBACK.
    TxControl,
}

impl RequestGroup {
    pub fn contains(self, kind: RequestKind) -> bool {
        match self {
            RequestGroup::Results => {
                matches!(kind, RequestKind::Pull | RequestKind::Discard)
            }
            RequestGroup::TxControl => {
                matches!(kind, RequestKind::Commit | RequestKind::Rollback)
            }
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            RequestGroup::Results => "results",
            RequestGroup::TxControl => "tx-control",
        }
    }
}

/// The shape a handler registers against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestShape {
    /// Exactly one request kind.
    Exact(RequestKind),
    /// Every kind in a named family.
    Group(RequestGroup),
    /// Every request kind.
    Any,
}

impl RequestShape {
    /// Does this shape accept a concrete request kind?
    pub fn accepts(self, kind: RequestKind) -> bool {
        match self {
            RequestShape::Exact(k) => k == kind,
            RequestShape::Group(g) => g.contains(kind),
            RequestShape::Any => true,
        }
    }

    /// Is `self` a supertype of (or equal to) `other`?
    ///
    /// `Any` covers everything; a group covers itself and its exact members;
    /// an exact shape covers only itself.
    pub fn is_supertype_of(self, other: RequestShape) -> bool {
        match (self, other) {
            (RequestShape::Any, _) => true,
            (RequestShape::Group(a), RequestShape::Group(b)) => a == b,
            (RequestShape::Group(g), RequestShape::Exact(k)) => g.contains(k),
            (RequestShape::Exact(a), RequestShape::Exact(b)) => a == b,
            _ => false,
        }
    }

    /// Ordering weight for most-specific-first candidate sorting.
    pub const fn specificity(self) -> u8 {
        match self {
            RequestShape::Exact(_) => 2,
            RequestShape::Group(_) => 1,
            RequestShape::Any => 0,
        }
    }
}

impl fmt::Display for RequestShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestShape::Exact(k) => write!(f, "{}", k.name()),
            RequestShape::Group(g) => write!(f, "group:{}", g.name()),
            RequestShape::Any => f.write_str("any"),
        }
    }
}
