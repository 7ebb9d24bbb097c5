//! Shape-indexed transition lookup with memoization.
//!
//! Exact shapes sit in a plain map; group and universal shapes are scanned
//! most-specific-first. Winning family lookups are memoized in a concurrent
//! map keyed by the queried kind, so the scan happens at most once per kind
//! per registry. The memo is an optimization only: misses are always safe,
//! and racing writers compute the same value, so last-write-wins is benign.

use super::transition::Transition;
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::Arc;
use weft_proto::{RequestKind, RequestShape};

/// Lookup table from request shape to transition handler.
///
/// Populated once at build time via [`super::StateFactory`]; immutable
/// afterwards except for the memo cache, which is internal and thread-safe.
pub struct HandlerRegistry {
    exact: HashMap<RequestKind, Arc<dyn Transition>>,
    /// Group and universal entries, sorted most-specific-first; entries of
    /// equal specificity keep registration order (which is deliberately
    /// unspecified as a contract).
    families: Vec<(RequestShape, Arc<dyn Transition>)>,
    memo: DashMap<RequestKind, Arc<dyn Transition>>,
}

impl HandlerRegistry {
    /// Build from (shape, transition) pairs in registration order.
    pub(super) fn from_entries(entries: Vec<(RequestShape, Arc<dyn Transition>)>) -> Self {
        let mut exact = HashMap::new();
        let mut families = Vec::new();
        for (shape, transition) in entries {
            match shape {
                RequestShape::Exact(kind) => {
                    exact.insert(kind, transition);
                }
                other => families.push((other, transition)),
            }
        }
        families.sort_by(|a, b| b.0.specificity().cmp(&a.0.specificity()));
        Self {
            exact,
            families,
            memo: DashMap::new(),
        }
    }

    /// Find the most specific handler for a request kind.
    pub fn find(&self, kind: RequestKind) -> Option<Arc<dyn Transition>> {
        if let Some(transition) = self.exact.get(&kind) {
            return Some(Arc::clone(transition));
        }
        if let Some(hit) = self.memo.get(&kind) {
            return Some(Arc::clone(&hit));
        }
        let winner = self
            .families
            .iter()
            .find(|(shape, _)| shape.accepts(kind))
            .map(|(_, transition)| Arc::clone(transition));
        if let Some(transition) = &winner {
            self.memo.insert(kind, Arc::clone(transition));
        }
        winner
    }

    /// All registered pairs, exact entries first. Used to pre-seed a derived
    /// state's builder.
    pub(super) fn entries(&self) -> Vec<(RequestShape, Arc<dyn Transition>)> {
        let mut out: Vec<_> = self
            .exact
            .iter()
            .map(|(kind, transition)| (RequestShape::Exact(*kind), Arc::clone(transition)))
            .collect();
        out.sort_by_key(|(shape, _)| match shape {
            RequestShape::Exact(kind) => *kind,
            _ => RequestKind::Hello,
        });
        out.extend(
            self.families
                .iter()
                .map(|(shape, transition)| (*shape, Arc::clone(transition))),
        );
        out
    }

    pub fn len(&self) -> usize {
        self.exact.len() + self.families.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exact.is_empty() && self.families.is_empty()
    }
}
