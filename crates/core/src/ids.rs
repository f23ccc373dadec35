// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Identifier types for sessions and workspaces.
//!
//! `SessionId`/`WorkspaceId` are opaque, globally unique, and immutable once
//! assigned. `SessionIndex`/`WorkspaceIndex` are short, sequentially
//! allocated human strings ("1", "2", ...). `Identifier` is the tagged union
//! accepted by resolution functions: full id, then index, then name.

use std::borrow::Borrow;
use std::fmt;

/// Truncate an identifier to a short prefix for display.
pub trait ShortId {
    fn short(&self, n: usize) -> &str;
}

impl ShortId for str {
    fn short(&self, n: usize) -> &str {
        if self.len() <= n {
            self
        } else {
            &self[..n]
        }
    }
}

/// Define a newtype ID wrapper around `String`.
///
/// Generates `new()`, `as_str()`, `short()`, `Display`, `From<String>`,
/// `From<&str>`, `PartialEq<str>`, `PartialEq<&str>`, and `Borrow<str>`.
#[macro_export]
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        pub struct $name:ident;
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn short(&self, n: usize) -> &str {
                $crate::ids::ShortId::short(self.0.as_str(), n)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
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

        impl std::borrow::Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }
    };
}

define_id! {
    /// Globally unique identifier for a session, assigned at creation and
    /// immutable thereafter. 128-bit random, hex-encoded by `UuidIdGen`.
    pub struct SessionId;
}

define_id! {
    /// Globally unique identifier for a workspace.
    pub struct WorkspaceId;
}

/// Short, sequentially allocated human index ("1", "2", ...), stable for the
/// owning session or workspace's lifetime. Reused only after removal, and
/// even then only because the counter never decrements — no two live
/// entities ever share one.
pub type ShortIndex = String;

/// A tagged union accepted by resolution functions: tried as full id, then
/// short index, then name. The caller decides which variant a bare string
/// is by trying each resolution rule in order (see `resolve`).
#[derive(Debug, Clone)]
pub enum Identifier {
    Full(String),
    Index(ShortIndex),
    Name(String),
}

impl Identifier {
    /// Parse a bare string typed by a user into the most specific variant
    /// we can detect without consulting any store: an all-digit string is
    /// assumed to be an index, anything else is tried as a full id or name
    /// by `resolve`.
    pub fn parse(raw: &str) -> Self {
        if !raw.is_empty() && raw.chars().all(|c| c.is_ascii_digit()) {
            Identifier::Index(raw.to_string())
        } else {
            Identifier::Full(raw.to_string())
        }
    }

    pub fn raw(&self) -> &str {
        match self {
            Identifier::Full(s) | Identifier::Index(s) | Identifier::Name(s) => s,
        }
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw())
    }
}

/// Resolve a bare string against the three lookup rules in order: full id
/// hit, short-index lookup, then unique name match. Implemented generically
/// over the three lookup closures so both sessions and workspaces can share
/// one resolution algorithm.
///
/// Returns `Ok(None)` when nothing matches, `Ok(Some(id))` on a unique hit,
/// and `Err(candidates)` when more than one entity shares the queried name.
pub fn resolve<Id, FFull, FIndex, FName>(
    raw: &str,
    by_full: FFull,
    by_index: FIndex,
    by_name: FName,
) -> Result<Option<Id>, Vec<Id>>
where
    Id: Borrow<str> + Clone,
    FFull: FnOnce(&str) -> Option<Id>,
    FIndex: FnOnce(&str) -> Option<Id>,
    FName: FnOnce(&str) -> Vec<Id>,
{
    if let Some(id) = by_full(raw) {
        return Ok(Some(id));
    }
    if raw.chars().all(|c| c.is_ascii_digit()) && !raw.is_empty() {
        if let Some(id) = by_index(raw) {
            return Ok(Some(id));
        }
    }
    let mut matches = by_name(raw);
    match matches.len() {
        0 => Ok(None),
        1 => Ok(Some(matches.remove(0))),
        _ => Err(matches),
    }
}

#[cfg(test)]
#[path = "ids_tests.rs"]
mod tests;
