// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Hierarchical addressing for backend keys.
//!
//! A [`Tree`] is an ordered, non-empty list of path segments, root first,
//! that never renders to an empty path.
//! Rendering a tree joins the segments with [`SEPARATOR`]. Segments may
//! themselves contain separators; empty components are dropped while
//! joining, so building a tree from `[a, b, c]` and then appending `k`
//! always renders the same address as joining `[a, b, c, k]` directly.

use std::fmt;

/// Separator between path segments in backend addresses.
pub const SEPARATOR: char = '/';

/// Segment substituted when a tree is built from no segments at all.
pub const UNKNOWN_SEGMENT: &str = "unknown";

/// An immutable namespace path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Tree {
    segments: Vec<String>,
}

impl Tree {
    /// Builds a tree from its segments, root first.
    ///
    /// Segments that render to an empty path, including no segments at all,
    /// yield the single-segment tree `unknown` rather than an invalid empty
    /// path.
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        if join_path(&segments).is_empty() {
            return Self {
                segments: vec![UNKNOWN_SEGMENT.to_string()],
            };
        }
        Self { segments }
    }

    /// Returns the segments this tree was built from.
    #[inline]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Renders the tree as a single address.
    pub fn path(&self) -> String {
        join_path(&self.segments)
    }

    /// Renders the address of `key` beneath this tree.
    pub fn join(&self, key: &str) -> String {
        join_path(self.segments.iter().map(String::as_str).chain([key]))
    }

    /// Returns a new tree with `segment` appended as the deepest level.
    pub fn child(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment.into());
        Self { segments }
    }
}

impl fmt::Display for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// Joins path parts with [`SEPARATOR`], dropping empty components.
///
/// `["a/", "/b", "c"]` renders as `a/b/c`.
pub fn join_path<I, S>(parts: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out = String::new();
    for part in parts {
        for component in part.as_ref().split(SEPARATOR).filter(|c| !c.is_empty()) {
            if !out.is_empty() {
                out.push(SEPARATOR);
            }
            out.push_str(component);
        }
    }
    out
}

/// Renders `key` under an optional tree; `None` addresses the root namespace.
pub fn scoped_path(tree: Option<&Tree>, key: &str) -> String {
    match tree {
        Some(tree) => tree.join(key),
        None => join_path([key]),
    }
}
