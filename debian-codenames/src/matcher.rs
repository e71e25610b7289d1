// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Selection of discovered distributions newer than the one in use. */

use {crate::catalog::CodenameCatalog, std::collections::HashSet};

/// Distributions never reported as a better match.
///
/// These are rolling aliases whose position relative to a codename can't be
/// determined.
pub const IGNORED_DISTS: &[&str] = &[
    "devel",
    "stable",
    "testing",
    "unstable",
    "sid",
    "experimental",
    "beta",
    "preview",
];

/// Decides whether a discovered distribution supersedes the current one.
#[derive(Clone, Debug)]
pub struct MatchFilter<'c> {
    catalog: &'c CodenameCatalog,
    ignored: HashSet<String>,
}

impl<'c> MatchFilter<'c> {
    /// Construct an instance ignoring [IGNORED_DISTS].
    pub fn new(catalog: &'c CodenameCatalog) -> Self {
        Self {
            catalog,
            ignored: IGNORED_DISTS.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Ignore additional distribution names.
    pub fn ignore(&mut self, dists: impl IntoIterator<Item = impl ToString>) {
        self.ignored.extend(dists.into_iter().map(|s| s.to_string()));
    }

    /// Whether a distribution name is ignored.
    pub fn is_ignored(&self, dist: &str) -> bool {
        self.ignored.contains(dist)
    }

    /// Whether `candidate` is strictly newer than `current`.
    ///
    /// Codenames known to the catalog compare by release order. Otherwise
    /// names compare lexicographically, so `jammy-updates` supersedes
    /// `focal-updates`.
    pub fn is_better_match(&self, candidate: &str, current: &str) -> bool {
        if self.is_ignored(candidate) {
            return false;
        }

        match (
            self.catalog.index_of(candidate),
            self.catalog.index_of(current),
        ) {
            (Some(a), Some(b)) => a > b,
            _ => candidate > current,
        }
    }

    /// Retain only candidates that are better matches, preserving order.
    pub fn filter_better_matches(&self, candidates: &[String], current: &str) -> Vec<String> {
        candidates
            .iter()
            .filter(|c| self.is_better_match(c, current))
            .cloned()
            .collect()
    }
}
