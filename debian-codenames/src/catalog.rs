// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Release codename catalog.

Each tracked distribution family (Debian, Ubuntu, ...) is described by a
[CodenameFamily], a mapping of release dates to codenames. Families are merged
into a [CodenameCatalog], a single sequence of codenames ordered by release
date. Catalog order is what gives meaning to "newer" throughout this crate.
*/

use {
    crate::error::{CodenameError, Result},
    chrono::NaiveDate,
    std::collections::{BTreeMap, HashSet},
};

/// Date format of release dates. Lexical order equals chronological order.
const RELEASE_DATE_FORMAT: &str = "%Y-%m-%d";

/// Debian stable releases, by release date.
const DEBIAN_RELEASES: &[(&str, &str)] = &[
    ("2011-02-06", "squeeze"),
    ("2013-05-04", "wheezy"),
    ("2015-04-25", "jessie"),
    ("2017-06-17", "stretch"),
    ("2019-07-06", "buster"),
    ("2021-08-14", "bullseye"),
    ("2023-06-10", "bookworm"),
    ("2025-08-09", "trixie"),
];

/// Ubuntu releases, by release date.
const UBUNTU_RELEASES: &[(&str, &str)] = &[
    ("2004-10-20", "warty"),
    ("2005-04-08", "hoary"),
    ("2005-10-13", "breezy"),
    ("2006-06-01", "dapper"),
    ("2006-10-26", "edgy"),
    ("2007-04-19", "feisty"),
    ("2007-10-18", "gutsy"),
    ("2008-04-24", "hardy"),
    ("2008-10-30", "intrepid"),
    ("2009-04-23", "jaunty"),
    ("2009-10-29", "karmic"),
    ("2010-04-29", "lucid"),
    ("2010-10-10", "maverick"),
    ("2011-04-28", "natty"),
    ("2011-10-13", "oneiric"),
    ("2012-04-26", "precise"),
    ("2012-10-18", "quantal"),
    ("2013-04-25", "raring"),
    ("2013-10-17", "saucy"),
    ("2014-04-17", "trusty"),
    ("2014-10-23", "utopic"),
    ("2015-04-23", "vivid"),
    ("2015-10-22", "wily"),
    ("2016-04-21", "xenial"),
    ("2016-10-13", "yakkety"),
    ("2017-04-13", "zesty"),
    ("2017-10-19", "artful"),
    ("2018-04-26", "bionic"),
    ("2018-10-18", "cosmic"),
    ("2019-04-18", "disco"),
    ("2019-10-17", "eoan"),
    ("2020-04-23", "focal"),
    ("2020-10-22", "groovy"),
    ("2021-04-22", "hirsute"),
    ("2021-10-14", "impish"),
    ("2022-04-21", "jammy"),
    ("2022-10-20", "kinetic"),
    ("2023-04-20", "lunar"),
    ("2023-10-12", "mantic"),
    ("2024-04-25", "noble"),
    ("2024-10-10", "oracular"),
    ("2025-04-17", "plucky"),
    ("2025-10-09", "questing"),
    ("2026-04-23", "resolute"),
];

/// The releases of a single distribution family, keyed by release date.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct CodenameFamily {
    name: String,
    releases: BTreeMap<String, String>,
}

impl CodenameFamily {
    /// Construct an empty family.
    pub fn new(name: impl ToString) -> Self {
        Self {
            name: name.to_string(),
            releases: BTreeMap::new(),
        }
    }

    /// Construct a family from `(date, codename)` pairs.
    pub fn from_releases<'a>(
        name: impl ToString,
        releases: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Result<Self> {
        let mut family = Self::new(name);

        for (date, codename) in releases {
            family.add_release(date, codename)?;
        }

        Ok(family)
    }

    /// The built-in Debian family.
    pub fn debian() -> Result<Self> {
        Self::from_releases("debian", DEBIAN_RELEASES.iter().copied())
    }

    /// The built-in Ubuntu family.
    pub fn ubuntu() -> Result<Self> {
        Self::from_releases("ubuntu", UBUNTU_RELEASES.iter().copied())
    }

    /// Register a release.
    ///
    /// `date` must be a `YYYY-MM-DD` calendar date. A family cannot have two releases
    /// on the same date.
    pub fn add_release(&mut self, date: &str, codename: &str) -> Result<()> {
        NaiveDate::parse_from_str(date, RELEASE_DATE_FORMAT)?;

        if self.releases.contains_key(date) {
            return Err(CodenameError::CatalogDuplicateDate(
                self.name.clone(),
                date.to_string(),
            ));
        }

        self.releases.insert(date.to_string(), codename.to_string());

        Ok(())
    }

    /// The name of this family.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Iterate over `(date, codename)` pairs in release order.
    pub fn iter_releases(&self) -> impl Iterator<Item = (&str, &str)> {
        self.releases
            .iter()
            .map(|(date, codename)| (date.as_str(), codename.as_str()))
    }

    /// Merge the releases of another family of the same name into this one.
    pub fn extend(&mut self, other: &CodenameFamily) -> Result<()> {
        for (date, codename) in other.iter_releases() {
            self.add_release(date, codename)?;
        }

        Ok(())
    }
}

/// An entry in a [CodenameCatalog].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CatalogEntry {
    /// Release date in `YYYY-MM-DD` form.
    pub date: String,
    /// Name of the family this release belongs to.
    pub family: String,
    /// The release codename.
    pub codename: String,
}

/// Codenames of all tracked families, ordered by release date.
///
/// Families are only ordered relative to each other by raw date order, so
/// unrelated families interleave. Releases sharing a date keep the order in
/// which their families were supplied.
#[derive(Clone, Debug, Default)]
pub struct CodenameCatalog {
    entries: Vec<CatalogEntry>,
}

impl CodenameCatalog {
    /// Build a catalog by merging families.
    pub fn from_families<'a>(
        families: impl IntoIterator<Item = &'a CodenameFamily>,
    ) -> Result<Self> {
        let mut entries = vec![];
        let mut seen = HashSet::new();

        for family in families {
            for (date, codename) in family.iter_releases() {
                if !seen.insert(codename.to_string()) {
                    return Err(CodenameError::CatalogDuplicateCodename(
                        codename.to_string(),
                    ));
                }

                entries.push(CatalogEntry {
                    date: date.to_string(),
                    family: family.name().to_string(),
                    codename: codename.to_string(),
                });
            }
        }

        // Stable sort keeps family traversal order for equal dates.
        entries.sort_by(|a, b| a.date.cmp(&b.date));

        Ok(Self { entries })
    }

    /// The families this crate ships with.
    pub fn builtin_families() -> Result<Vec<CodenameFamily>> {
        Ok(vec![CodenameFamily::debian()?, CodenameFamily::ubuntu()?])
    }

    /// Build the catalog of built-in families.
    pub fn builtin() -> Result<Self> {
        Self::from_families(&Self::builtin_families()?)
    }

    /// Number of codenames in the catalog.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the catalog has no codenames.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over entries in catalog order.
    pub fn iter_entries(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.iter()
    }

    /// Iterate over codenames in catalog order.
    pub fn codenames(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.codename.as_str())
    }

    /// Obtain the entry for a codename.
    pub fn entry(&self, codename: &str) -> Option<&CatalogEntry> {
        self.entries.iter().find(|e| e.codename == codename)
    }

    /// Whether a codename is known.
    pub fn contains(&self, codename: &str) -> bool {
        self.index_of(codename).is_some()
    }

    /// Position of a codename in catalog order.
    pub fn index_of(&self, codename: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.codename == codename)
    }

    /// Every codename strictly after `codename`.
    ///
    /// Returns [None] if `codename` isn't in the catalog.
    pub fn codenames_after(&self, codename: &str) -> Option<Vec<&str>> {
        self.index_of(codename).map(|index| {
            self.entries[index + 1..]
                .iter()
                .map(|e| e.codename.as_str())
                .collect()
        })
    }

    /// The newest `count` codenames, oldest first.
    pub fn newest(&self, count: usize) -> Vec<&str> {
        let start = self.entries.len().saturating_sub(count);

        self.entries[start..]
            .iter()
            .map(|e| e.codename.as_str())
            .collect()
    }

    /// The first codename, in catalog order, appearing anywhere within `text`.
    ///
    /// This is a plain substring search: no word boundaries are considered.
    pub fn first_contained_in(&self, text: &str) -> Option<&str> {
        self.codenames().find(|codename| text.contains(codename))
    }
}
