// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Error handling. */

use thiserror::Error;

/// Primary crate error type.
#[derive(Debug, Error)]
pub enum CodenameError {
    #[cfg(feature = "http")]
    #[error("HTTP error: {0:?}")]
    Reqwest(#[from] reqwest::Error),

    #[error("I/O error: {0:?}")]
    Io(#[from] std::io::Error),

    #[error("glob pattern error: {0:?}")]
    GlobPattern(#[from] glob::PatternError),

    #[error("date parsing error: {0:?}")]
    DateParse(#[from] chrono::ParseError),

    #[error("I/O error on path {0}: {1:?}")]
    IoPath(String, std::io::Error),

    #[error("control file parse error: {0}")]
    ControlParseError(String),

    #[error("sources list parse error at {0}:{1}: {2}")]
    SourcesListParse(String, usize, String),

    #[error("deb822 sources entry in {0} lacks required field {1}")]
    SourcesEntryMissingField(String, &'static str),

    #[error("duplicate release date {1} in codename family {0}")]
    CatalogDuplicateDate(String, String),

    #[error("codename {0} is defined more than once in the catalog")]
    CatalogDuplicateCodename(String),

    #[error("could not determine the running distribution codename")]
    DistroCodenameUnknown,

    #[error(
        "running codename {0} is not in the codename database; update this tool's database"
    )]
    RunningCodenameNotInCatalog(String),
}

/// Result wrapper for this crate.
pub type Result<T> = std::result::Result<T, CodenameError>;
