// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! APT package source enumeration.

APT reads package sources from `/etc/apt/sources.list` and from files in
`/etc/apt/sources.list.d/`. Files ending in `.list` use the traditional
one-line format:

```text
deb [arch=amd64] http://archive.ubuntu.com/ubuntu jammy main universe
```

Files ending in `.sources` use the deb822 format, where a single stanza may
describe several types, URIs and suites. Both are flattened into
[SourceRecord] instances here. See `sources.list(5)`.
*/

use {
    crate::{
        control::{parse_paragraphs_str, ControlParagraph},
        error::{CodenameError, Result},
    },
    log::{debug, warn},
    std::{
        path::{Path, PathBuf},
        str::FromStr,
    },
    strum::{Display, EnumString},
};

/// Location of the main sources file, relative to the filesystem root.
pub const SOURCES_LIST_PATH: &str = "etc/apt/sources.list";

/// Location of the sources directory, relative to the filesystem root.
pub const SOURCES_LIST_D_PATH: &str = "etc/apt/sources.list.d";

/// The kind of archive a source entry refers to.
#[derive(Clone, Copy, Debug, Display, EnumString, Eq, Hash, PartialEq)]
pub enum SourceType {
    /// Binary packages.
    #[strum(serialize = "deb")]
    Binary,
    /// Source packages.
    #[strum(serialize = "deb-src")]
    Source,
}

/// A single configured package source.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SourceRecord {
    /// File the entry was read from.
    pub file: PathBuf,
    /// 1-based line number of the entry (or of the start of its deb822 stanza).
    pub line_number: usize,
    /// Archive type.
    pub source_type: SourceType,
    /// Base URI of the repository.
    pub uri: String,
    /// Declared distribution. Usually a codename, optionally with a suffix
    /// like `-updates`, or a path for flat repositories.
    pub dist: String,
    /// Components. e.g. `main`.
    pub components: Vec<String>,
    /// Whether the entry is commented out or has `Enabled: no`.
    pub disabled: bool,
    /// The entry as written in one-line format.
    pub line: String,
}

impl SourceRecord {
    /// The repository URI without trailing slashes.
    pub fn base_uri(&self) -> &str {
        self.uri.trim_end_matches('/')
    }

    /// Whether the repository is reachable over HTTP(S).
    ///
    /// APT's `mirror+http` style transports are not considered HTTP.
    pub fn is_http(&self) -> bool {
        url::Url::parse(&self.uri)
            .map(|u| matches!(u.scheme(), "http" | "https"))
            .unwrap_or(false)
    }

    /// The file name of the file defining this entry.
    pub fn file_name(&self) -> String {
        self.file
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| self.file.display().to_string())
    }
}

/// Parse a single line in one-line format.
///
/// Returns `Ok(None)` for lines that are not source entries: blank lines,
/// plain comments and commented out lines which don't look like entries.
/// A commented out entry is returned with `disabled` set.
pub fn parse_one_line(file: &Path, line_number: usize, line: &str) -> Result<Option<SourceRecord>> {
    let trimmed = line.trim();

    if trimmed.is_empty() {
        return Ok(None);
    }

    let (disabled, body) = if trimmed.starts_with('#') {
        (true, trimmed.trim_start_matches('#').trim_start())
    } else {
        (false, trimmed)
    };

    // Trailing comments.
    let body = body.split('#').next().unwrap_or_default().trim();

    let mut tokens = body.split_whitespace();

    let source_type = match tokens.next().map(SourceType::from_str) {
        Some(Ok(t)) => t,
        _ if disabled => return Ok(None),
        Some(Err(_)) | None => {
            return Err(parse_error(file, line_number, "unknown entry type"));
        }
    };

    let mut uri = tokens.next();

    // Options may be given as `[opt=val opt2=val2]`, possibly with inner spaces.
    if matches!(uri, Some(v) if v.starts_with('[')) {
        let mut token = uri;
        while let Some(v) = token {
            if v.ends_with(']') {
                break;
            }
            token = tokens.next();
        }
        uri = tokens.next();
    }

    // Bracketed URI parts (`cdrom:[Disc Label]/`) may contain spaces.
    let uri = match uri {
        Some(first) if first.contains('[') && !first.contains(']') => {
            let mut joined = first.to_string();
            for token in tokens.by_ref() {
                joined.push(' ');
                joined.push_str(token);
                if token.contains(']') {
                    break;
                }
            }
            Some(joined)
        }
        other => other.map(|s| s.to_string()),
    };

    let (uri, dist) = match (uri, tokens.next()) {
        (Some(uri), Some(dist)) => (uri, dist),
        _ if disabled => return Ok(None),
        _ => return Err(parse_error(file, line_number, "missing URI or distribution")),
    };

    Ok(Some(SourceRecord {
        file: file.to_path_buf(),
        line_number,
        source_type,
        uri,
        dist: dist.to_string(),
        components: tokens.map(|s| s.to_string()).collect(),
        disabled,
        line: line.to_string(),
    }))
}

fn parse_error(file: &Path, line_number: usize, message: &str) -> CodenameError {
    CodenameError::SourcesListParse(
        format!("{}", file.display()),
        line_number,
        message.to_string(),
    )
}

/// Expand a deb822 stanza into records.
///
/// A stanza produces one record per combination of type, URI and suite.
pub fn records_from_deb822(
    file: &Path,
    line_number: usize,
    paragraph: &ControlParagraph<'_>,
) -> Result<Vec<SourceRecord>> {
    let required = |name: &'static str| -> Result<Vec<&str>> {
        let words = paragraph
            .field_words(name)
            .map(|words| words.collect::<Vec<_>>())
            .unwrap_or_default();

        if words.is_empty() {
            Err(CodenameError::SourcesEntryMissingField(
                format!("{}", file.display()),
                name,
            ))
        } else {
            Ok(words)
        }
    };

    let types = required("Types")?;
    let uris = required("URIs")?;
    let suites = required("Suites")?;
    let components = paragraph
        .field_words("Components")
        .map(|words| words.map(|s| s.to_string()).collect::<Vec<_>>())
        .unwrap_or_default();
    let disabled = !paragraph.field_bool("Enabled").unwrap_or(true);

    let mut records = vec![];

    for t in types {
        let source_type = SourceType::from_str(t)
            .map_err(|_| parse_error(file, line_number, &format!("unknown type {}", t)))?;

        for uri in &uris {
            for suite in &suites {
                let mut line = format!("{} {} {}", source_type, uri, suite);
                for component in &components {
                    line.push(' ');
                    line.push_str(component);
                }

                records.push(SourceRecord {
                    file: file.to_path_buf(),
                    line_number,
                    source_type,
                    uri: uri.to_string(),
                    dist: suite.to_string(),
                    components: components.clone(),
                    disabled,
                    line,
                });
            }
        }
    }

    Ok(records)
}

/// A collection of [SourceRecord] in the order APT would read them.
#[derive(Clone, Debug, Default)]
pub struct SourcesList {
    records: Vec<SourceRecord>,
}

impl SourcesList {
    /// Parse one-line format content.
    ///
    /// Malformed entries are logged and skipped.
    pub fn from_one_line_str(file: &Path, data: &str) -> Self {
        let records = data
            .lines()
            .enumerate()
            .filter_map(|(i, line)| match parse_one_line(file, i + 1, line) {
                Ok(record) => record,
                Err(e) => {
                    warn!("ignoring entry: {}", e);
                    None
                }
            })
            .collect();

        Self { records }
    }

    /// Parse deb822 format content.
    ///
    /// Stanzas lacking required fields are logged and skipped.
    pub fn from_deb822_str(file: &Path, data: &str) -> Result<Self> {
        let mut records = vec![];

        for (line_number, paragraph) in parse_paragraphs_str(data)? {
            match records_from_deb822(file, line_number, &paragraph) {
                Ok(r) => records.extend(r),
                Err(e) => warn!("ignoring stanza: {}", e),
            }
        }

        Ok(Self { records })
    }

    /// Load a single sources file, selecting the format by file extension.
    pub fn load_file(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)
            .map_err(|e| CodenameError::IoPath(format!("{}", path.display()), e))?;

        debug!("reading sources from {}", path.display());

        if path.extension().map(|ext| ext == "sources").unwrap_or(false) {
            Self::from_deb822_str(path, &data)
        } else {
            Ok(Self::from_one_line_str(path, &data))
        }
    }

    /// Load all sources configured under the filesystem root `root`.
    ///
    /// `etc/apt/sources.list` is read first, followed by `*.list` and `*.sources`
    /// files in `etc/apt/sources.list.d` in file name order. Missing files are
    /// not an error. A `.sources` file that isn't valid deb822 is logged and skipped.
    pub fn load(root: &Path) -> Result<Self> {
        let mut paths = vec![];

        let main = root.join(SOURCES_LIST_PATH);
        if main.is_file() {
            paths.push(main);
        }

        let dir = root.join(SOURCES_LIST_D_PATH);
        let mut extra = vec![];
        for pattern in ["*.list", "*.sources"] {
            let pattern = format!("{}/{}", dir.display(), pattern);
            for entry in glob::glob(&pattern)? {
                match entry {
                    Ok(path) => extra.push(path),
                    Err(e) => warn!("unable to read {}", e),
                }
            }
        }
        extra.sort();
        paths.extend(extra);

        let mut records = vec![];
        for path in paths {
            match Self::load_file(&path) {
                Ok(list) => records.extend(list.records),
                Err(CodenameError::ControlParseError(msg)) => {
                    warn!("ignoring {}: {}", path.display(), msg);
                }
                Err(e) => return Err(e),
            }
        }

        Ok(Self { records })
    }

    /// Iterate over every record, including disabled ones.
    pub fn iter(&self) -> impl Iterator<Item = &SourceRecord> {
        self.records.iter()
    }

    /// Iterate over enabled records.
    pub fn iter_enabled(&self) -> impl Iterator<Item = &SourceRecord> {
        self.records.iter().filter(|r| !r.disabled)
    }

    /// Number of records, including disabled ones.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether there are no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl FromIterator<SourceRecord> for SourcesList {
    fn from_iter<T: IntoIterator<Item = SourceRecord>>(iter: T) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}
