// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Detection of package sources pinned to an old release.

A source is considered up to date if its distribution mentions the running
release codename or is one of a set of rolling distribution names
(`stable`, `sid`, flat repositories using `./` and so on). Everything else is
*possibly outdated*. It may simply belong to a vendor that doesn't follow
distribution release names.
*/

use {
    crate::{
        catalog::CodenameCatalog,
        error::{CodenameError, Result},
        sources_list::SourceRecord,
    },
    log::debug,
    std::collections::HashSet,
};

/// Distributions that are never considered outdated.
pub const ALWAYS_OK_DISTS: &[&str] = &[
    "stable",
    "testing",
    "unstable",
    "devel",
    "beta",
    "preview",
    "sid",
    "experimental",
    "./",
    "syncthing",
];

/// Partition of enabled sources into current and possibly outdated ones.
#[derive(Clone, Debug, Default)]
pub struct Classification<'s> {
    /// Number of enabled sources examined.
    pub valid: usize,
    /// Possibly outdated sources, ordered by file path.
    pub outdated: Vec<&'s SourceRecord>,
}

/// Classifies sources against the running release.
#[derive(Clone, Debug)]
pub struct OutdatedDetector {
    running: String,
    always_ok: HashSet<String>,
}

impl OutdatedDetector {
    /// Construct an instance for the running release codename.
    ///
    /// Fails if the codename is unknown to `catalog`: newer releases couldn't
    /// be determined reliably.
    pub fn new(catalog: &CodenameCatalog, running: &str) -> Result<Self> {
        if !catalog.contains(running) {
            return Err(CodenameError::RunningCodenameNotInCatalog(running.to_string()));
        }

        Ok(Self {
            running: running.to_string(),
            always_ok: ALWAYS_OK_DISTS.iter().map(|s| s.to_string()).collect(),
        })
    }

    /// The running release codename.
    pub fn running(&self) -> &str {
        &self.running
    }

    /// Treat additional distribution names as never outdated.
    pub fn allow(&mut self, dists: impl IntoIterator<Item = impl ToString>) {
        self.always_ok.extend(dists.into_iter().map(|s| s.to_string()));
    }

    /// Whether a distribution name looks outdated.
    pub fn is_outdated(&self, dist: &str) -> bool {
        !(dist.contains(self.running.as_str()) || self.always_ok.contains(dist))
    }

    /// Classify sources.
    ///
    /// Disabled entries are skipped.
    pub fn classify<'s>(
        &self,
        sources: impl IntoIterator<Item = &'s SourceRecord>,
    ) -> Classification<'s> {
        let mut res = Classification::default();

        for source in sources.into_iter().filter(|s| !s.disabled) {
            res.valid += 1;

            if self.is_outdated(&source.dist) {
                debug!(
                    "{}:{}: {} does not mention {}",
                    source.file.display(),
                    source.line_number,
                    source.dist,
                    self.running
                );
                res.outdated.push(source);
            }
        }

        // Stable so entries within a file keep their order.
        res.outdated.sort_by(|a, b| a.file.cmp(&b.file));

        res
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::sources_list::{SourceType, SourcesList},
        std::path::{Path, PathBuf},
    };

    fn record(file: &str, dist: &str) -> SourceRecord {
        SourceRecord {
            file: PathBuf::from(file),
            line_number: 1,
            source_type: SourceType::Binary,
            uri: "http://archive.example.com/ubuntu".to_string(),
            dist: dist.to_string(),
            components: vec!["main".to_string()],
            disabled: false,
            line: format!("deb http://archive.example.com/ubuntu {} main", dist),
        }
    }

    #[test]
    fn unknown_running_codename() -> Result<()> {
        let catalog = CodenameCatalog::builtin()?;

        assert!(matches!(
            OutdatedDetector::new(&catalog, "nosuchrelease"),
            Err(CodenameError::RunningCodenameNotInCatalog(c)) if c == "nosuchrelease"
        ));

        Ok(())
    }

    #[test]
    fn outdated_dists() -> Result<()> {
        let catalog = CodenameCatalog::builtin()?;
        let mut detector = OutdatedDetector::new(&catalog, "bionic")?;

        assert!(!detector.is_outdated("bionic"));
        assert!(!detector.is_outdated("bionic-updates"));
        assert!(!detector.is_outdated("ubuntu-bionic"));
        assert!(detector.is_outdated("trusty"));
        assert!(detector.is_outdated("xenial-security"));

        for dist in ALWAYS_OK_DISTS {
            assert!(!detector.is_outdated(dist), "{}", dist);
        }

        assert!(detector.is_outdated("nightly"));
        detector.allow(["nightly"]);
        assert!(!detector.is_outdated("nightly"));

        Ok(())
    }

    #[test]
    fn classify_sorts_by_file() -> Result<()> {
        let catalog = CodenameCatalog::builtin()?;
        let detector = OutdatedDetector::new(&catalog, "jammy")?;

        let mut disabled = record("/etc/apt/sources.list.d/a.list", "bionic");
        disabled.disabled = true;

        let sources = [
            record("/etc/apt/sources.list.d/z.list", "focal"),
            record("/etc/apt/sources.list", "jammy"),
            record("/etc/apt/sources.list.d/b.list", "bionic"),
            record("/etc/apt/sources.list.d/b.list", "xenial"),
            record("/etc/apt/sources.list.d/c.list", "stable"),
            disabled,
        ];

        let res = detector.classify(sources.iter());
        assert_eq!(res.valid, 5);

        let outdated = res
            .outdated
            .iter()
            .map(|s| (s.file_name(), s.dist.as_str()))
            .collect::<Vec<_>>();
        assert_eq!(
            outdated,
            vec![
                ("b.list".to_string(), "bionic"),
                ("b.list".to_string(), "xenial"),
                ("z.list".to_string(), "focal"),
            ]
        );

        Ok(())
    }

    #[test]
    fn classify_sources_list() -> Result<()> {
        let catalog = CodenameCatalog::builtin()?;
        let detector = OutdatedDetector::new(&catalog, "bookworm")?;

        let sources = SourcesList::from_one_line_str(
            Path::new("/etc/apt/sources.list"),
            "deb http://deb.debian.org/debian bookworm main\n\
             deb http://deb.debian.org/debian-security bookworm-security main\n\
             # deb http://deb.debian.org/debian bullseye main\n\
             deb http://repo.example.com/apt bullseye main\n\
             deb http://apt.syncthing.net/ syncthing stable\n",
        );

        let res = detector.classify(sources.iter());
        assert_eq!(res.valid, 4);
        assert_eq!(res.outdated.len(), 1);
        assert_eq!(res.outdated[0].uri, "http://repo.example.com/apt");

        Ok(())
    }
}
