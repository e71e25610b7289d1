// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! YAML configuration. */

use {
    crate::cli::Result,
    debian_codenames::catalog::{CodenameCatalog, CodenameFamily},
    serde::Deserialize,
    std::{
        collections::BTreeMap,
        path::{Path, PathBuf},
    },
};

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

/// Configuration file content.
///
/// Every key is optional.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct CheckConfig {
    /// Additional distributions that are never considered outdated.
    #[serde(default)]
    pub always_ok: Vec<String>,

    /// Additional distributions never reported as better matches.
    #[serde(default)]
    pub ignore: Vec<String>,

    /// Extra releases, keyed by family name, then by `YYYY-MM-DD` date.
    ///
    /// Releases of a built-in family are added to it. Other names define a
    /// new family.
    #[serde(default)]
    pub families: BTreeMap<String, BTreeMap<String, String>>,

    /// Per-request timeout in seconds. `0` disables the timeout.
    pub timeout_seconds: Option<u64>,

    /// Filesystem root containing `etc/apt`.
    pub sources_root: Option<PathBuf>,
}

impl CheckConfig {
    /// Parse YAML content.
    pub fn from_yaml(data: &str) -> Result<Self> {
        // An empty document deserializes to unit, not an empty mapping.
        if data.trim().is_empty() {
            return Ok(Self::default());
        }

        Ok(serde_yaml::from_str(data)?)
    }

    /// Read a YAML file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;

        Self::from_yaml(&data)
    }

    /// Build the codename catalog with configured families merged in.
    pub fn catalog(&self) -> Result<CodenameCatalog> {
        let mut families = CodenameCatalog::builtin_families()?;

        for (name, releases) in &self.families {
            let extra = CodenameFamily::from_releases(
                name,
                releases
                    .iter()
                    .map(|(date, codename)| (date.as_str(), codename.as_str())),
            )?;

            match families.iter_mut().find(|f| f.name() == name) {
                Some(family) => family.extend(&extra)?,
                None => families.push(extra),
            }
        }

        Ok(CodenameCatalog::from_families(&families)?)
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::cli::CheckError,
        debian_codenames::error::CodenameError,
        indoc::indoc,
    };

    #[test]
    fn parse() -> Result<()> {
        let config = CheckConfig::from_yaml(indoc! {"
            always_ok:
              - nightly
            ignore:
              - edge
            families:
              ubuntu:
                '2026-10-15': stargazer
              example:
                '2024-01-01': alpha
            timeout_seconds: 5
            sources_root: /srv/chroot
        "})?;

        assert_eq!(config.always_ok, vec!["nightly"]);
        assert_eq!(config.ignore, vec!["edge"]);
        assert_eq!(config.timeout_seconds, Some(5));
        assert_eq!(config.sources_root, Some(PathBuf::from("/srv/chroot")));
        assert_eq!(config.families.len(), 2);

        Ok(())
    }

    #[test]
    fn empty() -> Result<()> {
        assert_eq!(CheckConfig::from_yaml("")?, CheckConfig::default());
        assert_eq!(CheckConfig::from_yaml("{}")?, CheckConfig::default());

        Ok(())
    }

    #[test]
    fn unknown_keys_rejected() {
        assert!(matches!(
            CheckConfig::from_yaml("timeout: 5\n"),
            Err(CheckError::SerdeYaml(_))
        ));
    }

    #[test]
    fn catalog_merge() -> Result<()> {
        let config = CheckConfig::from_yaml(indoc! {"
            families:
              ubuntu:
                '2099-04-01': futuristic
              example:
                '2000-01-01': ancient
        "})?;

        let catalog = config.catalog()?;
        assert_eq!(catalog.codenames().last(), Some("futuristic"));
        assert_eq!(catalog.codenames().next(), Some("ancient"));
        assert_eq!(
            catalog.entry("futuristic").map(|e| e.family.as_str()),
            Some("ubuntu")
        );

        Ok(())
    }

    #[test]
    fn catalog_rejects_duplicates() -> Result<()> {
        let config = CheckConfig::from_yaml(indoc! {"
            families:
              other:
                '2099-04-01': jammy
        "})?;
        assert!(matches!(
            config.catalog(),
            Err(CheckError::Codename(CodenameError::CatalogDuplicateCodename(_)))
        ));

        let config = CheckConfig::from_yaml(indoc! {"
            families:
              ubuntu:
                '2099-13-01': broken
        "})?;
        assert!(matches!(
            config.catalog(),
            Err(CheckError::Codename(CodenameError::DateParse(_)))
        ));

        Ok(())
    }

    #[test]
    fn from_path() -> Result<()> {
        let td = tempfile::tempdir()?;
        let path = td.path().join("apt-urlcheck.yaml");
        std::fs::write(&path, "always_ok: [edge]\n")?;

        assert_eq!(CheckConfig::from_path(&path)?.always_ok, vec!["edge"]);

        Ok(())
    }
}
