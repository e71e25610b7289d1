// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Detection of the running distribution.

The distribution identifier and release codename are read from
`os-release(5)` files, falling back to the older `/etc/lsb-release`.
*/

use {
    crate::error::{CodenameError, Result},
    log::debug,
    std::{collections::HashMap, path::Path},
};

/// Files consulted for distribution information, relative to the filesystem root.
const OS_RELEASE_PATHS: &[&str] = &["etc/os-release", "usr/lib/os-release"];

const LSB_RELEASE_PATH: &str = "etc/lsb-release";

/// Identity of the running distribution.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DistroInfo {
    /// Lowercase distribution identifier. e.g. `ubuntu` or `debian`.
    pub id: String,
    /// Release codename. e.g. `jammy`.
    pub codename: String,
}

/// Parse a shell-compatible `KEY=value` assignment file.
///
/// Blank lines, comments and lines without `=` are ignored. Values may be
/// single or double quoted.
pub fn parse_assignments(data: &str) -> HashMap<String, String> {
    data.lines()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| (key.trim().to_string(), unquote(value.trim())))
        .collect()
}

fn unquote(value: &str) -> String {
    let quoted = value.len() >= 2
        && ((value.starts_with('"') && value.ends_with('"'))
            || (value.starts_with('\'') && value.ends_with('\'')));

    if !quoted {
        return value.to_string();
    }

    let inner = &value[1..value.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();

    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(escaped) = chars.next() {
                out.push(escaped);
            }
        } else {
            out.push(c);
        }
    }

    out
}

impl DistroInfo {
    /// Resolve from the content of an `os-release` file.
    ///
    /// Derivatives like Linux Mint carry the codename of the Ubuntu release they are
    /// based on in `UBUNTU_CODENAME`. Their package sources refer to that codename, so
    /// it is preferred over `VERSION_CODENAME`.
    pub fn from_os_release(data: &str) -> Option<Self> {
        let fields = parse_assignments(data);

        let codename = ["UBUNTU_CODENAME", "VERSION_CODENAME"]
            .iter()
            .filter_map(|key| fields.get(*key))
            .find(|v| !v.is_empty())?;

        Some(Self {
            id: fields
                .get("ID")
                .map(|v| v.to_lowercase())
                .unwrap_or_else(|| "linux".to_string()),
            codename: codename.to_lowercase(),
        })
    }

    /// Resolve from the content of an `lsb-release` file.
    pub fn from_lsb_release(data: &str) -> Option<Self> {
        let fields = parse_assignments(data);

        let codename = fields.get("DISTRIB_CODENAME").filter(|v| !v.is_empty())?;

        Some(Self {
            id: fields
                .get("DISTRIB_ID")
                .map(|v| v.to_lowercase())
                .unwrap_or_else(|| "linux".to_string()),
            codename: codename.to_lowercase(),
        })
    }

    /// Detect the distribution installed under the filesystem root `root`.
    pub fn detect(root: &Path) -> Result<Self> {
        for rel in OS_RELEASE_PATHS {
            let path = root.join(rel);

            if let Some(data) = read_optional(&path)? {
                if let Some(info) = Self::from_os_release(&data) {
                    debug!("resolved distribution {:?} from {}", info, path.display());
                    return Ok(info);
                }
            }
        }

        let path = root.join(LSB_RELEASE_PATH);
        if let Some(data) = read_optional(&path)? {
            if let Some(info) = Self::from_lsb_release(&data) {
                debug!("resolved distribution {:?} from {}", info, path.display());
                return Ok(info);
            }
        }

        Err(CodenameError::DistroCodenameUnknown)
    }
}

fn read_optional(path: &Path) -> Result<Option<String>> {
    match std::fs::read_to_string(path) {
        Ok(data) => Ok(Some(data)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(CodenameError::IoPath(format!("{}", path.display()), e)),
    }
}

#[cfg(test)]
mod tests {
    use {super::*, indoc::indoc};

    const UBUNTU_OS_RELEASE: &str = indoc! {r#"
        PRETTY_NAME="Ubuntu 22.04.4 LTS"
        NAME="Ubuntu"
        VERSION_ID="22.04"
        VERSION="22.04.4 LTS (Jammy Jellyfish)"
        VERSION_CODENAME=jammy
        ID=ubuntu
        ID_LIKE=debian
        UBUNTU_CODENAME=jammy
    "#};

    #[test]
    fn parse_quoting() {
        let fields = parse_assignments(indoc! {r#"
            # comment
            A="quoted value"
            B='single'
            C=bare
            D="esc\"aped"
            garbage
        "#});

        assert_eq!(fields.get("A").unwrap(), "quoted value");
        assert_eq!(fields.get("B").unwrap(), "single");
        assert_eq!(fields.get("C").unwrap(), "bare");
        assert_eq!(fields.get("D").unwrap(), "esc\"aped");
        assert_eq!(fields.len(), 4);
    }

    #[test]
    fn os_release() {
        let info = DistroInfo::from_os_release(UBUNTU_OS_RELEASE).unwrap();
        assert_eq!(info.id, "ubuntu");
        assert_eq!(info.codename, "jammy");

        let mint = DistroInfo::from_os_release(indoc! {"
            ID=linuxmint
            VERSION_CODENAME=virginia
            UBUNTU_CODENAME=jammy
        "})
        .unwrap();
        assert_eq!(mint.codename, "jammy");

        let debian = DistroInfo::from_os_release("ID=debian\nVERSION_CODENAME=bookworm\n").unwrap();
        assert_eq!(debian.codename, "bookworm");

        assert!(DistroInfo::from_os_release("ID=debian\nVERSION_CODENAME=\n").is_none());
    }

    #[test]
    fn detect_falls_back_to_lsb_release() -> Result<()> {
        let td = tempfile::tempdir()?;
        std::fs::create_dir_all(td.path().join("etc"))?;

        assert!(matches!(
            DistroInfo::detect(td.path()),
            Err(CodenameError::DistroCodenameUnknown)
        ));

        std::fs::write(
            td.path().join("etc/lsb-release"),
            "DISTRIB_ID=Ubuntu\nDISTRIB_CODENAME=bionic\n",
        )?;
        let info = DistroInfo::detect(td.path())?;
        assert_eq!(info.id, "ubuntu");
        assert_eq!(info.codename, "bionic");

        std::fs::write(td.path().join("etc/os-release"), UBUNTU_OS_RELEASE)?;
        assert_eq!(DistroInfo::detect(td.path())?.codename, "jammy");

        Ok(())
    }
}
