// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Scraping of HTTP directory listings.

Many repository servers serve an index page for `dists/`. The anchors on it
reveal which distributions exist without probing each one. The scan is a
permissive pattern match over `<a ... href=...>` tags: markup that doesn't
match simply contributes nothing.
*/

use {crate::catalog::CodenameCatalog, once_cell::sync::Lazy, regex::Regex};

static RE_ANCHOR_HREF: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<a .*?href=['"]?([^'"\s>]+)['"]?.*?>"#).expect("anchor regex is valid")
});

/// Extract raw `href` values from anchor tags, in document order.
pub fn anchor_hrefs(html: &str) -> Vec<&str> {
    RE_ANCHOR_HREF
        .captures_iter(html)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
        .collect()
}

/// Whether an href looks like a relative link to a subdirectory.
fn is_directory_href(href: &str) -> bool {
    href.ends_with('/')
        && href.len() > 1
        && !href.starts_with('?')
        && !href.starts_with('/')
        && !href.starts_with("http")
        && href != "../"
}

/// Obtain candidate distribution names from a directory listing page.
///
/// An href is kept if it is a relative subdirectory link or if it names a
/// known codename, with or without a trailing slash. Trailing slashes are
/// removed. Duplicates are dropped, keeping the first occurrence.
pub fn listing_candidates(html: &str, catalog: &CodenameCatalog) -> Vec<String> {
    let mut candidates: Vec<String> = vec![];

    for href in anchor_hrefs(html) {
        let stripped = href.strip_suffix('/').unwrap_or(href);

        let candidate = if is_directory_href(href) || catalog.contains(stripped) {
            stripped
        } else {
            continue;
        };

        if !candidates.iter().any(|c| c == candidate) {
            candidates.push(candidate.to_string());
        }
    }

    candidates
}

#[cfg(test)]
mod tests {
    use {super::*, crate::error::Result, indoc::indoc};

    const APACHE_INDEX: &str = indoc! {r#"
        <html><head><title>Index of /ubuntu/dists</title></head><body>
        <h1>Index of /ubuntu/dists</h1>
        <table>
        <tr><th><a href="?C=N;O=D">Name</a></th><th><a href="?C=M;O=A">Last modified</a></th></tr>
        <tr><td><a href="/ubuntu/">Parent Directory</a></td></tr>
        <tr><td><a href="../">Up</a></td></tr>
        <tr><td><a href="bionic/">bionic/</a></td></tr>
        <tr><td><a href="cosmic/">cosmic/</a></td></tr>
        <tr><td><a href="cosmic/">cosmic/</a></td></tr>
        <tr><td><a href='jammy-updates/'>jammy-updates/</a></td></tr>
        <tr><td><a href="https://example.com/">elsewhere</a></td></tr>
        <tr><td><a href="README">README</a></td></tr>
        <tr><td><A class="x" HREF=focal>focal</A></td></tr>
        </table></body></html>
    "#};

    #[test]
    fn anchors() {
        let hrefs = anchor_hrefs(APACHE_INDEX);
        assert_eq!(hrefs.len(), 11);
        assert_eq!(hrefs[0], "?C=N;O=D");
        assert_eq!(hrefs[10], "focal");
    }

    #[test]
    fn candidates() -> Result<()> {
        let catalog = CodenameCatalog::builtin()?;

        assert_eq!(
            listing_candidates(APACHE_INDEX, &catalog),
            vec!["bionic", "cosmic", "jammy-updates", "focal"]
        );

        let quoted = r#"<a href="focal">focal</a> <a href="/abs/noble/">x</a> <a href="noble">n</a>"#;
        assert_eq!(listing_candidates(quoted, &catalog), vec!["focal", "noble"]);

        Ok(())
    }

    #[test]
    fn malformed_listing() -> Result<()> {
        let catalog = CodenameCatalog::builtin()?;

        assert!(listing_candidates("", &catalog).is_empty());
        assert!(listing_candidates("<a>no href</a><a href=", &catalog).is_empty());
        assert!(listing_candidates("not html at all", &catalog).is_empty());

        Ok(())
    }
}
