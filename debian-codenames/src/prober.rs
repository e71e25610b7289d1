// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Discovery of the distributions a repository server offers.

Given a repository base URL, [RemoteProber] first tries to read a directory
listing of `dists/`. If the server doesn't provide one, it falls back to
*probing*: requesting well-known release metadata files (`InRelease`,
`Release`, `Release.gpg`) for every candidate codename newer than the one in
use.

A non-200 answer, including a transport failure, means "not present". Nothing
is retried.

Results are memoized for the lifetime of the prober. Directory listings are
cached per URL. Probe results are cached per URL and starting codename; a
probe also records results for each candidate it walked past, so a later
source on the same server starting at one of those candidates reuses them.
*/

use {
    crate::{
        catalog::CodenameCatalog,
        http::{UrlFetcher, STATUS_OK},
        listing::listing_candidates,
        matcher::MatchFilter,
        sources_list::SourceRecord,
    },
    log::{debug, trace},
    std::collections::HashMap,
};

/// Release metadata files requested when probing, in request order.
pub const RELEASE_FILENAMES: &[&str; 3] = &["InRelease", "Release", "Release.gpg"];

/// Number of newest codenames probed when the current codename is unknown.
pub const FALLBACK_PROBE_COUNT: usize = 10;

/// Callback receiving [ProbeEvent].
pub type ProgressCallback = Box<dyn Fn(ProbeEvent) + Sync>;

/// Events emitted while discovering distributions.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ProbeEvent {
    /// A directory listing was unavailable or empty at the given URL.
    ListingUnavailable(String),

    /// Probing of the given URL is starting with this many candidates.
    ProbeBegin(String, usize),

    /// A probe result was served from the cache.
    ProbeCached(String),

    /// A request for the given URL is being issued.
    ProbeRequest(String),

    /// The given codename was found to exist.
    ProbeFound(String),

    /// Probing finished, having found this many codenames.
    ProbeEnd(usize),
}

impl std::fmt::Display for ProbeEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ListingUnavailable(url) => write!(f, "no directory listing at {}", url),
            Self::ProbeBegin(url, count) => {
                write!(f, "probing {} candidates under {}", count, url)
            }
            Self::ProbeCached(key) => write!(f, "reusing probe results for {}", key),
            Self::ProbeRequest(url) => write!(f, "requesting {}", url),
            Self::ProbeFound(codename) => write!(f, "found {}", codename),
            Self::ProbeEnd(count) => write!(f, "probing found {} codenames", count),
        }
    }
}

/// Cached outcome of fetching a directory listing.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DirectoryListing {
    /// The listing could not be fetched.
    Unavailable,
    /// Candidate distribution names found on the listing page.
    Entries(Vec<String>),
}

/// How codenames were discovered.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DiscoveryMethod {
    /// From a directory listing.
    Listing,
    /// By probing release files.
    Probing,
}

/// Codenames found on a repository server.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Discovery {
    pub method: DiscoveryMethod,
    pub codenames: Vec<String>,
}

/// Result of checking a single outdated source.
#[derive(Clone, Debug)]
pub struct SourceCheck<'s> {
    /// The source that was checked.
    pub source: &'s SourceRecord,
    /// What the server offers.
    pub discovery: Discovery,
    /// Discovered codenames that are newer than the source's.
    pub better: Vec<String>,
}

/// Replace the first catalog codename found in `current` with `new`.
///
/// The first codename in catalog order that occurs anywhere in `current` is
/// used and every occurrence of it is replaced. If `current` contains no known
/// codename, `new` is returned as is.
pub fn mutate_codename(catalog: &CodenameCatalog, current: &str, new: &str) -> String {
    match catalog.first_contained_in(current) {
        Some(codename) => current.replace(codename, new),
        None => new.to_string(),
    }
}

/// Codenames to probe for a source currently at `current`.
///
/// Every codename after `current` in catalog order, or the newest
/// [FALLBACK_PROBE_COUNT] codenames if `current` isn't in the catalog.
pub fn get_probing_test_set(catalog: &CodenameCatalog, current: &str) -> Vec<String> {
    catalog
        .codenames_after(current)
        .unwrap_or_else(|| catalog.newest(FALLBACK_PROBE_COUNT))
        .into_iter()
        .map(|s| s.to_string())
        .collect()
}

fn probe_cache_key(url: &str, codename: &str) -> String {
    format!("{}|{}", url, codename)
}

fn emit(progress_cb: &Option<ProgressCallback>, event: ProbeEvent) {
    if let Some(cb) = progress_cb {
        cb(event);
    }
}

/// Discovers distributions on repository servers.
///
/// Instances own their caches, so all sources checked through the same
/// instance share network results.
pub struct RemoteProber<'c, F: UrlFetcher> {
    catalog: &'c CodenameCatalog,
    fetcher: F,
    fetch_cache: HashMap<String, DirectoryListing>,
    probe_cache: HashMap<String, Vec<String>>,
}

impl<'c, F: UrlFetcher> RemoteProber<'c, F> {
    /// Construct an instance with empty caches.
    pub fn new(catalog: &'c CodenameCatalog, fetcher: F) -> Self {
        Self {
            catalog,
            fetcher,
            fetch_cache: HashMap::new(),
            probe_cache: HashMap::new(),
        }
    }

    /// The fetcher performing requests.
    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Obtain the cached directory listing for a URL.
    pub fn cached_listing(&self, url: &str) -> Option<&DirectoryListing> {
        self.fetch_cache.get(url)
    }

    /// Obtain cached probe results for a URL and starting codename.
    pub fn cached_probe(&self, url: &str, codename: &str) -> Option<&[String]> {
        self.probe_cache
            .get(&probe_cache_key(url, codename))
            .map(|v| v.as_slice())
    }

    /// Fetch a directory listing and extract candidate distribution names.
    ///
    /// Each URL is fetched at most once.
    pub async fn try_fetch_dirlisting(&mut self, url: &str) -> DirectoryListing {
        if let Some(listing) = self.fetch_cache.get(url) {
            trace!("directory listing cache hit for {}", url);
            return listing.clone();
        }

        debug!("fetching directory listing {}", url);

        let listing = match self.fetcher.get_text(url).await {
            Ok(res) if res.is_ok() => DirectoryListing::Entries(listing_candidates(
                res.body.as_deref().unwrap_or_default(),
                self.catalog,
            )),
            Ok(res) => {
                debug!("directory listing {} returned HTTP {}", url, res.status);
                DirectoryListing::Unavailable
            }
            Err(e) => {
                debug!("directory listing {} failed: {}", url, e);
                DirectoryListing::Unavailable
            }
        };

        self.fetch_cache.insert(url.to_string(), listing.clone());

        listing
    }

    /// Probe for codenames newer than `current` under `url`.
    ///
    /// Returns the mutated distribution names for which a release file exists,
    /// in probe order.
    pub async fn try_url_probing(
        &mut self,
        url: &str,
        current: &str,
        progress_cb: &Option<ProgressCallback>,
    ) -> Vec<String> {
        let key = probe_cache_key(url, current);

        if let Some(found) = self.probe_cache.get(&key) {
            trace!("probe cache hit for {}", key);
            emit(progress_cb, ProbeEvent::ProbeCached(key));
            return found.clone();
        }

        let test_set = get_probing_test_set(self.catalog, current);
        emit(
            progress_cb,
            ProbeEvent::ProbeBegin(url.to_string(), test_set.len()),
        );

        // (candidate, mutated, reachable)
        let mut walked: Vec<(String, String, bool)> = Vec::with_capacity(test_set.len());

        for candidate in test_set {
            let mutated = mutate_codename(self.catalog, current, &candidate);
            let mut reachable = false;

            for filename in RELEASE_FILENAMES {
                let try_url = format!("{}/{}/{}", url, mutated, filename);
                debug!("probing {}", try_url);
                emit(progress_cb, ProbeEvent::ProbeRequest(try_url.clone()));

                match self.fetcher.get_status(&try_url).await {
                    Ok(STATUS_OK) => {
                        reachable = true;
                        break;
                    }
                    Ok(status) => trace!("{} returned HTTP {}", try_url, status),
                    Err(e) => debug!("{} failed: {}", try_url, e),
                }
            }

            if reachable {
                emit(progress_cb, ProbeEvent::ProbeFound(mutated.clone()));
            }

            walked.push((candidate, mutated, reachable));
        }

        // A fresh probe starting at a walked candidate would test exactly the
        // candidates after it. That only holds when the candidate was probed
        // under its bare name.
        for (i, (candidate, mutated, _)) in walked.iter().enumerate() {
            if candidate != mutated {
                continue;
            }

            let found_after = walked[i + 1..]
                .iter()
                .filter(|(_, _, reachable)| *reachable)
                .map(|(_, mutated, _)| mutated.clone())
                .collect::<Vec<_>>();

            self.probe_cache
                .entry(probe_cache_key(url, candidate))
                .or_insert(found_after);
        }

        let found = walked
            .into_iter()
            .filter(|(_, _, reachable)| *reachable)
            .map(|(_, mutated, _)| mutated)
            .collect::<Vec<_>>();

        emit(progress_cb, ProbeEvent::ProbeEnd(found.len()));
        self.probe_cache.insert(key, found.clone());

        found
    }

    /// Discover the distributions offered by the repository at `uri`.
    ///
    /// `dist` is the distribution the source currently uses.
    pub async fn discover(
        &mut self,
        uri: &str,
        dist: &str,
        progress_cb: &Option<ProgressCallback>,
    ) -> Discovery {
        let test_url = format!("{}/dists", uri.trim_end_matches('/'));

        match self.try_fetch_dirlisting(&test_url).await {
            DirectoryListing::Entries(codenames) if !codenames.is_empty() => Discovery {
                method: DiscoveryMethod::Listing,
                codenames,
            },
            _ => {
                emit(
                    progress_cb,
                    ProbeEvent::ListingUnavailable(test_url.clone()),
                );

                Discovery {
                    method: DiscoveryMethod::Probing,
                    codenames: self.try_url_probing(&test_url, dist, progress_cb).await,
                }
            }
        }
    }

    /// Discover distributions for a source and select the better matches.
    pub async fn check_source<'s>(
        &mut self,
        source: &'s SourceRecord,
        filter: &MatchFilter<'_>,
        progress_cb: &Option<ProgressCallback>,
    ) -> SourceCheck<'s> {
        let discovery = self.discover(source.base_uri(), &source.dist, progress_cb).await;
        let better = filter.filter_better_matches(&discovery.codenames, &source.dist);

        SourceCheck {
            source,
            discovery,
            better,
        }
    }
}
