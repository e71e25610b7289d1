// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Debian and Ubuntu release codenames and APT source freshness.

After a distribution upgrade, third party APT sources are commonly left
pointing at the previous release (e.g. a PPA still configured for `focal`
on a `jammy` system). This crate finds such sources and determines which
newer distributions their repository servers actually offer.

# A Tour of Functionality

The [catalog] module holds the database of release codenames.
[catalog::CodenameFamily] is the release history of one distribution (e.g.
Debian or Ubuntu) and [catalog::CodenameCatalog] merges families into a
single list ordered by release date, which is used to answer questions like
*which codenames came after `bionic`?*

The [distro] module determines the running distribution from `os-release(5)`
or `lsb-release` files. See [distro::DistroInfo].

APT sources are read by the [sources_list] module. Both the one-line format
(`sources.list`) and the deb822 format (`*.sources`) are supported. The latter
is parsed with the [control] module, which implements Debian control file
paragraphs. [sources_list::SourcesList::load()] reads everything APT would
read under a given filesystem root.

[detector::OutdatedDetector] classifies sources as current or *possibly
outdated* relative to the running release.

For each possibly outdated source, [prober::RemoteProber] asks the repository
server which distributions it has. It first scrapes the `dists/` directory
listing (see [listing]) and falls back to probing for release files of each
newer codename. Results are cached so sources sharing a server don't repeat
requests. Network I/O goes through the [http::UrlFetcher] trait.
[matcher::MatchFilter] finally reduces the discovered distributions to those
newer than what the source uses.

# Crate Features

The optional and enabled-by-default `http` feature enables
[http::HttpFetcher], a [reqwest] based HTTP client.
*/

pub mod catalog;
pub mod control;
pub mod detector;
pub mod distro;
pub mod error;
pub mod http;
pub mod listing;
pub mod matcher;
pub mod prober;
pub mod sources_list;
