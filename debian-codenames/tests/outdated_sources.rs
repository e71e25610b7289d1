// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use {
    debian_codenames::{
        catalog::CodenameCatalog,
        detector::OutdatedDetector,
        distro::DistroInfo,
        error::Result,
        http::MemoryFetcher,
        matcher::MatchFilter,
        prober::{DiscoveryMethod, RemoteProber},
        sources_list::SourcesList,
    },
    indoc::indoc,
    std::path::Path,
};

fn write(root: &Path, rel: &str, data: &str) -> Result<()> {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, data)?;

    Ok(())
}

#[tokio::test]
async fn trusty_source_on_bionic() -> Result<()> {
    let td = tempfile::tempdir()?;
    let root = td.path();

    write(
        root,
        "etc/os-release",
        "ID=ubuntu\nVERSION_CODENAME=bionic\nUBUNTU_CODENAME=bionic\n",
    )?;
    write(
        root,
        "etc/apt/sources.list",
        indoc! {"
            deb http://archive.ubuntu.com/ubuntu bionic main restricted
            deb http://archive.ubuntu.com/ubuntu bionic-updates main restricted
        "},
    )?;
    write(
        root,
        "etc/apt/sources.list.d/vendor.list",
        "deb [arch=amd64] http://apt.vendor.example/ubuntu/ trusty main\n",
    )?;
    write(
        root,
        "etc/apt/sources.list.d/rolling.sources",
        indoc! {"
            Types: deb
            URIs: http://rolling.example/debian
            Suites: stable
            Components: main
        "},
    )?;

    let catalog = CodenameCatalog::builtin()?;
    let distro = DistroInfo::detect(root)?;
    let detector = OutdatedDetector::new(&catalog, &distro.codename)?;

    let sources = SourcesList::load(root)?;
    let classification = detector.classify(sources.iter());
    assert_eq!(classification.valid, 4);
    assert_eq!(classification.outdated.len(), 1);

    let source = classification.outdated[0];
    assert_eq!(source.dist, "trusty");
    assert_eq!(source.file_name(), "vendor.list");

    let fetcher = MemoryFetcher::default().with_ok(
        "http://apt.vendor.example/ubuntu/dists",
        r#"<a href="../">Parent</a><a href="bionic/">bionic/</a><a href="cosmic/">cosmic/</a>"#,
    );
    let mut prober = RemoteProber::new(&catalog, fetcher);
    let filter = MatchFilter::new(&catalog);

    let check = prober.check_source(source, &filter, &None).await;
    assert_eq!(check.discovery.method, DiscoveryMethod::Listing);
    assert_eq!(check.better, vec!["bionic", "cosmic"]);
    assert_eq!(prober.fetcher().requests().len(), 1);

    Ok(())
}
