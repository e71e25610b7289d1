// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use {
    crate::{
        config::{CheckConfig, DEFAULT_TIMEOUT_SECONDS},
        output::ConsoleOutput,
    },
    clap::{Arg, ArgMatches, Command},
    debian_codenames::{
        detector::OutdatedDetector,
        distro::DistroInfo,
        error::CodenameError,
        http::{HttpFetcher, UrlFetcher},
        matcher::MatchFilter,
        prober::RemoteProber,
        sources_list::{SourceRecord, SourcesList},
    },
    log::{debug, LevelFilter},
    std::{
        path::{Path, PathBuf},
        time::Duration,
    },
    termcolor::{ColorChoice, WriteColor},
    thiserror::Error,
};

const ABOUT: &str = "\
Find APT sources referring to outdated distribution releases.

After a distribution upgrade, third party package sources are often left
pointing at the previous release. This tool compares every enabled source
against the running release codename and, for each source that doesn't
mention it, asks the repository server which newer distributions it offers.

Servers are queried for a directory listing of `dists/` first. If none is
available, release files (`InRelease`, `Release`, `Release.gpg`) of each
newer codename are requested instead.

# YAML Configuration

A YAML file passed via `--config` may define the following keys:

always_ok (optional) (list[string])
   Additional distributions that are never considered outdated.

ignore (optional) (list[string])
   Additional distributions never suggested as better options.

families (optional) (map[string, map[string, string]])
   Additional releases, keyed by family name and then by `YYYY-MM-DD`
   release date. Releases for `debian` or `ubuntu` extend the built-in
   database. Other family names define a new family.

timeout_seconds (optional) (int)
   Per-request timeout. 0 disables the timeout.

sources_root (optional) (string)
   Filesystem root containing `etc/apt`.

Command line arguments take precedence over configuration values.
";

#[derive(Debug, Error)]
pub enum CheckError {
    #[error("argument parsing error: {0:?}")]
    Clap(#[from] clap::Error),

    #[error("{0}")]
    Codename(#[from] CodenameError),

    #[error("I/O error: {0:?}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0:?}")]
    SerdeYaml(#[from] serde_yaml::Error),

    #[error("invalid value for --{0}: {1}")]
    InvalidArgument(&'static str, String),
}

pub type Result<T> = std::result::Result<T, CheckError>;

fn init_logging(matches: &ArgMatches) {
    let log_level = match matches.occurrences_of("verbose") {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    let mut builder = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(log_level.as_str()),
    );

    // Disable log context except at higher log levels.
    if log_level <= LevelFilter::Info {
        builder
            .format_timestamp(None)
            .format_level(false)
            .format_target(false);
    }

    // This spews unwanted output at default level. Nerf it by default.
    if log_level == LevelFilter::Info {
        builder.filter_module("rustls", LevelFilter::Error);
    }

    builder.init();
}

fn color_choice(matches: &ArgMatches) -> ColorChoice {
    match matches.value_of("color") {
        Some("always") => ColorChoice::Always,
        Some("never") => ColorChoice::Never,
        // termcolor doesn't check whether stdout is a terminal.
        _ if atty::is(atty::Stream::Stdout) => ColorChoice::Auto,
        _ => ColorChoice::Never,
    }
}

fn timeout(matches: &ArgMatches, config: &CheckConfig) -> Result<Option<Duration>> {
    let seconds = match matches.value_of("timeout") {
        Some(value) => value
            .parse::<u64>()
            .map_err(|e| CheckError::InvalidArgument("timeout", format!("{}: {}", value, e)))?,
        None => config.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECONDS),
    };

    Ok(if seconds == 0 {
        None
    } else {
        Some(Duration::from_secs(seconds))
    })
}

fn app() -> Command<'static> {
    let app = Command::new("apt-urlcheck")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Gregory Szorc <gregory.szorc@gmail.com>")
        .about("Find APT sources referring to outdated distribution releases")
        .long_about(ABOUT);

    let app = app.arg(
        Arg::new("verbose")
            .long("verbose")
            .short('v')
            .global(true)
            .multiple_occurrences(true)
            .help("Increase logging verbosity. Can be specified multiple times."),
    );

    app.arg(
        Arg::new("config")
            .long("config")
            .takes_value(true)
            .allow_invalid_utf8(true)
            .help("Path to a YAML configuration file"),
    )
    .arg(
        Arg::new("root")
            .long("root")
            .takes_value(true)
            .allow_invalid_utf8(true)
            .help("Filesystem root to read APT and distribution configuration from"),
    )
    .arg(
        Arg::new("codename")
            .long("codename")
            .takes_value(true)
            .help("Running release codename, overriding detection"),
    )
    .arg(
        Arg::new("timeout")
            .long("timeout")
            .takes_value(true)
            .help("Per-request timeout in seconds (0 disables)"),
    )
    .arg(
        Arg::new("allow")
            .long("allow")
            .takes_value(true)
            .multiple_occurrences(true)
            .help("Distribution that is never considered outdated"),
    )
    .arg(
        Arg::new("ignore")
            .long("ignore")
            .takes_value(true)
            .multiple_occurrences(true)
            .help("Distribution that is never suggested as a better option"),
    )
    .arg(
        Arg::new("color")
            .long("color")
            .takes_value(true)
            .possible_values(["auto", "always", "never"])
            .default_value("auto")
            .help("When to colorize output"),
    )
    .arg(
        Arg::new("no-probe")
            .long("no-probe")
            .help("Only list possibly outdated sources; don't contact servers"),
    )
    .arg(
        Arg::new("list-codenames")
            .long("list-codenames")
            .help("Print the codename database and exit"),
    )
}

pub async fn run_cli() -> Result<()> {
    let matches = app().get_matches();

    init_logging(&matches);

    let config = match matches.value_of_os("config") {
        Some(path) => CheckConfig::from_path(Path::new(path))?,
        None => CheckConfig::default(),
    };

    let mut out = ConsoleOutput::stdout(color_choice(&matches));

    let catalog = config.catalog()?;

    if matches.is_present("list-codenames") {
        return out.catalog(&catalog);
    }

    let root = matches
        .value_of_os("root")
        .map(PathBuf::from)
        .or_else(|| config.sources_root.clone())
        .unwrap_or_else(|| PathBuf::from("/"));

    let codename = match matches.value_of("codename") {
        Some(codename) => codename.to_string(),
        None => DistroInfo::detect(&root)?.codename,
    };

    out.running_codename(&codename)?;

    let mut detector = OutdatedDetector::new(&catalog, &codename)?;
    detector.allow(&config.always_ok);
    detector.allow(matches.values_of("allow").into_iter().flatten());

    out.begin("Loading sources...")?;
    let sources = SourcesList::load(&root)?;
    let classification = detector.classify(sources.iter());
    out.end_ok()?;
    out.source_summary(classification.valid, classification.outdated.len())?;

    if matches.is_present("no-probe") {
        for source in &classification.outdated {
            out.outdated_source(source)?;
        }

        return Ok(());
    }

    let mut filter = MatchFilter::new(&catalog);
    filter.ignore(&config.ignore);
    filter.ignore(matches.values_of("ignore").into_iter().flatten());

    let fetcher = HttpFetcher::new(timeout(&matches, &config)?)?;
    let mut prober = RemoteProber::new(&catalog, fetcher);

    check_sources(&mut out, &mut prober, &filter, &classification.outdated).await
}

/// Query servers of outdated sources and report better options.
async fn check_sources<W: WriteColor, F: UrlFetcher>(
    out: &mut ConsoleOutput<W>,
    prober: &mut RemoteProber<'_, F>,
    filter: &MatchFilter<'_>,
    outdated: &[&SourceRecord],
) -> Result<()> {
    let progress_cb = out.progress_callback();

    for source in outdated {
        out.outdated_source(source)?;

        if !source.is_http() {
            debug!("{}: not probing {}", source.file_name(), source.uri);
            out.not_http(source)?;
            continue;
        }

        let check = prober.check_source(source, filter, &progress_cb).await;
        debug!(
            "{}: {} codenames found via {:?}",
            source.uri,
            check.discovery.codenames.len(),
            check.discovery.method
        );

        out.better_options(&check.better)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        debian_codenames::{catalog::CodenameCatalog, http::MemoryFetcher},
        indoc::indoc,
        termcolor::NoColor,
    };

    const SOURCES: &str = indoc! {"
        deb http://archive.ubuntu.com/ubuntu bionic main
        deb http://ppa.example.com/tool/ubuntu trusty main
        deb http://ppa.example.com/tool/ubuntu trusty-extra main
        deb http://probe.example.com/apt trusty main
        deb file:/srv/local-mirror xenial main
        deb http://apt.example.com/repo stable main
    "};

    #[tokio::test]
    async fn report() -> Result<()> {
        let catalog = CodenameCatalog::builtin()?;
        let detector = OutdatedDetector::new(&catalog, "bionic")?;
        let sources = SourcesList::from_one_line_str(Path::new("/etc/apt/sources.list"), SOURCES);
        let classification = detector.classify(sources.iter());
        assert_eq!(classification.valid, 6);
        assert_eq!(classification.outdated.len(), 4);

        let fetcher = MemoryFetcher::default()
            .with_ok(
                "http://ppa.example.com/tool/ubuntu/dists",
                r#"<a href="bionic/">bionic/</a> <a href="cosmic/">cosmic/</a>"#,
            )
            .with_ok("http://probe.example.com/apt/dists/noble/Release", "");
        let mut prober = RemoteProber::new(&catalog, fetcher);
        let filter = MatchFilter::new(&catalog);
        let mut out = ConsoleOutput::new(NoColor::new(vec![]));

        check_sources(&mut out, &mut prober, &filter, &classification.outdated).await?;

        let text = String::from_utf8_lossy(&out.into_inner().into_inner()).to_string();
        assert_eq!(
            text,
            indoc! {"
                sources.list: Outdated codename: trusty
                Possibly better options: bionic, cosmic
                sources.list: Outdated codename: trusty-extra
                No better match(es) found at the moment.
                sources.list: Outdated codename: trusty
                Possibly better options: noble
                sources.list: Outdated codename: xenial
                Not an HTTP repository (file:/srv/local-mirror); skipped.
            "}
        );

        // Both entries of the first server share a single listing request.
        let fetcher = prober.fetcher();
        assert_eq!(
            fetcher.request_count("http://ppa.example.com/tool/ubuntu/dists"),
            1
        );
        assert!(fetcher
            .requests()
            .iter()
            .all(|url| !url.starts_with("file:")));

        Ok(())
    }

    #[test]
    fn verify_cli() {
        app().debug_assert();
    }
}
