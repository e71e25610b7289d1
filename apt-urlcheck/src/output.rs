// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Terminal presentation. */

use {
    crate::cli::Result,
    debian_codenames::{
        catalog::CodenameCatalog,
        prober::{ProbeEvent, ProgressCallback},
        sources_list::SourceRecord,
    },
    log::debug,
    std::io::Write,
    termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor},
};

/// Text printed for a probe event, if any.
fn progress_text(event: &ProbeEvent) -> Option<&'static str> {
    match event {
        ProbeEvent::ListingUnavailable(_) => Some("Listing failed. Probing"),
        ProbeEvent::ProbeRequest(_) => Some("."),
        ProbeEvent::ProbeCached(_) | ProbeEvent::ProbeEnd(_) => Some(" OK\n"),
        ProbeEvent::ProbeBegin(..) | ProbeEvent::ProbeFound(_) => None,
    }
}

fn write_progress(writer: &mut impl Write, event: &ProbeEvent) -> std::io::Result<()> {
    if let Some(text) = progress_text(event) {
        writer.write_all(text.as_bytes())?;
        writer.flush()?;
    }

    Ok(())
}

/// Writes the report, colorizing where the stream allows.
pub struct ConsoleOutput<W: WriteColor> {
    stream: W,
    live_progress: bool,
}

impl ConsoleOutput<StandardStream> {
    /// Write to standard output.
    pub fn stdout(choice: ColorChoice) -> Self {
        Self {
            stream: StandardStream::stdout(choice),
            live_progress: true,
        }
    }
}

impl<W: WriteColor> ConsoleOutput<W> {
    /// Write to an arbitrary stream. No live progress is emitted.
    pub fn new(stream: W) -> Self {
        Self {
            stream,
            live_progress: false,
        }
    }

    /// Obtain the underlying stream.
    pub fn into_inner(self) -> W {
        self.stream
    }

    fn colored(&mut self, spec: &ColorSpec, text: &str) -> Result<()> {
        self.stream.set_color(spec)?;
        write!(&mut self.stream, "{}", text)?;
        self.stream.reset()?;

        Ok(())
    }

    fn fg(&mut self, color: Color, text: &str) -> Result<()> {
        self.colored(ColorSpec::new().set_fg(Some(color)), text)
    }

    /// Start a line that is completed later.
    pub fn begin(&mut self, message: &str) -> Result<()> {
        write!(&mut self.stream, "{}", message)?;
        self.stream.flush()?;

        Ok(())
    }

    /// Complete a line started with [Self::begin()].
    pub fn end_ok(&mut self) -> Result<()> {
        writeln!(&mut self.stream, " OK")?;

        Ok(())
    }

    /// Callback reporting probe progress on standard output.
    ///
    /// Prints a dot for every probe request.
    pub fn progress_callback(&self) -> Option<ProgressCallback> {
        if !self.live_progress {
            return None;
        }

        Some(Box::new(|event: ProbeEvent| {
            if let Err(e) = write_progress(&mut std::io::stdout(), &event) {
                debug!("unable to write progress for {}: {}", event, e);
            }
        }))
    }

    pub fn running_codename(&mut self, codename: &str) -> Result<()> {
        write!(&mut self.stream, "This is ")?;
        self.fg(Color::Yellow, codename)?;
        writeln!(&mut self.stream, ".")?;

        Ok(())
    }

    pub fn source_summary(&mut self, valid: usize, outdated: usize) -> Result<()> {
        writeln!(
            &mut self.stream,
            "Found {} sources with {} possibly outdated.",
            valid, outdated
        )?;

        Ok(())
    }

    pub fn outdated_source(&mut self, source: &SourceRecord) -> Result<()> {
        self.fg(Color::Cyan, &source.file_name())?;
        write!(&mut self.stream, ": Outdated codename: ")?;
        self.fg(Color::Red, &source.dist)?;
        writeln!(&mut self.stream)?;

        Ok(())
    }

    pub fn not_http(&mut self, source: &SourceRecord) -> Result<()> {
        self.colored(
            ColorSpec::new().set_dimmed(true),
            &format!("Not an HTTP repository ({}); skipped.", source.uri),
        )?;
        writeln!(&mut self.stream)?;

        Ok(())
    }

    /// Report the better matches for a source.
    pub fn better_options(&mut self, better: &[String]) -> Result<()> {
        if better.is_empty() {
            self.colored(
                ColorSpec::new().set_dimmed(true),
                "No better match(es) found at the moment.",
            )?;
            writeln!(&mut self.stream)?;

            return Ok(());
        }

        write!(&mut self.stream, "Possibly better options: ")?;
        for (i, option) in better.iter().enumerate() {
            if i > 0 {
                write!(&mut self.stream, ", ")?;
            }
            self.fg(Color::Green, option)?;
        }
        writeln!(&mut self.stream)?;

        Ok(())
    }

    /// Print every catalog entry, oldest first.
    pub fn catalog(&mut self, catalog: &CodenameCatalog) -> Result<()> {
        for entry in catalog.iter_entries() {
            write!(&mut self.stream, "{}  {:<8} ", entry.date, entry.family)?;
            self.fg(Color::Yellow, &entry.codename)?;
            writeln!(&mut self.stream)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use {super::*, termcolor::NoColor};

    fn text(out: ConsoleOutput<NoColor<Vec<u8>>>) -> String {
        String::from_utf8_lossy(&out.into_inner().into_inner()).to_string()
    }

    #[test]
    fn better_options() -> Result<()> {
        let mut out = ConsoleOutput::new(NoColor::new(vec![]));
        out.better_options(&["jammy".to_string(), "noble".to_string()])?;
        out.better_options(&[])?;

        assert_eq!(
            text(out),
            "Possibly better options: jammy, noble\nNo better match(es) found at the moment.\n"
        );

        Ok(())
    }

    #[test]
    fn live_progress() -> Result<()> {
        assert!(ConsoleOutput::stdout(ColorChoice::Never)
            .progress_callback()
            .is_some());

        let url = "http://ppa.example.com/ubuntu/dists/jammy/InRelease";
        let events = [
            ProbeEvent::ListingUnavailable("http://ppa.example.com/ubuntu/dists".into()),
            ProbeEvent::ProbeBegin("http://ppa.example.com/ubuntu/dists".into(), 3),
            ProbeEvent::ProbeRequest(url.into()),
            ProbeEvent::ProbeFound("jammy".into()),
            ProbeEvent::ProbeRequest(url.into()),
            ProbeEvent::ProbeEnd(1),
            ProbeEvent::ProbeCached("http://ppa.example.com/ubuntu/dists".into()),
        ];

        let mut buffer = vec![];
        for event in &events {
            write_progress(&mut buffer, event)?;
        }

        assert_eq!(
            String::from_utf8_lossy(&buffer),
            "Listing failed. Probing.. OK\n OK\n"
        );

        Ok(())
    }

    #[test]
    fn header() -> Result<()> {
        let mut out = ConsoleOutput::new(NoColor::new(vec![]));
        assert!(out.progress_callback().is_none());

        out.running_codename("jammy")?;
        out.begin("Loading sources...")?;
        out.end_ok()?;
        out.source_summary(12, 2)?;

        assert_eq!(
            text(out),
            "This is jammy.\nLoading sources... OK\nFound 12 sources with 2 possibly outdated.\n"
        );

        Ok(())
    }
}
