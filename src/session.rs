// src/session.rs
//
// One conversion run: read the source, convert, write the sink, report the outcome.

use crate::convert::Converter;
use crate::endpoint::{Sink, Source};
use crate::error::{ConversionError, SourceError};
use crate::report::Reporter;
use crate::rules::RuleTable;

/// One input, one output, one rule table. Each call to [`Session::convert`] reads the
/// source afresh, so it doubles as the reconversion step of watch mode.
pub struct Session<'r> {
    source: Source,
    sink: Sink,
    rules: RuleTable,
    reporter: &'r dyn Reporter,
}

impl<'r> Session<'r> {
    pub fn new(source: Source, sink: Sink, rules: RuleTable, reporter: &'r dyn Reporter) -> Self {
        Self {
            source,
            sink,
            rules,
            reporter,
        }
    }

    pub fn source(&self) -> &Source {
        &self.source
    }

    pub fn sink(&self) -> &Sink {
        &self.sink
    }

    pub fn reporter(&self) -> &'r dyn Reporter {
        self.reporter
    }

    /// Read, convert, write. Nothing is reported.
    pub fn run(&self) -> Result<(), ConversionError> {
        let html = self.source.read()?;
        let bbcode = Converter::new(&self.rules).convert(&html);
        self.sink.write(&bbcode)?;
        log::debug!("{} -> {}", self.source, self.sink);
        Ok(())
    }

    /// [`Session::run`], reporting the outcome. Returns whether it succeeded.
    pub fn convert(&self) -> bool {
        match self.run() {
            Ok(()) => {
                if let Sink::File(path) = &self.sink {
                    self.reporter
                        .success(&format!("Conversion successful! Output: {}", path.display()));
                }
                true
            }
            Err(ConversionError::Source(err @ SourceError::NotFound { .. })) => {
                self.reporter.error(&err.to_string());
                false
            }
            Err(err) => {
                self.reporter.error(&format!("Conversion failed: {err}"));
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{Level, MemoryReporter};
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_convert_writes_output_and_reports_success() {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("main.html");
        let output = temp_dir.path().join("output.bbcode");
        fs::write(&input, "<h1>Hi</h1>\n").unwrap();
        let reporter = MemoryReporter::new();
        let session = Session::new(
            Source::File(input),
            Sink::File(output.clone()),
            RuleTable::default(),
            &reporter,
        );

        assert!(session.convert());

        assert_eq!(fs::read_to_string(&output).unwrap(), "[size=150]Hi[/size]");
        assert!(reporter.contains(Level::Success, "Conversion successful!"));
        assert!(reporter.messages(Level::Error).is_empty());
    }

    #[test]
    fn test_missing_input_is_reported_and_nothing_written() {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("main.html");
        let output = temp_dir.path().join("output.bbcode");
        let reporter = MemoryReporter::new();
        let session = Session::new(
            Source::File(input),
            Sink::File(output.clone()),
            RuleTable::default(),
            &reporter,
        );

        assert!(!session.convert());

        assert!(!output.exists());
        let errors = reporter.messages(Level::Error);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("Input file not found:"));
    }

    #[test]
    fn test_write_failure_is_reported() {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("main.html");
        fs::write(&input, "<b>x</b>").unwrap();
        let reporter = MemoryReporter::new();
        let session = Session::new(
            Source::File(input),
            Sink::File(temp_dir.path().to_path_buf()),
            RuleTable::default(),
            &reporter,
        );

        assert!(!session.convert());

        assert!(reporter.contains(Level::Error, "Conversion failed: Failed to write"));
    }

    #[test]
    fn test_custom_rules_are_used() {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("main.html");
        let output = temp_dir.path().join("output.bbcode");
        fs::write(&input, "<span>x</span>").unwrap();
        let rules = RuleTable::builtin()
            .with_overrides(vec![crate::rules::TagRule::wrap("span", "color")])
            .unwrap();
        let reporter = MemoryReporter::new();
        let session = Session::new(Source::File(input), Sink::File(output.clone()), rules, &reporter);

        assert!(session.convert());

        assert_eq!(fs::read_to_string(&output).unwrap(), "[color]x[/color]");
    }
}
