// src/config.rs
//
// Settings for the binary: `htb.toml` (every key optional, `[[rules]]` entries for
// custom tags) merged under the command-line flags and over the built-in defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::endpoint::{Sink, Source};
use crate::error::{ConfigError, RuleError};
use crate::rules::{OutputKind, RuleTable, TagRule};

pub const DEFAULT_INPUT: &str = "main.html";
pub const DEFAULT_DEBOUNCE_MS: u64 = 250;

/// Contents of `htb.toml`. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub input: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub debounce_ms: Option<u64>,
    pub color: Option<bool>,
    #[serde(default)]
    pub rules: Vec<RuleSpec>,
}

/// A `[[rules]]` entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleSpec {
    pub tag: String,
    pub kind: RuleKind,
    pub target: Option<String>,
    pub size: Option<u16>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RuleKind {
    Wrap,
    ListItem,
    Size,
    Hr,
    Url,
    Image,
}

impl RuleKind {
    fn name(self) -> &'static str {
        match self {
            RuleKind::Wrap => "wrap",
            RuleKind::ListItem => "list-item",
            RuleKind::Size => "size",
            RuleKind::Hr => "hr",
            RuleKind::Url => "url",
            RuleKind::Image => "image",
        }
    }
}

impl RuleSpec {
    pub fn to_rule(&self) -> Result<TagRule, RuleError> {
        let kind_name = self.kind.name();
        let missing = |field| RuleError::MissingField {
            tag: self.tag.clone(),
            kind: kind_name,
            field,
        };
        if self.target.is_some() && self.kind != RuleKind::Wrap {
            return Err(RuleError::UnexpectedField {
                tag: self.tag.clone(),
                kind: kind_name,
                field: "target",
            });
        }
        if self.size.is_some() && self.kind != RuleKind::Size {
            return Err(RuleError::UnexpectedField {
                tag: self.tag.clone(),
                kind: kind_name,
                field: "size",
            });
        }

        let kind = match self.kind {
            RuleKind::Wrap => {
                OutputKind::Wrap(self.target.clone().ok_or_else(|| missing("target"))?)
            }
            RuleKind::Size => OutputKind::Size(self.size.ok_or_else(|| missing("size"))?),
            RuleKind::ListItem => OutputKind::ListItem,
            RuleKind::Hr => OutputKind::Hr,
            RuleKind::Url => OutputKind::Url,
            RuleKind::Image => OutputKind::Image,
        };
        let rule = TagRule::new(self.tag.clone(), kind);
        rule.validate()?;
        Ok(rule)
    }
}

impl FileConfig {
    pub const DEFAULT_FILE_NAME: &'static str = "htb.toml";

    /// `Ok(None)` when there is no file at `config_path`.
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Ok(None);
        }

        let content =
            std::fs::read_to_string(config_path).map_err(|source| ConfigError::Read {
                config_path: config_path.to_path_buf(),
                source,
            })?;

        let config: FileConfig =
            toml::from_str(&content).map_err(|source| ConfigError::Parse {
                config_path: config_path.to_path_buf(),
                source,
            })?;

        // rules are checked here, before any conversion runs
        config.rule_table().map_err(|source| ConfigError::Rule {
            config_path: config_path.to_path_buf(),
            source,
        })?;

        log::debug!(
            "loaded {} with {} custom rule(s)",
            config_path.display(),
            config.rules.len()
        );
        Ok(Some(config))
    }

    /// Like [`FileConfig::load_from_path`] but a missing file is an error.
    pub fn load_required<P: AsRef<Path>>(config_path: P) -> Result<Self, ConfigError> {
        let config_path = config_path.as_ref();
        Self::load_from_path(config_path)?.ok_or_else(|| ConfigError::NotFound {
            config_path: config_path.to_path_buf(),
        })
    }

    /// The built-in table with this file's rules applied.
    pub fn rule_table(&self) -> Result<RuleTable, RuleError> {
        let overrides = self
            .rules
            .iter()
            .map(RuleSpec::to_rule)
            .collect::<Result<Vec<_>, _>>()?;
        RuleTable::builtin().with_overrides(overrides)
    }
}

/// Values given on the command line; they win over the config file.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub input: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub debounce_ms: Option<u64>,
    pub no_color: bool,
    pub once: bool,
    pub no_open: bool,
}

/// Everything the binary needs to run, after merging flags, file and defaults.
#[derive(Debug, Clone)]
pub struct Settings {
    pub source: Source,
    pub sink: Sink,
    pub debounce: Duration,
    pub color: bool,
    /// Keep running and reconvert on change.
    pub watch: bool,
    pub open_dirs: bool,
    pub rules: RuleTable,
}

impl Settings {
    pub fn resolve(overrides: Overrides, file: Option<FileConfig>) -> Result<Self, RuleError> {
        let file = file.unwrap_or_default();

        let input = overrides
            .input
            .or(file.input.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_INPUT));
        let source = Source::from_arg(&input);
        let sink = match overrides.output.or(file.output.clone()) {
            Some(path) => Sink::from_arg(&path),
            None => Sink::default_for(&source),
        };
        let debounce_ms = overrides
            .debounce_ms
            .or(file.debounce_ms)
            .unwrap_or(DEFAULT_DEBOUNCE_MS);
        let color = !overrides.no_color && file.color.unwrap_or(true);
        let watch = !overrides.once && source != Source::Stdin;

        Ok(Settings {
            rules: file.rule_table()?,
            source,
            sink,
            debounce: Duration::from_millis(debounce_ms),
            color,
            watch,
            open_dirs: !overrides.no_open,
        })
    }
}
