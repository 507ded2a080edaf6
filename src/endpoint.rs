// src/endpoint.rs
//
// Where HTML comes from and where BBCode goes.

use std::fmt;
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use crate::error::{SinkError, SourceError};

/// Name of the default output file, written next to the input.
pub const DEFAULT_OUTPUT_NAME: &str = "output.bbcode";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    File(PathBuf),
    Stdin,
}

impl Source {
    /// `-` means standard input.
    pub fn from_arg(path: &Path) -> Self {
        if path.as_os_str() == "-" {
            Source::Stdin
        } else {
            Source::File(path.to_path_buf())
        }
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            Source::File(path) => Some(path),
            Source::Stdin => None,
        }
    }

    pub fn read(&self) -> Result<String, SourceError> {
        match self {
            Source::File(path) => {
                if !path.exists() {
                    return Err(SourceError::NotFound { path: path.clone() });
                }
                fs::read_to_string(path).map_err(|source| SourceError::Read {
                    path: path.clone(),
                    source,
                })
            }
            Source::Stdin => {
                let mut buf = String::new();
                io::stdin()
                    .read_to_string(&mut buf)
                    .map_err(SourceError::Stdin)?;
                Ok(buf)
            }
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::File(path) => write!(f, "{}", path.display()),
            Source::Stdin => f.write_str("<stdin>"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sink {
    File(PathBuf),
    Stdout,
}

impl Sink {
    /// `-` means standard output.
    pub fn from_arg(path: &Path) -> Self {
        if path.as_os_str() == "-" {
            Sink::Stdout
        } else {
            Sink::File(path.to_path_buf())
        }
    }

    /// `output.bbcode` beside a file input; standard output for stdin.
    pub fn default_for(source: &Source) -> Self {
        match source {
            Source::File(path) => {
                let dir = path.parent().unwrap_or_else(|| Path::new(""));
                Sink::File(dir.join(DEFAULT_OUTPUT_NAME))
            }
            Source::Stdin => Sink::Stdout,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            Sink::File(path) => Some(path),
            Sink::Stdout => None,
        }
    }

    pub fn write(&self, text: &str) -> Result<(), SinkError> {
        match self {
            Sink::File(path) => {
                let write_err = |source| SinkError::Write {
                    path: path.clone(),
                    source,
                };
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    fs::create_dir_all(parent).map_err(write_err)?;
                }
                fs::write(path, text).map_err(write_err)
            }
            Sink::Stdout => {
                let mut out = io::stdout().lock();
                writeln!(out, "{text}")
                    .and_then(|()| out.flush())
                    .map_err(SinkError::Stdout)
            }
        }
    }
}

impl fmt::Display for Sink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sink::File(path) => write!(f, "{}", path.display()),
            Sink::Stdout => f.write_str("<stdout>"),
        }
    }
}
