// src/report.rs
//
// User-facing status messages.
//
// The library never prints directly. It reports through a `Reporter`, so the
// binary can colour the console and tests can look at what was said.

use std::cell::RefCell;

use crossterm::style::Stylize;

pub trait Reporter {
    fn info(&self, msg: &str);
    fn success(&self, msg: &str);
    fn error(&self, msg: &str);
}

/// Prints to the terminal: info in blue, success in green, errors in bold red on stderr.
#[derive(Debug, Clone, Copy)]
pub struct ConsoleReporter {
    color: bool,
}

impl ConsoleReporter {
    pub fn new(color: bool) -> Self {
        Self { color }
    }
}

impl Reporter for ConsoleReporter {
    fn info(&self, msg: &str) {
        if self.color {
            println!("{}", msg.blue());
        } else {
            println!("{msg}");
        }
    }

    fn success(&self, msg: &str) {
        if self.color {
            println!("{}", msg.green());
        } else {
            println!("{msg}");
        }
    }

    fn error(&self, msg: &str) {
        if self.color {
            eprintln!("{}", msg.red().bold());
        } else {
            eprintln!("{msg}");
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Success,
    Error,
}

/// Keeps every message in memory.
#[derive(Debug, Default)]
pub struct MemoryReporter {
    entries: RefCell<Vec<(Level, String)>>,
}

impl MemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<(Level, String)> {
        self.entries.borrow().clone()
    }

    pub fn messages(&self, level: Level) -> Vec<String> {
        self.entries
            .borrow()
            .iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m.clone())
            .collect()
    }

    pub fn contains(&self, level: Level, needle: &str) -> bool {
        self.entries
            .borrow()
            .iter()
            .any(|(l, m)| *l == level && m.contains(needle))
    }

    fn push(&self, level: Level, msg: &str) {
        self.entries.borrow_mut().push((level, msg.to_owned()));
    }
}

impl Reporter for MemoryReporter {
    fn info(&self, msg: &str) {
        self.push(Level::Info, msg);
    }

    fn success(&self, msg: &str) {
        self.push(Level::Success, msg);
    }

    fn error(&self, msg: &str) {
        self.push(Level::Error, msg);
    }
}
