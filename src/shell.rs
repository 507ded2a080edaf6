// src/shell.rs
//
// Watch mode: an event loop fed by two threads.
//
// - The file watcher sends `Event::Changed`; the loop re-arms its debouncer on each one
//   and reconverts once the input has been quiet for the debounce window.
// - A stdin reader sends each typed line as `Event::Line`, and `Event::InputClosed` at EOF.
// - Only the loop thread ever converts, so two conversions never overlap.
//
// Commands (trimmed, case-insensitive):
//   r, reconvert  : convert now
//   c, clear      : clear the terminal and reprint the banner
//   q, quit, exit : stop
//   h, help       : show the command list
//   l, list       : show the output file and open its directory

use std::io::{self, BufRead, Write};
use std::path::Path;
use std::process::{self, Stdio};
use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use crossterm::{cursor, execute, terminal};

use crate::endpoint::Sink;
use crate::report::Reporter;
use crate::session::Session;
use crate::watch::Debouncer;

pub const NAME: &str = "HTB (HTML to BBCode)";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Changed,
    Line(String),
    InputClosed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Reconvert,
    Clear,
    Quit,
    Help,
    List,
    Empty,
    Unknown(String),
}

impl Command {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        match line.to_ascii_lowercase().as_str() {
            "" => Command::Empty,
            "r" | "reconvert" => Command::Reconvert,
            "c" | "clear" => Command::Clear,
            "q" | "quit" | "exit" => Command::Quit,
            "h" | "help" => Command::Help,
            "l" | "list" => Command::List,
            _ => Command::Unknown(line.to_owned()),
        }
    }
}

/// Forward stdin lines to the event loop.
pub fn spawn_line_reader(tx: Sender<Event>) -> JoinHandle<()> {
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(Event::Line(line)).is_err() {
                return;
            }
        }
        let _ = tx.send(Event::InputClosed);
    })
}

pub struct Shell<'s, 'r> {
    session: &'s Session<'r>,
    debouncer: Debouncer,
    open_dirs: bool,
    interactive: bool,
}

impl<'s, 'r> Shell<'s, 'r> {
    pub fn new(session: &'s Session<'r>, debouncer: Debouncer) -> Self {
        Self {
            session,
            debouncer,
            open_dirs: true,
            interactive: false,
        }
    }

    /// Clear the screen on start and show a `> ` prompt.
    pub fn interactive(mut self, interactive: bool) -> Self {
        self.interactive = interactive;
        self
    }

    /// Whether `l` may launch the platform's directory opener.
    pub fn open_dirs(mut self, open_dirs: bool) -> Self {
        self.open_dirs = open_dirs;
        self
    }

    /// Banner, initial conversion, then events until quit or end of input.
    pub fn run(&mut self, events: Receiver<Event>) {
        if self.interactive {
            clear_screen();
        }
        self.banner();
        if !self.session.convert() {
            self.reporter().error(&format!(
                "Initial conversion failed. Please check {}",
                self.session.source()
            ));
        }
        self.prompt();

        loop {
            let event = match self.debouncer.remaining(Instant::now()) {
                Some(wait) => match events.recv_timeout(wait) {
                    Ok(event) => Some(event),
                    Err(RecvTimeoutError::Timeout) => None,
                    Err(RecvTimeoutError::Disconnected) => break,
                },
                None => match events.recv() {
                    Ok(event) => Some(event),
                    Err(_) => break,
                },
            };

            match event {
                None => {
                    if self.debouncer.fire(Instant::now()) {
                        self.reconvert_on_change();
                    }
                }
                Some(Event::Changed) => self.debouncer.trigger(Instant::now()),
                Some(Event::Line(line)) => {
                    if !self.handle(Command::parse(&line)) {
                        break;
                    }
                }
                Some(Event::InputClosed) => break,
            }
        }
        self.reporter().info(&format!("{NAME} stopped."));
    }

    /// Run one command. Returns false when the loop should stop.
    pub fn handle(&mut self, command: Command) -> bool {
        log::debug!("command: {command:?}");
        match command {
            Command::Quit => {
                self.reporter().info(&format!("Exiting {NAME}."));
                return false;
            }
            Command::Help => self.help(),
            Command::Reconvert => {
                self.reporter().info("Manual conversion requested...");
                if self.session.convert() {
                    self.reporter().success("File converted successfully.");
                } else {
                    self.reporter().error("Manual conversion failed.");
                }
            }
            Command::Clear => {
                clear_screen();
                self.banner();
            }
            Command::List => self.list(),
            Command::Unknown(input) => self.reporter().info(&format!(
                "Unknown command: \"{input}\". Press 'h' for help."
            )),
            Command::Empty => {}
        }
        self.prompt();
        true
    }

    fn reconvert_on_change(&self) {
        self.reporter().info(&format!(
            "\nFile change detected in {}. Re-converting...",
            file_name(self.session.source().path())
        ));
        if self.session.convert() {
            self.reporter().success("Re-conversion complete.");
        } else {
            self.reporter().error("Re-conversion failed.");
        }
        self.prompt();
    }

    fn banner(&self) {
        self.reporter().success(&format!("{NAME} Running."));
        self.reporter()
            .info(&format!("Watching {} for changes.", self.session.source()));
        self.reporter().info("Press 'h' for help.");
    }

    fn help(&self) {
        let input = file_name(self.session.source().path());
        let output = file_name(self.session.sink().path());
        let dir = self
            .session
            .sink()
            .path()
            .and_then(Path::parent)
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| ".".to_string());
        self.reporter().info(&format!(
            "\n{NAME} Commands:\n  \
             r  - Re-run conversion ({input} -> {output})\n  \
             c  - Clear console\n  \
             q  - Quit the program\n  \
             h  - Show this help menu\n  \
             l  - List output file and attempt to open output directory ({dir})\n"
        ));
    }

    fn list(&self) {
        let Sink::File(path) = self.session.sink() else {
            self.reporter().info("Output is written to standard output.");
            return;
        };
        if !path.exists() {
            self.reporter()
                .error(&format!("Output file does not exist: {}", path.display()));
            return;
        }
        self.reporter().info("Output file:");
        self.reporter().info(&format!("- {}", path.display()));

        if !self.open_dirs {
            return;
        }
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let Some(open) = open_command(dir) else {
            self.reporter()
                .error("Unsupported platform for opening directory automatically.");
            return;
        };
        self.reporter()
            .info(&format!("Attempting to open directory: {}...", dir.display()));
        match launch_detached(open) {
            Ok(()) => self.reporter().info("Directory should be open."),
            Err(err) => self
                .reporter()
                .error(&format!("Failed to open directory: {err}")),
        }
    }

    fn prompt(&self) {
        if self.interactive {
            print!("> ");
            let _ = io::stdout().flush();
        }
    }

    fn reporter(&self) -> &'r dyn Reporter {
        self.session.reporter()
    }
}

fn file_name(path: Option<&Path>) -> String {
    match path {
        Some(path) => path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string()),
        None => "-".to_string(),
    }
}

fn clear_screen() {
    if let Err(err) = execute!(
        io::stdout(),
        terminal::Clear(terminal::ClearType::All),
        cursor::MoveTo(0, 0)
    ) {
        log::warn!("could not clear the terminal: {err}");
    }
}

/// Start `cmd` without waiting for it; a helper thread reaps its exit status.
fn launch_detached(mut cmd: process::Command) -> io::Result<()> {
    let mut child = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;
    thread::spawn(move || match child.wait() {
        Ok(status) if !status.success() => log::warn!("directory opener exited with {status}"),
        Ok(_) => {}
        Err(err) => log::warn!("could not wait for directory opener: {err}"),
    });
    Ok(())
}

fn open_command(dir: &Path) -> Option<process::Command> {
    if cfg!(target_os = "macos") {
        let mut cmd = process::Command::new("open");
        cmd.arg(dir);
        Some(cmd)
    } else if cfg!(target_os = "windows") {
        let mut cmd = process::Command::new("cmd");
        cmd.args(["/C", "start", ""]).arg(dir);
        Some(cmd)
    } else if cfg!(any(
        target_os = "linux",
        target_os = "freebsd",
        target_os = "openbsd",
        target_os = "netbsd"
    )) {
        let mut cmd = process::Command::new("xdg-open");
        cmd.arg(dir);
        Some(cmd)
    } else {
        None
    }
}
