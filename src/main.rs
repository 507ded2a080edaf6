// src/main.rs
//
// htb — HTML to BBCode converter with a live watch mode
//
// - Converts INPUT (default main.html) into OUTPUT (default output.bbcode next to it).
// - Watch mode (default): converts once, then reconverts whenever INPUT changes, with a
//   debounce window so a burst of saves produces one conversion. Reads commands from
//   stdin meanwhile ('h' lists them).
// - `--once`, or INPUT = "-", converts a single time and exits; exit status 1 on failure.
// - Settings come from flags, then htb.toml (or --config), then defaults.
//
// CLI flags:
//   -o, --output <PATH>   : output file ("-" for stdout)
//   -c, --config <PATH>   : config file (default: ./htb.toml when present)
//   --once                : convert and exit
//   --debounce-ms <MS>    : quiet period before reconverting (default 250)
//   --no-color            : plain console output
//   --no-open             : 'l' lists the output without opening its directory

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::mpsc;

use htb::config::{FileConfig, Overrides, Settings};
use htb::report::{ConsoleReporter, Reporter};
use htb::session::Session;
use htb::shell::{self, Event, Shell};
use htb::watch::{self, Debouncer};

/// CLI flags
#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    /// Input HTML file ("-" reads stdin) [default: main.html]
    input: Option<PathBuf>,

    /// Output file ("-" writes stdout) [default: output.bbcode next to the input]
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Config file [default: ./htb.toml when present]
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Convert once and exit instead of watching
    #[arg(long, action = ArgAction::SetTrue)]
    once: bool,

    /// Quiet period in milliseconds before a change triggers reconversion [default: 250]
    #[arg(long)]
    debounce_ms: Option<u64>,

    /// Disable colored console output
    #[arg(long = "no-color", action = ArgAction::SetTrue)]
    no_color: bool,

    /// Do not open the output directory from the 'l' command
    #[arg(long = "no-open", action = ArgAction::SetTrue)]
    no_open: bool,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            input: self.input.clone(),
            output: self.output.clone(),
            debounce_ms: self.debounce_ms,
            no_color: self.no_color,
            once: self.once,
            no_open: self.no_open,
        }
    }
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let file_config = match &cli.config {
        Some(path) => Some(FileConfig::load_required(path)?),
        None => FileConfig::load_from_path(FileConfig::DEFAULT_FILE_NAME)?,
    };
    let settings =
        Settings::resolve(cli.overrides(), file_config).context("invalid rule configuration")?;
    log::debug!("settings: {settings:?}");

    let reporter = ConsoleReporter::new(settings.color);
    let session = Session::new(
        settings.source.clone(),
        settings.sink.clone(),
        settings.rules.clone(),
        &reporter,
    );

    if !settings.watch {
        return Ok(if session.convert() {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        });
    }

    let (tx, rx) = mpsc::channel();
    if let Some(path) = session.source().path() {
        let changes = tx.clone();
        watch::spawn_watcher(path.to_path_buf(), watch::POLL_INTERVAL, move || {
            changes.send(Event::Changed).is_ok()
        });
    } else {
        reporter.error("Watch mode needs an input file.");
        return Ok(ExitCode::FAILURE);
    }
    shell::spawn_line_reader(tx);

    Shell::new(&session, Debouncer::new(settings.debounce))
        .interactive(std::io::stdout().is_terminal())
        .open_dirs(settings.open_dirs)
        .run(rx);
    Ok(ExitCode::SUCCESS)
}
