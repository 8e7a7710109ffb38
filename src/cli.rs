/*
 * unquad: translate goto-based quadruples back to structured Python code.
 * Copyright (C) 2021  Ruifeng Xie
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU Affero General Public License as
 * published by the Free Software Foundation, either version 3 of the
 * License, or (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU Affero General Public License for more details.
 *
 * You should have received a copy of the GNU Affero General Public License
 * along with this program.  If not, see <https://www.gnu.org/licenses/>.
 */

//! Command line interface support.

use std::io::Read;
use std::path::PathBuf;
use displaydoc::Display as DisplayDoc;
use parse_display::{Display, FromStr};
use thiserror::Error;
use clap::Parser;
use log::{Level, LevelFilter, Log, Metadata, Record};

use crate::program::{display_program, read_program};
use crate::translate::{translate_with, Options};

/// Entry to the command line interface.
#[derive(Parser)]
#[clap(author, version, about)]
pub struct Cli {
    /// The input quadruple code file, standard input if absent.
    input: Option<PathBuf>,
    /// The output format.
    #[clap(short, long, default_value = "python")]
    target_format: TargetFormat,
    /// Comment on every label or jump not absorbed into a structure.
    #[clap(long)]
    strict: bool,
    /// Omit the banner comments around the generated code.
    #[clap(long)]
    no_banner: bool,
    /// Report more about the reconstruction on standard error (repeat for even more).
    #[clap(short, long, parse(from_occurrences))]
    verbose: u8,
}

/// Supported target formats.
#[derive(Debug, Display, FromStr, Eq, PartialEq)]
#[display(style = "kebab-case")]
pub enum TargetFormat {
    /// Print out the input file in canonical form (disregarding whitespaces).
    Echo,
    /// Translate to structured Python code.
    Python,
}

/// All kinds of errors that might happen during command line execution.
#[derive(Debug, DisplayDoc, Error)]
pub enum Error {
    /// "errors" from [`clap`], including requests such as `--version` or `--help`.
    #[displaydoc("{0}")]
    InvalidArguments(#[from] clap::Error),
    /// input file does not exist: {0}
    MissingInput(PathBuf),
    /// failed to read input: {0}
    Io(#[from] std::io::Error),
    /// cannot format the output: {0}
    CannotFormat(#[from] std::fmt::Error),
}

/// Result type for the command line interface.
pub type Result = std::result::Result<(), Error>;

/// Logger writing to standard error.
struct StderrLogger;

static LOGGER: StderrLogger = StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record<'_>) {
        if self.enabled(record.metadata()) {
            match record.level() {
                Level::Warn | Level::Error => eprintln!("{}: {}", record.level(), record.args()),
                _ => eprintln!("[{}] {}: {}", record.level(), record.target(), record.args()),
            }
        }
    }

    fn flush(&self) {}
}

fn init_logger(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    // only fails when a logger is already installed, which is then kept
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level);
    }
}

impl Cli {
    /// Run the command line interface.
    pub fn run() -> Result {
        let options: Cli = Cli::try_parse()?;
        init_logger(options.verbose);
        let contents = match &options.input {
            Some(path) if !path.exists() => return Err(Error::MissingInput(path.clone())),
            Some(path) => std::fs::read_to_string(path)?,
            None => {
                let mut contents = String::new();
                std::io::stdin().read_to_string(&mut contents)?;
                contents
            }
        };
        match options.target_format {
            TargetFormat::Echo => {
                let listing = read_program(contents.lines());
                for skipped in &listing.skipped {
                    log::warn!("skipped {}", skipped);
                }
                print!("{}", display_program(&listing.program)?)
            }
            TargetFormat::Python => {
                let translate_options = Options { strict: options.strict, banner: !options.no_banner };
                let translation = translate_with(contents.lines(), &translate_options);
                for skipped in &translation.skipped {
                    log::warn!("skipped {}", skipped);
                }
                for line in &translation.lines {
                    println!("{}", line);
                }
            }
        }
        Ok(())
    }
}
