mod convert;
mod error;
mod format;
mod value;

use clap::Parser;
use owo_colors::OwoColorize;
use std::{path::PathBuf, process::ExitCode};

use crate::{convert::convert, error::Error, format::FileFormat};

#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// File format of the source (defaults to its extension, then YAML)
    #[clap(short, long, value_enum)]
    from: Option<FileFormat>,
    /// File format of the destination (defaults to its extension, then JSON)
    #[clap(short, long, value_enum)]
    to: Option<FileFormat>,
    /// Schema file to read
    source: PathBuf,
    /// File to write, overwritten if it exists
    dest: PathBuf,
}

fn main() -> ExitCode {
    let args = Args::parse();
    if let Err(e) = run(&args) {
        eprintln!("{} {}", "error:".red().bold(), e.white());
        return ExitCode::FAILURE;
    }
    println!(
        "Converted {} to {}",
        args.source.display(),
        args.dest.display()
    );
    ExitCode::SUCCESS
}

fn run(args: &Args) -> Result<(), Error> {
    convert(&args.source, &args.dest, args.from, args.to)
}
