mod cli;
mod config;
mod convert;
mod eval_cmd;
mod logging;
mod ops_cmd;
mod ram_cmd;

use std::process;

use anyhow::Result;
use clap::Parser;

use crate::cli::{Cli, Command};

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    if let Err(e) = run(cli.command) {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn run(command: Command) -> Result<()> {
    match command {
        Command::Eval(args) => eval_cmd::run(args),
        Command::Ram(args) => ram_cmd::run(args),
        Command::Ops => ops_cmd::run(),
    }
}
