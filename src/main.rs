mod archive_day;
mod cli;
mod composite_cmd;
mod config;
mod convert;
mod daily_max_cmd;
mod logging;
mod monthly_cmd;

use clap::Parser;

use cli::{Cli, Command};

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    if let Err(e) = run(cli.command) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn run(command: Command) -> anyhow::Result<()> {
    match command {
        Command::DailyMax(args) => daily_max_cmd::run(args),
        Command::Monthly(args) => monthly_cmd::run(args),
        Command::Composite(args) => composite_cmd::run(args),
    }
}
