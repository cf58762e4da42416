use clap::Parser;
use trendrank::cli::{Cli, run};

fn main() -> std::process::ExitCode {
    run(Cli::parse())
}
