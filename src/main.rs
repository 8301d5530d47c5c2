use clap::Parser;
use simplestocks::cli::{run, Cli};

fn main() -> std::process::ExitCode {
    run(Cli::parse())
}
