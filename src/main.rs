use clap::Parser;
use edgecheck::cli::{run, Cli};

fn main() -> std::process::ExitCode {
    run(Cli::parse())
}
