//! CLI entry point for the SETL plate analyses

use clap::Parser;
use setlyze::io::cli::{Cli, CommandRunner};
use setlyze::io::logging::init_tracing;

fn main() -> setlyze::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);
    CommandRunner::new(cli).run()
}
