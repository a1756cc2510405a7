use clap::Parser;

use mtsync::{cli, telemetry};

fn main() {
    let cli = cli::Cli::parse();
    telemetry::init(cli.verbose, cli.quiet);

    if let Err(e) = cli::run(cli) {
        tracing::error!("error: {e}");
        std::process::exit(1);
    }
}
