use std::path::PathBuf;

use clap::Parser;

use seralink_node::NodeConfig;

#[derive(Parser)]
#[command(name = "seralink-node", about = "Seralink loopback demo node")]
struct Cli {
    /// Path to configuration file; defaults apply when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();

    if std::env::var("RUST_LOG_FORMAT").as_deref() == Ok("json") {
        seralink_node::logging::init_json();
    } else {
        seralink_node::logging::init();
    }

    let config = match &cli.config {
        Some(path) => match NodeConfig::load(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("failed to load config from {}: {e}", path.display());
                std::process::exit(1);
            }
        },
        None => NodeConfig::default(),
    };

    if let Err(e) = seralink_node::run(&config) {
        tracing::error!("loopback exchange failed: {e}");
        std::process::exit(1);
    }
}
