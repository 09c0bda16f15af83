//! OptiBench CLI entry point.

use tracing_subscriber::EnvFilter;

fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = optibench_cli::run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
