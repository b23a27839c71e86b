//! Entry point for the `wincopy` working-copy engine CLI.

use wincopy::cli;

#[tokio::main]
async fn main() {
    #[cfg(debug_assertions)]
    {
        tracing::subscriber::set_global_default(
            tracing_subscriber::fmt()
                .with_max_level(tracing::Level::INFO)
                .finish(),
        )
        .unwrap();
    }

    if let Err(e) = cli::run().await {
        if !matches!(e.kind(), wincopy::ErrorKind::NotWorkingCopy) {
            eprintln!("fatal: {e}");
        }
        std::process::exit(1);
    }
}
