//! pixelforge-matte CLI tool
//!
//! Command-line interface for keying out flat green backdrops from generated
//! sprites and sprite sheets.

#[cfg(feature = "cli")]
use pixelforge_matte::cli;

#[cfg(feature = "cli")]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    cli::main().await
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI feature not enabled. Please rebuild with --features cli");
    std::process::exit(1);
}
