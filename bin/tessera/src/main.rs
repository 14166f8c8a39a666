//! Tessera sector coordinator binary.

mod cli;
mod commands;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    color_eyre::install()?;
    cli::run().await
}
