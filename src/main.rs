use anyhow::Result;
use clap::Parser;
use meusgastos::cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    cli.run().await
}
