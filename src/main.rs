use anyhow::Result;
use docchat::cli;

#[tokio::main]
async fn main() -> Result<()> {
    cli::run().await
}
