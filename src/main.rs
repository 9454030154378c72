use anyhow::Result;
use clap::Parser;
use vouchers::cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    vouchers::logging::init_logging(cli.verbose);
    cli.run().await
}
