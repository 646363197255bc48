use clap::Parser;
use weather_etl::cli::{run, Cli};
use weather_etl::error::Result;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    run(cli).await
}
