use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    shortlist_lib::run(shortlist_lib::cli::Cli::parse()).await
}
