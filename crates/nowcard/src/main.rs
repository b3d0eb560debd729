mod bootstrap;
mod cli;
mod paths;
mod pipeline;
mod run;

use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::parse();
    run::run(args).await
}
