use clap::Parser;
use tracing::info;
use tradesrv::args::Cli;
use tradesrv::server::TradeServer;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logutil::configure_global_logger(cli.log_level, cli.log_format.into(), std::io::stderr);

    info!(version = env!("CARGO_PKG_VERSION"), "starting...");

    let config = cli.into_config();
    let result = match TradeServer::connect(config).await {
        Ok(server) => server.serve().await,
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        eprintln!("ERROR: {e}");
        std::process::exit(1);
    }
}
