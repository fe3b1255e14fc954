use clap::Parser;
use venture_server::{config, server};

#[tokio::main]
async fn main() -> std::process::ExitCode {
    env_logger::init();
    let config = config::ServerConfig::parse();

    match server::run(config).await {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(err) => {
            log::error!("venture-server exited with an error: {err}");
            std::process::ExitCode::FAILURE
        }
    }
}
