use clap::Parser;
use venture_client::{client, config, input::NullInputSource};

#[tokio::main]
async fn main() -> std::process::ExitCode {
    env_logger::init();
    let config = config::ClientConfig::parse();

    match client::run(config, Box::new(NullInputSource)).await {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(err) => {
            log::error!("venture-client exited with an error: {err}");
            std::process::ExitCode::FAILURE
        }
    }
}
