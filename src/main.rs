use clap::Parser;
use fanjoin::{Cli, FanjoinError};
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let output = cli.output();

    match cli.run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            output.error(&format!("Error: {err:#}"));
            let code = err
                .downcast_ref::<FanjoinError>()
                .map_or(1, FanjoinError::exit_code);
            ExitCode::from(code)
        }
    }
}
