use planmark::{cli, init_logging};

#[tokio::main]
async fn main() {
    if let Err(error) = init_logging() {
        eprintln!("Logging unavailable: {error:#}");
    }

    if let Err(error) = cli::run(std::env::args_os()).await {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}
