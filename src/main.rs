#![warn(clippy::all, clippy::pedantic)]
use colored::Colorize as _;

mod args;
mod error;
mod fetch;
mod jenkins;
mod job;
#[cfg(test)]
mod testing;

#[tokio::main]
async fn main() {
    pretty_env_logger::init();

    if let Err(e) = args::handle().await {
        log::debug!("{e:?}");
        eprintln!("{} {e}", "error:".red().bold());
        std::process::exit(1);
    }
}
