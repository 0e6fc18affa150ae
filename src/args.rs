#![warn(clippy::all, clippy::pedantic)]
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;

use crate::{
    error::{Error, Result},
    fetch::{LogFetcher, RunSelection},
    jenkins::{Credentials, Jenkins},
};

const URL_ENV: &str = "DOWNLOAD_JENKINS_BUILD_LOG_URL";
const LOGIN_ENV: &str = "DOWNLOAD_JENKINS_BUILD_LOG_LOGIN";
const TOKEN_ENV: &str = "DOWNLOAD_JENKINS_BUILD_LOG_API_TOKEN";
const DEFAULT_URL: &str = "http://localhost:8080";

#[derive(Parser, Debug)]
#[command(author, version, about = "Download Jenkins build console logs", long_about = None)]
pub struct Args {
    #[arg(index = 1, help = "Job path (format: path/to/jenkins/job)")]
    job: String,
    #[arg(
        short,
        long,
        help = "Base URL of the Jenkins installation [default: http://localhost:8080]"
    )]
    url: Option<String>,
    #[arg(short, long, help = "Build ID (the last build when omitted)")]
    build: Option<u32>,
    #[arg(short, long, help = "Download the logs of all matrix runs, ignoring --filter")]
    all: bool,
    #[arg(short, long, help = "Only download matrix runs whose URL contains this text")]
    filter: Option<String>,
    #[arg(long, help = "Stop after the first matrix run downloaded")]
    first: bool,
    #[arg(
        short,
        long,
        help = "Target directory (defaults to '<job name>-<build ID>')"
    )]
    directory: Option<PathBuf>,
    #[arg(short, long, help = "Login name to the Jenkins server")]
    login: Option<String>,
    #[arg(short = 'p', long, help = "API token to the Jenkins server")]
    token: Option<String>,
    #[arg(short, long, help = "Do not echo the downloaded log")]
    quiet: bool,
    #[arg(
        long,
        value_name = "SECS",
        default_value_t = 30,
        value_parser = clap::value_parser!(u64).range(1..),
        help = "Connect and read timeout"
    )]
    timeout: u64,
}

/// Everything one invocation needs, fixed before the first request.
#[derive(Debug)]
pub struct Config {
    pub job: String,
    pub url: String,
    pub build: Option<u32>,
    pub target_directory: PathBuf,
    pub credentials: Credentials,
    pub selection: RunSelection,
    pub quiet: bool,
    pub timeout: Duration,
}

impl Config {
    /// Command line values win over `env`.
    pub fn from_args<F>(args: Args, env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| env(key).filter(|v| !v.is_empty());

        let target_directory = args.directory.unwrap_or_else(|| {
            let job_base = Path::new(&args.job)
                .file_name()
                .map_or_else(|| args.job.clone(), |n| n.to_string_lossy().into_owned());
            let build = args
                .build
                .map_or_else(|| "last".to_string(), |b| b.to_string());
            PathBuf::from(format!("{job_base}-{build}"))
        });

        Self {
            url: args
                .url
                .or_else(|| lookup(URL_ENV))
                .unwrap_or_else(|| DEFAULT_URL.to_string()),
            build: args.build,
            target_directory,
            credentials: Credentials::new(
                args.login.or_else(|| lookup(LOGIN_ENV)),
                args.token.or_else(|| lookup(TOKEN_ENV)),
            ),
            selection: RunSelection {
                filter: if args.all { None } else { args.filter },
                first_only: args.first,
            },
            quiet: args.quiet,
            timeout: Duration::from_secs(args.timeout),
            job: args.job,
        }
    }
}

fn non_blank_lines(text: &str) -> impl Iterator<Item = &str> {
    text.lines().map(str::trim).filter(|l| !l.is_empty())
}

// Goes to stderr so that stdout carries nothing but the echoed log.
fn downloaded(path: &Path) -> String {
    format!("Successfully downloaded log to {}", path.display())
}

async fn echo(path: &Path) -> Result<()> {
    let data = tokio::fs::read(path)
        .await
        .map_err(|e| Error::filesystem(path, e))?;

    for line in non_blank_lines(&String::from_utf8_lossy(&data)) {
        println!("{line}");
    }

    Ok(())
}

pub async fn run(config: &Config) -> Result<Vec<PathBuf>> {
    let jenkins = Jenkins::new(config.credentials.clone(), config.timeout);
    let fetcher = LogFetcher::new(jenkins, config.selection.clone());

    let job = fetcher
        .resolve(&config.url, &config.job, config.build)
        .await?;

    log::info!(
        "fetching build {} of {} into {}",
        job.build_id,
        job.job,
        config.target_directory.display()
    );
    let files = fetcher
        .download_logs(&job, &config.target_directory)
        .await?;

    for file in &files {
        eprintln!("{}", downloaded(file));
    }

    if !config.quiet {
        for file in &files {
            echo(file).await?;
        }
    }

    Ok(files)
}

pub async fn handle() -> Result<()> {
    let config = Config::from_args(Args::parse(), |key| std::env::var(key).ok());
    log::debug!("{config:?}");

    run(&config).await?;

    Ok(())
}
