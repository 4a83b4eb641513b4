use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::Url;
use std::{
    io::{self, IsTerminal, Write},
    path::PathBuf,
    process::ExitCode,
    time::Duration,
};
use tracing_subscriber::EnvFilter;

use crate::{
    error::{REAUTHORIZE_MESSAGE, is_token_refresh},
    play::{Config, CredentialSource, PlayPublisherClient},
    publish::{PublishOutcome, PublishRequest, publish_to_internal_track},
};

/// Exit status when the stored credentials were revoked or expired.
pub const AUTH_FAILURE_EXIT: u8 = 3;

#[derive(Parser, Debug)]
#[command(
    name = "playpush",
    version,
    about = "Upload an Android App Bundle to the Google Play internal test track",
    long_about = None
)]
pub struct Cli {
    /// The package name. Example: com.android.sample
    package_name: String,

    /// The path to the .aab file to upload
    aab_file: PathBuf,

    /// Release name for the track, e.g. 1.2.3
    app_version: String,

    /// Service-account or authorized-user JSON credentials file
    #[arg(long, value_name = "FILE")]
    credentials: Option<PathBuf>,

    /// OAuth2 access token to use instead of a credentials file
    #[arg(long, value_name = "TOKEN")]
    access_token: Option<String>,

    /// Publishing API base URL
    #[arg(long, value_name = "URL", hide = true)]
    api_url: Option<String>,

    /// HTTP request timeout in seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    /// Environment first, then command-line flags on top.
    fn config(&self) -> Result<Config> {
        let mut cfg = Config::from_env()?;
        if let Some(path) = &self.credentials {
            cfg.credentials = Some(CredentialSource::File(path.clone()));
        }
        if let Some(token) = &self.access_token {
            cfg.credentials = Some(CredentialSource::AccessToken(token.clone()));
        }
        if let Some(url) = &self.api_url {
            cfg.api_url = Url::parse(url).context("--api-url is not a valid URL")?;
        }
        if let Some(secs) = self.timeout {
            cfg.timeout = Duration::from_secs(secs);
        }
        Ok(cfg)
    }

    fn request(&self) -> PublishRequest {
        PublishRequest {
            package_name: self.package_name.clone(),
            bundle: self.aab_file.clone(),
            version_name: self.app_version.clone(),
        }
    }
}

pub async fn run_cli() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let cfg = cli.config()?;

    let pb = spinner(&format!("Publishing {}...", cli.package_name));
    let mut out = SuspendingStdout {
        pb: &pb,
        stdout: io::stdout(),
    };
    let result = upload_flow(&cfg, &cli.request(), &mut out).await;
    pb.finish_and_clear();

    match result {
        Ok(_) => Ok(ExitCode::SUCCESS),
        Err(e) if is_token_refresh(&e) => {
            tracing::debug!(error = ?e, "authorization rejected");
            println!("{}", REAUTHORIZE_MESSAGE);
            tracing::warn!("{}", reauthorize_hint(cfg.credentials.as_ref()));
            Ok(ExitCode::from(AUTH_FAILURE_EXIT))
        }
        Err(e) => Err(e),
    }
}

/// Authorizes against the publishing API, then runs the edit transaction.
pub async fn upload_flow(
    cfg: &Config,
    request: &PublishRequest,
    out: &mut impl Write,
) -> Result<PublishOutcome> {
    let client = PlayPublisherClient::new(cfg)?;
    client.authorize().await?;
    publish_to_internal_track(&client, request, out).await
}

/// Running again with the same rejected credentials fails the same way; name what to replace.
fn reauthorize_hint(source: Option<&CredentialSource>) -> String {
    match source {
        Some(CredentialSource::File(path)) => format!(
            "Replace the credentials file {} (--credentials / PLAYPUSH_CREDENTIALS) \
             with a valid key before running again",
            path.display()
        ),
        Some(CredentialSource::AccessToken(_)) => {
            "Pass a fresh token with --access-token or PLAYPUSH_ACCESS_TOKEN before running again"
                .to_string()
        }
        None => "Provide valid credentials with --credentials before running again".to_string(),
    }
}

fn init_tracing(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("playpush={}", level)));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .try_init();
}

fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.enable_steady_tick(Duration::from_millis(80));
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(msg.to_string());
    pb
}

/// Writes progress lines to stdout without tearing the spinner.
struct SuspendingStdout<'a> {
    pb: &'a ProgressBar,
    stdout: io::Stdout,
}

impl Write for SuspendingStdout<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.pb.suspend(|| self.stdout.write(buf))
    }

    fn flush(&mut self) -> io::Result<()> {
        self.pb.suspend(|| self.stdout.flush())
    }
}
