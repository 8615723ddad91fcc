use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use repofan::action::{ActionTemplate, StdioSink};
use repofan::config::AppConfig;
use repofan::platform::github::GitHubPlatform;
use repofan::shutdown::{cancel_on_shutdown, cancellation};
use repofan::workflow::Printer;
use repofan::workspace::{Git2Client, WorkspaceManager};

#[derive(Parser)]
#[command(
    name = "repofan",
    about = "Run a script in a fresh clone of many GitHub repositories"
)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// Organization whose repositories to include (repeatable)
    #[arg(short = 'O', long = "org")]
    orgs: Vec<String>,

    /// User whose repositories to include (repeatable)
    #[arg(short = 'U', long = "user")]
    users: Vec<String>,

    /// Single repository as owner/name (repeatable)
    #[arg(short = 'R', long = "repo")]
    repos: Vec<String>,

    /// Number of repositories processed at the same time
    #[arg(short = 'C', long)]
    concurrent: Option<usize>,

    /// GitHub token used for listing and cloning
    #[arg(short = 'T', long, env = "GITHUB_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// GitHub API root, for GitHub Enterprise
    #[arg(long)]
    base_url: Option<String>,

    /// Clone only the last N commits
    #[arg(long)]
    clone_depth: Option<u32>,

    /// Also run on archived repositories
    #[arg(long)]
    include_archived: bool,

    /// Skip repositories that are forks
    #[arg(long)]
    skip_forks: bool,

    /// Directory the per-repository workspaces are created in
    #[arg(long)]
    workspace_dir: Option<PathBuf>,

    /// Stop starting new repositories after this many seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Print every outcome as JSON on stdout instead of the text summary
    #[arg(long)]
    summary_json: bool,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,

    /// Script or program run inside each clone, followed by its arguments
    #[arg(
        required = true,
        num_args = 1..,
        trailing_var_arg = true,
        allow_hyphen_values = true,
        value_name = "SCRIPT"
    )]
    command: Vec<String>,
}

impl Cli {
    fn script(&self) -> (&str, &[String]) {
        match self.command.split_first() {
            Some((script, args)) => (script.as_str(), args),
            None => ("", &[]),
        }
    }

    fn apply_to(&self, config: &mut AppConfig) {
        let gh = &mut config.github;
        gh.orgs.extend(self.orgs.iter().cloned());
        gh.users.extend(self.users.iter().cloned());
        gh.repos.extend(self.repos.iter().cloned());
        if let Some(token) = &self.token {
            gh.token = Some(token.clone());
        }
        if let Some(base_url) = &self.base_url {
            gh.base_url = Some(base_url.clone());
        }
        if self.include_archived {
            gh.skip_archived = false;
        }
        if self.skip_forks {
            gh.skip_forks = true;
        }

        let run = &mut config.run;
        if let Some(concurrent) = self.concurrent {
            run.concurrent = concurrent;
        }
        if let Some(depth) = self.clone_depth {
            run.clone_depth = Some(depth);
        }
        if let Some(dir) = &self.workspace_dir {
            run.workspace_dir = Some(dir.clone());
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    // Logs go to stderr so the script's stdout stays clean
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            cli.log_json
                .then(|| tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr)),
        )
        .with(
            (!cli.log_json)
                .then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr)),
        )
        .init();

    let mut config = AppConfig::load(cli.config.as_deref())?;
    cli.apply_to(&mut config);
    config.validate()?;

    tracing::debug!(config = ?config, "Loaded configuration");

    let (script, args) = cli.script();
    let action = ActionTemplate::resolve(script, args.to_vec())?;
    let provider = GitHubPlatform::new(&config.github)?;

    let printer = Printer {
        provider: Arc::new(provider),
        source_control: Arc::new(Git2Client::new(config.run.clone_depth)),
        workspaces: WorkspaceManager::new(config.run.workspace_dir.clone()),
        action,
        token: config.token().map(str::to_string),
        sink: Arc::new(StdioSink),
        concurrent: config.run.concurrent,
    };

    let (handle, signal) = cancellation();
    let watcher = cancel_on_shutdown(handle, cli.timeout.map(Duration::from_secs));

    let report = printer.run(signal).await?;
    watcher.abort();

    tracing::info!(
        total = report.len(),
        succeeded = report.success_count(),
        "Run complete"
    );

    if cli.summary_json {
        println!("{}", report.to_json()?);
    } else {
        let summary = report.summary();
        if !summary.is_empty() {
            eprint!("{summary}");
        }
    }

    Ok(if report.has_failures() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}
