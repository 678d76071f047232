use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use release_gate::config::{self, Backend, Config};
use release_gate::git::{Git2Repository, Repository, SystemGit};
use release_gate::github::{RepoId, RestClient};
use release_gate::release::ReleaseRunner;
use release_gate::{output, ui};

#[derive(clap::Parser, Debug, Default)]
#[command(
    name = "release-gate",
    version,
    about = "Compute the next release version from merged pull requests and publish it"
)]
struct Args {
    #[arg(short, long, help = "Custom configuration file path")]
    config: Option<PathBuf>,

    #[arg(long, help = "Repository checkout to release from")]
    checkout_dir: Option<PathBuf>,

    #[arg(long = "ref", help = "Revision to release")]
    git_ref: Option<String>,

    #[arg(long, env = "GITHUB_REPOSITORY", help = "GitHub repository as owner/name")]
    repo: Option<String>,

    #[arg(long, help = "Prefix of release tags")]
    tag_prefix: Option<String>,

    #[arg(long, help = "Tag to use when there is no previous release")]
    initial_tag: Option<String>,

    #[arg(long, help = "Create and push the release tag")]
    create_tag: bool,

    #[arg(long, help = "Create a GitHub release (implies --create-tag)")]
    create_release: bool,

    #[arg(long, help = "Shell command run before tagging; exit 10 aborts")]
    prerelease_hook: Option<String>,

    #[arg(long, help = "Shell command run after the release is created")]
    postrelease_hook: Option<String>,

    #[arg(long = "go-mod-file", help = "go.mod file to validate, relative to the checkout")]
    go_mod_files: Vec<PathBuf>,

    #[arg(long, help = "Remote to push the tag to")]
    push_remote: Option<String>,

    #[arg(long, help = "Directory for release-notes and release-target override files")]
    scratch_dir: Option<PathBuf>,

    #[arg(long, value_enum, help = "Git implementation to use")]
    backend: Option<Backend>,

    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true, help = "GitHub API token")]
    github_token: Option<String>,

    #[arg(long, env = "GITHUB_API_URL", help = "GitHub API base URL")]
    github_api_url: Option<String>,

    #[arg(long, env = "GITHUB_OUTPUT", help = "Append results to this GitHub Actions output file")]
    github_output: Option<PathBuf>,

    #[arg(short, long, help = "Enable debug logging")]
    verbose: bool,
}

impl Args {
    /// Flags take precedence over the configuration file
    fn apply(&self, config: &mut Config) {
        if let Some(dir) = &self.checkout_dir {
            config.checkout_dir = dir.clone();
        }
        if let Some(git_ref) = &self.git_ref {
            config.git_ref = git_ref.clone();
        }
        if self.repo.is_some() {
            config.repo = self.repo.clone();
        }
        if let Some(prefix) = &self.tag_prefix {
            config.tag_prefix = prefix.clone();
        }
        if let Some(tag) = &self.initial_tag {
            config.initial_tag = tag.clone();
        }
        config.create_tag |= self.create_tag;
        config.create_release |= self.create_release;
        if self.prerelease_hook.is_some() {
            config.prerelease_hook = self.prerelease_hook.clone();
        }
        if self.postrelease_hook.is_some() {
            config.postrelease_hook = self.postrelease_hook.clone();
        }
        if !self.go_mod_files.is_empty() {
            config.go_mod_files = self.go_mod_files.clone();
        }
        if let Some(remote) = &self.push_remote {
            config.push_remote = remote.clone();
        }
        if self.scratch_dir.is_some() {
            config.scratch_dir = self.scratch_dir.clone();
        }
        if let Some(backend) = self.backend {
            config.backend = backend;
        }
        if self.github_token.is_some() {
            config.github.token = self.github_token.clone();
        }
        if let Some(url) = &self.github_api_url {
            config.github.api_url = url.clone();
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = std::env::var("RELEASE_GATE_LOG")
        .ok()
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn main() {
    let args = Args::parse();
    init_tracing(args.verbose);

    if let Err(e) = run(args) {
        ui::display_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let discovery_dir = args
        .checkout_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from("."));
    let mut config = config::load_config(args.config.as_deref(), &discovery_dir)
        .context("Failed to load configuration")?;
    args.apply(&mut config);
    config.validate().context("Invalid configuration")?;

    let repo_id = config
        .repo
        .as_deref()
        .map(str::parse::<RepoId>)
        .transpose()?;

    let repo: Box<dyn Repository> = match config.backend {
        Backend::Git => Box::new(SystemGit::new(&config.checkout_dir)),
        Backend::Libgit2 => {
            let mut repo = Git2Repository::open(&config.checkout_dir).with_context(|| {
                format!("Failed to open repository at {}", config.checkout_dir.display())
            })?;
            if let Some(token) = &config.github.token {
                repo = repo.with_token(token.clone());
            }
            Box::new(repo)
        }
    };

    let github = RestClient::new(
        config.github.api_url.clone(),
        config.github.token.clone(),
        &config.github.user_agent,
        repo_id,
    )
    .context("Failed to build GitHub client")?;

    // Held until the run finishes so the override files outlive the hooks.
    let mut scratch_guard = None;
    let scratch_dir = match &config.scratch_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create scratch dir {}", dir.display()))?;
            dir.clone()
        }
        None => {
            let dir = tempfile::Builder::new()
                .prefix("release-gate-")
                .tempdir()
                .context("Failed to create scratch dir")?;
            scratch_guard.insert(dir).path().to_path_buf()
        }
    };

    ui::display_status(&format!(
        "Resolving release from {} in {}",
        config.git_ref,
        config.checkout_dir.display()
    ));
    let runner = ReleaseRunner::new(&config, &*repo, &github, scratch_dir);
    let result = runner.run().context("Release failed")?;
    drop(scratch_guard);

    println!("{}", output::to_json(&result)?);
    if let Some(path) = &args.github_output {
        output::write_github_output(path, &result)
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }
    ui::display_summary(&result);
    if result.created_tag {
        ui::display_success(&format!("Pushed tag {}", result.release_tag));
    }
    if result.created_release {
        ui::display_success(&format!("Created GitHub release {}", result.release_tag));
    }
    if let Some(reason) = result.stop_reason {
        ui::display_status(&format!("Stopped: {}", reason));
    }
    Ok(())
}
