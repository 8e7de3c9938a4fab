use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use plugin_updater::config::{self, DEFAULT_ASSET_EXTENSION, Paths, Settings};
use plugin_updater::host::PluginDirectory;
use plugin_updater::logging;
use plugin_updater::report::{console, discord::DiscordNotifier};
use plugin_updater::update::orchestrator::Updater;
use plugin_updater::update::outcome::UpdateReport;
use plugin_updater::update::scheduler::run_schedule;
use plugin_updater::update::service::UpdateService;
use plugin_updater::update::sources::GitHubReleases;
use plugin_updater::update::target::TargetRegistry;

#[derive(Parser)]
#[command(name = "plugin-updater")]
#[command(version, about = "Keeps installed plugins up to date from their GitHub releases")]
struct Cli {
    /// Directory holding settings.json, repositories.json and github.json
    #[arg(long, global = true, value_name = "DIR")]
    config_dir: Option<PathBuf>,

    /// Register an extra target for this run
    #[arg(
        long = "register",
        global = true,
        value_name = "NAME=OWNER/REPO[@ASSET]",
        value_parser = parse_registration
    )]
    registrations: Vec<Registration>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Clone, Copy, Debug, PartialEq, Eq)]
enum Command {
    /// Run one update pass (default)
    Check,
    /// Run passes on the configured schedule until interrupted
    Watch,
    /// Print the merged target set
    List,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Registration {
    name: String,
    owner: String,
    repo: String,
    asset_name: Option<String>,
}

fn parse_registration(spec: &str) -> Result<Registration, String> {
    let invalid = || format!("invalid target '{}', expected NAME=OWNER/REPO[@ASSET]", spec);

    let (name, source) = spec.split_once('=').ok_or_else(invalid)?;
    let (repo_path, asset_name) = match source.split_once('@') {
        Some((path, asset)) if !asset.is_empty() => (path, Some(asset.to_string())),
        Some(_) => return Err(invalid()),
        None => (source, None),
    };
    let (owner, repo) = repo_path.split_once('/').ok_or_else(invalid)?;

    let name = name.trim();
    let (owner, repo) = (owner.trim(), repo.trim());
    if name.is_empty() || owner.is_empty() || repo.is_empty() || repo.contains('/') {
        return Err(invalid());
    }

    Ok(Registration {
        name: name.to_string(),
        owner: owner.to_string(),
        repo: repo.to_string(),
        asset_name,
    })
}

/// Everything one invocation needs to run passes
struct App {
    paths: Paths,
    settings: Settings,
    service: UpdateService,
    plugins: PluginDirectory,
    notifier: Option<DiscordNotifier>,
}

impl App {
    fn new(paths: Paths, settings: Settings, registrations: &[Registration]) -> anyhow::Result<Self> {
        let registry = Arc::new(TargetRegistry::new());
        for r in registrations {
            registry.register(&r.name, &r.owner, &r.repo, r.asset_name.as_deref());
        }

        let source = GitHubReleases::new(&settings.api_base_url, settings.request_timeout())
            .context("Failed to create GitHub client")?;
        let plugins = PluginDirectory::new(paths.resolve(&settings.plugins_dir));
        let updater = Updater::new(Arc::new(source), Arc::new(plugins.clone()))
            .with_max_concurrency(settings.max_concurrent_checks);

        let notifier = settings
            .webhook_url()
            .map(|url| {
                DiscordNotifier::new(url, &settings.webhook_username, settings.request_timeout())
            })
            .transpose()
            .context("Failed to create webhook client")?;

        Ok(Self {
            service: UpdateService::new(registry, updater),
            paths,
            settings,
            plugins,
            notifier,
        })
    }

    /// Run one pass with freshly loaded targets and credentials
    async fn check(&self, cancel: &CancellationToken) -> Option<Vec<UpdateReport>> {
        let repositories = config::load_repositories(
            &self.paths.resolve(&self.settings.repositories_config_path),
        );
        let auth = config::load_auth(&self.paths.resolve(&self.settings.github_config_path));

        let reports = self.service.check(&repositories, &auth, cancel).await?;
        if reports.is_empty() {
            return Some(reports);
        }

        for line in console::render_summary(&reports) {
            println!("{}", line);
        }
        if let Some(notifier) = &self.notifier {
            notifier.send(&reports).await;
        }
        if let Err(e) = self.plugins.record_updates(&reports) {
            error!("Failed to record updates: {}", e);
        }

        Some(reports)
    }

    async fn watch(&self, cancel: CancellationToken) {
        if self.settings.run_updater_at_start {
            info!("Running initial update check");
            self.check(&cancel).await;
        }

        if !self.settings.schedule_enabled {
            info!("Scheduled update checks are disabled");
            return;
        }

        let pass_cancel = cancel.clone();
        let pass_cancel = &pass_cancel;
        run_schedule(self.settings.check_interval(), cancel, move || async move {
            self.check(pass_cancel).await;
        })
        .await;
    }

    fn list(&self) {
        let repositories = config::load_repositories(
            &self.paths.resolve(&self.settings.repositories_config_path),
        );
        let targets = self.service.targets(&repositories);

        if targets.is_empty() {
            println!("No plugins configured.");
            return;
        }
        for target in targets.iter() {
            let asset = target
                .source
                .asset_override()
                .map_or_else(|| format!("*{}", DEFAULT_ASSET_EXTENSION), str::to_string);
            println!(
                "{} [{}] {}/{} {}",
                target.name,
                target.origin.as_str(),
                target.source.owner,
                target.source.repo,
                asset
            );
        }
    }
}

/// Cancel `token` on Ctrl-C
fn cancel_on_interrupt(token: CancellationToken) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                warn!("Interrupted; stopping update checks");
                token.cancel();
            }
            Err(e) => error!("Failed to listen for Ctrl-C: {}", e),
        }
    });
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let paths = Paths::new(cli.config_dir);
    let settings = config::load_settings(&paths);
    let _guard = logging::init(&paths.log_path(), settings.debug)?;
    info!("Using config directory {}", paths.config_dir.display());

    let app = App::new(paths, settings, &cli.registrations)?;
    let cancel = CancellationToken::new();

    match cli.command.unwrap_or(Command::Check) {
        Command::Check => {
            cancel_on_interrupt(cancel.clone());
            app.check(&cancel).await;
        }
        Command::Watch => {
            cancel_on_interrupt(cancel.clone());
            app.watch(cancel).await;
        }
        Command::List => app.list(),
    }

    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(run(cli))
}
