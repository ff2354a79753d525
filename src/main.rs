use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};
use mod_sync_lib::config::AppSettings;
use mod_sync_lib::logging::init_logging;
use mod_sync_lib::models::paths::HomePaths;
use mod_sync_lib::{SError, SyncService};
use std::process::ExitCode;
use tracing::error;

#[derive(Parser, Debug)]
#[command(name = "mod-sync", version, about = "Keeps declared mods installed at their wanted versions")]
struct Cli {
    /// Directory holding mods.toml, the manifest and the logs
    #[arg(long, global = true, env = "MOD_SYNC_HOME")]
    home: Option<Utf8PathBuf>,

    /// Debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[arg(long, global = true, env = "MOD_SYNC_STEAMCMD")]
    steamcmd: Option<Utf8PathBuf>,

    #[arg(long, global = true, env = "MOD_SYNC_NEXUS_API_KEY", hide_env_values = true)]
    nexus_api_key: Option<String>,

    #[arg(long, global = true, env = "MOD_SYNC_STEAM_API_KEY", hide_env_values = true)]
    steam_api_key: Option<String>,

    #[arg(long, global = true, env = "MOD_SYNC_STEAM_USERNAME")]
    steam_username: Option<String>,

    #[arg(long, global = true, env = "MOD_SYNC_STEAM_PASSWORD", hide_env_values = true)]
    steam_password: Option<String>,

    #[arg(long, global = true, env = "MOD_SYNC_STEAM_GUARD", hide_env_values = true)]
    steam_guard: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy)]
enum Command {
    /// Install or update every declared mod (default)
    Sync,
    /// Show what a sync would do without changing anything
    Check,
    /// Print the installed records
    List,
    /// Write a template mods.toml if there is none
    Init,
}

impl Cli {
    fn settings(&self) -> Result<AppSettings, SError> {
        let mut settings = AppSettings::load()?;

        if let Some(home) = &self.home {
            settings.home = home.clone();
        }
        if let Some(path) = &self.steamcmd {
            settings.steamcmd_path = Some(path.clone());
        }

        let overrides = [
            (&self.nexus_api_key, &mut settings.nexus_api_key),
            (&self.steam_api_key, &mut settings.steam_api_key),
            (&self.steam_username, &mut settings.steam_username),
            (&self.steam_password, &mut settings.steam_password),
            (&self.steam_guard, &mut settings.steam_guard),
        ];
        for (value, field) in overrides {
            if value.is_some() {
                *field = value.clone();
            }
        }
        Ok(settings)
    }
}

async fn run(command: Command, service: SyncService) -> Result<(), SError> {
    match command {
        Command::Sync => {
            let report = service.sync().await?;
            for (key, reason) in &report.failures {
                println!("failed   {key}: {reason}");
            }
            for key in &report.orphaned {
                println!("orphaned {key}");
            }
            println!("{report}");
            if report.has_failures() {
                println!("Failed mods keep their previous install, see {} for details", service.paths().logs);
            }
        }
        Command::Check => {
            let plan = service.check().await?;
            for entry in &plan.entries {
                println!("{entry}");
            }
            for failure in &plan.failures {
                println!("{}: unresolved ({})", failure.key, failure.reason);
            }
            for key in &plan.diff.only_installed {
                println!("{key}: orphaned");
            }
        }
        Command::List => {
            for record in service.list()? {
                println!("{} {} {}", record.key(), record.version, record.install_dir);
            }
        }
        Command::Init => {
            let path = &service.paths().mods_config;
            if service.init()? {
                println!("Wrote {path}");
            } else {
                println!("{path} already exists");
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = match cli.settings() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("mod-sync: {e}");
            return ExitCode::FAILURE;
        }
    };

    let logs = HomePaths::new(&settings.home).logs;
    let guard = match init_logging(&logs, cli.verbose) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("mod-sync: logging to {logs} is disabled: {e}");
            None
        }
    };

    let result = match SyncService::from_settings(&settings) {
        Ok(service) => run(cli.command.unwrap_or(Command::Sync), service).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if e.is_fatal() {
                error!("Aborted: {e}");
            } else {
                error!("{e}");
            }
            if guard.is_none() {
                eprintln!("mod-sync: {e}");
            }
            ExitCode::FAILURE
        }
    }
}
