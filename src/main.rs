use anyhow::Result;
use clap::Parser;
use dbstrap::{
    bootstrap::Bootstrap,
    cli::{Cli, Commands},
    config::Config,
    constants::entrypoint,
    fetch::HttpFetcher,
    identity::ServiceIdentity,
    install::{Installer, SystemRunner},
    privdrop::{self, Target},
    source::{detect_architecture, InstallSource, SourceParams},
};
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging to stderr
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Install {
            archive_url,
            single_binary_url,
            version,
            arch,
            packages,
            channel,
            repo_url,
            fetch_timeout_secs,
        } => {
            let config = Config::load()?;
            let params = SourceParams {
                archive_url,
                single_binary_url,
                version: version.unwrap_or(config.version),
                arch: match arch {
                    Some(arch) => arch,
                    None => detect_architecture()?.to_string(),
                },
                packages: match packages {
                    Some(list) => list.split_whitespace().map(String::from).collect(),
                    None => config.packages,
                },
                channel: channel.unwrap_or(config.channel),
                repo_url: repo_url.unwrap_or(config.repo_url),
            };
            let source = InstallSource::select(&params);

            let fetcher = match fetch_timeout_secs {
                Some(secs) => HttpFetcher::new().with_timeout(Duration::from_secs(secs)),
                None => HttpFetcher::new(),
            };
            let runner = SystemRunner;

            // The identity exists before any strategy runs, so volumes can
            // be pre-chowned to its reserved ids and the single-binary
            // self-install has a user to configure.
            let identity = ServiceIdentity::fixed();
            identity.ensure(&runner)?;

            let installer = Installer::new(&fetcher, &runner);
            installer.install(&source).await?;
            info!("Installation complete");
        }
        Commands::Entrypoint {
            data_dir,
            log_dir,
            config_dir,
            client_config_dir,
            command,
        } => {
            let command = if command.is_empty() {
                entrypoint::DEFAULT_COMMAND
                    .iter()
                    .map(|part| part.to_string())
                    .collect()
            } else {
                command
            };
            let dirs = vec![
                data_dir.clone(),
                log_dir,
                config_dir,
                client_config_dir,
            ];

            let bootstrap = Bootstrap::new(ServiceIdentity::fixed(), dirs, &data_dir);
            let never = bootstrap.initialize()?.exec(&command)?;
            match never {}
        }
        Commands::Su { user_spec, command } => {
            let target = Target::parse(&user_spec);
            let never = privdrop::switch_and_exec(&target.user, target.group.as_deref(), &command)?;
            match never {}
        }
        Commands::Version => {
            println!("dbstrap {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
