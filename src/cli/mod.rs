use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::constants::paths;

#[derive(Parser)]
#[command(name = "dbstrap")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Install the server from exactly one source (image build time)
    Install {
        /// Base URL serving prebuilt .deb artifacts
        /// Takes precedence over --single-binary-url
        #[arg(long, env = "DBSTRAP_ARCHIVE_URL")]
        archive_url: Option<String>,

        /// URL of one self-installing server executable
        #[arg(long, env = "DBSTRAP_SINGLE_BINARY_URL")]
        single_binary_url: Option<String>,

        /// Server release to install (e.g. 22.1.1.1)
        #[arg(long, env = "DBSTRAP_VERSION")]
        version: Option<String>,

        /// Debian architecture of the artifacts (detected when omitted)
        #[arg(long, env = "DBSTRAP_ARCH")]
        arch: Option<String>,

        /// Packages to install, space-separated
        #[arg(long, env = "DBSTRAP_PACKAGES")]
        packages: Option<String>,

        /// Repository channel for the default strategy
        #[arg(long, env = "DBSTRAP_CHANNEL")]
        channel: Option<String>,

        /// Package repository base URL for the default strategy
        #[arg(long, env = "DBSTRAP_REPO_URL")]
        repo_url: Option<String>,

        /// Abort any single artifact fetch after this many seconds
        /// Without it a stalled fetch stalls the build
        #[arg(long, env = "DBSTRAP_FETCH_TIMEOUT_SECS")]
        fetch_timeout_secs: Option<u64>,
    },

    /// Prepare directories and exec the server under the service identity
    /// (container start, process 1)
    Entrypoint {
        /// Server data directory
        #[arg(long, default_value = paths::DATA_DIR)]
        data_dir: PathBuf,

        /// Server log directory
        #[arg(long, default_value = paths::LOG_DIR)]
        log_dir: PathBuf,

        /// Server configuration directory
        #[arg(long, default_value = paths::SERVER_CONFIG_DIR)]
        config_dir: PathBuf,

        /// Client configuration directory
        #[arg(long, default_value = paths::CLIENT_CONFIG_DIR)]
        client_config_dir: PathBuf,

        /// Command to exec after initialization, after `--`
        #[arg(last = true)]
        command: Vec<String>,
    },

    /// Exec a command as another user without a pty (minimal su)
    Su {
        /// Target identity as user or user:group
        user_spec: String,

        /// Command and arguments to exec
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        command: Vec<String>,
    },

    /// Show version information
    Version,
}
