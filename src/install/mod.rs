//! Installation source resolver
//!
//! Materializes the server artifacts from the selected source and
//! verifies the result with the server's one-shot query mode. Every
//! failure here is fatal: the image build is disposable, so there is no
//! rollback and no partial install.

use anyhow::{bail, Context, Result};
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};

use crate::constants::{arch, check, paths};
use crate::fetch::Fetcher;
use crate::identity::ServiceIdentity;
use crate::source::{package_filename, InstallSource};


/// Runs external package tooling and fails on non-zero exit.
pub trait CommandRunner: Send + Sync {
    fn run(&self, program: &str, args: &[&str]) -> Result<()>;
}

/// Runner that executes real commands.
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, program: &str, args: &[&str]) -> Result<()> {
        let program_path = if program.contains('/') {
            PathBuf::from(program)
        } else {
            which::which(program).with_context(|| format!("{} not found in PATH", program))?
        };

        debug!("Running {} {}", program_path.display(), args.join(" "));
        let output = Command::new(&program_path)
            .args(args)
            .env("DEBIAN_FRONTEND", "noninteractive")
            .output()
            .with_context(|| format!("Failed to execute {}", program))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!(
                "{} {} failed ({}): {}",
                program,
                args.join(" "),
                output.status,
                stderr.trim()
            );
        }
        Ok(())
    }
}

/// Resolves one installation source into installed server artifacts.
pub struct Installer<'a> {
    fetcher: &'a dyn Fetcher,
    runner: &'a dyn CommandRunner,
    identity: ServiceIdentity,
    binary_path: PathBuf,
    keyring_path: PathBuf,
    source_list_path: PathBuf,
}

impl<'a> Installer<'a> {
    pub fn new(fetcher: &'a dyn Fetcher, runner: &'a dyn CommandRunner) -> Self {
        Self {
            fetcher,
            runner,
            identity: ServiceIdentity::fixed(),
            binary_path: PathBuf::from(paths::SERVER_BINARY),
            keyring_path: PathBuf::from(paths::KEYRING),
            source_list_path: PathBuf::from(paths::APT_SOURCE),
        }
    }

    pub fn with_binary_path(mut self, path: impl AsRef<Path>) -> Self {
        self.binary_path = path.as_ref().to_path_buf();
        self
    }

    pub fn with_keyring_path(mut self, path: impl AsRef<Path>) -> Self {
        self.keyring_path = path.as_ref().to_path_buf();
        self
    }

    pub fn with_source_list_path(mut self, path: impl AsRef<Path>) -> Self {
        self.source_list_path = path.as_ref().to_path_buf();
        self
    }

    /// Install from the selected source, then verify the result.
    pub async fn install(&self, source: &InstallSource) -> Result<()> {
        match source {
            InstallSource::Archive {
                base_url,
                version,
                arch,
                packages,
            } => {
                self.install_from_archive(base_url, version, arch, packages)
                    .await?
            }
            InstallSource::SingleBinary { url } => self.install_single_binary(url).await?,
            InstallSource::Repository {
                channel,
                repo_url,
                version,
                packages,
            } => {
                self.install_from_repository(channel, repo_url, version, packages)
                    .await?
            }
        }
        self.verify()
    }

    /// Fetch every package artifact, then install them with one dpkg
    /// invocation so the installer resolves inter-package ordering.
    async fn install_from_archive(
        &self,
        base_url: &str,
        version: &str,
        arch_name: &str,
        packages: &[String],
    ) -> Result<()> {
        if packages.is_empty() {
            bail!("No packages requested");
        }

        info!(
            "Installing {} {} from archive at {}",
            packages.join(", "),
            version,
            base_url
        );

        // The staging directory is removed on drop, success or failure.
        let staging = tempfile::tempdir().context("Failed to create staging directory")?;
        let mut staged = Vec::new();
        for package in packages {
            let data = self
                .fetch_package(base_url, package, version, arch_name)
                .await?;
            let path = staging
                .path()
                .join(package_filename(package, version, arch_name));
            fs::write(&path, &data)
                .with_context(|| format!("Failed to stage {}", path.display()))?;
            staged.push(path);
        }

        let rendered: Vec<String> = staged.iter().map(|p| p.display().to_string()).collect();
        let mut args: Vec<&str> = vec!["-i"];
        args.extend(rendered.iter().map(String::as_str));
        self.runner.run("dpkg", &args)
    }

    /// One retry against the architecture-independent filename, nothing
    /// more; a package missing in both spellings fails the whole build.
    async fn fetch_package(
        &self,
        base_url: &str,
        package: &str,
        version: &str,
        arch_name: &str,
    ) -> Result<Vec<u8>> {
        let url = format!(
            "{}/{}",
            base_url,
            package_filename(package, version, arch_name)
        );
        match self.fetcher.fetch(&url).await {
            Ok(data) => Ok(data),
            Err(err) => {
                let fallback = format!(
                    "{}/{}",
                    base_url,
                    package_filename(package, version, arch::ALL)
                );
                debug!("{:#}; retrying as {}", err, fallback);
                self.fetcher.fetch(&fallback).await.with_context(|| {
                    format!("Package {} unavailable at {} and {}", package, url, fallback)
                })
            }
        }
    }

    /// Fetch the self-installing executable and let it configure the
    /// image for the service identity.
    async fn install_single_binary(&self, url: &str) -> Result<()> {
        info!("Installing server from single binary at {}", url);
        let data = self
            .fetcher
            .fetch(url)
            .await
            .context("Failed to fetch server binary")?;

        if let Some(parent) = self.binary_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(&self.binary_path, &data)
            .with_context(|| format!("Failed to write {}", self.binary_path.display()))?;
        let mut perms = fs::metadata(&self.binary_path)?.permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&self.binary_path, perms)
            .with_context(|| format!("Failed to mark {} executable", self.binary_path.display()))?;

        let binary = self.binary_path.display().to_string();
        self.runner.run(
            &binary,
            &[
                "install",
                "--user",
                &self.identity.user,
                "--group",
                &self.identity.group,
            ],
        )
    }

    /// Register the channel repository, then install exact version pins
    /// in one transaction over the whole package list.
    async fn install_from_repository(
        &self,
        channel: &str,
        repo_url: &str,
        version: &str,
        packages: &[String],
    ) -> Result<()> {
        if packages.is_empty() {
            bail!("No packages requested");
        }

        info!(
            "Installing {} {} from the {} channel",
            packages.join(", "),
            version,
            channel
        );

        let repo_url = repo_url.trim_end_matches('/');
        let key_url = format!("{}/key.gpg", repo_url);
        let key = self
            .fetcher
            .fetch(&key_url)
            .await
            .context("Failed to fetch the repository signing key")?;
        if let Some(parent) = self.keyring_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(&self.keyring_path, &key)
            .with_context(|| format!("Failed to write {}", self.keyring_path.display()))?;

        let entry = format!(
            "deb [signed-by={}] {} {} main\n",
            self.keyring_path.display(),
            repo_url,
            channel
        );
        if let Some(parent) = self.source_list_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(&self.source_list_path, entry)
            .with_context(|| format!("Failed to write {}", self.source_list_path.display()))?;

        self.runner.run("apt-get", &["update"])?;
        self.runner.run(
            "apt-get",
            &["upgrade", "--yes", "-o", "Dpkg::Options::=--force-confold"],
        )?;

        // A missing pin fails this single command before anything from
        // the list is installed; there is no fallback to latest.
        let pins: Vec<String> = packages
            .iter()
            .map(|package| format!("{}={}", package, version))
            .collect();
        let mut args: Vec<&str> = vec!["install", "--yes", "--no-install-recommends"];
        args.extend(pins.iter().map(String::as_str));
        self.runner.run("apt-get", &args)
    }

    /// Ask the fresh install to answer one query; a server that cannot
    /// introspect itself fails the build.
    fn verify(&self) -> Result<()> {
        let binary = self.binary_path.display().to_string();
        info!("Verifying installation with `{} local`", binary);
        self.runner
            .run(&binary, &["local", "--query", check::HEALTH_QUERY])
            .context("Installed server failed its diagnostic query")
    }
}
