//! Installation source selection
//!
//! Resolves the build parameters to the single strategy used to
//! materialize the server artifacts.

use anyhow::Result;

use crate::constants::arch;


/// Parameters collected from flags, environment variables, and the
/// defaults file before the resolver runs.
#[derive(Debug, Clone, Default)]
pub struct SourceParams {
    pub archive_url: Option<String>,
    pub single_binary_url: Option<String>,
    pub version: String,
    pub arch: String,
    pub packages: Vec<String>,
    pub channel: String,
    pub repo_url: String,
}

/// The single active installation strategy for a build.
///
/// Exactly one variant is ever selected, so the mutual exclusion of the
/// three sources lives in the type rather than in flag checks scattered
/// through the install path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallSource {
    /// Resolve packages from the remote package index at a pinned version
    Repository {
        channel: String,
        repo_url: String,
        version: String,
        packages: Vec<String>,
    },
    /// Fetch prebuilt .deb artifacts from a fixed base URL
    Archive {
        base_url: String,
        version: String,
        arch: String,
        packages: Vec<String>,
    },
    /// Fetch one self-installing server executable
    /// Companion tools are not available on this path
    SingleBinary { url: String },
}

impl InstallSource {
    /// Pick the strategy for this build.
    ///
    /// `archive_url` wins over `single_binary_url`, and the repository is
    /// the default when neither is given. Blank values count as unset so
    /// that empty build arguments behave like absent ones.
    pub fn select(params: &SourceParams) -> InstallSource {
        let archive = non_empty(params.archive_url.as_deref());
        let single_binary = non_empty(params.single_binary_url.as_deref());

        match (archive, single_binary) {
            (Some(base_url), _) => InstallSource::Archive {
                base_url: base_url.trim_end_matches('/').to_string(),
                version: params.version.clone(),
                arch: params.arch.clone(),
                packages: params.packages.clone(),
            },
            (None, Some(url)) => InstallSource::SingleBinary {
                url: url.to_string(),
            },
            (None, None) => InstallSource::Repository {
                channel: params.channel.clone(),
                repo_url: params.repo_url.clone(),
                version: params.version.clone(),
                packages: params.packages.clone(),
            },
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Archive filename of a package at a specific version and architecture.
pub fn package_filename(package: &str, version: &str, arch: &str) -> String {
    format!("{}_{}_{}.deb", package, version, arch)
}

/// Map the build host's CPU architecture to a Debian package architecture.
pub fn detect_architecture() -> Result<&'static str> {
    match std::env::consts::ARCH {
        "x86_64" => Ok(arch::AMD64),
        "aarch64" => Ok(arch::ARM64),
        other => anyhow::bail!("Unsupported build architecture: {}", other),
    }
}
