//! Fixed service identity
//!
//! The account the server runs as. Created with reserved numeric ids at
//! image build time so that externally mounted volumes can be chowned to
//! a known id before any container exists.

use anyhow::{Context, Result};
use nix::unistd::{Group, User};
use std::path::PathBuf;
use tracing::{debug, info};

use crate::constants::user;
use crate::install::CommandRunner;

#[cfg(test)]
mod tests;

/// The identity the server process ends up running under.
///
/// The numeric ids are part of the image's external contract: a volume
/// owned by uid 101 from an old container must remain usable by a new
/// one, so they are reserved, never auto-allocated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceIdentity {
    pub user: String,
    pub group: String,
    pub uid: u32,
    pub gid: u32,
    pub home: PathBuf,
}

impl Default for ServiceIdentity {
    fn default() -> Self {
        Self::fixed()
    }
}

impl ServiceIdentity {
    /// The identity every image ships with.
    pub fn fixed() -> Self {
        Self {
            user: user::SERVICE_USER.to_string(),
            group: user::SERVICE_GROUP.to_string(),
            uid: user::SERVICE_UID,
            gid: user::SERVICE_GID,
            home: PathBuf::from(user::SERVICE_HOME),
        }
    }

    /// Whether both the user and the group already resolve on this system.
    pub fn exists(&self) -> Result<bool> {
        let user = User::from_name(&self.user)
            .with_context(|| format!("Failed to look up user {}", self.user))?;
        let group = Group::from_name(&self.group)
            .with_context(|| format!("Failed to look up group {}", self.group))?;
        Ok(user.is_some() && group.is_some())
    }

    /// Create the group and user at their reserved ids if missing.
    ///
    /// Runs before any installation strategy and again on every rebuild;
    /// an identity that already resolves is left untouched.
    pub fn ensure(&self, runner: &dyn CommandRunner) -> Result<()> {
        if self.exists()? {
            debug!("Service identity {}:{} already present", self.user, self.group);
            return Ok(());
        }

        info!(
            "Creating service identity {}:{} ({}:{})",
            self.user, self.group, self.uid, self.gid
        );
        let gid = self.gid.to_string();
        let uid = self.uid.to_string();
        let home = self.home.display().to_string();
        runner.run("groupadd", &["-r", "--gid", &gid, &self.group])?;
        runner.run(
            "useradd",
            &[
                "-r",
                "-g",
                &self.group,
                "--uid",
                &uid,
                "--home-dir",
                &home,
                "--no-create-home",
                "--shell",
                "/usr/sbin/nologin",
                &self.user,
            ],
        )?;
        Ok(())
    }
}
