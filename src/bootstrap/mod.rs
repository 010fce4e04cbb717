//! Container-start bootstrap
//!
//! Runs once as the container's initial process, prepares the on-disk
//! layout, then replaces itself with the server under the fixed service
//! identity. The type-state chain keeps the drop irreversible: only an
//! initialized bootstrap can exec, and exec consumes it, so there is no
//! path back to root.

use anyhow::{Context, Result};
use nix::unistd::{self, Gid, Uid};
use std::convert::Infallible;
use std::fs;
use std::marker::PhantomData;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::identity::ServiceIdentity;
use crate::privdrop;

#[cfg(test)]
mod tests;

/// Per-start facts, resolved before any transition and never persisted.
#[derive(Debug, Clone)]
pub struct BootstrapState {
    pub effective_uid: u32,
    pub first_run: bool,
}

impl BootstrapState {
    /// Capture the current process identity and whether the data
    /// directory has ever been populated.
    pub fn capture(data_dir: &Path) -> Self {
        let first_run = match fs::read_dir(data_dir) {
            Ok(mut entries) => entries.next().is_none(),
            Err(_) => true,
        };
        Self {
            effective_uid: Uid::effective().as_raw(),
            first_run,
        }
    }

    pub fn is_root(&self) -> bool {
        self.effective_uid == 0
    }
}

/// Marker: fresh process, nothing prepared yet.
#[derive(Debug)]
pub struct Start;

/// Marker: directories exist; the only remaining edge is exec.
#[derive(Debug)]
pub struct Initialized;

#[derive(Debug)]
pub struct Bootstrap<S> {
    identity: ServiceIdentity,
    dirs: Vec<PathBuf>,
    state: BootstrapState,
    _stage: PhantomData<S>,
}

impl Bootstrap<Start> {
    pub fn new(identity: ServiceIdentity, dirs: Vec<PathBuf>, data_dir: &Path) -> Self {
        let state = BootstrapState::capture(data_dir);
        Self {
            identity,
            dirs,
            state,
            _stage: PhantomData,
        }
    }

    pub fn state(&self) -> &BootstrapState {
        &self.state
    }

    /// Ensure the required directories exist. Idempotent.
    ///
    /// Fresh directories are left world-writable because some platforms
    /// start the container under an arbitrary uid and cannot chown
    /// afterwards; when we are root, ownership is additionally pinned to
    /// the service identity. Existing directories keep their permissions.
    pub fn initialize(self) -> Result<Bootstrap<Initialized>> {
        if self.state.first_run {
            info!("Data directory is empty, this is a first start");
        }

        for dir in &self.dirs {
            let created = !dir.exists();
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
            if created {
                let mut perms = fs::metadata(dir)?.permissions();
                perms.set_mode(0o777);
                fs::set_permissions(dir, perms)
                    .with_context(|| format!("Failed to open up {}", dir.display()))?;
            }
            if self.state.is_root() {
                unistd::chown(
                    dir,
                    Some(Uid::from_raw(self.identity.uid)),
                    Some(Gid::from_raw(self.identity.gid)),
                )
                .with_context(|| format!("Failed to chown {}", dir.display()))?;
            }
            debug!("Prepared {}", dir.display());
        }

        Ok(Bootstrap {
            identity: self.identity,
            dirs: self.dirs,
            state: self.state,
            _stage: PhantomData,
        })
    }
}

impl Bootstrap<Initialized> {
    /// Replace this process with `command`.
    ///
    /// Root drops to the service identity first and the drop failing is
    /// fatal; the server is never run as root as a fallback. A process
    /// already started under some other uid execs as-is, since no
    /// transition is possible without privileges. Never returns on
    /// success.
    pub fn exec(self, command: &[String]) -> Result<Infallible> {
        if self.state.is_root() {
            info!(
                "Dropping to {}:{} and starting {:?}",
                self.identity.user, self.identity.group, command
            );
            Ok(privdrop::switch_and_exec(
                &self.identity.user,
                Some(&self.identity.group),
                command,
            )?)
        } else {
            info!(
                "Started as uid {}, starting {:?} without a privilege drop",
                self.state.effective_uid, command
            );
            Ok(privdrop::exec(command)?)
        }
    }
}
