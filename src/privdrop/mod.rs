//! Minimal identity switch
//!
//! Replaces the calling process with a command running as another user,
//! using only setgroups/setgid/setuid and execvp. No pty allocation, no
//! session bookkeeping, no fork: as container process 1, the server must
//! end up owning the pid for signals and exit codes to propagate.

use nix::unistd::{self, Gid, Group, Uid, User};
use std::convert::Infallible;
use std::ffi::CString;
use std::marker::PhantomData;
use thiserror::Error;
use tracing::debug;


/// Failure classes of the identity switch, in the order they can occur.
#[derive(Debug, Error)]
pub enum DropError {
    #[error("unknown user: {0}")]
    UnknownUser(String),

    #[error("unknown group: {0}")]
    UnknownGroup(String),

    #[error("failed to look up {0}: {1}")]
    Lookup(String, nix::Error),

    #[error("failed to set group id {0}: {1}")]
    SetGid(u32, nix::Error),

    #[error("failed to set user id {0}: {1}")]
    SetUid(u32, nix::Error),

    #[error("empty command")]
    EmptyCommand,

    #[error("command contains a NUL byte")]
    NulByte,

    #[error("failed to exec {0}: {1}")]
    Exec(String, nix::Error),
}

/// Target identity parsed from `user` or `user:group`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub user: String,
    pub group: Option<String>,
}

impl Target {
    pub fn parse(spec: &str) -> Self {
        match spec.split_once(':') {
            Some((user, group)) => Self {
                user: user.to_string(),
                group: Some(group.to_string()),
            },
            None => Self {
                user: spec.to_string(),
                group: None,
            },
        }
    }

    /// Resolve names to numeric ids without changing anything.
    ///
    /// An omitted group falls back to the user's primary group.
    pub fn resolve(&self) -> Result<(Uid, Gid), DropError> {
        let user = User::from_name(&self.user)
            .map_err(|errno| DropError::Lookup(self.user.clone(), errno))?
            .ok_or_else(|| DropError::UnknownUser(self.user.clone()))?;
        let gid = match &self.group {
            Some(name) => {
                Group::from_name(name)
                    .map_err(|errno| DropError::Lookup(name.clone(), errno))?
                    .ok_or_else(|| DropError::UnknownGroup(name.clone()))?
                    .gid
            }
            None => user.gid,
        };
        Ok((user.uid, gid))
    }
}

/// Marker: still running with the original privileges.
pub struct Root;

/// Marker: supplementary and primary group ids are set.
pub struct GroupsSet;

/// Marker: user id is set; only exec remains.
pub struct IdentitySet;

/// The switch itself, as a consuming chain.
///
/// Group ids go first, while the process is still privileged enough to
/// change them, and exec is only reachable once both transitions have
/// succeeded, so a half-dropped identity can never run the command.
pub struct PrivDrop<S> {
    uid: Uid,
    gid: Gid,
    _stage: PhantomData<S>,
}

impl PrivDrop<Root> {
    pub fn new(uid: Uid, gid: Gid) -> Self {
        Self {
            uid,
            gid,
            _stage: PhantomData,
        }
    }

    pub fn set_groups(self) -> Result<PrivDrop<GroupsSet>, DropError> {
        unistd::setgroups(&[self.gid]).map_err(|errno| DropError::SetGid(self.gid.as_raw(), errno))?;
        unistd::setgid(self.gid).map_err(|errno| DropError::SetGid(self.gid.as_raw(), errno))?;
        Ok(PrivDrop {
            uid: self.uid,
            gid: self.gid,
            _stage: PhantomData,
        })
    }
}

impl PrivDrop<GroupsSet> {
    pub fn set_user(self) -> Result<PrivDrop<IdentitySet>, DropError> {
        unistd::setuid(self.uid).map_err(|errno| DropError::SetUid(self.uid.as_raw(), errno))?;
        Ok(PrivDrop {
            uid: self.uid,
            gid: self.gid,
            _stage: PhantomData,
        })
    }
}

impl PrivDrop<IdentitySet> {
    /// Replace the process image. Open file descriptors, environment,
    /// and working directory are inherited unchanged.
    pub fn exec(self, command: &[String]) -> Result<Infallible, DropError> {
        exec(command)
    }
}

/// Resolve the target identity, drop to it, and exec the command.
pub fn switch_and_exec(
    user: &str,
    group: Option<&str>,
    command: &[String],
) -> Result<Infallible, DropError> {
    let target = Target {
        user: user.to_string(),
        group: group.map(String::from),
    };
    let (uid, gid) = target.resolve()?;
    debug!("Switching to {} ({}:{})", target.user, uid, gid);
    PrivDrop::new(uid, gid).set_groups()?.set_user()?.exec(command)
}

/// Exec without any identity change.
pub fn exec(command: &[String]) -> Result<Infallible, DropError> {
    if command.is_empty() {
        return Err(DropError::EmptyCommand);
    }
    let argv: Vec<CString> = command
        .iter()
        .map(|arg| CString::new(arg.as_str()))
        .collect::<Result<_, _>>()
        .map_err(|_| DropError::NulByte)?;

    debug!("execvp {:?}", command);
    match unistd::execvp(&argv[0], &argv) {
        Ok(never) => match never {},
        Err(errno) => Err(DropError::Exec(command[0].clone(), errno)),
    }
}
