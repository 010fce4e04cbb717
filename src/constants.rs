/// Debian package architecture constants
pub mod arch {
    /// 64-bit x86 package architecture
    pub const AMD64: &str = "amd64";

    /// 64-bit ARM package architecture
    pub const ARM64: &str = "arm64";

    /// Architecture-independent package suffix
    pub const ALL: &str = "all";
}

/// Service user and group constants
pub mod user {
    /// Name of the account the server runs as
    pub const SERVICE_USER: &str = "quartzdb";

    /// Name of the server's primary group
    pub const SERVICE_GROUP: &str = "quartzdb";

    /// Reserved service UID; volumes are pre-chowned to this id out-of-band,
    /// so it must never change between image versions
    pub const SERVICE_UID: u32 = 101;

    /// Reserved service GID; same external contract as SERVICE_UID
    pub const SERVICE_GID: u32 = 101;

    /// Home directory of the service account
    pub const SERVICE_HOME: &str = "/var/lib/quartzdb";
}

/// Release and repository defaults
pub mod release {
    /// Known-good release installed when no version is requested
    pub const DEFAULT_VERSION: &str = "22.1.1.1";

    /// Default repository channel
    pub const DEFAULT_CHANNEL: &str = "stable";

    /// Default package repository base URL
    pub const DEFAULT_REPO_URL: &str = "https://packages.quartzdb.io/deb";

    /// Packages installed by the repository and archive strategies, in order
    pub const DEFAULT_PACKAGES: &[&str] = &[
        "quartzdb-common-static",
        "quartzdb-server",
        "quartzdb-client",
    ];
}

/// Well-known filesystem locations
pub mod paths {
    /// Installed server binary
    pub const SERVER_BINARY: &str = "/usr/bin/quartzdb";

    /// Keyring the repository strategy registers the channel key into
    pub const KEYRING: &str = "/usr/share/keyrings/quartzdb-keyring.gpg";

    /// Apt source list entry written by the repository strategy
    pub const APT_SOURCE: &str = "/etc/apt/sources.list.d/quartzdb.list";

    /// Server data directory
    pub const DATA_DIR: &str = "/var/lib/quartzdb";

    /// Server log directory
    pub const LOG_DIR: &str = "/var/log/quartzdb-server";

    /// Server configuration directory
    pub const SERVER_CONFIG_DIR: &str = "/etc/quartzdb-server";

    /// Client configuration directory
    pub const CLIENT_CONFIG_DIR: &str = "/etc/quartzdb-client";

    /// Build-time defaults file read by the install subcommand
    pub const CONFIG_FILE: &str = "/etc/dbstrap/config.toml";
}

/// Post-install self-check constants
pub mod check {
    /// Introspective query the installed server must answer before the
    /// build is accepted
    pub const HEALTH_QUERY: &str = "SELECT version()";
}

/// Container entrypoint constants
pub mod entrypoint {
    /// Command executed when none is passed to the entrypoint
    pub const DEFAULT_COMMAND: &[&str] = &[
        "quartzdb-server",
        "--config-file=/etc/quartzdb-server/server.conf",
    ];
}
