#[cfg(test)]
mod tests {
    use super::super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.channel, "stable");
        assert_eq!(config.repo_url, "https://packages.quartzdb.io/deb");
        assert_eq!(config.version, "22.1.1.1");
        assert_eq!(config.packages.len(), 3);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: Config = toml::from_str(r#"channel = "testing""#).unwrap();
        assert_eq!(config.channel, "testing");
        assert_eq!(config.version, "22.1.1.1");
        assert_eq!(
            config.packages,
            vec![
                "quartzdb-common-static",
                "quartzdb-server",
                "quartzdb-client"
            ]
        );
    }

    #[test]
    fn test_full_file_overrides_everything() {
        let config: Config = toml::from_str(
            r#"
channel = "lts"
repo_url = "https://mirror.internal/deb"
version = "21.8.0.0"
packages = ["quartzdb-server"]
"#,
        )
        .unwrap();
        assert_eq!(config.channel, "lts");
        assert_eq!(config.repo_url, "https://mirror.internal/deb");
        assert_eq!(config.version, "21.8.0.0");
        assert_eq!(config.packages, vec!["quartzdb-server"]);
    }
}
