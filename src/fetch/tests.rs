#[cfg(test)]
mod tests {
    use super::super::*;
    use hyper::Uri;

    #[test]
    fn test_resolve_location_absolute() {
        let base: Uri = "https://packages.quartzdb.io/deb/pool/x.deb"
            .parse()
            .unwrap();
        let resolved = resolve_location(&base, "https://mirror.example.com/x.deb").unwrap();
        assert_eq!(resolved.to_string(), "https://mirror.example.com/x.deb");
    }

    #[test]
    fn test_resolve_location_relative_keeps_authority() {
        let base: Uri = "https://packages.quartzdb.io/deb/pool/x.deb"
            .parse()
            .unwrap();
        let resolved = resolve_location(&base, "/mirror/x.deb").unwrap();
        assert_eq!(
            resolved.to_string(),
            "https://packages.quartzdb.io/mirror/x.deb"
        );
    }

    #[test]
    fn test_resolve_location_invalid() {
        let base: Uri = "https://packages.quartzdb.io/x.deb".parse().unwrap();
        assert!(resolve_location(&base, "ht tp://bad target").is_err());
    }

    #[tokio::test]
    async fn test_invalid_url_fails_before_any_request() {
        let fetcher = HttpFetcher::new();
        let err = fetcher.fetch("not a url").await.unwrap_err();
        assert!(err.to_string().contains("Invalid artifact URL"));
    }
}
