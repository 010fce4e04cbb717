#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::install::CommandRunner;
    use anyhow::Result;
    use std::path::PathBuf;
    use std::sync::Mutex;

    struct RecordingRunner {
        calls: Mutex<Vec<(String, Vec<String>)>>,
    }

    impl RecordingRunner {
        fn new() -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<(String, Vec<String>)> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl CommandRunner for RecordingRunner {
        fn run(&self, program: &str, args: &[&str]) -> Result<()> {
            self.calls.lock().unwrap().push((
                program.to_string(),
                args.iter().map(|a| a.to_string()).collect(),
            ));
            Ok(())
        }
    }

    #[test]
    fn test_fixed_identity_is_stable() {
        let identity = ServiceIdentity::fixed();
        assert_eq!(identity.user, "quartzdb");
        assert_eq!(identity.group, "quartzdb");
        assert_eq!(identity.uid, 101);
        assert_eq!(identity.gid, 101);
        assert_eq!(identity.home, PathBuf::from("/var/lib/quartzdb"));
        assert_eq!(identity, ServiceIdentity::default());
    }

    #[test]
    fn test_exists_for_root() {
        let identity = ServiceIdentity {
            user: "root".to_string(),
            group: "root".to_string(),
            uid: 0,
            gid: 0,
            home: PathBuf::from("/root"),
        };
        assert!(identity.exists().unwrap());
    }

    #[test]
    fn test_ensure_creates_group_before_user() {
        let identity = ServiceIdentity {
            user: "dbstrap-test-absent".to_string(),
            group: "dbstrap-test-absent".to_string(),
            ..ServiceIdentity::fixed()
        };
        let runner = RecordingRunner::new();
        identity.ensure(&runner).unwrap();

        let calls = runner.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].0, "groupadd");
        assert!(calls[0].1.contains(&"101".to_string()));
        assert_eq!(calls[1].0, "useradd");
        assert!(calls[1].1.contains(&"--uid".to_string()));
        assert!(calls[1].1.contains(&"101".to_string()));
        assert!(calls[1].1.contains(&"dbstrap-test-absent".to_string()));
    }

    #[test]
    fn test_ensure_skips_existing_identity() {
        let identity = ServiceIdentity {
            user: "root".to_string(),
            group: "root".to_string(),
            ..ServiceIdentity::fixed()
        };
        let runner = RecordingRunner::new();
        identity.ensure(&runner).unwrap();
        assert!(runner.calls().is_empty());
    }
}
