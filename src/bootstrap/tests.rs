#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::identity::ServiceIdentity;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::tempdir;

    #[test]
    fn test_capture_detects_first_run() {
        let dir = tempdir().unwrap();
        let state = BootstrapState::capture(dir.path());
        assert!(state.first_run);

        fs::write(dir.path().join("data.bin"), b"x").unwrap();
        let state = BootstrapState::capture(dir.path());
        assert!(!state.first_run);
    }

    #[test]
    fn test_capture_missing_data_dir_is_first_run() {
        let dir = tempdir().unwrap();
        let state = BootstrapState::capture(&dir.path().join("never-created"));
        assert!(state.first_run);
    }

    #[test]
    fn test_initialize_creates_missing_dirs_world_writable() {
        let base = tempdir().unwrap();
        let data = base.path().join("data");
        let logs = base.path().join("logs");
        let bootstrap = Bootstrap::new(
            ServiceIdentity::fixed(),
            vec![data.clone(), logs.clone()],
            &data,
        );

        bootstrap.initialize().unwrap();

        for dir in [&data, &logs] {
            assert!(dir.is_dir());
            let mode = fs::metadata(dir).unwrap().permissions().mode();
            // Open enough for an arbitrary runtime-assigned uid.
            assert_eq!(mode & 0o777, 0o777);
        }
    }

    #[test]
    fn test_initialize_is_idempotent() {
        let base = tempdir().unwrap();
        let data = base.path().join("data");
        fs::create_dir(&data).unwrap();
        let mut perms = fs::metadata(&data).unwrap().permissions();
        perms.set_mode(0o750);
        fs::set_permissions(&data, perms).unwrap();

        for _ in 0..2 {
            let bootstrap =
                Bootstrap::new(ServiceIdentity::fixed(), vec![data.clone()], &data);
            bootstrap.initialize().unwrap();
        }

        // An already-provisioned tree keeps its permissions.
        let mode = fs::metadata(&data).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o750);
    }

    #[test]
    fn test_initialize_failure_is_fatal() {
        let base = tempdir().unwrap();
        let blocker = base.path().join("blocker");
        fs::write(&blocker, b"not a directory").unwrap();

        let dir = blocker.join("data");
        let bootstrap = Bootstrap::new(ServiceIdentity::fixed(), vec![dir.clone()], &dir);
        let err = bootstrap.initialize().unwrap_err();
        assert!(err.to_string().contains("Failed to create"));
    }
}
