#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use tempfile::TempDir;

    use crate::config::{self, parse_byte_size, AppConfig, ByteSize, TokenAlgorithm};

    fn files_section(root: &TempDir, extra: &str) -> String {
        format!("[files]\nroot_dir = '{}'\n{}\n", root.path().display(), extra)
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.files.root_dir, PathBuf::from("/files"));
        assert_eq!(config.files.block_size, ByteSize(128 * 1024 * 1024));
        assert_eq!(config.files.thread_count, None);
        assert!(!config.files.follow_symlinks);
        assert!(config.files.excludes.is_empty());
        assert_eq!(config.files.max_batch_size, 10_000);
        assert_eq!(config.logging.directory, PathBuf::from("logs"));
        assert!(!config.logging.json);
        assert!(config.auth.is_none());
        assert!(config.security.is_none());
    }

    #[test]
    fn test_parse_byte_size_units() {
        assert_eq!(parse_byte_size("128 MiB"), Ok(134_217_728));
        assert_eq!(parse_byte_size("512"), Ok(512));
        assert_eq!(parse_byte_size("64b"), Ok(64));
        assert_eq!(parse_byte_size("1KB"), Ok(1_000));
        assert_eq!(parse_byte_size("1 kib"), Ok(1_024));
        assert_eq!(parse_byte_size("2GiB"), Ok(2 * 1024 * 1024 * 1024));
        assert_eq!(parse_byte_size("1.5 MB"), Ok(1_500_000));
        assert_eq!(parse_byte_size("  4 M  "), Ok(4_000_000));
    }

    #[test]
    fn test_parse_byte_size_rejects_garbage() {
        assert!(parse_byte_size("").is_err());
        assert!(parse_byte_size("MiB").is_err());
        assert!(parse_byte_size("12 parsecs").is_err());
        assert!(parse_byte_size("1.2.3 MB").is_err());
    }

    #[test]
    fn test_byte_size_display() {
        assert_eq!(ByteSize(512).to_string(), "512B");
        assert_eq!(ByteSize(128 * 1024 * 1024).to_string(), "128.0MiB");
        assert_eq!(ByteSize(1536).to_string(), "1.5KiB");
    }

    #[test]
    fn test_toml_overrides_defaults() {
        let root = TempDir::new().unwrap();
        let toml = format!(
            "[server]\nport = 9090\n{}",
            files_section(&root, "block_size = 65536\nthread_count = 3\nexcludes = ['**/extras/**']")
        );

        let config = config::from_toml_str(&toml).unwrap();

        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.files.root_dir, root.path());
        assert_eq!(config.files.block_size, ByteSize(65_536));
        assert_eq!(config.files.thread_count, Some(3));
        assert_eq!(config.files.effective_thread_count(), 3);
        assert_eq!(config.files.excludes, vec!["**/extras/**"]);
    }

    #[test]
    fn test_thread_count_defaults_to_cpus_with_floor() {
        let root = TempDir::new().unwrap();
        let config = config::from_toml_str(&files_section(&root, "")).unwrap();
        assert!(config.files.effective_thread_count() >= 2);
    }

    #[test]
    fn test_missing_root_dir_is_rejected() {
        let root = TempDir::new().unwrap();
        let toml = format!("[files]\nroot_dir = '{}'\n", root.path().join("missing").display());

        let err = config::from_toml_str(&toml).unwrap_err();
        assert!(err.to_string().contains("files.root_dir"));
    }

    #[test]
    fn test_invalid_files_settings() {
        let root = TempDir::new().unwrap();
        for extra in [
            "thread_count = 0",
            "thread_count = 257",
            "block_size = 0",
            "block_size = '12 parsecs'",
            "max_batch_size = 0",
            "excludes = ['[']",
        ] {
            assert!(config::from_toml_str(&files_section(&root, extra)).is_err(), "{}", extra);
        }
    }

    #[test]
    fn test_invalid_server_port() {
        let root = TempDir::new().unwrap();
        let toml = format!("[server]\nport = 0\n{}", files_section(&root, ""));

        let err = config::from_toml_str(&toml).unwrap_err();
        assert!(err.to_string().contains("invalid server.port"));
    }

    #[test]
    fn test_auth_section() {
        let root = TempDir::new().unwrap();
        let toml = format!(
            "{}[auth]\nalgorithm = 'HS256'\nsecret = 's3cret'\nallowed_audiences = ['plex']\nallowed_subjects = ['node-1']\n",
            files_section(&root, "")
        );

        let config = config::from_toml_str(&toml).unwrap();
        let auth = config.auth.unwrap();

        assert_eq!(auth.algorithm, TokenAlgorithm::Hs256);
        assert_eq!(auth.issuer, "project-atlas");
        assert_eq!(auth.token_ttl_secs, 3600);
        assert_eq!(auth.allowed_audiences, vec!["plex"]);
    }

    #[test]
    fn test_auth_requires_key_material() {
        let root = TempDir::new().unwrap();
        let hs256 = format!("{}[auth]\nalgorithm = 'HS256'\n", files_section(&root, ""));
        assert!(config::from_toml_str(&hs256).is_err());

        let eddsa = format!("{}[auth]\nprivate_key_path = 'keys/private.pem'\n", files_section(&root, ""));
        assert!(config::from_toml_str(&eddsa).is_err());
    }
}
