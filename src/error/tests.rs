//! Tests for error types.

#[cfg(test)]
mod tests {
    use super::super::*;

    #[test]
    fn test_error_display() {
        let err = Error::config("output_file cannot be empty");
        assert_eq!(
            err.to_string(),
            "configuration error: output_file cannot be empty"
        );
    }

    #[test]
    fn test_scan_error_conversion() {
        let scan_err = ScanError::NotADirectory {
            path: "/tmp/file.txt".to_string(),
        };
        let err: Error = scan_err.into();
        assert!(matches!(err, Error::Scan(_)));
        assert_eq!(
            err.to_string(),
            "scan error: root '/tmp/file.txt' is not a directory"
        );
    }

    #[test]
    fn test_watcher_error_conversion() {
        let watch_err = WatcherError::WatchFailed {
            path: "/tmp/test".to_string(),
            reason: "permission denied".to_string(),
        };
        let err: Error = watch_err.into();
        assert!(matches!(err, Error::Watcher(_)));
        assert!(err.is_fatal_to_monitor());
    }

    #[test]
    fn test_output_error_conversion() {
        let out_err = OutputError::write_failed(
            std::path::Path::new("/readonly/directory-structure.md"),
            "permission denied",
        );
        let err: Error = out_err.into();
        assert!(matches!(err, Error::Output(_)));
        assert!(!err.is_fatal_to_monitor());
        assert!(err.to_string().contains("directory-structure.md"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
        assert!(!err.is_fatal_to_monitor());
    }

    #[test]
    fn test_yaml_error_conversion() {
        let yaml_err = serde_yaml::from_str::<Vec<String>>("{ not: a list").unwrap_err();
        let err: Error = yaml_err.into();
        assert!(matches!(err, Error::Yaml(_)));
    }

    #[test]
    fn test_result_type_alias() {
        fn returns_ok() -> Result<i32> {
            Ok(42)
        }

        fn returns_err() -> Result<i32> {
            Err(Error::config("test error"))
        }

        assert!(returns_ok().is_ok());
        assert!(returns_err().is_err());
    }

    #[test]
    fn test_error_debug_format() {
        let err = Error::internal("rebuild task panicked");
        let debug_str = format!("{err:?}");
        assert!(debug_str.contains("Internal"));
        assert!(debug_str.contains("rebuild task panicked"));
    }
}
