use depsmith_util::errors::DepsmithError;

#[test]
fn test_io_error_display() {
    let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
    let err = DepsmithError::from(io_err);
    assert!(err.to_string().contains("I/O error"), "got: {err}");
}

#[test]
fn test_config_error_display() {
    let err = DepsmithError::Config {
        message: "bad syntax".to_string(),
    };
    assert_eq!(err.to_string(), "Configuration error: bad syntax");
}

#[test]
fn test_malformed_graph_display_names_target() {
    let err = DepsmithError::MalformedGraph {
        target: ".NETCoreApp,Version=v2.0".to_string(),
        message: "package `A` depends on missing `B`".to_string(),
    };
    assert_eq!(
        err.to_string(),
        "Malformed graph for target .NETCoreApp,Version=v2.0: package `A` depends on missing `B`"
    );
    assert_eq!(err.target(), Some(".NETCoreApp,Version=v2.0"));
}

#[test]
fn test_unresolvable_conflict_lists_packages() {
    let err = DepsmithError::UnresolvableConflict {
        target: "net461".to_string(),
        key: "runtime:foo".to_string(),
        packages: vec!["A/1.0.0".to_string(), "B/1.0.0".to_string()],
    };
    let s = err.to_string();
    assert!(s.contains("runtime:foo"), "got: {s}");
    assert!(s.contains("A/1.0.0, B/1.0.0"), "got: {s}");
}

#[test]
fn test_validation_error_display() {
    let err = DepsmithError::Validation { count: 3 };
    assert_eq!(err.to_string(), "Validation failed with 3 violation(s)");
    assert_eq!(err.target(), None);
}

#[test]
fn test_generic_error_display() {
    let err = DepsmithError::Generic {
        message: "something broke".to_string(),
    };
    assert_eq!(err.to_string(), "something broke");
}

#[test]
fn test_io_error_from_conversion() {
    let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
    let err: DepsmithError = io_err.into();
    assert!(matches!(err, DepsmithError::Io(_)));
}
