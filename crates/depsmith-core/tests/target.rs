use depsmith_core::framework::FrameworkMoniker;
use depsmith_core::target::Target;

fn fw(s: &str) -> FrameworkMoniker {
    FrameworkMoniker::parse(s).unwrap()
}

#[test]
fn ridless_display_is_framework_only() {
    let t = Target::ridless(fw("netcoreapp1.1"));
    assert!(t.is_ridless());
    assert_eq!(t.to_string(), ".NETCoreApp,Version=v1.1");
}

#[test]
fn rid_display_appends_runtime() {
    let t = Target::new(fw("netcoreapp2.0"), Some("win-x64".to_string()));
    assert!(!t.is_ridless());
    assert_eq!(t.to_string(), ".NETCoreApp,Version=v2.0/win-x64");
}

#[test]
fn parse_round_trips_display() {
    let t = Target::new(fw("net461"), Some("win7-x86".to_string()));
    assert_eq!(Target::parse(&t.to_string()), Some(t));
    assert_eq!(
        Target::parse("netcoreapp2.0"),
        Some(Target::ridless(fw("netcoreapp2.0")))
    );
}

#[test]
fn parse_rejects_empty_runtime() {
    assert_eq!(Target::parse("netcoreapp2.0/"), None);
    assert_eq!(Target::parse("nonsense/win-x64"), None);
}

#[test]
fn ridless_sorts_before_runtime_specific() {
    let ridless = Target::ridless(fw("netcoreapp2.0"));
    let rid = Target::new(fw("netcoreapp2.0"), Some("linux-x64".to_string()));
    assert!(ridless < rid);
}
