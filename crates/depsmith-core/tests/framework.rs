use std::collections::BTreeMap;

use depsmith_core::framework::{
    CompatibilityTable, FrameworkMoniker, FrameworkVersion, NETCOREAPP, NETFRAMEWORK, NETSTANDARD,
};

fn fw(s: &str) -> FrameworkMoniker {
    FrameworkMoniker::parse(s).unwrap()
}

#[test]
fn parse_short_netcoreapp() {
    let f = fw("netcoreapp2.0");
    assert_eq!(f.identifier(), NETCOREAPP);
    assert_eq!(f.version(), FrameworkVersion::new(2, 0, 0));
}

#[test]
fn parse_short_netstandard() {
    let f = fw("netstandard1.3");
    assert_eq!(f.identifier(), NETSTANDARD);
    assert_eq!(f.version(), FrameworkVersion::new(1, 3, 0));
}

#[test]
fn parse_compact_net_framework() {
    let f = fw("net461");
    assert_eq!(f.identifier(), NETFRAMEWORK);
    assert_eq!(f.version(), FrameworkVersion::new(4, 6, 1));
    assert_eq!(fw("net45").version(), FrameworkVersion::new(4, 5, 0));
}

#[test]
fn parse_net5_is_netcoreapp() {
    let f = fw("net5.0");
    assert_eq!(f.identifier(), NETCOREAPP);
    assert_eq!(f.short_name(), "net5.0");
    assert_eq!(fw("net6.0-windows"), fw("net6.0"));
}

#[test]
fn parse_long_form() {
    let f = fw(".NETCoreApp,Version=v1.1");
    assert_eq!(f, fw("netcoreapp1.1"));
    assert_eq!(f.to_string(), ".NETCoreApp,Version=v1.1");
}

#[test]
fn long_form_keeps_three_part_versions() {
    assert_eq!(fw("netcoreapp1.1.1").to_string(), ".NETCoreApp,Version=v1.1.1");
}

#[test]
fn short_name_round_trips() {
    for s in ["netcoreapp2.0", "netstandard1.6", "net461", "net45", "net6.0"] {
        assert_eq!(fw(s).short_name(), s);
    }
}

#[test]
fn parse_rejects_garbage() {
    assert!(FrameworkMoniker::parse("").is_none());
    assert!(FrameworkMoniker::parse("net").is_none());
    assert!(FrameworkMoniker::parse("netcoreappX").is_none());
    assert!(FrameworkMoniker::parse("portable-net45").is_none());
    assert!(FrameworkMoniker::parse(",Version=v1.0").is_none());
}

#[test]
fn serde_uses_long_form() {
    let json = serde_json::to_string(&fw("netcoreapp2.0")).unwrap();
    assert_eq!(json, "\".NETCoreApp,Version=v2.0\"");
    let back: FrameworkMoniker = serde_json::from_str("\"netstandard2.0\"").unwrap();
    assert_eq!(back, fw("netstandard2.0"));
}

#[test]
fn netstandard_support_table() {
    assert_eq!(
        fw("netcoreapp1.0").netstandard_support(),
        Some(FrameworkVersion::new(1, 6, 0))
    );
    assert_eq!(
        fw("netcoreapp2.0").netstandard_support(),
        Some(FrameworkVersion::new(2, 0, 0))
    );
    assert_eq!(
        fw("net461").netstandard_support(),
        Some(FrameworkVersion::new(2, 0, 0))
    );
    assert_eq!(fw("net40").netstandard_support(), None);
}

#[test]
fn builtin_proximity_prefers_same_family_then_closest_version() {
    let table = CompatibilityTable::default();
    let target = fw("netcoreapp2.0");
    let same = table.proximity(&target, &fw("netcoreapp1.0")).unwrap();
    let ns20 = table.proximity(&target, &fw("netstandard2.0")).unwrap();
    let ns13 = table.proximity(&target, &fw("netstandard1.3")).unwrap();
    assert!(same < ns20);
    assert!(ns20 < ns13);
}

#[test]
fn builtin_proximity_rejects_incompatible() {
    let table = CompatibilityTable::default();
    let target = fw("netcoreapp1.1");
    assert!(table.proximity(&target, &fw("netstandard2.0")).is_none());
    assert!(table.proximity(&target, &fw("netcoreapp2.0")).is_none());
    assert!(table.proximity(&target, &fw("net461")).is_none());
}

#[test]
fn explicit_table_overrides_builtin_rules() {
    let mut raw = BTreeMap::new();
    raw.insert(
        "netcoreapp2.0".to_string(),
        vec!["netstandard1.3".to_string(), "netstandard2.0".to_string()],
    );
    let table = CompatibilityTable::from_strings(&raw).unwrap();
    let target = fw("netcoreapp2.0");
    let first = table.proximity(&target, &fw("netstandard1.3")).unwrap();
    let second = table.proximity(&target, &fw("netstandard2.0")).unwrap();
    assert!(first < second);
    assert!(table.proximity(&target, &fw("netcoreapp2.0")).is_none());
}

#[test]
fn explicit_table_rejects_bad_monikers() {
    let mut raw = BTreeMap::new();
    raw.insert("netcoreapp2.0".to_string(), vec!["bogus".to_string()]);
    let err = CompatibilityTable::from_strings(&raw).unwrap_err();
    assert!(err.contains("bogus"));
}

#[test]
fn long_form_identifiers_ignore_case() {
    let lower = fw(".netcoreapp,Version=v2.0");
    assert_eq!(lower, fw("netcoreapp2.0"));
    assert_eq!(lower.identifier(), ".NETCoreApp");
    assert_eq!(lower.to_string(), ".NETCoreApp,Version=v2.0");
    assert_eq!(lower.netstandard_support(), Some(FrameworkVersion::new(2, 0, 0)));

    let table = CompatibilityTable::default();
    assert!(table
        .proximity(&lower, &fw(".NETSTANDARD,Version=v1.3"))
        .is_some());
}
