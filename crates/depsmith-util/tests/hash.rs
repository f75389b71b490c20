use depsmith_util::hash::sha256_lines;

#[test]
fn sha256_lines_of_nothing_is_empty_hash() {
    assert_eq!(
        sha256_lines(Vec::<String>::new()),
        "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
    );
}

#[test]
fn sha256_lines_terminates_each_line() {
    assert_eq!(
        sha256_lines(["hello"]),
        "5891b5b522d5df086d0ff0b110fbd9d21bb4fc7163af34d08286a2e846f6be03"
    );
}

#[test]
fn sha256_lines_matches_joined_text() {
    let lines = ["runtime\tA\t1.0.0\tlib/Foo.dll", "native\tB\t2.0.0\tfoo.so"];
    assert_eq!(
        sha256_lines(lines),
        "42beff5cdf061be8fdb1ae15f177699f5aff84715d52f6d600faa9c4b49a5d75"
    );
}

#[test]
fn sha256_lines_is_order_sensitive() {
    let a = sha256_lines(["x", "y"]);
    let b = sha256_lines(["y", "x"]);
    assert_ne!(a, b);
}
