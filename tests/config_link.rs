//! Integration test for spec §8 scenario S3 (configuration link
//! round-trip), driven against real on-disk configurations rather than
//! the in-memory fixtures `config::link`'s unit tests use.

use bpkg::config::link;
use bpkg::config::store::Config;

fn logger() -> slog::Logger {
    slog::Logger::root(slog::Discard, slog::o!())
}

#[test]
fn s3_link_then_unlink_round_trips_both_sides() {
    let a_dir = tempfile::tempdir().unwrap();
    let b_dir = tempfile::tempdir().unwrap();

    let mut a = Config::create(a_dir.path(), "target", None, logger()).unwrap();
    let mut b = Config::create(b_dir.path(), "host", None, logger()).unwrap();

    link::link(&mut a, a_dir.path(), &b, b_dir.path(), Some("b".to_string()), false).unwrap();

    let a_links = a.connection()
        .prepare("SELECT name, uuid, explicit FROM config_link")
        .unwrap()
        .query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?, row.get::<_, i64>(2)?))
        })
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    assert_eq!(a_links.len(), 1);
    assert_eq!(a_links[0].0, "b");
    assert_eq!(a_links[0].1, b.uuid.to_string());
    assert_eq!(a_links[0].2, 1, "A's row must be explicit");

    let b_links = b.connection()
        .prepare("SELECT name, uuid, explicit FROM config_link")
        .unwrap()
        .query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?, row.get::<_, i64>(2)?))
        })
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    assert_eq!(b_links.len(), 1);
    assert_eq!(b_links[0].1, a.uuid.to_string());
    assert_eq!(b_links[0].2, 0, "B's mirror row must be implicit");

    link::unlink(&mut a, &mut b, "b", false).unwrap();

    let a_links_after: Vec<String> = a
        .connection()
        .prepare("SELECT name FROM config_link")
        .unwrap()
        .query_map([], |row| row.get::<_, String>(0))
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    assert!(a_links_after.is_empty());

    let b_links_after: Vec<String> = b
        .connection()
        .prepare("SELECT name FROM config_link")
        .unwrap()
        .query_map([], |row| row.get::<_, String>(0))
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    assert!(b_links_after.is_empty());
}

#[test]
fn opening_an_already_locked_configuration_fails_busy() {
    let dir = tempfile::tempdir().unwrap();
    let a = Config::create(dir.path(), "target", None, logger()).unwrap();
    let a_reopened = Config::open(dir.path(), logger());
    // Opening the same directory twice concurrently must fail: the
    // first `Config` still holds the exclusive lock (spec §4.1 "failing
    // with a configuration busy error if unable").
    assert!(a_reopened.is_err());
    drop(a);
}
