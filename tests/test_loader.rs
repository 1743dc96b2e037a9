use bootkit::loader::{load_entries, load_entry, load_many, CERT_FILE, GUID_FILE};
use bootkit::{EfiGuid, ErrorKind};
use std::fs;

mod common;

const GUID_A: &str = "0b0fb5a3-5f2c-4a1d-9e7e-7f3c6d1a2b01";
const GUID_B: &str = "0b0fb5a3-5f2c-4a1d-9e7e-7f3c6d1a2b02";

#[test]
fn test_load_entry() {
    common::init();
    let root = tempfile::tempdir().unwrap();
    let cert = common::make_cert("loader");
    let dir = common::write_key_dir(root.path(), "uefi-db", &cert, GUID_A);

    let entry = load_entry(&dir).unwrap();
    assert_eq!(entry.owner, EfiGuid::parse(GUID_A).unwrap());
    assert_eq!(entry.data, cert.der);
}

#[test]
fn test_load_many_keeps_order() {
    common::init();
    let root = tempfile::tempdir().unwrap();
    let a = common::make_cert("first");
    let b = common::make_cert("second");
    let dirs = vec![
        common::write_key_dir(root.path(), "a", &a, GUID_A),
        common::write_key_dir(root.path(), "b", &b, GUID_B),
    ];

    let db = load_many(&dirs).unwrap();
    assert_eq!(db.len(), 2);
    let data: Vec<_> = db.entries().map(|e| e.data.clone()).collect();
    assert_eq!(data, vec![a.der, b.der]);
}

#[test]
fn test_load_entries() {
    common::init();
    let root = tempfile::tempdir().unwrap();
    let a = common::make_cert("entries-a");
    let b = common::make_cert("entries-b");
    let dirs = [
        common::write_key_dir(root.path(), "a", &a, GUID_A),
        common::write_key_dir(root.path(), "b", &b, GUID_B),
    ];

    let entries = load_entries(&dirs).unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].owner, EfiGuid::parse(GUID_A).unwrap());
    assert_eq!(entries[1].owner, EfiGuid::parse(GUID_B).unwrap());
    assert_eq!(entries[1].data, b.der);
}

#[test]
fn test_missing_certificate() {
    common::init();
    let root = tempfile::tempdir().unwrap();
    let cert = common::make_cert("missing");
    let dir = common::write_key_dir(root.path(), "k", &cert, GUID_A);
    fs::remove_file(dir.join(CERT_FILE)).unwrap();

    let err = load_entry(&dir).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Input);
    assert!(err.to_string().contains("No such file"));
}

#[test]
fn test_missing_guid() {
    common::init();
    let root = tempfile::tempdir().unwrap();
    let cert = common::make_cert("no-guid");
    let dir = common::write_key_dir(root.path(), "k", &cert, GUID_A);
    fs::remove_file(dir.join(GUID_FILE)).unwrap();

    let err = load_entry(&dir).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Input);
    assert!(err.to_string().contains("No such file"));
}

#[test]
fn test_bad_guid() {
    common::init();
    let root = tempfile::tempdir().unwrap();
    let cert = common::make_cert("guid");
    let dir = common::write_key_dir(root.path(), "k", &cert, "not-a-guid");
    assert_eq!(load_entry(&dir).unwrap_err().kind(), ErrorKind::Input);
}

#[test]
fn test_wrong_pem_label() {
    common::init();
    let root = tempfile::tempdir().unwrap();
    let cert = common::make_cert("label");
    let dir = common::write_key_dir(root.path(), "k", &cert, GUID_A);
    fs::write(dir.join(CERT_FILE), &cert.key_pem).unwrap();

    let err = load_entry(&dir).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Input);
    assert!(err.to_string().contains("Unexpected pem label"));
}

#[test]
fn test_garbage_certificate() {
    common::init();
    let root = tempfile::tempdir().unwrap();
    let cert = common::make_cert("garbage");
    let dir = common::write_key_dir(root.path(), "k", &cert, GUID_A);
    fs::write(
        dir.join(CERT_FILE),
        "-----BEGIN CERTIFICATE-----\nAAECAwQF\n-----END CERTIFICATE-----\n",
    )
    .unwrap();
    assert_eq!(load_entry(&dir).unwrap_err().kind(), ErrorKind::Input);
}

#[test]
fn test_partial_load() {
    common::init();
    let root = tempfile::tempdir().unwrap();
    let cert = common::make_cert("partial");
    let good = common::write_key_dir(root.path(), "good", &cert, GUID_A);
    let bad = root.path().join("does-not-exist");

    let partial = load_many(&[good, bad]).unwrap_err();
    assert_eq!(partial.loaded.len(), 1);
    assert_eq!(partial.database().len(), 1);
    assert_eq!(partial.error.kind(), ErrorKind::Input);

    let err: bootkit::Error = partial.into();
    assert_eq!(err.kind(), ErrorKind::Input);
}
