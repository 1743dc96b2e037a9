use bootkit::pe::{apply_sections, Section};
use bootkit::{pem_to_p7, resign, DigestAlgorithm, EfiImage, ErrorKind, SignedOutput, Signer};
use picky::pem::Pem;
use std::fs;

mod common;

#[test]
fn test_sign() {
    common::init();
    let root = tempfile::tempdir().unwrap();
    let binary = common::write_pe(root.path(), "image.efi");
    let cert = common::make_cert("signer");
    let (cert_path, key_path) = common::write_signing_files(root.path(), &cert);
    let output = root.path().join("signed.efi");

    let written = resign(
        &binary,
        &cert_path,
        &key_path,
        &SignedOutput::Path(output.clone()),
    )
    .unwrap();
    assert_eq!(written, output);

    let buf = fs::read(&binary).unwrap();
    let pe = EfiImage::parse(&buf).unwrap();
    let sig = fs::read(&output).unwrap();
    let new_pe = EfiImage::parse(&sig).unwrap();
    assert_eq!(new_pe.signatures.len(), 1);
    assert_eq!(
        new_pe.get_digest_algo().unwrap().unwrap(),
        DigestAlgorithm::SHA2_256
    );
    assert_eq!(
        pe.compute_digest(DigestAlgorithm::SHA2_256).unwrap(),
        new_pe.compute_digest(DigestAlgorithm::SHA2_256).unwrap()
    );
    assert_eq!(
        new_pe.compute_digest(DigestAlgorithm::SHA2_256).unwrap(),
        new_pe.get_digest().unwrap().unwrap()
    );
    assert_eq!(
        new_pe.get_checksum_from_header().unwrap(),
        new_pe.compute_check_sum().unwrap()
    );
    assert_eq!(sig.len() % 8, 0);
    new_pe.verify().unwrap();
}

#[test]
fn test_signer_certificate_embedded() {
    common::init();
    let root = tempfile::tempdir().unwrap();
    let cert = common::make_cert("embedded");
    let (cert_path, key_path) = common::write_signing_files(root.path(), &cert);
    let signer = Signer::from_files(&cert_path, &key_path).unwrap();
    assert_eq!(signer.certificates(), vec![cert.der.clone()]);

    let signed = signer.sign_bytes(&common::build_pe()).unwrap();
    assert!(signed
        .windows(cert.der.len())
        .any(|w| w == cert.der.as_slice()));

    let pe = EfiImage::parse(&signed).unwrap();
    let code = pe.signatures[0].authenticode().unwrap();
    assert_eq!(code.0.decode_certificates().len(), 1);
    pe.verify().unwrap();
}

#[test]
fn test_old_signature_fails_after_edit() {
    common::init();
    let root = tempfile::tempdir().unwrap();
    let binary = common::write_pe(root.path(), "image.efi");
    let cert = common::make_cert("signer");
    let (cert_path, key_path) = common::write_signing_files(root.path(), &cert);
    let signer = Signer::from_files(&cert_path, &key_path).unwrap();

    let signed = signer.sign_bytes(&fs::read(&binary).unwrap()).unwrap();
    let old_sig = EfiImage::parse(&signed).unwrap().signatures[0].clone();

    let edited = apply_sections(
        &signed,
        &[Section::new(".cmdline", 0x30000, b"quiet".to_vec())],
    )
    .unwrap();
    let edited_pe = EfiImage::parse(&edited).unwrap();
    assert!(edited_pe.signatures.is_empty());
    assert!(edited_pe.verify_signature(&old_sig).is_err());

    let resigned = signer.sign_bytes(&edited).unwrap();
    let resigned_pe = EfiImage::parse(&resigned).unwrap();
    assert_eq!(resigned_pe.signatures.len(), 1);
    resigned_pe.verify().unwrap();
}

#[test]
fn test_stale_signature_dropped() {
    common::init();
    let root = tempfile::tempdir().unwrap();
    let cert = common::make_cert("signer");
    let (cert_path, key_path) = common::write_signing_files(root.path(), &cert);
    let signer = Signer::from_files(&cert_path, &key_path).unwrap();

    let mut signed = signer.sign_bytes(&common::build_pe()).unwrap();
    // patch a byte of .data behind the signature's back
    signed[0x400] ^= 0xff;
    let tampered = EfiImage::parse(&signed).unwrap();
    assert_eq!(tampered.signatures.len(), 1);
    assert!(tampered.verify().is_err());

    let resigned = signer.sign_bytes(&signed).unwrap();
    let pe = EfiImage::parse(&resigned).unwrap();
    assert_eq!(pe.signatures.len(), 1);
    pe.verify().unwrap();
}

#[test]
fn test_valid_signature_kept() {
    common::init();
    let root = tempfile::tempdir().unwrap();
    let cert = common::make_cert("signer");
    let (cert_path, key_path) = common::write_signing_files(root.path(), &cert);
    let signer = Signer::from_files(&cert_path, &key_path).unwrap();

    let once = signer.sign_bytes(&common::build_pe()).unwrap();
    let twice = signer.sign_bytes(&once).unwrap();
    let pe = EfiImage::parse(&twice).unwrap();
    assert_eq!(pe.signatures.len(), 2);
    pe.verify().unwrap();
    assert_eq!(
        pe.get_checksum_from_header().unwrap(),
        pe.compute_check_sum().unwrap()
    );
}

#[test]
fn test_output_modes() {
    common::init();
    let root = tempfile::tempdir().unwrap();
    let binary = common::write_pe(root.path(), "image.efi");
    let original = fs::read(&binary).unwrap();
    let cert = common::make_cert("signer");
    let (cert_path, key_path) = common::write_signing_files(root.path(), &cert);

    let sibling = resign(&binary, &cert_path, &key_path, &SignedOutput::Sibling).unwrap();
    assert_eq!(sibling, root.path().join("image.efi.signed"));
    assert_eq!(fs::read(&binary).unwrap(), original);
    EfiImage::parse(&fs::read(&sibling).unwrap())
        .unwrap()
        .verify()
        .unwrap();

    let in_place = resign(&binary, &cert_path, &key_path, &SignedOutput::InPlace).unwrap();
    assert_eq!(in_place, binary);
    let signed = fs::read(&binary).unwrap();
    assert_ne!(signed, original);
    EfiImage::parse(&signed).unwrap().verify().unwrap();
}

#[test]
fn test_pkcs7_certificate_input() {
    common::init();
    let root = tempfile::tempdir().unwrap();
    let binary = common::write_pe(root.path(), "image.efi");
    let cert = common::make_cert("signer");
    let (_, key_path) = common::write_signing_files(root.path(), &cert);

    let p7 = pem_to_p7(cert.cert_pem.as_bytes()).unwrap();
    let p7_path = root.path().join("signing.p7b");
    fs::write(&p7_path, Pem::new("PKCS7", p7.as_slice()).to_string()).unwrap();

    let out = resign(&binary, &p7_path, &key_path, &SignedOutput::Sibling).unwrap();
    EfiImage::parse(&fs::read(out).unwrap())
        .unwrap()
        .verify()
        .unwrap();
}

#[test]
fn test_bad_inputs() {
    common::init();
    let root = tempfile::tempdir().unwrap();
    let binary = common::write_pe(root.path(), "image.efi");
    let original = fs::read(&binary).unwrap();
    let cert = common::make_cert("signer");
    let (cert_path, key_path) = common::write_signing_files(root.path(), &cert);

    // certificate where the key should be
    let err = resign(&binary, &cert_path, &cert_path, &SignedOutput::InPlace).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Input);

    // key where the certificate should be
    let err = resign(&binary, &key_path, &key_path, &SignedOutput::InPlace).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Input);

    let err = resign(
        &binary,
        root.path().join("missing.crt"),
        &key_path,
        &SignedOutput::InPlace,
    )
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Input);

    let garbage = root.path().join("garbage.efi");
    fs::write(&garbage, b"definitely not a PE image").unwrap();
    let err = resign(&garbage, &cert_path, &key_path, &SignedOutput::InPlace).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Input);

    assert_eq!(fs::read(&binary).unwrap(), original);
}
