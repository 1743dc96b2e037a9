#![allow(dead_code)]
use byteorder::{ByteOrder, LittleEndian};
use openssl::asn1::Asn1Time;
use openssl::bn::{BigNum, MsbOption};
use openssl::hash::MessageDigest;
use openssl::pkey::{PKey, Private};
use openssl::rsa::Rsa;
use openssl::x509::extension::{BasicConstraints, ExtendedKeyUsage, KeyUsage};
use openssl::x509::{X509NameBuilder, X509};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

pub fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub const PE_POINTER: usize = 0x40;
pub const COFF_OFFSET: usize = PE_POINTER + 4;
pub const OPT_OFFSET: usize = COFF_OFFSET + 20;
pub const SECTION_TABLE_OFFSET: usize = OPT_OFFSET + 240;
pub const FILE_ALIGNMENT: u32 = 0x200;
pub const SECTION_ALIGNMENT: u32 = 0x1000;
pub const TEXT_VA: u32 = 0x1000;
pub const DATA_VA: u32 = 0x2000;

pub fn text_content() -> Vec<u8> {
    (0..0x100u32).map(|i| (i * 7 + 3) as u8).collect()
}

pub fn data_content() -> Vec<u8> {
    b"bootkit test image data section".repeat(4)
}

/// A minimal PE32+ EFI application with `.text` at 0x1000 and `.data` at
/// 0x2000, no symbols and no certificate table.
pub fn build_pe() -> Vec<u8> {
    let mut buf = vec![0u8; 0x600];
    buf[0] = b'M';
    buf[1] = b'Z';
    LittleEndian::write_u32(&mut buf[0x3c..], PE_POINTER as u32);
    buf[PE_POINTER..PE_POINTER + 4].copy_from_slice(b"PE\0\0");

    let coff = COFF_OFFSET;
    LittleEndian::write_u16(&mut buf[coff..], 0x8664);
    LittleEndian::write_u16(&mut buf[coff + 2..], 2);
    LittleEndian::write_u16(&mut buf[coff + 16..], 240);
    LittleEndian::write_u16(&mut buf[coff + 18..], 0x22);

    let opt = OPT_OFFSET;
    LittleEndian::write_u16(&mut buf[opt..], 0x20b);
    LittleEndian::write_u32(&mut buf[opt + 4..], 0x200); // size of code
    LittleEndian::write_u32(&mut buf[opt + 8..], 0x200); // size of initialized data
    LittleEndian::write_u32(&mut buf[opt + 16..], TEXT_VA); // entry point
    LittleEndian::write_u32(&mut buf[opt + 20..], TEXT_VA); // base of code
    LittleEndian::write_u64(&mut buf[opt + 24..], 0x1000_0000);
    LittleEndian::write_u32(&mut buf[opt + 32..], SECTION_ALIGNMENT);
    LittleEndian::write_u32(&mut buf[opt + 36..], FILE_ALIGNMENT);
    LittleEndian::write_u32(&mut buf[opt + 56..], 0x3000); // size of image
    LittleEndian::write_u32(&mut buf[opt + 60..], 0x200); // size of headers
    LittleEndian::write_u16(&mut buf[opt + 68..], 10); // EFI application
    LittleEndian::write_u64(&mut buf[opt + 72..], 0x10000);
    LittleEndian::write_u64(&mut buf[opt + 80..], 0x1000);
    LittleEndian::write_u64(&mut buf[opt + 88..], 0x10000);
    LittleEndian::write_u64(&mut buf[opt + 96..], 0x1000);
    LittleEndian::write_u32(&mut buf[opt + 108..], 16);

    let text = text_content();
    let data = data_content();
    write_section(&mut buf, 0, b".text", text.len() as u32, TEXT_VA, 0x200, 0x6000_0020);
    write_section(&mut buf, 1, b".data", data.len() as u32, DATA_VA, 0x400, 0xc000_0040);
    buf[0x200..0x200 + text.len()].copy_from_slice(&text);
    buf[0x400..0x400 + data.len()].copy_from_slice(&data);
    buf
}

fn write_section(
    buf: &mut [u8],
    index: usize,
    name: &[u8],
    virtual_size: u32,
    virtual_address: u32,
    pointer: u32,
    characteristics: u32,
) {
    let off = SECTION_TABLE_OFFSET + index * 40;
    buf[off..off + name.len()].copy_from_slice(name);
    LittleEndian::write_u32(&mut buf[off + 8..], virtual_size);
    LittleEndian::write_u32(&mut buf[off + 12..], virtual_address);
    LittleEndian::write_u32(&mut buf[off + 16..], 0x200);
    LittleEndian::write_u32(&mut buf[off + 20..], pointer);
    LittleEndian::write_u32(&mut buf[off + 36..], characteristics);
}

pub fn write_pe(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, build_pe()).unwrap();
    path
}

pub fn read_u32(buf: &[u8], offset: usize) -> u32 {
    LittleEndian::read_u32(&buf[offset..])
}

pub fn read_u16(buf: &[u8], offset: usize) -> u16 {
    LittleEndian::read_u16(&buf[offset..])
}

pub struct TestCert {
    pub der: Vec<u8>,
    pub cert_pem: String,
    pub key_pem: String,
}

fn yesterday() -> Asn1Time {
    let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs() as i64;
    Asn1Time::from_unix(now - 24 * 3600).unwrap()
}

fn serial() -> openssl::asn1::Asn1Integer {
    let mut serial = BigNum::new().unwrap();
    serial.rand(64, MsbOption::MAYBE_ZERO, false).unwrap();
    serial.to_asn1_integer().unwrap()
}

fn name(cn: &str) -> openssl::x509::X509Name {
    let mut name = X509NameBuilder::new().unwrap();
    name.append_entry_by_text("CN", cn).unwrap();
    name.build()
}

fn rsa_key() -> PKey<Private> {
    PKey::from_rsa(Rsa::generate(2048).unwrap()).unwrap()
}

/// A code signing certificate issued by a throwaway CA.
pub fn make_cert(cn: &str) -> TestCert {
    let ca_key = rsa_key();
    let ca_name = name(&format!("{} CA", cn));
    let mut ca = X509::builder().unwrap();
    ca.set_version(2).unwrap();
    ca.set_serial_number(&serial()).unwrap();
    ca.set_subject_name(&ca_name).unwrap();
    ca.set_issuer_name(&ca_name).unwrap();
    ca.set_pubkey(&ca_key).unwrap();
    ca.set_not_before(&yesterday()).unwrap();
    ca.set_not_after(&Asn1Time::days_from_now(365).unwrap()).unwrap();
    ca.append_extension(BasicConstraints::new().critical().ca().build().unwrap())
        .unwrap();
    ca.sign(&ca_key, MessageDigest::sha256()).unwrap();

    let key = rsa_key();
    let mut leaf = X509::builder().unwrap();
    leaf.set_version(2).unwrap();
    leaf.set_serial_number(&serial()).unwrap();
    leaf.set_subject_name(&name(cn)).unwrap();
    leaf.set_issuer_name(&ca_name).unwrap();
    leaf.set_pubkey(&key).unwrap();
    leaf.set_not_before(&yesterday()).unwrap();
    leaf.set_not_after(&Asn1Time::days_from_now(365).unwrap()).unwrap();
    leaf.append_extension(BasicConstraints::new().build().unwrap())
        .unwrap();
    leaf.append_extension(KeyUsage::new().digital_signature().build().unwrap())
        .unwrap();
    leaf.append_extension(ExtendedKeyUsage::new().code_signing().build().unwrap())
        .unwrap();
    leaf.sign(&ca_key, MessageDigest::sha256()).unwrap();
    let cert = leaf.build();

    TestCert {
        der: cert.to_der().unwrap(),
        cert_pem: String::from_utf8(cert.to_pem().unwrap()).unwrap(),
        key_pem: String::from_utf8(key.private_key_to_pem_pkcs8().unwrap()).unwrap(),
    }
}

/// Write `cert.pem` and `guid` into `root/name`.
pub fn write_key_dir(root: &Path, name: &str, cert: &TestCert, guid: &str) -> PathBuf {
    let dir = root.join(name);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("cert.pem"), &cert.cert_pem).unwrap();
    fs::write(dir.join("guid"), format!("{}\n", guid)).unwrap();
    dir
}

/// Write the certificate and key PEM files used for signing.
pub fn write_signing_files(root: &Path, cert: &TestCert) -> (PathBuf, PathBuf) {
    let cert_path = root.join("signing.crt");
    let key_path = root.join("signing.key");
    fs::write(&cert_path, &cert.cert_pem).unwrap();
    fs::write(&key_path, &cert.key_pem).unwrap();
    (cert_path, key_path)
}
