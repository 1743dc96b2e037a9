use bootkit::pe::{apply_sections, set_sections, PeLayout, Section, SectionDescriptor};
use bootkit::ErrorKind;
use byteorder::{ByteOrder, LittleEndian};
use goblin::pe::PE;
use std::fs;

mod common;

use common::{DATA_VA, OPT_OFFSET, SECTION_TABLE_OFFSET, TEXT_VA};

#[test]
fn test_add_section() {
    common::init();
    let base = common::build_pe();
    let payload = b"hello section".to_vec();
    let out = apply_sections(&base, &[Section::new(".extra", 0x3000, payload.clone())]).unwrap();

    let layout = PeLayout::parse(&out).unwrap();
    assert_eq!(layout.sections().len(), 3);
    let extra = layout.section(".extra").unwrap();
    assert_eq!(extra.content(), payload.as_slice());
    assert_eq!(extra.header.virtual_address, 0x3000);
    assert_eq!(extra.header.size_of_raw_data, 0x200);
    assert_eq!(extra.header.pointer_to_raw_data % 0x200, 0);
    assert_eq!(layout.section(".text").unwrap().content(), common::text_content().as_slice());
    assert_eq!(layout.section(".data").unwrap().content(), common::data_content().as_slice());

    let pe = PE::parse(&out).unwrap();
    assert_eq!(pe.sections.len(), 3);
    let hdr = pe.header.optional_header.unwrap();
    assert_eq!(hdr.windows_fields.size_of_image, 0x4000);
    assert_eq!(hdr.windows_fields.check_sum, 0);
}

#[test]
fn test_set_sections_is_idempotent() {
    common::init();
    let root = tempfile::tempdir().unwrap();
    let binary = common::write_pe(root.path(), "image.efi");
    let content = root.path().join("payload");
    fs::write(&content, vec![0x5a; 0x345]).unwrap();
    let descriptors = [SectionDescriptor::new(".payload", 0x4000, &content)];

    set_sections(&binary, &descriptors).unwrap();
    let once = fs::read(&binary).unwrap();
    set_sections(&binary, &descriptors).unwrap();
    let twice = fs::read(&binary).unwrap();
    assert_eq!(once, twice);

    let layout = PeLayout::parse(&twice).unwrap();
    let count = layout
        .sections()
        .iter()
        .filter(|s| s.name == ".payload")
        .count();
    assert_eq!(count, 1);
}

#[test]
fn test_replace_section_content() {
    common::init();
    let base = common::build_pe();
    let first = apply_sections(&base, &[Section::new(".payload", 0x4000, vec![1; 0x900])]).unwrap();
    let second = apply_sections(&first, &[Section::new(".payload", 0x4000, vec![2; 0x10])]).unwrap();

    let layout = PeLayout::parse(&second).unwrap();
    assert_eq!(layout.sections().len(), 3);
    assert_eq!(layout.section(".payload").unwrap().content(), &[2; 0x10]);
    assert!(second.len() < first.len());
}

#[test]
fn test_long_section_name() {
    common::init();
    let base = common::build_pe();
    let out = apply_sections(
        &base,
        &[Section::new(".vendor_cert", 0x3000, b"vendor".to_vec())],
    )
    .unwrap();

    let raw_name = &out[SECTION_TABLE_OFFSET + 2 * 40..SECTION_TABLE_OFFSET + 2 * 40 + 8];
    assert_eq!(raw_name[0], b'/');

    let layout = PeLayout::parse(&out).unwrap();
    assert_eq!(layout.section(".vendor_cert").unwrap().content(), b"vendor");

    // a second edit reuses the string table entry
    let again = apply_sections(
        &out,
        &[Section::new(".vendor_cert", 0x3000, b"vendor".to_vec())],
    )
    .unwrap();
    assert_eq!(again, out);
}

#[test]
fn test_overlap_with_existing_section() {
    common::init();
    let base = common::build_pe();
    let err = apply_sections(&base, &[Section::new(".evil", DATA_VA, vec![0; 16])]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SecurityInvariant);

    let err = apply_sections(&base, &[Section::new(".evil", TEXT_VA, vec![0; 16])]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SecurityInvariant);
}

#[test]
fn test_overlap_between_requested_sections() {
    common::init();
    let base = common::build_pe();
    let err = apply_sections(
        &base,
        &[
            Section::new(".one", 0x10000, vec![0; 0x2000]),
            Section::new(".two", 0x11000, vec![0; 0x10]),
        ],
    )
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SecurityInvariant);
}

#[test]
fn test_overlap_with_headers() {
    common::init();
    let base = common::build_pe();
    let err = apply_sections(&base, &[Section::new(".hdr", 0, vec![0; 0x10])]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SecurityInvariant);
}

#[test]
fn test_alignment() {
    common::init();
    let base = common::build_pe();
    let err = apply_sections(&base, &[Section::new(".odd", 0x3100, vec![0; 0x10])]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Input);

    let err = apply_sections(
        &base,
        &[Section::new(".odd", 0x3000, vec![0; 0x10]).with_alignment(0x300)],
    )
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Input);

    let out = apply_sections(
        &base,
        &[Section::new(".sbat", 0x50000, b"sbat".to_vec()).with_alignment(512)],
    )
    .unwrap();
    let layout = PeLayout::parse(&out).unwrap();
    let sbat = layout.section(".sbat").unwrap();
    // IMAGE_SCN_ALIGN_512BYTES
    assert_eq!(sbat.header.characteristics & 0x00f0_0000, 0x00a0_0000);
    assert_eq!(sbat.header.characteristics & 0x4000_0040, 0x4000_0040);
}

#[test]
fn test_duplicate_names_rejected() {
    common::init();
    let base = common::build_pe();
    let err = apply_sections(
        &base,
        &[
            Section::new(".dup", 0x10000, vec![1]),
            Section::new(".dup", 0x20000, vec![2]),
        ],
    )
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Input);

    let err = apply_sections(&base, &[Section::new("", 0x10000, vec![1])]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Input);
}

#[test]
fn test_section_table_grows() {
    common::init();
    let base = common::build_pe();
    let sections: Vec<_> = (0..4)
        .map(|i| Section::new(format!(".s{}", i), 0x10000 * (i + 1), vec![i as u8 + 1; 0x300]))
        .collect();
    let out = apply_sections(&base, &sections).unwrap();

    // six headers no longer fit below 0x200
    assert_eq!(common::read_u32(&out, OPT_OFFSET + 60), 0x400);
    let layout = PeLayout::parse(&out).unwrap();
    assert_eq!(layout.sections().len(), 6);
    assert_eq!(layout.section(".text").unwrap().header.pointer_to_raw_data, 0x400);
    assert_eq!(layout.section(".text").unwrap().content(), common::text_content().as_slice());
    for (i, s) in sections.iter().enumerate() {
        assert_eq!(layout.section(&s.name).unwrap().content(), &[i as u8 + 1; 0x300]);
    }
    assert_eq!(common::read_u32(&out, OPT_OFFSET + 56), 0x41000);
}

#[test]
fn test_headers_overflow() {
    common::init();
    let base = common::build_pe();
    // enough section headers to run past the first section at 0x1000
    let sections: Vec<_> = (0..100u32)
        .map(|i| Section::new(format!(".n{}", i), 0x100000 + i * 0x1000, vec![1]))
        .collect();
    let err = apply_sections(&base, &sections).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SecurityInvariant);
}

#[test]
fn test_missing_content_leaves_file_untouched() {
    common::init();
    let root = tempfile::tempdir().unwrap();
    let binary = common::write_pe(root.path(), "image.efi");
    let before = fs::read(&binary).unwrap();

    let err = set_sections(
        &binary,
        &[SectionDescriptor::new(".gone", 0x4000, root.path().join("nope"))],
    )
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Input);
    assert_eq!(fs::read(&binary).unwrap(), before);

    let content = root.path().join("payload");
    fs::write(&content, b"x").unwrap();
    let err = set_sections(
        &binary,
        &[SectionDescriptor::new(".bad", DATA_VA, &content)],
    )
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SecurityInvariant);
    assert_eq!(fs::read(&binary).unwrap(), before);
}

#[test]
fn test_missing_binary() {
    common::init();
    let root = tempfile::tempdir().unwrap();
    let content = root.path().join("payload");
    fs::write(&content, b"x").unwrap();
    let err = set_sections(
        root.path().join("absent.efi"),
        &[SectionDescriptor::new(".p", 0x4000, &content)],
    )
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Input);
}

#[test]
fn test_malformed_pe() {
    common::init();
    let err = apply_sections(b"MZ not really a pe", &[]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Input);
}

#[test]
fn test_certificate_directory_out_of_range() {
    common::init();
    let mut base = common::build_pe();
    // data directory 4 holds the certificate table
    let cert_dir = OPT_OFFSET + 112 + 4 * 8;
    LittleEndian::write_u32(&mut base[cert_dir..], 0xffff_fff0);
    LittleEndian::write_u32(&mut base[cert_dir + 4..], 0x20);

    let err = apply_sections(&base, &[Section::new(".cmdline", 0x30000, b"x".to_vec())])
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Format);

    LittleEndian::write_u32(&mut base[cert_dir..], 0x500);
    LittleEndian::write_u32(&mut base[cert_dir + 4..], 0x200);
    assert_eq!(PeLayout::parse(&base).unwrap_err().kind(), ErrorKind::Format);
}
