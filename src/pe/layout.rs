/*
 *
 *  * // Copyright (c) 2023 Huawei Technologies Co.,Ltd. All rights reserved.
 *  * //
 *  * // signatrust is licensed under Mulan PSL v2.
 *  * // You can use this software according to the terms and conditions of the Mulan
 *  * // PSL v2.
 *  * // You may obtain a copy of Mulan PSL v2 at:
 *  * //         http://license.coscl.org.cn/MulanPSL2
 *  * // THIS SOFTWARE IS PROVIDED ON AN "AS IS" BASIS, WITHOUT WARRANTIES OF ANY
 *  * // KIND, EITHER EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO
 *  * // NON-INFRINGEMENT, MERCHANTABILITY OR FIT FOR A PARTICULAR PURPOSE.
 *  * // See the Mulan PSL v2 for more details.
 *
 */
//! Owned, editable view of a PE/COFF image.
//!
//! The image is split into the header prefix (DOS header, stub, COFF and
//! optional headers with their data directories), the section table with the
//! raw bytes of every section, an optional COFF symbol and string table, and
//! whatever trails after that. [`PeLayout::to_bytes`] lays the pieces out
//! again, so sections can be dropped and appended without patching offsets
//! by hand.
use super::Section;
use crate::error::{
    DuplicateSectionSnafu, HeadersOverflowSnafu, InvalidAlignmentSnafu, InvalidMagicInOptHdrSnafu,
    InvalidSectionNameSnafu, MissingOptHdrSnafu, PESnafu, ReadBtyeSnafu, Result,
    SectionOverlapSnafu, SectionTooLargeSnafu, TruncatedSnafu, WriteBtyeSnafu,
};
use byteorder::{ByteOrder, LittleEndian, ReadBytesExt, WriteBytesExt};
use goblin::pe::header::{SIZEOF_COFF_HEADER, SIZEOF_PE_MAGIC};
use goblin::pe::optional_header::{MAGIC_32, MAGIC_64};
use goblin::pe::PE;
use log::debug;
use snafu::{ensure, OptionExt, ResultExt};
use std::io::Cursor;
use std::mem;
use std::ops::Range;

pub const SIZEOF_SECTION_HEADER: usize = 40;
pub const SIZEOF_SYMBOL: usize = 18;
const SIZEOF_SHORT_NAME: usize = 8;
const SIZEOF_DATA_DIRECTORY: usize = 8;
const CERT_TABLE_INDEX: usize = 4;

// offsets inside the COFF header
const NUMBER_OF_SECTIONS_OFFSET: usize = 2;
const POINTER_TO_SYMBOL_TABLE_OFFSET: usize = 8;
const NUMBER_OF_SYMBOLS_OFFSET: usize = 12;
// offsets inside the optional header
const SIZE_OF_IMAGE_OFFSET: usize = 56;
const SIZE_OF_HEADERS_OFFSET: usize = 60;
const CHECK_SUM_OFFSET: usize = 64;
const DATA_DIRECTORIES_OFFSET_32: usize = 96;
const DATA_DIRECTORIES_OFFSET_64: usize = 112;

pub const IMAGE_SCN_CNT_INITIALIZED_DATA: u32 = 0x0000_0040;
pub const IMAGE_SCN_MEM_READ: u32 = 0x4000_0000;
const IMAGE_SCN_ALIGN_SHIFT: u32 = 20;
const IMAGE_SCN_ALIGN_MAX: u32 = 8192;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SectionHeader {
    pub name: [u8; SIZEOF_SHORT_NAME],
    pub virtual_size: u32,
    pub virtual_address: u32,
    pub size_of_raw_data: u32,
    pub pointer_to_raw_data: u32,
    pub pointer_to_relocations: u32,
    pub pointer_to_linenumbers: u32,
    pub number_of_relocations: u16,
    pub number_of_linenumbers: u16,
    pub characteristics: u32,
}

impl SectionHeader {
    fn parse(buf: &[u8], offset: usize) -> Result<Self> {
        let name_end = offset + SIZEOF_SHORT_NAME;
        ensure!(
            buf.len() >= offset + SIZEOF_SECTION_HEADER,
            TruncatedSnafu {
                what: "section header",
                offset,
                needed: SIZEOF_SECTION_HEADER,
                available: buf.len().saturating_sub(offset)
            }
        );
        let mut header = SectionHeader::default();
        header.name.copy_from_slice(&buf[offset..name_end]);
        let mut rdr = Cursor::new(buf);
        rdr.set_position(name_end as u64);
        header.virtual_size = read_u32(&mut rdr)?;
        header.virtual_address = read_u32(&mut rdr)?;
        header.size_of_raw_data = read_u32(&mut rdr)?;
        header.pointer_to_raw_data = read_u32(&mut rdr)?;
        header.pointer_to_relocations = read_u32(&mut rdr)?;
        header.pointer_to_linenumbers = read_u32(&mut rdr)?;
        header.number_of_relocations = rdr
            .read_u16::<LittleEndian>()
            .context(ReadBtyeSnafu {
                offset: rdr.position() as usize,
                size: mem::size_of::<u16>(),
            })?;
        header.number_of_linenumbers = rdr
            .read_u16::<LittleEndian>()
            .context(ReadBtyeSnafu {
                offset: rdr.position() as usize,
                size: mem::size_of::<u16>(),
            })?;
        header.characteristics = read_u32(&mut rdr)?;
        Ok(header)
    }

    fn write(&self, out: &mut Vec<u8>) -> Result<()> {
        out.extend_from_slice(&self.name);
        for v in [
            self.virtual_size,
            self.virtual_address,
            self.size_of_raw_data,
            self.pointer_to_raw_data,
            self.pointer_to_relocations,
            self.pointer_to_linenumbers,
        ] {
            out.write_u32::<LittleEndian>(v).context(WriteBtyeSnafu {
                offset: out.len(),
                size: mem::size_of::<u32>(),
            })?;
        }
        for v in [self.number_of_relocations, self.number_of_linenumbers] {
            out.write_u16::<LittleEndian>(v).context(WriteBtyeSnafu {
                offset: out.len(),
                size: mem::size_of::<u16>(),
            })?;
        }
        out.write_u32::<LittleEndian>(self.characteristics)
            .context(WriteBtyeSnafu {
                offset: out.len(),
                size: mem::size_of::<u32>(),
            })?;
        Ok(())
    }
}

fn read_u32(rdr: &mut Cursor<&[u8]>) -> Result<u32> {
    let v = rdr.read_u32::<LittleEndian>().context(ReadBtyeSnafu {
        offset: rdr.position() as usize,
        size: mem::size_of::<u32>(),
    })?;
    Ok(v)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SectionRecord {
    pub name: String,
    pub header: SectionHeader,
    /// Raw bytes as stored in the file, `size_of_raw_data` long.
    pub data: Vec<u8>,
}

impl SectionRecord {
    /// Section bytes without the file alignment padding.
    pub fn content(&self) -> &[u8] {
        let len = match self.header.virtual_size as usize {
            0 => self.data.len(),
            n => n.min(self.data.len()),
        };
        &self.data[..len]
    }

    fn span(&self) -> u64 {
        match self.header.virtual_size {
            0 => self.header.size_of_raw_data as u64,
            n => n as u64,
        }
    }
}

/// COFF symbols and the string table that follows them. `strings` holds the
/// whole string table, its leading length field included, so name offsets
/// index it directly.
#[derive(Clone, Debug, PartialEq, Eq)]
struct SymbolTable {
    symbols: Vec<u8>,
    strings: Vec<u8>,
}

impl SymbolTable {
    fn new() -> Self {
        SymbolTable {
            symbols: Vec::new(),
            strings: vec![0u8; mem::size_of::<u32>()],
        }
    }

    fn number_of_symbols(&self) -> u32 {
        (self.symbols.len() / SIZEOF_SYMBOL) as u32
    }

    fn lookup(&self, offset: usize) -> Option<&str> {
        if offset < mem::size_of::<u32>() || offset >= self.strings.len() {
            return None;
        }
        let tail = &self.strings[offset..];
        let end = tail.iter().position(|&b| b == 0).unwrap_or(tail.len());
        std::str::from_utf8(&tail[..end]).ok()
    }

    /// Offset of `name` in the string table, appending it when absent.
    fn intern(&mut self, name: &str) -> usize {
        let mut offset = mem::size_of::<u32>();
        while offset < self.strings.len() {
            let tail = &self.strings[offset..];
            let end = tail.iter().position(|&b| b == 0).unwrap_or(tail.len());
            if &tail[..end] == name.as_bytes() {
                return offset;
            }
            offset += end + 1;
        }
        let offset = self.strings.len();
        self.strings.extend_from_slice(name.as_bytes());
        self.strings.push(0);
        offset
    }

    fn write(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.symbols);
        let mut len = [0u8; 4];
        LittleEndian::write_u32(&mut len, self.strings.len() as u32);
        out.extend_from_slice(&len);
        out.extend_from_slice(&self.strings[mem::size_of::<u32>()..]);
    }
}

#[derive(Clone, Debug)]
pub struct PeLayout {
    prefix: Vec<u8>,
    coff_offset: usize,
    opt_offset: usize,
    cert_dir_offset: Option<usize>,
    file_alignment: u32,
    section_alignment: u32,
    sections: Vec<SectionRecord>,
    symbols: Option<SymbolTable>,
    overlay: Vec<u8>,
    had_signatures: bool,
}

impl PeLayout {
    pub fn parse(buf: &[u8]) -> Result<Self> {
        let pe = PE::parse(buf).context(PESnafu {})?;
        let hdr = pe.header.optional_header.context(MissingOptHdrSnafu {})?;
        let coff = &pe.header.coff_header;

        let coff_offset = pe.header.dos_header.pe_pointer as usize + SIZEOF_PE_MAGIC;
        let opt_offset = coff_offset + SIZEOF_COFF_HEADER;
        let table_offset = opt_offset + coff.size_of_optional_header as usize;
        let dd_offset = match hdr.standard_fields.magic {
            MAGIC_32 => opt_offset + DATA_DIRECTORIES_OFFSET_32,
            MAGIC_64 => opt_offset + DATA_DIRECTORIES_OFFSET_64,
            magic => InvalidMagicInOptHdrSnafu { magic }.fail()?,
        };
        let cert_dir_offset = if hdr.windows_fields.number_of_rva_and_sizes as usize
            > CERT_TABLE_INDEX
        {
            Some(dd_offset + CERT_TABLE_INDEX * SIZEOF_DATA_DIRECTORY)
        } else {
            None
        };
        let cert_table = match hdr
            .data_directories
            .get_certificate_table()
            .clone()
            .filter(|dd| dd.size != 0)
        {
            Some(dd) => {
                // the certificate directory holds a file offset, not an RVA
                let start = dd.virtual_address as usize;
                let end = start + dd.size as usize;
                ensure!(
                    end <= buf.len(),
                    TruncatedSnafu {
                        what: "certificate table",
                        offset: start,
                        needed: dd.size as usize,
                        available: buf.len().saturating_sub(start)
                    }
                );
                Some(start..end)
            }
            None => None,
        };

        let symbols = parse_symbols(
            buf,
            coff.pointer_to_symbol_table as usize,
            coff.number_of_symbol_table as usize,
        )?;

        let size_of_headers = hdr.windows_fields.size_of_headers as usize;
        let mut tail_start = size_of_headers.min(buf.len());
        let mut sections = Vec::with_capacity(coff.number_of_sections as usize);
        for i in 0..coff.number_of_sections as usize {
            let header = SectionHeader::parse(buf, table_offset + i * SIZEOF_SECTION_HEADER)?;
            let name = decode_name(&header.name, symbols.as_ref())?;
            let start = header.pointer_to_raw_data as usize;
            let end = start + header.size_of_raw_data as usize;
            let data = if header.size_of_raw_data == 0 {
                Vec::new()
            } else {
                ensure!(
                    buf.len() >= end,
                    TruncatedSnafu {
                        what: "section data",
                        offset: start,
                        needed: header.size_of_raw_data as usize,
                        available: buf.len().saturating_sub(start)
                    }
                );
                tail_start = tail_start.max(end);
                buf[start..end].to_vec()
            };
            debug!(
                "section {:<12} va {:#010x} vsize {:#x} raw [{:#x} - {:#x}]",
                name, header.virtual_address, header.virtual_size, start, end
            );
            sections.push(SectionRecord { name, header, data });
        }
        if let Some(ref st) = symbols {
            let end = coff.pointer_to_symbol_table as usize + st.symbols.len() + st.strings.len();
            tail_start = tail_start.max(end);
        }

        let overlay = match cert_table {
            Some(ref cert) => {
                let mut overlay = Vec::new();
                if cert.start > tail_start {
                    overlay.extend_from_slice(&buf[tail_start..cert.start.min(buf.len())]);
                }
                if cert.end < buf.len() {
                    overlay.extend_from_slice(&buf[cert.end.max(tail_start)..]);
                }
                overlay
            }
            None => buf[tail_start.min(buf.len())..].to_vec(),
        };
        if !overlay.is_empty() {
            debug!("keeping {:#x} bytes of trailing data", overlay.len());
        }

        Ok(PeLayout {
            prefix: buf[..table_offset].to_vec(),
            coff_offset,
            opt_offset,
            cert_dir_offset,
            file_alignment: hdr.windows_fields.file_alignment,
            section_alignment: hdr.windows_fields.section_alignment,
            sections,
            symbols,
            overlay,
            had_signatures: cert_table.is_some(),
        })
    }

    pub fn sections(&self) -> &[SectionRecord] {
        &self.sections
    }

    pub fn section(&self, name: &str) -> Option<&SectionRecord> {
        self.sections.iter().find(|s| s.name == name)
    }

    pub fn file_alignment(&self) -> u32 {
        self.file_alignment
    }

    pub fn section_alignment(&self) -> u32 {
        self.section_alignment
    }

    /// Whether the parsed image carried an attribute certificate table.
    /// [`PeLayout::to_bytes`] never writes one back.
    pub fn had_signatures(&self) -> bool {
        self.had_signatures
    }

    /// Drop every section called `name`, returning how many were removed.
    pub fn remove_section(&mut self, name: &str) -> usize {
        let before = self.sections.len();
        self.sections.retain(|s| s.name != name);
        before - self.sections.len()
    }

    /// Append a section. The section must not share its name with an
    /// existing one and must not overlap the headers or any other section
    /// once mapped.
    pub fn add_section(&mut self, section: &Section) -> Result<()> {
        validate_name(&section.name)?;
        ensure!(
            self.section(&section.name).is_none(),
            DuplicateSectionSnafu {
                name: section.name.as_str()
            }
        );
        let explicit = section.alignment.filter(|&a| a != 0);
        let alignment = explicit.unwrap_or(self.section_alignment);
        ensure!(
            alignment != 0
                && alignment.is_power_of_two()
                && section.virtual_address % alignment == 0,
            InvalidAlignmentSnafu {
                name: section.name.as_str(),
                alignment,
                virtual_address: section.virtual_address
            }
        );

        let size = section.data.len() as u64;
        let limit = u32::MAX as u64 - section.virtual_address as u64;
        ensure!(
            align_up(size, self.file_alignment as u64) <= limit,
            SectionTooLargeSnafu {
                name: section.name.as_str(),
                size,
                limit
            }
        );

        let range = self.mapped(section.virtual_address, size);
        let headers = 0..align_up(
            self.size_of_headers(self.sections.len() + 1),
            self.section_alignment as u64,
        );
        check_overlap(&section.name, &range, "headers", &headers)?;
        for other in self.sections.iter() {
            let other_range = self.mapped(other.header.virtual_address, other.span());
            check_overlap(&section.name, &range, &other.name, &other_range)?;
        }

        let name = self.encode_name(&section.name)?;
        let mut characteristics = IMAGE_SCN_CNT_INITIALIZED_DATA | IMAGE_SCN_MEM_READ;
        if let Some(a) = explicit.filter(|&a| a <= IMAGE_SCN_ALIGN_MAX) {
            characteristics |= (a.trailing_zeros() + 1) << IMAGE_SCN_ALIGN_SHIFT;
        }
        let mut data = section.data.clone();
        data.resize(align_up(size, self.file_alignment as u64) as usize, 0);
        let header = SectionHeader {
            name,
            virtual_size: size as u32,
            virtual_address: section.virtual_address,
            size_of_raw_data: data.len() as u32,
            characteristics,
            ..Default::default()
        };
        debug!(
            "add section {} at {:#x}, {:#x} bytes",
            section.name, section.virtual_address, size
        );
        self.sections.push(SectionRecord {
            name: section.name.clone(),
            header,
            data,
        });
        Ok(())
    }

    /// Serialize the image. Section data is laid out in section table order
    /// right after the headers, the certificate table directory entry and the
    /// checksum are cleared.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let fa = self.file_alignment as u64;
        let table_offset = self.prefix.len();
        let size_of_headers = self.size_of_headers(self.sections.len());
        if let Some(first_va) = self.sections.iter().map(|s| s.header.virtual_address).min() {
            ensure!(
                size_of_headers <= first_va as u64,
                HeadersOverflowSnafu {
                    size_of_headers: size_of_headers.min(u32::MAX as u64) as u32,
                    first_va
                }
            );
        }

        let mut out = self.prefix.clone();
        out.resize(size_of_headers as usize, 0);
        let mut table = Vec::with_capacity(self.sections.len() * SIZEOF_SECTION_HEADER);
        for rec in self.sections.iter() {
            let mut header = rec.header.clone();
            if rec.data.is_empty() {
                header.pointer_to_raw_data = 0;
            } else {
                header.pointer_to_raw_data = file_offset(&rec.name, out.len())?;
                out.extend_from_slice(&rec.data);
                out.resize(align_up(out.len() as u64, fa) as usize, 0);
            }
            header.size_of_raw_data = rec.data.len() as u32;
            header.write(&mut table)?;
        }
        out[table_offset..table_offset + table.len()].copy_from_slice(&table);

        let (pointer_to_symbol_table, number_of_symbols) = match self.symbols {
            Some(ref st) => {
                let pointer = file_offset("symbol table", out.len())?;
                st.write(&mut out);
                (pointer, st.number_of_symbols())
            }
            None => (0, 0),
        };
        out.extend_from_slice(&self.overlay);
        file_offset("image", out.len())?;

        let coff = self.coff_offset;
        LittleEndian::write_u16(
            &mut out[coff + NUMBER_OF_SECTIONS_OFFSET..],
            self.sections.len() as u16,
        );
        LittleEndian::write_u32(
            &mut out[coff + POINTER_TO_SYMBOL_TABLE_OFFSET..],
            pointer_to_symbol_table,
        );
        LittleEndian::write_u32(&mut out[coff + NUMBER_OF_SYMBOLS_OFFSET..], number_of_symbols);

        let opt = self.opt_offset;
        LittleEndian::write_u32(&mut out[opt + SIZE_OF_IMAGE_OFFSET..], self.size_of_image(size_of_headers)?);
        LittleEndian::write_u32(&mut out[opt + SIZE_OF_HEADERS_OFFSET..], size_of_headers as u32);
        LittleEndian::write_u32(&mut out[opt + CHECK_SUM_OFFSET..], 0);
        if let Some(dd) = self.cert_dir_offset {
            out[dd..dd + SIZEOF_DATA_DIRECTORY].fill(0);
        }
        debug!(
            "image rebuilt: {} sections, {:#x} bytes of headers, {:#x} bytes total",
            self.sections.len(),
            size_of_headers,
            out.len()
        );
        Ok(out)
    }

    fn size_of_headers(&self, sections: usize) -> u64 {
        align_up(
            (self.prefix.len() + sections * SIZEOF_SECTION_HEADER) as u64,
            self.file_alignment as u64,
        )
    }

    fn size_of_image(&self, size_of_headers: u64) -> Result<u32> {
        let sa = self.section_alignment as u64;
        let end = self
            .sections
            .iter()
            .map(|s| align_up(s.header.virtual_address as u64 + s.span(), sa))
            .fold(align_up(size_of_headers, sa), u64::max);
        ensure!(
            end <= u32::MAX as u64,
            SectionTooLargeSnafu {
                name: "image",
                size: end,
                limit: u32::MAX as u64
            }
        );
        Ok(end as u32)
    }

    fn mapped(&self, virtual_address: u32, size: u64) -> Range<u64> {
        let start = virtual_address as u64;
        start..start + align_up(size, self.section_alignment as u64)
    }

    fn encode_name(&mut self, name: &str) -> Result<[u8; SIZEOF_SHORT_NAME]> {
        let mut raw = [0u8; SIZEOF_SHORT_NAME];
        if name.len() <= SIZEOF_SHORT_NAME {
            raw[..name.len()].copy_from_slice(name.as_bytes());
            return Ok(raw);
        }
        let offset = self
            .symbols
            .get_or_insert_with(SymbolTable::new)
            .intern(name);
        let encoded = format!("/{}", offset);
        ensure!(
            encoded.len() <= SIZEOF_SHORT_NAME,
            InvalidSectionNameSnafu {
                name,
                reason: format!("string table offset {} does not fit", offset)
            }
        );
        raw[..encoded.len()].copy_from_slice(encoded.as_bytes());
        Ok(raw)
    }
}

/// Reject names that cannot be stored in a section header.
pub(crate) fn validate_name(name: &str) -> Result<()> {
    ensure!(
        !name.is_empty(),
        InvalidSectionNameSnafu {
            name,
            reason: "empty name"
        }
    );
    ensure!(
        !name.contains('\0'),
        InvalidSectionNameSnafu {
            name,
            reason: "contains a NUL byte"
        }
    );
    ensure!(
        !name.starts_with('/'),
        InvalidSectionNameSnafu {
            name,
            reason: "a leading '/' marks a string table reference"
        }
    );
    Ok(())
}

/// Fail when any two sections in one request share a name.
pub(crate) fn ensure_unique(sections: &[Section]) -> Result<()> {
    for (i, s) in sections.iter().enumerate() {
        ensure!(
            !sections[..i].iter().any(|o| o.name == s.name),
            DuplicateSectionSnafu {
                name: s.name.as_str()
            }
        );
    }
    Ok(())
}

fn check_overlap(name: &str, range: &Range<u64>, other: &str, other_range: &Range<u64>) -> Result<()> {
    let disjoint = range.is_empty()
        || other_range.is_empty()
        || range.end <= other_range.start
        || other_range.end <= range.start;
    ensure!(
        disjoint,
        SectionOverlapSnafu {
            name,
            other,
            start: range.start,
            end: range.end
        }
    );
    Ok(())
}

fn decode_name(raw: &[u8; SIZEOF_SHORT_NAME], symbols: Option<&SymbolTable>) -> Result<String> {
    let end = raw.iter().position(|&b| b == 0).unwrap_or(SIZEOF_SHORT_NAME);
    let short = String::from_utf8_lossy(&raw[..end]).into_owned();
    if !short.starts_with('/') {
        return Ok(short);
    }
    let offset: usize = short[1..].parse().ok().context(InvalidSectionNameSnafu {
        name: short.as_str(),
        reason: "bad string table offset",
    })?;
    let long = symbols
        .and_then(|st| st.lookup(offset))
        .context(InvalidSectionNameSnafu {
            name: short.as_str(),
            reason: "no such string table entry",
        })?;
    Ok(long.to_string())
}

fn parse_symbols(buf: &[u8], pointer: usize, count: usize) -> Result<Option<SymbolTable>> {
    if pointer == 0 {
        return Ok(None);
    }
    let strings_offset = pointer + count * SIZEOF_SYMBOL;
    let len_field = mem::size_of::<u32>();
    ensure!(
        buf.len() >= strings_offset + len_field,
        TruncatedSnafu {
            what: "symbol table",
            offset: pointer,
            needed: strings_offset + len_field - pointer,
            available: buf.len().saturating_sub(pointer)
        }
    );
    let strings_len = (LittleEndian::read_u32(&buf[strings_offset..]) as usize).max(len_field);
    ensure!(
        buf.len() >= strings_offset + strings_len,
        TruncatedSnafu {
            what: "string table",
            offset: strings_offset,
            needed: strings_len,
            available: buf.len() - strings_offset
        }
    );
    let mut strings = buf[strings_offset..strings_offset + strings_len].to_vec();
    if strings.len() < len_field {
        strings.resize(len_field, 0);
    }
    Ok(Some(SymbolTable {
        symbols: buf[pointer..strings_offset].to_vec(),
        strings,
    }))
}

fn file_offset(name: &str, offset: usize) -> Result<u32> {
    ensure!(
        offset as u64 <= u32::MAX as u64,
        SectionTooLargeSnafu {
            name,
            size: offset as u64,
            limit: u32::MAX as u64
        }
    );
    Ok(offset as u32)
}

fn align_up(value: u64, alignment: u64) -> u64 {
    if alignment <= 1 {
        return value;
    }
    (value + alignment - 1) / alignment * alignment
}
