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
//! Authenticode view of an EFI image: digest, checksum and the attribute
//! certificate table.
use crate::error::{
    AlgorithmSnafu, AuthenticodeSnafu, ComputeDigestSnafu, InvalidMagicInOptHdrSnafu,
    MissingOptHdrSnafu, NoDigestAlgoSnafu, PESnafu, ParseImageSnafu, ReadBtyeSnafu, Result,
    TruncatedSnafu, WinCertSnafu, WriteBtyeSnafu,
};
use byteorder::{ByteOrder, LittleEndian, ReadBytesExt, WriteBytesExt};
use digest::DynDigest;
use goblin::pe::data_directories::{DataDirectory, SIZEOF_DATA_DIRECTORY};
use goblin::pe::header::{PE_MAGIC, SIZEOF_COFF_HEADER, SIZEOF_PE_MAGIC};
use goblin::pe::optional_header::{
    MAGIC_32, MAGIC_64, SIZEOF_STANDARD_FIELDS_32, SIZEOF_STANDARD_FIELDS_64,
    SIZEOF_WINDOWS_FIELDS_32, SIZEOF_WINDOWS_FIELDS_64,
};
use goblin::pe::section_table::SectionTable;
use goblin::pe::PE;
use log::{debug, warn};
use picky::x509::date::UtcDate;
use picky::x509::pkcs7::authenticode::{AuthenticodeSignature, ShaVariant};
use picky::x509::wincert::WinCertificate;
use snafu::{ensure, OptionExt, ResultExt};
use std::io::Cursor;
use std::mem;

pub type DigestAlgorithm = ShaVariant;

/// One `WIN_CERTIFICATE` entry of the attribute certificate table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Signature(pub WinCertificate);

impl Signature {
    pub fn authenticode(&self) -> Result<AuthenticodeSignature> {
        let code =
            AuthenticodeSignature::from_der(self.0.get_certificate()).context(AuthenticodeSnafu {})?;
        Ok(code)
    }

    /// Image digest the signature was made over.
    pub fn file_hash(&self) -> Result<Option<Vec<u8>>> {
        Ok(self.authenticode()?.file_hash())
    }

    pub fn digest_algo(&self) -> Result<DigestAlgorithm> {
        let code = self.authenticode()?;
        let algo = code.0.digest_algorithms().first().context(NoDigestAlgoSnafu {})?;
        Ok(ShaVariant::try_from(algo.oid_asn1().clone()).context(AlgorithmSnafu {})?)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Span {
    pub offset: usize,
    pub data: Vec<u8>,
}

impl Span {
    fn end(&self) -> usize {
        self.offset + self.data.len()
    }
}

#[derive(Debug)]
pub struct EfiImage<'a> {
    pub pe: Box<PE<'a>>,
    pub raw: Vec<u8>,
    pub checksum: Span,
    pub cert_table: Option<Span>,
    pub cert_data_directory: Span,
    pub overlay: Option<Vec<Span>>,
    pub signatures: Vec<Signature>,
}

const CHECK_SUM_OFFSET: usize = 64; // offset from start of optional header to check sum filed
const SIZEOF_CHECKSUM: usize = mem::size_of::<u32>();
const CERT_TABLE_OFFSET: usize = 4 * SIZEOF_DATA_DIRECTORY; // offset from start of data directories to cert table direcotory
const SIZEOF_CERT_TABLE: usize = SIZEOF_DATA_DIRECTORY;
const SIZEOF_WIN_CERT_HEADER: usize = 8;
const WIN_CERT_ALIGNMENT: usize = 8;

fn align8(v: usize) -> usize {
    (v + WIN_CERT_ALIGNMENT - 1) / WIN_CERT_ALIGNMENT * WIN_CERT_ALIGNMENT
}

fn slice<'b>(raw: &'b [u8], start: usize, end: usize, what: &'static str) -> Result<&'b [u8]> {
    ensure!(
        start <= end && end <= raw.len(),
        TruncatedSnafu {
            what,
            offset: start,
            needed: end.saturating_sub(start),
            available: raw.len().saturating_sub(start)
        }
    );
    Ok(&raw[start..end])
}

impl<'a> EfiImage<'a> {
    fn get_cert_table_addr(pe: &PE) -> Result<Option<DataDirectory>> {
        Ok(pe
            .header
            .optional_header
            .context(MissingOptHdrSnafu {})?
            .data_directories
            .get_certificate_table()
            .clone())
    }

    fn get_cert_table_section(pe: &PE, pe_raw: &[u8]) -> Result<Option<Span>> {
        let Some(dd) = EfiImage::get_cert_table_addr(pe)? else {
            return Ok(None);
        };
        let start = dd.virtual_address as usize;
        let data = slice(pe_raw, start, start + dd.size as usize, "certificate table")?;
        Ok(Some(Span {
            offset: start,
            data: data.to_vec(),
        }))
    }

    fn get_cert_table_offset(pe: &PE) -> Result<usize> {
        let hdr = pe.header.optional_header.context(MissingOptHdrSnafu {})?;
        // get size of |< -- >|
        let offset = match hdr.standard_fields.magic {
            MAGIC_32 => {
                SIZEOF_WINDOWS_FIELDS_32 + SIZEOF_STANDARD_FIELDS_32
                    - CHECK_SUM_OFFSET
                    - SIZEOF_CHECKSUM
                    + CERT_TABLE_OFFSET
            }
            MAGIC_64 => {
                SIZEOF_WINDOWS_FIELDS_64 + SIZEOF_STANDARD_FIELDS_64
                    - CHECK_SUM_OFFSET
                    - SIZEOF_CHECKSUM
                    + CERT_TABLE_OFFSET
            }
            _ => InvalidMagicInOptHdrSnafu {
                magic: hdr.standard_fields.magic,
            }
            .fail()?,
        };
        Ok(offset)
    }

    fn get_check_sum_offset(pe: &PE) -> usize {
        // check_sum offset = pe_signature addr + sizeof pe signature + sizeof PE_Header
        pe.header.dos_header.pe_pointer as usize
            + SIZEOF_PE_MAGIC
            + SIZEOF_COFF_HEADER
            + CHECK_SUM_OFFSET
    }

    fn get_check_sum_section(pe: &PE, pe_raw: &[u8]) -> Result<Span> {
        let offset = EfiImage::get_check_sum_offset(pe);
        Ok(Span {
            offset,
            data: slice(pe_raw, offset, offset + SIZEOF_CHECKSUM, "checksum")?.to_vec(),
        })
    }

    fn get_dd_offset(pe: &PE) -> Result<usize> {
        Ok(EfiImage::get_check_sum_offset(pe)
            + SIZEOF_CHECKSUM
            + EfiImage::get_cert_table_offset(pe)?)
    }

    fn get_cert_dd_section(pe: &PE, pe_raw: &[u8]) -> Result<Span> {
        let offset = EfiImage::get_dd_offset(pe)?;
        Ok(Span {
            offset,
            data: slice(
                pe_raw,
                offset,
                offset + SIZEOF_CERT_TABLE,
                "certificate data directory",
            )?
            .to_vec(),
        })
    }

    fn check_sum(mut checksum: u32, data: &[u8], mut steps: usize) -> Result<u32> {
        let mut rdr = Cursor::new(data);
        while steps > 0 {
            let sum = rdr.read_u16::<LittleEndian>().context(ReadBtyeSnafu {
                offset: rdr.position() as usize,
                size: mem::size_of::<u16>(),
            })? as u32
                + checksum;
            checksum = (sum & 0xffff) + (sum >> 16);
            steps -= 1;
        }

        Ok(checksum + (checksum >> 16))
    }

    fn get_overlay_section(pe: &PE, pe_raw: &[u8]) -> Result<Option<Vec<Span>>> {
        let hdr = pe.header.optional_header.context(MissingOptHdrSnafu {})?;
        let file_size = pe_raw.len();
        let end_of_sections = pe
            .sections
            .iter()
            .map(|s| s.pointer_to_raw_data as usize + s.size_of_raw_data as usize)
            .fold(hdr.windows_fields.size_of_headers as usize, usize::max);

        ensure!(
            file_size >= end_of_sections,
            ParseImageSnafu {
                reason: "file size lesser than the end of the last section, corrupt headers."
            }
        );
        // no overlay
        if file_size == end_of_sections {
            return Ok(None);
        }
        let mut res = Vec::new();
        match EfiImage::get_cert_table_addr(pe)? {
            Some(cert_dd) => {
                let cert_start = cert_dd.virtual_address as usize;
                let cert_end = cert_start + cert_dd.size as usize;
                // 1st part: <end_of_sections> - <start_of_attribute_cert_table>
                res.push(Span {
                    offset: end_of_sections,
                    data: slice(pe_raw, end_of_sections, cert_start, "overlay")?.to_vec(),
                });
                // 2nd part: <end_of_cert_table> - <end_of_file>
                res.push(Span {
                    offset: cert_end,
                    data: slice(pe_raw, cert_end, file_size, "overlay")?.to_vec(),
                });
            }
            None => res.push(Span {
                offset: end_of_sections,
                data: pe_raw[end_of_sections..].to_vec(),
            }),
        }
        Ok(Some(res))
    }

    pub fn get_digest_algo(&self) -> Result<Option<DigestAlgorithm>> {
        match self.signatures.first() {
            None => Ok(None),
            Some(sig) => Ok(Some(sig.digest_algo()?)),
        }
    }

    fn parse_cert_table(pe: &PE, raw: &[u8]) -> Result<Vec<Signature>> {
        let mut res: Vec<Signature> = Vec::new();
        let Some(cert_table_addr) = EfiImage::get_cert_table_addr(pe)? else {
            return Ok(res);
        };
        let mut begin = cert_table_addr.virtual_address as usize;
        let table_end = begin + cert_table_addr.size as usize;
        slice(raw, begin, table_end, "certificate table")?;

        // there maybe more than one signature, scan over all the cert table
        while begin + SIZEOF_WIN_CERT_HEADER <= table_end {
            // "length" includes the 8 byte header itself
            let length = LittleEndian::read_u32(&raw[begin..]) as usize;
            ensure!(
                length >= SIZEOF_WIN_CERT_HEADER,
                ParseImageSnafu {
                    reason: format!("invalid WIN_CERTIFICATE length {:#x} at {:#x}", length, begin)
                }
            );
            let sd_end = begin + length;
            ensure!(
                sd_end <= table_end,
                TruncatedSnafu {
                    what: "WIN_CERTIFICATE",
                    offset: begin,
                    needed: length,
                    available: table_end - begin
                }
            );
            let cert_data = &raw[begin..sd_end];
            let wincert = WinCertificate::decode(cert_data).context(WinCertSnafu {})?;
            let code = AuthenticodeSignature::from_der(wincert.get_certificate())
                .context(AuthenticodeSnafu {})?;
            // authenticode only contains one digest algorithm
            ensure!(
                code.0.digest_algorithms().len() == 1,
                ParseImageSnafu {
                    reason: format!(
                        "invalid digest algorithms numbers: {}",
                        code.0.digest_algorithms().len()
                    )
                }
            );
            ensure!(
                code.0.signer_infos().len() == 1,
                ParseImageSnafu {
                    reason: format!(
                        "invalid signer_info numbers: {}",
                        code.0.signer_infos().len()
                    )
                }
            );
            ensure!(
                code.0.digest_algorithms()[0] == code.0.signer_infos()[0].digest_algorithm.0,
                ParseImageSnafu {
                    reason: format!(
                        "digest algorithm not consistent: {:?} in sign_info but {:?} in signed data",
                        code.0.digest_algorithms()[0],
                        code.0.signer_infos()[0].digest_algorithm.0
                    )
                }
            );
            debug!("signature at [{:#06x} - {:#06x}]", begin, sd_end);
            res.push(Signature(wincert));
            // each wincert is 8 byte aligned
            begin = align8(sd_end);
        }
        Ok(res)
    }

    pub fn parse(buf: &'a [u8]) -> Result<Self> {
        let pe = Box::new(PE::parse(buf).context(PESnafu {})?);
        let pe_pointer = pe.header.dos_header.pe_pointer as usize;
        let magic = slice(buf, pe_pointer, pe_pointer + SIZEOF_PE_MAGIC, "PE signature")?;
        let signature = LittleEndian::read_u32(magic);
        ensure!(
            signature == PE_MAGIC,
            ParseImageSnafu {
                reason: format!(
                    "pe magic check failed expect:{} actual:{}",
                    PE_MAGIC, signature
                )
            }
        );
        let signatures = EfiImage::parse_cert_table(&pe, buf)?;
        let cert_table = EfiImage::get_cert_table_section(&pe, buf)?;
        let checksum = EfiImage::get_check_sum_section(&pe, buf)?;
        let cert_dd = EfiImage::get_cert_dd_section(&pe, buf)?;
        let overlay = EfiImage::get_overlay_section(&pe, buf)?;

        let mut raw = buf.to_vec();
        // zero-pad so that the signatures appended later start 8 byte aligned
        if raw.len() % WIN_CERT_ALIGNMENT != 0 {
            let padding = align8(raw.len()) - raw.len();
            debug!("zero-pad {} bytes", padding);
            raw.resize(raw.len() + padding, 0);
        }
        Ok(EfiImage {
            pe,
            raw,
            cert_data_directory: cert_dd,
            checksum,
            cert_table,
            overlay,
            signatures,
        })
    }

    pub fn get_checksum_from_header(&self) -> Result<u32> {
        let mut rdr = Cursor::new(&self.raw);
        rdr.set_position(self.checksum.offset as u64);
        let sum = rdr.read_u32::<LittleEndian>().context(ReadBtyeSnafu {
            offset: rdr.position() as usize,
            size: mem::size_of::<u32>(),
        })?;
        Ok(sum)
    }

    // get digest from EFI image
    pub fn get_digest(&self) -> Result<Option<Vec<u8>>> {
        let mut hashes: Vec<Vec<u8>> = Vec::new();
        for sig in self.signatures.iter() {
            let Some(hash) = sig.file_hash()? else {
                continue;
            };
            if let Some(first) = hashes.first() {
                ensure!(
                    &hash == first,
                    ParseImageSnafu {
                        reason: format!("signature with different hash {:x?} and {:x?}", hash, first)
                    }
                );
            }
            hashes.push(hash);
        }
        Ok(hashes.into_iter().next())
    }

    // follow the Authenticode PE image hash procedure:
    // checksum, certificate table data directory and attribute certificate table are excluded from the whole header
    // all sections are included by sorting ASC order by PointerToRawData
    // the data remain behind certificate table also included
    pub fn compute_digest(&self, alg: DigestAlgorithm) -> Result<Vec<u8>> {
        let hdr = self.pe.header.optional_header.context(MissingOptHdrSnafu {})?;

        let mut hasher: Box<dyn DynDigest> = match alg {
            ShaVariant::MD5 => Box::new(md5::Md5::default()),
            ShaVariant::SHA1 => Box::new(sha1::Sha1::default()),
            ShaVariant::SHA2_256 => Box::new(sha2::Sha256::default()),
            ShaVariant::SHA2_384 => Box::new(sha2::Sha384::default()),
            ShaVariant::SHA2_512 => Box::new(sha2::Sha512::default()),
            _ => ComputeDigestSnafu {
                reason: format!("not supported digest method: {:?}", alg),
            }
            .fail()?,
        };

        // hash the image header up to the checksum
        let mut begin = 0;
        let mut offset = self.checksum.offset;
        debug!("hashed from [{:#04x} - {:#04x}]", begin, offset);
        hasher.update(slice(&self.raw, begin, offset, "image header")?);

        // skip the checksum, hash up to the certificate table entry
        begin = offset + SIZEOF_CHECKSUM;
        offset = self.cert_data_directory.offset;
        debug!("hashed from [{:#04x} - {:#04x}]", begin, offset);
        hasher.update(slice(&self.raw, begin, offset, "image header")?);

        // skip the certificate table entry, hash the rest of the headers
        // including the section table
        begin = self.cert_data_directory.end();
        offset = hdr.windows_fields.size_of_headers as usize;
        debug!("hashed from [{:#04x} - {:#04x}]", begin, offset);
        hasher.update(slice(&self.raw, begin, offset, "image header")?);

        let mut sum_of_bytes_hashed = hdr.windows_fields.size_of_headers as usize;
        // sections with raw data, in file order
        let mut temp_tables: Vec<&SectionTable> = self
            .pe
            .sections
            .iter()
            .filter(|t| t.size_of_raw_data != 0)
            .collect();
        temp_tables.sort_by_key(|t| t.pointer_to_raw_data);

        for sec in temp_tables {
            let start = sec.pointer_to_raw_data as usize;
            let end = start + sec.size_of_raw_data as usize;
            debug!("hashed from [{:#04x} - {:#04x}]", start, end);
            hasher.update(slice(&self.raw, start, end, "section data")?);
            sum_of_bytes_hashed += sec.size_of_raw_data as usize;
        }

        // extra data behind the sections, minus the attribute certificate table
        let file_size = self.raw.len();
        if file_size > sum_of_bytes_hashed {
            match self.cert_table {
                Some(ref cert) => {
                    debug!("hashed from [{:#04x} - {:#04x}]", sum_of_bytes_hashed, cert.offset);
                    hasher.update(slice(&self.raw, sum_of_bytes_hashed, cert.offset, "overlay")?);
                    debug!("hashed from [{:#04x} - {:#04x}]", cert.end(), file_size);
                    hasher.update(slice(&self.raw, cert.end(), file_size, "overlay")?);
                }
                None => {
                    debug!("hashed from [{:#04x} - {:#04x}]", sum_of_bytes_hashed, file_size);
                    hasher.update(&self.raw[sum_of_bytes_hashed..]);
                }
            }
        }

        Ok(hasher.finalize().to_vec())
    }

    pub fn get_pe_ref(&self) -> &PE<'a> {
        &self.pe
    }

    // reference: https://www.cnblogs.com/concurrency/p/3926698.html
    // notice: call this method need flush self.raw first
    pub fn compute_check_sum(&self) -> Result<u32> {
        let file_size = self.raw.len();
        let checksum_offset = self.checksum.offset;
        let checksum_after_offset = checksum_offset + SIZEOF_CHECKSUM;
        let checksum_after_size = (file_size - checksum_after_offset) >> 1;

        let mut checksum =
            EfiImage::check_sum(0, &self.raw[..checksum_offset], checksum_offset >> 1)?;
        checksum = EfiImage::check_sum(
            checksum,
            &self.raw[checksum_after_offset..],
            checksum_after_size,
        )?;

        if file_size & 1 > 0 {
            checksum += self.raw[file_size - 1] as u32;
        }

        Ok(file_size as u32 + checksum)
    }

    /// The image bytes with the checksum field recomputed.
    pub fn with_checksum(&self) -> Result<Vec<u8>> {
        let checksum = self.compute_check_sum()?;
        debug!("new checksum {:#010x}", checksum);
        let mut res = self.raw.clone();
        LittleEndian::write_u32(&mut res[self.checksum.offset..], checksum);
        Ok(res)
    }

    /// The image bytes without the attribute certificate table.
    pub fn strip_cert_table(&self) -> Vec<u8> {
        let mut res = match self.cert_table {
            Some(ref cert) => {
                let mut res = self.raw[..cert.offset].to_vec();
                res.extend_from_slice(&self.raw[cert.end()..]);
                res
            }
            None => self.raw.clone(),
        };
        let dd = self.cert_data_directory.offset;
        res[dd..dd + SIZEOF_CERT_TABLE].fill(0);
        res
    }

    /// Rebuild the image without the signatures whose digest no longer
    /// matches it. Returns `None` when every signature is still valid.
    pub fn drop_stale_signatures(&self) -> Result<Option<Vec<u8>>> {
        let mut keep = Vec::new();
        for sig in self.signatures.iter() {
            let current = self.compute_digest(sig.digest_algo()?)?;
            match sig.file_hash()? {
                Some(hash) if hash == current => keep.push(sig.clone()),
                Some(hash) => warn!(
                    "dropping stale signature, signed digest {:x?} but image digest is {:x?}",
                    hash, current
                ),
                None => warn!("dropping signature without a file digest"),
            }
        }
        if keep.len() == self.signatures.len() {
            return Ok(None);
        }
        let stripped = self.strip_cert_table();
        if keep.is_empty() {
            return Ok(Some(stripped));
        }
        Ok(Some(EfiImage::parse(&stripped)?.set_authenticode(keep)?))
    }

    // embedded signatures into the image
    pub fn set_authenticode(&self, signatures: Vec<Signature>) -> Result<Vec<u8>> {
        let mut res: Vec<u8>;
        let mut size: usize;
        let rva: usize;
        match self.cert_table {
            // already contain a signature, just append
            Some(ref cert) => {
                rva = cert.offset;
                debug!(
                    "already has some signatures, old rva and size: {:#04x}/{:#04x}",
                    rva,
                    cert.data.len()
                );
                res = self.raw[..cert.end()].to_vec();
                // each wincert should be 8 byte aligned
                res.resize(align8(res.len()), 0);
                size = res.len() - rva;
            }
            None => {
                debug!("no signatures before, add a new signature");
                res = self.raw.clone();
                rva = res.len();
                size = 0;
            }
        }

        for sig in signatures.into_iter() {
            let code_raw = sig.0.encode().context(WinCertSnafu {})?;
            debug!("append new signature, size: {:#04x}", code_raw.len());
            res.extend_from_slice(&code_raw);
            let padded = align8(res.len());
            if padded != res.len() {
                debug!("append new signature need padding {} bytes", padded - res.len());
            }
            res.resize(padded, 0);
            size = res.len() - rva;
        }

        // data behind the old certificate table stays behind the new one
        if let Some(ref cert) = self.cert_table {
            if cert.end() < self.raw.len() {
                res.extend_from_slice(&self.raw[cert.end()..]);
            }
        }
        debug!("new rva and size: {:#04x}/{:#04x}", rva, size);

        // insert the data directory into origin pe
        let mut writer: Vec<u8> = Vec::new();
        writer
            .write_u32::<LittleEndian>(rva as u32)
            .context(WriteBtyeSnafu {
                offset: writer.len(),
                size: mem::size_of::<u32>(),
            })?;
        writer
            .write_u32::<LittleEndian>(size as u32)
            .context(WriteBtyeSnafu {
                offset: writer.len(),
                size: mem::size_of::<u32>(),
            })?;
        let dd_offset = self.cert_data_directory.offset;
        res.splice(dd_offset..(dd_offset + SIZEOF_DATA_DIRECTORY), writer);
        debug!("new image total size: {:#04x}", res.len());
        Ok(res)
    }

    /// Check one signature against this image.
    pub fn verify_signature(&self, sig: &Signature) -> Result<()> {
        let now = UtcDate::now();
        let file_hash = self.compute_digest(sig.digest_algo()?)?;
        let code = sig.authenticode()?;
        let verifier = code.authenticode_verifier();
        verifier
            .require_basic_authenticode_validation(file_hash)
            .require_not_after_check()
            .require_not_before_check()
            .exact_date(&now)
            .ignore_chain_check()
            .ignore_ca_against_ctl_check(); // no user provided trust anchor, skip ctl
        verifier.verify().context(AuthenticodeSnafu {})?;
        Ok(())
    }

    // how to verify a signature against its binary
    // refer from microsoft authenticode_pe.docx
    pub fn verify(&self) -> Result<()> {
        ensure!(!self.signatures.is_empty(), NoDigestAlgoSnafu {});
        for sig in self.signatures.iter() {
            self.verify_signature(sig)?;
        }
        Ok(())
    }

    pub fn print_info(&self) -> Result<()> {
        debug!("EFI image info:");
        debug!(
            "calculated sha256 {:x?}",
            self.compute_digest(ShaVariant::SHA2_256)?
        );
        debug!("embedded digest {:x?}", self.get_digest()?);
        debug!(
            "checksum in header {:#010x}, computed {:#010x}",
            self.get_checksum_from_header()?,
            self.compute_check_sum()?
        );
        if let Some(ref o) = self.overlay {
            let mut tot_size = 0;
            for s in o.iter() {
                debug!(
                    "overlay from [{:#06x} - {:#06x}] size {:#06x}",
                    s.offset,
                    s.end(),
                    s.data.len()
                );
                tot_size += s.data.len();
            }
            debug!("overlay total size: {:#04x}", tot_size);
        }
        if let Some(ref c) = self.cert_table {
            debug!(
                "the attribute certificate table: [{:#06x} - {:#06x}], {} signatures",
                c.offset,
                c.end(),
                self.signatures.len()
            );
        }
        if let Some(algo) = self.get_digest_algo()? {
            debug!("digest algo: {:?}", algo);
        }
        Ok(())
    }
}
