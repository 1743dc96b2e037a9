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
//! EFI_SIGNATURE_LIST wire format.
//!
//! ```text
//! SignatureType        EFI_GUID
//! SignatureListSize    u32      header + signature header + all entries
//! SignatureHeaderSize  u32
//! SignatureSize        u32      owner GUID + payload, equal for every entry
//! SignatureHeader      [u8; SignatureHeaderSize]
//! Signatures           [owner GUID | payload] * n
//! ```
use crate::error::{Result, SizeMismatchSnafu, TruncatedSnafu, UnknownSignatureTypeSnafu};
use crate::guid::{EfiGuid, EFI_CERT_SHA256_GUID, EFI_CERT_X509_GUID, SIZEOF_GUID};
use crate::sigdb::{SignatureData, SignatureDatabase, SignatureList};
use byteorder::{ByteOrder, LittleEndian};
use log::debug;
use snafu::ensure;

pub const SIZEOF_SIGNATURE_LIST_HEADER: usize = SIZEOF_GUID + 3 * 4;
const SIZEOF_SHA256_SIGNATURE: usize = SIZEOF_GUID + 32;

pub fn encode(db: &SignatureDatabase) -> Vec<u8> {
    let total = db.lists().iter().map(SignatureList::list_size).sum();
    let mut out = Vec::with_capacity(total);
    for list in db.lists() {
        encode_list(list, &mut out);
    }
    out
}

fn encode_list(list: &SignatureList, out: &mut Vec<u8>) {
    let mut sizes = [0u8; 12];
    // SignatureList::push keeps these within u32
    LittleEndian::write_u32(&mut sizes[0..4], list.list_size() as u32);
    LittleEndian::write_u32(&mut sizes[4..8], list.header().len() as u32);
    LittleEndian::write_u32(&mut sizes[8..12], list.signature_size() as u32);

    out.extend_from_slice(&list.signature_type().to_bytes());
    out.extend_from_slice(&sizes);
    out.extend_from_slice(list.header());
    for entry in list.signatures() {
        out.extend_from_slice(&entry.owner.to_bytes());
        out.extend_from_slice(&entry.data);
    }
}

/// Decode a concatenation of signature lists. Any size field that disagrees
/// with the bytes actually present is an error.
pub fn decode(buf: &[u8]) -> Result<SignatureDatabase> {
    let mut db = SignatureDatabase::new();
    let mut offset = 0;
    while offset < buf.len() {
        let (list, consumed) = decode_list(&buf[offset..], offset)?;
        debug!(
            "signature list at {:#x}: type {}, {} entries, {:#x} bytes",
            offset,
            list.signature_type(),
            list.len(),
            consumed
        );
        db.push(list);
        offset += consumed;
    }
    Ok(db)
}

fn decode_list(buf: &[u8], base: usize) -> Result<(SignatureList, usize)> {
    ensure!(
        buf.len() >= SIZEOF_SIGNATURE_LIST_HEADER,
        TruncatedSnafu {
            what: "signature list header",
            offset: base,
            needed: SIZEOF_SIGNATURE_LIST_HEADER,
            available: buf.len()
        }
    );
    let signature_type = EfiGuid::from_slice(&buf[..SIZEOF_GUID]);
    let list_size = LittleEndian::read_u32(&buf[16..20]) as usize;
    let header_size = LittleEndian::read_u32(&buf[20..24]) as usize;
    let signature_size = LittleEndian::read_u32(&buf[24..28]) as usize;

    let entries_start = SIZEOF_SIGNATURE_LIST_HEADER + header_size;
    ensure!(
        list_size >= entries_start,
        SizeMismatchSnafu {
            reason: format!(
                "list at {:#x} declares {:#x} bytes, less than its {:#x} byte header",
                base, list_size, entries_start
            )
        }
    );
    ensure!(
        buf.len() >= list_size,
        TruncatedSnafu {
            what: "signature list",
            offset: base,
            needed: list_size,
            available: buf.len()
        }
    );

    if signature_type == EFI_CERT_X509_GUID {
        ensure!(
            signature_size >= SIZEOF_GUID,
            SizeMismatchSnafu {
                reason: format!(
                    "x509 list at {:#x} has signature size {:#x}",
                    base, signature_size
                )
            }
        );
    } else if signature_type == EFI_CERT_SHA256_GUID {
        ensure!(
            signature_size == SIZEOF_SHA256_SIGNATURE,
            SizeMismatchSnafu {
                reason: format!(
                    "sha256 list at {:#x} has signature size {:#x}, expected {:#x}",
                    base, signature_size, SIZEOF_SHA256_SIGNATURE
                )
            }
        );
    } else {
        UnknownSignatureTypeSnafu {
            guid: signature_type,
        }
        .fail()?
    }

    let body = &buf[entries_start..list_size];
    ensure!(
        body.len() % signature_size == 0,
        SizeMismatchSnafu {
            reason: format!(
                "list at {:#x} holds {:#x} entry bytes, not a multiple of signature size {:#x}",
                base,
                body.len(),
                signature_size
            )
        }
    );

    let header = buf[SIZEOF_SIGNATURE_LIST_HEADER..entries_start].to_vec();
    let mut list = SignatureList::with_header(signature_type, header);
    for entry in body.chunks_exact(signature_size) {
        list.push(SignatureData::new(
            EfiGuid::from_slice(&entry[..SIZEOF_GUID]),
            entry[SIZEOF_GUID..].to_vec(),
        ))?;
    }
    list.declare_signature_size(signature_size);
    Ok((list, list_size))
}
