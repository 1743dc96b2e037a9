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
//! Shim vendor certificate table.
//!
//! The `.vendor_cert` section of shim starts with a fixed header followed by
//! the allow list (`db`) and the deny list (`dbx`), both encoded as EFI
//! signature lists:
//!
//! ```text
//! 0x00  AuthOffset    u32  always 16, db follows the header
//! 0x04  AuthSize      u32
//! 0x08  DeAuthOffset  u32  AuthOffset + AuthSize
//! 0x0c  DeAuthSize    u32
//! 0x10  db bytes, then dbx bytes
//! ```
use crate::error::{Result, SectionTooLargeSnafu, SizeMismatchSnafu, TruncatedSnafu};
use crate::sigdb::SignatureDatabase;
use byteorder::{ByteOrder, LittleEndian};
use log::debug;
use snafu::ensure;
use std::ops::Range;

/// Shim is only built for little-endian targets.
pub type VendorTableOrder = LittleEndian;

pub const SIZEOF_VENDOR_CERT_HEADER: usize = 16;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VendorCertHeader {
    pub auth_offset: u32,
    pub auth_size: u32,
    pub deauth_offset: u32,
    pub deauth_size: u32,
}

impl VendorCertHeader {
    /// Lay out `auth_size` bytes of db and `deauth_size` bytes of dbx right
    /// after the header.
    pub fn new(auth_size: usize, deauth_size: usize) -> Result<Self> {
        let total = SIZEOF_VENDOR_CERT_HEADER as u64 + auth_size as u64 + deauth_size as u64;
        ensure!(
            total <= u32::MAX as u64,
            SectionTooLargeSnafu {
                name: ".vendor_cert",
                size: total,
                limit: u32::MAX as u64
            }
        );
        let auth_offset = SIZEOF_VENDOR_CERT_HEADER as u32;
        Ok(VendorCertHeader {
            auth_offset,
            auth_size: auth_size as u32,
            deauth_offset: auth_offset + auth_size as u32,
            deauth_size: deauth_size as u32,
        })
    }

    pub fn to_bytes<B: ByteOrder>(&self) -> [u8; SIZEOF_VENDOR_CERT_HEADER] {
        let mut buf = [0u8; SIZEOF_VENDOR_CERT_HEADER];
        B::write_u32(&mut buf[0..4], self.auth_offset);
        B::write_u32(&mut buf[4..8], self.auth_size);
        B::write_u32(&mut buf[8..12], self.deauth_offset);
        B::write_u32(&mut buf[12..16], self.deauth_size);
        buf
    }

    pub fn from_bytes<B: ByteOrder>(buf: &[u8]) -> Result<Self> {
        ensure!(
            buf.len() >= SIZEOF_VENDOR_CERT_HEADER,
            TruncatedSnafu {
                what: "vendor cert header",
                offset: 0usize,
                needed: SIZEOF_VENDOR_CERT_HEADER,
                available: buf.len()
            }
        );
        Ok(VendorCertHeader {
            auth_offset: B::read_u32(&buf[0..4]),
            auth_size: B::read_u32(&buf[4..8]),
            deauth_offset: B::read_u32(&buf[8..12]),
            deauth_size: B::read_u32(&buf[12..16]),
        })
    }

    pub fn auth_range(&self) -> Range<usize> {
        self.auth_offset as usize..self.auth_offset as usize + self.auth_size as usize
    }

    pub fn deauth_range(&self) -> Range<usize> {
        self.deauth_offset as usize..self.deauth_offset as usize + self.deauth_size as usize
    }
}

/// Header for `auth_size` bytes of db and `deauth_size` bytes of dbx, in
/// shim's byte order.
pub fn build_header(auth_size: u32, deauth_size: u32) -> Result<[u8; SIZEOF_VENDOR_CERT_HEADER]> {
    build_header_with::<VendorTableOrder>(auth_size, deauth_size)
}

pub fn build_header_with<B: ByteOrder>(
    auth_size: u32,
    deauth_size: u32,
) -> Result<[u8; SIZEOF_VENDOR_CERT_HEADER]> {
    Ok(VendorCertHeader::new(auth_size as usize, deauth_size as usize)?.to_bytes::<B>())
}

/// Full `.vendor_cert` content: header, encoded db, encoded dbx.
pub fn build_section(db: &SignatureDatabase, dbx: &SignatureDatabase) -> Result<Vec<u8>> {
    let auth = db.encode();
    let deauth = dbx.encode();
    let header = VendorCertHeader::new(auth.len(), deauth.len())?.to_bytes::<VendorTableOrder>();
    debug!(
        "vendor cert table: db {:#x} bytes ({} lists), dbx {:#x} bytes ({} lists)",
        auth.len(),
        db.len(),
        deauth.len(),
        dbx.len()
    );

    let mut out = Vec::with_capacity(SIZEOF_VENDOR_CERT_HEADER + auth.len() + deauth.len());
    out.extend_from_slice(&header);
    out.extend_from_slice(&auth);
    out.extend_from_slice(&deauth);
    Ok(out)
}

/// Decoded `.vendor_cert` content.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VendorCertTable {
    pub db: SignatureDatabase,
    pub dbx: SignatureDatabase,
}

impl VendorCertTable {
    pub fn new(db: SignatureDatabase, dbx: SignatureDatabase) -> Self {
        VendorCertTable { db, dbx }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        build_section(&self.db, &self.dbx)
    }

    /// Parse section content. Bytes past the dbx are section padding and are
    /// ignored.
    pub fn parse(buf: &[u8]) -> Result<Self> {
        VendorCertTable::parse_with::<VendorTableOrder>(buf)
    }

    pub fn parse_with<B: ByteOrder>(buf: &[u8]) -> Result<Self> {
        let header = VendorCertHeader::from_bytes::<B>(buf)?;
        ensure!(
            header.auth_offset as usize == SIZEOF_VENDOR_CERT_HEADER,
            SizeMismatchSnafu {
                reason: format!(
                    "db offset {:#x}, expected {:#x}",
                    header.auth_offset, SIZEOF_VENDOR_CERT_HEADER
                )
            }
        );
        ensure!(
            header.deauth_offset as u64 == header.auth_offset as u64 + header.auth_size as u64,
            SizeMismatchSnafu {
                reason: format!(
                    "dbx offset {:#x} does not follow db [{:#x} + {:#x}]",
                    header.deauth_offset, header.auth_offset, header.auth_size
                )
            }
        );
        let end = header.deauth_range().end;
        ensure!(
            buf.len() >= end,
            TruncatedSnafu {
                what: "vendor cert table",
                offset: 0usize,
                needed: end,
                available: buf.len()
            }
        );
        Ok(VendorCertTable {
            db: SignatureDatabase::decode(&buf[header.auth_range()])?,
            dbx: SignatureDatabase::decode(&buf[header.deauth_range()])?,
        })
    }
}
