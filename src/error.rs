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
use crate::guid::EfiGuid;
use goblin::error::Error as PeError;
use picky::key::KeyError;
use picky::pem::PemError;
use picky::x509::pkcs7::authenticode::AuthenticodeError;
use picky::x509::pkcs7::Pkcs7Error;
use picky::x509::wincert::WinCertificateError;
use picky_asn1_x509::algorithm_identifier::UnsupportedAlgorithmError;
use snafu::prelude::*;
use std::io::Error as IoError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Snafu)]
pub struct Error(InnerError);

/// Broad failure classes. None of them is retried inside the crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing or malformed certificate, GUID, key or PE file.
    Input,
    /// Corrupt or truncated binary structures.
    Format,
    /// Temp file or disk I/O failure.
    Resource,
    /// Overlapping sections, oversized payloads, signing failures.
    SecurityInvariant,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        use InnerError::*;
        match self.0 {
            NotFound { .. }
            | ReadFile { .. }
            | PemFile { .. }
            | UnexpectedPemLabel { .. }
            | InvalidGuid { .. }
            | InvalidCertificate { .. }
            | ParsePrivateKey { .. }
            | ParseCertificate { .. }
            | PE { .. }
            | ParseImage { .. }
            | MissingOptHdr {}
            | InvalidMagicInOptHdr { .. }
            | InvalidSectionName { .. }
            | InvalidAlignment { .. }
            | DuplicateSection { .. }
            | MissingSection { .. }
            | MixedSignatureSize { .. } => ErrorKind::Input,
            Truncated { .. }
            | UnknownSignatureType { .. }
            | SizeMismatch { .. }
            | ReadBtye { .. }
            | WinCert { .. }
            | Algorithm { .. } => ErrorKind::Format,
            CreateTemp { .. } | WriteFile { .. } | Persist { .. } | WriteBtye { .. } => {
                ErrorKind::Resource
            }
            SectionOverlap { .. }
            | SectionTooLarge { .. }
            | HeadersOverflow { .. }
            | Sign { .. }
            | EncodePkcs7 { .. }
            | Authenticode { .. }
            | ComputeDigest { .. }
            | NoDigestAlgo {} => ErrorKind::SecurityInvariant,
        }
    }
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
#[non_exhaustive]
pub(crate) enum InnerError {
    #[snafu(display("No such file {path}"))]
    NotFound { source: IoError, path: String },
    #[snafu(display("Failed to read file {path}"))]
    ReadFile { source: IoError, path: String },
    #[snafu(display("Failed to decode pem file {path}"))]
    PemFile { source: PemError, path: String },
    #[snafu(display("Unexpected pem label {label} in {path}"))]
    UnexpectedPemLabel { label: String, path: String },
    #[snafu(display("Invalid GUID {value:?}"))]
    InvalidGuid { value: String, source: uuid::Error },
    #[snafu(display("Invalid X.509 certificate in {path}"))]
    InvalidCertificate { path: String, source: der::Error },
    #[snafu(display("Parse private key failed, path: {path}"))]
    ParsePrivateKey { path: String, source: KeyError },
    #[snafu(display("Parse certificate failed, path: {path}"))]
    ParseCertificate { path: String, source: Pkcs7Error },
    #[snafu(display("Failed to decode to a PE/COFF struct"))]
    PE { source: PeError },
    #[snafu(display("Parse EFI image failed, reason: {reason}"))]
    ParseImage { reason: String },
    #[snafu(display("Missing optional header"))]
    MissingOptHdr {},
    #[snafu(display("Invalid magic:{magic} in optional header"))]
    InvalidMagicInOptHdr { magic: u16 },
    #[snafu(display("Invalid section name {name:?}: {reason}"))]
    InvalidSectionName { name: String, reason: String },
    #[snafu(display("Invalid alignment {alignment:#x} for section {name} at {virtual_address:#x}"))]
    InvalidAlignment {
        name: String,
        alignment: u32,
        virtual_address: u32,
    },
    #[snafu(display("Section {name} requested more than once"))]
    DuplicateSection { name: String },
    #[snafu(display("No section named {name}"))]
    MissingSection { name: String },
    #[snafu(display("Signature list entries must share one size: expected {expected}, got {actual}"))]
    MixedSignatureSize { expected: usize, actual: usize },

    #[snafu(display("Truncated {what}: need {needed} bytes at {offset:#x}, only {available} available"))]
    Truncated {
        what: &'static str,
        offset: usize,
        needed: usize,
        available: usize,
    },
    #[snafu(display("Unknown signature type {guid}"))]
    UnknownSignatureType { guid: EfiGuid },
    #[snafu(display("Size mismatch: {reason}"))]
    SizeMismatch { reason: String },
    #[snafu(display("Failed to read {size} byte from {offset}"))]
    ReadBtye {
        offset: usize,
        size: usize,
        source: IoError,
    },
    #[snafu(display("Failed to decode to a wincert"))]
    WinCert { source: WinCertificateError },
    #[snafu(display("Invalid digest algorithm"))]
    Algorithm { source: UnsupportedAlgorithmError },

    #[snafu(display("Failed to create a temporary file"))]
    CreateTemp { source: IoError },
    #[snafu(display("Failed to write file {path}"))]
    WriteFile { source: IoError, path: String },
    #[snafu(display("Failed to move temporary file to {path}"))]
    Persist {
        source: tempfile::PersistError,
        path: String,
    },
    #[snafu(display("Failed to write {size} byte from {offset}"))]
    WriteBtye {
        offset: usize,
        size: usize,
        source: IoError,
    },

    #[snafu(display("Section {name} [{start:#x} - {end:#x}) overlaps {other}"))]
    SectionOverlap {
        name: String,
        other: String,
        start: u64,
        end: u64,
    },
    #[snafu(display("Section {name} is {size:#x} bytes, limit is {limit:#x}"))]
    SectionTooLarge { name: String, size: u64, limit: u64 },
    #[snafu(display("Headers need {size_of_headers:#x} bytes but the first section maps at {first_va:#x}"))]
    HeadersOverflow { size_of_headers: u32, first_va: u32 },
    #[snafu(display("Failed to sign the image, reason: {reason}"))]
    Sign { reason: String },
    #[snafu(display("Failed to encode the pkcs7 certificate bundle"))]
    EncodePkcs7 { source: der::Error },
    #[snafu(display("Failed create a authenticode"))]
    Authenticode { source: AuthenticodeError },
    #[snafu(display("Failed to compute the digest, reason: {reason}"))]
    ComputeDigest { reason: String },
    #[snafu(display("No digest algorithm existed"))]
    NoDigestAlgo {},
}
