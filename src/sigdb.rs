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
//! In-memory EFI signature database.
//!
//! A [`SignatureDatabase`] is an ordered run of [`SignatureList`]s, each list
//! holding entries of one signature type and one size. The order of the lists
//! is the order they are encoded in and therefore the order firmware enrolls
//! them.
use crate::error::{MixedSignatureSizeSnafu, Result, SectionTooLargeSnafu};
use crate::esl;
use crate::guid::{EfiGuid, EFI_CERT_SHA256_GUID, EFI_CERT_X509_GUID, SIZEOF_GUID};
use snafu::ensure;

const SHA256_DIGEST_SIZE: usize = 32;

/// A single certificate (or digest) with the GUID of its owner.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignatureData {
    pub owner: EfiGuid,
    pub data: Vec<u8>,
}

impl SignatureData {
    pub fn new(owner: EfiGuid, data: Vec<u8>) -> Self {
        SignatureData { owner, data }
    }

    // owner GUID + payload, as counted by SignatureSize
    pub fn signature_size(&self) -> usize {
        SIZEOF_GUID + self.data.len()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignatureList {
    signature_type: EfiGuid,
    header: Vec<u8>,
    signatures: Vec<SignatureData>,
    // SignatureSize read from an empty list, kept only when it is not the
    // natural size of the type
    declared_size: Option<usize>,
}

impl SignatureList {
    pub fn new(signature_type: EfiGuid) -> Self {
        SignatureList::with_header(signature_type, Vec::new())
    }

    /// The list shape this crate always produces: one X.509 certificate per
    /// list, so certificates of different lengths never have to share a list.
    pub fn x509(entry: SignatureData) -> Self {
        SignatureList {
            signature_type: EFI_CERT_X509_GUID,
            header: Vec::new(),
            signatures: vec![entry],
            declared_size: None,
        }
    }

    pub(crate) fn with_header(signature_type: EfiGuid, header: Vec<u8>) -> Self {
        SignatureList {
            signature_type,
            header,
            signatures: Vec::new(),
            declared_size: None,
        }
    }

    pub(crate) fn declare_signature_size(&mut self, size: usize) {
        if self.signatures.is_empty() && size != self.natural_size() {
            self.declared_size = Some(size);
        }
    }

    fn natural_size(&self) -> usize {
        if self.signature_type == EFI_CERT_SHA256_GUID {
            SIZEOF_GUID + SHA256_DIGEST_SIZE
        } else {
            SIZEOF_GUID
        }
    }

    /// Add an entry. Every entry of a list must have the same size.
    pub fn push(&mut self, entry: SignatureData) -> Result<()> {
        let expected = self
            .signatures
            .first()
            .map(SignatureData::signature_size)
            .or(self.declared_size);
        if let Some(expected) = expected {
            ensure!(
                expected == entry.signature_size(),
                MixedSignatureSizeSnafu {
                    expected,
                    actual: entry.signature_size()
                }
            );
        }
        let list_size = esl::SIZEOF_SIGNATURE_LIST_HEADER
            + self.header.len()
            + entry.signature_size() * (self.signatures.len() + 1);
        ensure!(
            list_size <= u32::MAX as usize,
            SectionTooLargeSnafu {
                name: "signature list",
                size: list_size as u64,
                limit: u32::MAX as u64
            }
        );
        self.signatures.push(entry);
        self.declared_size = None;
        Ok(())
    }

    pub fn signature_type(&self) -> EfiGuid {
        self.signature_type
    }

    pub fn header(&self) -> &[u8] {
        &self.header
    }

    pub fn signatures(&self) -> &[SignatureData] {
        &self.signatures
    }

    /// SignatureSize of this list. Empty lists report the size they were
    /// decoded with, or the natural size of their type.
    pub fn signature_size(&self) -> usize {
        match self.signatures.first() {
            Some(entry) => entry.signature_size(),
            None => self.declared_size.unwrap_or_else(|| self.natural_size()),
        }
    }

    /// Bytes this list occupies once encoded.
    pub fn list_size(&self) -> usize {
        esl::SIZEOF_SIGNATURE_LIST_HEADER
            + self.header.len()
            + self.signature_size() * self.signatures.len()
    }

    pub fn len(&self) -> usize {
        self.signatures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signatures.is_empty()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SignatureDatabase {
    lists: Vec<SignatureList>,
}

impl SignatureDatabase {
    pub fn new() -> Self {
        SignatureDatabase::default()
    }

    /// Wrap every entry in its own X.509 signature list, keeping the order.
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = SignatureData>,
    {
        SignatureDatabase {
            lists: entries.into_iter().map(SignatureList::x509).collect(),
        }
    }

    pub fn push(&mut self, list: SignatureList) {
        self.lists.push(list);
    }

    pub fn lists(&self) -> &[SignatureList] {
        &self.lists
    }

    /// All entries of all lists, in encoding order.
    pub fn entries(&self) -> impl Iterator<Item = &SignatureData> {
        self.lists.iter().flat_map(|l| l.signatures.iter())
    }

    pub fn len(&self) -> usize {
        self.lists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lists.is_empty()
    }

    pub fn encode(&self) -> Vec<u8> {
        esl::encode(self)
    }

    pub fn decode(buf: &[u8]) -> Result<Self> {
        esl::decode(buf)
    }
}

impl FromIterator<SignatureList> for SignatureDatabase {
    fn from_iter<T: IntoIterator<Item = SignatureList>>(iter: T) -> Self {
        SignatureDatabase {
            lists: iter.into_iter().collect(),
        }
    }
}
