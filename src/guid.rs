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
//! EFI GUIDs.
//!
//! The text form is the usual `xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx`. On the wire
//! the first three groups are little-endian and the last eight bytes are copied
//! verbatim, which is what `uuid`'s `*_bytes_le` helpers produce.
use crate::error::{InvalidGuidSnafu, Result};
use serde::{Deserialize, Serialize};
use snafu::ResultExt;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

pub const SIZEOF_GUID: usize = 16;

/// Signature type of a DER encoded X.509 certificate.
pub const EFI_CERT_X509_GUID: EfiGuid = EfiGuid::from_u128(0xa5c059a1_94e4_4aa7_87b5_ab155c2bf072);
/// Signature type of a SHA-256 image digest.
pub const EFI_CERT_SHA256_GUID: EfiGuid =
    EfiGuid::from_u128(0xc1c41626_504c_4092_aca9_41f936934328);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EfiGuid(Uuid);

impl EfiGuid {
    pub const fn from_u128(v: u128) -> Self {
        EfiGuid(Uuid::from_u128(v))
    }

    /// Decode the 16 byte EFI representation.
    pub fn from_bytes(bytes: [u8; SIZEOF_GUID]) -> Self {
        EfiGuid(Uuid::from_bytes_le(bytes))
    }

    /// Decode the first 16 bytes of `bytes`. Callers check the length.
    pub(crate) fn from_slice(bytes: &[u8]) -> Self {
        let mut raw = [0u8; SIZEOF_GUID];
        raw.copy_from_slice(&bytes[..SIZEOF_GUID]);
        EfiGuid::from_bytes(raw)
    }

    pub fn to_bytes(&self) -> [u8; SIZEOF_GUID] {
        self.0.to_bytes_le()
    }

    /// Parse the text form, ignoring surrounding whitespace such as the
    /// trailing newline of a `guid` file.
    pub fn parse(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let uuid = Uuid::try_parse(trimmed).context(InvalidGuidSnafu { value: trimmed })?;
        Ok(EfiGuid(uuid))
    }
}

impl FromStr for EfiGuid {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self> {
        EfiGuid::parse(s)
    }
}

impl fmt::Display for EfiGuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl From<Uuid> for EfiGuid {
    fn from(uuid: Uuid) -> Self {
        EfiGuid(uuid)
    }
}
