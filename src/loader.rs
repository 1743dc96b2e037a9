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
//! Load signature entries from key directories.
//!
//! A key directory holds `cert.pem`, a PEM encoded X.509 certificate, and
//! `guid`, the owner GUID as text.
use crate::error::{
    Error, InvalidCertificateSnafu, PemFileSnafu, Result, UnexpectedPemLabelSnafu,
};
use crate::fsutil;
use crate::guid::EfiGuid;
use crate::sigdb::{SignatureData, SignatureDatabase};
use der::Decode;
use log::debug;
use picky::pem::Pem;
use snafu::{ensure, ResultExt};
use std::fmt;
use std::path::Path;

pub const CERT_FILE: &str = "cert.pem";
pub const GUID_FILE: &str = "guid";

const CERTIFICATE_LABEL: &str = "CERTIFICATE";

/// Both files are read and validated before anything is returned.
pub fn load_entry<P: AsRef<Path>>(dir: P) -> Result<SignatureData> {
    let dir = dir.as_ref();
    let data = read_certificate(&dir.join(CERT_FILE))?;
    let owner = read_guid(&dir.join(GUID_FILE))?;
    debug!(
        "loaded certificate from {} ({:#x} bytes) owned by {}",
        dir.display(),
        data.len(),
        owner
    );
    Ok(SignatureData::new(owner, data))
}

/// Load directories in order and stop at the first failure.
pub fn load_entries<I, P>(dirs: I) -> std::result::Result<Vec<SignatureData>, PartialLoad>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let mut loaded = Vec::new();
    for dir in dirs {
        match load_entry(dir) {
            Ok(entry) => loaded.push(entry),
            Err(error) => return Err(PartialLoad { loaded, error }),
        }
    }
    Ok(loaded)
}

/// Load directories into a database of single-certificate lists.
pub fn load_many<I, P>(dirs: I) -> std::result::Result<SignatureDatabase, PartialLoad>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    load_entries(dirs).map(SignatureDatabase::from_entries)
}

/// The entries that loaded before `error` stopped the run.
#[derive(Debug)]
pub struct PartialLoad {
    pub loaded: Vec<SignatureData>,
    pub error: Error,
}

impl PartialLoad {
    pub fn database(&self) -> SignatureDatabase {
        SignatureDatabase::from_entries(self.loaded.iter().cloned())
    }
}

impl fmt::Display for PartialLoad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} after loading {} entries", self.error, self.loaded.len())
    }
}

impl std::error::Error for PartialLoad {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

impl From<PartialLoad> for Error {
    fn from(partial: PartialLoad) -> Self {
        partial.error
    }
}

/// Read a PEM certificate and return its DER bytes.
pub fn read_certificate(path: &Path) -> Result<Vec<u8>> {
    let content = fsutil::read(path)?;
    let pem = Pem::read_from(&mut content.as_slice()).context(PemFileSnafu {
        path: path.display().to_string(),
    })?;
    ensure!(
        pem.label() == CERTIFICATE_LABEL,
        UnexpectedPemLabelSnafu {
            label: pem.label(),
            path: path.display().to_string()
        }
    );
    x509_cert::Certificate::from_der(pem.data()).context(InvalidCertificateSnafu {
        path: path.display().to_string(),
    })?;
    Ok(pem.data().to_vec())
}

pub fn read_guid(path: &Path) -> Result<EfiGuid> {
    let content = fsutil::read(path)?;
    EfiGuid::parse(&String::from_utf8_lossy(&content))
}
