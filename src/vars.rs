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
//! Arguments for enrolling secure boot keys into an OVMF variable store.
//!
//! The store itself is written by `virt-fw-vars`. This module stages every
//! certificate as a PEM file and assembles the command line for it.
use crate::error::{InvalidCertificateSnafu, Result};
use crate::fsutil;
use crate::sigdb::SignatureData;
use der::Decode;
use log::debug;
use picky::pem::Pem;
use snafu::ResultExt;
use std::ffi::OsString;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

pub const VIRT_FW_VARS: &str = "virt-fw-vars";

/// Keys to enroll. `pk` becomes the platform key, the rest are appended to
/// KEK, db and the shim MOK list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SecureBootKeys {
    pub pk: SignatureData,
    pub kek: Vec<SignatureData>,
    pub db: Vec<SignatureData>,
    pub mok: Vec<SignatureData>,
}

impl SecureBootKeys {
    pub fn new(pk: SignatureData) -> Self {
        SecureBootKeys {
            pk,
            kek: Vec::new(),
            db: Vec::new(),
            mok: Vec::new(),
        }
    }

    /// Stage certificates and build the arguments turning `vars_in` into
    /// `vars_out`. The PEM files live as long as the returned value.
    pub fn prepare<I: AsRef<Path>, O: AsRef<Path>>(
        &self,
        vars_in: I,
        vars_out: O,
    ) -> Result<PreparedVars> {
        let dir = fsutil::scoped_dir("ovmf-vars-")?;
        let mut input = OsString::from("--input=");
        input.push(vars_in.as_ref());
        let mut output = OsString::from("--output=");
        output.push(vars_out.as_ref());
        let mut args = vec![
            input,
            output,
            OsString::from("--secure-boot"),
            OsString::from("--no-microsoft"),
        ];

        let groups: [(&str, &[SignatureData]); 4] = [
            ("--set-pk", std::slice::from_ref(&self.pk)),
            ("--add-kek", &self.kek),
            ("--add-db", &self.db),
            ("--add-mok", &self.mok),
        ];
        let mut index = 0;
        for (flag, entries) in groups {
            for entry in entries {
                let pem = certificate_pem(entry)?;
                let path = fsutil::write_into(&dir, &format!("cert-{}.pem", index), pem.as_bytes())?;
                index += 1;
                args.push(OsString::from(flag));
                args.push(OsString::from(entry.owner.to_string()));
                args.push(path.into_os_string());
            }
        }
        debug!("{} certificates staged in {}", index, dir.path().display());
        Ok(PreparedVars { dir, args })
    }
}

/// Staged certificates plus the `virt-fw-vars` arguments referring to them.
#[derive(Debug)]
pub struct PreparedVars {
    dir: TempDir,
    args: Vec<OsString>,
}

impl PreparedVars {
    pub fn args(&self) -> &[OsString] {
        &self.args
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    pub fn command(&self) -> Command {
        let mut cmd = Command::new(VIRT_FW_VARS);
        cmd.args(&self.args);
        cmd
    }
}

/// PEM text of a certificate entry. The payload must be a DER certificate.
pub fn certificate_pem(entry: &SignatureData) -> Result<String> {
    x509_cert::Certificate::from_der(&entry.data).context(InvalidCertificateSnafu {
        path: format!("<entry owned by {}>", entry.owner),
    })?;
    Ok(Pem::new("CERTIFICATE", entry.data.as_slice()).to_string())
}
