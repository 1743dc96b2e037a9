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
//! Rewrite the vendor certificate database embedded in shim.
use crate::error::{MissingSectionSnafu, Result};
use crate::fsutil;
use crate::pe::{set_sections, PeLayout, SectionDescriptor};
use crate::sigdb::SignatureDatabase;
use crate::vendor_cert::{build_section, VendorCertTable};
use log::info;
use snafu::OptionExt;
use std::path::Path;

pub const VENDOR_CERT_SECTION: &str = ".vendor_cert";

/// Replace `.vendor_cert` of the shim at `shim`, keeping its address.
pub fn set_vendor_db<P: AsRef<Path>>(
    shim: P,
    db: &SignatureDatabase,
    dbx: &SignatureDatabase,
) -> Result<()> {
    let shim = shim.as_ref();
    let layout = PeLayout::parse(&fsutil::read(shim)?)?;
    let vma = layout
        .section(VENDOR_CERT_SECTION)
        .map(|s| s.header.virtual_address)
        .context(MissingSectionSnafu {
            name: VENDOR_CERT_SECTION,
        })?;
    set_vendor_db_at(shim, vma, db, dbx)
}

/// Write `.vendor_cert` at `vma`, adding the section when shim has none.
pub fn set_vendor_db_at<P: AsRef<Path>>(
    shim: P,
    vma: u32,
    db: &SignatureDatabase,
    dbx: &SignatureDatabase,
) -> Result<()> {
    let shim = shim.as_ref();
    let content = build_section(db, dbx)?;
    let dir = fsutil::scoped_dir("vendor-db-")?;
    let content_path = fsutil::write_into(&dir, "vendor_cert.bin", &content)?;
    set_sections(
        shim,
        &[SectionDescriptor::new(VENDOR_CERT_SECTION, vma, content_path)],
    )?;
    info!(
        "{}: vendor db set at {:#x}, {} db and {} dbx lists",
        shim.display(),
        vma,
        db.len(),
        dbx.len()
    );
    Ok(())
}

/// Decode the vendor tables currently embedded in a shim.
pub fn read_vendor_db<P: AsRef<Path>>(shim: P) -> Result<VendorCertTable> {
    let shim = shim.as_ref();
    let layout = PeLayout::parse(&fsutil::read(shim)?)?;
    let section = layout
        .section(VENDOR_CERT_SECTION)
        .context(MissingSectionSnafu {
            name: VENDOR_CERT_SECTION,
        })?;
    VendorCertTable::parse(section.content())
}
