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
use crate::error::{
    CreateTempSnafu, NotFoundSnafu, PersistSnafu, ReadFileSnafu, Result, WriteFileSnafu,
};
use log::debug;
use snafu::{IntoError, ResultExt};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::{NamedTempFile, TempDir};

pub(crate) fn read(path: &Path) -> Result<Vec<u8>> {
    let bytes = fs::read(path).map_err(|source| {
        let path = path.display().to_string();
        if source.kind() == io::ErrorKind::NotFound {
            NotFoundSnafu { path }.into_error(source)
        } else {
            ReadFileSnafu { path }.into_error(source)
        }
    })?;
    Ok(bytes)
}

/// Replace `path` with `bytes` through a sibling temporary file and a rename,
/// so readers see either the old or the new content. Permissions of an
/// existing target are carried over.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir).context(CreateTempSnafu {})?;
    let tmp_path = tmp.path().display().to_string();
    tmp.write_all(bytes)
        .context(WriteFileSnafu { path: &tmp_path })?;
    tmp.as_file()
        .sync_all()
        .context(WriteFileSnafu { path: &tmp_path })?;
    if let Ok(meta) = fs::metadata(path) {
        fs::set_permissions(tmp.path(), meta.permissions())
            .context(WriteFileSnafu { path: &tmp_path })?;
    }
    tmp.persist(path).context(PersistSnafu {
        path: path.display().to_string(),
    })?;
    debug!("wrote {:#x} bytes to {}", bytes.len(), path.display());
    Ok(())
}

pub(crate) fn scoped_dir(prefix: &str) -> Result<TempDir> {
    Ok(tempfile::Builder::new()
        .prefix(prefix)
        .tempdir()
        .context(CreateTempSnafu {})?)
}

/// Write a payload into a scoped directory, returning its path.
pub(crate) fn write_into(dir: &TempDir, name: &str, bytes: &[u8]) -> Result<PathBuf> {
    let path = dir.path().join(name);
    fs::write(&path, bytes).context(WriteFileSnafu {
        path: path.display().to_string(),
    })?;
    Ok(path)
}
