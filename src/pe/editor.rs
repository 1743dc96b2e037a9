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
use super::layout::{ensure_unique, validate_name, PeLayout};
use super::Section;
use crate::error::Result;
use crate::fsutil;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A section whose content lives in a file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionDescriptor {
    pub name: String,
    pub virtual_address: u32,
    #[serde(default)]
    pub alignment: Option<u32>,
    pub content_path: PathBuf,
}

impl SectionDescriptor {
    pub fn new<S: Into<String>, P: Into<PathBuf>>(
        name: S,
        virtual_address: u32,
        content_path: P,
    ) -> Self {
        SectionDescriptor {
            name: name.into(),
            virtual_address,
            alignment: None,
            content_path: content_path.into(),
        }
    }

    pub fn with_alignment(mut self, alignment: u32) -> Self {
        self.alignment = Some(alignment);
        self
    }

    /// Read the content file.
    pub fn load(&self) -> Result<Section> {
        validate_name(&self.name)?;
        Ok(Section {
            name: self.name.clone(),
            virtual_address: self.virtual_address,
            alignment: self.alignment,
            data: fsutil::read(&self.content_path)?,
        })
    }
}

/// Replace or add sections of the PE file at `path`.
///
/// Sections already present under a requested name are removed first, so
/// running the same request twice gives the same file. The file is only
/// replaced once the whole request succeeded.
pub fn set_sections<P: AsRef<Path>>(path: P, descriptors: &[SectionDescriptor]) -> Result<()> {
    let path = path.as_ref();
    let sections = descriptors
        .iter()
        .map(SectionDescriptor::load)
        .collect::<Result<Vec<_>>>()?;
    let image = fsutil::read(path)?;
    let edited = apply_sections(&image, &sections)?;
    fsutil::write_atomic(path, &edited)?;
    info!(
        "{}: set sections {}",
        path.display(),
        sections
            .iter()
            .map(|s| format!("{}@{:#x}", s.name, s.virtual_address))
            .collect::<Vec<_>>()
            .join(", ")
    );
    Ok(())
}

/// In-memory counterpart of [`set_sections`].
pub fn apply_sections(image: &[u8], sections: &[Section]) -> Result<Vec<u8>> {
    for s in sections {
        validate_name(&s.name)?;
    }
    ensure_unique(sections)?;

    let mut layout = PeLayout::parse(image)?;
    for s in sections {
        layout.remove_section(&s.name);
    }
    for s in sections {
        layout.add_section(s)?;
    }
    if layout.had_signatures() {
        warn!("image was signed, its signatures are dropped and must be renewed");
    }
    layout.to_bytes()
}
