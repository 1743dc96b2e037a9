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
//! PE/COFF section editing.
mod editor;
mod layout;

pub use editor::{apply_sections, set_sections, SectionDescriptor};
pub use layout::{
    PeLayout, SectionHeader, SectionRecord, IMAGE_SCN_CNT_INITIALIZED_DATA, IMAGE_SCN_MEM_READ,
    SIZEOF_SECTION_HEADER,
};

/// A section to place into an image, content already in memory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Section {
    pub name: String,
    pub virtual_address: u32,
    /// Required alignment of `virtual_address`. Defaults to the image's
    /// section alignment.
    pub alignment: Option<u32>,
    pub data: Vec<u8>,
}

impl Section {
    pub fn new<S: Into<String>>(name: S, virtual_address: u32, data: Vec<u8>) -> Self {
        Section {
            name: name.into(),
            virtual_address,
            alignment: None,
            data,
        }
    }

    pub fn with_alignment(mut self, alignment: u32) -> Self {
        self.alignment = Some(alignment);
        self
    }
}
