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
//! Compose a Unified Kernel Image from a stub, a kernel, an initrd, a command
//! line and SBAT metadata.
use crate::error::{Result, SectionOverlapSnafu, SectionTooLargeSnafu};
use crate::fsutil;
use crate::pe::{apply_sections, Section, SectionDescriptor};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use snafu::ensure;
use std::path::Path;

pub const CMDLINE_SECTION: &str = ".cmdline";
pub const SBAT_SECTION: &str = ".sbat";
pub const LINUX_SECTION: &str = ".linux";
pub const INITRD_SECTION: &str = ".initrd";

pub const DEFAULT_SBAT: &str = "sbat,1,SBAT Version,sbat,1,https://github.com/rhboot/shim/blob/main/SBAT.md
stubby.puzzleos,2,PuzzleOS,stubby,1,https://github.com/puzzleos/stubby
linux.puzzleos,1,PuzzleOS,linux,1,NOURL
";

/// Virtual addresses of the UKI payload sections. Each payload must fit below
/// the address of the next one, the initrd comes last.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UkiLayout {
    pub cmdline: u32,
    pub sbat: u32,
    pub sbat_alignment: u32,
    pub linux: u32,
    pub initrd: u32,
}

impl Default for UkiLayout {
    fn default() -> Self {
        UkiLayout {
            cmdline: 0x30000,
            sbat: 0x50000,
            sbat_alignment: 512,
            linux: 0x2000000,
            initrd: 0x3000000,
        }
    }
}

impl UkiLayout {
    fn slots(&self) -> [(&'static str, u32); 4] {
        [
            (CMDLINE_SECTION, self.cmdline),
            (SBAT_SECTION, self.sbat),
            (LINUX_SECTION, self.linux),
            (INITRD_SECTION, self.initrd),
        ]
    }

    /// Slots must be strictly increasing.
    pub fn validate(&self) -> Result<()> {
        for pair in self.slots().windows(2) {
            let ((name, va), (next, next_va)) = (pair[0], pair[1]);
            ensure!(
                va < next_va,
                SectionOverlapSnafu {
                    name,
                    other: next,
                    start: va as u64,
                    end: next_va as u64
                }
            );
        }
        Ok(())
    }

    /// Bytes available to the payload of each slot.
    pub fn capacity(&self, name: &str) -> Option<u64> {
        let slots = self.slots();
        let i = slots.iter().position(|(n, _)| *n == name)?;
        let end = slots
            .get(i + 1)
            .map(|(_, va)| *va as u64)
            .unwrap_or(u32::MAX as u64 + 1);
        Some(end - slots[i].1 as u64)
    }

    fn check_capacity(&self, sections: &[Section]) -> Result<()> {
        for s in sections {
            if let Some(limit) = self.capacity(&s.name) {
                let size = s.data.len() as u64;
                debug!("{}: {:#x} of {:#x} bytes used", s.name, size, limit);
                ensure!(
                    size <= limit,
                    SectionTooLargeSnafu {
                        name: s.name.as_str(),
                        size,
                        limit
                    }
                );
            }
        }
        Ok(())
    }
}

/// Build a UKI at `output` with the default layout.
pub fn compose(
    stub: impl AsRef<Path>,
    output: impl AsRef<Path>,
    cmdline: &str,
    sbat: &str,
    kernel: impl AsRef<Path>,
    initrd: impl AsRef<Path>,
) -> Result<()> {
    compose_with(&UkiLayout::default(), stub, output, cmdline, sbat, kernel, initrd)
}

/// Build a UKI at `output`. The stub is left untouched and `output` is only
/// written once every section was placed.
pub fn compose_with(
    layout: &UkiLayout,
    stub: impl AsRef<Path>,
    output: impl AsRef<Path>,
    cmdline: &str,
    sbat: &str,
    kernel: impl AsRef<Path>,
    initrd: impl AsRef<Path>,
) -> Result<()> {
    let (stub, output) = (stub.as_ref(), output.as_ref());
    layout.validate()?;
    let dir = fsutil::scoped_dir("smoosh-")?;
    let cmdline_path = fsutil::write_into(&dir, "cmdline", cmdline.as_bytes())?;
    let sbat_path = fsutil::write_into(&dir, "sbat", sbat.as_bytes())?;

    let descriptors = [
        SectionDescriptor::new(CMDLINE_SECTION, layout.cmdline, cmdline_path),
        SectionDescriptor::new(SBAT_SECTION, layout.sbat, sbat_path)
            .with_alignment(layout.sbat_alignment),
        SectionDescriptor::new(LINUX_SECTION, layout.linux, kernel.as_ref()),
        SectionDescriptor::new(INITRD_SECTION, layout.initrd, initrd.as_ref()),
    ];
    let sections = descriptors
        .iter()
        .map(SectionDescriptor::load)
        .collect::<Result<Vec<_>>>()?;
    layout.check_capacity(&sections)?;

    let image = apply_sections(&fsutil::read(stub)?, &sections)?;
    fsutil::write_atomic(output, &image)?;
    info!(
        "{}: UKI composed from {}, kernel {:#x} bytes, initrd {:#x} bytes",
        output.display(),
        stub.display(),
        sections[2].data.len(),
        sections[3].data.len()
    );
    Ok(())
}
