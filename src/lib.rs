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
//! Build and re-sign UEFI secure boot artifacts.
//!
//! Certificates and owner GUIDs are collected into EFI signature databases,
//! embedded into shim's `.vendor_cert` table or spliced together with a
//! kernel into a unified kernel image, and the edited PE images are signed
//! again with Authenticode.
pub mod error;
pub mod esl;
mod fsutil;
pub mod guid;
pub mod image;
pub mod loader;
pub mod pe;
pub mod shim;
pub mod sigdb;
pub mod signer;
pub mod uki;
pub mod vars;
pub mod vendor_cert;

pub use error::{Error, ErrorKind, Result};
pub use guid::EfiGuid;
pub use image::{DigestAlgorithm, EfiImage, Signature};
pub use sigdb::{SignatureData, SignatureDatabase, SignatureList};
pub use signer::{pem_to_p7, resign, SignedOutput, Signer};
