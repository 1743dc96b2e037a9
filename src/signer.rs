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
//! Authenticode (re-)signing of EFI images.
use crate::error::{
    AuthenticodeSnafu, EncodePkcs7Snafu, ParseCertificateSnafu, ParsePrivateKeySnafu,
    PemFileSnafu, Result, SignSnafu, UnexpectedPemLabelSnafu,
};
use crate::fsutil;
use crate::image::{DigestAlgorithm, EfiImage, Signature};
use cms::cert::CertificateChoices;
use cms::content_info::{CmsVersion, ContentInfo};
use cms::signed_data::{CertificateSet, EncapsulatedContentInfo, SignedData, SignerInfos};
use der::asn1::{Any, ObjectIdentifier, SetOfVec};
use der::Encode;
use log::{debug, info, warn};
use picky::key::PrivateKey;
use picky::pem::Pem;
use picky::x509::certificate::CertType;
use picky::x509::pkcs7::authenticode::{AuthenticodeSignature, ShaVariant};
use picky::x509::pkcs7::Pkcs7;
use picky::x509::wincert::{CertificateType, WinCertificate};
use picky::x509::Cert;
use picky_asn1_der::Asn1RawDer;
use picky_asn1_x509::pkcs7::signed_data::CertificateChoices as RawCertificate;
use picky_asn1_x509::pkcs7::Pkcs7Certificate;
use serde::{Deserialize, Serialize};
use snafu::{ensure, ResultExt};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

const ID_DATA: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.7.1");
const ID_SIGNED_DATA: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.7.2");

const SIGNED_SUFFIX: &str = ".signed";

/// Where [`resign`] puts the signed image.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignedOutput {
    /// Replace the input.
    #[default]
    InPlace,
    /// `<input>.signed` next to the input.
    Sibling,
    Path(PathBuf),
}

impl SignedOutput {
    pub fn resolve(&self, binary: &Path) -> PathBuf {
        match self {
            SignedOutput::InPlace => binary.to_path_buf(),
            SignedOutput::Sibling => {
                let mut name = OsString::from(binary.as_os_str());
                name.push(SIGNED_SUFFIX);
                PathBuf::from(name)
            }
            SignedOutput::Path(p) => p.clone(),
        }
    }
}

pub struct Signer {
    pkcs7: Pkcs7,
    key: PrivateKey,
    algorithm: DigestAlgorithm,
    program_name: Option<String>,
}

impl Signer {
    pub fn new(pkcs7: Pkcs7, key: PrivateKey) -> Self {
        Signer {
            pkcs7,
            key,
            algorithm: ShaVariant::SHA2_256,
            program_name: None,
        }
    }

    /// Load a PEM certificate (or PKCS#7 bundle) and a PEM private key.
    pub fn from_files<C: AsRef<Path>, K: AsRef<Path>>(cert: C, key: K) -> Result<Self> {
        let (cert, key) = (cert.as_ref(), key.as_ref());
        let pkcs7 = read_pkcs7(cert)?;
        let key_pem = read_pem(key)?;
        let key = PrivateKey::from_pem(&key_pem).context(ParsePrivateKeySnafu {
            path: key.display().to_string(),
        })?;
        Ok(Signer::new(pkcs7, key))
    }

    pub fn with_algorithm(mut self, algorithm: DigestAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    pub fn with_program_name<S: Into<String>>(mut self, name: S) -> Self {
        self.program_name = Some(name.into());
        self
    }

    pub fn signature_for(&self, file_hash: Vec<u8>, algorithm: DigestAlgorithm) -> Result<Signature> {
        let authenticode_signature = AuthenticodeSignature::new(
            &self.pkcs7,
            file_hash,
            algorithm,
            &self.key,
            self.program_name.clone(),
        )
        .context(AuthenticodeSnafu {})?;
        let authenticode_signature = self.embed_certificates(authenticode_signature);

        let raw_authenticode_signature = authenticode_signature
            .to_der()
            .context(AuthenticodeSnafu {})?;
        debug!(
            "a new signature created, size: {:#04x}",
            raw_authenticode_signature.len()
        );
        Ok(Signature(WinCertificate::from_certificate(
            raw_authenticode_signature,
            CertificateType::WinCertTypePkcsSignedData,
        )))
    }

    /// Certificates to embed next to the signer info: the bundle minus its
    /// self-signed roots, unless a lone root is all there is.
    pub fn certificates(&self) -> Vec<Vec<u8>> {
        let all: Vec<Vec<u8>> = bundle_certificates(&self.pkcs7);
        let chain: Vec<Vec<u8>> = all
            .iter()
            .filter(|der| {
                Cert::from_der(der.as_slice())
                    .map(|cert| cert.ty() != CertType::Root)
                    .unwrap_or(false)
            })
            .cloned()
            .collect();
        if chain.is_empty() {
            all
        } else {
            chain
        }
    }

    // picky re-encodes the bundle certificates while building the signature,
    // the embedded copies must stay byte for byte what the issuer signed.
    fn embed_certificates(&self, signature: AuthenticodeSignature) -> AuthenticodeSignature {
        let certs = self.certificates();
        if certs.is_empty() {
            return signature;
        }
        let mut content: Pkcs7Certificate = signature.0.into();
        content.signed_data.0.certificates.0 .0 = certs
            .into_iter()
            .map(|der| RawCertificate::Certificate(Asn1RawDer(der)))
            .collect();
        AuthenticodeSignature(Pkcs7::from(content))
    }

    /// Sign an image held in memory. Signatures that no longer match the image
    /// are dropped first, valid ones are kept.
    pub fn sign_bytes(&self, image: &[u8]) -> Result<Vec<u8>> {
        let cleaned = match EfiImage::parse(image)?.drop_stale_signatures()? {
            Some(bytes) => bytes,
            None => image.to_vec(),
        };
        let pe = EfiImage::parse(&cleaned)?;
        let mut algo = self.algorithm;
        if let Some(a) = pe.get_digest_algo()? {
            if a != algo {
                warn!(
                    "a digest algorithm:{:?} already existed, ignore {:?}",
                    a, algo
                );
                algo = a;
            }
        }
        let file_hash = pe.compute_digest(algo)?;
        let signature = self.signature_for(file_hash.clone(), algo)?;
        let signed = pe.set_authenticode(vec![signature])?;

        let signed_pe = EfiImage::parse(&signed)?;
        ensure!(
            signed_pe.get_digest()?.as_deref() == Some(file_hash.as_slice()),
            SignSnafu {
                reason: "embedded digest differs from the image digest"
            }
        );
        signed_pe.with_checksum()
    }

    pub fn sign_file<P: AsRef<Path>>(&self, binary: P, output: &SignedOutput) -> Result<PathBuf> {
        let binary = binary.as_ref();
        let signed = self.sign_bytes(&fsutil::read(binary)?)?;
        let target = output.resolve(binary);
        fsutil::write_atomic(&target, &signed)?;
        info!("{} signed into {}", binary.display(), target.display());
        Ok(target)
    }
}

/// Sign `binary` with `cert` and `key`, returning the path written.
pub fn resign<B, C, K>(binary: B, cert: C, key: K, output: &SignedOutput) -> Result<PathBuf>
where
    B: AsRef<Path>,
    C: AsRef<Path>,
    K: AsRef<Path>,
{
    Signer::from_files(cert, key)?.sign_file(binary, output)
}

/// Wrap the PEM certificates in `pem` into a degenerate (signer-less)
/// PKCS#7 SignedData, DER encoded.
pub fn pem_to_p7(pem: &[u8]) -> Result<Vec<u8>> {
    let certs = x509_cert::Certificate::load_pem_chain(pem).context(EncodePkcs7Snafu {})?;
    let certificates = SetOfVec::try_from(
        certs
            .into_iter()
            .map(CertificateChoices::Certificate)
            .collect::<Vec<_>>(),
    )
    .context(EncodePkcs7Snafu {})?;
    let signed_data = SignedData {
        version: CmsVersion::V1,
        digest_algorithms: SetOfVec::new(),
        encap_content_info: EncapsulatedContentInfo {
            econtent_type: ID_DATA,
            econtent: None,
        },
        certificates: Some(CertificateSet(certificates)),
        crls: None,
        signer_infos: SignerInfos(SetOfVec::new()),
    };
    let content_info = ContentInfo {
        content_type: ID_SIGNED_DATA,
        content: Any::encode_from(&signed_data).context(EncodePkcs7Snafu {})?,
    };
    Ok(content_info.to_der().context(EncodePkcs7Snafu {})?)
}

fn bundle_certificates(pkcs7: &Pkcs7) -> Vec<Vec<u8>> {
    let content: Pkcs7Certificate = pkcs7.clone().into();
    content
        .signed_data
        .0
        .certificates
        .0
         .0
        .into_iter()
        .filter_map(|choice| match choice {
            RawCertificate::Certificate(raw) => Some(raw.0),
            RawCertificate::Other(_) => None,
        })
        .collect()
}

fn read_pem(path: &Path) -> Result<Pem<'static>> {
    let content = fsutil::read(path)?;
    let pem = Pem::read_from(&mut content.as_slice()).context(PemFileSnafu {
        path: path.display().to_string(),
    })?;
    Ok(pem)
}

fn read_pkcs7(path: &Path) -> Result<Pkcs7> {
    let pem = read_pem(path)?;
    let path_str = path.display().to_string();
    let pkcs7 = match pem.label() {
        "PKCS7" => Pkcs7::from_pem(&pem).context(ParseCertificateSnafu { path: path_str })?,
        "CERTIFICATE" => {
            let der = pem_to_p7(&fsutil::read(path)?)?;
            Pkcs7::from_der(&der).context(ParseCertificateSnafu { path: path_str })?
        }
        label => UnexpectedPemLabelSnafu {
            label,
            path: path_str,
        }
        .fail()?,
    };
    Ok(pkcs7)
}
