//! Public key canonicalization
//!
//! Mobile pinning APIs hash the key in the platform's raw export format
//! (iOS `SecKeyCopyExternalRepresentation`), not the SPKI wrapper:
//!
//! - RSA: PKCS#1 `RSAPublicKey`, DER
//! - EC: ANSI X9.63 uncompressed point (`04 || X || Y`)
//! - Ed25519 / Ed448: raw 32 / 57 bytes
//!
//! Any other algorithm falls back to the full SPKI DER.

use const_oid::db::{rfc5912, rfc8410};
use der::asn1::{BitString, ObjectIdentifier, UintRef};
use der::{Decode, Encode};
use p256::elliptic_curve::sec1::ToEncodedPoint;
use x509_cert::spki::SubjectPublicKeyInfoOwned;
use x509_cert::Certificate;

use crate::error::{Error, Result};
use crate::pin::{self, Pin};

/// Raw Ed25519 public key length
pub const ED25519_KEY_LEN: usize = 32;

/// Raw Ed448 public key length
pub const ED448_KEY_LEN: usize = 57;

/// RSASSA-PSS keys carry the same `RSAPublicKey` as `rsaEncryption`
const ID_RSASSA_PSS: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.10");

const SECP192R1: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.3.1.1");
const SECP224R1: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.132.0.33");
const SECP256R1: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.3.1.7");
const SECP384R1: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.132.0.34");
const SECP521R1: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.132.0.35");
const SECP256K1: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.132.0.10");
const BRAINPOOL_P256R1: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.36.3.3.2.8.1.1.7");
const BRAINPOOL_P384R1: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.36.3.3.2.8.1.1.11");
const BRAINPOOL_P512R1: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.36.3.3.2.8.1.1.13");

/// SEC1 tag of an uncompressed point
const UNCOMPRESSED_TAG: u8 = 0x04;

/// Named elliptic curves with a known raw export layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EcCurve {
    P192,
    P224,
    P256,
    P384,
    P521,
    Secp256k1,
    BrainpoolP256r1,
    BrainpoolP384r1,
    BrainpoolP512r1,
}

impl EcCurve {
    pub const ALL: [EcCurve; 9] = [
        EcCurve::P192,
        EcCurve::P224,
        EcCurve::P256,
        EcCurve::P384,
        EcCurve::P521,
        EcCurve::Secp256k1,
        EcCurve::BrainpoolP256r1,
        EcCurve::BrainpoolP384r1,
        EcCurve::BrainpoolP512r1,
    ];

    /// Look up a curve by its `namedCurve` OID
    pub fn from_oid(oid: &ObjectIdentifier) -> Option<Self> {
        Self::ALL.into_iter().find(|curve| curve.oid() == *oid)
    }

    pub fn oid(&self) -> ObjectIdentifier {
        match self {
            EcCurve::P192 => SECP192R1,
            EcCurve::P224 => SECP224R1,
            EcCurve::P256 => SECP256R1,
            EcCurve::P384 => SECP384R1,
            EcCurve::P521 => SECP521R1,
            EcCurve::Secp256k1 => SECP256K1,
            EcCurve::BrainpoolP256r1 => BRAINPOOL_P256R1,
            EcCurve::BrainpoolP384r1 => BRAINPOOL_P384R1,
            EcCurve::BrainpoolP512r1 => BRAINPOOL_P512R1,
        }
    }

    /// SEC 2 / RFC 5639 name, as shown in the key format label
    pub fn name(&self) -> &'static str {
        match self {
            EcCurve::P192 => "secp192r1",
            EcCurve::P224 => "secp224r1",
            EcCurve::P256 => "secp256r1",
            EcCurve::P384 => "secp384r1",
            EcCurve::P521 => "secp521r1",
            EcCurve::Secp256k1 => "secp256k1",
            EcCurve::BrainpoolP256r1 => "brainpoolP256r1",
            EcCurve::BrainpoolP384r1 => "brainpoolP384r1",
            EcCurve::BrainpoolP512r1 => "brainpoolP512r1",
        }
    }

    /// Field element width in bytes; each coordinate is padded to this
    pub fn field_len(&self) -> usize {
        match self {
            EcCurve::P192 => 24,
            EcCurve::P224 => 28,
            EcCurve::P256 | EcCurve::Secp256k1 | EcCurve::BrainpoolP256r1 => 32,
            EcCurve::P384 | EcCurve::BrainpoolP384r1 => 48,
            EcCurve::P521 => 66,
            EcCurve::BrainpoolP512r1 => 64,
        }
    }

    /// Length of `04 || X || Y` on this curve
    pub fn uncompressed_len(&self) -> usize {
        1 + 2 * self.field_len()
    }

    /// Re-encode a SEC1 point as uncompressed
    ///
    /// Curves with a RustCrypto implementation are decoded and validated, so
    /// compressed points are accepted. The others only pass through points
    /// that are already uncompressed.
    fn uncompressed_point(&self, sec1: &[u8]) -> Result<Vec<u8>> {
        let decoded = match self {
            EcCurve::P192 => p192::elliptic_curve::PublicKey::<p192::NistP192>::from_sec1_bytes(sec1)
                .map(|key| key.to_encoded_point(false).as_bytes().to_vec()),
            EcCurve::P224 => p224::PublicKey::from_sec1_bytes(sec1)
                .map(|key| key.to_encoded_point(false).as_bytes().to_vec()),
            EcCurve::P256 => p256::PublicKey::from_sec1_bytes(sec1)
                .map(|key| key.to_encoded_point(false).as_bytes().to_vec()),
            EcCurve::P384 => p384::PublicKey::from_sec1_bytes(sec1)
                .map(|key| key.to_encoded_point(false).as_bytes().to_vec()),
            EcCurve::P521 => p521::PublicKey::from_sec1_bytes(sec1)
                .map(|key| key.to_encoded_point(false).as_bytes().to_vec()),
            EcCurve::Secp256k1 => k256::PublicKey::from_sec1_bytes(sec1)
                .map(|key| key.to_encoded_point(false).as_bytes().to_vec()),
            _ => return self.passthrough_point(sec1),
        };

        decoded.map_err(|e| {
            Error::KeyExtraction(format!("Invalid {} public point: {}", self.name(), e))
        })
    }

    fn passthrough_point(&self, sec1: &[u8]) -> Result<Vec<u8>> {
        match sec1.first() {
            Some(&UNCOMPRESSED_TAG) if sec1.len() == self.uncompressed_len() => Ok(sec1.to_vec()),
            Some(0x02 | 0x03) => Err(Error::KeyExtraction(format!(
                "Compressed {} points are not supported",
                self.name()
            ))),
            _ => Err(Error::KeyExtraction(format!(
                "Malformed {} public point ({} bytes, expected {})",
                self.name(),
                sec1.len(),
                self.uncompressed_len()
            ))),
        }
    }
}

/// A subject public key, tagged by algorithm family
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublicKey {
    /// Big-endian unsigned integers without leading zeros
    Rsa {
        modulus: Vec<u8>,
        public_exponent: Vec<u8>,
    },
    /// Affine coordinates, each left-padded to the curve's field width
    Ec { curve: EcCurve, x: Vec<u8>, y: Vec<u8> },
    Ed25519([u8; ED25519_KEY_LEN]),
    Ed448([u8; ED448_KEY_LEN]),
    /// Unrecognized algorithm (or unknown EC curve), carrying the SPKI DER
    ///
    /// The SPKI is hashed as if it were a raw key. Mobile platforms never
    /// export keys this way, so a pin computed from this variant will
    /// generally not match one computed on the device.
    Unknown {
        algorithm: ObjectIdentifier,
        spki: Vec<u8>,
    },
}

impl PublicKey {
    /// Classify and decode a SubjectPublicKeyInfo
    pub fn from_spki(spki: &SubjectPublicKeyInfoOwned) -> Result<Self> {
        match spki.algorithm.oid {
            rfc5912::RSA_ENCRYPTION | ID_RSASSA_PSS => Self::rsa(key_bits(spki)?),
            rfc5912::ID_EC_PUBLIC_KEY => match named_curve(spki) {
                Some(curve) => Self::ec(curve, key_bits(spki)?),
                None => {
                    log::debug!("EC key without a recognized named curve, using SPKI fallback");
                    Self::unknown(spki)
                }
            },
            rfc8410::ID_ED_25519 => fixed_len_key(key_bits(spki)?, "Ed25519").map(PublicKey::Ed25519),
            rfc8410::ID_ED_448 => fixed_len_key(key_bits(spki)?, "Ed448").map(PublicKey::Ed448),
            _ => Self::unknown(spki),
        }
    }

    fn rsa(bits: &[u8]) -> Result<Self> {
        let key = pkcs1::RsaPublicKey::from_der(bits)
            .map_err(|e| Error::KeyExtraction(format!("Invalid RSAPublicKey: {}", e)))?;

        Ok(PublicKey::Rsa {
            modulus: key.modulus.as_bytes().to_vec(),
            public_exponent: key.public_exponent.as_bytes().to_vec(),
        })
    }

    fn ec(curve: EcCurve, bits: &[u8]) -> Result<Self> {
        let point = curve.uncompressed_point(bits)?;
        let width = curve.field_len();

        if point.len() != curve.uncompressed_len() || point[0] != UNCOMPRESSED_TAG {
            return Err(Error::KeyExtraction(format!(
                "Unexpected {} point encoding ({} bytes)",
                curve.name(),
                point.len()
            )));
        }

        Ok(PublicKey::Ec {
            curve,
            x: point[1..1 + width].to_vec(),
            y: point[1 + width..].to_vec(),
        })
    }

    fn unknown(spki: &SubjectPublicKeyInfoOwned) -> Result<Self> {
        Ok(PublicKey::Unknown {
            algorithm: spki.algorithm.oid,
            spki: encode_spki(spki)?,
        })
    }

    /// Raw export bytes, the input to the pin
    pub fn raw_bytes(&self) -> Result<Vec<u8>> {
        match self {
            PublicKey::Rsa {
                modulus,
                public_exponent,
            } => pkcs1_der(modulus, public_exponent),
            PublicKey::Ec { x, y, .. } => {
                let mut point = Vec::with_capacity(1 + x.len() + y.len());
                point.push(UNCOMPRESSED_TAG);
                point.extend_from_slice(x);
                point.extend_from_slice(y);
                Ok(point)
            }
            PublicKey::Ed25519(key) => Ok(key.to_vec()),
            PublicKey::Ed448(key) => Ok(key.to_vec()),
            PublicKey::Unknown { spki, .. } => Ok(spki.clone()),
        }
    }

    /// Human-readable name of the encoding rule that produced the raw bytes
    pub fn label(&self) -> String {
        match self {
            PublicKey::Rsa { .. } => "RSA (PKCS#1 DER)".to_string(),
            PublicKey::Ec { curve, .. } => format!("EC {} (X9.63 uncompressed)", curve.name()),
            PublicKey::Ed25519(_) => "Ed25519 (raw)".to_string(),
            PublicKey::Ed448(_) => "Ed448 (raw)".to_string(),
            PublicKey::Unknown { .. } => "Unknown type → SPKI fallback".to_string(),
        }
    }
}

/// Result of canonicalizing a certificate's public key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalKey {
    pub key: PublicKey,
    /// Raw export bytes (hashed for the pin)
    pub raw: Vec<u8>,
    /// SubjectPublicKeyInfo DER, for reference only
    pub spki: Vec<u8>,
    /// Which encoding rule fired
    pub label: String,
}

impl CanonicalKey {
    /// The pin: `base64(sha256(raw))`
    pub fn pin(&self) -> Pin {
        Pin::of(&self.raw)
    }

    /// Pin over the SPKI DER instead of the raw key
    pub fn spki_pin(&self) -> Pin {
        Pin::of(&self.spki)
    }
}

/// Parse a DER certificate and canonicalize its subject public key
pub fn canonicalize(cert_der: &[u8]) -> Result<CanonicalKey> {
    let cert = Certificate::from_der(cert_der).map_err(Error::CertificateParse)?;

    canonicalize_spki(&cert.tbs_certificate.subject_public_key_info)
}

/// Canonicalize a SubjectPublicKeyInfo
pub fn canonicalize_spki(spki: &SubjectPublicKeyInfoOwned) -> Result<CanonicalKey> {
    let key = PublicKey::from_spki(spki)?;
    let raw = key.raw_bytes()?;

    // EC points may have arrived compressed; re-wrap the uncompressed form so
    // the SPKI matches what the platform would export.
    let spki = match &key {
        PublicKey::Ec { .. } => {
            let mut normalized = spki.clone();
            normalized.subject_public_key = BitString::from_bytes(&raw)
                .map_err(|e| Error::KeyExtraction(format!("Failed to encode EC point: {}", e)))?;
            encode_spki(&normalized)?
        }
        PublicKey::Unknown { spki: der, .. } => der.clone(),
        _ => encode_spki(spki)?,
    };

    let label = key.label();
    log::debug!("Key format: {} ({} raw bytes)", label, raw.len());
    log::debug!("SPKI SHA-256: {}", pin::sha256_hex(&spki));

    Ok(CanonicalKey {
        key,
        raw,
        spki,
        label,
    })
}

/// Subject public key BIT STRING contents; must be octet-aligned
fn key_bits(spki: &SubjectPublicKeyInfoOwned) -> Result<&[u8]> {
    spki.subject_public_key
        .as_bytes()
        .ok_or_else(|| Error::KeyExtraction("Subject public key has unused bits".into()))
}

/// The `namedCurve` of an `id-ecPublicKey`, if it is one we know
fn named_curve(spki: &SubjectPublicKeyInfoOwned) -> Option<EcCurve> {
    let params = spki.algorithm.parameters.as_ref()?;
    let oid = params.decode_as::<ObjectIdentifier>().ok()?;
    EcCurve::from_oid(&oid)
}

fn fixed_len_key<const N: usize>(bits: &[u8], family: &str) -> Result<[u8; N]> {
    bits.try_into().map_err(|_| {
        Error::KeyExtraction(format!(
            "{} public key must be {} bytes, got {}",
            family,
            N,
            bits.len()
        ))
    })
}

/// DER `RSAPublicKey ::= SEQUENCE { modulus INTEGER, publicExponent INTEGER }`
fn pkcs1_der(modulus: &[u8], public_exponent: &[u8]) -> Result<Vec<u8>> {
    let encode = || -> der::Result<Vec<u8>> {
        pkcs1::RsaPublicKey {
            modulus: UintRef::new(modulus)?,
            public_exponent: UintRef::new(public_exponent)?,
        }
        .to_der()
    };

    encode().map_err(|e| Error::KeyExtraction(format!("Failed to encode RSAPublicKey: {}", e)))
}

fn encode_spki(spki: &SubjectPublicKeyInfoOwned) -> Result<Vec<u8>> {
    spki.to_der()
        .map_err(|e| Error::KeyExtraction(format!("Failed to encode SPKI: {}", e)))
}
