//! Fixed-layout wire records.
//!
//! Each record's `to_wire`/`from_wire` methods (de)serialize exactly the
//! fixed-size portion of the record — the `ident` field, where present, is
//! never part of that fixed-size portion. It always travels separately, as
//! the armor's `ident:` line or as the length-prefixed identifier in binary
//! framing (see `armor.rs` and `framing.rs`). All multi-byte integers are
//! big-endian.

use zeroize::Zeroize;

use crate::error::InvalidFormat;

/// Length of a random identifier.
pub const RANDOMID_LEN: usize = 8;

/// Ed25519 signing algorithm tag.
pub const SIGALG: [u8; 2] = *b"Ed";
/// X25519 public-key encryption algorithm tag.
pub const ENCALG: [u8; 2] = *b"CS";
/// Current ephemeral-wrapped public-key envelope tag.
pub const EPHEMERAL_ENCALG: [u8; 2] = *b"eC";
/// Legacy ephemeral-in-the-clear envelope tag.
pub const LEGACY_EPHEMERAL_ENCALG: [u8; 2] = *b"eS";
/// Symmetric (passphrase) envelope tag.
pub const SYMALG: [u8; 2] = *b"SP";
/// bcrypt_pbkdf KDF tag.
pub const KDFALG: [u8; 2] = *b"BK";

type RandomId = [u8; RANDOMID_LEN];

fn split_at(buf: &[u8], n: usize) -> Result<(&[u8], &[u8]), InvalidFormat> {
    if buf.len() < n {
        return Err(InvalidFormat);
    }
    Ok(buf.split_at(n))
}

/// Like [`split_at`], but for a record's final field: rejects any leftover
/// bytes instead of silently discarding them, so a body padded past its
/// fixed wire size is a parse error rather than an ignored surplus.
fn split_final(buf: &[u8], n: usize) -> Result<&[u8], InvalidFormat> {
    if buf.len() != n {
        return Err(InvalidFormat);
    }
    Ok(buf)
}

/// A public key: signing key, encryption key, random identifier, and the
/// identity string it was generated with.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PublicKey {
    pub randomid: RandomId,
    pub sigkey: [u8; 32],
    pub enckey: [u8; 32],
    pub ident: String,
}

impl PublicKey {
    /// Serializes the fixed-size portion (everything but `ident`).
    #[must_use]
    pub fn to_wire(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(76);
        out.extend_from_slice(&SIGALG);
        out.extend_from_slice(&ENCALG);
        out.extend_from_slice(&self.randomid);
        out.extend_from_slice(&self.sigkey);
        out.extend_from_slice(&self.enckey);
        out
    }

    /// Parses the fixed-size portion, pairing it with an `ident` obtained
    /// separately from the armor or binary frame.
    pub fn from_wire(buf: &[u8], ident: String) -> Result<Self, ParsePublicKeyWireError> {
        let (sigalg, buf) = split_at(buf, 2)?;
        let (encalg, buf) = split_at(buf, 2)?;
        let (randomid, buf) = split_at(buf, RANDOMID_LEN)?;
        let (sigkey, buf) = split_at(buf, 32)?;
        let enckey = split_final(buf, 32)?;

        if sigalg != SIGALG || encalg != ENCALG {
            return Err(ParsePublicKeyWireError::UnsupportedKey);
        }

        Ok(PublicKey {
            randomid: randomid.try_into().expect("checked length"),
            sigkey: sigkey.try_into().expect("checked length"),
            enckey: enckey.try_into().expect("checked length"),
            ident,
        })
    }
}

/// Either [`InvalidFormat`] or [`UnsupportedKey`]; kept separate from
/// [`crate::error::ParsePublicKeyError`] so this module has no dependency
/// on the higher-level armor/framing error surface.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ParsePublicKeyWireError {
    InvalidFormat,
    UnsupportedKey,
}

impl From<InvalidFormat> for ParsePublicKeyWireError {
    fn from(_: InvalidFormat) -> Self {
        ParsePublicKeyWireError::InvalidFormat
    }
}

/// A secret key, in whatever state (wrapped-at-rest or unwrapped) its
/// `kdfrounds`/`salt`/`nonce`/`tag` fields describe. `sigkey`/`enckey` hold
/// sealed bytes when wrapped and plaintext key material when unwrapped;
/// callers drive that transition via [`crate::keys::wrap`]/[`crate::keys::unwrap`].
#[derive(Clone, Debug, Zeroize)]
#[zeroize(drop)]
pub struct SecretKey {
    #[zeroize(skip)]
    pub randomid: RandomId,
    pub kdfrounds: u32,
    pub salt: [u8; 16],
    pub nonce: [u8; 24],
    pub tag: [u8; 16],
    pub sigkey: [u8; 64],
    pub enckey: [u8; 32],
    #[zeroize(skip)]
    pub ident: String,
}

impl SecretKey {
    /// Serializes the fixed-size portion (everything but `ident`).
    #[must_use]
    pub fn to_wire(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(172);
        out.extend_from_slice(&SIGALG);
        out.extend_from_slice(&ENCALG);
        out.extend_from_slice(&SYMALG);
        out.extend_from_slice(&KDFALG);
        out.extend_from_slice(&self.randomid);
        out.extend_from_slice(&self.kdfrounds.to_be_bytes());
        out.extend_from_slice(&self.salt);
        out.extend_from_slice(&self.nonce);
        out.extend_from_slice(&self.tag);
        out.extend_from_slice(&self.sigkey);
        out.extend_from_slice(&self.enckey);
        out
    }

    /// Parses the fixed-size portion, pairing it with an `ident` obtained
    /// separately from the armor or binary frame.
    pub fn from_wire(buf: &[u8], ident: String) -> Result<Self, ParseSecretKeyWireError> {
        let (sigalg, buf) = split_at(buf, 2)?;
        let (encalg, buf) = split_at(buf, 2)?;
        let (symalg, buf) = split_at(buf, 2)?;
        let (kdfalg, buf) = split_at(buf, 2)?;
        let (randomid, buf) = split_at(buf, RANDOMID_LEN)?;
        let (kdfrounds, buf) = split_at(buf, 4)?;
        let (salt, buf) = split_at(buf, 16)?;
        let (nonce, buf) = split_at(buf, 24)?;
        let (tag, buf) = split_at(buf, 16)?;
        let (sigkey, buf) = split_at(buf, 64)?;
        let enckey = split_final(buf, 32)?;

        if sigalg != SIGALG || encalg != ENCALG {
            return Err(ParseSecretKeyWireError::UnsupportedKey);
        }
        if symalg != SYMALG {
            return Err(ParseSecretKeyWireError::UnsupportedKey);
        }
        if kdfalg != KDFALG {
            return Err(ParseSecretKeyWireError::UnsupportedKdf);
        }

        Ok(SecretKey {
            randomid: randomid.try_into().expect("checked length"),
            kdfrounds: u32::from_be_bytes(kdfrounds.try_into().expect("checked length")),
            salt: salt.try_into().expect("checked length"),
            nonce: nonce.try_into().expect("checked length"),
            tag: tag.try_into().expect("checked length"),
            sigkey: sigkey.try_into().expect("checked length"),
            enckey: enckey.try_into().expect("checked length"),
            ident,
        })
    }
}

/// Either [`InvalidFormat`], [`UnsupportedKey`], or an unsupported KDF tag.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ParseSecretKeyWireError {
    InvalidFormat,
    UnsupportedKey,
    UnsupportedKdf,
}

impl From<InvalidFormat> for ParseSecretKeyWireError {
    fn from(_: InvalidFormat) -> Self {
        ParseSecretKeyWireError::InvalidFormat
    }
}

/// A detached signature.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Signature {
    pub randomid: RandomId,
    pub sig: [u8; 64],
    pub ident: String,
}

impl Signature {
    /// Serializes the fixed-size portion (everything but `ident`).
    #[must_use]
    pub fn to_wire(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(74);
        out.extend_from_slice(&SIGALG);
        out.extend_from_slice(&self.randomid);
        out.extend_from_slice(&self.sig);
        out
    }

    /// Parses the fixed-size portion, pairing it with an `ident` obtained
    /// separately from the armor.
    pub fn from_wire(buf: &[u8], ident: String) -> Result<Self, ParsePublicKeyWireError> {
        let (sigalg, buf) = split_at(buf, 2)?;
        let (randomid, buf) = split_at(buf, RANDOMID_LEN)?;
        let sig = split_final(buf, 64)?;

        if sigalg != SIGALG {
            return Err(ParsePublicKeyWireError::UnsupportedKey);
        }

        Ok(Signature {
            randomid: randomid.try_into().expect("checked length"),
            sig: sig.try_into().expect("checked length"),
            ident,
        })
    }
}

/// A symmetric (passphrase) envelope header. Carries no identifier of its
/// own; framing substitutes the literal [`crate::encrypt::SYMMETRIC_IDENT`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SymmetricEnvelope {
    pub kdfrounds: u32,
    pub salt: [u8; 16],
    pub nonce: [u8; 24],
    pub tag: [u8; 16],
}

impl SymmetricEnvelope {
    #[must_use]
    pub fn to_wire(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(64);
        out.extend_from_slice(&SYMALG);
        out.extend_from_slice(&KDFALG);
        out.extend_from_slice(&self.kdfrounds.to_be_bytes());
        out.extend_from_slice(&self.salt);
        out.extend_from_slice(&self.nonce);
        out.extend_from_slice(&self.tag);
        out
    }

    pub fn from_wire(buf: &[u8]) -> Result<Self, ParseSecretKeyWireError> {
        let (symalg, buf) = split_at(buf, 2)?;
        let (kdfalg, buf) = split_at(buf, 2)?;
        let (kdfrounds, buf) = split_at(buf, 4)?;
        let (salt, buf) = split_at(buf, 16)?;
        let (nonce, buf) = split_at(buf, 24)?;
        let tag = split_final(buf, 16)?;

        if symalg != SYMALG {
            return Err(ParseSecretKeyWireError::UnsupportedKey);
        }
        if kdfalg != KDFALG {
            return Err(ParseSecretKeyWireError::UnsupportedKdf);
        }

        Ok(SymmetricEnvelope {
            kdfrounds: u32::from_be_bytes(kdfrounds.try_into().expect("checked length")),
            salt: salt.try_into().expect("checked length"),
            nonce: nonce.try_into().expect("checked length"),
            tag: tag.try_into().expect("checked length"),
        })
    }
}

/// The current authenticated, ephemeral-wrapped public-key envelope (`eC`).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PublicKeyEnvelope {
    pub secrandomid: RandomId,
    pub pubrandomid: RandomId,
    pub ephpubkey: [u8; 32],
    pub ephnonce: [u8; 24],
    pub ephtag: [u8; 16],
    pub nonce: [u8; 24],
    pub tag: [u8; 16],
    pub ident: String,
}

impl PublicKeyEnvelope {
    #[must_use]
    pub fn to_wire(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(130);
        out.extend_from_slice(&EPHEMERAL_ENCALG);
        out.extend_from_slice(&self.secrandomid);
        out.extend_from_slice(&self.pubrandomid);
        out.extend_from_slice(&self.ephpubkey);
        out.extend_from_slice(&self.ephnonce);
        out.extend_from_slice(&self.ephtag);
        out.extend_from_slice(&self.nonce);
        out.extend_from_slice(&self.tag);
        out
    }

    pub fn from_wire(buf: &[u8], ident: String) -> Result<Self, ParsePublicKeyWireError> {
        let (encalg, buf) = split_at(buf, 2)?;
        let (secrandomid, buf) = split_at(buf, RANDOMID_LEN)?;
        let (pubrandomid, buf) = split_at(buf, RANDOMID_LEN)?;
        let (ephpubkey, buf) = split_at(buf, 32)?;
        let (ephnonce, buf) = split_at(buf, 24)?;
        let (ephtag, buf) = split_at(buf, 16)?;
        let (nonce, buf) = split_at(buf, 24)?;
        let tag = split_final(buf, 16)?;

        if encalg != EPHEMERAL_ENCALG {
            return Err(ParsePublicKeyWireError::UnsupportedKey);
        }

        Ok(PublicKeyEnvelope {
            secrandomid: secrandomid.try_into().expect("checked length"),
            pubrandomid: pubrandomid.try_into().expect("checked length"),
            ephpubkey: ephpubkey.try_into().expect("checked length"),
            ephnonce: ephnonce.try_into().expect("checked length"),
            ephtag: ephtag.try_into().expect("checked length"),
            nonce: nonce.try_into().expect("checked length"),
            tag: tag.try_into().expect("checked length"),
            ident,
        })
    }
}

/// The legacy `CS` envelope: `box(recipient, sender)` directly over the
/// plaintext, decrypt-only.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LegacyCsEnvelope {
    pub secrandomid: RandomId,
    pub pubrandomid: RandomId,
    pub nonce: [u8; 24],
    pub tag: [u8; 16],
}

impl LegacyCsEnvelope {
    #[must_use]
    pub fn to_wire(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(58);
        out.extend_from_slice(&ENCALG);
        out.extend_from_slice(&self.secrandomid);
        out.extend_from_slice(&self.pubrandomid);
        out.extend_from_slice(&self.nonce);
        out.extend_from_slice(&self.tag);
        out
    }

    pub fn from_wire(buf: &[u8]) -> Result<Self, ParsePublicKeyWireError> {
        let (encalg, buf) = split_at(buf, 2)?;
        let (secrandomid, buf) = split_at(buf, RANDOMID_LEN)?;
        let (pubrandomid, buf) = split_at(buf, RANDOMID_LEN)?;
        let (nonce, buf) = split_at(buf, 24)?;
        let tag = split_final(buf, 16)?;

        if encalg != ENCALG {
            return Err(ParsePublicKeyWireError::UnsupportedKey);
        }

        Ok(LegacyCsEnvelope {
            secrandomid: secrandomid.try_into().expect("checked length"),
            pubrandomid: pubrandomid.try_into().expect("checked length"),
            nonce: nonce.try_into().expect("checked length"),
            tag: tag.try_into().expect("checked length"),
        })
    }
}

/// The legacy `eS` envelope: ephemeral public key in the clear, decrypt-only.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LegacyEsEnvelope {
    pub pubrandomid: RandomId,
    pub pubkey: [u8; 32],
    pub nonce: [u8; 24],
    pub tag: [u8; 16],
}

impl LegacyEsEnvelope {
    #[must_use]
    pub fn to_wire(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(82);
        out.extend_from_slice(&LEGACY_EPHEMERAL_ENCALG);
        out.extend_from_slice(&self.pubrandomid);
        out.extend_from_slice(&self.pubkey);
        out.extend_from_slice(&self.nonce);
        out.extend_from_slice(&self.tag);
        out
    }

    pub fn from_wire(buf: &[u8]) -> Result<Self, ParsePublicKeyWireError> {
        let (encalg, buf) = split_at(buf, 2)?;
        let (pubrandomid, buf) = split_at(buf, RANDOMID_LEN)?;
        let (pubkey, buf) = split_at(buf, 32)?;
        let (nonce, buf) = split_at(buf, 24)?;
        let tag = split_final(buf, 16)?;

        if encalg != LEGACY_EPHEMERAL_ENCALG {
            return Err(ParsePublicKeyWireError::UnsupportedKey);
        }

        Ok(LegacyEsEnvelope {
            pubrandomid: pubrandomid.try_into().expect("checked length"),
            pubkey: pubkey.try_into().expect("checked length"),
            nonce: nonce.try_into().expect("checked length"),
            tag: tag.try_into().expect("checked length"),
        })
    }
}
