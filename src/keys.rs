//! Key lifecycle: generation, wrap/unwrap at rest, armor encode/parse, and
//! keyring lookup.

use zeroize::Zeroizing;

use crate::armor::{self, IDENT_MAX_LEN};
use crate::error::{InvalidFormat, KeyringError, ParsePublicKeyError, ParseSecretKeyError};
use crate::passphrase::PassphraseInput;
use crate::primitives;
use crate::records::{self, PublicKey, SecretKey};

const PUBKEY_LABEL: &str = "PUBLIC KEY";
const SECKEY_LABEL: &str = "SECRET KEY";

/// Generates a fresh identity: one random identifier shared by a new
/// Ed25519 signing keypair and a new X25519 encryption keypair.
#[must_use]
pub fn generate(ident: &str) -> (PublicKey, SecretKey) {
    let ident = truncate_ident(ident);

    let mut randomid = [0u8; records::RANDOMID_LEN];
    primitives::random(&mut randomid);

    let (sigpub, sigsec) = primitives::sign_keypair();
    let (encpub, encsec) = primitives::box_keypair();

    let pubkey = PublicKey { randomid, sigkey: sigpub, enckey: encpub, ident: ident.clone() };
    let seckey = SecretKey {
        randomid,
        kdfrounds: 0,
        salt: [0u8; 16],
        nonce: [0u8; 24],
        tag: [0u8; 16],
        sigkey: sigsec,
        enckey: encsec,
        ident,
    };

    (pubkey, seckey)
}

fn truncate_ident(ident: &str) -> String {
    ident.split_whitespace().next().unwrap_or("").chars().take(IDENT_MAX_LEN).collect()
}

/// Seals `sigkey‖enckey` at rest with a KDF-derived wrapping key. Rounds is
/// `0` (the all-zero-key sentinel) only when a literal empty passphrase was
/// supplied directly; passphrases obtained via a prompt always use the
/// fixed round count, since whether the typed passphrase turns out to be
/// empty isn't known until after the KDF has already been parameterized.
pub fn wrap(seckey: &SecretKey, passphrase: PassphraseInput) -> Result<SecretKey, crate::error::PromptError> {
    let (rounds, password) = match passphrase {
        PassphraseInput::Literal(bytes) => {
            let rounds = if bytes.is_empty() { 0 } else { 42 };
            (rounds, Zeroizing::new(bytes.to_vec()))
        }
        PassphraseInput::Prompt(f) => {
            let password = f(true).map_err(crate::error::PromptError)?;
            (42, password)
        }
    };

    let mut salt = [0u8; 16];
    primitives::random(&mut salt);

    let mut key = Zeroizing::new([0u8; 32]);
    primitives::kdf(&salt, rounds, &password, &mut *key);

    let mut combined = Zeroizing::new([0u8; 96]);
    combined[..64].copy_from_slice(&seckey.sigkey);
    combined[64..].copy_from_slice(&seckey.enckey);
    let (nonce, tag) = primitives::secretbox_seal(&key, &mut *combined);

    Ok(SecretKey {
        randomid: seckey.randomid,
        kdfrounds: rounds,
        salt,
        nonce,
        tag,
        sigkey: combined[..64].try_into().expect("64 bytes"),
        enckey: combined[64..].try_into().expect("32 bytes"),
        ident: seckey.ident.clone(),
    })
}

/// Opens a wrapped secret key, re-deriving the wrapping key from the
/// record's own salt and round count. No confirmation prompt: unwrap never
/// sets a new passphrase.
pub fn unwrap(seckey: &SecretKey, passphrase: PassphraseInput) -> Result<SecretKey, ParseSecretKeyError> {
    let password = passphrase.resolve(false)?;

    let mut key = Zeroizing::new([0u8; 32]);
    primitives::kdf(&seckey.salt, seckey.kdfrounds, &password, &mut *key);

    let mut combined = Zeroizing::new([0u8; 96]);
    combined[..64].copy_from_slice(&seckey.sigkey);
    combined[64..].copy_from_slice(&seckey.enckey);

    if !primitives::secretbox_open(&key, &mut *combined, &seckey.nonce, &seckey.tag) {
        return Err(ParseSecretKeyError::BadPassphrase);
    }

    Ok(SecretKey {
        randomid: seckey.randomid,
        kdfrounds: seckey.kdfrounds,
        salt: seckey.salt,
        nonce: seckey.nonce,
        tag: seckey.tag,
        sigkey: combined[..64].try_into().expect("64 bytes"),
        enckey: combined[64..].try_into().expect("32 bytes"),
        ident: seckey.ident.clone(),
    })
}

/// Encodes a public key as armor.
#[must_use]
pub fn encode_pubkey(pubkey: &PublicKey) -> String {
    armor::encode_block(PUBKEY_LABEL, &pubkey.ident, &pubkey.to_wire())
}

/// Parses a public key from armor.
pub fn parse_pubkey(text: &str) -> Result<PublicKey, ParsePublicKeyError> {
    let (ident, body) = armor::decode_block(text, PUBKEY_LABEL)?;
    PublicKey::from_wire(&body, ident).map_err(|e| match e {
        records::ParsePublicKeyWireError::InvalidFormat => ParsePublicKeyError::InvalidFormat(InvalidFormat),
        records::ParsePublicKeyWireError::UnsupportedKey => {
            ParsePublicKeyError::UnsupportedKey(crate::error::UnsupportedKey)
        }
    })
}

/// Encodes a secret key as armor, wrapping it at rest first.
pub fn encode_seckey(
    seckey: &SecretKey,
    passphrase: PassphraseInput,
) -> Result<String, crate::error::PromptError> {
    let wrapped = wrap(seckey, passphrase)?;
    Ok(armor::encode_block(SECKEY_LABEL, &wrapped.ident, &wrapped.to_wire()))
}

/// Parses a secret key from armor and unwraps it.
pub fn parse_seckey(text: &str, passphrase: PassphraseInput) -> Result<SecretKey, ParseSecretKeyError> {
    let (ident, body) = armor::decode_block(text, SECKEY_LABEL)?;
    let wrapped = SecretKey::from_wire(&body, ident).map_err(|e| match e {
        records::ParseSecretKeyWireError::InvalidFormat => ParseSecretKeyError::InvalidFormat(InvalidFormat),
        records::ParseSecretKeyWireError::UnsupportedKey => {
            ParseSecretKeyError::UnsupportedKey(crate::error::UnsupportedKey)
        }
        records::ParseSecretKeyWireError::UnsupportedKdf => ParseSecretKeyError::UnsupportedKdf,
    })?;
    unwrap(&wrapped, passphrase)
}

/// Scans a keyring text (zero or more public-key armor blocks separated by
/// blank lines) for a block whose `ident:` line matches `ident`.
pub fn find_pubkey_in_ring(ring_text: &str, ident: &str) -> Result<PublicKey, KeyringError> {
    for block in ring_text.split("\n\n") {
        let block = block.trim();
        if block.is_empty() {
            continue;
        }
        let (block_ident, body) = armor::decode_block(block, PUBKEY_LABEL).map_err(|_| KeyringError::Corrupt)?;
        if block_ident == ident {
            return PublicKey::from_wire(&body, block_ident).map_err(|_| KeyringError::Corrupt);
        }
    }
    Err(KeyringError::NotFound)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn generate_stamps_matching_identifiers() {
        let (pubkey, seckey) = generate("alice");
        assert_eq!(pubkey.randomid, seckey.randomid);
        assert_eq!(pubkey.ident, "alice");
        assert_eq!(seckey.ident, "alice");
    }

    #[test]
    fn wrap_unwrap_round_trip() {
        let (_, seckey) = generate("alice");
        let wrapped = wrap(&seckey, PassphraseInput::Literal(b"hunter2")).unwrap();
        assert_eq!(wrapped.kdfrounds, 42);
        let unwrapped = unwrap(&wrapped, PassphraseInput::Literal(b"hunter2")).unwrap();
        assert_eq!(unwrapped.sigkey, seckey.sigkey);
        assert_eq!(unwrapped.enckey, seckey.enckey);
    }

    #[test]
    fn wrap_empty_passphrase_uses_zero_rounds() {
        let (_, seckey) = generate("alice");
        let wrapped = wrap(&seckey, PassphraseInput::Literal(b"")).unwrap();
        assert_eq!(wrapped.kdfrounds, 0);
        let unwrapped = unwrap(&wrapped, PassphraseInput::Literal(b"")).unwrap();
        assert_eq!(unwrapped.sigkey, seckey.sigkey);
    }

    #[test]
    fn unwrap_wrong_passphrase_fails() {
        let (_, seckey) = generate("alice");
        let wrapped = wrap(&seckey, PassphraseInput::Literal(b"hunter2")).unwrap();
        assert_matches!(unwrap(&wrapped, PassphraseInput::Literal(b"wrong")), Err(ParseSecretKeyError::BadPassphrase));
    }

    #[test]
    fn wrap_is_randomized() {
        let (_, seckey) = generate("alice");
        let a = wrap(&seckey, PassphraseInput::Literal(b"hunter2")).unwrap();
        let b = wrap(&seckey, PassphraseInput::Literal(b"hunter2")).unwrap();
        assert_ne!(a.salt, b.salt);
        assert_ne!(a.nonce, b.nonce);
    }

    #[test]
    fn pubkey_armor_round_trip() {
        let (pubkey, _) = generate("alice");
        let text = encode_pubkey(&pubkey);
        let parsed = parse_pubkey(&text).unwrap();
        assert_eq!(pubkey, parsed);
    }

    #[test]
    fn seckey_armor_round_trip() {
        let (_, seckey) = generate("alice");
        let text = encode_seckey(&seckey, PassphraseInput::Literal(b"hunter2")).unwrap();
        let parsed = parse_seckey(&text, PassphraseInput::Literal(b"hunter2")).unwrap();
        assert_eq!(parsed.sigkey, seckey.sigkey);
        assert_eq!(parsed.enckey, seckey.enckey);
        assert_eq!(parsed.randomid, seckey.randomid);
        assert_eq!(parsed.ident, seckey.ident);
    }

    #[test]
    fn find_in_ring() {
        let (alice_pub, _) = generate("alice");
        let (bea_pub, _) = generate("bea");
        let ring = format!("{}\n{}", encode_pubkey(&alice_pub), encode_pubkey(&bea_pub));

        let found = find_pubkey_in_ring(&ring, "bea").unwrap();
        assert_eq!(found, bea_pub);

        assert_eq!(find_pubkey_in_ring(&ring, "carol"), Err(KeyringError::NotFound));
    }

    #[test]
    fn corrupt_ring_block_reported() {
        let ring = "-----BEGIN REOP PUBLIC KEY-----\nnot an ident line\n-----END REOP PUBLIC KEY-----\n";
        assert_eq!(find_pubkey_in_ring(ring, "alice"), Err(KeyringError::Corrupt));
    }
}
