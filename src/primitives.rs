//! Thin adapter over the underlying crypto primitives: Ed25519 detached
//! sign/verify, X25519+XSalsa20-Poly1305 authenticated "box", XSalsa20-Poly1305
//! "secretbox", bcrypt_pbkdf, and a secure RNG.
//!
//! Every sealing operation here is detached: the authentication tag is
//! returned or consumed separately from the ciphertext, and every failure
//! collapses to a plain `bool`/`Result<(), ()>` — there is no partial
//! failure to reason about above this layer.

use std::sync::Once;

use crypto_box::aead::AeadInPlace;
use crypto_box::{PublicKey as BoxPublicKey, SecretKey as BoxSecretKey};
use ed25519_dalek::{Signature as EdSignature, Signer, SigningKey, Verifier, VerifyingKey};
use rand_core::{OsRng, RngCore};
use subtle::ConstantTimeEq;
use xsalsa20poly1305::{KeyInit, XSalsa20Poly1305};

/// Length of a secretbox/box nonce.
pub const NONCE_LEN: usize = 24;

/// Length of a secretbox/box authentication tag.
pub const TAG_LEN: usize = 16;

/// Length of an X25519/Ed25519 public key.
pub const KEY_LEN: usize = 32;

static INIT: Once = Once::new();

/// Idempotent one-time setup. The chosen primitive crates need no
/// process-wide initialization, but the contract is kept so that callers
/// coded against it keep working if the underlying crate ever changes.
pub fn init() {
    INIT.call_once(|| {});
}

/// Fills `out` with cryptographically secure random bytes.
pub fn random(out: &mut [u8]) {
    OsRng.fill_bytes(out);
}

/// Produces a detached Ed25519 signature over `msg`.
#[must_use]
pub fn sign(seckey: &[u8; 64], msg: &[u8]) -> [u8; 64] {
    let signing_key =
        SigningKey::from_keypair_bytes(seckey).expect("ed25519 keypair bytes always valid here");
    signing_key.sign(msg).to_bytes()
}

/// Verifies a detached Ed25519 signature. Returns `true` iff valid.
#[must_use]
pub fn verify(pubkey: &[u8; 32], msg: &[u8], sig: &[u8; 64]) -> bool {
    let Ok(verifying_key) = VerifyingKey::from_bytes(pubkey) else {
        return false;
    };
    let signature = EdSignature::from_bytes(sig);
    verifying_key.verify(msg, &signature).is_ok()
}

/// Seals `msg` in place with XSalsa20-Poly1305 under `key`, drawing a fresh
/// random nonce. Returns `(nonce, tag)`.
#[must_use]
pub fn secretbox_seal(key: &[u8; 32], msg: &mut [u8]) -> ([u8; NONCE_LEN], [u8; TAG_LEN]) {
    let mut nonce = [0u8; NONCE_LEN];
    random(&mut nonce);

    let cipher = XSalsa20Poly1305::new(key.into());
    let tag = cipher
        .encrypt_in_place_detached(nonce.as_slice().into(), b"", msg)
        .expect("secretbox encryption cannot fail");

    (nonce, tag.into())
}

/// Opens an XSalsa20-Poly1305 secretbox in place. Returns `true` iff the
/// tag authenticated; on failure `msg` is left in its (undefined) partial
/// state and the caller must discard it.
#[must_use]
pub fn secretbox_open(
    key: &[u8; 32],
    msg: &mut [u8],
    nonce: &[u8; NONCE_LEN],
    tag: &[u8; TAG_LEN],
) -> bool {
    let cipher = XSalsa20Poly1305::new(key.into());
    cipher
        .decrypt_in_place_detached(nonce.into(), b"", msg, tag.into())
        .is_ok()
}

/// Seals `msg` in place with an authenticated box between `sec` (ours) and
/// `pub_` (theirs), drawing a fresh random nonce. Returns `(nonce, tag)`.
#[must_use]
pub fn box_seal(
    pub_: &[u8; 32],
    sec: &[u8; 32],
    msg: &mut [u8],
) -> ([u8; NONCE_LEN], [u8; TAG_LEN]) {
    let mut nonce = [0u8; NONCE_LEN];
    random(&mut nonce);

    let sec = BoxSecretKey::from_bytes(*sec);
    let pub_ = BoxPublicKey::from(*pub_);
    let cipher = crypto_box::SalsaBox::new(&pub_, &sec);
    let tag = cipher
        .encrypt_in_place_detached(nonce.as_slice().into(), b"", msg)
        .expect("box encryption cannot fail");

    (nonce, tag.into())
}

/// Opens an authenticated box in place. Returns `true` iff the tag
/// authenticated.
#[must_use]
pub fn box_open(
    pub_: &[u8; 32],
    sec: &[u8; 32],
    msg: &mut [u8],
    nonce: &[u8; NONCE_LEN],
    tag: &[u8; TAG_LEN],
) -> bool {
    let sec = BoxSecretKey::from_bytes(*sec);
    let pub_ = BoxPublicKey::from(*pub_);
    let cipher = crypto_box::SalsaBox::new(&pub_, &sec);
    cipher
        .decrypt_in_place_detached(nonce.into(), b"", msg, tag.into())
        .is_ok()
}

/// Generates a fresh X25519 keypair for public-key encryption.
#[must_use]
pub fn box_keypair() -> ([u8; 32], [u8; 32]) {
    let sec = BoxSecretKey::generate(&mut OsRng);
    let pub_ = sec.public_key();
    (*pub_.as_bytes(), sec.to_bytes())
}

/// Generates a fresh Ed25519 keypair, returning `(pubkey, keypair_bytes)`
/// where `keypair_bytes` is the 64-byte seed-then-pubkey wire layout.
#[must_use]
pub fn sign_keypair() -> ([u8; 32], [u8; 64]) {
    let signing_key = SigningKey::generate(&mut OsRng);
    (signing_key.verifying_key().to_bytes(), signing_key.to_keypair_bytes())
}

/// Derives a `len`-byte key from `password` and `salt` using bcrypt_pbkdf
/// with the given round count. `rounds == 0` is the "no password" sentinel
/// and yields an all-zero key without invoking the KDF.
///
/// An empty, non-sentinel passphrase (`rounds > 0` but `password` is empty —
/// e.g. a caller-supplied literal empty string for `sym_encrypt`, which has
/// no rounds=0 sentinel of its own) is substituted with a single zero byte:
/// `bcrypt_pbkdf` itself rejects a zero-length passphrase outright, but the
/// core's contract never rejects an empty passphrase, only an absent one.
pub fn kdf(salt: &[u8], rounds: u32, password: &[u8], out: &mut [u8]) {
    if rounds == 0 {
        out.fill(0);
        return;
    }
    let password = if password.is_empty() { &[0u8][..] } else { password };
    bcrypt_pbkdf::bcrypt_pbkdf(password, salt, rounds, out)
        .expect("bcrypt_pbkdf parameters are always valid when rounds > 0 and inputs nonempty");
}

/// Constant-time equality, used for comparing random identifiers and other
/// not-quite-secret-but-still-shouldn't-leak-timing values.
#[must_use]
pub fn ct_eq(a: &[u8], b: &[u8]) -> bool {
    a.ct_eq(b).into()
}
