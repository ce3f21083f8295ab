//! Typed errors for every core operation.
//!
//! Every error kind named in the core's contract (`InvalidFormat`,
//! `UnsupportedKey`, `UnsupportedKdf`, `BadPassphrase`, `Mismatch`,
//! `AuthFail`, `KeyringCorrupt`, `NotFound`) appears in exactly one variant
//! below; none are aliased or merged.

use thiserror::Error;

/// Armor or binary framing was malformed: a marker was missing, a label
/// didn't match, a body had the wrong length, or a header was truncated.
#[derive(Clone, Copy, Debug, Eq, Error, PartialEq)]
#[error("invalid format")]
pub struct InvalidFormat;

/// A record's algorithm tag was not one this implementation recognizes.
#[derive(Clone, Copy, Debug, Eq, Error, PartialEq)]
#[error("unsupported key algorithm")]
pub struct UnsupportedKey;

/// An error obtaining a passphrase from the caller-supplied callback.
#[derive(Debug, Error)]
#[error("error obtaining passphrase")]
pub struct PromptError(#[from] pub std::io::Error);

/// An error parsing a public key.
#[derive(Debug, Error)]
pub enum ParsePublicKeyError {
    /// The armor or body was malformed.
    #[error(transparent)]
    InvalidFormat(#[from] InvalidFormat),

    /// `sigalg`/`encalg` did not match the expected tags.
    #[error(transparent)]
    UnsupportedKey(#[from] UnsupportedKey),
}

/// An error parsing or unwrapping a secret key.
#[derive(Debug, Error)]
pub enum ParseSecretKeyError {
    /// The armor or body was malformed.
    #[error(transparent)]
    InvalidFormat(#[from] InvalidFormat),

    /// `sigalg`/`encalg`/`symalg` did not match the expected tags.
    #[error(transparent)]
    UnsupportedKey(#[from] UnsupportedKey),

    /// `kdfalg` was not `BK`.
    #[error("unsupported KDF algorithm")]
    UnsupportedKdf,

    /// The wrapping secretbox failed to open; the passphrase was wrong.
    #[error("incorrect passphrase")]
    BadPassphrase,

    /// Reading the passphrase via the caller's callback failed.
    #[error(transparent)]
    Prompt(#[from] PromptError),
}

/// An error parsing a signature.
#[derive(Clone, Copy, Debug, Eq, Error, PartialEq)]
#[error(transparent)]
pub struct ParseSignatureError(#[from] pub InvalidFormat);

/// An error verifying a signature.
#[derive(Clone, Copy, Debug, Eq, Error, PartialEq)]
pub enum VerifyError {
    /// The signature's random identifier does not match the public key's.
    #[error("signature was not produced by this key")]
    Mismatch,

    /// The random identifiers matched but the signature itself is invalid.
    #[error("bad signature")]
    Bad,
}

/// An error encrypting or decrypting a symmetric envelope. The envelope's
/// own `kdfalg` is already validated by the time one of these functions
/// sees it — see [`ParseEnvelopeError::UnsupportedKdf`] for that check.
#[derive(Debug, Error)]
pub enum SymDecryptError {
    /// The secretbox failed to open; the passphrase was wrong or the
    /// ciphertext was tampered with.
    #[error("decryption failed")]
    Fail,

    /// Reading the passphrase via the caller's callback failed.
    #[error(transparent)]
    Prompt(#[from] PromptError),
}

/// An error decrypting a current (`eC`) public-key envelope. The supplied
/// keys' algorithm tags are already validated by the time one of these
/// functions sees them — see [`ParseEnvelopeError::UnsupportedKey`] and
/// [`ParsePublicKeyError::UnsupportedKey`] for those checks.
#[derive(Clone, Copy, Debug, Eq, Error, PartialEq)]
pub enum PubDecryptError {
    /// The envelope's random identifiers don't line up with the supplied
    /// keys.
    #[error("key/envelope identifier mismatch")]
    Mismatch,

    /// A box-open failed: the ephemeral wrap or the plaintext seal did not
    /// authenticate.
    #[error("authentication failed")]
    AuthFail,
}

/// An error looking up a public key in a keyring.
#[derive(Clone, Copy, Debug, Eq, Error, PartialEq)]
pub enum KeyringError {
    /// A block in the keyring text was malformed.
    #[error("keyring is corrupt")]
    Corrupt,

    /// No block in the keyring matched the requested identifier.
    #[error("identifier not found")]
    NotFound,
}

/// An error dispatching a header buffer to the envelope kind its algorithm
/// tag names (see [`crate::encrypt::parse_envelope`]). Kept distinct from
/// [`DecryptDispatchError`]: this is the `ParsedHeader -> AlgDispatched`
/// edge, before any key or passphrase is involved.
#[derive(Clone, Copy, Debug, Eq, Error, PartialEq)]
pub enum ParseEnvelopeError {
    /// The tag was unrecognized, or the record's fixed-size body didn't
    /// match its expected wire length.
    #[error("invalid format")]
    InvalidFormat,

    /// The record's own algorithm tags (other than the one used to select
    /// it) didn't match what this implementation supports.
    #[error("unsupported key algorithm")]
    UnsupportedKey,

    /// A symmetric envelope's `kdfalg` was not `BK`.
    #[error("unsupported KDF algorithm")]
    UnsupportedKdf,
}

impl From<InvalidFormat> for ParseEnvelopeError {
    fn from(_: InvalidFormat) -> Self {
        ParseEnvelopeError::InvalidFormat
    }
}

/// The three-way outcome of decrypting a dispatched envelope of unknown
/// kind (see the decrypt dispatcher in [`crate::encrypt`]).
#[derive(Debug, Error)]
pub enum DecryptDispatchError {
    /// The header's algorithm tag was not recognized, or the frame itself
    /// was malformed.
    #[error(transparent)]
    InvalidFormat(#[from] InvalidFormat),

    /// The symmetric envelope's KDF failed.
    #[error(transparent)]
    SymDecrypt(#[from] SymDecryptError),

    /// The public-key envelope's identifiers or authentication failed.
    #[error(transparent)]
    PubDecrypt(#[from] PubDecryptError),
}
