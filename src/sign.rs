//! Detached and embedded signing.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::armor;
use crate::error::{InvalidFormat, ParseSignatureError, VerifyError};
use crate::primitives;
use crate::records::{PublicKey, SecretKey, Signature};

const SIGNATURE_LABEL: &str = "SIGNATURE";
const SIGNED_MESSAGE_BEGIN: &str = "-----BEGIN REOP SIGNED MESSAGE-----\n";
const SIGNATURE_BEGIN: &str = "-----BEGIN REOP SIGNATURE-----";
const SIGNED_MESSAGE_END: &str = "-----END REOP SIGNED MESSAGE-----";

/// Produces a detached signature over `msg`, tagged with the signer's
/// random identifier and ident.
#[must_use]
pub fn sign(seckey: &SecretKey, msg: &[u8]) -> Signature {
    let sig = primitives::sign(&seckey.sigkey, msg);
    Signature { randomid: seckey.randomid, sig, ident: seckey.ident.clone() }
}

/// Verifies a detached signature. Checks the random identifiers before
/// touching the signature primitive at all, per the core's contract: a
/// mismatched identifier is reported as [`VerifyError::Mismatch`], never
/// [`VerifyError::Bad`].
pub fn verify(pubkey: &PublicKey, msg: &[u8], sig: &Signature) -> Result<(), VerifyError> {
    if !primitives::ct_eq(&pubkey.randomid, &sig.randomid) {
        return Err(VerifyError::Mismatch);
    }
    if primitives::verify(&pubkey.sigkey, msg, &sig.sig) {
        Ok(())
    } else {
        Err(VerifyError::Bad)
    }
}

/// Encodes a detached signature as armor.
#[must_use]
pub fn encode_sig(sig: &Signature) -> String {
    armor::encode_block(SIGNATURE_LABEL, &sig.ident, &sig.to_wire())
}

/// Parses a detached signature from armor.
pub fn parse_sig(text: &str) -> Result<Signature, ParseSignatureError> {
    let (ident, body) = armor::decode_block(text, SIGNATURE_LABEL)?;
    Signature::from_wire(&body, ident).map_err(|_| ParseSignatureError(InvalidFormat))
}

/// Builds an embedded signed message: the signature block follows the raw
/// message bytes directly, with no separator. Message bytes are opaque —
/// they need not be valid UTF-8 — so this returns `Vec<u8>`, not `String`.
#[must_use]
pub fn encode_embedded(seckey: &SecretKey, msg: &[u8]) -> Vec<u8> {
    let sig = sign(seckey, msg);

    let mut out = Vec::with_capacity(msg.len() + 256);
    out.extend_from_slice(SIGNED_MESSAGE_BEGIN.as_bytes());
    out.extend_from_slice(msg);
    out.extend_from_slice(SIGNATURE_BEGIN.as_bytes());
    out.push(b'\n');
    out.extend_from_slice(format!("ident:{}\n", sig.ident).as_bytes());
    out.extend_from_slice(armor::wrap_base64(&sig.to_wire()).as_bytes());
    out.extend_from_slice(SIGNED_MESSAGE_END.as_bytes());
    out.push(b'\n');
    out
}

/// Parses an embedded signed message, returning the message bytes and the
/// (not yet verified) signature. If more than one
/// `-----BEGIN REOP SIGNATURE-----` marker appears, the LAST one wins —
/// this is existing, intentional behavior: it defeats a forged signature
/// block prepended before the real one, at the cost of tolerating trailing
/// garbage after it.
pub fn parse_embedded(data: &[u8]) -> Result<(Vec<u8>, Signature), InvalidFormat> {
    let begin = SIGNED_MESSAGE_BEGIN.as_bytes();
    let after_begin = data.strip_prefix(begin).ok_or(InvalidFormat)?;

    let sig_marker = SIGNATURE_BEGIN.as_bytes();
    let marker_pos = rfind_bytes(after_begin, sig_marker).ok_or(InvalidFormat)?;
    let message = after_begin[..marker_pos].to_vec();
    let rest = &after_begin[marker_pos + sig_marker.len()..];

    let rest = rest.strip_prefix(b"\n").ok_or(InvalidFormat)?;
    let rest_str = std::str::from_utf8(rest).map_err(|_| InvalidFormat)?;

    let mut lines = rest_str.lines();
    let ident_line = lines.next().ok_or(InvalidFormat)?;
    let ident = armor::parse_ident_line(ident_line)?;

    let mut body_b64 = String::new();
    let mut found_end = false;
    for line in lines {
        if line.trim_end() == SIGNED_MESSAGE_END {
            found_end = true;
            break;
        }
        body_b64.push_str(line.trim_end());
    }
    if !found_end {
        return Err(InvalidFormat);
    }

    let body = STANDARD.decode(body_b64.as_bytes()).map_err(|_| InvalidFormat)?;
    let sig = Signature::from_wire(&body, ident).map_err(|_| InvalidFormat)?;

    Ok((message, sig))
}

fn rfind_bytes(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    (0..=haystack.len() - needle.len()).rev().find(|&i| &haystack[i..i + needle.len()] == needle)
}
