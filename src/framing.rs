//! Textual (armor) and binary framing of a ciphertext message: a header
//! record (whichever envelope kind `encrypt::parse_envelope` dispatches on),
//! an identifier, and raw ciphertext bytes.
//!
//! The decrypt-dispatch state machine from §4.5 lives across this module and
//! `encrypt::parse_envelope`/`encrypt::decrypt_dispatch`: `ReadingFrame` is
//! this module peeling header/ident/ciphertext apart, `ParsedHeader` is
//! having a header buffer in hand, `AlgDispatched` is
//! `encrypt::parse_envelope` having matched the two-byte tag, and
//! `Authenticated`/`PlaintextDelivered` are `encrypt::decrypt_dispatch`
//! succeeding. An unrecognized tag is terminal `InvalidFormat` at the
//! `ParsedHeader -> AlgDispatched` edge; past `Authenticated` nothing else
//! in this module can fail.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::armor::{self, IDENT_MAX_LEN};
use crate::error::InvalidFormat;
use crate::records;

const BEGIN_MSG: &str = "-----BEGIN REOP ENCRYPTED MESSAGE-----";
const BEGIN_DATA: &str = "-----BEGIN REOP ENCRYPTED MESSAGE DATA-----";
const END_MSG: &str = "-----END REOP ENCRYPTED MESSAGE-----";

/// The 4-byte binary framing magic: the ASCII letters `RBF` plus the
/// terminating NUL of the C string literal it was copied from (see
/// `spec.md` §9 open question (a); preserved for bit-exact compatibility).
pub const BINARY_MAGIC: [u8; 4] = *b"RBF\0";

/// Encodes textual (armor) ciphertext framing: two consecutive labeled
/// blocks, one carrying the header record and one carrying the ciphertext,
/// sharing a single `ident:` line.
#[must_use]
pub fn encode_armored_ciphertext(header: &[u8], ident: &str, ciphertext: &[u8]) -> String {
    let mut out = String::new();
    out.push_str(BEGIN_MSG);
    out.push('\n');
    out.push_str("ident:");
    out.push_str(ident);
    out.push('\n');
    out.push_str(&armor::wrap_base64(header));
    out.push_str(BEGIN_DATA);
    out.push('\n');
    out.push_str(&armor::wrap_base64(ciphertext));
    out.push_str(END_MSG);
    out.push('\n');
    out
}

/// Decodes textual ciphertext framing, returning `(ident, header, ciphertext)`.
/// The header's length is whatever the base64 between the `ident:` line and
/// the data marker decodes to — it is up to `encrypt::parse_envelope` to
/// recognize that length's algorithm tag, not this function.
pub fn decode_armored_ciphertext(text: &str) -> Result<(String, Vec<u8>, Vec<u8>), InvalidFormat> {
    let mut lines = text.lines();

    let begin_line = lines.next().ok_or(InvalidFormat)?;
    if begin_line.trim_end() != BEGIN_MSG {
        return Err(InvalidFormat);
    }

    let ident_line = lines.next().ok_or(InvalidFormat)?;
    let ident = armor::parse_ident_line(ident_line)?;

    let mut header_b64 = String::new();
    let mut found_data = false;
    for line in lines.by_ref() {
        if line.trim_end() == BEGIN_DATA {
            found_data = true;
            break;
        }
        header_b64.push_str(line.trim_end());
    }
    if !found_data {
        return Err(InvalidFormat);
    }

    let mut data_b64 = String::new();
    let mut found_end = false;
    for line in lines {
        if line.trim_end() == END_MSG {
            found_end = true;
            break;
        }
        data_b64.push_str(line.trim_end());
    }
    if !found_end {
        return Err(InvalidFormat);
    }

    let header = STANDARD.decode(header_b64.as_bytes()).map_err(|_| InvalidFormat)?;
    let ciphertext = STANDARD.decode(data_b64.as_bytes()).map_err(|_| InvalidFormat)?;
    Ok((ident, header, ciphertext))
}

/// The fixed wire length of each envelope kind's header record, keyed by its
/// two-byte algorithm tag. Binary framing carries no length prefix for the
/// header (unlike the identifier), so the dispatcher must already know how
/// many bytes a tag's record occupies before it can cut the header away
/// from the identifier length field that follows it.
fn header_len_for_tag(tag: [u8; 2]) -> Option<usize> {
    match tag {
        records::SYMALG => Some(64),
        records::EPHEMERAL_ENCALG => Some(130),
        records::ENCALG => Some(58),
        records::LEGACY_EPHEMERAL_ENCALG => Some(82),
        _ => None,
    }
}

/// Encodes binary ciphertext framing: magic, header record, a 4-byte
/// big-endian identifier length, the identifier bytes, then raw ciphertext.
#[must_use]
pub fn encode_binary_ciphertext(header: &[u8], ident: &str, ciphertext: &[u8]) -> Vec<u8> {
    let identlen: u32 = ident.len().try_into().expect("ident length is bounded by IDENT_MAX_LEN");

    let mut out = Vec::with_capacity(BINARY_MAGIC.len() + header.len() + 4 + ident.len() + ciphertext.len());
    out.extend_from_slice(&BINARY_MAGIC);
    out.extend_from_slice(header);
    out.extend_from_slice(&identlen.to_be_bytes());
    out.extend_from_slice(ident.as_bytes());
    out.extend_from_slice(ciphertext);
    out
}

/// Decodes binary ciphertext framing, returning `(ident, header, ciphertext)`.
pub fn decode_binary_ciphertext(data: &[u8]) -> Result<(String, Vec<u8>, Vec<u8>), InvalidFormat> {
    let rest = data.strip_prefix(&BINARY_MAGIC).ok_or(InvalidFormat)?;

    let tag: [u8; 2] = rest.get(..2).ok_or(InvalidFormat)?.try_into().expect("checked length");
    let hdrlen = header_len_for_tag(tag).ok_or(InvalidFormat)?;
    if rest.len() < hdrlen {
        return Err(InvalidFormat);
    }
    let (header, rest) = rest.split_at(hdrlen);

    if rest.len() < 4 {
        return Err(InvalidFormat);
    }
    let (identlen_bytes, rest) = rest.split_at(4);
    let identlen = u32::from_be_bytes(identlen_bytes.try_into().expect("checked length")) as usize;
    if identlen > IDENT_MAX_LEN {
        return Err(InvalidFormat);
    }
    if rest.len() < identlen {
        return Err(InvalidFormat);
    }
    let (ident_bytes, ciphertext) = rest.split_at(identlen);
    let ident = String::from_utf8(ident_bytes.to_vec()).map_err(|_| InvalidFormat)?;

    Ok((ident, header.to_vec(), ciphertext.to_vec()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encrypt;
    use crate::keys;
    use crate::passphrase::PassphraseInput;

    #[test]
    fn armored_round_trip() {
        let (alice_pub, alice_sec) = keys::generate("alice");
        let (bea_pub, bea_sec) = keys::generate("bea");

        let mut buf = b"meet at the docks".to_vec();
        let envelope = encrypt::pub_encrypt(&bea_pub, &alice_sec, &mut buf);
        let header = envelope.to_wire();

        let text = encode_armored_ciphertext(&header, &envelope.ident, &buf);
        let (ident, decoded_header, mut ciphertext) = decode_armored_ciphertext(&text).unwrap();
        assert_eq!(ident, "alice");

        let parsed = encrypt::parse_envelope(&decoded_header, ident).unwrap();
        encrypt::decrypt_dispatch(
            parsed,
            &alice_pub,
            &bea_sec,
            PassphraseInput::Literal(b""),
            &mut ciphertext,
        )
        .unwrap();
        assert_eq!(ciphertext, b"meet at the docks");
    }

    #[test]
    fn binary_round_trip() {
        let (alice_pub, alice_sec) = keys::generate("alice");
        let (bea_pub, bea_sec) = keys::generate("bea");

        let mut buf = b"meet at the docks".to_vec();
        let envelope = encrypt::pub_encrypt(&bea_pub, &alice_sec, &mut buf);
        let header = envelope.to_wire();

        let framed = encode_binary_ciphertext(&header, &envelope.ident, &buf);
        assert_eq!(&framed[..4], &BINARY_MAGIC);

        let (ident, decoded_header, mut ciphertext) = decode_binary_ciphertext(&framed).unwrap();
        assert_eq!(ident, "alice");

        let parsed = encrypt::parse_envelope(&decoded_header, ident).unwrap();
        encrypt::decrypt_dispatch(
            parsed,
            &alice_pub,
            &bea_sec,
            PassphraseInput::Literal(b""),
            &mut ciphertext,
        )
        .unwrap();
        assert_eq!(ciphertext, b"meet at the docks");
    }

    #[test]
    fn binary_and_armored_framing_agree() {
        let mut buf = b"attack at dawn".to_vec();
        let envelope = encrypt::sym_encrypt(&mut buf, PassphraseInput::Literal(b"hunter2")).unwrap();
        let header = envelope.to_wire();

        let text = encode_armored_ciphertext(&header, encrypt::SYMMETRIC_IDENT, &buf);
        let binary = encode_binary_ciphertext(&header, encrypt::SYMMETRIC_IDENT, &buf);

        let (text_ident, text_header, mut text_ct) = decode_armored_ciphertext(&text).unwrap();
        let (bin_ident, bin_header, mut bin_ct) = decode_binary_ciphertext(&binary).unwrap();
        assert_eq!(text_ident, bin_ident);
        assert_eq!(text_header, bin_header);
        assert_eq!(text_ct, bin_ct);

        encrypt::sym_decrypt(&envelope, PassphraseInput::Literal(b"hunter2"), &mut text_ct).unwrap();
        encrypt::sym_decrypt(&envelope, PassphraseInput::Literal(b"hunter2"), &mut bin_ct).unwrap();
        assert_eq!(text_ct, b"attack at dawn");
        assert_eq!(bin_ct, b"attack at dawn");
    }

    #[test]
    fn armored_rejects_wrong_begin_marker() {
        let text = "-----BEGIN REOP SIGNED MESSAGE-----\nident:alice\nZm9v\n-----END REOP ENCRYPTED MESSAGE-----\n";
        assert_eq!(decode_armored_ciphertext(text), Err(InvalidFormat));
    }

    #[test]
    fn armored_rejects_missing_data_marker() {
        let text = "-----BEGIN REOP ENCRYPTED MESSAGE-----\nident:alice\nZm9v\n-----END REOP ENCRYPTED MESSAGE-----\n";
        assert_eq!(decode_armored_ciphertext(text), Err(InvalidFormat));
    }

    #[test]
    fn binary_rejects_bad_magic() {
        let mut framed = encode_binary_ciphertext(&[0u8; 64], "x", b"ct");
        framed[0] = b'X';
        assert_eq!(decode_binary_ciphertext(&framed), Err(InvalidFormat));
    }

    #[test]
    fn binary_rejects_unknown_tag() {
        let mut framed = Vec::from(BINARY_MAGIC);
        framed.extend_from_slice(b"XX");
        framed.extend_from_slice(&[0u8; 62]);
        assert_eq!(decode_binary_ciphertext(&framed), Err(InvalidFormat));
    }

    #[test]
    fn binary_rejects_truncated_header() {
        let mut framed = Vec::from(BINARY_MAGIC);
        framed.extend_from_slice(&records::SYMALG);
        framed.extend_from_slice(&[0u8; 10]);
        assert_eq!(decode_binary_ciphertext(&framed), Err(InvalidFormat));
    }

    #[test]
    fn binary_rejects_identlen_ge_64() {
        let (_, sec) = keys::generate("a".repeat(63).as_str());
        let mut buf = b"msg".to_vec();
        let envelope = encrypt::sym_encrypt(&mut buf, PassphraseInput::Literal(b"pw")).unwrap();
        let header = envelope.to_wire();

        let mut framed = Vec::from(BINARY_MAGIC);
        framed.extend_from_slice(&header);
        framed.extend_from_slice(&64u32.to_be_bytes());
        framed.extend_from_slice(&[b'a'; 64]);
        framed.extend_from_slice(&buf);

        assert_eq!(decode_binary_ciphertext(&framed), Err(InvalidFormat));
        let _ = sec;
    }
}
