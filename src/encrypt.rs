//! Symmetric and public-key encryption of a message buffer in place.
//!
//! Every operation here seals or opens `msg` in place and returns/consumes a
//! small fixed-size envelope alongside it; the envelope is what `framing.rs`
//! serializes around the ciphertext.

use zeroize::Zeroizing;

use crate::error::{DecryptDispatchError, ParseEnvelopeError, PubDecryptError, SymDecryptError};
use crate::passphrase::PassphraseInput;
use crate::primitives;
use crate::records::{
    self, LegacyCsEnvelope, LegacyEsEnvelope, ParsePublicKeyWireError, ParseSecretKeyWireError, PublicKey,
    PublicKeyEnvelope, SecretKey, SymmetricEnvelope,
};

/// The identifier substituted for a symmetric envelope's (nonexistent)
/// `ident` field when one is needed — e.g. in binary framing, which always
/// carries an identifier alongside the ciphertext.
pub const SYMMETRIC_IDENT: &str = "<symmetric>";

const SYMKEY_LEN: usize = 32;

/// Encrypts `msg` in place under a passphrase. Unlike [`crate::keys::wrap`],
/// the round count is always `42`: whether an empty literal passphrase
/// means "no password" isn't this operation's concern the way it is for a
/// key file, so there's no zero-rounds sentinel here.
pub fn sym_encrypt(
    msg: &mut [u8],
    passphrase: PassphraseInput,
) -> Result<SymmetricEnvelope, crate::error::PromptError> {
    let rounds = 42;
    let password = passphrase.resolve(true)?;

    let mut salt = [0u8; 16];
    primitives::random(&mut salt);

    let mut key = Zeroizing::new([0u8; SYMKEY_LEN]);
    primitives::kdf(&salt, rounds, &password, &mut *key);

    let (nonce, tag) = primitives::secretbox_seal(&key, msg);

    Ok(SymmetricEnvelope { kdfrounds: rounds, salt, nonce, tag })
}

/// Decrypts `msg` in place under a passphrase, using the envelope's own
/// salt and round count.
pub fn sym_decrypt(
    envelope: &SymmetricEnvelope,
    passphrase: PassphraseInput,
    msg: &mut [u8],
) -> Result<(), SymDecryptError> {
    let password = passphrase.resolve(false)?;

    let mut key = Zeroizing::new([0u8; SYMKEY_LEN]);
    primitives::kdf(&envelope.salt, envelope.kdfrounds, &password, &mut *key);

    if primitives::secretbox_open(&key, msg, &envelope.nonce, &envelope.tag) {
        Ok(())
    } else {
        Err(SymDecryptError::Fail)
    }
}

/// Encrypts `msg` in place for `recipient`, authenticated as `sender`. A
/// fresh ephemeral key pair is drawn per message: the plaintext is sealed
/// under `box(recipient, ephemeral)`, and the ephemeral public key is in
/// turn sealed under `box(recipient, sender)` so only the recipient ever
/// learns it.
#[must_use]
pub fn pub_encrypt(recipient: &PublicKey, sender: &SecretKey, msg: &mut [u8]) -> PublicKeyEnvelope {
    let (eph_pub, eph_sec) = primitives::box_keypair();
    let mut eph_sec = Zeroizing::new(eph_sec);

    let (nonce, tag) = primitives::box_seal(&recipient.enckey, &eph_sec, msg);

    let mut eph_pub_buf = eph_pub;
    let (ephnonce, ephtag) = primitives::box_seal(&recipient.enckey, &sender.enckey, &mut eph_pub_buf);

    eph_sec.fill(0);

    PublicKeyEnvelope {
        secrandomid: sender.randomid,
        pubrandomid: recipient.randomid,
        ephpubkey: eph_pub_buf,
        ephnonce,
        ephtag,
        nonce,
        tag,
        ident: sender.ident.clone(),
    }
}

/// Decrypts `msg` in place, recovering and authenticating the per-message
/// ephemeral key before using it to open the plaintext.
pub fn pub_decrypt(
    envelope: &PublicKeyEnvelope,
    sender: &PublicKey,
    recipient: &SecretKey,
    msg: &mut [u8],
) -> Result<(), PubDecryptError> {
    if !primitives::ct_eq(&envelope.pubrandomid, &recipient.randomid)
        || !primitives::ct_eq(&envelope.secrandomid, &sender.randomid)
    {
        return Err(PubDecryptError::Mismatch);
    }

    let mut eph_pub = Zeroizing::new(envelope.ephpubkey);
    if !primitives::box_open(&sender.enckey, &recipient.enckey, &mut *eph_pub, &envelope.ephnonce, &envelope.ephtag) {
        return Err(PubDecryptError::AuthFail);
    }

    if primitives::box_open(&eph_pub, &recipient.enckey, msg, &envelope.nonce, &envelope.tag) {
        Ok(())
    } else {
        Err(PubDecryptError::AuthFail)
    }
}

/// Decrypts a legacy `CS` envelope: `box(recipient, sender)` directly over
/// the plaintext, no ephemeral key involved. Decrypt-only — nothing in this
/// core ever produces one. The two random identifiers are accepted in
/// either orientation, matching ambiguity present in envelopes this old.
pub fn legacy_cs_decrypt(
    envelope: &LegacyCsEnvelope,
    sender: &PublicKey,
    recipient: &SecretKey,
    msg: &mut [u8],
) -> Result<(), PubDecryptError> {
    let forward = primitives::ct_eq(&envelope.pubrandomid, &recipient.randomid)
        && primitives::ct_eq(&envelope.secrandomid, &sender.randomid);
    let reversed = primitives::ct_eq(&envelope.secrandomid, &recipient.randomid)
        && primitives::ct_eq(&envelope.pubrandomid, &sender.randomid);
    if !forward && !reversed {
        return Err(PubDecryptError::Mismatch);
    }

    if primitives::box_open(&sender.enckey, &recipient.enckey, msg, &envelope.nonce, &envelope.tag) {
        Ok(())
    } else {
        Err(PubDecryptError::AuthFail)
    }
}

/// Decrypts a legacy `eS` envelope: an ephemeral public key travels in the
/// clear, unauthenticated by a sender identity. Decrypt-only.
pub fn legacy_es_decrypt(
    envelope: &LegacyEsEnvelope,
    recipient: &SecretKey,
    msg: &mut [u8],
) -> Result<(), PubDecryptError> {
    if !primitives::ct_eq(&envelope.pubrandomid, &recipient.randomid) {
        return Err(PubDecryptError::Mismatch);
    }

    if primitives::box_open(&envelope.pubkey, &recipient.enckey, msg, &envelope.nonce, &envelope.tag) {
        Ok(())
    } else {
        Err(PubDecryptError::AuthFail)
    }
}

/// Which kind of envelope a header's algorithm tag identifies, carrying the
/// parsed record itself.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Envelope {
    Symmetric(SymmetricEnvelope),
    PublicKey(PublicKeyEnvelope),
    LegacyCs(LegacyCsEnvelope),
    LegacyEs(LegacyEsEnvelope),
}

/// Inspects a header's first two bytes (the algorithm tag) and parses the
/// fixed-size record of the matching kind. This is the `ParsedHeader →
/// AlgDispatched` transition: an unrecognized tag is a terminal
/// [`ParseEnvelopeError::InvalidFormat`], and a recognized tag whose own
/// record fields don't validate (wrong sub-algorithm, wrong length) surfaces
/// [`ParseEnvelopeError::UnsupportedKey`]/[`ParseEnvelopeError::UnsupportedKdf`]
/// distinctly rather than collapsing to one catch-all.
pub fn parse_envelope(header: &[u8], ident: String) -> Result<Envelope, ParseEnvelopeError> {
    let tag = header.get(..2).ok_or(ParseEnvelopeError::InvalidFormat)?;

    if tag == records::SYMALG {
        return SymmetricEnvelope::from_wire(header).map(Envelope::Symmetric).map_err(|e| match e {
            ParseSecretKeyWireError::InvalidFormat => ParseEnvelopeError::InvalidFormat,
            ParseSecretKeyWireError::UnsupportedKey => ParseEnvelopeError::UnsupportedKey,
            ParseSecretKeyWireError::UnsupportedKdf => ParseEnvelopeError::UnsupportedKdf,
        });
    }
    if tag == records::EPHEMERAL_ENCALG {
        return PublicKeyEnvelope::from_wire(header, ident).map(Envelope::PublicKey).map_err(from_pubkey_wire_error);
    }
    if tag == records::ENCALG {
        return LegacyCsEnvelope::from_wire(header).map(Envelope::LegacyCs).map_err(from_pubkey_wire_error);
    }
    if tag == records::LEGACY_EPHEMERAL_ENCALG {
        return LegacyEsEnvelope::from_wire(header).map(Envelope::LegacyEs).map_err(from_pubkey_wire_error);
    }

    Err(ParseEnvelopeError::InvalidFormat)
}

fn from_pubkey_wire_error(e: ParsePublicKeyWireError) -> ParseEnvelopeError {
    match e {
        ParsePublicKeyWireError::InvalidFormat => ParseEnvelopeError::InvalidFormat,
        ParsePublicKeyWireError::UnsupportedKey => ParseEnvelopeError::UnsupportedKey,
    }
}

/// Routes an already-dispatched envelope to its decrypt operation. Whichever
/// of `passphrase`/`sender`/`recipient` the envelope kind doesn't need is
/// simply not touched — `passphrase` is never resolved on a public-key path,
/// for instance, so a caller with no passphrase on hand can pass a literal
/// empty one unconditionally.
pub fn decrypt_dispatch(
    envelope: Envelope,
    sender: &PublicKey,
    recipient: &SecretKey,
    passphrase: PassphraseInput,
    msg: &mut [u8],
) -> Result<(), DecryptDispatchError> {
    match envelope {
        Envelope::Symmetric(e) => sym_decrypt(&e, passphrase, msg).map_err(DecryptDispatchError::from),
        Envelope::PublicKey(e) => pub_decrypt(&e, sender, recipient, msg).map_err(DecryptDispatchError::from),
        Envelope::LegacyCs(e) => legacy_cs_decrypt(&e, sender, recipient, msg).map_err(DecryptDispatchError::from),
        Envelope::LegacyEs(e) => legacy_es_decrypt(&e, recipient, msg).map_err(DecryptDispatchError::from),
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use rand::{RngCore, SeedableRng};
    use rand_chacha::ChaCha20Rng;

    use super::*;
    use crate::keys;

    #[test]
    fn sym_round_trip() {
        let mut buf = b"attack at dawn".to_vec();
        let envelope = sym_encrypt(&mut buf, PassphraseInput::Literal(b"hunter2")).unwrap();
        assert_eq!(envelope.kdfrounds, 42);
        sym_decrypt(&envelope, PassphraseInput::Literal(b"hunter2"), &mut buf).unwrap();
        assert_eq!(buf, b"attack at dawn");
    }

    #[test]
    fn sym_empty_passphrase_still_uses_fixed_rounds() {
        let mut buf = b"hello".to_vec();
        let envelope = sym_encrypt(&mut buf, PassphraseInput::Literal(b"")).unwrap();
        assert_eq!(envelope.kdfrounds, 42);
    }

    #[test]
    fn sym_wrong_passphrase_fails() {
        let mut buf = b"attack at dawn".to_vec();
        let envelope = sym_encrypt(&mut buf, PassphraseInput::Literal(b"hunter2")).unwrap();
        assert_matches!(sym_decrypt(&envelope, PassphraseInput::Literal(b"wrong"), &mut buf), Err(SymDecryptError::Fail));
    }

    #[test]
    fn sym_tampered_tag_fails() {
        let mut buf = b"attack at dawn".to_vec();
        let mut envelope = sym_encrypt(&mut buf, PassphraseInput::Literal(b"hunter2")).unwrap();
        envelope.tag[0] ^= 1;
        assert_matches!(sym_decrypt(&envelope, PassphraseInput::Literal(b"hunter2"), &mut buf), Err(SymDecryptError::Fail));
    }

    #[test]
    fn pub_round_trip() {
        let (alice_pub, alice_sec) = keys::generate("alice");
        let (bea_pub, bea_sec) = keys::generate("bea");

        let mut buf = b"meet at the docks".to_vec();
        let envelope = pub_encrypt(&bea_pub, &alice_sec, &mut buf);
        pub_decrypt(&envelope, &alice_pub, &bea_sec, &mut buf).unwrap();
        assert_eq!(buf, b"meet at the docks");
    }

    #[test]
    fn pub_wrong_recipient_is_mismatch() {
        let (_, alice_sec) = keys::generate("alice");
        let (bea_pub, _) = keys::generate("bea");
        let (_, carol_sec) = keys::generate("carol");

        let mut buf = b"meet at the docks".to_vec();
        let envelope = pub_encrypt(&bea_pub, &alice_sec, &mut buf);

        let (alice_pub, _) = keys::generate("alice-pub-only");
        assert_matches!(pub_decrypt(&envelope, &alice_pub, &carol_sec, &mut buf), Err(PubDecryptError::Mismatch));
    }

    #[test]
    fn pub_wrong_sender_is_mismatch() {
        let (alice_pub, alice_sec) = keys::generate("alice");
        let (bea_pub, bea_sec) = keys::generate("bea");
        let (mallory_pub, _) = keys::generate("mallory");

        let mut buf = b"meet at the docks".to_vec();
        let envelope = pub_encrypt(&bea_pub, &alice_sec, &mut buf);

        assert_matches!(pub_decrypt(&envelope, &mallory_pub, &bea_sec, &mut buf), Err(PubDecryptError::Mismatch));
        let _ = alice_pub;
    }

    #[test]
    fn pub_tampered_plaintext_tag_is_authfail() {
        let (alice_pub, alice_sec) = keys::generate("alice");
        let (bea_pub, bea_sec) = keys::generate("bea");

        let mut buf = b"meet at the docks".to_vec();
        let mut envelope = pub_encrypt(&bea_pub, &alice_sec, &mut buf);
        envelope.tag[0] ^= 1;

        assert_matches!(pub_decrypt(&envelope, &alice_pub, &bea_sec, &mut buf), Err(PubDecryptError::AuthFail));
    }

    #[test]
    fn pub_tampered_ephemeral_tag_is_authfail() {
        let (alice_pub, alice_sec) = keys::generate("alice");
        let (bea_pub, bea_sec) = keys::generate("bea");

        let mut buf = b"meet at the docks".to_vec();
        let mut envelope = pub_encrypt(&bea_pub, &alice_sec, &mut buf);
        envelope.ephtag[0] ^= 1;

        assert_matches!(pub_decrypt(&envelope, &alice_pub, &bea_sec, &mut buf), Err(PubDecryptError::AuthFail));
    }

    #[test]
    fn legacy_cs_round_trip_both_orientations() {
        let (alice_pub, alice_sec) = keys::generate("alice");
        let (bea_pub, bea_sec) = keys::generate("bea");

        let mut buf = b"old school".to_vec();
        let (nonce, tag) = primitives::box_seal(&bea_pub.enckey, &alice_sec.enckey, &mut buf);
        let envelope = LegacyCsEnvelope {
            secrandomid: alice_sec.randomid,
            pubrandomid: bea_sec.randomid,
            nonce,
            tag,
        };
        legacy_cs_decrypt(&envelope, &alice_pub, &bea_sec, &mut buf).unwrap();
        assert_eq!(buf, b"old school");

        let mut buf2 = b"old school".to_vec();
        let (nonce2, tag2) = primitives::box_seal(&bea_pub.enckey, &alice_sec.enckey, &mut buf2);
        let reversed = LegacyCsEnvelope {
            secrandomid: bea_sec.randomid,
            pubrandomid: alice_sec.randomid,
            nonce: nonce2,
            tag: tag2,
        };
        legacy_cs_decrypt(&reversed, &alice_pub, &bea_sec, &mut buf2).unwrap();
        assert_eq!(buf2, b"old school");
    }

    #[test]
    fn legacy_cs_unrelated_ids_is_mismatch() {
        let (alice_pub, alice_sec) = keys::generate("alice");
        let (bea_pub, bea_sec) = keys::generate("bea");
        let (_, mallory_sec) = keys::generate("mallory");

        let mut buf = b"old school".to_vec();
        let (nonce, tag) = primitives::box_seal(&bea_pub.enckey, &alice_sec.enckey, &mut buf);
        let envelope =
            LegacyCsEnvelope { secrandomid: mallory_sec.randomid, pubrandomid: mallory_sec.randomid, nonce, tag };
        assert_matches!(legacy_cs_decrypt(&envelope, &alice_pub, &bea_sec, &mut buf), Err(PubDecryptError::Mismatch));
    }

    #[test]
    fn legacy_es_round_trip() {
        let (bea_pub, bea_sec) = keys::generate("bea");
        let (eph_pub, eph_sec) = primitives::box_keypair();

        let mut buf = b"ephemeral in the clear".to_vec();
        let (nonce, tag) = primitives::box_seal(&bea_pub.enckey, &eph_sec, &mut buf);
        let envelope = LegacyEsEnvelope { pubrandomid: bea_sec.randomid, pubkey: eph_pub, nonce, tag };

        legacy_es_decrypt(&envelope, &bea_sec, &mut buf).unwrap();
        assert_eq!(buf, b"ephemeral in the clear");
    }

    #[test]
    fn legacy_es_wrong_recipient_is_mismatch() {
        let (bea_pub, bea_sec) = keys::generate("bea");
        let (_, carol_sec) = keys::generate("carol");
        let (eph_pub, eph_sec) = primitives::box_keypair();

        let mut buf = b"ephemeral in the clear".to_vec();
        let (nonce, tag) = primitives::box_seal(&bea_pub.enckey, &eph_sec, &mut buf);
        let envelope = LegacyEsEnvelope { pubrandomid: bea_sec.randomid, pubkey: eph_pub, nonce, tag };

        assert_matches!(legacy_es_decrypt(&envelope, &carol_sec, &mut buf), Err(PubDecryptError::Mismatch));
    }

    #[test]
    fn parse_envelope_dispatches_by_tag() {
        let (alice_pub, alice_sec) = keys::generate("alice");
        let (bea_pub, _bea_sec) = keys::generate("bea");

        let mut buf = b"hi".to_vec();
        let envelope = pub_encrypt(&bea_pub, &alice_sec, &mut buf);
        let header = envelope.to_wire();

        let parsed = parse_envelope(&header, "alice".to_string()).unwrap();
        assert_eq!(parsed, Envelope::PublicKey(envelope));
        let _ = alice_pub;
    }

    #[test]
    fn parse_envelope_rejects_unknown_tag() {
        let header = [b'X', b'X', 0, 0];
        assert_eq!(parse_envelope(&header, "alice".to_string()), Err(ParseEnvelopeError::InvalidFormat));
    }

    #[test]
    fn parse_envelope_surfaces_unsupported_kdf() {
        let mut header = SymmetricEnvelope { kdfrounds: 42, salt: [1; 16], nonce: [2; 24], tag: [3; 16] }.to_wire();
        header[2] = b'X';
        assert_eq!(parse_envelope(&header, "alice".to_string()), Err(ParseEnvelopeError::UnsupportedKdf));
    }

    #[test]
    fn parse_envelope_rejects_trailing_bytes() {
        let (alice_pub, alice_sec) = keys::generate("alice");
        let (bea_pub, _bea_sec) = keys::generate("bea");

        let mut buf = b"hi".to_vec();
        let envelope = pub_encrypt(&bea_pub, &alice_sec, &mut buf);
        let mut header = envelope.to_wire();
        header.push(0);

        assert_eq!(parse_envelope(&header, "alice".to_string()), Err(ParseEnvelopeError::InvalidFormat));
        let _ = alice_pub;
    }

    #[test]
    fn pub_round_trip_over_seeded_message_lengths() {
        let (alice_pub, alice_sec) = keys::generate("alice");
        let (bea_pub, bea_sec) = keys::generate("bea");

        let mut rng = ChaCha20Rng::seed_from_u64(0xC0FFEE);
        for len in [0usize, 1, 31, 256, 4096] {
            let mut msg = vec![0u8; len];
            rng.fill_bytes(&mut msg);

            let mut buf = msg.clone();
            let envelope = pub_encrypt(&bea_pub, &alice_sec, &mut buf);
            pub_decrypt(&envelope, &alice_pub, &bea_sec, &mut buf).unwrap();
            assert_eq!(buf, msg);
        }
    }

    #[test]
    fn decrypt_dispatch_routes_symmetric_and_public() {
        let (alice_pub, alice_sec) = keys::generate("alice");
        let (bea_pub, bea_sec) = keys::generate("bea");

        let mut buf = b"meet at the docks".to_vec();
        let envelope = pub_encrypt(&bea_pub, &alice_sec, &mut buf);
        decrypt_dispatch(
            Envelope::PublicKey(envelope),
            &alice_pub,
            &bea_sec,
            PassphraseInput::Literal(b""),
            &mut buf,
        )
        .unwrap();
        assert_eq!(buf, b"meet at the docks");

        let mut buf = b"attack at dawn".to_vec();
        let sym_envelope = sym_encrypt(&mut buf, PassphraseInput::Literal(b"hunter2")).unwrap();
        decrypt_dispatch(
            Envelope::Symmetric(sym_envelope),
            &alice_pub,
            &bea_sec,
            PassphraseInput::Literal(b"hunter2"),
            &mut buf,
        )
        .unwrap();
        assert_eq!(buf, b"attack at dawn");
    }
}
