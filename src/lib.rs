//! A small, paranoid file encryption and signing toolkit.
//!
//! This crate implements the cryptographic core of `reop`: key generation,
//! detached and embedded signing, passphrase-based symmetric encryption,
//! and authenticated public-key encryption using a per-message ephemeral
//! sender key. It does not parse command lines, read files, or prompt a
//! terminal for a passphrase — those are the caller's job.
//!
//! ```
//! use reop::{encrypt, keys, passphrase::PassphraseInput, primitives, sign};
//!
//! primitives::init();
//!
//! // Alice and Bea each generate an identity.
//! let (alice_pub, alice_sec) = keys::generate("alice");
//! let (bea_pub, bea_sec) = keys::generate("bea");
//!
//! // Alice signs a message.
//! let msg = b"attack at dawn";
//! let sig = sign::sign(&alice_sec, msg);
//! assert!(sign::verify(&alice_pub, msg, &sig).is_ok());
//!
//! // Alice encrypts a message for Bea, authenticated as herself.
//! let mut buf = b"meet at the docks".to_vec();
//! let envelope = encrypt::pub_encrypt(&bea_pub, &alice_sec, &mut buf);
//! encrypt::pub_decrypt(&envelope, &alice_pub, &bea_sec, &mut buf).expect("decrypts");
//! assert_eq!(buf, b"meet at the docks");
//!
//! // Bea encrypts a message under a passphrase.
//! let mut buf = b"the password is hunter2".to_vec();
//! let envelope =
//!     encrypt::sym_encrypt(&mut buf, PassphraseInput::Literal(b"s3cr3t")).expect("encrypts");
//! encrypt::sym_decrypt(&envelope, PassphraseInput::Literal(b"s3cr3t"), &mut buf).expect("decrypts");
//! assert_eq!(buf, b"the password is hunter2");
//! ```

pub mod armor;
pub mod encrypt;
pub mod error;
pub mod framing;
pub mod keys;
pub mod passphrase;
pub mod primitives;
pub mod records;
pub mod sign;
