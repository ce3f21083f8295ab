//! The passphrase-prompt contract.
//!
//! The core never reads an environment variable or touches a terminal
//! itself — that belongs to the CLI collaborator described in the core's
//! external-interfaces contract. What the core *does* own is deciding
//! *when* a passphrase is needed and whether the prompt should ask for
//! confirmation (only when a new passphrase is being set, never on
//! unwrap/decrypt).

use zeroize::Zeroizing;

use crate::error::PromptError;

/// A passphrase, supplied either directly by the caller or via a callback
/// invoked by the core at the point it's needed.
pub enum PassphraseInput<'a> {
    /// The caller already has the passphrase bytes. An empty slice is the
    /// "no password" sentinel (see [`crate::keys::wrap`]).
    Literal(&'a [u8]),

    /// The core should invoke this callback to obtain the passphrase. The
    /// `bool` argument is `true` when the prompt should ask for
    /// confirmation (entering the passphrase twice), which only applies
    /// when a new passphrase is being set.
    Prompt(&'a mut dyn FnMut(bool) -> Result<Zeroizing<Vec<u8>>, std::io::Error>),
}

impl<'a> PassphraseInput<'a> {
    /// Resolves to concrete passphrase bytes, invoking the callback (with
    /// the given `confirm` flag) if none was supplied directly.
    pub(crate) fn resolve(self, confirm: bool) -> Result<Zeroizing<Vec<u8>>, PromptError> {
        match self {
            PassphraseInput::Literal(bytes) => Ok(Zeroizing::new(bytes.to_vec())),
            PassphraseInput::Prompt(f) => f(confirm).map_err(PromptError),
        }
    }
}
