// Single-slot publication of the current token

use tokio::sync::watch;

use super::types::Token;

/// Holds the most recently acquired token
///
/// The cell itself is the write side and stays with its owner; readers get
/// a [`TokenReader`]. Readers never wait on the writer: `get` copies the
/// published value out under a short read lock. `set` only accepts a real
/// token, so once a value has been published the slot can never be observed
/// empty again.
pub struct TokenCell {
    slot: watch::Sender<Option<Token>>,
}

/// Read-only handle onto a [`TokenCell`]
#[derive(Clone)]
pub struct TokenReader {
    slot: watch::Receiver<Option<Token>>,
}

impl TokenCell {
    /// Create an empty cell
    pub fn new() -> Self {
        let (slot, _) = watch::channel(None);
        Self { slot }
    }

    /// Replace the published token
    pub fn set(&self, token: Token) {
        self.slot.send_replace(Some(token));
    }

    /// Most recently published token, or `None` before the first `set`
    pub fn get(&self) -> Option<Token> {
        self.slot.borrow().clone()
    }

    pub fn is_set(&self) -> bool {
        self.slot.borrow().is_some()
    }

    pub fn reader(&self) -> TokenReader {
        TokenReader {
            slot: self.slot.subscribe(),
        }
    }
}

impl Default for TokenCell {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenReader {
    /// Most recently published token, or `None` before the first publish
    pub fn get(&self) -> Option<Token> {
        self.slot.borrow().clone()
    }

    pub fn is_set(&self) -> bool {
        self.slot.borrow().is_some()
    }

    /// Wait until a token newer than the last one seen by this handle is
    /// published, returning it. `None` once the cell has been dropped.
    pub async fn next(&mut self) -> Option<Token> {
        self.slot.changed().await.ok()?;
        self.slot.borrow_and_update().clone()
    }
}
