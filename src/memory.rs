use std::collections::BTreeMap;

use crate::address::Address;

pub const WORD_SIZE: usize = 32;

pub type Word = [u8; WORD_SIZE];

pub const ZERO_WORD: Word = [0; WORD_SIZE];

/// Flat storage of fixed-size words keyed by 32-byte addresses.
///
/// Unset addresses read as the zero word. Presence is never asked of the
/// store; the layers above infer it from the words they wrote.
pub trait WordStore {
    fn get_word(&self, address: &Address) -> Word;

    fn set_word(&mut self, address: &Address, word: Word);
}

impl<S: WordStore + ?Sized> WordStore for &mut S {
    fn get_word(&self, address: &Address) -> Word {
        (**self).get_word(address)
    }

    fn set_word(&mut self, address: &Address, word: Word) {
        (**self).set_word(address, word)
    }
}

impl<S: WordStore + ?Sized> WordStore for Box<S> {
    fn get_word(&self, address: &Address) -> Word {
        (**self).get_word(address)
    }

    fn set_word(&mut self, address: &Address, word: Word) {
        (**self).set_word(address, word)
    }
}

/// In-process word store. Writing the zero word drops the entry, so `len`
/// counts exactly the non-zero words.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    words: BTreeMap<Address, Word>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

impl WordStore for MemoryStore {
    fn get_word(&self, address: &Address) -> Word {
        self.words.get(address).copied().unwrap_or(ZERO_WORD)
    }

    fn set_word(&mut self, address: &Address, word: Word) {
        tracing::trace!("set_word {address}");
        if word == ZERO_WORD {
            self.words.remove(address);
        } else {
            self.words.insert(address.clone(), word);
        }
    }
}
