//! The state a program's containers live in, and the segmented codec that
//! stores arbitrary-length payloads in fixed-size words.
//!
//! A payload written at `address` takes one length word at
//! `sha256(address || "length")` and one data word per 32-byte chunk at
//! `sha256(address || "{i}_index")`. The length word is all zero when the slot
//! is absent; otherwise byte 0 is [`PRESENT`] and bytes 24..32 hold the
//! payload length as a big-endian u64, all other bytes zero. An empty payload
//! is therefore present, distinct from a slot never written. A length word of
//! any other shape reads as absent.

use crate::{
    address::Address,
    memory::{Word, WordStore, WORD_SIZE, ZERO_WORD},
};

pub const PRESENT: u8 = 0x01;

/// Largest payload `write` accepts.
pub const MAX_PAYLOAD: usize = u32::MAX as usize;

const LENGTH_SUFFIX: &str = "length";
const INDEX_SUFFIX: &str = "index";

#[derive(Debug, Clone)]
pub struct Config {
    /// Initial capacity of an iterable map's key slice.
    pub key_capacity: usize,
    /// Erase the slots of a slice's old backing array after it grows,
    /// instead of abandoning them.
    pub erase_abandoned: bool,
    /// Zero the data words of a deleted payload, not only its length word.
    pub erase_chunks: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            key_capacity: 10,
            erase_abandoned: false,
            erase_chunks: false,
        }
    }
}

#[derive(Debug, Default)]
pub struct State<S> {
    store: S,
    config: Config,
}

impl<S: WordStore> State<S> {
    pub fn new(store: S) -> Self {
        Self::with_config(store, Default::default())
    }

    pub fn with_config(store: S, config: Config) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    fn length_address(address: &Address) -> Address {
        address.suffixed(LENGTH_SUFFIX)
    }

    fn chunk_address(address: &Address, index: usize) -> Address {
        address.suffixed(&format!("{index}_{INDEX_SUFFIX}"))
    }

    fn stored_len(&self, address: &Address) -> Option<usize> {
        let word = self.store.get_word(&Self::length_address(address));
        if word == ZERO_WORD {
            return None;
        }
        let mut len = [0; 8];
        len.copy_from_slice(&word[WORD_SIZE - 8..]);
        let len = u64::from_be_bytes(len);
        let well_formed = word[0] == PRESENT
            && word[1..WORD_SIZE - 8].iter().all(|&byte| byte == 0)
            && len <= MAX_PAYLOAD as u64;
        if !well_formed {
            tracing::warn!("malformed length word at {address}");
            return None;
        }
        Some(len as usize)
    }

    pub fn exists(&self, address: &Address) -> bool {
        self.stored_len(address).is_some()
    }

    pub fn write(&mut self, address: &Address, data: &[u8]) -> anyhow::Result<()> {
        anyhow::ensure!(
            data.len() <= MAX_PAYLOAD,
            "payload of {} bytes exceeds {MAX_PAYLOAD}",
            data.len()
        );
        tracing::trace!("write {} bytes at {address}", data.len());
        for (index, chunk) in data.chunks(WORD_SIZE).enumerate() {
            let mut word = ZERO_WORD;
            word[..chunk.len()].copy_from_slice(chunk);
            self.store
                .set_word(&Self::chunk_address(address, index), word)
        }
        let mut length: Word = ZERO_WORD;
        length[0] = PRESENT;
        length[WORD_SIZE - 8..].copy_from_slice(&(data.len() as u64).to_be_bytes());
        self.store.set_word(&Self::length_address(address), length);
        Ok(())
    }

    /// Stored payload, empty when absent.
    pub fn read(&self, address: &Address) -> Vec<u8> {
        let Some(len) = self.stored_len(address) else {
            return Vec::new();
        };
        let mut data = Vec::new();
        for index in 0..len.div_ceil(WORD_SIZE) {
            let word = self.store.get_word(&Self::chunk_address(address, index));
            let end = (len - data.len()).min(WORD_SIZE);
            data.extend_from_slice(&word[..end])
        }
        data
    }

    pub fn delete(&mut self, address: &Address) {
        let length = Self::length_address(address);
        let Some(len) = self.stored_len(address) else {
            if self.store.get_word(&length) != ZERO_WORD {
                self.store.set_word(&length, ZERO_WORD)
            }
            return;
        };
        tracing::trace!("delete {len} bytes at {address}");
        if self.config.erase_chunks {
            for index in 0..len.div_ceil(WORD_SIZE) {
                self.store
                    .set_word(&Self::chunk_address(address, index), ZERO_WORD)
            }
        }
        self.store.set_word(&length, ZERO_WORD)
    }
}
