use std::fmt::{Debug, Display, Formatter};

use consensus_core::BlockLevel;

/// Key prefixes separating the logical stores inside the single keyspace of the backend
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum StorePrefix {
    Relations = 1,
    Ghostdag = 2,
    Reachability = 3,
    ReachabilityRoot = 4,
    Headers = 5,
    HeadersCompact = 6,
    UtxoSet = 7,
}

impl StorePrefix {
    pub fn as_bytes(&self) -> &'static [u8] {
        match self {
            StorePrefix::Relations => &[StorePrefix::Relations as u8],
            StorePrefix::Ghostdag => &[StorePrefix::Ghostdag as u8],
            StorePrefix::Reachability => &[StorePrefix::Reachability as u8],
            StorePrefix::ReachabilityRoot => &[StorePrefix::ReachabilityRoot as u8],
            StorePrefix::Headers => &[StorePrefix::Headers as u8],
            StorePrefix::HeadersCompact => &[StorePrefix::HeadersCompact as u8],
            StorePrefix::UtxoSet => &[StorePrefix::UtxoSet as u8],
        }
    }

    /// Prefix of a per-level store
    pub fn with_level(&self, level: BlockLevel) -> Vec<u8> {
        vec![*self as u8, level]
    }

    fn from_byte(b: u8) -> Option<Self> {
        Some(match b {
            1 => StorePrefix::Relations,
            2 => StorePrefix::Ghostdag,
            3 => StorePrefix::Reachability,
            4 => StorePrefix::ReachabilityRoot,
            5 => StorePrefix::Headers,
            6 => StorePrefix::HeadersCompact,
            7 => StorePrefix::UtxoSet,
            _ => return None,
        })
    }
}

/// A full backend key: store prefix followed by the encoded store key
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DbKey {
    path: Vec<u8>,
    prefix_len: usize,
}

impl DbKey {
    pub fn new<K: AsRef<[u8]>>(prefix: &[u8], key: K) -> Self {
        let key = key.as_ref();
        let mut path = Vec::with_capacity(prefix.len() + key.len());
        path.extend_from_slice(prefix);
        path.extend_from_slice(key);
        Self { path, prefix_len: prefix.len() }
    }

    pub fn prefix(&self) -> &[u8] {
        &self.path[..self.prefix_len]
    }

    pub fn key(&self) -> &[u8] {
        &self.path[self.prefix_len..]
    }
}

impl AsRef<[u8]> for DbKey {
    fn as_ref(&self) -> &[u8] {
        &self.path
    }
}

impl Display for DbKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let prefix = self.prefix();
        match prefix.first().copied().and_then(StorePrefix::from_byte) {
            Some(store) => write!(f, "{:?}", store)?,
            None => write!(f, "{}", hex::encode(prefix))?,
        }
        for level in prefix.iter().skip(1) {
            write!(f, "[{}]", level)?;
        }
        write!(f, "/{}", hex::encode(self.key()))
    }
}

impl Debug for DbKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}
