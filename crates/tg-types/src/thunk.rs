use crate::hash::ContentHash;

/// A decoded unit of deferred computation.
///
/// `data` is the serialized thunk description exactly as the caller sent it
/// (after transfer decoding); the gateway never interprets it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Thunk {
    pub hash: ContentHash,
    pub data: Vec<u8>,
    /// Requested output tags, in request order. An empty tag names the
    /// thunk's default output.
    pub outputs: Vec<String>,
}

impl Thunk {
    pub fn new(hash: ContentHash, data: Vec<u8>, outputs: Vec<String>) -> Self {
        Self { hash, data, outputs }
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }
}
