//! Key layouts and value encoding shared by the LMDB stores.
//!
//! Identifiers inside composite keys are length-prefixed (`u16` big-endian)
//! so that one id can never be a byte prefix of another id's entries.
//! Record sequence numbers are big-endian so byte order equals id order.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::LmdbError;

pub(crate) const SEQ_LEN: usize = 8;

/// `len(id) as u16 BE ++ id`.
pub(crate) fn id_prefix(id: &[u8]) -> Result<Vec<u8>, LmdbError> {
    let mut key = Vec::with_capacity(2 + id.len() + SEQ_LEN);
    push_id(&mut key, id)?;
    Ok(key)
}

pub(crate) fn push_id(key: &mut Vec<u8>, id: &[u8]) -> Result<(), LmdbError> {
    let len = u16::try_from(id.len())
        .map_err(|_| LmdbError::Serialization(format!("identifier of {} bytes", id.len())))?;
    key.extend_from_slice(&len.to_be_bytes());
    key.extend_from_slice(id);
    Ok(())
}

/// `prefix ++ seq BE`.
pub(crate) fn with_seq(prefix: &[u8], seq: u64) -> Vec<u8> {
    let mut key = Vec::with_capacity(prefix.len() + SEQ_LEN);
    key.extend_from_slice(prefix);
    key.extend_from_slice(&seq.to_be_bytes());
    key
}

/// The record sequence number stored in the last eight bytes of an index key.
pub(crate) fn seq_suffix(key: &[u8]) -> Result<u64, LmdbError> {
    let start = key
        .len()
        .checked_sub(SEQ_LEN)
        .ok_or_else(|| LmdbError::Corruption(format!("index key of {} bytes", key.len())))?;
    let mut bytes = [0u8; SEQ_LEN];
    bytes.copy_from_slice(&key[start..]);
    Ok(u64::from_be_bytes(bytes))
}

/// Smallest byte string greater than every string starting with `prefix`.
///
/// Returns `false` when no such bound exists (empty or all `0xFF`).
pub(crate) fn increment_prefix(prefix: &mut Vec<u8>) -> bool {
    while let Some(last) = prefix.pop() {
        if last < u8::MAX {
            prefix.push(last + 1);
            return true;
        }
    }
    false
}

pub(crate) fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, LmdbError> {
    Ok(bincode::serialize(value)?)
}

pub(crate) fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, LmdbError> {
    Ok(bincode::deserialize(bytes)?)
}
