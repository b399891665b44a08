//! Content identifiers for records.
//!
//! A record's CID is CIDv1 with the dag-cbor codec over a sha2-256 multihash
//! of the record's canonical DAG-CBOR encoding, the same scheme a PDS uses
//! when it stores the record.

use cid::Cid;
use cid::multihash::Multihash;
use murmur_types::error::DecodeError;
use serde::Serialize;
use sha2::{Digest, Sha256};

/// Multicodec code for dag-cbor.
pub const DAG_CBOR: u64 = 0x71;

/// Multihash code for sha2-256.
pub const SHA2_256: u64 = 0x12;

/// Encode a record as canonical DAG-CBOR.
pub fn encode_record<T: Serialize>(record: &T) -> Result<Vec<u8>, DecodeError> {
    serde_ipld_dagcbor::to_vec(record).map_err(|e| DecodeError::Encode(e.to_string()))
}

/// CID of already-encoded DAG-CBOR bytes.
pub fn cid_for_bytes(bytes: &[u8]) -> Result<Cid, DecodeError> {
    let digest = Sha256::digest(bytes);
    let hash = Multihash::<64>::wrap(SHA2_256, &digest)
        .map_err(|e| DecodeError::Encode(format!("multihash: {e}")))?;
    Ok(Cid::new_v1(DAG_CBOR, hash))
}

/// CID a record will have once written.
pub fn record_cid<T: Serialize>(record: &T) -> Result<Cid, DecodeError> {
    cid_for_bytes(&encode_record(record)?)
}
