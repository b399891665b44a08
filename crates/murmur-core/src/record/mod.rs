//! Record identity: content identifiers and record keys.
//!
//! Both reply chaining and the top-level post tool derive a record's URI from
//! a freshly generated TID and its CID from the record's DAG-CBOR encoding.

pub mod cid;
pub mod tid;

pub use self::cid::record_cid;
pub use self::tid::{Tid, TidClock};
