//! Social network read/write port.

pub mod client;

pub use client::{RecordCreate, SocialClient};
