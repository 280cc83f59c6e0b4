//! Public extension contracts (request signing hooks).
//!
//! Sessions depend only on these traits, so callers can swap in their own signing scheme
//! without touching the transport code.

pub mod request_signer;

pub use request_signer::*;
