//! Credentials, timestamps, and the HMAC signing core with its REST and WebSocket shapes.

pub mod credentials;
pub mod hook;
pub mod secret;
pub mod signer;
pub mod timestamp;

pub use credentials::*;
pub use hook::*;
pub use secret::*;
pub use signer::*;
pub use timestamp::*;
