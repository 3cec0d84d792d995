//! Record identity: content fingerprints, temp keys and client-minted ids.

mod client;
mod fingerprint;

pub use client::{ClientIdentity, CLIENT_ID_KEY};
pub use fingerprint::{derive_temp_key, fingerprint, TEMP_KEY_PREFIX};
