//! Keyed-hash request signing for the judge API.
//!
//! The judge authenticates callers with a double-hash scheme rather than a
//! bearer token:
//!
//! ```text
//! hs      = hex(sha256(secret))
//! message = secret + "-" + canonical_params
//! api_sig = hex(sha256(hs + hex(sha256(hs + message))))
//! ```
//!
//! `canonical_params` is the concatenation of every request parameter as
//! `key=value`, in a fixed alphabetical key order. The caller is responsible
//! for passing the parameters already ordered; [`sign_request`] concatenates
//! them verbatim.

use sha2::{Digest, Sha256};

/// Compute the `api_sig` value for one judge request.
///
/// `params` must be the full parameter list in canonical (alphabetical key)
/// order, excluding `api_sig` itself.
pub fn sign_request(secret: &str, params: &[(&str, &str)]) -> String {
    let canonical: String = params
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect();
    let message = format!("{secret}-{canonical}");

    let hashed_secret = sha256_hex(secret);
    let inner = sha256_hex(&format!("{hashed_secret}{message}"));
    sha256_hex(&format!("{hashed_secret}{inner}"))
}

fn sha256_hex(input: &str) -> String {
    hex::encode(Sha256::digest(input.as_bytes()))
}
