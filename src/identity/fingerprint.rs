//! Content fingerprints and temp keys for records that have no server id yet.

/// Prefix carried by every derived temp key, so they never look like server ids.
pub const TEMP_KEY_PREFIX: &str = "temp_";

/// Field separator used when deriving temp keys (SYMBOL FOR UNIT SEPARATOR).
const TEMP_KEY_SEPARATOR: char = '\u{241F}';

/// Deterministic, order-sensitive hash of `content`.
///
/// Polynomial hash with base 31 over the UTF-16 code units of the string,
/// wrapped to 32 bits and rendered as an unsigned decimal number.
pub fn fingerprint(content: &str) -> String {
    let hash = content
        .encode_utf16()
        .fold(0u32, |acc, unit| acc.wrapping_mul(31).wrapping_add(unit as u32));
    hash.to_string()
}

/// Derive the temp key of an optimistic record.
///
/// Two records that share content, creation timestamp, author and transaction
/// id derive the same key.
pub fn derive_temp_key(
    content: &str,
    created_at: &str,
    author_hash: &str,
    tx_id: Option<&str>,
) -> String {
    let joined = [content, created_at, author_hash, tx_id.unwrap_or_default()]
        .join(&TEMP_KEY_SEPARATOR.to_string());
    format!("{}{}", TEMP_KEY_PREFIX, fingerprint(&joined))
}
