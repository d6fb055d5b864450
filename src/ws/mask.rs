//! Payload masking (RFC 6455 section 5.3).

/// XORs every byte of `payload` with `key[i % 4]` in place. Applying the same key twice restores
/// the original bytes.
#[inline]
pub fn apply(payload: &mut [u8], key: [u8; 4]) {
    let mut chunks = payload.chunks_exact_mut(4);
    for chunk in &mut chunks {
        chunk[0] ^= key[0];
        chunk[1] ^= key[1];
        chunk[2] ^= key[2];
        chunk[3] ^= key[3];
    }
    for (byte, k) in chunks.into_remainder().iter_mut().zip(key) {
        *byte ^= k;
    }
}

/// Returns masked copy of `payload`, leaving the input untouched.
#[inline]
pub fn applied(payload: &[u8], key: [u8; 4]) -> Vec<u8> {
    let mut out = payload.to_vec();
    apply(&mut out, key);
    out
}

/// Generates a fresh masking key.
pub fn generate_key() -> [u8; 4] {
    rand::random()
}
