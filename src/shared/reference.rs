//! Human-referenceable order numbers

use chrono::Utc;
use rand::Rng;

// No 0/O, 1/I/L pairs; these numbers get read over the phone.
const REFERENCE_CHARSET: &[u8] = b"ABCDEFGHJKMNPQRSTUVWXYZ23456789";

/// Generate a reference like `BK-20250315-7GKQ2M`: prefix, UTC date,
/// six random characters.
///
/// Uniqueness is enforced where the number is stored, not here; a
/// collision surfaces as a storage error on insert.
pub fn generate_reference(prefix: &str) -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..6)
        .map(|_| {
            let idx = rng.gen_range(0..REFERENCE_CHARSET.len());
            REFERENCE_CHARSET[idx] as char
        })
        .collect();
    format!("{}-{}-{}", prefix, Utc::now().format("%Y%m%d"), suffix)
}

// ── Tests ──────────────────────────────────────────────────────
