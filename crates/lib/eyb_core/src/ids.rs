//! Identifier helpers.
//!
//! Opaque credentials (session ids, authorization codes) are random UUIDv4
//! strings: 122 bits from the OS RNG, nothing derivable from time.
//! Application rows use UUIDv7 so `ORDER BY id` follows submission order.

use uuid::Uuid;

/// Generate an unguessable opaque identifier (hyphenated UUIDv4, 36 chars).
pub fn opaque_id() -> String {
    Uuid::new_v4().to_string()
}

/// Generate a timestamp-sortable record id (UUIDv7).
pub fn record_id() -> Uuid {
    Uuid::now_v7()
}
