//! Request correlation ids and idempotency keys.

use uuid::Uuid;

/// Generate a random version-4 UUID in upper-case hyphenated form,
/// e.g. `3F2504E0-4F89-41D3-9A0C-0305E82C3301`.
///
/// Randomness comes from the operating system's CSPRNG via `uuid`'s `v4`
/// feature. A failing random source panics inside `uuid`; it is not
/// recovered here.
pub fn generate_id() -> String {
    let mut buf = Uuid::encode_buffer();
    Uuid::new_v4().hyphenated().encode_upper(&mut buf).to_owned()
}
