//! Stable exit codes. The installer treats anything non-zero as a warning.

/// Every entry processed; foreign conflicts count as success.
pub const OK: u8 = 0;
/// At least one entry failed to write or delete.
pub const ENTRY_FAILURES: u8 = 1;
/// Nothing was attempted: configuration or wrapper directory unusable.
pub const FATAL: u8 = 2;
