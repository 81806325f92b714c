//! Hardening limits for decoding untrusted input.

/// Maximum structural nesting depth the decoder will follow.
///
/// Each level of nesting consumes at least two input bytes, so legitimate
/// inputs hit this bound only at several kilobytes of pure nesting. The
/// limit exists to fail with a descriptive error instead of exhausting the
/// call stack.
pub const MAX_DEPTH: usize = 1024;
