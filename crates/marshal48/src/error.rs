//! Error types for Marshal 4.8 decoding and extraction.

use thiserror::Error;

use crate::model::{Namespace, Reference};

/// Error during binary decoding.
///
/// Every variant carries enough positional context to diagnose the failure
/// without re-running the decode: structural errors report the byte offset,
/// graph errors report the offending reference.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    #[error("unexpected end of input at offset {offset} while reading {context}")]
    UnexpectedEof { offset: usize, context: &'static str },

    #[error("unsupported format version {major}.{minor} (expected 4.x, x <= 8)")]
    UnsupportedVersion { major: u8, minor: u8 },

    #[error("invalid tag byte 0x{tag:02x} at offset {offset}")]
    InvalidTag { offset: usize, tag: u8 },

    #[error("negative length {value} at offset {offset}")]
    NegativeLength { offset: usize, value: i64 },

    #[error("invalid bignum sign byte 0x{byte:02x} at offset {offset} (expected '+' or '-')")]
    InvalidBignumSign { offset: usize, byte: u8 },

    #[error("expected a symbol at offset {offset}, decoded a {found} reference instead")]
    ExpectedSymbol { offset: usize, found: Namespace },

    #[error("{namespace} link index {index} out of range (namespace holds {len} entries)")]
    LinkOutOfRange {
        namespace: Namespace,
        index: usize,
        len: usize,
    },

    #[error("nesting depth exceeds limit of {limit}")]
    DepthLimitExceeded { limit: usize },

    #[error("input not fully consumed: {consumed} of {total} bytes read")]
    TrailingBytes { consumed: usize, total: usize },

    #[error("graph is empty, no root reference")]
    EmptyGraph,

    #[error("graph is still under construction, no unambiguous root reference")]
    GraphUnderConstruction,

    #[error("vertex kind does not match the {namespace} namespace of {reference}")]
    NamespaceMismatch {
        namespace: Namespace,
        reference: Reference,
    },
}

/// Error raised by the typed accessor layer when a vertex does not have the
/// shape the caller asserted.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AccessError {
    #[error("{reference} is not resolvable (placeholder or out of range)")]
    Unresolved { reference: Reference },

    #[error("{reference}: expected a {expected} vertex, found {found}")]
    KindMismatch {
        reference: Reference,
        expected: &'static str,
        found: &'static str,
    },

    #[error(
        "{reference}: {kind} carries unexpected extensions \
         ({ivars} instance variable(s), {modules} mixin(s))"
    )]
    UnexpectedExtensions {
        reference: Reference,
        kind: &'static str,
        ivars: usize,
        modules: usize,
    },

    #[error("{reference}: mapping carries a default value the caller did not allow")]
    UnexpectedDefault { reference: Reference },

    #[error("{reference}: expected class {expected:?}, found {found:?}")]
    ClassMismatch {
        reference: Reference,
        expected: String,
        found: String,
    },

    #[error("{reference}: class {class:?} has field {field:?} with no entry in the field map")]
    UnknownField {
        reference: Reference,
        class: String,
        field: String,
    },

    #[error("{reference}: field map entry {field:?} never observed on class {class:?}")]
    MissingField {
        reference: Reference,
        class: String,
        field: String,
    },

    #[error("{reference}: {what} is not valid UTF-8")]
    InvalidUtf8 {
        reference: Reference,
        what: &'static str,
    },
}

/// Error raised by the tag-driven variant decoder.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OpError {
    #[error("{reference}: unknown code {code} in table {table:?}")]
    UnknownCode {
        table: &'static str,
        reference: Reference,
        code: i64,
    },

    #[error(
        "{reference}: {type_name} code {code} expects {expected} argument(s), \
         got {actual}: {args:?}"
    )]
    ArityMismatch {
        reference: Reference,
        type_name: &'static str,
        code: i64,
        expected: usize,
        actual: usize,
        args: Vec<Reference>,
    },

    #[error(transparent)]
    Access(#[from] AccessError),
}
