//! marshal48: decoder for the Marshal 4.8 binary object-serialization format.
//!
//! The format encodes an arbitrary object graph — including cycles and
//! shared substructure — as a flat byte stream of per-kind tag bytes,
//! variable-length integers, and two disjoint reference namespaces for
//! interned names versus composite objects. This crate reconstructs that
//! graph faithfully without knowing in advance what shape of data a file
//! holds, then lets callers pull strongly-typed records back out of it
//! under explicit, exhaustively-checked schemas.
//!
//! # Overview
//!
//! - **Decode once**: [`decode`] turns a byte buffer into a [`Graph`] of
//!   [`Vertex`] values addressed by small [`Reference`] handles, plus the
//!   root reference. Sharing and cycles in the input become shared handles
//!   in the graph; nothing is interpreted beyond the wire grammar.
//! - **Extract on demand**: the [`access`] layer asserts vertex shapes and
//!   unwraps them, failing loudly on any mismatch; the [`dispatch`] layer
//!   decodes "opcode + flat argument list" records against caller-supplied
//!   data tables, including nested sub-code dispatch.
//!
//! # Quick Start
//!
//! ```rust
//! use marshal48::{access, decode, Namespace};
//!
//! // Marshal 4.8 encoding of the array [1, :ok].
//! let bytes = [0x04, 0x08, b'[', 0x07, b'i', 0x06, b':', 0x07, b'o', b'k'];
//!
//! let (graph, root) = decode(&bytes).unwrap();
//! let elements = access::get_refs(&graph, root).unwrap();
//! assert_eq!(access::get_fixnum(&graph, elements[0]).unwrap(), 1);
//! assert_eq!(access::get_symbol_str(&graph, elements[1]).unwrap(), "ok");
//! assert_eq!(elements[1].namespace, Namespace::Symbol);
//! ```
//!
//! # Modules
//!
//! - [`model`]: references, vertex kinds, and the graph arena
//! - [`codec`]: binary decoding (cursor, primitives, tag dispatch)
//! - [`access`]: typed getters with strict shape assertions
//! - [`dispatch`]: table-driven variant decoding
//! - [`error`]: error types
//! - [`limits`]: hardening limits for untrusted input
//!
//! # Security
//!
//! The decoder is designed to safely handle untrusted input:
//! - Structural nesting is depth-limited instead of exhausting the stack
//! - Length prefixes cannot force allocations beyond the input size
//! - Malformed data is rejected with positional, descriptive errors
//!
//! # What this crate does not do
//!
//! There is no serializer: the graph is read-only output, never written
//! back to bytes. There is no streaming mode: the whole buffer is decoded
//! in memory in one pass. Domain-specific opcode tables are caller data,
//! not part of this crate.

pub mod access;
pub mod codec;
pub mod dispatch;
pub mod error;
pub mod limits;
pub mod model;

mod util;

// Re-export commonly used types at crate root
pub use codec::{decode, Reader, FORMAT_MAJOR, FORMAT_MINOR};
pub use dispatch::{decode_op, decode_op_object, OpEntry, OpRecord, OpTable};
pub use error::{AccessError, DecodeError, OpError};
pub use model::{Extensions, Graph, Namespace, Reference, RegexOptions, Vertex};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
