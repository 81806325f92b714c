//! Vertex kinds of the decoded object graph.

use crate::model::Reference;

/// Regex option flags carried by a regex vertex.
///
/// Only the three flags the wire format defines are representable; unknown
/// bits are dropped (with a warning) during decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RegexOptions {
    pub ignore_case: bool,
    pub extended: bool,
    pub multiline: bool,
}

impl RegexOptions {
    const IGNORE_CASE: u8 = 0x01;
    const EXTENDED: u8 = 0x02;
    const MULTILINE: u8 = 0x04;
    const KNOWN_MASK: u8 = 0x07;

    /// Splits an options byte into the known flags and the unknown bits.
    pub fn from_bits(bits: u8) -> (Self, u8) {
        let options = Self {
            ignore_case: bits & Self::IGNORE_CASE != 0,
            extended: bits & Self::EXTENDED != 0,
            multiline: bits & Self::MULTILINE != 0,
        };
        (options, bits & !Self::KNOWN_MASK)
    }
}

/// Attachments shared by every extensible vertex kind: an ordered
/// instance-variable list and an ordered mixin list.
///
/// Mixins are stored innermost-first regardless of the order the input
/// presented the extension wrappers.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Extensions {
    /// Ordered (symbol reference, value reference) pairs.
    pub ivars: Vec<(Reference, Reference)>,
    /// Symbol references naming applied mixin modules, innermost first.
    pub modules: Vec<Reference>,
}

impl Extensions {
    /// Returns true if no instance variables or mixins are attached.
    pub fn is_empty(&self) -> bool {
        self.ivars.is_empty() && self.modules.is_empty()
    }
}

/// One decoded node of the object graph.
///
/// A closed union over every kind the wire format can produce. The four
/// value kinds (`Nil`, `True`, `False`, `Fixnum`) and `Symbol` live in
/// deduplicated namespaces; everything else occupies the Object namespace
/// and is aliased only through explicit link tokens.
#[derive(Debug, Clone, PartialEq)]
pub enum Vertex {
    // --- Value namespace (structurally deduplicated) ---
    Nil,
    True,
    False,
    Fixnum(i64),

    // --- Symbol namespace (deduplicated by byte content) ---
    Symbol(Vec<u8>),

    // --- Object namespace, simple referenceable kinds ---
    Float(f64),
    /// Arbitrary-precision integer: sign plus little-endian magnitude bytes.
    Bignum {
        negative: bool,
        magnitude: Vec<u8>,
    },
    Regex {
        source: Vec<u8>,
        options: RegexOptions,
    },
    ClassName(Vec<u8>),
    ModuleName(Vec<u8>),
    /// A class-or-module name the writer could not disambiguate.
    ClassOrModuleName(Vec<u8>),

    // --- Object namespace, extensible kinds ---
    Str {
        bytes: Vec<u8>,
        ext: Extensions,
    },
    Array {
        elements: Vec<Reference>,
        ext: Extensions,
    },
    Hash {
        pairs: Vec<(Reference, Reference)>,
        default: Option<Reference>,
        ext: Extensions,
    },
    /// Plain object: class symbol plus instance variables (held in `ext`).
    Object {
        class: Reference,
        ext: Extensions,
    },
    Struct {
        name: Reference,
        members: Vec<(Reference, Reference)>,
        ext: Extensions,
    },
    /// `C`: instance of a user subclass of a builtin, wrapping the builtin value.
    Subclassed {
        class: Reference,
        inner: Reference,
        ext: Extensions,
    },
    /// `d`: foreign-extension data object wrapping a marshalled state value.
    DataObject {
        class: Reference,
        inner: Reference,
        ext: Extensions,
    },
    /// `U`: object serialized through a custom marshal hook, wrapping its dump.
    UserMarshal {
        class: Reference,
        inner: Reference,
        ext: Extensions,
    },
    /// `u`: opaque user-defined payload, kept as raw bytes.
    UserDefined {
        class: Reference,
        payload: Vec<u8>,
        ext: Extensions,
    },
}

impl Vertex {
    /// Short human-readable kind name, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Vertex::Nil => "nil",
            Vertex::True => "true",
            Vertex::False => "false",
            Vertex::Fixnum(_) => "fixnum",
            Vertex::Symbol(_) => "symbol",
            Vertex::Float(_) => "float",
            Vertex::Bignum { .. } => "bignum",
            Vertex::Regex { .. } => "regex",
            Vertex::ClassName(_) => "class name",
            Vertex::ModuleName(_) => "module name",
            Vertex::ClassOrModuleName(_) => "class-or-module name",
            Vertex::Str { .. } => "string",
            Vertex::Array { .. } => "array",
            Vertex::Hash { .. } => "hash",
            Vertex::Object { .. } => "object",
            Vertex::Struct { .. } => "struct",
            Vertex::Subclassed { .. } => "subclassed builtin",
            Vertex::DataObject { .. } => "data object",
            Vertex::UserMarshal { .. } => "user marshal",
            Vertex::UserDefined { .. } => "user defined",
        }
    }

    /// Returns the extension attachments of an extensible vertex.
    pub fn extensions(&self) -> Option<&Extensions> {
        match self {
            Vertex::Str { ext, .. }
            | Vertex::Array { ext, .. }
            | Vertex::Hash { ext, .. }
            | Vertex::Object { ext, .. }
            | Vertex::Struct { ext, .. }
            | Vertex::Subclassed { ext, .. }
            | Vertex::DataObject { ext, .. }
            | Vertex::UserMarshal { ext, .. }
            | Vertex::UserDefined { ext, .. } => Some(ext),
            _ => None,
        }
    }

    /// Mutable access to the extension attachments of an extensible vertex.
    pub fn extensions_mut(&mut self) -> Option<&mut Extensions> {
        match self {
            Vertex::Str { ext, .. }
            | Vertex::Array { ext, .. }
            | Vertex::Hash { ext, .. }
            | Vertex::Object { ext, .. }
            | Vertex::Struct { ext, .. }
            | Vertex::Subclassed { ext, .. }
            | Vertex::DataObject { ext, .. }
            | Vertex::UserMarshal { ext, .. }
            | Vertex::UserDefined { ext, .. } => Some(ext),
            _ => None,
        }
    }

    /// Folds a bignum magnitude into an `i64` when it fits.
    pub fn bignum_to_i64(&self) -> Option<i64> {
        let Vertex::Bignum {
            negative,
            magnitude,
        } = self
        else {
            return None;
        };
        let mut value: u64 = 0;
        for (i, &byte) in magnitude.iter().enumerate() {
            if byte == 0 {
                continue;
            }
            if i >= 8 {
                return None;
            }
            value |= u64::from(byte) << (8 * i);
        }
        if *negative {
            if value > i64::MIN.unsigned_abs() {
                return None;
            }
            Some((value as i64).wrapping_neg())
        } else {
            i64::try_from(value).ok()
        }
    }
}
