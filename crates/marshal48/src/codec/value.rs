//! Recursive-descent tag-dispatch decoder.
//!
//! Consumes one tag byte per vertex and produces references into the graph.
//! Every composite that can legally be the target of a cycle reserves its
//! Object slot before recursing into children, so a child back-reference to
//! a not-yet-finished ancestor resolves to the reserved slot.

use tracing::warn;

use crate::codec::primitives::Reader;
use crate::error::DecodeError;
use crate::limits::MAX_DEPTH;
use crate::model::{Extensions, Graph, Namespace, Reference, RegexOptions, Vertex};

// Tag bytes of the wire grammar.
const TAG_NIL: u8 = b'0';
const TAG_TRUE: u8 = b'T';
const TAG_FALSE: u8 = b'F';
const TAG_FIXNUM: u8 = b'i';
const TAG_BIGNUM: u8 = b'l';
const TAG_FLOAT: u8 = b'f';
const TAG_STRING: u8 = b'"';
const TAG_REGEX: u8 = b'/';
const TAG_SYMBOL: u8 = b':';
const TAG_SYMBOL_LINK: u8 = b';';
const TAG_OBJECT_LINK: u8 = b'@';
const TAG_CLASS: u8 = b'c';
const TAG_MODULE: u8 = b'm';
const TAG_CLASS_OR_MODULE: u8 = b'M';
const TAG_IVARS: u8 = b'I';
const TAG_EXTENDED: u8 = b'e';
const TAG_ARRAY: u8 = b'[';
const TAG_HASH: u8 = b'{';
const TAG_HASH_DEFAULT: u8 = b'}';
const TAG_OBJECT: u8 = b'o';
const TAG_STRUCT: u8 = b'S';
const TAG_SUBCLASSED: u8 = b'C';
const TAG_DATA: u8 = b'd';
const TAG_USER_MARSHAL: u8 = b'U';
const TAG_USER_DEFINED: u8 = b'u';

/// Decodes one value, appending vertices to the graph and returning the
/// reference of the decoded root.
pub fn decode_value(
    reader: &mut Reader<'_>,
    graph: &mut Graph,
    depth: usize,
) -> Result<Reference, DecodeError> {
    if depth > MAX_DEPTH {
        return Err(DecodeError::DepthLimitExceeded { limit: MAX_DEPTH });
    }
    let tag_offset = reader.position();
    let tag = reader.read_byte("tag")?;

    match tag {
        TAG_NIL => Ok(graph.add(Vertex::Nil)),
        TAG_TRUE => Ok(graph.add(Vertex::True)),
        TAG_FALSE => Ok(graph.add(Vertex::False)),
        TAG_FIXNUM => {
            let value = reader.read_long("fixnum")?;
            Ok(graph.add(Vertex::Fixnum(value)))
        }
        TAG_BIGNUM => decode_bignum(reader, graph),
        TAG_FLOAT => {
            let value = reader.read_float("float")?;
            Ok(graph.add(Vertex::Float(value)))
        }
        TAG_STRING => {
            // Raw bytes; no text decoding happens at this layer.
            let bytes = reader.read_byte_seq("string")?.to_vec();
            Ok(graph.add(Vertex::Str {
                bytes,
                ext: Extensions::default(),
            }))
        }
        TAG_REGEX => decode_regex(reader, graph),
        TAG_SYMBOL => {
            let bytes = reader.read_byte_seq("symbol")?.to_vec();
            Ok(graph.add(Vertex::Symbol(bytes)))
        }
        TAG_SYMBOL_LINK => decode_link(reader, graph, Namespace::Symbol),
        TAG_OBJECT_LINK => decode_link(reader, graph, Namespace::Object),
        TAG_CLASS => {
            let name = reader.read_byte_seq("class name")?.to_vec();
            Ok(graph.add(Vertex::ClassName(name)))
        }
        TAG_MODULE => {
            let name = reader.read_byte_seq("module name")?.to_vec();
            Ok(graph.add(Vertex::ModuleName(name)))
        }
        TAG_CLASS_OR_MODULE => {
            let name = reader.read_byte_seq("class-or-module name")?.to_vec();
            Ok(graph.add(Vertex::ClassOrModuleName(name)))
        }
        TAG_IVARS => decode_ivars_wrapper(reader, graph, depth),
        TAG_EXTENDED => decode_extended(reader, graph, depth),
        TAG_ARRAY => decode_array(reader, graph, depth),
        TAG_HASH => decode_hash(reader, graph, depth, false),
        TAG_HASH_DEFAULT => decode_hash(reader, graph, depth, true),
        TAG_OBJECT => decode_object(reader, graph, depth),
        TAG_STRUCT => decode_struct(reader, graph, depth),
        TAG_SUBCLASSED => decode_wrapper(reader, graph, depth, WrapperKind::Subclassed),
        TAG_DATA => decode_wrapper(reader, graph, depth, WrapperKind::Data),
        TAG_USER_MARSHAL => decode_wrapper(reader, graph, depth, WrapperKind::UserMarshal),
        TAG_USER_DEFINED => decode_user_defined(reader, graph, depth),
        _ => Err(DecodeError::InvalidTag {
            offset: tag_offset,
            tag,
        }),
    }
}

/// Resolves a `;` / `@` link token directly into an existing namespace slot.
/// No new vertex is created; a placeholder target is legal mid-decode.
fn decode_link(
    reader: &mut Reader<'_>,
    graph: &Graph,
    namespace: Namespace,
) -> Result<Reference, DecodeError> {
    let header_offset = reader.position();
    let index = reader.read_long("link index")?;
    if index < 0 {
        return Err(DecodeError::NegativeLength {
            offset: header_offset,
            value: index,
        });
    }
    let index = index as usize;
    let len = graph.len(namespace);
    if index >= len {
        return Err(DecodeError::LinkOutOfRange {
            namespace,
            index,
            len,
        });
    }
    Ok(Reference::new(namespace, index))
}

fn decode_bignum(reader: &mut Reader<'_>, graph: &mut Graph) -> Result<Reference, DecodeError> {
    let sign_offset = reader.position();
    let negative = match reader.read_byte("bignum sign")? {
        b'+' => false,
        b'-' => true,
        byte => {
            return Err(DecodeError::InvalidBignumSign {
                offset: sign_offset,
                byte,
            });
        }
    };
    let count_offset = reader.position();
    let words = reader.read_long("bignum word count")?;
    if words < 0 {
        return Err(DecodeError::NegativeLength {
            offset: count_offset,
            value: words,
        });
    }
    let byte_count = (words as usize).saturating_mul(2);
    let magnitude = reader.read_bytes(byte_count, "bignum magnitude")?.to_vec();
    Ok(graph.add(Vertex::Bignum {
        negative,
        magnitude,
    }))
}

fn decode_regex(reader: &mut Reader<'_>, graph: &mut Graph) -> Result<Reference, DecodeError> {
    let source = reader.read_byte_seq("regex source")?.to_vec();
    let options_offset = reader.position();
    let bits = reader.read_byte("regex options")?;
    let (options, unknown) = RegexOptions::from_bits(bits);
    if unknown != 0 {
        warn!(
            offset = options_offset,
            bits = format_args!("0x{unknown:02x}"),
            "dropping unrecognized regex option bits"
        );
    }
    Ok(graph.add(Vertex::Regex { source, options }))
}

/// Decodes a value that must land in the Symbol namespace (ivar names,
/// struct member names, class names, module names).
fn decode_symbol_ref(
    reader: &mut Reader<'_>,
    graph: &mut Graph,
    depth: usize,
) -> Result<Reference, DecodeError> {
    let offset = reader.position();
    let reference = decode_value(reader, graph, depth)?;
    if reference.namespace != Namespace::Symbol {
        return Err(DecodeError::ExpectedSymbol {
            offset,
            found: reference.namespace,
        });
    }
    Ok(reference)
}

/// Decodes an ordered `(symbol, value)` pair list.
fn decode_pair_list(
    reader: &mut Reader<'_>,
    graph: &mut Graph,
    depth: usize,
    context: &'static str,
) -> Result<Vec<(Reference, Reference)>, DecodeError> {
    let count_offset = reader.position();
    let count = reader.read_long(context)?;
    if count < 0 {
        return Err(DecodeError::NegativeLength {
            offset: count_offset,
            value: count,
        });
    }
    let count = count as usize;
    let mut pairs = Vec::with_capacity(count.min(reader.remaining_len()));
    for _ in 0..count {
        let name = decode_symbol_ref(reader, graph, depth + 1)?;
        let value = decode_value(reader, graph, depth + 1)?;
        pairs.push((name, value));
    }
    Ok(pairs)
}

/// `I`: decode the wrapped value, then append decoded instance variables to
/// it. The wrapper has no slot of its own.
fn decode_ivars_wrapper(
    reader: &mut Reader<'_>,
    graph: &mut Graph,
    depth: usize,
) -> Result<Reference, DecodeError> {
    let target = decode_value(reader, graph, depth + 1)?;
    let ivars = decode_pair_list(reader, graph, depth, "instance variable count")?;
    match graph.get_mut(target).and_then(Vertex::extensions_mut) {
        Some(ext) => ext.ivars.extend(ivars),
        None => {
            let kind = graph.get(target).map_or("unresolved", Vertex::kind);
            warn!(%target, kind, "dropping instance variables on a vertex that cannot carry them");
        }
    }
    Ok(target)
}

/// `e`: the module name comes FIRST on the wire, then the wrapped value.
/// Appending as wrappers unwind leaves the mixin list innermost-first.
fn decode_extended(
    reader: &mut Reader<'_>,
    graph: &mut Graph,
    depth: usize,
) -> Result<Reference, DecodeError> {
    let module = decode_symbol_ref(reader, graph, depth + 1)?;
    let target = decode_value(reader, graph, depth + 1)?;
    match graph.get_mut(target).and_then(Vertex::extensions_mut) {
        Some(ext) => ext.modules.push(module),
        None => {
            let kind = graph.get(target).map_or("unresolved", Vertex::kind);
            warn!(%target, kind, "dropping module extension on a vertex that cannot carry it");
        }
    }
    Ok(target)
}

fn decode_array(
    reader: &mut Reader<'_>,
    graph: &mut Graph,
    depth: usize,
) -> Result<Reference, DecodeError> {
    let slot = graph.reserve();
    let count_offset = reader.position();
    let count = reader.read_long("array length")?;
    if count < 0 {
        return Err(DecodeError::NegativeLength {
            offset: count_offset,
            value: count,
        });
    }
    let count = count as usize;
    let mut elements = Vec::with_capacity(count.min(reader.remaining_len()));
    for _ in 0..count {
        elements.push(decode_value(reader, graph, depth + 1)?);
    }
    graph.set(
        slot,
        Vertex::Array {
            elements,
            ext: Extensions::default(),
        },
    )?;
    Ok(slot)
}

fn decode_hash(
    reader: &mut Reader<'_>,
    graph: &mut Graph,
    depth: usize,
    has_default: bool,
) -> Result<Reference, DecodeError> {
    let slot = graph.reserve();
    let count_offset = reader.position();
    let count = reader.read_long("hash pair count")?;
    if count < 0 {
        return Err(DecodeError::NegativeLength {
            offset: count_offset,
            value: count,
        });
    }
    let count = count as usize;
    let mut pairs = Vec::with_capacity(count.min(reader.remaining_len()));
    for _ in 0..count {
        let key = decode_value(reader, graph, depth + 1)?;
        let value = decode_value(reader, graph, depth + 1)?;
        pairs.push((key, value));
    }
    let default = if has_default {
        Some(decode_value(reader, graph, depth + 1)?)
    } else {
        None
    };
    graph.set(
        slot,
        Vertex::Hash {
            pairs,
            default,
            ext: Extensions::default(),
        },
    )?;
    Ok(slot)
}

fn decode_object(
    reader: &mut Reader<'_>,
    graph: &mut Graph,
    depth: usize,
) -> Result<Reference, DecodeError> {
    let slot = graph.reserve();
    let class = decode_symbol_ref(reader, graph, depth + 1)?;
    let ivars = decode_pair_list(reader, graph, depth, "object ivar count")?;
    graph.set(
        slot,
        Vertex::Object {
            class,
            ext: Extensions {
                ivars,
                modules: Vec::new(),
            },
        },
    )?;
    Ok(slot)
}

fn decode_struct(
    reader: &mut Reader<'_>,
    graph: &mut Graph,
    depth: usize,
) -> Result<Reference, DecodeError> {
    let slot = graph.reserve();
    let name = decode_symbol_ref(reader, graph, depth + 1)?;
    let members = decode_pair_list(reader, graph, depth, "struct member count")?;
    graph.set(
        slot,
        Vertex::Struct {
            name,
            members,
            ext: Extensions::default(),
        },
    )?;
    Ok(slot)
}

enum WrapperKind {
    Subclassed,
    Data,
    UserMarshal,
}

fn decode_wrapper(
    reader: &mut Reader<'_>,
    graph: &mut Graph,
    depth: usize,
    kind: WrapperKind,
) -> Result<Reference, DecodeError> {
    let slot = graph.reserve();
    let class = decode_symbol_ref(reader, graph, depth + 1)?;
    let inner = decode_value(reader, graph, depth + 1)?;
    let ext = Extensions::default();
    let vertex = match kind {
        WrapperKind::Subclassed => Vertex::Subclassed { class, inner, ext },
        WrapperKind::Data => Vertex::DataObject { class, inner, ext },
        WrapperKind::UserMarshal => Vertex::UserMarshal { class, inner, ext },
    };
    graph.set(slot, vertex)?;
    Ok(slot)
}

fn decode_user_defined(
    reader: &mut Reader<'_>,
    graph: &mut Graph,
    depth: usize,
) -> Result<Reference, DecodeError> {
    let slot = graph.reserve();
    let class = decode_symbol_ref(reader, graph, depth + 1)?;
    let payload = reader.read_byte_seq("user-defined payload")?.to_vec();
    graph.set(
        slot,
        Vertex::UserDefined {
            class,
            payload,
            ext: Extensions::default(),
        },
    )?;
    Ok(slot)
}
