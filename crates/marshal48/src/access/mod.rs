//! Typed, assertion-heavy getters over the decoded graph.
//!
//! Each getter asserts one specific vertex shape and fails with a
//! descriptive [`AccessError`] on any mismatch — never a silent default.
//! Composite builtins observed with instance variables or mixins indicate a
//! schema the caller does not understand, so the sequence, mapping, and
//! opaque getters reject them outright.

use rustc_hash::FxHashSet;

use crate::error::AccessError;
use crate::model::{Graph, Reference, Vertex};

/// Per-field getter used by the record map and the variant decoder tables.
pub type FieldFn<R> = fn(&Graph, Reference) -> Result<R, AccessError>;

fn resolve(graph: &Graph, reference: Reference) -> Result<&Vertex, AccessError> {
    graph
        .get(reference)
        .ok_or(AccessError::Unresolved { reference })
}

fn mismatch(reference: Reference, expected: &'static str, found: &Vertex) -> AccessError {
    AccessError::KindMismatch {
        reference,
        expected,
        found: found.kind(),
    }
}

fn ensure_no_extensions(
    reference: Reference,
    vertex: &Vertex,
) -> Result<(), AccessError> {
    match vertex.extensions() {
        Some(ext) if !ext.is_empty() => Err(AccessError::UnexpectedExtensions {
            reference,
            kind: vertex.kind(),
            ivars: ext.ivars.len(),
            modules: ext.modules.len(),
        }),
        _ => Ok(()),
    }
}

// --- scalar getters ---

pub fn get_bool(graph: &Graph, reference: Reference) -> Result<bool, AccessError> {
    match resolve(graph, reference)? {
        Vertex::True => Ok(true),
        Vertex::False => Ok(false),
        other => Err(mismatch(reference, "boolean", other)),
    }
}

pub fn get_nil(graph: &Graph, reference: Reference) -> Result<(), AccessError> {
    match resolve(graph, reference)? {
        Vertex::Nil => Ok(()),
        other => Err(mismatch(reference, "nil", other)),
    }
}

pub fn get_fixnum(graph: &Graph, reference: Reference) -> Result<i64, AccessError> {
    match resolve(graph, reference)? {
        Vertex::Fixnum(value) => Ok(*value),
        other => Err(mismatch(reference, "fixnum", other)),
    }
}

pub fn get_float(graph: &Graph, reference: Reference) -> Result<f64, AccessError> {
    match resolve(graph, reference)? {
        Vertex::Float(value) => Ok(*value),
        other => Err(mismatch(reference, "float", other)),
    }
}

/// Raw bytes of a symbol.
pub fn get_symbol(graph: &Graph, reference: Reference) -> Result<&[u8], AccessError> {
    match resolve(graph, reference)? {
        Vertex::Symbol(bytes) => Ok(bytes),
        other => Err(mismatch(reference, "symbol", other)),
    }
}

/// Symbol bytes as UTF-8 text.
pub fn get_symbol_str(graph: &Graph, reference: Reference) -> Result<&str, AccessError> {
    let bytes = get_symbol(graph, reference)?;
    std::str::from_utf8(bytes).map_err(|_| AccessError::InvalidUtf8 {
        reference,
        what: "symbol",
    })
}

/// Raw bytes of a string vertex carrying no extensions.
pub fn get_string(graph: &Graph, reference: Reference) -> Result<&[u8], AccessError> {
    let vertex = resolve(graph, reference)?;
    match vertex {
        Vertex::Str { bytes, .. } => {
            ensure_no_extensions(reference, vertex)?;
            Ok(bytes)
        }
        other => Err(mismatch(reference, "string", other)),
    }
}

/// String bytes as UTF-8 text.
pub fn get_str(graph: &Graph, reference: Reference) -> Result<&str, AccessError> {
    let bytes = get_string(graph, reference)?;
    std::str::from_utf8(bytes).map_err(|_| AccessError::InvalidUtf8 {
        reference,
        what: "string",
    })
}

/// Big integer folded into an `i64`, for callers that know their data fits.
pub fn get_bignum_i64(graph: &Graph, reference: Reference) -> Result<i64, AccessError> {
    let vertex = resolve(graph, reference)?;
    match vertex {
        Vertex::Bignum { .. } => vertex.bignum_to_i64().ok_or(AccessError::KindMismatch {
            reference,
            expected: "bignum within i64 range",
            found: "bignum",
        }),
        other => Err(mismatch(reference, "bignum", other)),
    }
}

// --- sequence / mapping getters ---

/// Applies `f` to each element reference of an extension-free array.
pub fn get_array<T, F>(graph: &Graph, reference: Reference, mut f: F) -> Result<Vec<T>, AccessError>
where
    F: FnMut(&Graph, Reference) -> Result<T, AccessError>,
{
    let vertex = resolve(graph, reference)?;
    let Vertex::Array { elements, .. } = vertex else {
        return Err(mismatch(reference, "array", vertex));
    };
    ensure_no_extensions(reference, vertex)?;
    let mut out = Vec::with_capacity(elements.len());
    for &element in elements {
        out.push(f(graph, element)?);
    }
    Ok(out)
}

/// Element references of an extension-free array.
pub fn get_refs(graph: &Graph, reference: Reference) -> Result<Vec<Reference>, AccessError> {
    get_array(graph, reference, |_, r| Ok(r))
}

/// Applies `f` to each (key, value) reference pair of an extension-free
/// mapping. A default value is a schema violation here; use
/// [`get_hash_with_default`] to allow one explicitly.
pub fn get_hash<T, F>(graph: &Graph, reference: Reference, f: F) -> Result<Vec<T>, AccessError>
where
    F: FnMut(&Graph, Reference, Reference) -> Result<T, AccessError>,
{
    let (out, default) = get_hash_with_default(graph, reference, f)?;
    if default.is_some() {
        return Err(AccessError::UnexpectedDefault { reference });
    }
    Ok(out)
}

/// As [`get_hash`], but exposes the optional default-value reference.
pub fn get_hash_with_default<T, F>(
    graph: &Graph,
    reference: Reference,
    mut f: F,
) -> Result<(Vec<T>, Option<Reference>), AccessError>
where
    F: FnMut(&Graph, Reference, Reference) -> Result<T, AccessError>,
{
    let vertex = resolve(graph, reference)?;
    let Vertex::Hash { pairs, default, .. } = vertex else {
        return Err(mismatch(reference, "hash", vertex));
    };
    ensure_no_extensions(reference, vertex)?;
    let mut out = Vec::with_capacity(pairs.len());
    for &(key, value) in pairs {
        out.push(f(graph, key, value)?);
    }
    Ok((out, *default))
}

// --- whole-record getter ---

/// Extracts a plain object of exactly `class_name` through a field map.
///
/// The map must describe the object's instance variables EXACTLY: an
/// observed field with no map entry is an error, and so is a map entry that
/// is never observed. One leading `@` marker is stripped from each observed
/// variable name before lookup. Results are returned in observed order.
pub fn get_record<R>(
    graph: &Graph,
    reference: Reference,
    class_name: &str,
    fields: &[(&'static str, FieldFn<R>)],
) -> Result<Vec<(&'static str, R)>, AccessError> {
    let vertex = resolve(graph, reference)?;
    let Vertex::Object { class, ext } = vertex else {
        return Err(mismatch(reference, "object", vertex));
    };
    let found_class = get_symbol_str(graph, *class)?;
    if found_class != class_name {
        return Err(AccessError::ClassMismatch {
            reference,
            expected: class_name.to_string(),
            found: found_class.to_string(),
        });
    }

    let mut out = Vec::with_capacity(ext.ivars.len());
    let mut seen: FxHashSet<&'static str> = FxHashSet::default();
    for &(name_ref, value_ref) in &ext.ivars {
        let raw_name = get_symbol_str(graph, name_ref)?;
        let name = raw_name.strip_prefix('@').unwrap_or(raw_name);
        let Some((key, getter)) = fields.iter().find(|(key, _)| *key == name) else {
            return Err(AccessError::UnknownField {
                reference,
                class: class_name.to_string(),
                field: name.to_string(),
            });
        };
        seen.insert(key);
        out.push((*key, getter(graph, value_ref)?));
    }
    for (key, _) in fields {
        if !seen.contains(key) {
            return Err(AccessError::MissingField {
                reference,
                class: class_name.to_string(),
                field: (*key).to_string(),
            });
        }
    }
    Ok(out)
}

// --- opaque payload getter ---

/// Raw payload of a `u`-wrapped vertex of exactly `class_name`, with no
/// extensions attached.
pub fn get_opaque<'g>(
    graph: &'g Graph,
    reference: Reference,
    class_name: &str,
) -> Result<&'g [u8], AccessError> {
    let vertex = resolve(graph, reference)?;
    let Vertex::UserDefined { class, payload, .. } = vertex else {
        return Err(mismatch(reference, "user defined", vertex));
    };
    ensure_no_extensions(reference, vertex)?;
    let found_class = get_symbol_str(graph, *class)?;
    if found_class != class_name {
        return Err(AccessError::ClassMismatch {
            reference,
            expected: class_name.to_string(),
            found: found_class.to_string(),
        });
    }
    Ok(payload)
}
