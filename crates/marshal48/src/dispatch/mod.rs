//! Tag-driven variant decoding over static data tables.
//!
//! An [`OpTable`] maps numeric codes to named entries with an ordered,
//! arity-checked field list. Entries may instead declare a sub-table, in
//! which case the first argument is consumed as a sub-code and the same
//! procedure recurses — the table shape, not copied code, drives arbitrary
//! nesting (three levels observed in practice).

use crate::access::{self, FieldFn};
use crate::error::OpError;
use crate::model::{Graph, Reference};

/// One code's decoding rule.
///
/// A sub-dispatching entry declares no direct fields of its own; the inner
/// table's leaf entry carries the field list for the remaining arguments.
pub struct OpEntry<R: 'static> {
    pub code: i64,
    pub name: &'static str,
    pub fields: &'static [(&'static str, FieldFn<R>)],
    pub sub: Option<&'static OpTable<R>>,
}

/// A code-indexed decoding table.
pub struct OpTable<R: 'static> {
    /// Table name, used in unknown-code diagnostics.
    pub name: &'static str,
    pub entries: &'static [OpEntry<R>],
}

impl<R> OpTable<R> {
    fn entry(&self, code: i64) -> Option<&OpEntry<R>> {
        self.entries.iter().find(|entry| entry.code == code)
    }
}

/// A decoded record: the dotted name chain, the code chain outermost-first,
/// and the named fields in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct OpRecord<R> {
    pub name: String,
    pub codes: Vec<i64>,
    pub fields: Vec<(&'static str, R)>,
}

/// Decodes one `code` + flat argument list against a table.
///
/// `reference` identifies the record vertex the code and arguments came
/// from; it appears in every error. Unknown codes and arity mismatches are
/// fatal and carry the full diagnostic context, including the raw argument
/// reference list.
pub fn decode_op<R>(
    graph: &Graph,
    reference: Reference,
    table: &OpTable<R>,
    code: i64,
    args: &[Reference],
) -> Result<OpRecord<R>, OpError> {
    let Some(entry) = table.entry(code) else {
        return Err(OpError::UnknownCode {
            table: table.name,
            reference,
            code,
        });
    };

    if let Some(sub) = entry.sub {
        debug_assert!(
            entry.fields.is_empty(),
            "sub-dispatching entries declare no direct fields"
        );
        let Some((&sub_code_ref, rest)) = args.split_first() else {
            return Err(OpError::ArityMismatch {
                reference,
                type_name: entry.name,
                code,
                expected: 1,
                actual: 0,
                args: args.to_vec(),
            });
        };
        let sub_code = access::get_fixnum(graph, sub_code_ref)?;
        let inner = decode_op(graph, reference, sub, sub_code, rest)?;
        let mut codes = Vec::with_capacity(inner.codes.len() + 1);
        codes.push(code);
        codes.extend(inner.codes);
        return Ok(OpRecord {
            name: format!("{}.{}", entry.name, inner.name),
            codes,
            fields: inner.fields,
        });
    }

    if args.len() != entry.fields.len() {
        return Err(OpError::ArityMismatch {
            reference,
            type_name: entry.name,
            code,
            expected: entry.fields.len(),
            actual: args.len(),
            args: args.to_vec(),
        });
    }

    let mut fields = Vec::with_capacity(entry.fields.len());
    for (&(name, getter), &arg) in entry.fields.iter().zip(args) {
        fields.push((name, getter(graph, arg)?));
    }
    Ok(OpRecord {
        name: entry.name.to_string(),
        codes: vec![code],
        fields,
    })
}

/// Bridges a plain-object record vertex to [`decode_op`]: pulls the numeric
/// code and the flat argument array out of the named instance variables,
/// then dispatches. The object must carry exactly those two fields.
pub fn decode_op_object<R>(
    graph: &Graph,
    reference: Reference,
    class_name: &str,
    code_field: &str,
    args_field: &str,
    table: &OpTable<R>,
) -> Result<OpRecord<R>, OpError> {
    use crate::error::AccessError;
    use crate::model::Vertex;

    let vertex = graph
        .get(reference)
        .ok_or(AccessError::Unresolved { reference })?;
    let Vertex::Object { class, ext } = vertex else {
        return Err(AccessError::KindMismatch {
            reference,
            expected: "object",
            found: vertex.kind(),
        }
        .into());
    };
    let found_class = access::get_symbol_str(graph, *class)?;
    if found_class != class_name {
        return Err(AccessError::ClassMismatch {
            reference,
            expected: class_name.to_string(),
            found: found_class.to_string(),
        }
        .into());
    }

    let mut code = None;
    let mut args = None;
    for &(name_ref, value_ref) in &ext.ivars {
        let raw_name = access::get_symbol_str(graph, name_ref)?;
        let name = raw_name.strip_prefix('@').unwrap_or(raw_name);
        if name == code_field {
            code = Some(access::get_fixnum(graph, value_ref)?);
        } else if name == args_field {
            args = Some(access::get_refs(graph, value_ref)?);
        } else {
            return Err(AccessError::UnknownField {
                reference,
                class: class_name.to_string(),
                field: name.to_string(),
            }
            .into());
        }
    }
    let code = code.ok_or_else(|| AccessError::MissingField {
        reference,
        class: class_name.to_string(),
        field: code_field.to_string(),
    })?;
    let args = args.ok_or_else(|| AccessError::MissingField {
        reference,
        class: class_name.to_string(),
        field: args_field.to_string(),
    })?;

    decode_op(graph, reference, table, code, &args)
}
