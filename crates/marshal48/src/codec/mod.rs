//! Binary decoding for the Marshal 4.8 wire format.

pub mod primitives;
pub mod value;

pub use primitives::Reader;

use crate::error::DecodeError;
use crate::model::{Graph, Reference};

/// Major version byte of the supported format.
pub const FORMAT_MAJOR: u8 = 4;
/// Highest minor version byte the decoder accepts.
pub const FORMAT_MINOR: u8 = 8;

/// Decodes a complete Marshal byte buffer into a graph plus its root
/// reference.
///
/// The input must hold the 2-byte version header, exactly one value, and
/// nothing else; leftover bytes are fatal, as is running out of input
/// mid-structure. Failure is all-or-nothing: no partial graph is returned.
pub fn decode(input: &[u8]) -> Result<(Graph, Reference), DecodeError> {
    let mut reader = Reader::new(input);
    let major = reader.read_byte("version header")?;
    let minor = reader.read_byte("version header")?;
    if major != FORMAT_MAJOR || minor > FORMAT_MINOR {
        return Err(DecodeError::UnsupportedVersion { major, minor });
    }

    let mut graph = Graph::new();
    let root = value::decode_value(&mut reader, &mut graph, 0)?;

    if !reader.is_empty() {
        return Err(DecodeError::TrailingBytes {
            consumed: reader.position(),
            total: input.len(),
        });
    }
    // A dangling placeholder after a successful parse is a contract
    // violation, not a recoverable state.
    if graph.first_placeholder().is_some() {
        return Err(DecodeError::GraphUnderConstruction);
    }
    Ok((graph, root))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Namespace, Vertex};

    // --- wire builders for test fixtures ---

    fn long(value: i64) -> Vec<u8> {
        if value == 0 {
            return vec![0];
        }
        if (0..123).contains(&value) {
            return vec![(value + 5) as u8];
        }
        if (-123..0).contains(&value) {
            return vec![(value - 5) as i8 as u8];
        }
        let mut out = vec![0u8];
        let mut v = value;
        for i in 1u8..=4 {
            out.push((v & 0xFF) as u8);
            v >>= 8;
            if v == 0 {
                out[0] = i;
                break;
            }
            if v == -1 {
                out[0] = (-(i as i8)) as u8;
                break;
            }
        }
        out
    }

    fn input(body: &[&[u8]]) -> Vec<u8> {
        let mut data = vec![4, 8];
        for part in body {
            data.extend_from_slice(part);
        }
        data
    }

    fn sym(name: &[u8]) -> Vec<u8> {
        let mut out = vec![b':'];
        out.extend_from_slice(&long(name.len() as i64));
        out.extend_from_slice(name);
        out
    }

    fn string(bytes: &[u8]) -> Vec<u8> {
        let mut out = vec![b'"'];
        out.extend_from_slice(&long(bytes.len() as i64));
        out.extend_from_slice(bytes);
        out
    }

    // --- tests ---

    #[test]
    fn test_decode_fixnum_root() {
        let (graph, root) = decode(&input(&[b"i", &long(42)])).unwrap();
        assert_eq!(root.namespace, Namespace::Value);
        assert_eq!(graph.get(root), Some(&Vertex::Fixnum(42)));
        assert_eq!(graph.root_ref().unwrap(), root);
    }

    #[test]
    fn test_decode_literals() {
        for (tag, expected) in [
            (&b"T"[..], Vertex::True),
            (b"F", Vertex::False),
            (b"0", Vertex::Nil),
        ] {
            let (graph, root) = decode(&input(&[tag])).unwrap();
            assert_eq!(graph.get(root), Some(&expected));
        }
    }

    #[test]
    fn test_version_header_rules() {
        assert!(matches!(
            decode(&[4, 9, b'0']),
            Err(DecodeError::UnsupportedVersion { major: 4, minor: 9 })
        ));
        assert!(matches!(
            decode(&[5, 0, b'0']),
            Err(DecodeError::UnsupportedVersion { major: 5, .. })
        ));
        // Older minor revisions are accepted.
        assert!(decode(&[4, 6, b'0']).is_ok());
    }

    #[test]
    fn test_trailing_bytes_are_fatal() {
        let mut data = input(&[b"0"]);
        data.push(b'0');
        assert_eq!(
            decode(&data),
            Err(DecodeError::TrailingBytes {
                consumed: 3,
                total: 4
            })
        );
    }

    #[test]
    fn test_truncated_array_is_incomplete_input() {
        // Array header declares three elements; only one follows.
        let data = input(&[b"[", &long(3), b"i", &long(1)]);
        assert!(matches!(
            decode(&data),
            Err(DecodeError::UnexpectedEof { .. })
        ));
    }

    #[test]
    fn test_invalid_tag_reports_offset_and_byte() {
        let data = input(&[b"Z"]);
        assert_eq!(
            decode(&data),
            Err(DecodeError::InvalidTag {
                offset: 2,
                tag: b'Z'
            })
        );
    }

    #[test]
    fn test_symbol_and_fixnum_dedup_within_one_input() {
        // [:a, :a, 5, 5] written without link tokens still interns.
        let data = input(&[b"[", &long(4), &sym(b"a"), &sym(b"a"), b"i", &long(5), b"i", &long(5)]);
        let (graph, root) = decode(&data).unwrap();
        let Some(Vertex::Array { elements, .. }) = graph.get(root) else {
            panic!("expected array root");
        };
        assert_eq!(elements[0], elements[1]);
        assert_eq!(elements[2], elements[3]);
        assert_eq!(graph.len(Namespace::Symbol), 1);
    }

    #[test]
    fn test_symbol_link_token() {
        let data = input(&[b"[", &long(2), &sym(b"name"), b";", &long(0)]);
        let (graph, root) = decode(&data).unwrap();
        let Some(Vertex::Array { elements, .. }) = graph.get(root) else {
            panic!("expected array root");
        };
        assert_eq!(elements[0], elements[1]);
        assert_eq!(graph.get(elements[1]), Some(&Vertex::Symbol(b"name".to_vec())));
    }

    #[test]
    fn test_structurally_equal_objects_stay_distinct() {
        let data = input(&[b"[", &long(2), &string(b"x"), &string(b"x")]);
        let (graph, root) = decode(&data).unwrap();
        let Some(Vertex::Array { elements, .. }) = graph.get(root) else {
            panic!("expected array root");
        };
        assert_ne!(elements[0], elements[1]);
        assert_eq!(graph.get(elements[0]), graph.get(elements[1]));
    }

    #[test]
    fn test_self_referential_array() {
        // Array whose sole element is an object link back to itself.
        let data = input(&[b"[", &long(1), b"@", &long(0)]);
        let (graph, root) = decode(&data).unwrap();
        let Some(Vertex::Array { elements, .. }) = graph.get(root) else {
            panic!("expected array root");
        };
        assert_eq!(elements, &[root]);
        // Following the cycle terminates trivially.
        assert!(matches!(graph.get(elements[0]), Some(Vertex::Array { .. })));
    }

    #[test]
    fn test_shared_back_references() {
        // [[], @1, @1, []] — two links to the first inner array, and an
        // independent empty array that must stay distinct.
        let data = input(&[
            b"[",
            &long(4),
            b"[",
            &long(0),
            b"@",
            &long(1),
            b"@",
            &long(1),
            b"[",
            &long(0),
        ]);
        let (graph, root) = decode(&data).unwrap();
        let Some(Vertex::Array { elements, .. }) = graph.get(root) else {
            panic!("expected array root");
        };
        assert_eq!(elements[0], elements[1]);
        assert_eq!(elements[1], elements[2]);
        assert_ne!(elements[0], elements[3]);
    }

    #[test]
    fn test_object_link_out_of_range() {
        let data = input(&[b"[", &long(1), b"@", &long(9)]);
        assert_eq!(
            decode(&data),
            Err(DecodeError::LinkOutOfRange {
                namespace: Namespace::Object,
                index: 9,
                len: 1
            })
        );
    }

    #[test]
    fn test_bignum() {
        // 2^64 = l + word-count 5, ten magnitude bytes.
        let data = input(&[b"l", b"+", &long(5), &[0, 0, 0, 0, 0, 0, 0, 0, 1, 0]]);
        let (graph, root) = decode(&data).unwrap();
        match graph.get(root) {
            Some(Vertex::Bignum {
                negative: false,
                magnitude,
            }) => assert_eq!(magnitude, &[0, 0, 0, 0, 0, 0, 0, 0, 1, 0]),
            other => panic!("expected bignum, got {other:?}"),
        }
    }

    #[test]
    fn test_bignum_bad_sign() {
        let data = input(&[b"l", b"*", &long(1), &[1, 0]]);
        assert_eq!(
            decode(&data),
            Err(DecodeError::InvalidBignumSign {
                offset: 3,
                byte: b'*'
            })
        );
    }

    #[test]
    fn test_float_value() {
        let data = input(&[b"f", &long(5), b"1.1e2"]);
        let (graph, root) = decode(&data).unwrap();
        assert_eq!(graph.get(root), Some(&Vertex::Float(110.0)));
    }

    #[test]
    fn test_regex_with_unknown_option_bits() {
        // Unknown bits are warned about and dropped, never fatal.
        let data = input(&[b"/", &long(2), b"ab", &[0x31]]);
        let (graph, root) = decode(&data).unwrap();
        match graph.get(root) {
            Some(Vertex::Regex { source, options }) => {
                assert_eq!(source, b"ab");
                assert!(options.ignore_case);
                assert!(!options.extended);
                assert!(!options.multiline);
            }
            other => panic!("expected regex, got {other:?}"),
        }
    }

    #[test]
    fn test_hash_with_default() {
        // {:k => 1} with default 0, then the plain form must reject nothing.
        let data = input(&[b"}", &long(1), &sym(b"k"), b"i", &long(1), b"i", &long(0)]);
        let (graph, root) = decode(&data).unwrap();
        match graph.get(root) {
            Some(Vertex::Hash { pairs, default, .. }) => {
                assert_eq!(pairs.len(), 1);
                assert!(default.is_some());
            }
            other => panic!("expected hash, got {other:?}"),
        }
    }

    #[test]
    fn test_plain_object_with_ivars() {
        // #<Point @x=1 @y=2>
        let data = input(&[
            b"o",
            &sym(b"Point"),
            &long(2),
            &sym(b"@x"),
            b"i",
            &long(1),
            &sym(b"@y"),
            b"i",
            &long(2),
        ]);
        let (graph, root) = decode(&data).unwrap();
        match graph.get(root) {
            Some(Vertex::Object { class, ext }) => {
                assert_eq!(graph.get(*class), Some(&Vertex::Symbol(b"Point".to_vec())));
                assert_eq!(ext.ivars.len(), 2);
            }
            other => panic!("expected object, got {other:?}"),
        }
    }

    #[test]
    fn test_ivars_wrapper_attaches_to_string() {
        // I"ab" with one ivar.
        let data = input(&[
            b"I",
            &string(b"ab"),
            &long(1),
            &sym(b"@tag"),
            b"i",
            &long(7),
        ]);
        let (graph, root) = decode(&data).unwrap();
        match graph.get(root) {
            Some(Vertex::Str { bytes, ext }) => {
                assert_eq!(bytes, b"ab");
                assert_eq!(ext.ivars.len(), 1);
            }
            other => panic!("expected string, got {other:?}"),
        }
    }

    #[test]
    fn test_ivars_wrapper_on_fixnum_is_dropped_not_fatal() {
        let data = input(&[b"I", b"i", &long(3), &long(1), &sym(b"@x"), b"0"]);
        let (graph, root) = decode(&data).unwrap();
        assert_eq!(graph.get(root), Some(&Vertex::Fixnum(3)));
    }

    #[test]
    fn test_extension_wrapper_order_module_first() {
        // e :M ["inner"] — module symbol precedes the wrapped value.
        let data = input(&[b"e", &sym(b"M"), b"[", &long(0)]);
        let (graph, root) = decode(&data).unwrap();
        match graph.get(root) {
            Some(Vertex::Array { ext, .. }) => {
                assert_eq!(ext.modules.len(), 1);
                assert_eq!(
                    graph.get(ext.modules[0]),
                    Some(&Vertex::Symbol(b"M".to_vec()))
                );
            }
            other => panic!("expected array, got {other:?}"),
        }
    }

    #[test]
    fn test_nested_extension_wrappers_innermost_first() {
        // e :Outer e :Inner [] — Inner was applied closest to the object.
        let data = input(&[b"e", &sym(b"Outer"), b"e", &sym(b"Inner"), b"[", &long(0)]);
        let (graph, root) = decode(&data).unwrap();
        let Some(Vertex::Array { ext, .. }) = graph.get(root) else {
            panic!("expected array root");
        };
        let names: Vec<_> = ext
            .modules
            .iter()
            .map(|m| match graph.get(*m) {
                Some(Vertex::Symbol(bytes)) => bytes.clone(),
                other => panic!("expected symbol, got {other:?}"),
            })
            .collect();
        assert_eq!(names, vec![b"Inner".to_vec(), b"Outer".to_vec()]);
    }

    #[test]
    fn test_struct_decode() {
        let data = input(&[
            b"S",
            &sym(b"Pair"),
            &long(2),
            &sym(b"a"),
            b"i",
            &long(1),
            &sym(b"b"),
            b"i",
            &long(2),
        ]);
        let (graph, root) = decode(&data).unwrap();
        match graph.get(root) {
            Some(Vertex::Struct { name, members, .. }) => {
                assert_eq!(graph.get(*name), Some(&Vertex::Symbol(b"Pair".to_vec())));
                assert_eq!(members.len(), 2);
            }
            other => panic!("expected struct, got {other:?}"),
        }
    }

    #[test]
    fn test_user_defined_payload() {
        let data = input(&[b"u", &sym(b"Blob"), &long(3), &[1, 2, 3]]);
        let (graph, root) = decode(&data).unwrap();
        match graph.get(root) {
            Some(Vertex::UserDefined { payload, .. }) => assert_eq!(payload, &[1, 2, 3]),
            other => panic!("expected user-defined, got {other:?}"),
        }
    }

    #[test]
    fn test_user_marshal_wrapper() {
        let data = input(&[b"U", &sym(b"Range"), b"[", &long(2), b"i", &long(1), b"i", &long(9)]);
        let (graph, root) = decode(&data).unwrap();
        match graph.get(root) {
            Some(Vertex::UserMarshal { class, inner, .. }) => {
                assert_eq!(graph.get(*class), Some(&Vertex::Symbol(b"Range".to_vec())));
                assert!(matches!(graph.get(*inner), Some(Vertex::Array { .. })));
            }
            other => panic!("expected user marshal, got {other:?}"),
        }
    }

    #[test]
    fn test_class_and_module_names() {
        let data = input(&[b"c", &long(3), b"Foo"]);
        let (graph, root) = decode(&data).unwrap();
        assert_eq!(graph.get(root), Some(&Vertex::ClassName(b"Foo".to_vec())));

        let data = input(&[b"m", &long(3), b"Bar"]);
        let (graph, root) = decode(&data).unwrap();
        assert_eq!(graph.get(root), Some(&Vertex::ModuleName(b"Bar".to_vec())));
    }

    #[test]
    fn test_object_ivar_name_must_be_symbol() {
        // Ivar name position holds a fixnum.
        let data = input(&[b"o", &sym(b"P"), &long(1), b"i", &long(1), b"0"]);
        assert!(matches!(
            decode(&data),
            Err(DecodeError::ExpectedSymbol { .. })
        ));
    }

    #[test]
    fn test_depth_limit() {
        // Deeply nested single-element arrays: [[[[...]]]]
        let mut data = vec![4u8, 8];
        for _ in 0..3000 {
            data.push(b'[');
            data.extend_from_slice(&long(1));
        }
        data.push(b'0');
        assert!(matches!(
            decode(&data),
            Err(DecodeError::DepthLimitExceeded { .. })
        ));
    }

    #[test]
    fn test_empty_input() {
        assert!(matches!(
            decode(&[]),
            Err(DecodeError::UnexpectedEof { offset: 0, .. })
        ));
        assert!(matches!(
            decode(&[4, 8]),
            Err(DecodeError::UnexpectedEof { offset: 2, .. })
        ));
    }
}
