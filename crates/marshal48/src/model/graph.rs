//! Reference-indexed arena holding the decoded object graph.
//!
//! Cycles and shared substructure are expressed through small integer
//! handles ([`Reference`]) instead of shared mutable pointers: a composite
//! vertex reserves its Object slot before its children decode, so a child
//! can legitimately link back to a not-yet-finished ancestor.

use std::fmt;

use rustc_hash::FxHashMap;

use crate::error::DecodeError;
use crate::model::Vertex;

/// One of the three disjoint reference namespaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    /// Atomic literals: nil, true, false, fixnums. Deduplicated.
    Value,
    /// Interned byte-string names. Deduplicated by content.
    Symbol,
    /// Every composite vertex. Never structurally deduplicated.
    Object,
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Namespace::Value => f.write_str("value"),
            Namespace::Symbol => f.write_str("symbol"),
            Namespace::Object => f.write_str("object"),
        }
    }
}

/// A (namespace, index) handle identifying one vertex without embedding it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Reference {
    pub namespace: Namespace,
    pub index: usize,
}

impl Reference {
    pub const fn new(namespace: Namespace, index: usize) -> Self {
        Self { namespace, index }
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.namespace, self.index)
    }
}

/// Key for the Value-namespace dedup map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum ValueKey {
    Nil,
    True,
    False,
    Fixnum(i64),
}

impl ValueKey {
    fn of(vertex: &Vertex) -> Option<Self> {
        match vertex {
            Vertex::Nil => Some(ValueKey::Nil),
            Vertex::True => Some(ValueKey::True),
            Vertex::False => Some(ValueKey::False),
            Vertex::Fixnum(n) => Some(ValueKey::Fixnum(*n)),
            _ => None,
        }
    }
}

/// The decoded object graph.
///
/// Built by a single decode pass; placeholder Object slots exist only during
/// construction and the graph is treated as immutable once the top-level
/// decode returns. Reverse lookup exists only for the deduplicated
/// namespaces.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Graph {
    values: Vec<Vertex>,
    symbols: Vec<Vertex>,
    objects: Vec<Option<Vertex>>,
    value_index: FxHashMap<ValueKey, usize>,
    symbol_index: FxHashMap<Vec<u8>, usize>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Namespace a vertex kind belongs to.
    pub fn namespace_of(vertex: &Vertex) -> Namespace {
        match vertex {
            Vertex::Nil | Vertex::True | Vertex::False | Vertex::Fixnum(_) => Namespace::Value,
            Vertex::Symbol(_) => Namespace::Symbol,
            _ => Namespace::Object,
        }
    }

    /// Reserves a placeholder Object slot and returns its reference.
    ///
    /// The slot must be filled with [`Graph::set`] before the decode
    /// finishes; a dangling placeholder is a contract violation surfaced by
    /// [`Graph::first_placeholder`].
    pub fn reserve(&mut self) -> Reference {
        let index = self.objects.len();
        self.objects.push(None);
        Reference::new(Namespace::Object, index)
    }

    /// Adds a vertex, deduplicating Value and Symbol kinds.
    pub fn add(&mut self, vertex: Vertex) -> Reference {
        match Self::namespace_of(&vertex) {
            Namespace::Value => {
                // Value keys cover exactly the Value-namespace kinds.
                let key = ValueKey::of(&vertex).unwrap_or(ValueKey::Nil);
                if let Some(&index) = self.value_index.get(&key) {
                    return Reference::new(Namespace::Value, index);
                }
                let index = self.values.len();
                self.values.push(vertex);
                self.value_index.insert(key, index);
                Reference::new(Namespace::Value, index)
            }
            Namespace::Symbol => {
                let Vertex::Symbol(bytes) = vertex else {
                    unreachable!("symbol namespace holds only symbol vertices");
                };
                if let Some(&index) = self.symbol_index.get(&bytes) {
                    return Reference::new(Namespace::Symbol, index);
                }
                let index = self.symbols.len();
                self.symbol_index.insert(bytes.clone(), index);
                self.symbols.push(Vertex::Symbol(bytes));
                Reference::new(Namespace::Symbol, index)
            }
            Namespace::Object => {
                let index = self.objects.len();
                self.objects.push(Some(vertex));
                Reference::new(Namespace::Object, index)
            }
        }
    }

    /// Fills a placeholder slot, or replaces an existing vertex when later
    /// parse steps augment a partially-built one.
    ///
    /// The vertex kind must match the namespace of the reference.
    pub fn set(&mut self, reference: Reference, vertex: Vertex) -> Result<(), DecodeError> {
        if Self::namespace_of(&vertex) != reference.namespace {
            return Err(DecodeError::NamespaceMismatch {
                namespace: reference.namespace,
                reference,
            });
        }
        match reference.namespace {
            Namespace::Value => {
                let len = self.values.len();
                let slot = self.values.get_mut(reference.index).ok_or(
                    DecodeError::LinkOutOfRange {
                        namespace: reference.namespace,
                        index: reference.index,
                        len,
                    },
                )?;
                *slot = vertex;
            }
            Namespace::Symbol => {
                let len = self.symbols.len();
                let slot = self.symbols.get_mut(reference.index).ok_or(
                    DecodeError::LinkOutOfRange {
                        namespace: reference.namespace,
                        index: reference.index,
                        len,
                    },
                )?;
                *slot = vertex;
            }
            Namespace::Object => {
                let len = self.objects.len();
                let slot = self.objects.get_mut(reference.index).ok_or(
                    DecodeError::LinkOutOfRange {
                        namespace: reference.namespace,
                        index: reference.index,
                        len,
                    },
                )?;
                *slot = Some(vertex);
            }
        }
        Ok(())
    }

    /// Direct indexed lookup. Yields `None` for an out-of-range index or a
    /// still-unfilled placeholder.
    pub fn get(&self, reference: Reference) -> Option<&Vertex> {
        match reference.namespace {
            Namespace::Value => self.values.get(reference.index),
            Namespace::Symbol => self.symbols.get(reference.index),
            Namespace::Object => self.objects.get(reference.index)?.as_ref(),
        }
    }

    /// Mutable lookup, used while attaching instance variables and mixins
    /// during decode.
    pub fn get_mut(&mut self, reference: Reference) -> Option<&mut Vertex> {
        match reference.namespace {
            Namespace::Value => self.values.get_mut(reference.index),
            Namespace::Symbol => self.symbols.get_mut(reference.index),
            Namespace::Object => self.objects.get_mut(reference.index)?.as_mut(),
        }
    }

    /// The root of the graph: the first Object reference if any object
    /// exists, else the sole Value/Symbol entry, else an error.
    pub fn root_ref(&self) -> Result<Reference, DecodeError> {
        if !self.objects.is_empty() {
            let root = Reference::new(Namespace::Object, 0);
            if self.objects[0].is_none() {
                return Err(DecodeError::GraphUnderConstruction);
            }
            return Ok(root);
        }
        match (self.values.len(), self.symbols.len()) {
            (1, 0) => Ok(Reference::new(Namespace::Value, 0)),
            (0, 1) => Ok(Reference::new(Namespace::Symbol, 0)),
            (0, 0) => Err(DecodeError::EmptyGraph),
            _ => Err(DecodeError::GraphUnderConstruction),
        }
    }

    /// Returns the first still-unfilled Object slot, if any.
    pub fn first_placeholder(&self) -> Option<Reference> {
        self.objects
            .iter()
            .position(Option::is_none)
            .map(|index| Reference::new(Namespace::Object, index))
    }

    /// Number of entries in a namespace.
    pub fn len(&self, namespace: Namespace) -> usize {
        match namespace {
            Namespace::Value => self.values.len(),
            Namespace::Symbol => self.symbols.len(),
            Namespace::Object => self.objects.len(),
        }
    }

    /// True if the graph holds no vertices at all.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty() && self.symbols.is_empty() && self.objects.is_empty()
    }
}
