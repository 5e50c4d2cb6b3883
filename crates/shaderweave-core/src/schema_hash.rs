//! Deterministic structural fingerprints for schemas.
//!
//! [`SchemaHash`] identifies a [`DataSchema`] by its shape. Two schemas built
//! independently with the same structure (and the same labels) hash equal,
//! which lets the resolver emit one declaration per distinct struct and the
//! layout cache share results between identical schemas.
//!
//! # Hash Computation
//!
//! Uses XXHash64, chaining each component into the seed of the next, with
//! domain-specific constants per schema variant so that, for example, an
//! `array<f32, 3>` and a `vec3<f32>` can never collide by construction.
//!
//! # Examples
//!
//! ```
//! use shaderweave_core::{DataSchema, SchemaHash};
//!
//! let a = SchemaHash::of(&DataSchema::array(DataSchema::f32(), 4));
//! let b = SchemaHash::of(&DataSchema::array(DataSchema::f32(), 4));
//! assert_eq!(a, b);
//!
//! let c = SchemaHash::of(&DataSchema::array(DataSchema::f32(), 5));
//! assert_ne!(a, c);
//! ```

use std::fmt;

use rustc_hash::FxHashMap;
use xxhash_rust::xxh64::xxh64;

use crate::schema::{ArrayLength, DataSchema, Decorations};

/// Domain-specific mixing constants for hash computation.
pub mod hash_constants {
    /// Domain marker for scalar schemas
    pub const SCALAR: u64 = 0x2fac10b63a6cc57c;

    /// Domain marker for vector schemas
    pub const VECTOR: u64 = 0x5ea77ffbcdf5f302;

    /// Domain marker for matrix schemas
    pub const MATRIX: u64 = 0x7d3c8b4a92e15f6d;

    /// Domain marker for fixed-length arrays
    pub const ARRAY: u64 = 0x3e9f5d2a8c7b1403;

    /// Domain marker for runtime-length arrays
    pub const RUNTIME_ARRAY: u64 = 0x9a7f3d5e2b8c4601;

    /// Domain marker for structs
    pub const STRUCT: u64 = 0x1a095090689d4647;

    /// Domain marker for struct fields
    pub const FIELD: u64 = 0x4bc94d6bd06053ad;

    /// Domain marker for atomics
    pub const ATOMIC: u64 = 0xbf58476d1ce4e5b9;

    /// Domain marker for decorated schemas
    pub const DECORATED: u64 = 0x94d049bb133111eb;

    /// Marker mixed in for an absent optional component
    pub const NONE: u64 = 0xd6e8feb86659fd93;
}

/// A deterministic 64-bit structural hash of a schema.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct SchemaHash(pub u64);

impl SchemaHash {
    /// Empty/invalid hash constant.
    pub const EMPTY: SchemaHash = SchemaHash(0);

    /// Hash a schema by structure.
    pub fn of(schema: &DataSchema) -> Self {
        use hash_constants::*;

        match schema {
            DataSchema::Scalar(kind) => SchemaHash(SCALAR).mix(u8::from(*kind) as u64),
            DataSchema::Vector(size, kind) => SchemaHash(VECTOR)
                .mix(u8::from(*size) as u64)
                .mix(u8::from(*kind) as u64),
            DataSchema::Matrix {
                columns,
                rows,
                component,
            } => SchemaHash(MATRIX)
                .mix(u8::from(*columns) as u64)
                .mix(u8::from(*rows) as u64)
                .mix(u8::from(*component) as u64),
            DataSchema::Array(array) => {
                let element = Self::of(&array.element).0;
                match array.length {
                    ArrayLength::Fixed(n) => SchemaHash(ARRAY).mix(element).mix(n as u64),
                    ArrayLength::Runtime => SchemaHash(RUNTIME_ARRAY).mix(element),
                }
            }
            DataSchema::Struct(s) => {
                let label = s
                    .label
                    .as_deref()
                    .map_or(NONE, |label| xxh64(label.as_bytes(), 0));
                s.fields.iter().fold(
                    SchemaHash(STRUCT).mix(label).mix(s.fields.len() as u64),
                    |hash, field| {
                        hash.mix(FIELD ^ xxh64(field.name.as_bytes(), 0))
                            .mix(Self::of(&field.schema).0)
                    },
                )
            }
            DataSchema::Atomic(kind) => SchemaHash(ATOMIC).mix(u8::from(*kind) as u64),
            DataSchema::Decorated(d) => {
                Self::mix_decorations(SchemaHash(DECORATED).mix(Self::of(&d.inner).0), &d.decorations)
            }
        }
    }

    fn mix_decorations(hash: SchemaHash, decorations: &Decorations) -> Self {
        let optional = |value: Option<u32>| value.map_or(hash_constants::NONE, |v| v as u64);
        hash.mix(optional(decorations.align))
            .mix(optional(decorations.size))
            .mix(optional(decorations.stride))
            .mix(optional(decorations.location))
            .mix(
                decorations
                    .builtin
                    .map_or(hash_constants::NONE, |b| u8::from(b) as u64),
            )
    }

    /// Chain `value` into this hash.
    #[inline]
    fn mix(self, value: u64) -> Self {
        SchemaHash(xxh64(&value.to_le_bytes(), self.0))
    }
}

impl fmt::Debug for SchemaHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SchemaHash(0x{:016x})", self.0)
    }
}

impl fmt::Display for SchemaHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

// ============================================================================
// Schema-keyed Map
// ============================================================================

/// A map from schemas to values, bucketed by [`SchemaHash`].
///
/// Lookups hash the schema once and then compare structurally inside the
/// bucket, so two different schemas never share an entry even if their
/// fingerprints collide.
#[derive(Debug, Clone)]
pub struct SchemaMap<V> {
    buckets: FxHashMap<SchemaHash, Vec<(DataSchema, V)>>,
    len: usize,
}

impl<V> Default for SchemaMap<V> {
    fn default() -> Self {
        Self {
            buckets: FxHashMap::default(),
            len: 0,
        }
    }
}

impl<V> SchemaMap<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, schema: &DataSchema) -> Option<&V> {
        self.buckets
            .get(&SchemaHash::of(schema))?
            .iter()
            .find(|(key, _)| key == schema)
            .map(|(_, value)| value)
    }

    pub fn contains(&self, schema: &DataSchema) -> bool {
        self.get(schema).is_some()
    }

    /// Insert or replace the value for `schema`.
    pub fn insert(&mut self, schema: DataSchema, value: V) {
        let bucket = self.buckets.entry(SchemaHash::of(&schema)).or_default();
        match bucket.iter_mut().find(|(key, _)| *key == schema) {
            Some((_, existing)) => *existing = value,
            None => {
                bucket.push((schema, value));
                self.len += 1;
            }
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}
