//! Module-scope identifier registry.
//!
//! Every resolution owns one [`NameRegistry`]. It hands out identifiers that
//! are legal WGSL, never collide with each other, and never shadow a WGSL
//! keyword, predeclared type or built-in function.

use rustc_hash::{FxHashMap, FxHashSet};

use shaderweave_core::ResolveErrorKind;

/// WGSL keywords and reserved words. No identifier may spell these.
const KEYWORDS: &[&str] = &[
    // Keywords
    "alias", "break", "case", "const", "const_assert", "continue", "continuing", "default",
    "diagnostic", "discard", "else", "enable", "false", "fn", "for", "if", "let", "loop",
    "override", "requires", "return", "struct", "switch", "true", "var", "while",
    // Reserved words
    "NULL", "Self", "abstract", "active", "as", "async", "attribute", "auto", "await", "become",
    "cast", "catch", "class", "co_await", "co_return", "co_yield", "coherent", "const_cast",
    "constexpr", "constinit", "crate", "debugger", "decltype", "delete", "demote",
    "do", "dynamic_cast", "enum", "explicit", "export", "extends", "extern", "external",
    "fallthrough", "filter", "final", "finally", "friend", "from", "fxgroup", "get", "goto",
    "groupshared", "highp", "impl", "implements", "import", "inline", "instanceof",
    "interface", "layout", "lowp", "macro", "macro_rules", "match", "mediump", "meta", "mod",
    "module", "move", "mut", "mutable", "namespace", "new", "nil", "noexcept", "noinline",
    "nointerpolation", "non_coherent", "noncoherent", "noperspective", "null", "nullptr", "of",
    "operator", "package", "packoffset", "partition", "pass", "patch", "pixelfragment",
    "precise", "precision", "premerge", "priv", "protected", "pub", "public", "readonly", "ref",
    "regardless", "register", "reinterpret_cast", "require", "resource", "restrict", "self",
    "set", "shared", "sizeof", "smooth", "snorm", "static", "static_assert", "static_cast",
    "std", "subroutine", "super", "target", "template", "this", "thread_local", "throw",
    "trait", "try", "type", "typedef", "typeid", "typename", "typeof", "union", "unless",
    "unorm", "unsafe", "unsized", "use", "using", "varying", "virtual", "volatile", "wgsl",
    "where", "with", "writeonly", "yield",
];

/// Predeclared types and built-in functions. Module-scope names avoid them
/// so generated code never shadows the language.
const PREDECLARED: &[&str] = &[
    // Predeclared types
    "bool", "f16", "f32", "i32", "u32", "vec2", "vec3", "vec4", "vec2f", "vec3f", "vec4f",
    "vec2h", "vec3h", "vec4h", "vec2i", "vec3i", "vec4i", "vec2u", "vec3u", "vec4u", "mat2x2",
    "mat2x3", "mat2x4", "mat3x2", "mat3x3", "mat3x4", "mat4x2", "mat4x3", "mat4x4", "mat2x2f",
    "mat2x3f", "mat2x4f", "mat3x2f", "mat3x3f", "mat3x4f", "mat4x2f", "mat4x3f", "mat4x4f",
    "mat2x2h", "mat2x3h", "mat2x4h", "mat3x2h", "mat3x3h", "mat3x4h", "mat4x2h", "mat4x3h",
    "mat4x4h", "array", "atomic", "ptr", "sampler", "sampler_comparison", "texture_1d",
    "texture_2d", "texture_2d_array", "texture_3d", "texture_cube", "texture_cube_array",
    "texture_multisampled_2d", "texture_storage_2d", "texture_depth_2d",
    // Built-in functions
    "abs", "acos", "acosh", "all", "any", "arrayLength", "asin", "asinh", "atan", "atan2",
    "atanh", "atomicAdd", "atomicAnd", "atomicCompareExchangeWeak", "atomicExchange",
    "atomicLoad", "atomicMax", "atomicMin", "atomicOr", "atomicStore", "atomicSub", "atomicXor",
    "bitcast", "ceil", "clamp", "cos", "cosh", "countLeadingZeros", "countOneBits",
    "countTrailingZeros", "cross", "degrees", "determinant", "distance", "dot", "dpdx", "dpdy",
    "exp", "exp2", "extractBits", "faceForward", "firstLeadingBit", "firstTrailingBit", "floor",
    "fma", "fract", "frexp", "fwidth", "insertBits", "inverseSqrt", "ldexp", "length", "log",
    "log2", "max", "min", "mix", "modf", "normalize", "pack2x16float", "pack4x8snorm",
    "pack4x8unorm", "pow", "quantizeToF16", "radians", "reflect", "refract", "reverseBits",
    "round", "saturate", "select", "sign", "sin", "sinh", "smoothstep", "sqrt", "step",
    "storageBarrier", "tan", "tanh", "textureDimensions", "textureLoad", "textureSample",
    "textureSampleLevel", "textureStore", "transpose", "trunc", "unpack2x16float",
    "unpack4x8snorm", "unpack4x8unorm", "workgroupBarrier",
];

/// Check if `name` is claimed by the language itself.
pub fn is_reserved(name: &str) -> bool {
    KEYWORDS.contains(&name) || PREDECLARED.contains(&name)
}

/// Check if `name` can be written verbatim as an identifier, e.g. a struct
/// member. Predeclared names are allowed since members cannot shadow them.
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first.is_ascii_alphabetic() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        && name != "_"
        && !name.starts_with("__")
        && !KEYWORDS.contains(&name)
}

/// Turn an arbitrary label into a legal WGSL identifier.
///
/// Characters outside `[A-Za-z0-9_]` become `_`, leading underscores are
/// dropped (WGSL rejects `_` and anything starting with `__`), and a leading
/// digit gets a `_` prefix. Returns `fallback` when nothing usable is left.
pub fn sanitize(label: &str, fallback: &str) -> String {
    let mapped: String = label
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    let trimmed = mapped.trim_start_matches('_');
    match trimmed.chars().next() {
        None => fallback.to_string(),
        Some(c) if c.is_ascii_digit() => format!("_{trimmed}"),
        Some(_) => trimmed.to_string(),
    }
}

/// Identifiers assigned within one resolution.
#[derive(Debug, Default)]
pub struct NameRegistry {
    taken: FxHashSet<String>,
    /// Last suffix tried per base name, so repeated bases stay linear.
    counters: FxHashMap<String, u32>,
}

impl NameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if `name` is reserved or already assigned.
    pub fn is_taken(&self, name: &str) -> bool {
        is_reserved(name) || self.taken.contains(name)
    }

    /// Assign a fresh identifier derived from `base`.
    ///
    /// `base` must already be sanitized. The first request for a base gets it
    /// unchanged; later ones get `base_1`, `base_2`, and so on.
    pub fn assign(&mut self, base: &str) -> Result<String, ResolveErrorKind> {
        let mut candidate = base.to_string();
        if self.is_taken(&candidate) {
            let counter = self.counters.entry(base.to_string()).or_insert(0);
            loop {
                *counter += 1;
                candidate = format!("{base}_{counter}");
                if !(is_reserved(&candidate) || self.taken.contains(&candidate)) {
                    break;
                }
            }
        }
        self.claim(candidate)
    }

    /// Record `name` as assigned.
    ///
    /// Fails with `NameCollision` if it already was; `assign` never lets that
    /// happen, so seeing this error means the registry's bookkeeping is broken.
    pub fn claim(&mut self, name: String) -> Result<String, ResolveErrorKind> {
        if self.taken.insert(name.clone()) {
            Ok(name)
        } else {
            Err(ResolveErrorKind::NameCollision { name })
        }
    }

    /// Number of assigned identifiers.
    pub fn len(&self) -> usize {
        self.taken.len()
    }

    pub fn is_empty(&self) -> bool {
        self.taken.is_empty()
    }
}
