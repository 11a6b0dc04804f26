//! Built-in function classification shared by the parser (call flags), the
//! rewrite engine (texture-call renames) and the optimizer (purity and
//! compile-time evaluation).

/// Pure one-argument math builtins the constant folder can evaluate.
pub const PURE_MATH_1: &[&str] = &[
    "abs", "sign", "floor", "ceil", "round", "trunc", "fract", "sin", "cos", "tan", "asin",
    "acos", "atan", "sinh", "cosh", "tanh", "exp", "log", "exp2", "log2", "sqrt", "inversesqrt",
    "radians", "degrees",
];

/// Pure two-argument math builtins.
pub const PURE_MATH_2: &[&str] = &[
    "pow", "mod", "min", "max", "atan", "step", "distance",
];

/// Pure three-argument math builtins.
pub const PURE_MATH_3: &[&str] = &["clamp", "mix", "smoothstep", "fma"];

/// Texture lookup functions, generic (1.30+) spelling.
pub const GENERIC_TEXTURE_FNS: &[&str] = &[
    "texture",
    "textureProj",
    "textureLod",
    "textureProjLod",
    "textureOffset",
    "textureGrad",
    "texelFetch",
    "textureSize",
];

/// Legacy dimension-suffixed lookup functions (< 1.30).
pub const LEGACY_TEXTURE_FNS: &[&str] = &[
    "texture1D",
    "texture1DProj",
    "texture1DLod",
    "texture1DProjLod",
    "texture2D",
    "texture2DProj",
    "texture2DLod",
    "texture2DProjLod",
    "texture3D",
    "texture3DProj",
    "texture3DLod",
    "texture3DProjLod",
    "textureCube",
    "textureCubeLod",
    "shadow1D",
    "shadow1DProj",
    "shadow1DLod",
    "shadow2D",
    "shadow2DProj",
    "shadow2DLod",
];

/// Is `name` in the pure math set the folder may evaluate? The arity the
/// call actually has still decides which table applies.
pub fn is_pure_math_builtin(name: &str) -> bool {
    PURE_MATH_1.contains(&name) || PURE_MATH_2.contains(&name) || PURE_MATH_3.contains(&name)
}

/// Builtins that are pure for side-effect analysis (they read nothing but
/// their arguments and bound textures, and write nothing).
pub fn is_pure_builtin(name: &str) -> bool {
    is_pure_math_builtin(name)
        || GENERIC_TEXTURE_FNS.contains(&name)
        || LEGACY_TEXTURE_FNS.contains(&name)
        || matches!(
            name,
            "dot" | "cross"
                | "normalize"
                | "length"
                | "reflect"
                | "refract"
                | "faceforward"
                | "transpose"
                | "inverse"
                | "determinant"
                | "outerProduct"
                | "matrixCompMult"
                | "lessThan"
                | "lessThanEqual"
                | "greaterThan"
                | "greaterThanEqual"
                | "equal"
                | "notEqual"
                | "any"
                | "all"
                | "not"
                | "floatBitsToInt"
                | "floatBitsToUint"
                | "intBitsToFloat"
                | "uintBitsToFloat"
                | "isnan"
                | "isinf"
        )
}

/// Everything the parser flags as `is_builtin` on a call node.
pub fn is_builtin_function(name: &str) -> bool {
    is_pure_builtin(name)
        || matches!(
            name,
            "dFdx"
                | "dFdy"
                | "fwidth"
                | "barrier"
                | "memoryBarrier"
                | "groupMemoryBarrier"
                | "imageLoad"
                | "imageStore"
                | "atomicAdd"
                | "atomicAnd"
                | "atomicOr"
                | "atomicXor"
                | "atomicMin"
                | "atomicMax"
                | "atomicExchange"
                | "atomicCompSwap"
                | "atomicCounter"
                | "atomicCounterIncrement"
                | "atomicCounterDecrement"
                | "EmitVertex"
                | "EndPrimitive"
        )
}
