//! Base type enumeration and the composite `Type` record.
//!
//! Per-type properties (scalar-ness, vector size, matrix dimensions,
//! opacity, component type) are pure table lookups used by the rewrite
//! engine and the optimizer.

use crate::qualifiers::Qualifiers;
use smallvec::SmallVec;
use std::fmt;

/// Dimensionality class of a sampler, used to pick the legacy
/// dimension-suffixed lookup function on downgrade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplerDim {
    D1,
    D2,
    D3,
    Cube,
    Rect,
    Buffer,
    Ms,
}

/// Every base type a declaration can carry. `Struct` and `InterfaceBlock`
/// get their name from the enclosing [`Type`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BaseType {
    Void,
    Bool,
    Int,
    Uint,
    Float,
    Double,
    BVec2,
    BVec3,
    BVec4,
    IVec2,
    IVec3,
    IVec4,
    UVec2,
    UVec3,
    UVec4,
    Vec2,
    Vec3,
    Vec4,
    DVec2,
    DVec3,
    DVec4,
    Mat2,
    Mat3,
    Mat4,
    Mat2x3,
    Mat2x4,
    Mat3x2,
    Mat3x4,
    Mat4x2,
    Mat4x3,
    DMat2,
    DMat3,
    DMat4,
    DMat2x3,
    DMat2x4,
    DMat3x2,
    DMat3x4,
    DMat4x2,
    DMat4x3,
    Sampler1D,
    Sampler2D,
    Sampler3D,
    SamplerCube,
    Sampler1DShadow,
    Sampler2DShadow,
    SamplerCubeShadow,
    Sampler1DArray,
    Sampler2DArray,
    Sampler1DArrayShadow,
    Sampler2DArrayShadow,
    SamplerCubeArray,
    SamplerCubeArrayShadow,
    Sampler2DRect,
    Sampler2DRectShadow,
    SamplerBuffer,
    Sampler2DMS,
    Sampler2DMSArray,
    ISampler1D,
    ISampler2D,
    ISampler3D,
    ISamplerCube,
    ISampler2DArray,
    USampler1D,
    USampler2D,
    USampler3D,
    USamplerCube,
    USampler2DArray,
    Image1D,
    Image2D,
    Image3D,
    ImageCube,
    Image2DArray,
    ImageBuffer,
    AtomicUint,
    Struct,
    InterfaceBlock,
}

impl BaseType {
    /// The GLSL keyword for this type; `None` for struct / block, which
    /// render their name instead.
    pub fn keyword(self) -> Option<&'static str> {
        use BaseType::*;
        Some(match self {
            Void => "void",
            Bool => "bool",
            Int => "int",
            Uint => "uint",
            Float => "float",
            Double => "double",
            BVec2 => "bvec2",
            BVec3 => "bvec3",
            BVec4 => "bvec4",
            IVec2 => "ivec2",
            IVec3 => "ivec3",
            IVec4 => "ivec4",
            UVec2 => "uvec2",
            UVec3 => "uvec3",
            UVec4 => "uvec4",
            Vec2 => "vec2",
            Vec3 => "vec3",
            Vec4 => "vec4",
            DVec2 => "dvec2",
            DVec3 => "dvec3",
            DVec4 => "dvec4",
            Mat2 => "mat2",
            Mat3 => "mat3",
            Mat4 => "mat4",
            Mat2x3 => "mat2x3",
            Mat2x4 => "mat2x4",
            Mat3x2 => "mat3x2",
            Mat3x4 => "mat3x4",
            Mat4x2 => "mat4x2",
            Mat4x3 => "mat4x3",
            DMat2 => "dmat2",
            DMat3 => "dmat3",
            DMat4 => "dmat4",
            DMat2x3 => "dmat2x3",
            DMat2x4 => "dmat2x4",
            DMat3x2 => "dmat3x2",
            DMat3x4 => "dmat3x4",
            DMat4x2 => "dmat4x2",
            DMat4x3 => "dmat4x3",
            Sampler1D => "sampler1D",
            Sampler2D => "sampler2D",
            Sampler3D => "sampler3D",
            SamplerCube => "samplerCube",
            Sampler1DShadow => "sampler1DShadow",
            Sampler2DShadow => "sampler2DShadow",
            SamplerCubeShadow => "samplerCubeShadow",
            Sampler1DArray => "sampler1DArray",
            Sampler2DArray => "sampler2DArray",
            Sampler1DArrayShadow => "sampler1DArrayShadow",
            Sampler2DArrayShadow => "sampler2DArrayShadow",
            SamplerCubeArray => "samplerCubeArray",
            SamplerCubeArrayShadow => "samplerCubeArrayShadow",
            Sampler2DRect => "sampler2DRect",
            Sampler2DRectShadow => "sampler2DRectShadow",
            SamplerBuffer => "samplerBuffer",
            Sampler2DMS => "sampler2DMS",
            Sampler2DMSArray => "sampler2DMSArray",
            ISampler1D => "isampler1D",
            ISampler2D => "isampler2D",
            ISampler3D => "isampler3D",
            ISamplerCube => "isamplerCube",
            ISampler2DArray => "isampler2DArray",
            USampler1D => "usampler1D",
            USampler2D => "usampler2D",
            USampler3D => "usampler3D",
            USamplerCube => "usamplerCube",
            USampler2DArray => "usampler2DArray",
            Image1D => "image1D",
            Image2D => "image2D",
            Image3D => "image3D",
            ImageCube => "imageCube",
            Image2DArray => "image2DArray",
            ImageBuffer => "imageBuffer",
            AtomicUint => "atomic_uint",
            Struct | InterfaceBlock => return None,
        })
    }

    /// Inverse of [`keyword`](Self::keyword); the lexer's type-keyword map.
    pub fn from_keyword(word: &str) -> Option<BaseType> {
        use BaseType::*;
        Some(match word {
            "void" => Void,
            "bool" => Bool,
            "int" => Int,
            "uint" => Uint,
            "float" => Float,
            "double" => Double,
            "bvec2" => BVec2,
            "bvec3" => BVec3,
            "bvec4" => BVec4,
            "ivec2" => IVec2,
            "ivec3" => IVec3,
            "ivec4" => IVec4,
            "uvec2" => UVec2,
            "uvec3" => UVec3,
            "uvec4" => UVec4,
            "vec2" => Vec2,
            "vec3" => Vec3,
            "vec4" => Vec4,
            "dvec2" => DVec2,
            "dvec3" => DVec3,
            "dvec4" => DVec4,
            "mat2" => Mat2,
            "mat3" => Mat3,
            "mat4" => Mat4,
            "mat2x2" => Mat2,
            "mat3x3" => Mat3,
            "mat4x4" => Mat4,
            "mat2x3" => Mat2x3,
            "mat2x4" => Mat2x4,
            "mat3x2" => Mat3x2,
            "mat3x4" => Mat3x4,
            "mat4x2" => Mat4x2,
            "mat4x3" => Mat4x3,
            "dmat2" => DMat2,
            "dmat3" => DMat3,
            "dmat4" => DMat4,
            "dmat2x3" => DMat2x3,
            "dmat2x4" => DMat2x4,
            "dmat3x2" => DMat3x2,
            "dmat3x4" => DMat3x4,
            "dmat4x2" => DMat4x2,
            "dmat4x3" => DMat4x3,
            "sampler1D" => Sampler1D,
            "sampler2D" => Sampler2D,
            "sampler3D" => Sampler3D,
            "samplerCube" => SamplerCube,
            "sampler1DShadow" => Sampler1DShadow,
            "sampler2DShadow" => Sampler2DShadow,
            "samplerCubeShadow" => SamplerCubeShadow,
            "sampler1DArray" => Sampler1DArray,
            "sampler2DArray" => Sampler2DArray,
            "sampler1DArrayShadow" => Sampler1DArrayShadow,
            "sampler2DArrayShadow" => Sampler2DArrayShadow,
            "samplerCubeArray" => SamplerCubeArray,
            "samplerCubeArrayShadow" => SamplerCubeArrayShadow,
            "sampler2DRect" => Sampler2DRect,
            "sampler2DRectShadow" => Sampler2DRectShadow,
            "samplerBuffer" => SamplerBuffer,
            "sampler2DMS" => Sampler2DMS,
            "sampler2DMSArray" => Sampler2DMSArray,
            "isampler1D" => ISampler1D,
            "isampler2D" => ISampler2D,
            "isampler3D" => ISampler3D,
            "isamplerCube" => ISamplerCube,
            "isampler2DArray" => ISampler2DArray,
            "usampler1D" => USampler1D,
            "usampler2D" => USampler2D,
            "usampler3D" => USampler3D,
            "usamplerCube" => USamplerCube,
            "usampler2DArray" => USampler2DArray,
            "image1D" => Image1D,
            "image2D" => Image2D,
            "image3D" => Image3D,
            "imageCube" => ImageCube,
            "image2DArray" => Image2DArray,
            "imageBuffer" => ImageBuffer,
            "atomic_uint" => AtomicUint,
            _ => return None,
        })
    }

    pub fn is_scalar(self) -> bool {
        matches!(
            self,
            BaseType::Bool | BaseType::Int | BaseType::Uint | BaseType::Float | BaseType::Double
        )
    }

    pub fn vector_size(self) -> Option<u8> {
        use BaseType::*;
        Some(match self {
            BVec2 | IVec2 | UVec2 | Vec2 | DVec2 => 2,
            BVec3 | IVec3 | UVec3 | Vec3 | DVec3 => 3,
            BVec4 | IVec4 | UVec4 | Vec4 | DVec4 => 4,
            _ => return None,
        })
    }

    pub fn is_vector(self) -> bool {
        self.vector_size().is_some()
    }

    /// (columns, rows) for matrix types.
    pub fn matrix_dims(self) -> Option<(u8, u8)> {
        use BaseType::*;
        Some(match self {
            Mat2 | DMat2 => (2, 2),
            Mat3 | DMat3 => (3, 3),
            Mat4 | DMat4 => (4, 4),
            Mat2x3 | DMat2x3 => (2, 3),
            Mat2x4 | DMat2x4 => (2, 4),
            Mat3x2 | DMat3x2 => (3, 2),
            Mat3x4 | DMat3x4 => (3, 4),
            Mat4x2 | DMat4x2 => (4, 2),
            Mat4x3 | DMat4x3 => (4, 3),
            _ => return None,
        })
    }

    pub fn is_matrix(self) -> bool {
        self.matrix_dims().is_some()
    }

    pub fn is_square_matrix(self) -> bool {
        matches!(self.matrix_dims(), Some((c, r)) if c == r)
    }

    pub fn is_sampler(self) -> bool {
        use BaseType::*;
        matches!(
            self,
            Sampler1D
                | Sampler2D
                | Sampler3D
                | SamplerCube
                | Sampler1DShadow
                | Sampler2DShadow
                | SamplerCubeShadow
                | Sampler1DArray
                | Sampler2DArray
                | Sampler1DArrayShadow
                | Sampler2DArrayShadow
                | SamplerCubeArray
                | SamplerCubeArrayShadow
                | Sampler2DRect
                | Sampler2DRectShadow
                | SamplerBuffer
                | Sampler2DMS
                | Sampler2DMSArray
                | ISampler1D
                | ISampler2D
                | ISampler3D
                | ISamplerCube
                | ISampler2DArray
                | USampler1D
                | USampler2D
                | USampler3D
                | USamplerCube
                | USampler2DArray
        )
    }

    pub fn is_image(self) -> bool {
        use BaseType::*;
        matches!(
            self,
            Image1D | Image2D | Image3D | ImageCube | Image2DArray | ImageBuffer
        )
    }

    /// Opaque types cannot be assigned or constructed.
    pub fn is_opaque(self) -> bool {
        self.is_sampler() || self.is_image() || self == BaseType::AtomicUint
    }

    pub fn sampler_dim(self) -> Option<SamplerDim> {
        use BaseType::*;
        Some(match self {
            Sampler1D | Sampler1DShadow | Sampler1DArray | Sampler1DArrayShadow | ISampler1D
            | USampler1D => SamplerDim::D1,
            Sampler2D | Sampler2DShadow | Sampler2DArray | Sampler2DArrayShadow | ISampler2D
            | USampler2D | ISampler2DArray | USampler2DArray => SamplerDim::D2,
            Sampler3D | ISampler3D | USampler3D => SamplerDim::D3,
            SamplerCube | SamplerCubeShadow | SamplerCubeArray | SamplerCubeArrayShadow
            | ISamplerCube | USamplerCube => SamplerDim::Cube,
            Sampler2DRect | Sampler2DRectShadow => SamplerDim::Rect,
            SamplerBuffer => SamplerDim::Buffer,
            Sampler2DMS | Sampler2DMSArray => SamplerDim::Ms,
            _ => return None,
        })
    }

    pub fn is_shadow_sampler(self) -> bool {
        use BaseType::*;
        matches!(
            self,
            Sampler1DShadow
                | Sampler2DShadow
                | SamplerCubeShadow
                | Sampler1DArrayShadow
                | Sampler2DArrayShadow
                | SamplerCubeArrayShadow
                | Sampler2DRectShadow
        )
    }

    /// Scalar component type of vectors and matrices (identity on scalars).
    pub fn component_type(self) -> BaseType {
        use BaseType::*;
        match self {
            BVec2 | BVec3 | BVec4 => Bool,
            IVec2 | IVec3 | IVec4 => Int,
            UVec2 | UVec3 | UVec4 => Uint,
            Vec2 | Vec3 | Vec4 => Float,
            DVec2 | DVec3 | DVec4 => Double,
            m if m.matrix_dims().is_some() => {
                if m.is_double_based() {
                    Double
                } else {
                    Float
                }
            }
            other => other,
        }
    }

    pub fn is_double_based(self) -> bool {
        use BaseType::*;
        matches!(
            self,
            Double
                | DVec2
                | DVec3
                | DVec4
                | DMat2
                | DMat3
                | DMat4
                | DMat2x3
                | DMat2x4
                | DMat3x2
                | DMat3x4
                | DMat4x2
                | DMat4x3
        )
    }

    /// The single-precision analogue of a double-based type, for the
    /// double-downgrade rewrite.
    pub fn single_precision_analogue(self) -> Option<BaseType> {
        use BaseType::*;
        Some(match self {
            Double => Float,
            DVec2 => Vec2,
            DVec3 => Vec3,
            DVec4 => Vec4,
            DMat2 => Mat2,
            DMat3 => Mat3,
            DMat4 => Mat4,
            DMat2x3 => Mat2x3,
            DMat2x4 => Mat2x4,
            DMat3x2 => Mat3x2,
            DMat3x4 => Mat3x4,
            DMat4x2 => Mat4x2,
            DMat4x3 => Mat4x3,
            _ => return None,
        })
    }
}

/// Algebraic type record: base, optional struct/block name, ordered array
/// dimensions (`-1` = unsized), and the qualifier record.
///
/// Equality compares base, name and dimensions only; two declarations of the
/// same shape with different qualifiers are the same type.
#[derive(Debug, Clone, Default)]
pub struct Type {
    pub base: BaseType,
    pub struct_name: Option<String>,
    pub array_dims: SmallVec<[i32; 2]>,
    pub qualifiers: Qualifiers,
}

impl Default for BaseType {
    fn default() -> Self {
        BaseType::Void
    }
}

impl Type {
    pub fn simple(base: BaseType) -> Self {
        Self {
            base,
            struct_name: None,
            array_dims: SmallVec::new(),
            qualifiers: Qualifiers::default(),
        }
    }

    pub fn named_struct(name: impl Into<String>) -> Self {
        Self {
            base: BaseType::Struct,
            struct_name: Some(name.into()),
            array_dims: SmallVec::new(),
            qualifiers: Qualifiers::default(),
        }
    }

    pub fn with_qualifiers(mut self, qualifiers: Qualifiers) -> Self {
        self.qualifiers = qualifiers;
        self
    }

    pub fn is_array(&self) -> bool {
        !self.array_dims.is_empty()
    }

    /// Display name: keyword for built-ins, declared name for structs/blocks.
    pub fn display_name(&self) -> &str {
        match self.base.keyword() {
            Some(kw) => kw,
            None => self.struct_name.as_deref().unwrap_or("<anonymous>"),
        }
    }
}

impl PartialEq for Type {
    fn eq(&self, other: &Self) -> bool {
        self.base == other.base
            && self.struct_name == other.struct_name
            && self.array_dims == other.array_dims
    }
}

impl Eq for Type {}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())?;
        for dim in &self.array_dims {
            if *dim < 0 {
                write!(f, "[]")?;
            } else {
                write!(f, "[{dim}]")?;
            }
        }
        Ok(())
    }
}
