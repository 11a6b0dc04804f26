//! Storage / interpolation / precision / memory qualifiers and the layout
//! record attached to declarations.

use bitflags::bitflags;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum StorageQualifier {
    #[default]
    None,
    Const,
    In,
    Out,
    InOut,
    Uniform,
    Buffer,
    Shared,
    /// Legacy vertex input (< 1.30).
    Attribute,
    /// Legacy stage-to-stage interpolant (< 1.30).
    Varying,
}

impl StorageQualifier {
    pub fn keyword(self) -> Option<&'static str> {
        Some(match self {
            StorageQualifier::None => return None,
            StorageQualifier::Const => "const",
            StorageQualifier::In => "in",
            StorageQualifier::Out => "out",
            StorageQualifier::InOut => "inout",
            StorageQualifier::Uniform => "uniform",
            StorageQualifier::Buffer => "buffer",
            StorageQualifier::Shared => "shared",
            StorageQualifier::Attribute => "attribute",
            StorageQualifier::Varying => "varying",
        })
    }

    /// Interface storage classes the optimizer must never remove, even when
    /// the shader text itself has no remaining reference.
    pub fn is_external_interface(self) -> bool {
        matches!(
            self,
            StorageQualifier::In
                | StorageQualifier::Out
                | StorageQualifier::Uniform
                | StorageQualifier::Buffer
                | StorageQualifier::Shared
                | StorageQualifier::Attribute
                | StorageQualifier::Varying
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum InterpolationQualifier {
    #[default]
    None,
    Flat,
    Smooth,
    NoPerspective,
}

impl InterpolationQualifier {
    pub fn keyword(self) -> Option<&'static str> {
        Some(match self {
            InterpolationQualifier::None => return None,
            InterpolationQualifier::Flat => "flat",
            InterpolationQualifier::Smooth => "smooth",
            InterpolationQualifier::NoPerspective => "noperspective",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum PrecisionQualifier {
    #[default]
    None,
    HighP,
    MediumP,
    LowP,
}

impl PrecisionQualifier {
    pub fn keyword(self) -> Option<&'static str> {
        Some(match self {
            PrecisionQualifier::None => return None,
            PrecisionQualifier::HighP => "highp",
            PrecisionQualifier::MediumP => "mediump",
            PrecisionQualifier::LowP => "lowp",
        })
    }
}

bitflags! {
    /// Independent boolean qualifier bits.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct QualifierFlags: u16 {
        const CENTROID  = 1 << 0;
        const SAMPLE    = 1 << 1;
        const PATCH     = 1 << 2;
        const INVARIANT = 1 << 3;
        const PRECISE   = 1 << 4;
        const COHERENT  = 1 << 5;
        const VOLATILE  = 1 << 6;
        const RESTRICT  = 1 << 7;
        const READONLY  = 1 << 8;
        const WRITEONLY = 1 << 9;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutPacking {
    Shared,
    Packed,
    Std140,
    Std430,
}

impl LayoutPacking {
    pub fn keyword(self) -> &'static str {
        match self {
            LayoutPacking::Shared => "shared",
            LayoutPacking::Packed => "packed",
            LayoutPacking::Std140 => "std140",
            LayoutPacking::Std430 => "std430",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatrixLayout {
    RowMajor,
    ColumnMajor,
}

impl MatrixLayout {
    pub fn keyword(self) -> &'static str {
        match self {
            MatrixLayout::RowMajor => "row_major",
            MatrixLayout::ColumnMajor => "column_major",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepthHint {
    Any,
    Greater,
    Less,
    Unchanged,
}

impl DepthHint {
    pub fn keyword(self) -> &'static str {
        match self {
            DepthHint::Any => "depth_any",
            DepthHint::Greater => "depth_greater",
            DepthHint::Less => "depth_less",
            DepthHint::Unchanged => "depth_unchanged",
        }
    }
}

/// Parsed `layout(...)` contents. Unrecognized keys land in `other` and are
/// re-emitted verbatim so unknown vendor qualifiers survive a round trip.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayoutRecord {
    pub location: Option<i32>,
    pub binding: Option<i32>,
    pub offset: Option<i32>,
    pub component: Option<i32>,
    pub index: Option<i32>,
    pub set: Option<i32>,
    pub local_size_x: Option<i32>,
    pub local_size_y: Option<i32>,
    pub local_size_z: Option<i32>,
    pub max_vertices: Option<i32>,
    pub vertices: Option<i32>,
    pub invocations: Option<i32>,
    pub packing: Option<LayoutPacking>,
    pub matrix_layout: Option<MatrixLayout>,
    pub origin_upper_left: bool,
    pub pixel_center_integer: bool,
    pub early_fragment_tests: bool,
    pub depth_hint: Option<DepthHint>,
    pub primitive_type: Option<String>,
    pub image_format: Option<String>,
    pub other: Vec<(String, Option<i32>)>,
}

impl LayoutRecord {
    /// Record one `key` or `key = value` pair from the parser.
    pub fn set(&mut self, key: &str, value: Option<i32>) {
        match key {
            "location" => self.location = value,
            "binding" => self.binding = value,
            "offset" => self.offset = value,
            "component" => self.component = value,
            "index" => self.index = value,
            "set" => self.set = value,
            "local_size_x" => self.local_size_x = value,
            "local_size_y" => self.local_size_y = value,
            "local_size_z" => self.local_size_z = value,
            "max_vertices" => self.max_vertices = value,
            "vertices" => self.vertices = value,
            "invocations" => self.invocations = value,
            "shared" => self.packing = Some(LayoutPacking::Shared),
            "packed" => self.packing = Some(LayoutPacking::Packed),
            "std140" => self.packing = Some(LayoutPacking::Std140),
            "std430" => self.packing = Some(LayoutPacking::Std430),
            "row_major" => self.matrix_layout = Some(MatrixLayout::RowMajor),
            "column_major" => self.matrix_layout = Some(MatrixLayout::ColumnMajor),
            "origin_upper_left" => self.origin_upper_left = true,
            "pixel_center_integer" => self.pixel_center_integer = true,
            "early_fragment_tests" => self.early_fragment_tests = true,
            "depth_any" => self.depth_hint = Some(DepthHint::Any),
            "depth_greater" => self.depth_hint = Some(DepthHint::Greater),
            "depth_less" => self.depth_hint = Some(DepthHint::Less),
            "depth_unchanged" => self.depth_hint = Some(DepthHint::Unchanged),
            "points" | "lines" | "lines_adjacency" | "triangles" | "triangles_adjacency"
            | "line_strip" | "triangle_strip" | "quads" | "isolines" | "equal_spacing"
            | "fractional_even_spacing" | "fractional_odd_spacing" | "cw" | "ccw"
            | "point_mode" => self.primitive_type = Some(key.to_owned()),
            "rgba32f" | "rgba16f" | "rg32f" | "rg16f" | "r32f" | "r16f" | "rgba8"
            | "rgba8_snorm" | "r8" | "rgba32i" | "rgba16i" | "rgba8i" | "r32i" | "rgba32ui"
            | "rgba16ui" | "rgba8ui" | "r32ui" => self.image_format = Some(key.to_owned()),
            _ => self.other.push((key.to_owned(), value)),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == LayoutRecord::default()
    }

    /// Canonically ordered `key` / `key = value` pairs for emission.
    pub fn entries(&self) -> Vec<(String, Option<i32>)> {
        let mut out = Vec::new();
        if let Some(p) = self.packing {
            out.push((p.keyword().to_owned(), None));
        }
        if let Some(m) = self.matrix_layout {
            out.push((m.keyword().to_owned(), None));
        }
        if let Some(p) = &self.primitive_type {
            out.push((p.clone(), None));
        }
        if let Some(f) = &self.image_format {
            out.push((f.clone(), None));
        }
        for (key, v) in [
            ("location", self.location),
            ("component", self.component),
            ("index", self.index),
            ("set", self.set),
            ("binding", self.binding),
            ("offset", self.offset),
            ("local_size_x", self.local_size_x),
            ("local_size_y", self.local_size_y),
            ("local_size_z", self.local_size_z),
            ("max_vertices", self.max_vertices),
            ("vertices", self.vertices),
            ("invocations", self.invocations),
        ] {
            if let Some(v) = v {
                out.push((key.to_owned(), Some(v)));
            }
        }
        if self.origin_upper_left {
            out.push(("origin_upper_left".to_owned(), None));
        }
        if self.pixel_center_integer {
            out.push(("pixel_center_integer".to_owned(), None));
        }
        if self.early_fragment_tests {
            out.push(("early_fragment_tests".to_owned(), None));
        }
        if let Some(d) = self.depth_hint {
            out.push((d.keyword().to_owned(), None));
        }
        out.extend(self.other.iter().cloned());
        out
    }
}

/// Full qualifier record carried by [`crate::Type`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Qualifiers {
    pub storage: StorageQualifier,
    pub interpolation: InterpolationQualifier,
    pub precision: PrecisionQualifier,
    pub flags: QualifierFlags,
    pub layout: Option<LayoutRecord>,
}

impl Qualifiers {
    pub fn is_default(&self) -> bool {
        *self == Qualifiers::default()
    }

    pub fn storage(storage: StorageQualifier) -> Self {
        Self {
            storage,
            ..Self::default()
        }
    }

    pub fn layout(&self) -> Option<&LayoutRecord> {
        self.layout.as_ref()
    }

    /// Layout record, created on first use.
    pub fn layout_mut(&mut self) -> &mut LayoutRecord {
        self.layout.get_or_insert_with(LayoutRecord::default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_set_routes_known_keys() {
        let mut l = LayoutRecord::default();
        l.set("location", Some(3));
        l.set("std140", None);
        l.set("row_major", None);
        l.set("triangles", None);
        l.set("rgba32f", None);
        l.set("vendor_magic", Some(7));
        assert_eq!(l.location, Some(3));
        assert_eq!(l.packing, Some(LayoutPacking::Std140));
        assert_eq!(l.matrix_layout, Some(MatrixLayout::RowMajor));
        assert_eq!(l.primitive_type.as_deref(), Some("triangles"));
        assert_eq!(l.image_format.as_deref(), Some("rgba32f"));
        assert_eq!(l.other, vec![("vendor_magic".to_owned(), Some(7))]);
    }

    #[test]
    fn entries_order_is_stable() {
        let mut l = LayoutRecord::default();
        l.set("binding", Some(1));
        l.set("location", Some(0));
        l.set("std430", None);
        let keys: Vec<String> = l.entries().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, ["std430", "location", "binding"]);
    }

    #[test]
    fn default_layout_is_empty() {
        assert!(LayoutRecord::default().is_empty());
        let mut l = LayoutRecord::default();
        l.set("early_fragment_tests", None);
        assert!(!l.is_empty());
    }
}
