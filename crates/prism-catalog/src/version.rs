use std::fmt;

/// A GLSL language revision, ordered by its numeric code (110..=460).
///
/// Comparison goes through the code, never through table position, so adding
/// a version to the catalog cannot change ordering semantics.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version(u16);

impl Version {
    pub const V110: Version = Version(110);
    pub const V120: Version = Version(120);
    pub const V130: Version = Version(130);
    pub const V140: Version = Version(140);
    pub const V150: Version = Version(150);
    pub const V330: Version = Version(330);
    pub const V400: Version = Version(400);
    pub const V410: Version = Version(410);
    pub const V420: Version = Version(420);
    pub const V430: Version = Version(430);
    pub const V440: Version = Version(440);
    pub const V450: Version = Version(450);
    pub const V460: Version = Version(460);

    /// All catalogued versions in ascending order.
    pub const ALL: [Version; 13] = [
        Self::V110,
        Self::V120,
        Self::V130,
        Self::V140,
        Self::V150,
        Self::V330,
        Self::V400,
        Self::V410,
        Self::V420,
        Self::V430,
        Self::V440,
        Self::V450,
        Self::V460,
    ];

    /// Exact lookup by numeric code.
    pub fn from_code(code: u16) -> Option<Version> {
        Self::ALL.iter().copied().find(|v| v.0 == code)
    }

    /// Greatest catalogued version whose code is <= `code`. Used when a
    /// driver reports something like `405`; returns `None` below 110.
    pub fn nearest_at_most(code: u16) -> Option<Version> {
        Self::ALL.iter().copied().rev().find(|v| v.0 <= code)
    }

    pub const fn code(self) -> u16 {
        self.0
    }

    /// Human form, e.g. `"3.30"`.
    pub fn as_str(self) -> &'static str {
        match self.0 {
            110 => "1.10",
            120 => "1.20",
            130 => "1.30",
            140 => "1.40",
            150 => "1.50",
            330 => "3.30",
            400 => "4.00",
            410 => "4.10",
            420 => "4.20",
            430 => "4.30",
            440 => "4.40",
            450 => "4.50",
            460 => "4.60",
            _ => unreachable!("constructed outside the catalog"),
        }
    }

    /// Whether a `#version NNN` directive for this version names a profile.
    /// Profiles exist from 1.50 onward; we always emit `core` there.
    pub const fn has_profile(self) -> bool {
        self.0 >= 150
    }

    /// Versions below 1.30 use the legacy attribute/varying vocabulary.
    pub const fn is_legacy(self) -> bool {
        self.0 < 130
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Version({})", self.0)
    }
}

/// The six programmable pipeline stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Vertex,
    Fragment,
    Geometry,
    TessControl,
    TessEval,
    Compute,
}

impl Stage {
    /// First version in which the stage exists at all.
    pub const fn minimum_version(self) -> Version {
        match self {
            Stage::Vertex | Stage::Fragment => Version::V110,
            Stage::Geometry => Version::V150,
            Stage::TessControl | Stage::TessEval => Version::V400,
            Stage::Compute => Version::V430,
        }
    }

    /// Stable ordinal used by the disk-cache header format.
    pub const fn ordinal(self) -> u8 {
        match self {
            Stage::Vertex => 0,
            Stage::Fragment => 1,
            Stage::Geometry => 2,
            Stage::TessControl => 3,
            Stage::TessEval => 4,
            Stage::Compute => 5,
        }
    }

    pub fn from_ordinal(ord: u8) -> Option<Stage> {
        Some(match ord {
            0 => Stage::Vertex,
            1 => Stage::Fragment,
            2 => Stage::Geometry,
            3 => Stage::TessControl,
            4 => Stage::TessEval,
            5 => Stage::Compute,
            _ => return None,
        })
    }

    pub const fn name(self) -> &'static str {
        match self {
            Stage::Vertex => "vertex",
            Stage::Fragment => "fragment",
            Stage::Geometry => "geometry",
            Stage::TessControl => "tess-control",
            Stage::TessEval => "tess-eval",
            Stage::Compute => "compute",
        }
    }

    /// Parse the CLI / config spelling (accepts a few common aliases).
    pub fn parse(s: &str) -> Option<Stage> {
        Some(match s {
            "vertex" | "vert" | "vs" => Stage::Vertex,
            "fragment" | "frag" | "fs" => Stage::Fragment,
            "geometry" | "geom" | "gs" => Stage::Geometry,
            "tess-control" | "tesc" => Stage::TessControl,
            "tess-eval" | "tese" => Stage::TessEval,
            "compute" | "comp" | "cs" => Stage::Compute,
            _ => return None,
        })
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
