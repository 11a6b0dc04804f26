use crate::Version;
use regex::Regex;
use std::sync::OnceLock;
use tracing::debug;

/// Determine the source version of a shader.
///
/// Scans past leading whitespace and comments for a `#version` directive and
/// returns the named version. Without a directive, falls back to vocabulary
/// inference: modern keywords pick 3.30, legacy vocabulary picks 1.10, and
/// the overall default is 1.10.
pub fn detect_version(source: &str) -> Version {
    if let Some(v) = directive_version(source) {
        debug!(target: "catalog", version = v.code(), "version_from_directive");
        return v;
    }
    let inferred = infer_from_vocabulary(source);
    debug!(target: "catalog", version = inferred.code(), "version_inferred");
    inferred
}

/// Parse the `#version` directive if one is the first meaningful content.
fn directive_version(source: &str) -> Option<Version> {
    let bytes = source.as_bytes();
    let mut i = 0;
    // Skip whitespace and comments preceding the first directive.
    loop {
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if bytes[i..].starts_with(b"//") {
            while i < bytes.len() && bytes[i] != b'\n' {
                i += 1;
            }
            continue;
        }
        if bytes[i..].starts_with(b"/*") {
            i += 2;
            while i < bytes.len() && !bytes[i..].starts_with(b"*/") {
                i += 1;
            }
            i = (i + 2).min(bytes.len());
            continue;
        }
        break;
    }
    if i >= bytes.len() || bytes[i] != b'#' {
        return None;
    }
    i += 1;
    while i < bytes.len() && (bytes[i] == b' ' || bytes[i] == b'\t') {
        i += 1;
    }
    let rest = &source[i..];
    let rest = rest.strip_prefix("version")?;
    let digits: String = rest
        .trim_start_matches([' ', '\t'])
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    let code: u16 = digits.parse().ok()?;
    Version::from_code(code).or_else(|| Version::nearest_at_most(code))
}

fn infer_from_vocabulary(source: &str) -> Version {
    let modern = source.contains("layout(")
        || source.contains("layout (")
        || source.contains("flat ")
        || has_generic_texture_call(source);
    if modern {
        return Version::V330;
    }
    // Legacy vocabulary and the absence of everything both land on 1.10.
    Version::V110
}

/// `texture(` that is not a prefix of `texture2D(` / `textureCube(` etc.
fn has_generic_texture_call(source: &str) -> bool {
    let mut rest = source;
    while let Some(pos) = rest.find("texture") {
        let after = &rest[pos + "texture".len()..];
        if after.starts_with('(') {
            return true;
        }
        rest = after;
    }
    false
}

/// Tolerantly extract a version from a driver string like `"4.60 NVIDIA"`.
///
/// Takes the first `major.minor` pair and clamps it down to the nearest
/// catalogued version, so `"4.65 vendor build"` maps to 4.60.
pub fn parse_driver_string(s: &str) -> Option<Version> {
    static PAT: OnceLock<Regex> = OnceLock::new();
    let re = PAT.get_or_init(|| Regex::new(r"(\d+)\.(\d{1,2})").expect("static pattern"));
    let caps = re.captures(s)?;
    let major: u16 = caps[1].parse().ok()?;
    let minor_str = &caps[2];
    let minor: u16 = minor_str.parse().ok()?;
    // "4.6" and "4.60" both mean minor 60.
    let minor = if minor_str.len() == 1 { minor * 10 } else { minor };
    let code = major.checked_mul(100)?.checked_add(minor)?;
    Version::from_code(code).or_else(|| Version::nearest_at_most(code))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn directive_wins() {
        let src = "#version 330 core\nvoid main() {}\n";
        assert_eq!(detect_version(src), Version::V330);
    }

    #[test]
    fn directive_after_comments_and_whitespace() {
        let src = "\n  // preamble\n/* block\n comment */  #version 150\nvoid main() {}\n";
        assert_eq!(detect_version(src), Version::V150);
    }

    #[test]
    fn unknown_code_clamps_down() {
        assert_eq!(detect_version("#version 320\nvoid main(){}"), Version::V150);
    }

    #[test]
    fn modern_vocabulary_infers_330() {
        let src = "layout(location = 0) in vec3 pos;\nvoid main() {}\n";
        assert_eq!(detect_version(src), Version::V330);
        let tex = "uniform sampler2D t; void main() { vec4 c = texture(t, uv); }";
        assert_eq!(detect_version(tex), Version::V330);
    }

    #[test]
    fn legacy_texture_call_does_not_look_modern() {
        let src = "uniform sampler2D t; varying vec2 uv; void main() { gl_FragColor = texture2D(t, uv); }";
        assert_eq!(detect_version(src), Version::V110);
    }

    #[test]
    fn empty_source_defaults_to_110() {
        assert_eq!(detect_version(""), Version::V110);
    }

    #[test]
    fn driver_strings() {
        assert_eq!(parse_driver_string("4.60 NVIDIA 551.23"), Some(Version::V460));
        assert_eq!(parse_driver_string("3.3"), Some(Version::V330));
        assert_eq!(parse_driver_string("OpenGL ES GLSL ES 1.20"), Some(Version::V120));
        assert_eq!(parse_driver_string("4.65 vendor"), Some(Version::V460));
        assert_eq!(parse_driver_string("no digits here"), None);
    }
}
