//! Dot-separated JSON paths such as `totals.files[0].percent`.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

/// A single step of a [`JsonPath`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// An object key
    Key(String),
    /// An array index
    Index(usize),
}

/// A validated path into a JSON payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonPath {
    raw: String,
    segments: Vec<PathSegment>,
}

static SEGMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Za-z0-9_-]+)((?:\[[0-9]+\])*)$").unwrap());

impl JsonPath {
    /// Parse a path, returning a reason on malformed input.
    ///
    /// Each dot-separated part is a bare key of letters, digits, `_` or `-`,
    /// optionally followed by one or more `[n]` indices.
    pub fn parse(raw: &str) -> Result<Self, String> {
        if raw.trim().is_empty() {
            return Err("path is empty".to_string());
        }
        let mut segments = Vec::new();
        for part in raw.split('.') {
            let captures = SEGMENT
                .captures(part)
                .ok_or_else(|| format!("invalid path segment '{part}' in '{raw}'"))?;
            segments.push(PathSegment::Key(captures[1].to_string()));
            let indices = &captures[2];
            for index in indices
                .split(']')
                .filter_map(|chunk| chunk.strip_prefix('['))
            {
                let index = index
                    .parse::<usize>()
                    .map_err(|_| format!("index '{index}' out of bounds in '{raw}'"))?;
                segments.push(PathSegment::Index(index));
            }
        }
        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }
}

impl fmt::Display for JsonPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn test_parse_keys_and_indices() {
        let path = JsonPath::parse("a.b[0][2].c-d_e").unwrap();
        assert_eq!(
            path.segments(),
            &[
                PathSegment::Key("a".into()),
                PathSegment::Key("b".into()),
                PathSegment::Index(0),
                PathSegment::Index(2),
                PathSegment::Key("c-d_e".into()),
            ]
        );
        assert_eq!(path.to_string(), "a.b[0][2].c-d_e");
    }

    #[rstest]
    #[case("")]
    #[case("a..b")]
    #[case(".a")]
    #[case("a.")]
    #[case("[0]")]
    #[case("a[-1]")]
    #[case("a[x]")]
    #[case("a b")]
    #[case("a[0]b")]
    #[case("$.a")]
    fn test_parse_rejects(#[case] raw: &str) {
        assert!(JsonPath::parse(raw).is_err(), "{raw} should be rejected");
    }
}
