//! Path pattern matching module
//!
//! A pattern is a `/`-separated sequence of literal segments and `:name`
//! placeholders. Matching is purely positional: the request path must have
//! the same number of segments, literals compare exactly (case-sensitive,
//! no trailing-slash normalization), and each placeholder captures the
//! corresponding request segment under its name. No wildcards, no regex,
//! no backtracking.

use std::collections::HashMap;

/// One pattern segment.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

/// A parsed route pattern.
#[derive(Debug, Clone)]
pub struct PathPattern {
    raw: String,
    segments: Vec<Segment>,
    param_names: Vec<String>,
}

impl PathPattern {
    /// Parse a registration path. Placeholder names are extracted once
    /// here so matching never re-scans the pattern text.
    pub fn parse(path: &str) -> Self {
        let mut segments = Vec::new();
        let mut param_names = Vec::new();
        for part in path.split('/') {
            if let Some(name) = part.strip_prefix(':') {
                param_names.push(name.to_string());
                segments.push(Segment::Param(name.to_string()));
            } else {
                segments.push(Segment::Literal(part.to_string()));
            }
        }
        Self {
            raw: path.to_string(),
            segments,
            param_names,
        }
    }

    /// The pattern as registered.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Placeholder names in pattern order.
    pub fn param_names(&self) -> &[String] {
        &self.param_names
    }

    /// Whether this is the root pattern `/`.
    pub fn is_root(&self) -> bool {
        self.raw == "/"
    }

    /// Match a request path, returning the captured parameters on success.
    pub fn captures(&self, path: &str) -> Option<HashMap<String, String>> {
        let mut params = HashMap::new();
        let mut parts = path.split('/');
        for segment in &self.segments {
            let part = parts.next()?;
            match segment {
                Segment::Literal(literal) => {
                    if literal != part {
                        return None;
                    }
                }
                Segment::Param(name) => {
                    params.insert(name.clone(), part.to_string());
                }
            }
        }
        // Segment counts must be equal: the path may not have leftovers.
        if parts.next().is_some() {
            return None;
        }
        Some(params)
    }
}
