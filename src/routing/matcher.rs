//! Path template matching.
//!
//! # Responsibilities
//! - Parse route templates such as `delete-file/{file_id}`
//! - Match a request path segment by segment
//! - Capture named parameters
//!
//! # Design Decisions
//! - Path matching is case-sensitive
//! - A parameter captures exactly one non-empty segment
//! - No regex to guarantee O(n) matching in the segment count

use std::collections::{BTreeMap, HashSet};
use std::fmt;

/// Parameters captured from a templated path.
pub type PathParams = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

/// A compiled route path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate {
    raw: String,
    segments: Vec<Segment>,
}

/// Why a template failed to compile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    Empty,
    EmptySegment,
    Unterminated(String),
    EmptyParam,
    DuplicateParam(String),
}

impl fmt::Display for TemplateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateError::Empty => write!(f, "path is empty"),
            TemplateError::EmptySegment => write!(f, "path contains an empty segment"),
            TemplateError::Unterminated(seg) => write!(f, "malformed parameter segment '{}'", seg),
            TemplateError::EmptyParam => write!(f, "parameter name is empty"),
            TemplateError::DuplicateParam(name) => write!(f, "parameter '{}' appears twice", name),
        }
    }
}

impl std::error::Error for TemplateError {}

impl PathTemplate {
    /// Compile a template. Leading and trailing slashes are not allowed to
    /// produce empty segments; pass paths relative to the pillar.
    pub fn parse(template: &str) -> Result<Self, TemplateError> {
        if template.is_empty() {
            return Err(TemplateError::Empty);
        }

        let mut seen = HashSet::new();
        let mut segments = Vec::new();
        for seg in template.split('/') {
            if seg.is_empty() {
                return Err(TemplateError::EmptySegment);
            }
            let opens = seg.starts_with('{');
            let closes = seg.ends_with('}');
            match (opens, closes) {
                (true, true) => {
                    let name = &seg[1..seg.len() - 1];
                    if name.is_empty() {
                        return Err(TemplateError::EmptyParam);
                    }
                    if name.contains(['{', '}']) {
                        return Err(TemplateError::Unterminated(seg.to_string()));
                    }
                    if !seen.insert(name.to_string()) {
                        return Err(TemplateError::DuplicateParam(name.to_string()));
                    }
                    segments.push(Segment::Param(name.to_string()));
                }
                (false, false) if !seg.contains(['{', '}']) => {
                    segments.push(Segment::Literal(seg.to_string()));
                }
                _ => return Err(TemplateError::Unterminated(seg.to_string())),
            }
        }

        Ok(Self {
            raw: template.to_string(),
            segments,
        })
    }

    /// The template as registered.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// True when the template has no parameters.
    pub fn is_static(&self) -> bool {
        self.segments.iter().all(|s| matches!(s, Segment::Literal(_)))
    }

    /// Template with parameter names erased; two templates with the same
    /// shape match exactly the same paths.
    pub fn shape(&self) -> String {
        self.segments
            .iter()
            .map(|s| match s {
                Segment::Literal(l) => l.as_str(),
                Segment::Param(_) => "{}",
            })
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Match a concrete path, returning captured parameters.
    pub fn matches(&self, path: &str) -> Option<PathParams> {
        let mut params = PathParams::new();
        let mut parts = path.split('/');

        for segment in &self.segments {
            let part = parts.next()?;
            match segment {
                Segment::Literal(lit) if lit == part => {}
                Segment::Literal(_) => return None,
                Segment::Param(_) if part.is_empty() => return None,
                Segment::Param(name) => {
                    params.insert(name.clone(), part.to_string());
                }
            }
        }

        if parts.next().is_some() {
            return None;
        }
        Some(params)
    }
}

impl fmt::Display for PathTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
