//! Glob-style path pattern matching.
//!
//! # Responsibilities
//! - Parse route patterns once, at table build time
//! - Match request paths against compiled patterns
//!
//! # Design Decisions
//! - `**` spans any number of path segments (including zero)
//! - `*` matches exactly one segment; inside a segment it matches any run
//!   of characters (`/v*/users`), `?` matches a single character
//! - Matching is case-sensitive and segment-based, no regex in the hot path
//! - Patterns compile up front so `is_match` never re-parses

use thiserror::Error;

/// Error raised when a pattern string cannot be compiled.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PatternError {
    #[error("pattern is empty")]
    Empty,
    #[error("pattern {0:?} must start with '/'")]
    MissingLeadingSlash(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    /// `**`: any number of path segments, including none.
    Glob,
    /// A single path segment, possibly containing `*` / `?` wildcards.
    Literal(String),
}

/// A compiled glob-style path pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    raw: String,
    segments: Vec<Segment>,
}

impl PathPattern {
    /// Compile a pattern string.
    pub fn parse(raw: &str) -> Result<Self, PatternError> {
        if raw.is_empty() {
            return Err(PatternError::Empty);
        }
        let rest = raw
            .strip_prefix('/')
            .ok_or_else(|| PatternError::MissingLeadingSlash(raw.to_string()))?;

        let segments = rest
            .split('/')
            .map(|seg| {
                if seg == "**" {
                    Segment::Glob
                } else {
                    Segment::Literal(seg.to_string())
                }
            })
            .collect();

        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    /// The pattern string as written.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Match a request path against this pattern.
    pub fn is_match(&self, path: &str) -> bool {
        let Some(rest) = path.strip_prefix('/') else {
            return false;
        };
        let parts: Vec<&str> = rest.split('/').collect();
        match_segments(&self.segments, &parts)
    }
}

fn match_segments(pattern: &[Segment], path: &[&str]) -> bool {
    match pattern.split_first() {
        None => path.is_empty(),
        Some((Segment::Glob, rest)) => {
            // `**` consumes zero or more segments; try every split point.
            (0..=path.len()).any(|skip| match_segments(rest, &path[skip..]))
        }
        Some((Segment::Literal(lit), rest)) => match path.split_first() {
            Some((seg, path_rest)) => segment_matches(lit, seg) && match_segments(rest, path_rest),
            None => false,
        },
    }
}

/// Wildcard match within one segment: `*` any run, `?` one character.
fn segment_matches(pattern: &str, text: &str) -> bool {
    let p: Vec<char> = pattern.chars().collect();
    let t: Vec<char> = text.chars().collect();
    let (mut pi, mut ti) = (0usize, 0usize);
    let mut star: Option<usize> = None;
    let mut mark = 0usize;

    while ti < t.len() {
        if pi < p.len() && (p[pi] == '?' || p[pi] == t[ti]) {
            pi += 1;
            ti += 1;
        } else if pi < p.len() && p[pi] == '*' {
            star = Some(pi);
            mark = ti;
            pi += 1;
        } else if let Some(s) = star {
            // Backtrack: let the last `*` swallow one more character.
            pi = s + 1;
            mark += 1;
            ti = mark;
        } else {
            return false;
        }
    }
    while pi < p.len() && p[pi] == '*' {
        pi += 1;
    }
    pi == p.len()
}
