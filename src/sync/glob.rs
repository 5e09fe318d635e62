//! `*`-only wildcard patterns for repository and tag filters
//!
//! Matching is anchored, case-sensitive and byte-exact. `*` matches any run of
//! characters including none; every other character matches itself.

/// A compiled pattern: the literal pieces between `*`s
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Glob {
    pattern: String,
    pieces: Vec<String>,
}

impl Glob {
    /// Compile a pattern; surrounding whitespace is ignored
    pub fn new(pattern: &str) -> Self {
        let pattern = pattern.trim().to_string();
        let pieces = pattern.split('*').map(str::to_string).collect();
        Self { pattern, pieces }
    }

    pub fn as_str(&self) -> &str {
        &self.pattern
    }

    pub fn matches(&self, candidate: &str) -> bool {
        // split always yields at least one piece
        let (first, rest) = match self.pieces.split_first() {
            Some(split) => split,
            None => return candidate.is_empty(),
        };
        let Some((last, middle)) = rest.split_last() else {
            return candidate == first;
        };

        let Some(remaining) = candidate.strip_prefix(first.as_str()) else {
            return false;
        };
        if remaining.len() < last.len() {
            return false;
        }
        let Some(mut remaining) = remaining.strip_suffix(last.as_str()) else {
            return false;
        };

        // leftmost match of each middle piece is always safe with `*` only
        for piece in middle.iter().filter(|p| !p.is_empty()) {
            match remaining.find(piece.as_str()) {
                Some(pos) => remaining = &remaining[pos + piece.len()..],
                None => return false,
            }
        }
        true
    }
}

/// Any-of set of patterns; an empty set matches everything
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GlobSet {
    globs: Vec<Glob>,
}

impl GlobSet {
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Self {
        Self {
            globs: patterns.iter().map(|p| Glob::new(p.as_ref())).collect(),
        }
    }

    /// A set that matches everything, but says so explicitly
    pub fn match_all() -> Self {
        Self::new(&["*"])
    }

    pub fn is_empty(&self) -> bool {
        self.globs.is_empty()
    }

    pub fn matches(&self, candidate: &str) -> bool {
        self.globs.is_empty() || self.globs.iter().any(|glob| glob.matches(candidate))
    }

    pub fn patterns(&self) -> Vec<&str> {
        self.globs.iter().map(Glob::as_str).collect()
    }
}

/// True if `candidate` matches any of `patterns`, or `patterns` is empty
pub fn matches<S: AsRef<str>>(patterns: &[S], candidate: &str) -> bool {
    GlobSet::new(patterns).matches(candidate)
}
