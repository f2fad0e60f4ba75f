//! Paths naming groups and sections from the document root.
//!
//! Section names routinely contain dots (`system.web`), so path segments are
//! separated by `/`. The empty path names the root group.
//!
//! ```
//! use cfgdoc::ConfigPath;
//!
//! let path: ConfigPath = "system.web/compilation".parse().unwrap();
//! assert_eq!(path.segments(), ["system.web", "compilation"]);
//! assert_eq!(path.name(), Some("compilation"));
//! assert_eq!(path.parent().unwrap().to_string(), "system.web");
//! ```

use std::{convert::Infallible, fmt, str::FromStr};

/// Separator between path segments.
pub const SEPARATOR: char = '/';

/// Owned path of group and section names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConfigPath {
    segments: Vec<String>,
}

impl ConfigPath {
    /// The path of the root group
    pub fn root() -> Self {
        Self::default()
    }

    /// Builds a path from its segments
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    /// Appends a segment (builder style)
    pub fn push(mut self, name: impl Into<String>) -> Self {
        self.segments.push(name.into());
        self
    }

    /// Returns a new path with `name` appended
    pub fn join(&self, name: impl Into<String>) -> Self {
        self.clone().push(name)
    }

    /// The names along this path, outermost first
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// The last segment, or `None` for the root
    pub fn name(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// The path without its last segment, or `None` for the root
    pub fn parent(&self) -> Option<ConfigPath> {
        let (_, rest) = self.segments.split_last()?;
        Some(Self {
            segments: rest.to_vec(),
        })
    }

    /// Returns true for the root path
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Number of segments
    pub fn depth(&self) -> usize {
        self.segments.len()
    }
}

impl fmt::Display for ConfigPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("/");
        }
        f.write_str(&self.segments.join("/"))
    }
}

impl FromStr for ConfigPath {
    type Err = Infallible;

    /// Parses `a/b/c`; empty segments (leading, trailing or doubled separators) are dropped.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_segments(
            s.split(SEPARATOR).filter(|segment| !segment.is_empty()),
        ))
    }
}
