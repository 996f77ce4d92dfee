/*!
 * Structured addresses of string values inside JSON documents.
 *
 * A `Locator` names exactly one value (`dataList[3].levelList[0].desc`); a
 * `LocatorPattern` may use `[*]` to range over every element of a list
 * (`dataList[*].levelList[*].desc`).
 */

use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::errors::DocumentError;

/// One step into a JSON value
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// Object member
    Key(String),
    /// List element
    Index(usize),
}

/// Concrete path to a single value
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Locator {
    segments: Vec<Segment>,
}

impl Locator {
    pub fn new(segments: Vec<Segment>) -> Self {
        Self { segments }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Append an object member step
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.segments.push(Segment::Key(key.into()));
        self
    }

    /// Append a list element step
    pub fn index(mut self, index: usize) -> Self {
        self.segments.push(Segment::Index(index));
        self
    }

    /// Shared lookup
    pub fn resolve<'a>(&self, root: &'a Value) -> Option<&'a Value> {
        self.segments.iter().try_fold(root, |value, segment| match segment {
            Segment::Key(key) => value.get(key.as_str()),
            Segment::Index(index) => value.get(*index),
        })
    }

    /// Mutable lookup
    pub fn resolve_mut<'a>(&self, root: &'a mut Value) -> Option<&'a mut Value> {
        self.segments.iter().try_fold(root, |value, segment| match segment {
            Segment::Key(key) => value.get_mut(key.as_str()),
            Segment::Index(index) => value.get_mut(*index),
        })
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Key(key) if i == 0 => write!(f, "{}", key)?,
                Segment::Key(key) => write!(f, ".{}", key)?,
                Segment::Index(index) => write!(f, "[{}]", index)?,
            }
        }
        Ok(())
    }
}

impl FromStr for Locator {
    type Err = DocumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let segments = parse_segments(s)?
            .into_iter()
            .map(|segment| match segment {
                PatternSegment::Key(key) => Ok(Segment::Key(key)),
                PatternSegment::Index(index) => Ok(Segment::Index(index)),
                PatternSegment::AnyIndex => Err(DocumentError::InvalidLocator(s.to_string())),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { segments })
    }
}

/// Step of a pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternSegment {
    Key(String),
    Index(usize),
    /// Every element of a list
    AnyIndex,
}

/// Path that may fan out over list elements
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatorPattern {
    segments: Vec<PatternSegment>,
}

impl LocatorPattern {
    /// Every string value in `root` the pattern reaches, in document order
    pub fn matches<'a>(&self, root: &'a Value) -> Vec<(Locator, &'a str)> {
        let mut found = Vec::new();
        collect(root, &self.segments, Locator::default(), &mut found);
        found
    }
}

fn collect<'a>(
    value: &'a Value,
    remaining: &[PatternSegment],
    at: Locator,
    found: &mut Vec<(Locator, &'a str)>,
) {
    let Some((head, rest)) = remaining.split_first() else {
        if let Value::String(text) = value {
            found.push((at, text.as_str()));
        }
        return;
    };

    match head {
        PatternSegment::Key(key) => {
            if let Some(child) = value.get(key.as_str()) {
                collect(child, rest, at.key(key.clone()), found);
            }
        }
        PatternSegment::Index(index) => {
            if let Some(child) = value.get(*index) {
                collect(child, rest, at.index(*index), found);
            }
        }
        PatternSegment::AnyIndex => {
            if let Value::Array(items) = value {
                for (index, child) in items.iter().enumerate() {
                    collect(child, rest, at.clone().index(index), found);
                }
            }
        }
    }
}

impl FromStr for LocatorPattern {
    type Err = DocumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self { segments: parse_segments(s)? })
    }
}

impl fmt::Display for LocatorPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                PatternSegment::Key(key) if i == 0 => write!(f, "{}", key)?,
                PatternSegment::Key(key) => write!(f, ".{}", key)?,
                PatternSegment::Index(index) => write!(f, "[{}]", index)?,
                PatternSegment::AnyIndex => write!(f, "[*]")?,
            }
        }
        Ok(())
    }
}

/// `name[0][*].other` -> segments
fn parse_segments(s: &str) -> Result<Vec<PatternSegment>, DocumentError> {
    let invalid = || DocumentError::InvalidLocator(s.to_string());
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err(invalid());
    }

    let mut segments = Vec::new();
    for part in trimmed.split('.') {
        let (name, mut brackets) = match part.find('[') {
            Some(pos) => (&part[..pos], &part[pos..]),
            None => (part, ""),
        };
        if name.is_empty() && (brackets.is_empty() || !segments.is_empty()) {
            return Err(invalid());
        }
        if !name.is_empty() {
            segments.push(PatternSegment::Key(name.to_string()));
        }

        while !brackets.is_empty() {
            let close = brackets.find(']').ok_or_else(invalid)?;
            let inner = &brackets[1..close];
            if inner == "*" {
                segments.push(PatternSegment::AnyIndex);
            } else {
                let index = inner.parse::<usize>().map_err(|_| invalid())?;
                segments.push(PatternSegment::Index(index));
            }
            brackets = &brackets[close + 1..];
            if !brackets.is_empty() && !brackets.starts_with('[') {
                return Err(invalid());
            }
        }
    }

    Ok(segments)
}
