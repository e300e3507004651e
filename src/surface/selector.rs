/*!
 * CSS selector subset.
 *
 * Enough of the selector grammar to express caption and player locations:
 * type, universal, `#id`, `.class` and attribute selectors (`[a]`, `[a=v]`,
 * `[a*=v]`, `[a^=v]`, `[a$=v]`, `[a~=v]`), descendant and child
 * combinators, and comma-separated lists.
 */

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use crate::errors::SurfaceError;

/// Read access to an element tree, as needed for matching
pub trait SelectorTree {
    /// Node handle
    type Node: Copy;

    /// Parent element, stopping at document and shadow roots
    fn parent_element(&self, node: Self::Node) -> Option<Self::Node>;

    /// Lowercase tag name, `None` for non-elements
    fn local_name(&self, node: Self::Node) -> Option<&str>;

    /// Whether the element carries `class`
    fn has_class(&self, node: Self::Node, class: &str) -> bool;

    /// Attribute value; `class` and `id` included
    fn attribute(&self, node: Self::Node, name: &str) -> Option<Cow<'_, str>>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum AttrOp {
    Exists,
    Equals(String),
    Contains(String),
    Prefix(String),
    Suffix(String),
    Includes(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct AttrSelector {
    name: String,
    op: AttrOp,
}

impl AttrSelector {
    fn matches(&self, value: Option<&str>) -> bool {
        let Some(value) = value else {
            return false;
        };
        match &self.op {
            AttrOp::Exists => true,
            AttrOp::Equals(v) => value == v,
            AttrOp::Contains(v) => !v.is_empty() && value.contains(v.as_str()),
            AttrOp::Prefix(v) => !v.is_empty() && value.starts_with(v.as_str()),
            AttrOp::Suffix(v) => !v.is_empty() && value.ends_with(v.as_str()),
            AttrOp::Includes(v) => value.split_whitespace().any(|part| part == v),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Compound {
    universal: bool,
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attributes: Vec<AttrSelector>,
}

impl Compound {
    fn is_empty(&self) -> bool {
        !self.universal
            && self.tag.is_none()
            && self.id.is_none() && self.classes.is_empty() && self.attributes.is_empty()
    }

    fn matches<T: SelectorTree>(&self, tree: &T, node: T::Node) -> bool {
        let Some(name) = tree.local_name(node) else {
            return false;
        };
        if self.tag.as_deref().is_some_and(|tag| tag != name) {
            return false;
        }
        if let Some(id) = &self.id {
            if tree.attribute(node, "id").as_deref() != Some(id.as_str()) {
                return false;
            }
        }
        self.classes.iter().all(|class| tree.has_class(node, class))
            && self
                .attributes
                .iter()
                .all(|attr| attr.matches(tree.attribute(node, &attr.name).as_deref()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
}

/// One selector without commas
#[derive(Debug, Clone, PartialEq, Eq)]
struct Complex {
    /// Left to right
    parts: Vec<Compound>,
    /// `combinators[i]` joins `parts[i]` and `parts[i + 1]`
    combinators: Vec<Combinator>,
}

impl Complex {
    fn matches<T: SelectorTree>(&self, tree: &T, node: T::Node) -> bool {
        self.match_at(tree, node, self.parts.len() - 1)
    }

    fn match_at<T: SelectorTree>(&self, tree: &T, node: T::Node, index: usize) -> bool {
        if !self.parts[index].matches(tree, node) {
            return false;
        }
        if index == 0 {
            return true;
        }
        match self.combinators[index - 1] {
            Combinator::Child => tree
                .parent_element(node)
                .is_some_and(|parent| self.match_at(tree, parent, index - 1)),
            Combinator::Descendant => {
                let mut current = tree.parent_element(node);
                while let Some(ancestor) = current {
                    if self.match_at(tree, ancestor, index - 1) {
                        return true;
                    }
                    current = tree.parent_element(ancestor);
                }
                false
            }
        }
    }
}

/// A parsed selector list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    source: String,
    alternatives: Vec<Complex>,
}

impl Selector {
    /// Parse a selector list
    pub fn parse(source: &str) -> Result<Self, SurfaceError> {
        let alternatives = Parser::new(source).parse_list()?;
        Ok(Self {
            source: source.trim().to_string(),
            alternatives,
        })
    }

    /// Whether `node` matches any alternative
    pub fn matches<T: SelectorTree>(&self, tree: &T, node: T::Node) -> bool {
        self.alternatives.iter().any(|complex| complex.matches(tree, node))
    }

    /// The selector text
    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl FromStr for Selector {
    type Err = SurfaceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

struct Parser<'a> {
    full: &'a str,
    chars: std::iter::Peekable<std::str::Chars<'a>>,
}

impl<'a> Parser<'a> {
    fn new(full: &'a str) -> Self {
        Self {
            full,
            chars: full.chars().peekable(),
        }
    }

    fn error(&self, reason: impl Into<String>) -> SurfaceError {
        SurfaceError::InvalidSelector {
            selector: self.full.to_string(),
            reason: reason.into(),
        }
    }

    fn skip_whitespace(&mut self) -> bool {
        let mut skipped = false;
        while self.chars.peek().is_some_and(|c| c.is_whitespace()) {
            self.chars.next();
            skipped = true;
        }
        skipped
    }

    /// Comma-separated alternatives; commas inside attribute values are
    /// consumed by `parse_value` and never reach this loop
    fn parse_list(&mut self) -> Result<Vec<Complex>, SurfaceError> {
        let mut alternatives = vec![self.parse_complex()?];
        while self.chars.next_if_eq(&',').is_some() {
            alternatives.push(self.parse_complex()?);
        }
        match self.chars.peek().copied() {
            None => Ok(alternatives),
            Some(c) => Err(self.error(format!("unexpected character '{}'", c))),
        }
    }

    fn parse_complex(&mut self) -> Result<Complex, SurfaceError> {
        let mut parts = Vec::new();
        let mut combinators = Vec::new();

        self.skip_whitespace();
        loop {
            let compound = self.parse_compound()?;
            if compound.is_empty() {
                return Err(self.error("expected a simple selector"));
            }
            parts.push(compound);

            let had_space = self.skip_whitespace();
            match self.chars.peek().copied() {
                None | Some(',') => break,
                Some('>') => {
                    self.chars.next();
                    self.skip_whitespace();
                    combinators.push(Combinator::Child);
                }
                Some(_) if had_space => combinators.push(Combinator::Descendant),
                Some(c) => return Err(self.error(format!("unexpected character '{}'", c))),
            }
        }

        Ok(Complex { parts, combinators })
    }

    fn parse_compound(&mut self) -> Result<Compound, SurfaceError> {
        let mut compound = Compound::default();

        match self.chars.peek().copied() {
            Some('*') => {
                self.chars.next();
                compound.universal = true;
            }
            Some(c) if is_ident_char(c) => {
                compound.tag = Some(self.parse_ident()?.to_lowercase());
            }
            _ => {}
        }

        loop {
            match self.chars.peek().copied() {
                Some('#') => {
                    self.chars.next();
                    compound.id = Some(self.parse_ident()?);
                }
                Some('.') => {
                    self.chars.next();
                    compound.classes.push(self.parse_ident()?);
                }
                Some('[') => {
                    self.chars.next();
                    compound.attributes.push(self.parse_attribute()?);
                }
                _ => break,
            }
        }

        Ok(compound)
    }

    fn parse_attribute(&mut self) -> Result<AttrSelector, SurfaceError> {
        self.skip_whitespace();
        let name = self.parse_ident()?.to_lowercase();
        self.skip_whitespace();

        let op_prefix = match self.chars.peek().copied() {
            Some(']') => {
                self.chars.next();
                return Ok(AttrSelector { name, op: AttrOp::Exists });
            }
            Some(c @ ('*' | '^' | '$' | '~')) => {
                self.chars.next();
                Some(c)
            }
            Some('=') => None,
            _ => return Err(self.error("malformed attribute selector")),
        };
        if self.chars.next() != Some('=') {
            return Err(self.error("expected '=' in attribute selector"));
        }

        self.skip_whitespace();
        let value = self.parse_value()?;
        self.skip_whitespace();
        if self.chars.next() != Some(']') {
            return Err(self.error("unterminated attribute selector"));
        }

        let op = match op_prefix {
            None => AttrOp::Equals(value),
            Some('*') => AttrOp::Contains(value),
            Some('^') => AttrOp::Prefix(value),
            Some('$') => AttrOp::Suffix(value),
            _ => AttrOp::Includes(value),
        };
        Ok(AttrSelector { name, op })
    }

    fn parse_value(&mut self) -> Result<String, SurfaceError> {
        match self.chars.peek().copied() {
            Some(quote @ ('"' | '\'')) => {
                self.chars.next();
                let mut value = String::new();
                loop {
                    match self.chars.next() {
                        Some(c) if c == quote => return Ok(value),
                        Some(c) => value.push(c),
                        None => return Err(self.error("unterminated string")),
                    }
                }
            }
            _ => self.parse_ident(),
        }
    }

    fn parse_ident(&mut self) -> Result<String, SurfaceError> {
        let mut ident = String::new();
        while let Some(&c) = self.chars.peek() {
            if !is_ident_char(c) {
                break;
            }
            ident.push(c);
            self.chars.next();
        }
        if ident.is_empty() {
            return Err(self.error("expected an identifier"));
        }
        Ok(ident)
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '-' || c == '_'
}
