//! CSS selector subset for the mock DOM.
//!
//! Supported: type, `*`, `#id`, `.class`, `[attr]`, `[attr="v"]`,
//! `[attr*="v"]`, `[attr^="v"]`, descendant and `>` combinators, and `,`
//! groups.

use crate::result::{ProbeError, ProbeResult};

/// Attribute predicate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrOp {
    /// `[name]`
    Exists,
    /// `[name="v"]`
    Equals(String),
    /// `[name*="v"]`
    Contains(String),
    /// `[name^="v"]`
    Prefix(String),
}

/// Attribute selector
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttrSelector {
    /// Attribute name
    pub name: String,
    /// Predicate
    pub op: AttrOp,
}

impl AttrSelector {
    /// Check an attribute value (None when absent)
    #[must_use]
    pub fn matches(&self, value: Option<&str>) -> bool {
        match (&self.op, value) {
            (_, None) => false,
            (AttrOp::Exists, Some(_)) => true,
            (AttrOp::Equals(v), Some(actual)) => actual == v,
            (AttrOp::Contains(v), Some(actual)) => actual.contains(v.as_str()),
            (AttrOp::Prefix(v), Some(actual)) => actual.starts_with(v.as_str()),
        }
    }
}

/// One compound selector, e.g. `div.oxd-input-group[tabindex="0"]`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Compound {
    /// Tag name (None for `*` or omitted)
    pub tag: Option<String>,
    /// Element id
    pub id: Option<String>,
    /// Required classes
    pub classes: Vec<String>,
    /// Attribute predicates
    pub attrs: Vec<AttrSelector>,
}

/// Relationship to the previous compound
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    /// Whitespace
    Descendant,
    /// `>`
    Child,
}

/// Compounds joined by combinators, left to right.
///
/// The combinator stored with each compound (except the first) relates it
/// to the compound before it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Complex {
    /// Parts in source order
    pub parts: Vec<(Combinator, Compound)>,
}

/// Comma-separated selector list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorList {
    /// Alternatives
    pub alternatives: Vec<Complex>,
}

/// Element facts the matcher needs
pub trait MatchTarget {
    /// Node handle type
    type Node: Copy;

    /// Tag name (lowercase)
    fn tag(&self, node: Self::Node) -> &str;
    /// Id attribute
    fn id_of(&self, node: Self::Node) -> Option<&str>;
    /// Whether the node has the class
    fn has_class(&self, node: Self::Node, class: &str) -> bool;
    /// Attribute value
    fn attr(&self, node: Self::Node, name: &str) -> Option<&str>;
    /// Parent element, if any
    fn parent_of(&self, node: Self::Node) -> Option<Self::Node>;
}

impl Compound {
    /// Check a single element
    pub fn matches<T: MatchTarget>(&self, target: &T, node: T::Node) -> bool {
        if let Some(tag) = &self.tag {
            if target.tag(node) != tag {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if target.id_of(node) != Some(id.as_str()) {
                return false;
            }
        }
        self.classes.iter().all(|c| target.has_class(node, c))
            && self.attrs.iter().all(|a| {
                let value = match a.name.as_str() {
                    "id" => target.id_of(node),
                    name => target.attr(node, name),
                };
                a.matches(value)
            })
    }
}

impl Complex {
    /// Check an element against the whole chain
    pub fn matches<T: MatchTarget>(&self, target: &T, node: T::Node) -> bool {
        match self.parts.len() {
            0 => false,
            n => matches_at(&self.parts, n - 1, target, node),
        }
    }
}

fn matches_at<T: MatchTarget>(
    parts: &[(Combinator, Compound)],
    index: usize,
    target: &T,
    node: T::Node,
) -> bool {
    let (combinator, compound) = &parts[index];
    if !compound.matches(target, node) {
        return false;
    }
    if index == 0 {
        return true;
    }
    match combinator {
        Combinator::Child => target
            .parent_of(node)
            .is_some_and(|p| matches_at(parts, index - 1, target, p)),
        Combinator::Descendant => {
            let mut current = target.parent_of(node);
            while let Some(ancestor) = current {
                if matches_at(parts, index - 1, target, ancestor) {
                    return true;
                }
                current = target.parent_of(ancestor);
            }
            false
        }
    }
}

impl SelectorList {
    /// Parse a selector list
    pub fn parse(input: &str) -> ProbeResult<Self> {
        let alternatives = split_top_level(input)
            .into_iter()
            .map(parse_complex)
            .collect::<ProbeResult<Vec<_>>>()
            .map_err(|e| invalid(input, &e.to_string()))?;
        if alternatives.is_empty() {
            return Err(invalid(input, "empty selector"));
        }
        Ok(Self { alternatives })
    }

    /// Check an element against any alternative
    pub fn matches<T: MatchTarget>(&self, target: &T, node: T::Node) -> bool {
        self.alternatives.iter().any(|c| c.matches(target, node))
    }
}

fn invalid(input: &str, reason: &str) -> ProbeError {
    ProbeError::driver(format!("invalid selector {input:?}: {reason}"))
}

/// Split on commas outside brackets and quotes
fn split_top_level(input: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;
    for (i, c) in input.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '[') => depth += 1,
            (None, ']') => depth = depth.saturating_sub(1),
            (None, ',') if depth == 0 => {
                out.push(input[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    out.push(input[start..].trim());
    out
}

fn parse_complex(input: &str) -> ProbeResult<Complex> {
    let chars: Vec<char> = input.chars().collect();
    let mut pos = 0;
    let mut parts = Vec::new();
    let mut pending = Combinator::Descendant;

    loop {
        let mut saw_space = false;
        while pos < chars.len() && chars[pos].is_whitespace() {
            pos += 1;
            saw_space = true;
        }
        if pos >= chars.len() {
            break;
        }
        if chars[pos] == '>' {
            if parts.is_empty() {
                return Err(ProbeError::driver("leading combinator"));
            }
            pending = Combinator::Child;
            pos += 1;
            continue;
        }
        if !parts.is_empty() && !saw_space && pending == Combinator::Descendant {
            return Err(ProbeError::driver(format!("unexpected {:?}", chars[pos])));
        }
        let compound = parse_compound(&chars, &mut pos)?;
        parts.push((pending, compound));
        pending = Combinator::Descendant;
    }

    if parts.is_empty() {
        return Err(ProbeError::driver("empty selector"));
    }
    if pending == Combinator::Child && input.trim_end().ends_with('>') {
        return Err(ProbeError::driver("trailing combinator"));
    }
    Ok(Complex { parts })
}

fn is_ident(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

fn read_ident(chars: &[char], pos: &mut usize) -> ProbeResult<String> {
    let start = *pos;
    while *pos < chars.len() && is_ident(chars[*pos]) {
        *pos += 1;
    }
    if start == *pos {
        return Err(ProbeError::driver("expected identifier"));
    }
    Ok(chars[start..*pos].iter().collect())
}

fn parse_compound(chars: &[char], pos: &mut usize) -> ProbeResult<Compound> {
    let mut compound = Compound::default();
    let start = *pos;

    if *pos < chars.len() && chars[*pos] == '*' {
        *pos += 1;
    } else if *pos < chars.len() && is_ident(chars[*pos]) {
        compound.tag = Some(read_ident(chars, pos)?.to_lowercase());
    }

    while *pos < chars.len() {
        match chars[*pos] {
            '#' => {
                *pos += 1;
                compound.id = Some(read_ident(chars, pos)?);
            }
            '.' => {
                *pos += 1;
                compound.classes.push(read_ident(chars, pos)?);
            }
            '[' => {
                *pos += 1;
                compound.attrs.push(parse_attr(chars, pos)?);
            }
            _ => break,
        }
    }

    if *pos == start {
        return Err(ProbeError::driver(format!("unexpected {:?}", chars[*pos])));
    }
    Ok(compound)
}

fn parse_attr(chars: &[char], pos: &mut usize) -> ProbeResult<AttrSelector> {
    let name = read_ident(chars, pos)?;
    let op_char = chars.get(*pos).copied();
    let make: fn(String) -> AttrOp = match op_char {
        Some(']') => {
            *pos += 1;
            return Ok(AttrSelector {
                name,
                op: AttrOp::Exists,
            });
        }
        Some('=') => AttrOp::Equals,
        Some('*') => AttrOp::Contains,
        Some('^') => AttrOp::Prefix,
        _ => return Err(ProbeError::driver("malformed attribute selector")),
    };
    if op_char != Some('=') {
        *pos += 1;
    }
    if chars.get(*pos) != Some(&'=') {
        return Err(ProbeError::driver("malformed attribute selector"));
    }
    *pos += 1;

    let value = match chars.get(*pos).copied() {
        Some(q @ ('"' | '\'')) => {
            *pos += 1;
            let start = *pos;
            while *pos < chars.len() && chars[*pos] != q {
                *pos += 1;
            }
            if *pos >= chars.len() {
                return Err(ProbeError::driver("unterminated string"));
            }
            let v: String = chars[start..*pos].iter().collect();
            *pos += 1;
            v
        }
        _ => read_ident(chars, pos)?,
    };
    if chars.get(*pos) != Some(&']') {
        return Err(ProbeError::driver("expected ]"));
    }
    *pos += 1;
    Ok(AttrSelector {
        name,
        op: make(value),
    })
}
