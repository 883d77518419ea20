//! Typed intermediate document shared by all generators.
//!
//! Generators only build a [`Node`] tree; the writers at the bottom of this
//! module are the single place that turns a tree into YAML or INI text.

use serde_yaml::{Mapping, Value};

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Str(String),
    Int(i64),
    Bool(bool),
}

impl Scalar {
    fn render(&self) -> String {
        match self {
            Scalar::Str(s) => s.clone(),
            Scalar::Int(i) => i.to_string(),
            Scalar::Bool(b) => b.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Scalar(Scalar),
    List(Vec<Node>),
    /// Ordered key/value pairs; insertion order is kept on output
    Mapping(Vec<(String, Node)>),
}

impl Node {
    pub fn str(value: impl Into<String>) -> Node {
        Node::Scalar(Scalar::Str(value.into()))
    }

    pub fn int(value: impl Into<i64>) -> Node {
        Node::Scalar(Scalar::Int(value.into()))
    }

    pub fn bool(value: bool) -> Node {
        Node::Scalar(Scalar::Bool(value))
    }

    pub fn list<I>(items: I) -> Node
    where
        I: IntoIterator<Item = Node>,
    {
        Node::List(items.into_iter().collect())
    }

    pub fn str_list<I, S>(items: I) -> Node
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Node::List(items.into_iter().map(Node::str).collect())
    }

    pub fn mapping() -> Node {
        Node::Mapping(Vec::new())
    }

    /// Adds `key: value` to a mapping. Has no effect on other variants.
    pub fn with(mut self, key: &str, value: Node) -> Node {
        self.insert(key, value);
        self
    }

    /// Like [`Node::with`] but skips `None`.
    pub fn with_opt(self, key: &str, value: Option<Node>) -> Node {
        match value {
            Some(value) => self.with(key, value),
            None => self,
        }
    }

    /// Sets `key` in a mapping, replacing an existing entry in place.
    pub fn insert(&mut self, key: &str, value: Node) {
        if let Node::Mapping(entries) = self {
            match entries.iter_mut().find(|(k, _)| k == key) {
                Some((_, existing)) => *existing = value,
                None => entries.push((key.to_string(), value)),
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&Node> {
        match self {
            Node::Mapping(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Node::Scalar(Scalar::Str(s)) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Node]> {
        match self {
            Node::List(items) => Some(items),
            _ => None,
        }
    }
}

fn to_yaml_value(node: &Node) -> Value {
    match node {
        Node::Scalar(Scalar::Str(s)) => Value::String(s.clone()),
        Node::Scalar(Scalar::Int(i)) => Value::Number((*i).into()),
        Node::Scalar(Scalar::Bool(b)) => Value::Bool(*b),
        Node::List(items) => Value::Sequence(items.iter().map(to_yaml_value).collect()),
        Node::Mapping(entries) => {
            let mut map = Mapping::new();
            for (key, value) in entries {
                map.insert(Value::String(key.clone()), to_yaml_value(value));
            }
            Value::Mapping(map)
        }
    }
}

/// Serialises a tree as YAML.
pub fn to_yaml(node: &Node) -> Result<String> {
    Ok(serde_yaml::to_string(&to_yaml_value(node))?)
}

/// Renders a value on a single INI line: lists are joined with `", "`,
/// mapping entries become `key=value`.
fn render_inline(node: &Node) -> String {
    match node {
        Node::Scalar(scalar) => scalar.render(),
        Node::List(items) => items
            .iter()
            .map(render_inline)
            .collect::<Vec<_>>()
            .join(", "),
        Node::Mapping(entries) => entries
            .iter()
            .map(|(k, v)| format!("{}={}", k, render_inline(v)))
            .collect::<Vec<_>>()
            .join(", "),
    }
}

/// Serialises a tree as an INI-style document.
///
/// The root must be a mapping of section name to body. A list body
/// yields one line per item; a mapping body yields `key = value` lines.
/// Sections are separated by a blank line.
pub fn to_ini(node: &Node) -> Result<String> {
    let Node::Mapping(sections) = node else {
        return Err(Error::Document(
            "INI root must be a mapping of sections".to_string(),
        ));
    };

    let mut blocks = Vec::with_capacity(sections.len());
    for (section, body) in sections {
        let mut block = format!("[{}]\n", section);
        match body {
            Node::List(lines) => {
                for line in lines {
                    block.push_str(&render_inline(line));
                    block.push('\n');
                }
            }
            Node::Mapping(entries) => {
                for (key, value) in entries {
                    block.push_str(&format!("{} = {}\n", key, render_inline(value)));
                }
            }
            Node::Scalar(_) => {
                return Err(Error::Document(format!(
                    "section '{}' must be a list or mapping",
                    section
                )))
            }
        }
        blocks.push(block);
    }
    Ok(blocks.join("\n"))
}
