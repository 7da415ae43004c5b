//! Node types for the field table tree.
//!
//! A table owns modules, a module owns variables, and a variable owns an
//! open, insertion-ordered set of attributes. Attribute values are either a
//! plain scalar or a sub-list of parameter entries. All types serialize back
//! into the document layout they were read from.

use std::fmt;

use indexmap::IndexMap;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use serde_yaml_ng::Value;

use crate::document::parse_variable;
use crate::error::Result;

/// Identity key of a variable mapping. Never stored as an attribute.
pub const VARIABLE_KEY: &str = "variable";

/// A leaf value in the table.
///
/// Integers above `i64::MAX` keep their exact value in `Unsigned`.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Integer(i64),
    Unsigned(u64),
    Float(f64),
    String(String),
}

impl Scalar {
    /// Convert a YAML node into a scalar, if it is one.
    ///
    /// Null, sequences, mappings and tagged nodes have no scalar form.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(Scalar::Bool(*b)),
            Value::Number(n) => n
                .as_i64()
                .map(Scalar::Integer)
                .or_else(|| n.as_u64().map(Scalar::Unsigned))
                .or_else(|| n.as_f64().map(Scalar::Float)),
            Value::String(s) => Some(Scalar::String(s.clone())),
            _ => None,
        }
    }

    /// Parse command-line style text the way a YAML loader would read it.
    ///
    /// `"1"` becomes an integer, `"0.5"` a float, `"true"` a bool; anything
    /// that is not a YAML scalar is kept verbatim as a string.
    pub fn parse(text: &str) -> Self {
        serde_yaml_ng::from_str::<Value>(text)
            .ok()
            .and_then(|v| Scalar::from_value(&v))
            .unwrap_or_else(|| Scalar::String(text.to_string()))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::String(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric view; integers widen to `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Integer(i) => Some(*i as f64),
            Scalar::Unsigned(u) => Some(*u as f64),
            Scalar::Float(f) => Some(*f),
            _ => None,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Bool(b) => write!(f, "{b}"),
            Scalar::Integer(i) => write!(f, "{i}"),
            Scalar::Unsigned(u) => write!(f, "{u}"),
            Scalar::Float(x) => write!(f, "{x:?}"),
            Scalar::String(s) => write!(f, "{s}"),
        }
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::String(s.to_string())
    }
}

impl From<String> for Scalar {
    fn from(s: String) -> Self {
        Scalar::String(s)
    }
}

impl From<bool> for Scalar {
    fn from(b: bool) -> Self {
        Scalar::Bool(b)
    }
}

impl From<i32> for Scalar {
    fn from(i: i32) -> Self {
        Scalar::Integer(i64::from(i))
    }
}

impl From<i64> for Scalar {
    fn from(i: i64) -> Self {
        Scalar::Integer(i)
    }
}

impl From<u64> for Scalar {
    fn from(u: u64) -> Self {
        i64::try_from(u).map_or(Scalar::Unsigned(u), Scalar::Integer)
    }
}

impl From<f64> for Scalar {
    fn from(x: f64) -> Self {
        Scalar::Float(x)
    }
}

impl PartialEq<str> for Scalar {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == Some(other)
    }
}

impl PartialEq<&str> for Scalar {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == Some(*other)
    }
}

impl PartialEq<f64> for Scalar {
    fn eq(&self, other: &f64) -> bool {
        self.as_f64() == Some(*other)
    }
}

impl PartialEq<i64> for Scalar {
    fn eq(&self, other: &i64) -> bool {
        matches!(self, Scalar::Integer(i) if i == other)
    }
}

/// One entry of a sub-list: sub-parameter name → scalar.
///
/// Entries usually carry a `value` discriminator (`"fixed"`, `"aerosol"`)
/// next to the named parameters, but it is not required.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(transparent)]
pub struct SubListEntry(IndexMap<String, Scalar>);

impl SubListEntry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sub-parameter (builder style).
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Scalar>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&Scalar> {
        self.0.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Sub-parameter names in stored order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Scalar)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub(crate) fn set(&mut self, name: &str, value: Scalar) {
        match self.0.get_mut(name) {
            Some(slot) => *slot = value,
            None => {
                self.0.insert(name.to_string(), value);
            }
        }
    }

    pub(crate) fn rename_key(&mut self, old: &str, new: &str) {
        rename_in_place(&mut self.0, old, new);
    }
}

impl FromIterator<(String, Scalar)> for SubListEntry {
    fn from_iter<T: IntoIterator<Item = (String, Scalar)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Value stored under an attribute name.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum AttributeValue {
    Scalar(Scalar),
    SubList(Vec<SubListEntry>),
}

impl AttributeValue {
    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            AttributeValue::Scalar(s) => Some(s),
            AttributeValue::SubList(_) => None,
        }
    }

    pub fn as_sublist(&self) -> Option<&[SubListEntry]> {
        match self {
            AttributeValue::SubList(entries) => Some(entries),
            AttributeValue::Scalar(_) => None,
        }
    }

    pub fn is_sublist(&self) -> bool {
        matches!(self, AttributeValue::SubList(_))
    }
}

impl From<Scalar> for AttributeValue {
    fn from(value: Scalar) -> Self {
        AttributeValue::Scalar(value)
    }
}

macro_rules! scalar_attribute_from {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for AttributeValue {
                fn from(value: $ty) -> Self {
                    AttributeValue::Scalar(value.into())
                }
            }
        )*
    };
}

scalar_attribute_from!(&str, String, bool, i32, i64, u64, f64);

impl From<Vec<SubListEntry>> for AttributeValue {
    fn from(entries: Vec<SubListEntry>) -> Self {
        AttributeValue::SubList(entries)
    }
}

/// A named field with an open attribute set.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    name: String,
    attributes: IndexMap<String, AttributeValue>,
}

impl Variable {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: IndexMap::new(),
        }
    }

    /// Add an attribute (builder style). Later calls overwrite earlier ones.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Build a variable from a parsed varlist mapping.
    ///
    /// Applies the same checks as table construction: a `variable` key is
    /// required and values must be scalars or sub-lists of scalar entries.
    pub fn from_value(value: &Value) -> Result<Self> {
        parse_variable(value, "varlist entry")
    }

    /// Parse a single varlist mapping from YAML text.
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let value: Value = serde_yaml_ng::from_str(text)?;
        Self::from_value(&value)
    }

    /// The `variable` identity name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attribute(&self, key: &str) -> Option<&AttributeValue> {
        self.attributes.get(key)
    }

    pub fn has_attribute(&self, key: &str) -> bool {
        self.attributes.contains_key(key)
    }

    /// All attributes in document order, identity key excluded.
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &AttributeValue)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Names of attributes whose value is a sub-list, in document order.
    pub fn sublist_names(&self) -> Vec<&str> {
        self.attributes
            .iter()
            .filter(|(_, v)| v.is_sublist())
            .map(|(k, _)| k.as_str())
            .collect()
    }

    pub(crate) fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    pub(crate) fn set_attribute(&mut self, key: &str, value: AttributeValue) {
        match self.attributes.get_mut(key) {
            Some(slot) => *slot = value,
            None => {
                self.attributes.insert(key.to_string(), value);
            }
        }
    }

    pub(crate) fn attribute_mut(&mut self, key: &str) -> Option<&mut AttributeValue> {
        self.attributes.get_mut(key)
    }

    pub(crate) fn rename_attribute_key(&mut self, old: &str, new: &str) {
        rename_in_place(&mut self.attributes, old, new);
    }
}

impl Serialize for Variable {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.attributes.len() + 1))?;
        map.serialize_entry(VARIABLE_KEY, &self.name)?;
        for (key, value) in &self.attributes {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// A named group of variables owned by one model component.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Module {
    model_type: String,
    varlist: Vec<Variable>,
}

impl Module {
    pub fn new(model_type: impl Into<String>, varlist: Vec<Variable>) -> Self {
        Self {
            model_type: model_type.into(),
            varlist,
        }
    }

    pub fn model_type(&self) -> &str {
        &self.model_type
    }

    pub fn varlist(&self) -> &[Variable] {
        &self.varlist
    }

    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.varlist.iter().find(|v| v.name == name)
    }

    pub(crate) fn variable_mut(&mut self, name: &str) -> Option<&mut Variable> {
        self.varlist.iter_mut().find(|v| v.name == name)
    }

    pub(crate) fn push(&mut self, variable: Variable) {
        self.varlist.push(variable);
    }

    /// Position of `name` in the varlist.
    pub(crate) fn position(&self, name: &str) -> Option<usize> {
        self.varlist.iter().position(|v| v.name == name)
    }

    pub(crate) fn variable_at_mut(&mut self, index: usize) -> &mut Variable {
        &mut self.varlist[index]
    }
}

/// Substitute `old` with `new` as a key without moving its entry.
///
/// The map is rebuilt in one pass, so `new` appears exactly where `old` was.
/// Callers check that `old` exists and `new` does not.
fn rename_in_place<V>(map: &mut IndexMap<String, V>, old: &str, new: &str) {
    *map = std::mem::take(map)
        .into_iter()
        .map(|(k, v)| if k == old { (new.to_string(), v) } else { (k, v) })
        .collect();
}
