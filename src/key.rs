//! Deterministic cache key construction.
//!
//! A key is the resource kind alone, or `kind?name=value&name=value` with the
//! parameters sorted by name and form-urlencoded. Insertion order never
//! matters, and `None` parameters are left out entirely.

use std::collections::BTreeMap;
use std::fmt;

use url::form_urlencoded;

/// A primitive query parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Str(String),
    Int(i64),
    UInt(u64),
    Float(f64),
    Bool(bool),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Str(s) => f.write_str(s),
            ParamValue::Int(i) => write!(f, "{}", i),
            ParamValue::UInt(u) => write!(f, "{}", u),
            ParamValue::Float(x) => write!(f, "{}", x),
            ParamValue::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Str(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Str(value)
    }
}

impl From<&String> for ParamValue {
    fn from(value: &String) -> Self {
        ParamValue::Str(value.clone())
    }
}

macro_rules! int_param {
    ($variant:ident as $wide:ty: $($t:ty),*) => {
        $(impl From<$t> for ParamValue {
            fn from(value: $t) -> Self {
                ParamValue::$variant(value as $wide)
            }
        })*
    };
}

int_param!(Int as i64: i32, i64);
int_param!(UInt as u64: u32, u64, usize);

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        ParamValue::Float(value)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Bool(value)
    }
}

/// Build a cache key from a resource kind and its parameters.
///
/// ```
/// use vibecoder_client::build_key;
///
/// let key = build_key("reports", [("status", Some("all".into())), ("limit", Some(50.into()))]);
/// assert_eq!(key, "reports?limit=50&status=all");
/// ```
pub fn build_key<'a, I>(kind: &str, params: I) -> String
where
    I: IntoIterator<Item = (&'a str, Option<ParamValue>)>,
{
    let mut builder = KeyBuilder::new(kind);
    for (name, value) in params {
        builder = builder.param_opt(name, value);
    }
    builder.build()
}

/// Incremental form of [`build_key`], used by the resource accessors.
#[derive(Debug, Clone)]
pub struct KeyBuilder {
    kind: String,
    params: BTreeMap<String, String>,
}

impl KeyBuilder {
    pub fn new(kind: &str) -> Self {
        KeyBuilder {
            kind: kind.to_string(),
            params: BTreeMap::new(),
        }
    }

    /// Add a parameter. A later call with the same name replaces the value.
    pub fn param(mut self, name: &str, value: impl Into<ParamValue>) -> Self {
        self.params
            .insert(name.to_string(), value.into().to_string());
        self
    }

    /// Add a parameter only when it has a value.
    pub fn param_opt(self, name: &str, value: Option<impl Into<ParamValue>>) -> Self {
        match value {
            Some(v) => self.param(name, v),
            None => self,
        }
    }

    fn query(&self) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (name, value) in &self.params {
            serializer.append_pair(name, value);
        }
        serializer.finish()
    }

    pub fn build(&self) -> String {
        if self.params.is_empty() {
            return self.kind.clone();
        }
        format!("{}?{}", self.kind, self.query())
    }

    /// The prefix shared by every key extending these parameters.
    ///
    /// Only sound when the parameters set so far sort before every parameter
    /// the longer keys add, and those keys always carry at least one more.
    pub fn prefix(&self) -> String {
        if self.params.is_empty() {
            return format!("{}?", self.kind);
        }
        format!("{}?{}&", self.kind, self.query())
    }
}
