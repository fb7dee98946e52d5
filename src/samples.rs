//! Key sets observed in the sample data a type was inferred from.
//!
//! The list strengthening pass can only turn a list into a record when it
//! knows every key the list holds. The type alone doesn't say, so the keys
//! are gathered from the sample document and indexed by [`TypePath`].

use std::{
    collections::{HashMap, HashSet},
    fmt,
};

use serde_yaml::Value;

use crate::ast::Label;

/// One step from a type to one of its children.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Segment {
    /// Into a record field.
    Field(Label),
    /// Into a list element.
    Element,
}

/// Location of a node within the root type. `Optional` adds no segment.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct TypePath(Vec<Segment>);

impl TypePath {
    pub fn root() -> TypePath {
        TypePath::default()
    }

    pub fn push(&mut self, segment: Segment) {
        self.0.push(segment);
    }

    pub fn pop(&mut self) -> Option<Segment> {
        self.0.pop()
    }

    pub fn segments(&self) -> &[Segment] {
        &self.0
    }

    /// Builds a path from dotted notation, where `[]` steps into a list
    /// element: `Deployment.web.spec.containers[].ports`.
    pub fn parse_dotted(dotted: &str) -> TypePath {
        let mut path = TypePath::root();
        for part in dotted.split('.').filter(|p| !p.is_empty()) {
            let mut part = part;
            let mut elements = 0;
            while let Some(rest) = part.strip_suffix("[]") {
                part = rest;
                elements += 1;
            }
            if !part.is_empty() {
                path.push(Segment::Field(part.into()));
            }
            for _ in 0..elements {
                path.push(Segment::Element);
            }
        }
        path
    }
}

impl fmt::Display for TypePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("<root>");
        }
        let mut first = true;
        for segment in &self.0 {
            match segment {
                Segment::Field(label) => {
                    if !first {
                        f.write_str(".")?;
                    }
                    write!(f, "{label}")?;
                }
                Segment::Element => f.write_str("[]")?,
            }
            first = false;
        }
        Ok(())
    }
}

/// Why a path has no usable key set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Decline {
    /// No list was seen at the path.
    Unobserved,
    /// A list at the path was empty.
    Empty,
    /// An element lacks the key field, or its key isn't a string.
    MissingKey,
    DuplicateKey(String),
    /// The key can't be written as a record label.
    UnrepresentableKey(String),
    /// Lists at the same path hold different keys.
    Disagreeing,
}

impl fmt::Display for Decline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decline::Unobserved => write!(f, "no sample list at this path"),
            Decline::Empty => write!(f, "a sample list is empty"),
            Decline::MissingKey => write!(f, "an element has no string key"),
            Decline::DuplicateKey(key) => write!(f, "key {key:?} occurs more than once"),
            Decline::UnrepresentableKey(key) => write!(f, "key {key:?} is not a valid label"),
            Decline::Disagreeing => write!(f, "sample lists at this path hold different keys"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Observation {
    Distinct(Vec<Label>),
    Declined(Decline),
}

/// Key sets per path, all read from the same key field.
#[derive(Clone, Debug)]
pub struct KeySamples {
    key_field: Label,
    paths: HashMap<TypePath, Observation>,
}

impl KeySamples {
    /// Creates an empty set of samples whose keys are read from `key_field`.
    pub fn new(key_field: impl Into<Label>) -> KeySamples {
        KeySamples {
            key_field: key_field.into(),
            paths: HashMap::new(),
        }
    }

    /// Walks a sample document and records the keys of every list of
    /// mappings, as found under `key_field`.
    pub fn collect(document: &Value, key_field: &str) -> KeySamples {
        let mut samples = KeySamples::new(key_field);
        samples.walk(document, key_field, &mut TypePath::root());
        tracing::debug!(paths = samples.paths.len(), key_field, "collected key samples");
        samples
    }

    /// The field the keys were read from.
    pub fn key_field(&self) -> &Label {
        &self.key_field
    }

    /// Records one list instance holding `keys`, in order.
    pub fn insert<K: AsRef<str>>(&mut self, path: TypePath, keys: impl IntoIterator<Item = K>) {
        let observation = validate(keys);
        self.observe(path, observation);
    }

    /// Returns the keys every list at `path` holds, if they are known and
    /// distinct.
    pub fn distinct_keys(&self, path: &TypePath) -> Result<&[Label], Decline> {
        match self.paths.get(path) {
            Some(Observation::Distinct(keys)) => Ok(keys),
            Some(Observation::Declined(decline)) => Err(decline.clone()),
            None => Err(Decline::Unobserved),
        }
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    fn observe(&mut self, path: TypePath, observation: Observation) {
        use std::collections::hash_map::Entry;

        match self.paths.entry(path) {
            Entry::Vacant(entry) => {
                entry.insert(observation);
            }
            Entry::Occupied(mut entry) => {
                let merged = match (entry.get(), observation) {
                    (Observation::Declined(_), _) => return,
                    (_, declined @ Observation::Declined(_)) => declined,
                    (Observation::Distinct(prev), Observation::Distinct(keys)) if *prev == keys => {
                        return;
                    }
                    (Observation::Distinct(_), Observation::Distinct(_)) => {
                        Observation::Declined(Decline::Disagreeing)
                    }
                };
                entry.insert(merged);
            }
        }
    }

    fn walk(&mut self, value: &Value, key_field: &str, path: &mut TypePath) {
        match value {
            Value::Mapping(mapping) => {
                for (key, value) in mapping {
                    let Some(key) = key.as_str() else {
                        continue;
                    };
                    path.push(Segment::Field(key.into()));
                    self.walk(value, key_field, path);
                    path.pop();
                }
            }
            Value::Sequence(elements) => {
                if elements.is_empty() {
                    self.observe(path.clone(), Observation::Declined(Decline::Empty));
                } else if elements.iter().all(Value::is_mapping) {
                    let keys: Option<Vec<&str>> = elements
                        .iter()
                        .map(|el| el.get(key_field).and_then(Value::as_str))
                        .collect();
                    let observation = match keys {
                        Some(keys) => validate(keys),
                        None => Observation::Declined(Decline::MissingKey),
                    };
                    self.observe(path.clone(), observation);
                }
                path.push(Segment::Element);
                for element in elements {
                    self.walk(element, key_field, path);
                }
                path.pop();
            }
            Value::Tagged(tagged) => self.walk(&tagged.value, key_field, path),
            Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => {}
        }
    }
}

fn validate<K: AsRef<str>>(keys: impl IntoIterator<Item = K>) -> Observation {
    let mut seen = HashSet::new();
    let mut labels = Vec::new();
    for key in keys {
        let key = key.as_ref();
        if !Label::is_representable(key) {
            return Observation::Declined(Decline::UnrepresentableKey(key.to_owned()));
        }
        if !seen.insert(key.to_owned()) {
            return Observation::Declined(Decline::DuplicateKey(key.to_owned()));
        }
        labels.push(Label::from(key));
    }
    if labels.is_empty() {
        return Observation::Declined(Decline::Empty);
    }
    Observation::Distinct(labels)
}
