// type ::= record
//        | 'List' type
//        | 'Optional' type
//        | '(' type ')'
//        | IDENT
// record ::= '{' [','] [field (',' field)*] '}'
// field ::= label ':' type
// label ::= IDENT | '`' QUOTED '`' | 'List' | 'Optional'
//
// Application binds tighter than anything else, so `List (Optional Text)`
// needs its parentheses when printed.

use std::{borrow::Borrow, fmt};

/// Names of the scalar types the inference tool emits.
pub mod builtins {
    pub const TEXT: &str = "Text";
    pub const NATURAL: &str = "Natural";
    pub const INTEGER: &str = "Integer";
    pub const DOUBLE: &str = "Double";
    pub const BOOL: &str = "Bool";
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Type {
    /// A primitive type, such as `Text` or `Natural`.
    Scalar(Box<str>),
    Optional(Box<Type>),
    List(Box<Type>),
    Record(Record),
}

impl Type {
    pub fn scalar(name: &str) -> Type {
        Type::Scalar(name.into())
    }

    pub fn text() -> Type {
        Type::scalar(builtins::TEXT)
    }

    pub fn optional(inner: Type) -> Type {
        Type::Optional(Box::new(inner))
    }

    pub fn list(element: Type) -> Type {
        Type::List(Box::new(element))
    }

    pub fn is_scalar(&self, name: &str) -> bool {
        matches!(self, Type::Scalar(s) if &**s == name)
    }

    /// Whether this is a `List` or `Optional` application.
    pub fn is_application(&self) -> bool {
        matches!(self, Type::List(_) | Type::Optional(_))
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Type::Record(record) => Some(record),
            _ => None,
        }
    }
}

/// A record type. Labels are unique within a record; field order is kept as
/// given.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Record {
    fields: Vec<Field>,
}

impl Record {
    pub fn new() -> Record {
        Record::default()
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, label: &str) -> Option<&Type> {
        self.fields
            .iter()
            .find(|f| f.label.as_str() == label)
            .map(|f| &f.ty)
    }

    /// Inserts a field. A field with the same label is replaced in place and
    /// returned.
    pub fn insert(&mut self, field: Field) -> Option<Field> {
        match self.fields.iter_mut().find(|f| f.label == field.label) {
            Some(existing) => Some(std::mem::replace(existing, field)),
            None => {
                self.fields.push(field);
                None
            }
        }
    }

    pub fn remove(&mut self, label: &str) -> Option<Field> {
        let idx = self.fields.iter().position(|f| f.label.as_str() == label)?;
        Some(self.fields.remove(idx))
    }

    /// Rebuilds every field type, keeping labels and their order.
    #[must_use]
    pub fn map_types(self, mut f: impl FnMut(&Label, Type) -> Type) -> Record {
        let fields = self
            .fields
            .into_iter()
            .map(|Field { label, ty }| {
                let ty = f(&label, ty);
                Field { label, ty }
            })
            .collect();
        Record { fields }
    }

    /// Wraps fields whose labels the caller already checked for uniqueness.
    pub(crate) fn from_unique(fields: Vec<Field>) -> Record {
        Record { fields }
    }
}

impl FromIterator<Field> for Record {
    /// Later fields replace earlier ones with the same label.
    fn from_iter<T: IntoIterator<Item = Field>>(iter: T) -> Self {
        let mut record = Record::new();
        for field in iter {
            record.insert(field);
        }
        record
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Field {
    pub label: Label,
    pub ty: Type,
}

impl Field {
    pub fn new(label: impl Into<Label>, ty: Type) -> Field {
        Field {
            label: label.into(),
            ty,
        }
    }
}

/// A record field label, stored without quotes.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Label(Box<str>);

impl Label {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the label can be written without backticks (reserved words
    /// aside).
    pub fn is_simple(label: &str) -> bool {
        let mut chars = label.chars();
        let Some(first) = chars.next() else {
            return false;
        };
        (first.is_alphabetic() || first == '_')
            && chars.all(|c| c.is_alphanumeric() || matches!(c, '-' | '/' | '_'))
    }

    /// Whether the label can be written at all, quoted or not.
    pub fn is_representable(label: &str) -> bool {
        Label::is_simple(label)
            || (!label.is_empty() && label.chars().all(|c| matches!(c, ' '..='~') && c != '`'))
    }
}

impl From<&str> for Label {
    fn from(value: &str) -> Self {
        Label(value.into())
    }
}

impl From<Box<str>> for Label {
    fn from(value: Box<str>) -> Self {
        Label(value)
    }
}

impl From<String> for Label {
    fn from(value: String) -> Self {
        Label(value.into_boxed_str())
    }
}

impl Borrow<str> for Label {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Label({:?})", self.0)
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_replaces_in_place() {
        let mut record: Record = [
            Field::new("a", Type::text()),
            Field::new("b", Type::scalar(builtins::BOOL)),
        ]
        .into_iter()
        .collect();

        let old = record.insert(Field::new("a", Type::scalar(builtins::NATURAL)));
        assert_eq!(old, Some(Field::new("a", Type::text())));
        let labels: Vec<_> = record.fields().iter().map(|f| f.label.as_str()).collect();
        assert_eq!(labels, ["a", "b"]);
        assert_eq!(record.get("a"), Some(&Type::scalar(builtins::NATURAL)));
    }

    #[test]
    fn test_remove() {
        let mut record: Record = [Field::new("name", Type::text())].into_iter().collect();
        assert!(record.remove("port").is_none());
        assert_eq!(record.remove("name"), Some(Field::new("name", Type::text())));
        assert!(record.is_empty());
    }

    #[test]
    fn test_is_scalar() {
        use builtins::*;
        for name in [TEXT, NATURAL, INTEGER, DOUBLE, BOOL] {
            assert!(Type::scalar(name).is_scalar(name), "{name}");
        }
        assert!(!Type::scalar(INTEGER).is_scalar(DOUBLE));
        assert!(!Type::list(Type::text()).is_scalar(TEXT));
    }

    #[test]
    fn test_label_classes() {
        assert!(Label::is_simple("kube-proxy"));
        assert!(Label::is_simple("_private/x"));
        assert!(Label::is_simple("größe"));
        assert!(!Label::is_simple("1st"));
        assert!(!Label::is_simple("app.kubernetes.io/name"));
        assert!(!Label::is_simple(""));

        assert!(Label::is_representable("app.kubernetes.io/name"));
        assert!(Label::is_representable("with space"));
        assert!(!Label::is_representable("back`tick"));
        assert!(!Label::is_representable("tab\there"));
        assert!(!Label::is_representable(""));
    }
}
