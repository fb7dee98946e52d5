//! Recognition of fields whose text follows a known structure.
//!
//! A [`Convention`] pairs field labels and a scalar type with the record
//! type that replaces them. Only labels and types are consulted; values are
//! not visible at this stage.

use crate::{
    ast::{builtins, Field, Label, Record, Type},
    samples::TypePath,
    transform::Pass,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Convention {
    fields: Vec<Label>,
    scalar: Box<str>,
    replacement: Record,
}

impl Convention {
    pub fn new<L: Into<Label>>(
        fields: impl IntoIterator<Item = L>,
        scalar: &str,
        replacement: Record,
    ) -> Convention {
        Convention {
            fields: fields.into_iter().map(Into::into).collect(),
            scalar: scalar.into(),
            replacement,
        }
    }

    /// Container image references, as in `registry.io/team/app:1.2@sha256:...`.
    pub fn image() -> Convention {
        Convention::new(["image"], builtins::TEXT, image_reference())
    }

    pub fn matches(&self, label: &Label, ty: &Type) -> bool {
        ty.is_scalar(&self.scalar) && self.fields.contains(label)
    }
}

/// `{ registry : Optional Text, repository : Text, tag : Optional Text,
/// digest : Optional Text }`
pub fn image_reference() -> Record {
    let optional_text = || Type::optional(Type::text());
    [
        Field::new("registry", optional_text()),
        Field::new("repository", Type::text()),
        Field::new("tag", optional_text()),
        Field::new("digest", optional_text()),
    ]
    .into_iter()
    .collect()
}

/// Rewrites record fields matched by a convention table. The first matching
/// convention wins.
#[derive(Clone, Debug)]
pub struct Substructures {
    conventions: Vec<Convention>,
}

impl Substructures {
    pub fn new(conventions: Vec<Convention>) -> Substructures {
        Substructures { conventions }
    }
}

impl Default for Substructures {
    fn default() -> Self {
        Substructures::new(vec![Convention::image()])
    }
}

impl Pass for Substructures {
    fn name(&self) -> &'static str {
        "substructures"
    }

    fn rewrite(&self, ty: Type, path: &TypePath) -> Type {
        let Type::Record(record) = ty else {
            return ty;
        };
        Type::Record(record.map_types(|label, ty| {
            match self.conventions.iter().find(|c| c.matches(label, &ty)) {
                Some(convention) => {
                    tracing::debug!(%path, field = %label, "recognized substructure");
                    Type::Record(convention.replacement.clone())
                }
                None => ty,
            }
        }))
    }
}
