//! Turns lists of keyed records into records keyed by the observed keys.
//!
//! `List { name : Text, port : Natural }`, holding the elements `web` and
//! `metrics` in every sample, becomes
//! `{ web : { port : Natural }, metrics : { port : Natural } }`.

use crate::{
    ast::{builtins, Field, Label, Record, Type},
    samples::{KeySamples, TypePath},
    transform::Pass,
};

pub const DEFAULT_KEY_FIELD: &str = "name";

/// Strengthens lists keyed by the field the samples were read from.
#[derive(Clone, Debug)]
pub struct KeyedLists {
    key_field: Label,
    samples: KeySamples,
}

impl KeyedLists {
    pub fn new(samples: KeySamples) -> KeyedLists {
        KeyedLists {
            key_field: samples.key_field().clone(),
            samples,
        }
    }

    /// Returns the element record if `ty` is a list whose elements carry a
    /// `Text` key field.
    fn keyed_element<'a>(&self, ty: &'a Type) -> Option<&'a Record> {
        let Type::List(element) = ty else {
            return None;
        };
        let record = element.as_record()?;
        record
            .get(self.key_field.as_str())
            .is_some_and(|key| key.is_scalar(builtins::TEXT))
            .then_some(record)
    }
}

impl Pass for KeyedLists {
    fn name(&self) -> &'static str {
        "keyed-lists"
    }

    fn rewrite(&self, ty: Type, path: &TypePath) -> Type {
        let Some(element) = self.keyed_element(&ty) else {
            return ty;
        };
        let keys = match self.samples.distinct_keys(path) {
            Ok(keys) => keys,
            Err(reason) => {
                tracing::trace!(%path, %reason, "keeping list");
                return ty;
            }
        };

        let mut entry = element.clone();
        entry.remove(self.key_field.as_str());
        let strengthened: Record = keys
            .iter()
            .map(|key| Field::new(key.clone(), Type::Record(entry.clone())))
            .collect();
        tracing::debug!(%path, keys = keys.len(), "strengthened list into record");
        Type::Record(strengthened)
    }
}
