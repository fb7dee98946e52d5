use serde::Deserialize;

use crate::{
    ast::{builtins, Type},
    error::{Error, Result},
    parser,
    samples::KeySamples,
    transform::{keyed_list::DEFAULT_KEY_FIELD, Convention, KeyedLists, Pipeline, Substructures},
};

/// Which strengthening passes to run, and how.
///
/// ```yaml
/// strengthen: true
/// key_field: name
/// conventions:
///   - fields: [image]
///     type: "{ registry : Optional Text, repository : Text, tag : Optional Text }"
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// When false, the pipeline is empty and types pass through untouched.
    pub strengthen: bool,
    pub key_field: String,
    /// `None` selects the built-in table (container images).
    pub conventions: Option<Vec<ConventionConfig>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConventionConfig {
    pub fields: Vec<String>,
    #[serde(default = "default_scalar")]
    pub scalar: String,
    /// Replacement record type, in type syntax.
    #[serde(rename = "type")]
    pub ty: String,
}

fn default_scalar() -> String {
    builtins::TEXT.to_owned()
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            strengthen: true,
            key_field: DEFAULT_KEY_FIELD.to_owned(),
            conventions: None,
        }
    }
}

impl PipelineConfig {
    pub fn from_yaml(src: &str) -> Result<PipelineConfig> {
        // An empty document means "all defaults".
        if src.trim().is_empty() {
            return Ok(PipelineConfig::default());
        }
        Ok(serde_yaml::from_str(src)?)
    }

    /// Collects list keys from a sample document under the configured key
    /// field.
    pub fn collect_samples(&self, document: &serde_yaml::Value) -> KeySamples {
        KeySamples::collect(document, &self.key_field)
    }

    /// Samples with no observations, keyed by the configured field.
    pub fn empty_samples(&self) -> KeySamples {
        KeySamples::new(self.key_field.as_str())
    }

    /// Assembles the pipeline: substructure recognition, then list
    /// strengthening. `samples` must be keyed by `key_field`.
    pub fn build(&self, samples: KeySamples) -> Result<Pipeline> {
        if samples.key_field().as_str() != self.key_field {
            return Err(Error::KeyFieldMismatch {
                configured: self.key_field.clone(),
                sampled: samples.key_field().to_string(),
            });
        }
        if !self.strengthen {
            tracing::info!("strengthening disabled, types pass through unchanged");
            return Ok(Pipeline::new());
        }
        let conventions = match &self.conventions {
            Some(configs) => configs
                .iter()
                .map(ConventionConfig::to_convention)
                .collect::<Result<Vec<_>>>()?,
            None => vec![Convention::image()],
        };
        let pipeline = Pipeline::new()
            .with(Substructures::new(conventions))
            .with(KeyedLists::new(samples));
        tracing::debug!(?pipeline, "built pipeline");
        Ok(pipeline)
    }
}

impl ConventionConfig {
    pub fn to_convention(&self) -> Result<Convention> {
        let invalid = |message: String| Error::Convention {
            fields: self.fields.clone(),
            message,
        };
        let replacement = match parser::parse_type(&self.ty, &mut Vec::new()) {
            Ok(Type::Record(record)) => record,
            Ok(other) => {
                return Err(invalid(format!("replacement `{other}` is not a record type")));
            }
            Err(error) => return Err(invalid(error.to_string())),
        };
        Ok(Convention::new(
            self.fields.iter().map(String::as_str),
            &self.scalar,
            replacement,
        ))
    }
}

#[cfg(test)]
mod tests {
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{parser::parse_in_new, printer::print_compact, samples::TypePath};

    #[test]
    fn test_defaults() {
        assert_eq!(PipelineConfig::from_yaml("").unwrap(), PipelineConfig::default());
        assert_eq!(
            PipelineConfig::from_yaml("key_field: id").unwrap(),
            PipelineConfig {
                key_field: "id".to_owned(),
                ..PipelineConfig::default()
            }
        );

        let config = PipelineConfig::default();
        let pipeline = config.build(config.empty_samples()).unwrap();
        assert_eq!(
            pipeline.pass_names().collect::<Vec<_>>(),
            ["substructures", "keyed-lists"]
        );
    }

    #[test]
    fn test_samples_must_match_key_field() {
        let document: serde_yaml::Value = serde_yaml::from_str(indoc! {"
            ports:
              - name: web
                id: a
              - name: metrics
                id: a
        "})
        .unwrap();
        let config = PipelineConfig::from_yaml("key_field: id").unwrap();

        let error = config
            .build(KeySamples::collect(&document, "name"))
            .unwrap_err();
        assert_eq!(
            error.to_string(),
            "samples were keyed by `name`, but the pipeline keys lists by `id`"
        );

        let pipeline = config.build(config.collect_samples(&document)).unwrap();
        let ty = parse_in_new("{ ports : List { id : Text, name : Text } }").unwrap();
        assert_eq!(
            print_compact(&pipeline.run(ty)),
            "{ ports : List { id : Text, name : Text } }"
        );
    }

    #[test]
    fn test_disabled() {
        let config = PipelineConfig::from_yaml("strengthen: false").unwrap();
        let pipeline = config.build(config.empty_samples()).unwrap();
        assert!(pipeline.is_empty());
    }

    #[test]
    fn test_custom_conventions() {
        let config = PipelineConfig::from_yaml(indoc! {r#"
            conventions:
              - fields: [image, initImage]
                type: "{ repository : Text, tag : Optional Text }"
        "#})
        .unwrap();
        let mut samples = config.empty_samples();
        samples.insert(TypePath::parse_dotted("containers"), ["app"]);

        let pipeline = config.build(samples).unwrap();
        let ty = parse_in_new("{ containers : List { name : Text, initImage : Text } }").unwrap();
        assert_eq!(
            print_compact(&pipeline.run(ty)),
            "{ containers : { app : { initImage : { repository : Text, tag : Optional Text } } } }"
        );
    }

    #[test]
    fn test_invalid_conventions() {
        let not_record = PipelineConfig::from_yaml(indoc! {"
            conventions:
              - fields: [image]
                type: List Text
        "})
        .unwrap();
        let error = not_record.build(not_record.empty_samples()).unwrap_err();
        assert_eq!(
            error.to_string(),
            r#"invalid convention for ["image"]: replacement `List Text` is not a record type"#
        );

        let malformed = PipelineConfig::from_yaml(indoc! {r#"
            conventions:
              - fields: [image]
                type: "{ repository Text }"
        "#})
        .unwrap();
        assert!(matches!(
            malformed.build(malformed.empty_samples()),
            Err(Error::Convention { .. })
        ));

        assert!(matches!(
            PipelineConfig::from_yaml("strenghten: true"),
            Err(Error::Yaml(_))
        ));
    }
}
