//! SPARQL 1.1 JSON result format.
//!
//! Only the parts the hierarchy pipeline reads are modelled; unknown fields are
//! ignored on input and the shape round-trips through the result cache.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::client::KbError;

/// A single bound RDF term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingValue {
    #[serde(rename = "type", default)]
    pub kind: String,
    pub value: String,
    #[serde(rename = "xml:lang", default, skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultHead {
    #[serde(default)]
    pub vars: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultBindings {
    pub bindings: Vec<BTreeMap<String, BindingValue>>,
}

/// Response body of a SELECT query: `{head: {vars}, results: {bindings: [...]}}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SparqlResults {
    #[serde(default)]
    pub head: ResultHead,
    pub results: ResultBindings,
}

/// A label string together with its language tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConceptLabel {
    pub text: String,
    pub lang: Option<String>,
}

impl ConceptLabel {
    /// Whether the label is tagged with `language` or one of its subtags
    /// (`zh` accepts `zh-hant`).
    pub fn is_in(&self, language: &str) -> bool {
        self.lang.as_deref().is_some_and(|lang| {
            lang.eq_ignore_ascii_case(language)
                || lang
                    .to_ascii_lowercase()
                    .starts_with(&format!("{}-", language.to_ascii_lowercase()))
        })
    }
}

impl SparqlResults {
    /// Parses a SPARQL JSON response body.
    ///
    /// # Errors
    ///
    /// Returns `KbError::Serialization` for invalid JSON and
    /// `KbError::MalformedResponse` when the `results.bindings` array is missing.
    pub fn from_json(body: &str) -> Result<Self, KbError> {
        let value: serde_json::Value = serde_json::from_str(body).map_err(KbError::Serialization)?;
        if value.pointer("/results/bindings").is_none() {
            return Err(KbError::MalformedResponse {
                message: "missing 'results.bindings' in response".to_string(),
            });
        }
        serde_json::from_value(value).map_err(KbError::Serialization)
    }

    /// Builds a result set binding `var` to each of `labels`.
    ///
    /// # Examples
    ///
    /// ```
    /// use kgtree::knowledge_base::SparqlResults;
    ///
    /// let results = SparqlResults::from_labels("itemLabel", "zh", ["醫學", "醫療服務"]);
    /// assert_eq!(results.len(), 2);
    /// assert_eq!(results.labels("itemLabel"), vec!["醫學", "醫療服務"]);
    /// ```
    pub fn from_labels<I, S>(var: &str, lang: &str, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let bindings = labels
            .into_iter()
            .map(|label| {
                let term = BindingValue {
                    kind: "literal".to_string(),
                    value: label.into(),
                    lang: Some(lang.to_string()),
                };
                BTreeMap::from([(var.to_string(), term)])
            })
            .collect();

        Self {
            head: ResultHead {
                vars: vec![var.to_string()],
            },
            results: ResultBindings { bindings },
        }
    }

    pub fn len(&self) -> usize {
        self.results.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.bindings.is_empty()
    }

    /// Returns every value bound to `var`, in response order.
    pub fn labels(&self, var: &str) -> Vec<String> {
        self.results
            .bindings
            .iter()
            .filter_map(|binding| binding.get(var))
            .map(|term| term.value.clone())
            .collect()
    }

    /// Returns the language-tagged labels bound to `var`.
    pub fn concept_labels(&self, var: &str) -> Vec<ConceptLabel> {
        self.results
            .bindings
            .iter()
            .filter_map(|binding| binding.get(var))
            .map(|term| ConceptLabel {
                text: term.value.clone(),
                lang: term.lang.clone(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WIKIDATA_RESPONSE: &str = r#"{
      "head": {"vars": ["item", "itemLabel"]},
      "results": {"bindings": [
        {"item": {"type": "uri", "value": "http://www.wikidata.org/entity/Q11190"},
         "itemLabel": {"xml:lang": "zh", "type": "literal", "value": "醫學"}},
        {"item": {"type": "uri", "value": "http://www.wikidata.org/entity/Q1"},
         "itemLabel": {"xml:lang": "zh-hant", "type": "literal", "value": "醫療服務"}},
        {"item": {"type": "uri", "value": "http://www.wikidata.org/entity/Q2"}}
      ]}
    }"#;

    #[test]
    fn from_json_parses_wikidata_response() {
        let results = SparqlResults::from_json(WIKIDATA_RESPONSE).unwrap();

        assert_eq!(results.len(), 3);
        assert_eq!(results.head.vars, vec!["item", "itemLabel"]);
        assert_eq!(results.labels("itemLabel"), vec!["醫學", "醫療服務"]);
    }

    #[test]
    fn concept_labels_carry_language() {
        let results = SparqlResults::from_json(WIKIDATA_RESPONSE).unwrap();
        let labels = results.concept_labels("itemLabel");

        assert_eq!(labels[0].lang.as_deref(), Some("zh"));
        assert!(labels[0].is_in("zh"));
        assert!(labels[1].is_in("zh"));
        assert!(!labels[1].is_in("en"));
    }

    #[test]
    fn from_json_rejects_missing_bindings() {
        let result = SparqlResults::from_json(r#"{"head": {"vars": []}}"#);
        assert!(matches!(result, Err(KbError::MalformedResponse { .. })));
    }

    #[test]
    fn from_json_rejects_invalid_json() {
        let result = SparqlResults::from_json("<html>rate limited</html>");
        assert!(matches!(result, Err(KbError::Serialization(_))));
    }

    #[test]
    fn empty_results_report_empty() {
        let results = SparqlResults::from_json(r#"{"results": {"bindings": []}}"#).unwrap();
        assert!(results.is_empty());
        assert!(results.labels("itemLabel").is_empty());
    }

    #[test]
    fn survives_json_value_round_trip() {
        let results = SparqlResults::from_json(WIKIDATA_RESPONSE).unwrap();

        let value = serde_json::to_value(&results).unwrap();
        let restored: SparqlResults = serde_json::from_value(value).unwrap();

        assert_eq!(restored, results);
    }

    #[test]
    fn binding_without_language_omits_lang_field() {
        let value = BindingValue {
            kind: "uri".to_string(),
            value: "http://www.wikidata.org/entity/Q11190".to_string(),
            lang: None,
        };

        let encoded = serde_json::to_value(&value).unwrap();

        assert!(encoded.get("xml:lang").is_none());
        assert_eq!(encoded["type"], "uri");
        let tagged = BindingValue {
            lang: Some("zh".to_string()),
            ..value
        };
        assert_eq!(serde_json::to_value(&tagged).unwrap()["xml:lang"], "zh");
    }
}
