use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::EntityCategory;

static QUALIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[(（][^)）]*[)）]").expect("qualifier pattern is valid"));

/// An entity mention produced by the upstream recogniser.
///
/// Only `text` and `is_relevant` drive tree building; the span and label are
/// carried through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityRecord {
    pub text: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub start: usize,
    #[serde(default)]
    pub end: usize,
    #[serde(default, alias = "is_relevant", alias = "is_medical")]
    pub is_relevant: bool,
}

impl EntityRecord {
    pub fn new(text: impl Into<String>, is_relevant: bool) -> Self {
        let text = text.into();
        let end = text.chars().count();
        Self {
            text,
            label: String::new(),
            start: 0,
            end,
            is_relevant,
        }
    }
}

/// Removes parenthetical qualifiers, ASCII or full-width.
///
/// # Examples
///
/// ```
/// use kgtree::clean_entity_name;
///
/// assert_eq!(clean_entity_name("藝群保養品(玻尿酸精華液領導品牌)"), "藝群保養品");
/// assert_eq!(clean_entity_name("亞洲皮膚科醫學會院士（AADV）"), "亞洲皮膚科醫學會院士");
/// ```
pub fn clean_entity_name(text: &str) -> String {
    QUALIFIER.replace_all(text, "").trim().to_string()
}

/// Groups relevant entity texts by category.
///
/// Irrelevant records are dropped; each category keeps its texts in
/// first-seen order without duplicates. Every category is present in the
/// result, possibly empty.
pub fn categorize_entities(records: &[EntityRecord]) -> BTreeMap<EntityCategory, Vec<String>> {
    let mut grouped: BTreeMap<EntityCategory, Vec<String>> = EntityCategory::ALL
        .into_iter()
        .map(|category| (category, Vec::new()))
        .collect();

    for record in records.iter().filter(|r| r.is_relevant) {
        let category = EntityCategory::categorize(&record.text);
        let texts = grouped.entry(category).or_default();
        if !texts.contains(&record.text) {
            texts.push(record.text.clone());
        }
    }

    grouped
}
