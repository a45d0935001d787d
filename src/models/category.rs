use std::fmt;

use serde::{Deserialize, Serialize};

/// Coarse grouping of recognised entities; each group gets its own set of trees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityCategory {
    #[serde(rename = "medical_institution")]
    Institution,
    Product,
    Treatment,
    Title,
    Specialty,
    Other,
}

impl EntityCategory {
    /// Categories in the order they are checked by [`EntityCategory::categorize`].
    pub const ALL: [EntityCategory; 6] = [
        EntityCategory::Institution,
        EntityCategory::Product,
        EntityCategory::Treatment,
        EntityCategory::Title,
        EntityCategory::Specialty,
        EntityCategory::Other,
    ];

    /// Keywords whose presence in an entity's text selects this category.
    pub fn keywords(self) -> &'static [&'static str] {
        match self {
            EntityCategory::Institution => &["診所", "醫院", "集團"],
            EntityCategory::Product => &["保養品", "玻尿酸", "精華液"],
            EntityCategory::Treatment => &["雷射", "整形", "美容", "醫美"],
            EntityCategory::Title => &["醫師", "院長", "主治醫師", "理事長"],
            EntityCategory::Specialty => &["皮膚科", "醫學美容", "整形外科"],
            EntityCategory::Other => &[],
        }
    }

    /// Assigns the first category whose keywords appear in `text`.
    ///
    /// # Examples
    ///
    /// ```
    /// use kgtree::EntityCategory;
    ///
    /// assert_eq!(EntityCategory::categorize("藝群皮膚科診所"), EntityCategory::Institution);
    /// assert_eq!(EntityCategory::categorize("玻尿酸"), EntityCategory::Product);
    /// assert_eq!(EntityCategory::categorize("台南市"), EntityCategory::Other);
    /// ```
    pub fn categorize(text: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|category| category.keywords().iter().any(|k| text.contains(k)))
            .unwrap_or(EntityCategory::Other)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EntityCategory::Institution => "medical_institution",
            EntityCategory::Product => "product",
            EntityCategory::Treatment => "treatment",
            EntityCategory::Title => "title",
            EntityCategory::Specialty => "specialty",
            EntityCategory::Other => "other",
        }
    }
}

impl fmt::Display for EntityCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_matching_category_wins() {
        // 醫學美容 is both a treatment (美容) and a specialty; treatment is checked first
        assert_eq!(
            EntityCategory::categorize("醫學美容"),
            EntityCategory::Treatment
        );
        // 集團 beats 美容
        assert_eq!(
            EntityCategory::categorize("藝群醫學美容集團"),
            EntityCategory::Institution
        );
        assert_eq!(EntityCategory::categorize("院長"), EntityCategory::Title);
        assert_eq!(
            EntityCategory::categorize("皮膚科"),
            EntityCategory::Specialty
        );
    }

    #[test]
    fn serde_names_match_batch_format() {
        assert_eq!(
            serde_json::to_string(&EntityCategory::Institution).unwrap(),
            "\"medical_institution\""
        );
        assert_eq!(
            serde_json::to_string(&EntityCategory::Specialty).unwrap(),
            "\"specialty\""
        );
        for category in EntityCategory::ALL {
            let json = serde_json::to_string(&category).unwrap();
            assert_eq!(json, format!("\"{category}\""));
        }
    }
}
