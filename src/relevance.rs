//! Relevance and synonym filtering for knowledge-base labels.
//!
//! A label is kept only if it is written in the target script and mentions at
//! least one term from the relevance vocabulary. The synonym table lets the
//! pipeline recognise labels that name the entity itself.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Keywords marking a label as relevant to the commercial medical-aesthetics domain.
const DEFAULT_KEYWORDS: &[&str] = &[
    "商業", "經濟", "市場", "消費", "服務", "產業", "管理", "營銷", "行銷", "銷售", "客戶", "顧客",
    "價值", "品牌", "產品", "療程", "美容", "診所", "門診", "保健", "健康", "治療", "醫療", "照護",
    "護理", "專科", "臨床", "整形", "整型", "皮膚", "醫美", "外科", "手術", "注射", "雷射", "微整",
    "抗衰", "年輕", "美學",
];

const DEFAULT_SYNONYMS: &[(&str, &[&str])] = &[
    (
        "醫美",
        &["醫學美容", "醫療美容", "美容醫學", "美容醫療", "整形美容", "美容外科", "整形手術"],
    ),
    ("整型外科", &["整形外科", "整形", "整型", "美容外科", "整形美容"]),
    ("皮膚科", &["皮膚醫學", "皮膚醫療", "皮膚美容"]),
];

static DEFAULT_CONFIG: LazyLock<RelevanceConfig> = LazyLock::new(|| RelevanceConfig {
    keywords: DEFAULT_KEYWORDS.iter().map(|k| k.to_string()).collect(),
    synonyms: DEFAULT_SYNONYMS
        .iter()
        .map(|(key, terms)| {
            (
                key.to_string(),
                terms.iter().map(|t| t.to_string()).collect(),
            )
        })
        .collect(),
});

/// Errors raised while loading a vocabulary file.
#[derive(Debug, Error)]
pub enum VocabularyError {
    #[error("Failed to read vocabulary file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse vocabulary file {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Vocabulary keywords cannot be empty")]
    Empty,
}

/// Vocabulary driving the relevance filter.
///
/// Loaded once at startup and treated as read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelevanceConfig {
    pub keywords: BTreeSet<String>,
    /// Canonical term -> interchangeable terms.
    #[serde(default)]
    pub synonyms: BTreeMap<String, Vec<String>>,
}

impl Default for RelevanceConfig {
    fn default() -> Self {
        DEFAULT_CONFIG.clone()
    }
}

impl RelevanceConfig {
    /// Loads a vocabulary from a JSON file of the form
    /// `{"keywords": [...], "synonyms": {"term": [...]}}`.
    pub fn load(path: &Path) -> Result<Self, VocabularyError> {
        let raw = fs::read_to_string(path).map_err(|source| VocabularyError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&raw).map_err(|source| VocabularyError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        if config.keywords.is_empty() {
            return Err(VocabularyError::Empty);
        }
        Ok(config)
    }
}

/// Script and keyword gate for knowledge-base labels.
///
/// # Examples
///
/// ```
/// use kgtree::RelevanceFilter;
///
/// let filter = RelevanceFilter::default();
/// assert!(filter.is_relevant("醫療服務"));
/// assert!(!filter.is_relevant("medical service"));
/// assert!(!filter.is_relevant("城市"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct RelevanceFilter {
    config: RelevanceConfig,
}

impl RelevanceFilter {
    pub fn new(config: RelevanceConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RelevanceConfig {
        &self.config
    }

    /// Whether `label` contains at least one CJK unified ideograph.
    pub fn is_target_script(label: &str) -> bool {
        label.chars().any(|c| ('\u{4e00}'..='\u{9fff}').contains(&c))
    }

    /// Whether `label` mentions any relevance keyword.
    pub fn has_keyword(&self, label: &str) -> bool {
        self.config
            .keywords
            .iter()
            .any(|keyword| label.contains(keyword.as_str()))
    }

    /// Both the script and the keyword condition must hold.
    pub fn is_relevant(&self, label: &str) -> bool {
        Self::is_target_script(label) && self.has_keyword(label)
    }

    /// Returns `term` together with every canonical key and synonym of any
    /// synonym group it belongs to.
    ///
    /// # Examples
    ///
    /// ```
    /// use kgtree::RelevanceFilter;
    ///
    /// let filter = RelevanceFilter::default();
    /// let expanded = filter.expand_synonyms("皮膚醫學");
    /// assert!(expanded.contains("皮膚科"));
    /// assert!(expanded.contains("皮膚美容"));
    ///
    /// let unknown = filter.expand_synonyms("牙科");
    /// assert_eq!(unknown.len(), 1);
    /// ```
    pub fn expand_synonyms(&self, term: &str) -> BTreeSet<String> {
        let mut related = BTreeSet::from([term.to_string()]);

        for (key, synonyms) in &self.config.synonyms {
            if key == term || synonyms.iter().any(|s| s == term) {
                related.insert(key.clone());
                related.extend(synonyms.iter().cloned());
            }
        }

        related
    }

    /// Whether `label` names the same concept as `entity`, in either
    /// direction of the synonym table.
    pub fn refers_to_same(&self, label: &str, entity: &str) -> bool {
        label == entity || self.expand_synonyms(entity).contains(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn script_check_requires_cjk() {
        assert!(RelevanceFilter::is_target_script("醫療"));
        assert!(RelevanceFilter::is_target_script("Dr.FreeVenus藝群"));
        assert!(!RelevanceFilter::is_target_script("medicine"));
        assert!(!RelevanceFilter::is_target_script("いりょう"));
    }

    #[test]
    fn relevance_needs_script_and_keyword() {
        let filter = RelevanceFilter::default();

        assert!(filter.is_relevant("醫學美容"));
        assert!(filter.is_relevant("雷射治療"));
        // script ok, no keyword
        assert!(!filter.is_relevant("物理學"));
        // keyword as latin text is not in script
        assert!(!filter.is_relevant("brand management"));
    }

    #[test]
    fn expand_synonyms_from_canonical_key() {
        let filter = RelevanceFilter::default();
        let expanded = filter.expand_synonyms("醫美");

        assert!(expanded.contains("醫美"));
        assert!(expanded.contains("醫學美容"));
        assert!(expanded.contains("整形手術"));
        assert_eq!(expanded.len(), 8);
    }

    #[test]
    fn expand_synonyms_merges_every_matching_group() {
        let filter = RelevanceFilter::default();
        // listed under both 醫美 and 整型外科
        let expanded = filter.expand_synonyms("美容外科");

        assert!(expanded.contains("醫美"));
        assert!(expanded.contains("整型外科"));
        assert!(expanded.contains("整形外科"));
        assert!(expanded.contains("醫療美容"));
    }

    #[test]
    fn expand_synonyms_of_unknown_term_is_itself() {
        let filter = RelevanceFilter::default();
        assert_eq!(
            filter.expand_synonyms("牙科"),
            BTreeSet::from(["牙科".to_string()])
        );
    }

    #[test]
    fn refers_to_same_is_bidirectional() {
        let filter = RelevanceFilter::default();

        assert!(filter.refers_to_same("皮膚科", "皮膚醫學"));
        assert!(filter.refers_to_same("皮膚醫學", "皮膚科"));
        assert!(filter.refers_to_same("雷射", "雷射"));
        assert!(!filter.refers_to_same("醫美", "皮膚科"));
    }

    #[test]
    fn custom_vocabulary_replaces_defaults() {
        let filter = RelevanceFilter::new(RelevanceConfig {
            keywords: BTreeSet::from(["牙".to_string()]),
            synonyms: BTreeMap::new(),
        });

        assert!(filter.is_relevant("牙科"));
        assert!(!filter.is_relevant("醫療服務"));
    }

    #[test]
    fn load_reads_json_vocabulary() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("vocab.json");
        fs::write(
            &path,
            r#"{"keywords": ["牙"], "synonyms": {"牙科": ["齒科"]}}"#,
        )
        .unwrap();

        let config = RelevanceConfig::load(&path).unwrap();
        let filter = RelevanceFilter::new(config);

        assert!(filter.refers_to_same("齒科", "牙科"));
    }

    #[test]
    fn load_rejects_empty_keywords() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("vocab.json");
        fs::write(&path, r#"{"keywords": []}"#).unwrap();

        let error = RelevanceConfig::load(&path).unwrap_err();
        assert!(matches!(error, VocabularyError::Empty));
    }

    #[test]
    fn load_reports_unreadable_and_malformed_files() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("vocab.json");

        let missing = RelevanceConfig::load(&path).unwrap_err();
        assert!(matches!(missing, VocabularyError::Io { .. }));

        fs::write(&path, r#"{"synonyms": {}}"#).unwrap();
        let malformed = RelevanceConfig::load(&path).unwrap_err();
        assert!(matches!(malformed, VocabularyError::Json { .. }));
        assert!(malformed.to_string().contains("vocab.json"));
    }
}
