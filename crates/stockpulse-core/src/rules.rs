use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;

use crate::ConfigError;

/// Common English words that the symbol regex would otherwise flag as tickers.
const DEFAULT_STOPLIST: &[&str] = &[
    "THE", "AND", "FOR", "ARE", "BUT", "NOT", "YOU", "ALL", "CAN", "HER", "WAS", "ONE", "OUR",
    "HAD", "WHAT", "WERE", "WHEN", "YOUR", "HOW", "SAID", "EACH", "WHICH", "THEIR", "TIME",
    "WILL", "ABOUT", "IF", "UP", "OUT", "MANY", "THEN", "THEM", "THESE", "SO", "SOME", "WOULD",
    "MAKE", "LIKE", "INTO", "HIM", "HAS", "MORE", "GO", "NO", "WAY", "COULD", "MY", "THAN",
    "FIRST", "BEEN", "CALL", "WHO", "ITS", "NOW", "FIND", "LONG", "DOWN", "DAY", "DID", "GET",
    "COME", "MADE", "MAY", "PART", "NEW", "WORK", "USE", "MAN", "GIVE", "JUST", "WHERE", "MOST",
    "GOOD", "MUCH", "VERY", "HERE", "OVER", "SUCH", "TAKE", "WELL",
];

const DEFAULT_POSITIVE_KEYWORDS: &[&str] = &[
    "moon",
    "rocket",
    "breakout",
    "squeeze",
    "catalyst",
    "bullish",
    "pump",
    "explosive",
    "gains",
    "profit",
    "buy",
    "long",
    "hodl",
    "diamond hands",
];

const DEFAULT_NEGATIVE_KEYWORDS: &[&str] = &[
    "dump",
    "crash",
    "avoid",
    "scam",
    "bearish",
    "sell",
    "short",
    "paper hands",
    "loss",
    "bag",
    "pump and dump",
    "manipulation",
];

/// Extraction and scoring rules consumed by the pipeline.
///
/// The stoplist is matched against uppercased candidates; the keyword lists are
/// matched as lowercase substrings of the post text.
#[derive(Debug, Clone)]
pub struct MatchRules {
    pub stoplist: HashSet<String>,
    pub positive_keywords: Vec<String>,
    pub negative_keywords: Vec<String>,
}

impl Default for MatchRules {
    fn default() -> Self {
        Self {
            stoplist: DEFAULT_STOPLIST.iter().map(|s| (*s).to_string()).collect(),
            positive_keywords: DEFAULT_POSITIVE_KEYWORDS
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
            negative_keywords: DEFAULT_NEGATIVE_KEYWORDS
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
        }
    }
}

/// On-disk rules override. Omitted sections fall back to the compiled-in defaults.
#[derive(Debug, Deserialize)]
struct RulesFile {
    stoplist: Option<Vec<String>>,
    positive_keywords: Option<Vec<String>>,
    negative_keywords: Option<Vec<String>>,
}

/// Load and validate extraction/scoring rules from a YAML file.
///
/// Stoplist entries are uppercased, keywords lowercased, so the file may use
/// any casing.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_rules(path: &Path) -> Result<MatchRules, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::RulesFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let file: RulesFile = serde_yaml::from_str(&content)?;
    let defaults = MatchRules::default();

    let rules = MatchRules {
        stoplist: file.stoplist.map_or(defaults.stoplist, |words| {
            words.iter().map(|w| w.trim().to_uppercase()).collect()
        }),
        positive_keywords: file
            .positive_keywords
            .map_or(defaults.positive_keywords, normalize_keywords),
        negative_keywords: file
            .negative_keywords
            .map_or(defaults.negative_keywords, normalize_keywords),
    };

    validate_rules(&rules)?;

    Ok(rules)
}

fn normalize_keywords(keywords: Vec<String>) -> Vec<String> {
    keywords
        .iter()
        .map(|k| k.trim().to_lowercase())
        .collect()
}

fn validate_rules(rules: &MatchRules) -> Result<(), ConfigError> {
    if rules.stoplist.iter().any(String::is_empty) {
        return Err(ConfigError::Validation(
            "stoplist entries must be non-empty".to_string(),
        ));
    }

    for (name, keywords) in [
        ("positive_keywords", &rules.positive_keywords),
        ("negative_keywords", &rules.negative_keywords),
    ] {
        if keywords.is_empty() {
            return Err(ConfigError::Validation(format!(
                "{name} must list at least one keyword"
            )));
        }
        if keywords.iter().any(String::is_empty) {
            return Err(ConfigError::Validation(format!(
                "{name} entries must be non-empty"
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_the_usual_suspects() {
        let rules = MatchRules::default();
        assert!(rules.stoplist.contains("THE"));
        assert!(rules.stoplist.contains("IF"));
        assert!(rules.positive_keywords.iter().any(|k| k == "moon"));
        assert!(rules.positive_keywords.iter().any(|k| k == "diamond hands"));
        assert!(rules.negative_keywords.iter().any(|k| k == "dump"));
        assert!(rules.negative_keywords.iter().any(|k| k == "pump and dump"));
    }

    #[test]
    fn partial_file_keeps_default_sections() {
        let yaml = "positive_keywords:\n  - Rally\n  - Soar\n";
        let file: RulesFile = serde_yaml::from_str(yaml).unwrap();
        let defaults = MatchRules::default();
        let rules = MatchRules {
            stoplist: file.stoplist.map_or(defaults.stoplist.clone(), |words| {
                words.iter().map(|w| w.trim().to_uppercase()).collect()
            }),
            positive_keywords: file
                .positive_keywords
                .map_or(defaults.positive_keywords.clone(), normalize_keywords),
            negative_keywords: file
                .negative_keywords
                .map_or(defaults.negative_keywords.clone(), normalize_keywords),
        };
        assert_eq!(rules.positive_keywords, vec!["rally", "soar"]);
        assert_eq!(rules.negative_keywords, defaults.negative_keywords);
        assert_eq!(rules.stoplist, defaults.stoplist);
    }

    #[test]
    fn validate_rejects_empty_keyword_list() {
        let rules = MatchRules {
            positive_keywords: Vec::new(),
            ..MatchRules::default()
        };
        let err = validate_rules(&rules).unwrap_err();
        assert!(err.to_string().contains("positive_keywords"));
    }

    #[test]
    fn validate_rejects_blank_entry() {
        let mut rules = MatchRules::default();
        rules.negative_keywords.push(String::new());
        let err = validate_rules(&rules).unwrap_err();
        assert!(err.to_string().contains("negative_keywords"));
    }

    #[test]
    fn load_rules_from_real_file() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join("config")
            .join("rules.yaml");
        assert!(
            path.exists(),
            "rules.yaml missing at {path:?} — required for this test"
        );
        let rules = load_rules(&path).expect("rules.yaml should load");
        assert!(rules.stoplist.contains("THE"));
        assert!(!rules.positive_keywords.is_empty());
        assert!(!rules.negative_keywords.is_empty());
    }
}
