//! Concept extraction from identifiers
//!
//! Two passes over the corpus: [`ConceptExtractor::add_file`] collects
//! identifier tokens and document frequencies, then [`ConceptExtractor::extract`]
//! picks a tier per file:
//! - tier 1 (fewer than 3 functions): the role is the only concept
//! - tier 2 (fewer than 10 functions or 20 distinct tokens): top-3 tokens
//! - tier 3: TF-IDF with co-occurrence clustering

use std::collections::{BTreeMap, BTreeSet, HashMap};

use super::models::{Concept, Role};
use crate::scanning::models::{file_stem, FileSyntax};

const STOPWORDS: &[&str] = &[
    "the", "a", "an", "is", "are", "was", "were", "be", "been", "being", "have", "has", "had",
    "do", "does", "did", "will", "would", "could", "should", "may", "might", "must", "shall",
    "can", "need", "dare", "to", "of", "in", "for", "on", "with", "at", "by", "from", "as",
    "into", "through", "during", "before", "after", "above", "below", "and", "or", "but", "if",
    "then", "else", "when", "where", "why", "how", "all", "each", "every", "both", "few", "more",
    "most", "other", "some", "such", "no", "nor", "not", "only", "own", "same", "so", "than",
    "too", "very", "just", "also", "now", "here", "there", "self", "this", "that", "these",
    "those", "what", "which", "who", "none", "true", "false", "null", "nil", "return", "def",
    "class", "func", "function", "var", "let", "const", "import", "export", "public", "private",
    "protected", "static", "final", "abstract", "get", "set", "new", "init", "main", "args",
    "kwargs", "str", "int", "float", "bool", "list", "dict", "tuple", "type", "any", "object",
    "value", "key", "item", "data", "result", "output", "input", "name", "path", "file", "dir",
    "config", "options", "settings", "error", "exception", "test", "tests", "spec", "mock",
    "stub",
];

const SKIPPED_PATH_PARTS: &[&str] = &["src", "__pycache__", ".", "..", "__init__"];

const TIER1_MAX_FUNCTIONS: usize = 3;
const TIER2_MAX_FUNCTIONS: usize = 10;
const TIER2_MAX_UNIQUE: usize = 20;

const COOCCURRENCE_WINDOW: usize = 3;
const MIN_COOCCURRENCE: usize = 2;
const MAX_CLUSTER_SIZE: usize = 10;
const MAX_CONCEPTS: usize = 5;

/// Split `snake_case` / `camelCase` / `HTTPServer` into lowercase parts
pub fn split_identifier(name: &str) -> Vec<String> {
    if name.contains('_') {
        return name
            .split('_')
            .filter(|p| !p.is_empty())
            .map(str::to_lowercase)
            .collect();
    }
    camel_parts(name)
}

/// Words of a camelCase name: a lowercase run with an optional leading
/// capital, or an upper-case run that ends before the next capitalized word
fn camel_parts(name: &str) -> Vec<String> {
    let chars: Vec<char> = name.chars().collect();
    let mut parts = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c.is_ascii_lowercase() {
            let start = i;
            while i < chars.len() && chars[i].is_ascii_lowercase() {
                i += 1;
            }
            parts.push(chars[start..i].iter().collect::<String>());
        } else if c.is_ascii_uppercase() {
            let start = i;
            while i < chars.len() && chars[i].is_ascii_uppercase() {
                i += 1;
            }
            let run = i - start;
            if i < chars.len() && chars[i].is_ascii_lowercase() {
                // Last capital starts a word: "HTTPServer" -> "http" + "server"
                if run > 1 {
                    parts.push(chars[start..i - 1].iter().collect::<String>().to_lowercase());
                }
                let word_start = i - 1;
                while i < chars.len() && chars[i].is_ascii_lowercase() {
                    i += 1;
                }
                parts.push(chars[word_start..i].iter().collect::<String>().to_lowercase());
            } else if i >= chars.len() {
                parts.push(chars[start..i].iter().collect::<String>().to_lowercase());
            } else if run > 1 {
                parts.push(chars[start..i - 1].iter().collect::<String>().to_lowercase());
            }
        } else {
            i += 1;
        }
    }
    parts
}

fn keep_token(token: &str) -> bool {
    token.len() > 2 && !STOPWORDS.contains(&token)
}

/// Tokens from function names and parameters, class names and fields.
///
/// Methods are already part of `functions`, so they are not visited again
/// through their classes.
pub fn extract_identifiers(syntax: &FileSyntax) -> Vec<String> {
    let mut raw = Vec::new();
    for function in &syntax.functions {
        raw.push(function.name.as_str());
        raw.extend(function.params.iter().map(String::as_str));
    }
    for class in &syntax.classes {
        raw.push(class.name.as_str());
        raw.extend(class.fields.iter().map(String::as_str));
    }
    raw.into_iter()
        .flat_map(split_identifier)
        .filter(|t| keep_token(t))
        .collect()
}

/// Tokens from directory names and the file stem
pub fn extract_path_tokens(path: &str) -> Vec<String> {
    let parts: Vec<&str> = path.split('/').collect();
    let mut tokens = Vec::new();
    for (i, part) in parts.iter().enumerate() {
        let stem = if i + 1 == parts.len() { file_stem(part) } else { part };
        if SKIPPED_PATH_PARTS.contains(&stem) {
            continue;
        }
        tokens.extend(split_identifier(stem));
    }
    tokens.retain(|t| keep_token(t));
    tokens
}

/// `-Σ w·log2 w` over positive weights
pub fn concept_entropy(weights: impl IntoIterator<Item = f64>) -> f64 {
    weights
        .into_iter()
        .filter(|w| *w > 0.0)
        .map(|w| -w * w.log2())
        .sum()
}

/// Token counts in first-seen order, so ties resolve deterministically
fn ordered_counts(tokens: &[String]) -> Vec<(String, usize)> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut counts: Vec<(String, usize)> = Vec::new();
    for token in tokens {
        match index.get(token.as_str()) {
            Some(&i) => counts[i].1 += 1,
            None => {
                index.insert(token, counts.len());
                counts.push((token.clone(), 1));
            }
        }
    }
    counts
}

/// Output of [`ConceptExtractor::extract`]
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedConcepts {
    pub concepts: Vec<Concept>,
    pub entropy: f64,
    pub tier: u8,
}

/// Corpus-wide token statistics for concept extraction
#[derive(Debug, Default)]
pub struct ConceptExtractor {
    identifiers: HashMap<String, Vec<String>>,
    doc_freq: HashMap<String, usize>,
    imports: HashMap<String, BTreeSet<String>>,
    import_doc_freq: HashMap<String, usize>,
    num_docs: usize,
    idf: HashMap<String, f64>,
}

impl ConceptExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// First pass: record a file's tokens and imports
    pub fn add_file(&mut self, syntax: &FileSyntax) {
        let mut tokens = extract_identifiers(syntax);
        tokens.extend(extract_path_tokens(&syntax.path));

        let unique: BTreeSet<&String> = tokens.iter().collect();
        for token in unique {
            *self.doc_freq.entry(token.clone()).or_insert(0) += 1;
        }
        self.identifiers.insert(syntax.path.clone(), tokens);

        let sources: BTreeSet<String> = syntax
            .imports
            .iter()
            .filter(|i| !i.source.is_empty())
            .map(|i| i.source.clone())
            .collect();
        for source in &sources {
            *self.import_doc_freq.entry(source.clone()).or_insert(0) += 1;
        }
        self.imports.insert(syntax.path.clone(), sources);
        self.num_docs += 1;
    }

    /// `ln(N/df) + 1` for every token seen in the first pass
    pub fn compute_idf(&mut self) {
        if self.num_docs == 0 {
            return;
        }
        let n = self.num_docs as f64;
        self.idf = self
            .doc_freq
            .iter()
            .map(|(token, &df)| (token.clone(), (n / df as f64).ln() + 1.0))
            .collect();
    }

    /// Surprise of each import: `-log2(files importing it / files)`
    pub fn import_fingerprint(&self, path: &str) -> BTreeMap<String, f64> {
        let Some(sources) = self.imports.get(path) else {
            return BTreeMap::new();
        };
        if self.num_docs == 0 {
            return BTreeMap::new();
        }
        sources
            .iter()
            .map(|source| {
                let freq = self.import_doc_freq.get(source).copied().unwrap_or(1);
                (source.clone(), -(freq as f64 / self.num_docs as f64).log2())
            })
            .collect()
    }

    /// Second pass: concepts for one file
    pub fn extract(&self, syntax: &FileSyntax, role: Role) -> ExtractedConcepts {
        let empty = Vec::new();
        let tokens = self.identifiers.get(&syntax.path).unwrap_or(&empty);
        let unique = tokens.iter().collect::<BTreeSet<_>>().len();

        let tier = if syntax.function_count() < TIER1_MAX_FUNCTIONS {
            1
        } else if syntax.function_count() < TIER2_MAX_FUNCTIONS || unique < TIER2_MAX_UNIQUE {
            2
        } else {
            3
        };

        let concepts = match tier {
            1 => {
                let label = role.as_str().to_lowercase();
                vec![Concept {
                    topic: label.clone(),
                    weight: 1.0,
                    keywords: vec![label],
                }]
            }
            2 => top_tokens(tokens),
            _ => self.tfidf_concepts(tokens),
        };
        let entropy = if tier == 1 {
            0.0
        } else {
            concept_entropy(concepts.iter().map(|c| c.weight))
        };

        ExtractedConcepts {
            concepts,
            entropy,
            tier,
        }
    }

    fn tfidf_concepts(&self, tokens: &[String]) -> Vec<Concept> {
        if tokens.is_empty() {
            return Vec::new();
        }
        let total = tokens.len() as f64;
        let tfidf: HashMap<String, f64> = ordered_counts(tokens)
            .into_iter()
            .map(|(token, count)| {
                let idf = self.idf.get(&token).copied().unwrap_or(0.0);
                (token, count as f64 / total * idf)
            })
            .collect();
        let score = |t: &str| tfidf.get(t).copied().unwrap_or(0.0);
        let total_weight: f64 = tfidf.values().sum();

        let mut concepts: Vec<Concept> = cluster_tokens(tokens, &tfidf)
            .into_iter()
            .filter(|cluster| !cluster.is_empty())
            .map(|cluster| {
                let mass: f64 = cluster.iter().map(|t| score(t)).sum();
                Concept {
                    topic: cluster[0].clone(),
                    weight: if total_weight > 0.0 { mass / total_weight } else { mass },
                    keywords: cluster.iter().take(MAX_CONCEPTS).cloned().collect(),
                }
            })
            .collect();

        concepts.sort_by(|a, b| b.weight.total_cmp(&a.weight));
        normalize_weights(&mut concepts);
        concepts
    }
}

fn normalize_weights(concepts: &mut [Concept]) {
    let sum: f64 = concepts.iter().map(|c| c.weight).sum();
    if sum > 0.0 {
        for concept in concepts.iter_mut() {
            concept.weight /= sum;
        }
    }
}

/// Tier 2: the three most frequent tokens
fn top_tokens(tokens: &[String]) -> Vec<Concept> {
    if tokens.is_empty() {
        return Vec::new();
    }
    let mut counts = ordered_counts(tokens);
    // Stable sort keeps first-seen order among equal counts
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    let total = tokens.len() as f64;
    let mut concepts: Vec<Concept> = counts
        .into_iter()
        .take(3)
        .map(|(token, count)| Concept {
            topic: token.clone(),
            weight: count as f64 / total,
            keywords: vec![token],
        })
        .collect();
    normalize_weights(&mut concepts);
    concepts
}

/// Greedy co-occurrence clustering; each cluster is sorted by TF-IDF
/// descending, at most five clusters by summed TF-IDF
fn cluster_tokens(tokens: &[String], tfidf: &HashMap<String, f64>) -> Vec<Vec<String>> {
    let score = |t: &str| tfidf.get(t).copied().unwrap_or(0.0);
    let by_score = |cluster: &mut Vec<String>| {
        cluster.sort_by(|a, b| score(b).total_cmp(&score(a)).then_with(|| a.cmp(b)));
    };

    let unique: Vec<String> = ordered_counts(tokens).into_iter().map(|(t, _)| t).collect();
    if unique.len() < 5 {
        let mut clusters: Vec<Vec<String>> = unique
            .into_iter()
            .filter(|t| score(t) > 0.0)
            .map(|t| vec![t])
            .collect();
        clusters.sort_by(|a, b| score(&b[0]).total_cmp(&score(&a[0])));
        return clusters;
    }

    let mut cooccur: BTreeMap<(&str, &str), usize> = BTreeMap::new();
    for (i, token) in tokens.iter().enumerate() {
        let lo = i.saturating_sub(COOCCURRENCE_WINDOW);
        let hi = (i + COOCCURRENCE_WINDOW + 1).min(tokens.len());
        for (j, other) in tokens.iter().enumerate().take(hi).skip(lo) {
            if i == j {
                continue;
            }
            let key = if token.as_str() < other.as_str() {
                (token.as_str(), other.as_str())
            } else {
                (other.as_str(), token.as_str())
            };
            *cooccur.entry(key).or_insert(0) += 1;
        }
    }

    let mut pairs: Vec<((&str, &str), usize)> = cooccur.into_iter().collect();
    pairs.sort_by(|a, b| b.1.cmp(&a.1));

    let mut cluster_of: HashMap<&str, usize> =
        unique.iter().enumerate().map(|(i, t)| (t.as_str(), i)).collect();
    let mut clusters: Vec<Option<Vec<&str>>> =
        unique.iter().map(|t| Some(vec![t.as_str()])).collect();

    for ((a, b), count) in pairs {
        if count < MIN_COOCCURRENCE {
            continue;
        }
        let (ca, cb) = (cluster_of[a], cluster_of[b]);
        if ca == cb {
            continue;
        }
        let size = |c: usize, clusters: &[Option<Vec<&str>>]| clusters[c].as_ref().map_or(0, Vec::len);
        if size(ca, &clusters) + size(cb, &clusters) > MAX_CLUSTER_SIZE {
            continue;
        }
        if let Some(moved) = clusters[cb].take() {
            for &t in &moved {
                cluster_of.insert(t, ca);
            }
            if let Some(target) = clusters[ca].as_mut() {
                target.extend(moved);
            }
        }
    }

    let mut result: Vec<Vec<String>> = clusters
        .into_iter()
        .flatten()
        .filter(|c| c.len() > 1 || c.iter().any(|t| score(t) > 0.1))
        .map(|c| {
            let mut cluster: Vec<String> = c.into_iter().map(str::to_string).collect();
            by_score(&mut cluster);
            cluster
        })
        .collect();
    let mass = |c: &Vec<String>| c.iter().map(|t| score(t)).sum::<f64>();
    result.sort_by(|a, b| mass(b).total_cmp(&mass(a)));
    result.truncate(MAX_CONCEPTS);
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_identifier_styles() {
        assert_eq!(split_identifier("parse_config_file"), vec!["parse", "config", "file"]);
        assert_eq!(split_identifier("parseConfigFile"), vec!["parse", "config", "file"]);
        assert_eq!(split_identifier("HTTPServer"), vec!["http", "server"]);
        assert_eq!(split_identifier("getURL"), vec!["get", "url"]);
    }

    #[test]
    fn test_path_tokens_skip_src_and_stopwords() {
        assert_eq!(
            extract_path_tokens("src/signals/plugins/centrality.py"),
            vec!["signals", "plugins", "centrality"]
        );
    }

    #[test]
    fn test_entropy_of_uniform_weights() {
        assert!((concept_entropy([0.5, 0.5]) - 1.0).abs() < 1e-12);
        assert_eq!(concept_entropy([1.0]), 0.0);
    }

    #[test]
    fn test_top_tokens_normalizes_weights() {
        let tokens: Vec<String> = ["cache", "cache", "cache", "evict", "evict", "ttl", "size"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let concepts = top_tokens(&tokens);
        assert_eq!(concepts.len(), 3);
        assert_eq!(concepts[0].topic, "cache");
        assert!((concepts[0].weight - 0.5).abs() < 1e-12);
        let sum: f64 = concepts.iter().map(|c| c.weight).sum();
        assert!((sum - 1.0).abs() < 1e-12);
    }
}
