//! Bag-of-words count vectorizer

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::collections::HashSet;
use std::sync::OnceLock;

use serde::Deserialize;
use serde::Serialize;

/// Sparse count rows over a fixed vocabulary
///
/// Each row holds `(column, count)` pairs sorted by column, zero counts
/// omitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureMatrix {
    n_features: usize,
    rows: Vec<Vec<(usize, u32)>>,
}

impl FeatureMatrix {
    pub fn new(n_features: usize, rows: Vec<Vec<(usize, u32)>>) -> Self {
        Self { n_features, rows }
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[Vec<(usize, u32)>] {
        &self.rows
    }

    /// Dense view of one row, mostly useful in tests and debugging
    pub fn dense_row(&self, index: usize) -> Vec<u32> {
        let mut dense = vec![0; self.n_features];
        if let Some(row) = self.rows.get(index) {
            for &(column, count) in row {
                dense[column] = count;
            }
        }
        dense
    }

}

/// scikit-learn's English stop list, applied on top of title normalization
const ENGLISH_STOP_WORDS: &[&str] = &[
    "a", "about", "above", "across", "after", "afterwards", "again", "against", "all",
    "almost", "alone", "along", "already", "also", "although", "always", "am", "among",
    "amongst", "amoungst", "amount", "an", "and", "another", "any", "anyhow", "anyone",
    "anything", "anyway", "anywhere", "are", "around", "as", "at", "back", "be", "became",
    "because", "become", "becomes", "becoming", "been", "before", "beforehand", "behind",
    "being", "below", "beside", "besides", "between", "beyond", "bill", "both", "bottom",
    "but", "by", "call", "can", "cannot", "cant", "co", "con", "could", "couldnt", "cry", "de",
    "describe", "detail", "do", "done", "down", "due", "during", "each", "eg", "eight",
    "either", "eleven", "else", "elsewhere", "empty", "enough", "etc", "even", "ever", "every",
    "everyone", "everything", "everywhere", "except", "few", "fifteen", "fifty", "fill",
    "find", "fire", "first", "five", "for", "former", "formerly", "forty", "found", "four",
    "from", "front", "full", "further", "get", "give", "go", "had", "has", "hasnt", "have",
    "he", "hence", "her", "here", "hereafter", "hereby", "herein", "hereupon", "hers",
    "herself", "him", "himself", "his", "how", "however", "hundred", "i", "ie", "if", "in",
    "inc", "indeed", "interest", "into", "is", "it", "its", "itself", "keep", "last", "latter",
    "latterly", "least", "less", "ltd", "made", "many", "may", "me", "meanwhile", "might",
    "mill", "mine", "more", "moreover", "most", "mostly", "move", "much", "must", "my",
    "myself", "name", "namely", "neither", "never", "nevertheless", "next", "nine", "no",
    "nobody", "none", "noone", "nor", "not", "nothing", "now", "nowhere", "of", "off", "often",
    "on", "once", "one", "only", "onto", "or", "other", "others", "otherwise", "our", "ours",
    "ourselves", "out", "over", "own", "part", "per", "perhaps", "please", "put", "rather",
    "re", "same", "see", "seem", "seemed", "seeming", "seems", "serious", "several", "she",
    "should", "show", "side", "since", "sincere", "six", "sixty", "so", "some", "somehow",
    "someone", "something", "sometime", "sometimes", "somewhere", "still", "such", "system",
    "take", "ten", "than", "that", "the", "their", "them", "themselves", "then", "thence",
    "there", "thereafter", "thereby", "therefore", "therein", "thereupon", "these", "they",
    "thick", "thin", "third", "this", "those", "though", "three", "through", "throughout",
    "thru", "thus", "to", "together", "too", "top", "toward", "towards", "twelve", "twenty",
    "two", "un", "under", "until", "up", "upon", "us", "very", "via", "was", "we", "well",
    "were", "what", "whatever", "when", "whence", "whenever", "where", "whereafter", "whereas",
    "whereby", "wherein", "whereupon", "wherever", "whether", "which", "while", "whither",
    "who", "whoever", "whole", "whom", "whose", "why", "will", "with", "within", "without",
    "would", "yet", "you", "your", "yours", "yourself", "yourselves",
];

fn is_stop_word(token: &str) -> bool {
    static SET: OnceLock<HashSet<&'static str>> = OnceLock::new();
    SET.get_or_init(|| ENGLISH_STOP_WORDS.iter().copied().collect())
        .contains(token)
}

/// Split text into lowercase word tokens of at least two characters
fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|token| token.chars().count() >= 2)
        .map(str::to_lowercase)
        .filter(|token| !is_stop_word(token))
}

/// Token to column mapping learned from a training corpus
///
/// The vocabulary is fixed at fit time. Tokens unseen during fitting
/// contribute nothing when transforming new text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureVectorizer {
    vocabulary: BTreeMap<String, usize>,
}

impl FeatureVectorizer {
    /// Learn the vocabulary of `corpus` and return its count matrix
    pub fn fit<S: AsRef<str>>(corpus: &[S]) -> (FeatureMatrix, Self) {
        let tokens: BTreeSet<String> = corpus
            .iter()
            .flat_map(|text| tokenize(text.as_ref()))
            .collect();

        // Columns follow alphabetical token order
        let vocabulary = tokens
            .into_iter()
            .enumerate()
            .map(|(column, token)| (token, column))
            .collect();

        let vectorizer = Self { vocabulary };
        let features = vectorizer.transform(corpus);
        (features, vectorizer)
    }

    /// Count vocabulary tokens in each text
    pub fn transform<S: AsRef<str>>(&self, texts: &[S]) -> FeatureMatrix {
        let rows = texts
            .iter()
            .map(|text| {
                let mut counts: BTreeMap<usize, u32> = BTreeMap::new();
                for token in tokenize(text.as_ref()) {
                    if let Some(&column) = self.vocabulary.get(&token) {
                        *counts.entry(column).or_insert(0) += 1;
                    }
                }
                counts.into_iter().collect()
            })
            .collect();

        FeatureMatrix::new(self.vocabulary.len(), rows)
    }

    pub fn vocabulary_len(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn column(&self, token: &str) -> Option<usize> {
        self.vocabulary.get(token).copied()
    }
}
