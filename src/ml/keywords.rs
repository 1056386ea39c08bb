use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet};

/// Default number of keywords kept per incident
pub const DEFAULT_TOP_N: usize = 5;

/// Word tokens; hyphen/apostrophe compounds stay together ("e-waste", "don't")
static TOKEN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[\p{L}\p{N}_]+(?:['\-][\p{L}\p{N}_]+)*").expect("valid token regex")
});

/// NLTK English stop word list
static STOPWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "you're", "you've",
        "you'll", "you'd", "your", "yours", "yourself", "yourselves", "he", "him", "his",
        "himself", "she", "she's", "her", "hers", "herself", "it", "it's", "its", "itself",
        "they", "them", "their", "theirs", "themselves", "what", "which", "who", "whom", "this",
        "that", "that'll", "these", "those", "am", "is", "are", "was", "were", "be", "been",
        "being", "have", "has", "had", "having", "do", "does", "did", "doing", "a", "an", "the",
        "and", "but", "if", "or", "because", "as", "until", "while", "of", "at", "by", "for",
        "with", "about", "against", "between", "into", "through", "during", "before", "after",
        "above", "below", "to", "from", "up", "down", "in", "out", "on", "off", "over", "under",
        "again", "further", "then", "once", "here", "there", "when", "where", "why", "how",
        "all", "any", "both", "each", "few", "more", "most", "other", "some", "such", "no",
        "nor", "not", "only", "own", "same", "so", "than", "too", "very", "s", "t", "can",
        "will", "just", "don", "don't", "should", "should've", "now", "d", "ll", "m", "o", "re",
        "ve", "y", "ain", "aren", "aren't", "couldn", "couldn't", "didn", "didn't", "doesn",
        "doesn't", "hadn", "hadn't", "hasn", "hasn't", "haven", "haven't", "isn", "isn't", "ma",
        "mightn", "mightn't", "mustn", "mustn't", "needn", "needn't", "shan", "shan't",
        "shouldn", "shouldn't", "wasn", "wasn't", "weren", "weren't", "won", "won't", "wouldn",
        "wouldn't",
    ]
    .into_iter()
    .collect()
});

/// Lower-cased word tokens in document order
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    TOKEN_RE
        .find_iter(&lowered)
        .map(|m| m.as_str().to_string())
        .collect()
}

pub fn is_stopword(token: &str) -> bool {
    STOPWORDS.contains(token)
}

/// Frequency-based keyword extraction
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordExtractor;

impl KeywordExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Most frequent content words of `text`.
    ///
    /// Only purely alphabetic tokens longer than two characters that are not
    /// stop words count. Ties keep the order of first occurrence.
    pub fn extract(&self, text: &str, top_n: usize) -> Vec<String> {
        let mut order: Vec<(String, usize)> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for token in tokenize(text) {
            if !Self::is_candidate(&token) {
                continue;
            }

            match index.get(&token) {
                Some(&pos) => order[pos].1 += 1,
                None => {
                    index.insert(token.clone(), order.len());
                    order.push((token, 1));
                }
            }
        }

        // Stable sort keeps first-seen order among equal counts
        order.sort_by(|a, b| b.1.cmp(&a.1));

        order.into_iter().take(top_n).map(|(word, _)| word).collect()
    }

    fn is_candidate(token: &str) -> bool {
        token.chars().count() > 2
            && token.chars().all(char::is_alphabetic)
            && !is_stopword(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_extraction_by_frequency() {
        let extractor = KeywordExtractor::new();
        let text = "Plastic bags and plastic bottles near the river. The river bank is full of bags.";

        let keywords = extractor.extract(text, 3);

        assert_eq!(keywords, vec!["plastic", "bags", "river"]);
    }

    #[test]
    fn test_ties_keep_first_occurrence() {
        let extractor = KeywordExtractor::new();
        let keywords = extractor.extract("glass jars metal cans paper boxes", 10);

        assert_eq!(
            keywords,
            vec!["glass", "jars", "metal", "cans", "paper", "boxes"]
        );
    }

    #[test]
    fn test_filters_stopwords_short_and_non_alpha() {
        let extractor = KeywordExtractor::new();
        let keywords = extractor.extract("It is an e-waste pile of 42 old TVs by us", 10);

        assert_eq!(keywords, vec!["pile", "old", "tvs"]);
    }

    #[test]
    fn test_top_n_limits_output() {
        let extractor = KeywordExtractor::new();
        let keywords = extractor.extract(
            "cardboard boxes newspapers magazines cartons envelopes notebooks",
            DEFAULT_TOP_N,
        );
        assert_eq!(keywords.len(), DEFAULT_TOP_N);
        assert!(extractor.extract("", 5).is_empty());
    }

    #[test]
    fn test_tokenize_lowercases() {
        assert_eq!(tokenize("Broken GLASS, e-waste!"), vec!["broken", "glass", "e-waste"]);
    }
}
