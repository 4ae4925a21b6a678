use std::collections::HashSet;

use once_cell::sync::Lazy;

/// Closed list of common English function words excluded from search
/// terms. Matching is over lowercased tokens.
static STOPWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "your", "yours",
        "yourself", "yourselves", "he", "him", "his", "himself", "she", "her", "hers", "herself",
        "it", "its", "itself", "they", "them", "their", "theirs", "themselves", "what", "which",
        "who", "whom", "this", "that", "these", "those", "am", "is", "are", "was", "were", "be",
        "been", "being", "have", "has", "had", "do", "does", "did", "but", "if", "or", "because",
        "as", "until", "while", "of", "at", "by", "for", "with", "about", "against", "between",
        "into", "through", "during", "before", "after", "above", "below", "to", "from", "up",
        "down", "in", "out", "on", "off", "over", "under", "again", "further", "then", "once",
        "here", "there", "when", "where", "why", "how", "all", "any", "both", "each", "few",
        "more", "most", "other", "some", "such", "no", "nor", "not", "only", "own", "same", "so",
        "than", "too", "very", "can", "will", "just",
    ]
    .into_iter()
    .collect()
});

/// Punctuation replaced with whitespace before tokenizing.
const PUNCTUATION: &[char] = &[
    '.', ',', '/', '#', '!', '$', '%', '^', '&', '*', ';', ':', '{', '}', '=', '-', '_', '`', '~',
    '(', ')', '[', ']', '"', '>', '<', '?', '|', '+',
];

/// Normalize free text into significant search terms: lowercase, strip
/// punctuation, drop stopwords, tokens of length <= 2 and purely numeric
/// tokens, dedup preserving first-seen order. Blank input yields an
/// empty list.
pub fn extract_keywords(text: &str) -> Vec<String> {
    let normalized = text
        .to_lowercase()
        .replace(|c: char| PUNCTUATION.contains(&c), " ");

    let mut seen = HashSet::new();
    let mut keywords = Vec::new();

    for token in normalized.split_whitespace() {
        if token.len() <= 2 {
            continue;
        }
        if STOPWORDS.contains(token) {
            continue;
        }
        if token.chars().all(|c| c.is_ascii_digit()) {
            continue;
        }
        if seen.insert(token.to_string()) {
            keywords.push(token.to_string());
        }
    }

    keywords
}

/// Join extracted terms into a full-text-search query string.
pub fn build_search_text(keywords: &[String]) -> String {
    keywords.join(" ")
}
