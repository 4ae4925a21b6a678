pub mod assistant;
pub mod db;
pub mod logging;
pub mod matching;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// Commonly used data models for the matching pipeline.

/// A seller's listed service offering as stored in the catalog.
/// Read-only to the matching core; scored against a point-in-time copy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GigListing {
    pub id: i64,
    pub seller_id: i64,
    pub title: String,
    pub description: String,
    pub category: String,
    pub short_summary: String,
    pub features: Vec<String>,
    /// Stored as text in the catalog; parse with [`GigListing::price_value`].
    pub price: String,
    pub total_stars: i32,
    pub star_count: i32,
    pub created_at: Option<DateTime<Utc>>,
}

impl GigListing {
    /// Numeric price, parsed defensively. Non-numeric values count as 0.
    pub fn price_value(&self) -> f64 {
        parse_price(&self.price)
    }

    /// Average star rating, undefined while the gig has no reviews.
    pub fn average_rating(&self) -> Option<f64> {
        if self.star_count > 0 {
            Some(f64::from(self.total_stars) / f64::from(self.star_count))
        } else {
            None
        }
    }

    /// Every matchable field concatenated and lowercased, the haystack
    /// used for substring checks during scoring.
    pub fn combined_text(&self) -> String {
        let mut text = String::with_capacity(
            self.title.len()
                + self.description.len()
                + self.category.len()
                + self.short_summary.len()
                + 8,
        );
        for part in [
            self.title.as_str(),
            self.description.as_str(),
            self.category.as_str(),
            self.short_summary.as_str(),
        ] {
            text.push_str(part);
            text.push(' ');
        }
        for feature in &self.features {
            text.push_str(feature);
            text.push(' ');
        }
        text.to_lowercase()
    }
}

/// Parse a catalog price string into a number. Accepts a leading numeric
/// prefix ("120", "120.50 USD"); anything else is treated as 0.
pub fn parse_price(raw: &str) -> f64 {
    let trimmed = raw.trim();
    let numeric_len = trimmed
        .char_indices()
        .take_while(|(_, c)| c.is_ascii_digit() || *c == '.')
        .map(|(i, c)| i + c.len_utf8())
        .last()
        .unwrap_or(0);

    trimmed[..numeric_len].parse::<f64>().unwrap_or(0.0)
}

/// Redacted seller projection shown alongside a match. Never carries
/// credentials; it is built from an explicit column list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SellerProfile {
    pub id: i64,
    pub username: String,
    pub country: Option<String>,
    pub avatar_url: Option<String>,
    pub is_seller: bool,
}

/// One ranked candidate produced by a search invocation. Ephemeral;
/// the conversation boundary may snapshot the list, the core never
/// persists it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub gig: GigListing,
    pub seller: Option<SellerProfile>,
    pub score: i32,
    pub reasons: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Bot,
}

/// A single turn in a matching conversation. The history itself lives
/// in the boundary layer's store; the core only reads it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub role: MessageRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl ConversationMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn bot(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Bot,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_and_decorated_prices() {
        assert_eq!(parse_price("120"), 120.0);
        assert_eq!(parse_price("  99.50 "), 99.5);
        assert_eq!(parse_price("150 USD"), 150.0);
        assert_eq!(parse_price("about 80"), 0.0);
        assert_eq!(parse_price(""), 0.0);
        assert_eq!(parse_price("free"), 0.0);
    }

    #[test]
    fn average_rating_is_undefined_without_reviews() {
        let mut gig = GigListing::default();
        assert_eq!(gig.average_rating(), None);

        gig.total_stars = 9;
        gig.star_count = 2;
        assert_eq!(gig.average_rating(), Some(4.5));
    }

    #[test]
    fn combined_text_covers_features_and_lowercases() {
        let gig = GigListing {
            title: "React Developer".into(),
            description: "Web apps".into(),
            category: "Web Development".into(),
            short_summary: "Fast delivery".into(),
            features: vec!["API design".into(), "Testing".into()],
            ..GigListing::default()
        };

        let text = gig.combined_text();
        assert!(text.contains("react developer"));
        assert!(text.contains("api design"));
        assert!(text.contains("testing"));
        assert!(!text.contains("React"));
    }
}
