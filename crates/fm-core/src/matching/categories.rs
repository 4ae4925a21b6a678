use std::collections::HashMap;

use once_cell::sync::Lazy;

/// Fixed table mapping coarse service categories to the terms that
/// indicate them in gig text. Used by the weighted scorer when a
/// requirement names a category but its primary service did not match
/// literally.
static CATEGORY_KEYWORDS: Lazy<HashMap<&'static str, &'static [&'static str]>> = Lazy::new(|| {
    let mut table: HashMap<&'static str, &'static [&'static str]> = HashMap::new();
    table.insert(
        "web development",
        &[
            "website", "web", "frontend", "backend", "react", "node", "javascript", "html", "css",
        ][..],
    );
    table.insert(
        "mobile development",
        &["mobile", "app", "android", "ios", "flutter", "swift"][..],
    );
    table.insert(
        "graphic design",
        &["logo", "design", "branding", "illustration", "graphic", "banner"][..],
    );
    table.insert(
        "writing",
        &["writing", "content", "copywriting", "blog", "article", "proofreading"][..],
    );
    table.insert(
        "video editing",
        &["video", "editing", "animation", "motion", "youtube"][..],
    );
    table.insert(
        "digital marketing",
        &["marketing", "seo", "social", "ads", "advertising", "campaign"][..],
    );
    table.insert(
        "translation",
        &["translation", "translate", "language", "localization"][..],
    );
    table.insert(
        "data science",
        &["python", "data", "analysis", "machine", "learning", "model"][..],
    );
    table
});

/// Look up the keyword list for a category name, case-insensitively.
pub fn category_keywords(category: &str) -> Option<&'static [&'static str]> {
    CATEGORY_KEYWORDS
        .get(category.trim().to_lowercase().as_str())
        .copied()
}
