use crate::domain::Category;

/// Keyword rules in priority order; the first rule with a hit decides.
const RULES: &[(Category, &[&str])] = &[
    (
        Category::Breaking,
        &["דחוף", "חדשות אחרונות", "שובר", "breaking", "urgent"],
    ),
    (
        Category::Political,
        &[
            "פוליטיקה",
            "ממשלה",
            "כנסת",
            "בחירות",
            "מפלגה",
            "politic",
            "government",
            "parliament",
            "election",
        ],
    ),
    (
        Category::Sports,
        &[
            "ספורט",
            "כדורגל",
            "ליגה",
            "מכבי",
            "הפועל",
            "בית\"ר",
            "football",
            "soccer",
            "basketball",
        ],
    ),
    (
        Category::Entertainment,
        &[
            "תרבות",
            "בידור",
            "קולנוע",
            "מוזיקה",
            "תיאטרון",
            "טלוויזיה",
            "entertainment",
            "movie",
            "music",
            "theater",
        ],
    ),
];

/// Classifies an item from its title and description.
pub fn categorize(title: &str, description: &str) -> Category {
    let text = format!("{} {}", title, description).to_lowercase();

    RULES
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| text.contains(k)))
        .map(|(category, _)| *category)
        .unwrap_or_default()
}
