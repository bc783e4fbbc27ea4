use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Breaking,
    Political,
    Sports,
    #[default]
    General,
    Entertainment,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Breaking,
        Category::Political,
        Category::Sports,
        Category::General,
        Category::Entertainment,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Breaking => "breaking",
            Category::Political => "political",
            Category::Sports => "sports",
            Category::General => "general",
            Category::Entertainment => "entertainment",
        }
    }

    pub fn is_general(&self) -> bool {
        matches!(self, Category::General)
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "breaking" => Ok(Category::Breaking),
            "political" | "politics" => Ok(Category::Political),
            "sports" | "sport" => Ok(Category::Sports),
            "general" => Ok(Category::General),
            "entertainment" => Ok(Category::Entertainment),
            _ => Err(format!("Unknown category: {}", s)),
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
