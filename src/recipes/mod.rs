//! Recipe domain types
//!
//! Recipes live in the content repository as markdown files with YAML-ish
//! frontmatter; `markdown` converts between that format and these types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub mod markdown;

/// Image used when a recipe file does not declare one
pub const FALLBACK_IMAGE: &str =
    "https://images.unsplash.com/photo-1495521821757-a1efb6729352?ixlib=rb-4.0.3&auto=format&fit=crop&w=500&h=500&q=60";

/// Recipe difficulty rating
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Difficulty {
    #[default]
    Easy,
    Medium,
    Hard,
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Difficulty::Easy => f.write_str("Easy"),
            Difficulty::Medium => f.write_str("Medium"),
            Difficulty::Hard => f.write_str("Hard"),
        }
    }
}

impl FromStr for Difficulty {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Easy" => Ok(Difficulty::Easy),
            "Medium" => Ok(Difficulty::Medium),
            "Hard" => Ok(Difficulty::Hard),
            _ => Err(()),
        }
    }
}

/// Classification tags attached to a recipe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeTags {
    /// Meal slot (Breakfast, Lunch, Dinner, ...)
    pub meal: String,
    /// Key ingredients for filtering
    pub ingredient: Vec<String>,
    /// Primary protein, or "None"
    pub meat: String,
    /// Whether this is a side dish
    pub side_dish: bool,
    /// Taste descriptors (Spicy, Sweet, ...)
    pub taste: Vec<String>,
    /// Cuisine country
    pub country: String,
}

/// One recipe as served on the wire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub slug: String,
    pub name: String,
    pub description: String,
    pub servings: u32,
    /// Cook time in minutes
    pub cook_time: u32,
    /// Prep time in minutes
    pub prep_time: u32,
    /// Prep plus cook time in minutes
    pub total_time: u32,
    pub difficulty: Difficulty,
    pub image: String,
    pub tags: RecipeTags,
    pub ingredients: Vec<String>,
    pub instructions: Vec<String>,
}

impl Recipe {
    /// Repository path for this recipe's markdown file
    pub fn repo_path(&self, recipes_dir: &str) -> String {
        format!("{}/{}.md", recipes_dir.trim_end_matches('/'), self.slug)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_difficulty_round_trips_through_display() {
        for d in [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard] {
            assert_eq!(d.to_string().parse::<Difficulty>().unwrap(), d);
        }
    }

    #[test]
    fn test_difficulty_defaults_to_easy() {
        assert_eq!(Difficulty::default(), Difficulty::Easy);
    }

    #[test]
    fn test_unknown_difficulty_fails_to_parse() {
        assert!("Impossible".parse::<Difficulty>().is_err());
    }

    #[test]
    fn test_recipe_serializes_camel_case() {
        let recipe = Recipe {
            slug: "pad-thai".to_string(),
            name: "Pad Thai".to_string(),
            description: "Classic noodles".to_string(),
            servings: 2,
            cook_time: 15,
            prep_time: 20,
            total_time: 35,
            difficulty: Difficulty::Medium,
            image: FALLBACK_IMAGE.to_string(),
            tags: RecipeTags {
                meal: "Dinner".to_string(),
                ingredient: vec!["noodles".to_string()],
                meat: "Shrimp".to_string(),
                side_dish: false,
                taste: vec!["Sweet".to_string()],
                country: "Thailand".to_string(),
            },
            ingredients: vec!["200g rice noodles".to_string()],
            instructions: vec!["Soak the noodles".to_string()],
        };
        let json = serde_json::to_string(&recipe).unwrap();
        assert!(json.contains("cookTime"));
        assert!(json.contains("totalTime"));
        assert!(json.contains("sideDish"));
        assert!(json.contains("\"difficulty\":\"Medium\""));
    }

    #[test]
    fn test_repo_path_joins_dir_and_slug() {
        let recipe = Recipe {
            slug: "pad-thai".to_string(),
            name: "Pad Thai".to_string(),
            description: String::new(),
            servings: 2,
            cook_time: 0,
            prep_time: 0,
            total_time: 0,
            difficulty: Difficulty::Easy,
            image: String::new(),
            tags: RecipeTags {
                meal: "Lunch".to_string(),
                ingredient: vec![],
                meat: "None".to_string(),
                side_dish: false,
                taste: vec![],
                country: "International".to_string(),
            },
            ingredients: vec![],
            instructions: vec![],
        };
        assert_eq!(recipe.repo_path("app/recipes"), "app/recipes/pad-thai.md");
        assert_eq!(recipe.repo_path("app/recipes/"), "app/recipes/pad-thai.md");
    }
}
