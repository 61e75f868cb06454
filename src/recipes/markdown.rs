//! Markdown recipe format
//!
//! Recipes are committed to the content repository as markdown files with
//! a frontmatter block, an `## Ingredients` bullet list, and a numbered
//! `## Instructions` list. This module is the pure transform between that
//! format and `Recipe`; malformed files parse to `None` and are skipped
//! by the loader rather than failing the whole list.

use regex::Regex;

use super::{Difficulty, Recipe, RecipeTags, FALLBACK_IMAGE};

/// Render a recipe as a markdown file body
pub fn format_recipe(recipe: &Recipe) -> String {
    format!(
        "---\n\
         title: {title}\n\
         description: {description}\n\
         servings: {servings}\n\
         prepTime: {prep}\n\
         cookTime: {cook}\n\
         difficulty: {difficulty}\n\
         image: {image}\n\
         mealType: {meal}\n\
         protein: {protein}\n\
         country: {country}\n\
         tastes: {tastes}\n\
         ingredients_tags: {ingredient_tags}\n\
         ---\n\
         \n\
         # {title}\n\
         \n\
         {description}\n\
         \n\
         ## Ingredients\n\
         \n\
         {ingredients}\n\
         \n\
         ## Instructions\n\
         \n\
         {instructions}\n",
        title = recipe.name,
        description = recipe.description,
        servings = recipe.servings,
        prep = recipe.prep_time,
        cook = recipe.cook_time,
        difficulty = recipe.difficulty,
        image = recipe.image,
        meal = recipe.tags.meal,
        protein = recipe.tags.meat,
        country = recipe.tags.country,
        tastes = recipe.tags.taste.join(", "),
        ingredient_tags = recipe.tags.ingredient.join(", "),
        ingredients = recipe
            .ingredients
            .iter()
            .map(|i| format!("- {}", i))
            .collect::<Vec<_>>()
            .join("\n"),
        instructions = recipe
            .instructions
            .iter()
            .enumerate()
            .map(|(idx, step)| format!("{}. {}", idx + 1, step))
            .collect::<Vec<_>>()
            .join("\n"),
    )
}

fn field(frontmatter: &str, name: &str) -> String {
    let pattern = format!(r"(?m)^{}:\s*(.+)$", regex::escape(name));
    Regex::new(&pattern)
        .ok()
        .and_then(|re| {
            re.captures(frontmatter)
                .map(|caps| caps[1].trim().to_string())
        })
        .unwrap_or_default()
}

fn list_field(frontmatter: &str, name: &str) -> Vec<String> {
    field(frontmatter, name)
        .split(',')
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect()
}

fn number_field(frontmatter: &str, name: &str) -> u32 {
    field(frontmatter, name).parse().unwrap_or(0)
}

/// Parse a markdown recipe file
///
/// Returns `None` when the frontmatter block or the title is missing.
/// Missing optional fields get the same defaults the rest of the app
/// assumes (2 servings, Easy, fallback image, Lunch, International).
pub fn parse_recipe(slug: &str, content: &str) -> Option<Recipe> {
    let frontmatter_re = Regex::new(r"(?s)\A---\n(.*?)\n---").ok()?;
    let caps = frontmatter_re.captures(content)?;
    let frontmatter = caps.get(1)?.as_str();
    let body = content[caps.get(0)?.end()..].trim();

    let name = field(frontmatter, "title");
    if name.is_empty() || slug.is_empty() {
        return None;
    }

    let ingredients_re = Regex::new(r"(?s)## Ingredients\n(.*?)(?:## Instructions|\z)").ok()?;
    let instructions_re = Regex::new(r"(?s)## Instructions\n(.*)\z").ok()?;

    let ingredients = ingredients_re
        .captures(body)
        .map(|caps| {
            caps[1]
                .lines()
                .filter(|line| line.starts_with('-'))
                .map(|line| line.trim_start_matches('-').trim().to_string())
                .filter(|line| !line.is_empty())
                .collect()
        })
        .unwrap_or_default();

    let step_re = Regex::new(r"^\d+\.\s*").ok()?;
    let instructions = instructions_re
        .captures(body)
        .map(|caps| {
            caps[1]
                .lines()
                .filter(|line| step_re.is_match(line))
                .map(|line| step_re.replace(line, "").trim().to_string())
                .filter(|line| !line.is_empty())
                .collect()
        })
        .unwrap_or_default();

    let cook_time = number_field(frontmatter, "cookTime");
    let prep_time = number_field(frontmatter, "prepTime");
    let servings = number_field(frontmatter, "servings");
    let difficulty = field(frontmatter, "difficulty")
        .parse()
        .unwrap_or_default();
    let image = field(frontmatter, "image");
    let meal = field(frontmatter, "mealType");
    let protein = field(frontmatter, "protein");
    let country = field(frontmatter, "country");

    Some(Recipe {
        slug: slug.to_string(),
        name,
        description: field(frontmatter, "description"),
        servings: if servings == 0 { 2 } else { servings },
        cook_time,
        prep_time,
        total_time: cook_time + prep_time,
        difficulty,
        image: if image.is_empty() {
            FALLBACK_IMAGE.to_string()
        } else {
            image
        },
        tags: RecipeTags {
            meal: if meal.is_empty() {
                "Lunch".to_string()
            } else {
                meal
            },
            ingredient: list_field(frontmatter, "ingredients_tags"),
            meat: if protein.is_empty() {
                "None".to_string()
            } else {
                protein
            },
            side_dish: false,
            taste: list_field(frontmatter, "tastes"),
            country: if country.is_empty() {
                "International".to_string()
            } else {
                country
            },
        },
        ingredients,
        instructions,
    })
}
