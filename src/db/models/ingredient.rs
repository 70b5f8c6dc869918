//! Ingredient model.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::attribute::RecipeAttribute;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Ingredient {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
}

impl RecipeAttribute for Ingredient {
    const TABLE: &'static str = "ingredients";
    const LINK_TABLE: &'static str = "recipe_ingredients";
    const LINK_COLUMN: &'static str = "ingredient_id";
    const LABEL: &'static str = "Ingredient";

    fn id(&self) -> i64 {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Display for Ingredient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}
