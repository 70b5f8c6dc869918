//! Tag model.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::attribute::RecipeAttribute;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Tag {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
}

impl RecipeAttribute for Tag {
    const TABLE: &'static str = "tags";
    const LINK_TABLE: &'static str = "recipe_tags";
    const LINK_COLUMN: &'static str = "tag_id";
    const LABEL: &'static str = "Tag";

    fn id(&self) -> i64 {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}
