//! Recipe models and DTOs.

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sqlx::{FromRow, QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use std::str::FromStr;
use thiserror::Error;

use super::attribute::{self, AttributeRef, AttributeResponse};
use super::ingredient::Ingredient;
use super::tag::Tag;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PriceError {
    #[error("Price must not be negative")]
    Negative,
    #[error("Price must have at most {} decimal places", Price::DECIMAL_PLACES)]
    TooManyDecimalPlaces,
    #[error("Price must have at most {} digits in total", Price::MAX_DIGITS)]
    TooManyDigits,
    #[error("Invalid price: {0}")]
    Invalid(String),
}

/// A non-negative monetary amount with exactly two decimal places, at most
/// five digits in total (so 999.99 is the largest value).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Price(Decimal);

impl Price {
    pub const MAX_DIGITS: u32 = 5;
    pub const DECIMAL_PLACES: u32 = 2;

    pub fn new(value: Decimal) -> Result<Self, PriceError> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(PriceError::Negative);
        }
        if value.normalize().scale() > Self::DECIMAL_PLACES {
            return Err(PriceError::TooManyDecimalPlaces);
        }

        let mut amount = value.abs();
        amount.rescale(Self::DECIMAL_PLACES);

        let limit = Decimal::from(10i64.pow(Self::MAX_DIGITS - Self::DECIMAL_PLACES));
        if amount >= limit {
            return Err(PriceError::TooManyDigits);
        }
        Ok(Self(amount))
    }

    pub fn amount(&self) -> Decimal {
        self.0
    }
}

impl std::fmt::Display for Price {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Price {
    type Err = PriceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = Decimal::from_str(s.trim()).map_err(|_| PriceError::Invalid(s.to_string()))?;
        Self::new(value)
    }
}

impl TryFrom<String> for Price {
    type Error = PriceError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = <Decimal as Deserialize>::deserialize(deserializer)?;
        Price::new(value).map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Recipe {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub time_minutes: i64,
    #[sqlx(try_from = "String")]
    pub price: Price,
    pub description: String,
    pub link: Option<String>,
}

impl std::fmt::Display for Recipe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.title)
    }
}

/// Validated fields for a new recipe
#[derive(Debug, Clone)]
pub struct NewRecipe {
    pub title: String,
    pub time_minutes: i64,
    pub price: Price,
    pub description: String,
    pub link: Option<String>,
}

/// Validated partial changes to a recipe; `None` leaves a field as is
#[derive(Debug, Clone, Default)]
pub struct RecipeChanges {
    pub title: Option<String>,
    pub time_minutes: Option<i64>,
    pub price: Option<Price>,
    pub description: Option<String>,
    pub link: Option<String>,
}

/// Restrict a recipe listing to recipes referencing any of the given ids
#[derive(Debug, Clone, Default)]
pub struct RecipeFilter {
    pub tags: Vec<i64>,
    pub ingredients: Vec<i64>,
}

#[derive(Debug, Deserialize)]
pub struct CreateRecipeRequest {
    pub title: String,
    pub time_minutes: i64,
    pub price: Decimal,
    #[serde(default)]
    pub description: String,
    pub link: Option<String>,
    #[serde(default)]
    pub tags: Vec<AttributeRef>,
    #[serde(default)]
    pub ingredients: Vec<AttributeRef>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateRecipeRequest {
    pub title: Option<String>,
    pub time_minutes: Option<i64>,
    pub price: Option<Decimal>,
    pub description: Option<String>,
    pub link: Option<String>,
    pub tags: Option<Vec<AttributeRef>>,
    pub ingredients: Option<Vec<AttributeRef>>,
}

/// Recipe as it appears in list responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeResponse {
    pub id: i64,
    pub title: String,
    pub time_minutes: i64,
    pub price: Price,
    pub link: Option<String>,
    pub tags: Vec<AttributeResponse>,
    pub ingredients: Vec<AttributeResponse>,
}

/// Recipe as it appears in detail, create and update responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeDetailResponse {
    #[serde(flatten)]
    pub recipe: RecipeResponse,
    pub description: String,
}

const RECIPE_COLUMNS: &str = "id, user_id, title, time_minutes, price, description, link";

impl Recipe {
    /// Insert a recipe row; links are handled by the caller
    pub async fn create(
        conn: &mut SqliteConnection,
        user_id: i64,
        recipe: &NewRecipe,
    ) -> Result<Recipe, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO recipes (user_id, title, time_minutes, price, description, link)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(user_id)
        .bind(&recipe.title)
        .bind(recipe.time_minutes)
        .bind(recipe.price.to_string())
        .bind(&recipe.description)
        .bind(&recipe.link)
        .execute(&mut *conn)
        .await?;

        Self::get_by_id(conn, result.last_insert_rowid()).await
    }

    async fn get_by_id(conn: &mut SqliteConnection, id: i64) -> Result<Recipe, sqlx::Error> {
        let sql = format!("SELECT {} FROM recipes WHERE id = ?", RECIPE_COLUMNS);
        sqlx::query_as(&sql).bind(id).fetch_one(&mut *conn).await
    }

    /// Fetch a recipe, only if it belongs to the user
    pub async fn get_for_user(
        db: &SqlitePool,
        id: i64,
        user_id: i64,
    ) -> Result<Option<Recipe>, sqlx::Error> {
        let sql = format!(
            "SELECT {} FROM recipes WHERE id = ? AND user_id = ?",
            RECIPE_COLUMNS
        );
        sqlx::query_as(&sql)
            .bind(id)
            .bind(user_id)
            .fetch_optional(db)
            .await
    }

    /// The user's recipes, newest first, narrowed by `filter`
    pub async fn list_for_user(
        db: &SqlitePool,
        user_id: i64,
        filter: &RecipeFilter,
    ) -> Result<Vec<Recipe>, sqlx::Error> {
        let mut query: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {} FROM recipes WHERE user_id = ", RECIPE_COLUMNS));
        query.push_bind(user_id);

        if !filter.tags.is_empty() {
            query.push(" AND id IN (SELECT recipe_id FROM recipe_tags WHERE tag_id IN (");
            {
                let mut ids = query.separated(", ");
                for id in &filter.tags {
                    ids.push_bind(*id);
                }
            }
            query.push("))");
        }

        if !filter.ingredients.is_empty() {
            query.push(
                " AND id IN (SELECT recipe_id FROM recipe_ingredients WHERE ingredient_id IN (",
            );
            {
                let mut ids = query.separated(", ");
                for id in &filter.ingredients {
                    ids.push_bind(*id);
                }
            }
            query.push("))");
        }

        query.push(" ORDER BY id DESC");

        query.build_query_as::<Recipe>().fetch_all(db).await
    }

    /// Apply changes to a recipe owned by the user; `None` when it is not theirs
    pub async fn update(
        conn: &mut SqliteConnection,
        id: i64,
        user_id: i64,
        changes: &RecipeChanges,
    ) -> Result<Option<Recipe>, sqlx::Error> {
        // An empty link clears it
        let clear_link = matches!(changes.link.as_deref(), Some(""));

        let result = sqlx::query(
            r#"
            UPDATE recipes SET
                title = COALESCE(?, title),
                time_minutes = COALESCE(?, time_minutes),
                price = COALESCE(?, price),
                description = COALESCE(?, description),
                link = CASE WHEN ? THEN NULL ELSE COALESCE(?, link) END
            WHERE id = ? AND user_id = ?
            "#,
        )
        .bind(&changes.title)
        .bind(changes.time_minutes)
        .bind(changes.price.map(|p| p.to_string()))
        .bind(&changes.description)
        .bind(clear_link)
        .bind(&changes.link)
        .bind(id)
        .bind(user_id)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        Self::get_by_id(conn, id).await.map(Some)
    }

    /// Delete a recipe owned by the user; false when nothing matched
    pub async fn delete(db: &SqlitePool, id: i64, user_id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM recipes WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Replace the recipe's tags with the named ones
    pub async fn set_tags(
        &self,
        conn: &mut SqliteConnection,
        tags: &[AttributeRef],
    ) -> Result<(), sqlx::Error> {
        let names: Vec<String> = tags.iter().map(|t| t.name.trim().to_string()).collect();
        attribute::set_for_recipe::<Tag>(conn, self.id, self.user_id, &names).await
    }

    /// Replace the recipe's ingredients with the named ones
    pub async fn set_ingredients(
        &self,
        conn: &mut SqliteConnection,
        ingredients: &[AttributeRef],
    ) -> Result<(), sqlx::Error> {
        let names: Vec<String> = ingredients
            .iter()
            .map(|i| i.name.trim().to_string())
            .collect();
        attribute::set_for_recipe::<Ingredient>(conn, self.id, self.user_id, &names).await
    }

    /// Link an existing tag to this recipe
    pub async fn add_tag(&self, db: &SqlitePool, tag: &Tag) -> Result<(), sqlx::Error> {
        let mut conn = db.acquire().await?;
        attribute::attach::<Tag>(&mut conn, self.id, tag.id).await
    }

    /// Link an existing ingredient to this recipe
    pub async fn add_ingredient(
        &self,
        db: &SqlitePool,
        ingredient: &Ingredient,
    ) -> Result<(), sqlx::Error> {
        let mut conn = db.acquire().await?;
        attribute::attach::<Ingredient>(&mut conn, self.id, ingredient.id).await
    }

    /// Build the list representation, loading linked tags and ingredients
    pub async fn to_response(
        &self,
        conn: &mut SqliteConnection,
    ) -> Result<RecipeResponse, sqlx::Error> {
        let tags = attribute::list_for_recipe::<Tag>(&mut *conn, self.id).await?;
        let ingredients = attribute::list_for_recipe::<Ingredient>(&mut *conn, self.id).await?;

        Ok(RecipeResponse {
            id: self.id,
            title: self.title.clone(),
            time_minutes: self.time_minutes,
            price: self.price,
            link: self.link.clone(),
            tags: tags.iter().map(AttributeResponse::from_attribute).collect(),
            ingredients: ingredients
                .iter()
                .map(AttributeResponse::from_attribute)
                .collect(),
        })
    }

    pub async fn to_detail_response(
        &self,
        conn: &mut SqliteConnection,
    ) -> Result<RecipeDetailResponse, sqlx::Error> {
        Ok(RecipeDetailResponse {
            recipe: self.to_response(conn).await?,
            description: self.description.clone(),
        })
    }
}
