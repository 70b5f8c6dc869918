//! Recipe endpoints.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::sync::Arc;

use crate::db::{
    CreateRecipeRequest, NewRecipe, Price, Recipe, RecipeChanges, RecipeDetailResponse,
    RecipeFilter, RecipeResponse, UpdateRecipeRequest, User,
};
use crate::AppState;

use super::error::{ApiError, ValidationErrorBuilder};
use super::validation::{
    parse_id_list, validate_link, validate_required_text, validate_time_minutes,
};

#[derive(Debug, Default, Deserialize)]
pub struct ListRecipesQuery {
    /// Comma-separated tag ids
    pub tags: Option<String>,
    /// Comma-separated ingredient ids
    pub ingredients: Option<String>,
}

fn check_price(errors: &mut ValidationErrorBuilder, price: Decimal) -> Option<Price> {
    match Price::new(price) {
        Ok(price) => Some(price),
        Err(e) => {
            errors.add("price", e.to_string());
            None
        }
    }
}

fn check_attribute_names(
    errors: &mut ValidationErrorBuilder,
    field: &str,
    names: &[crate::db::AttributeRef],
) {
    for item in names {
        errors.check(field, validate_required_text("Name", &item.name));
    }
}

/// Link values are stored trimmed; an empty string means no link
fn normalize_link(link: Option<String>) -> Option<String> {
    link.map(|l| l.trim().to_string()).filter(|l| !l.is_empty())
}

/// Validate a full create/replace payload
fn validate_new_recipe(req: &CreateRecipeRequest) -> Result<NewRecipe, ApiError> {
    let mut errors = ValidationErrorBuilder::new();

    errors.check("title", validate_required_text("Title", &req.title));
    errors.check("time_minutes", validate_time_minutes(req.time_minutes));
    errors.check("link", validate_link(&req.link));
    let price = check_price(&mut errors, req.price);
    check_attribute_names(&mut errors, "tags", &req.tags);
    check_attribute_names(&mut errors, "ingredients", &req.ingredients);

    errors.finish()?;

    Ok(NewRecipe {
        title: req.title.trim().to_string(),
        time_minutes: req.time_minutes,
        price: price.ok_or_else(|| ApiError::validation_field("price", "Invalid price"))?,
        description: req.description.clone(),
        link: normalize_link(req.link.clone()),
    })
}

/// Validate a partial update payload
fn validate_changes(req: &UpdateRecipeRequest) -> Result<RecipeChanges, ApiError> {
    let mut errors = ValidationErrorBuilder::new();

    if let Some(ref title) = req.title {
        errors.check("title", validate_required_text("Title", title));
    }
    if let Some(minutes) = req.time_minutes {
        errors.check("time_minutes", validate_time_minutes(minutes));
    }
    errors.check("link", validate_link(&req.link));
    let price = req.price.and_then(|p| check_price(&mut errors, p));
    if let Some(ref tags) = req.tags {
        check_attribute_names(&mut errors, "tags", tags);
    }
    if let Some(ref ingredients) = req.ingredients {
        check_attribute_names(&mut errors, "ingredients", ingredients);
    }

    errors.finish()?;

    Ok(RecipeChanges {
        title: req.title.as_ref().map(|t| t.trim().to_string()),
        time_minutes: req.time_minutes,
        price,
        description: req.description.clone(),
        // Keep an explicit empty string so the update clears the link
        link: req
            .link
            .as_ref()
            .map(|l| normalize_link(Some(l.clone())).unwrap_or_default()),
    })
}

fn recipe_not_found() -> ApiError {
    ApiError::not_found("Recipe not found")
}

/// List the caller's recipes, newest first
///
/// GET /api/recipe/recipes/?tags=1,2&ingredients=3
pub async fn list_recipes(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Query(query): Query<ListRecipesQuery>,
) -> Result<Json<Vec<RecipeResponse>>, ApiError> {
    let mut errors = ValidationErrorBuilder::new();
    let mut filter = RecipeFilter::default();

    if let Some(ref tags) = query.tags {
        match parse_id_list(tags) {
            Ok(ids) => filter.tags = ids,
            Err(e) => {
                errors.add("tags", e);
            }
        }
    }
    if let Some(ref ingredients) = query.ingredients {
        match parse_id_list(ingredients) {
            Ok(ids) => filter.ingredients = ids,
            Err(e) => {
                errors.add("ingredients", e);
            }
        }
    }
    errors.finish()?;

    let recipes = Recipe::list_for_user(&state.db, user.id, &filter).await?;

    let mut conn = state.db.acquire().await?;
    let mut results = Vec::with_capacity(recipes.len());
    for recipe in &recipes {
        results.push(recipe.to_response(&mut conn).await?);
    }

    Ok(Json(results))
}

/// GET /api/recipe/recipes/:id/
pub async fn get_recipe(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Path(id): Path<i64>,
) -> Result<Json<RecipeDetailResponse>, ApiError> {
    let recipe = Recipe::get_for_user(&state.db, id, user.id)
        .await?
        .ok_or_else(recipe_not_found)?;

    let mut conn = state.db.acquire().await?;
    Ok(Json(recipe.to_detail_response(&mut conn).await?))
}

/// Create a recipe, get-or-creating the named tags and ingredients
///
/// POST /api/recipe/recipes/
pub async fn create_recipe(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Json(req): Json<CreateRecipeRequest>,
) -> Result<(StatusCode, Json<RecipeDetailResponse>), ApiError> {
    let new_recipe = validate_new_recipe(&req)?;

    let mut tx = state.db.begin().await?;
    let recipe = Recipe::create(&mut tx, user.id, &new_recipe).await?;
    recipe.set_tags(&mut tx, &req.tags).await?;
    recipe.set_ingredients(&mut tx, &req.ingredients).await?;
    let response = recipe.to_detail_response(&mut tx).await?;
    tx.commit().await?;

    tracing::info!(user_id = user.id, recipe_id = recipe.id, title = %recipe, "Recipe created");

    Ok((StatusCode::CREATED, Json(response)))
}

/// Replace every field of a recipe
///
/// PUT /api/recipe/recipes/:id/
pub async fn replace_recipe(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Path(id): Path<i64>,
    Json(req): Json<CreateRecipeRequest>,
) -> Result<Json<RecipeDetailResponse>, ApiError> {
    let new_recipe = validate_new_recipe(&req)?;
    let changes = RecipeChanges {
        title: Some(new_recipe.title),
        time_minutes: Some(new_recipe.time_minutes),
        price: Some(new_recipe.price),
        description: Some(new_recipe.description),
        link: Some(new_recipe.link.unwrap_or_default()),
    };

    let mut tx = state.db.begin().await?;
    let recipe = Recipe::update(&mut tx, id, user.id, &changes)
        .await?
        .ok_or_else(recipe_not_found)?;
    recipe.set_tags(&mut tx, &req.tags).await?;
    recipe.set_ingredients(&mut tx, &req.ingredients).await?;
    let response = recipe.to_detail_response(&mut tx).await?;
    tx.commit().await?;

    tracing::info!(user_id = user.id, recipe_id = recipe.id, "Recipe replaced");

    Ok(Json(response))
}

/// Partially update a recipe; provided tag/ingredient lists replace the links
///
/// PATCH /api/recipe/recipes/:id/
pub async fn update_recipe(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateRecipeRequest>,
) -> Result<Json<RecipeDetailResponse>, ApiError> {
    let changes = validate_changes(&req)?;

    let mut tx = state.db.begin().await?;
    let recipe = Recipe::update(&mut tx, id, user.id, &changes)
        .await?
        .ok_or_else(recipe_not_found)?;
    if let Some(ref tags) = req.tags {
        recipe.set_tags(&mut tx, tags).await?;
    }
    if let Some(ref ingredients) = req.ingredients {
        recipe.set_ingredients(&mut tx, ingredients).await?;
    }
    let response = recipe.to_detail_response(&mut tx).await?;
    tx.commit().await?;

    tracing::info!(user_id = user.id, recipe_id = recipe.id, "Recipe updated");

    Ok(Json(response))
}

/// DELETE /api/recipe/recipes/:id/
pub async fn delete_recipe(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    if !Recipe::delete(&state.db, id, user.id).await? {
        return Err(recipe_not_found());
    }

    tracing::info!(user_id = user.id, recipe_id = id, "Recipe deleted");

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::AttributeRef;
    use std::str::FromStr;

    fn create_request() -> CreateRecipeRequest {
        CreateRecipeRequest {
            title: "  Sample recipe ".to_string(),
            time_minutes: 5,
            price: Decimal::from_str("5.5").unwrap(),
            description: "Sample recipe description".to_string(),
            link: Some(" ".to_string()),
            tags: vec![AttributeRef {
                name: "Dinner".to_string(),
            }],
            ingredients: vec![],
        }
    }

    #[test]
    fn test_validate_new_recipe_normalizes_fields() {
        let recipe = validate_new_recipe(&create_request()).unwrap();
        assert_eq!(recipe.title, "Sample recipe");
        assert_eq!(recipe.price.to_string(), "5.50");
        assert_eq!(recipe.link, None);
    }

    #[test]
    fn test_validate_new_recipe_collects_field_errors() {
        let mut req = create_request();
        req.title = String::new();
        req.time_minutes = -3;
        req.price = Decimal::from_str("-1").unwrap();
        req.tags.push(AttributeRef {
            name: String::new(),
        });

        let err = validate_new_recipe(&req).unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert!(err.message().contains("4 fields"));
    }

    #[test]
    fn test_validate_changes_keeps_omitted_fields_unset() {
        let changes = validate_changes(&UpdateRecipeRequest {
            title: Some("New title".to_string()),
            ..Default::default()
        })
        .unwrap();

        assert_eq!(changes.title.as_deref(), Some("New title"));
        assert!(changes.price.is_none());
        assert!(changes.link.is_none());
    }

    #[test]
    fn test_validate_changes_empty_link_clears() {
        let changes = validate_changes(&UpdateRecipeRequest {
            link: Some(String::new()),
            ..Default::default()
        })
        .unwrap();

        assert_eq!(changes.link.as_deref(), Some(""));
    }
}
