//! Shared storage for tags and ingredients.
//!
//! Both are user-owned `{id, name}` rows linked to recipes through a join
//! table, so every query is written once against the table names a
//! [`RecipeAttribute`] provides.

use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqliteRow, FromRow, Sqlite, SqliteConnection, SqlitePool};

/// A user-owned label that recipes can reference many-to-many
pub trait RecipeAttribute: for<'r> FromRow<'r, SqliteRow> + Send + Unpin + 'static {
    /// Table holding the attribute rows
    const TABLE: &'static str;
    /// Join table between recipes and this attribute
    const LINK_TABLE: &'static str;
    /// Column in `LINK_TABLE` referencing `TABLE`
    const LINK_COLUMN: &'static str;
    /// Human-readable name used in error messages and logs
    const LABEL: &'static str;

    fn id(&self) -> i64;
    fn name(&self) -> &str;
}

/// List the user's attributes by name, descending.
///
/// With `assigned_only` set, only attributes referenced by at least one of
/// the user's recipes are returned, each once.
pub async fn list_for_user<T: RecipeAttribute>(
    db: &SqlitePool,
    user_id: i64,
    assigned_only: bool,
) -> Result<Vec<T>, sqlx::Error> {
    if assigned_only {
        let sql = format!(
            r#"
            SELECT DISTINCT a.id, a.user_id, a.name
            FROM {table} a
            JOIN {link} l ON l.{column} = a.id
            JOIN recipes r ON r.id = l.recipe_id
            WHERE a.user_id = ? AND r.user_id = ?
            ORDER BY a.name DESC
            "#,
            table = T::TABLE,
            link = T::LINK_TABLE,
            column = T::LINK_COLUMN,
        );
        sqlx::query_as::<Sqlite, T>(&sql)
            .bind(user_id)
            .bind(user_id)
            .fetch_all(db)
            .await
    } else {
        let sql = format!(
            "SELECT id, user_id, name FROM {} WHERE user_id = ? ORDER BY name DESC",
            T::TABLE
        );
        sqlx::query_as::<Sqlite, T>(&sql)
            .bind(user_id)
            .fetch_all(db)
            .await
    }
}

/// Fetch one attribute, only if it belongs to the user
pub async fn get_for_user<T: RecipeAttribute>(
    db: &SqlitePool,
    id: i64,
    user_id: i64,
) -> Result<Option<T>, sqlx::Error> {
    let sql = format!(
        "SELECT id, user_id, name FROM {} WHERE id = ? AND user_id = ?",
        T::TABLE
    );
    sqlx::query_as::<Sqlite, T>(&sql)
        .bind(id)
        .bind(user_id)
        .fetch_optional(db)
        .await
}

async fn get_by_id<T: RecipeAttribute>(
    conn: &mut SqliteConnection,
    id: i64,
) -> Result<T, sqlx::Error> {
    let sql = format!("SELECT id, user_id, name FROM {} WHERE id = ?", T::TABLE);
    sqlx::query_as::<Sqlite, T>(&sql)
        .bind(id)
        .fetch_one(&mut *conn)
        .await
}

async fn insert<T: RecipeAttribute>(
    conn: &mut SqliteConnection,
    user_id: i64,
    name: &str,
) -> Result<T, sqlx::Error> {
    let sql = format!("INSERT INTO {} (user_id, name) VALUES (?, ?)", T::TABLE);
    let result = sqlx::query(&sql)
        .bind(user_id)
        .bind(name)
        .execute(&mut *conn)
        .await?;
    get_by_id(conn, result.last_insert_rowid()).await
}

/// Insert a new attribute for the user
pub async fn create<T: RecipeAttribute>(
    db: &SqlitePool,
    user_id: i64,
    name: &str,
) -> Result<T, sqlx::Error> {
    let mut conn = db.acquire().await?;
    insert(&mut conn, user_id, name).await
}

/// Return the user's attribute with this exact name, creating it if absent
pub async fn get_or_create<T: RecipeAttribute>(
    conn: &mut SqliteConnection,
    user_id: i64,
    name: &str,
) -> Result<T, sqlx::Error> {
    let sql = format!(
        "SELECT id, user_id, name FROM {} WHERE user_id = ? AND name = ? ORDER BY id LIMIT 1",
        T::TABLE
    );
    let existing = sqlx::query_as::<Sqlite, T>(&sql)
        .bind(user_id)
        .bind(name)
        .fetch_optional(&mut *conn)
        .await?;

    match existing {
        Some(existing) => Ok(existing),
        None => insert(conn, user_id, name).await,
    }
}

/// Rename an attribute owned by the user; `None` when it is not theirs
pub async fn rename<T: RecipeAttribute>(
    db: &SqlitePool,
    id: i64,
    user_id: i64,
    name: &str,
) -> Result<Option<T>, sqlx::Error> {
    let sql = format!(
        "UPDATE {} SET name = ? WHERE id = ? AND user_id = ?",
        T::TABLE
    );
    let result = sqlx::query(&sql)
        .bind(name)
        .bind(id)
        .bind(user_id)
        .execute(db)
        .await?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }
    get_for_user(db, id, user_id).await
}

/// Delete an attribute owned by the user; false when nothing matched
pub async fn delete<T: RecipeAttribute>(
    db: &SqlitePool,
    id: i64,
    user_id: i64,
) -> Result<bool, sqlx::Error> {
    let sql = format!("DELETE FROM {} WHERE id = ? AND user_id = ?", T::TABLE);
    let result = sqlx::query(&sql)
        .bind(id)
        .bind(user_id)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn exists<T: RecipeAttribute>(db: &SqlitePool, id: i64) -> Result<bool, sqlx::Error> {
    let sql = format!("SELECT COUNT(*) FROM {} WHERE id = ?", T::TABLE);
    let count: i64 = sqlx::query_scalar(&sql).bind(id).fetch_one(db).await?;
    Ok(count > 0)
}

/// Attributes linked to a recipe, ordered by name
pub async fn list_for_recipe<T: RecipeAttribute>(
    conn: &mut SqliteConnection,
    recipe_id: i64,
) -> Result<Vec<T>, sqlx::Error> {
    let sql = format!(
        r#"
        SELECT a.id, a.user_id, a.name
        FROM {table} a
        JOIN {link} l ON l.{column} = a.id
        WHERE l.recipe_id = ?
        ORDER BY a.name ASC
        "#,
        table = T::TABLE,
        link = T::LINK_TABLE,
        column = T::LINK_COLUMN,
    );
    sqlx::query_as::<Sqlite, T>(&sql)
        .bind(recipe_id)
        .fetch_all(&mut *conn)
        .await
}

/// Link an existing attribute to a recipe
pub async fn attach<T: RecipeAttribute>(
    conn: &mut SqliteConnection,
    recipe_id: i64,
    attribute_id: i64,
) -> Result<(), sqlx::Error> {
    let sql = format!(
        "INSERT OR IGNORE INTO {} (recipe_id, {}) VALUES (?, ?)",
        T::LINK_TABLE,
        T::LINK_COLUMN
    );
    sqlx::query(&sql)
        .bind(recipe_id)
        .bind(attribute_id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// Replace the recipe's links with the user's attributes named in `names`,
/// creating any that do not exist yet
pub async fn set_for_recipe<T: RecipeAttribute>(
    conn: &mut SqliteConnection,
    recipe_id: i64,
    user_id: i64,
    names: &[String],
) -> Result<(), sqlx::Error> {
    let sql = format!("DELETE FROM {} WHERE recipe_id = ?", T::LINK_TABLE);
    sqlx::query(&sql)
        .bind(recipe_id)
        .execute(&mut *conn)
        .await?;

    for name in names {
        let attribute: T = get_or_create(&mut *conn, user_id, name).await?;
        attach::<T>(&mut *conn, recipe_id, attribute.id()).await?;
    }
    Ok(())
}

/// Wire representation shared by tags and ingredients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeResponse {
    pub id: i64,
    pub name: String,
}

impl AttributeResponse {
    pub fn from_attribute<T: RecipeAttribute>(attribute: &T) -> Self {
        Self {
            id: attribute.id(),
            name: attribute.name().to_string(),
        }
    }
}

/// Nested `{name}` reference used when creating or updating a recipe
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributeRef {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateAttributeRequest {
    pub name: Option<String>,
}
