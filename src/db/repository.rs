//! Database repository: the recipe access layer.
//!
//! Every primary write and the counter adjustment it implies run in one
//! transaction. Counter adjustments are single `MAX(x + d, 0)` updates, so a
//! counter can never go negative.

use chrono::Utc;
use serde::de::DeserializeOwned;
use sqlx::sqlite::{SqliteConnection, SqliteRow};
use sqlx::{Row, SqlitePool};

use crate::errors::AppError;
use crate::models::{Recipe, RecipeDraft, RevisionInfo, User, UserProfile};

const RECIPE_COLUMNS: &str = "id, title, description, ingredients, categories, image_url, author_id, calories, difficulty, time, favorite_counter, directions, updated_at";

const USER_COLUMNS: &str = "id, email, username, joined, recipes_created";

/// Database repository for all data operations.
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get the current revision ID.
    pub async fn get_revision_id(&self) -> Result<i64, AppError> {
        let row = sqlx::query("SELECT revision_id FROM meta WHERE id = 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("revision_id"))
    }

    /// Get revision info.
    pub async fn get_revision_info(&self) -> Result<RevisionInfo, AppError> {
        let row = sqlx::query("SELECT revision_id, generated_at FROM meta WHERE id = 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(RevisionInfo {
            revision_id: row.get("revision_id"),
            generated_at: row.get("generated_at"),
        })
    }

    // ==================== USER OPERATIONS ====================

    /// Create a user account. Emails are unique, case-insensitively.
    pub async fn create_user(
        &self,
        email: &str,
        password_hash: &str,
        username: &str,
    ) -> Result<User, AppError> {
        let id = uuid::Uuid::new_v4().to_string();
        let joined = Utc::now().timestamp_millis();

        let result = sqlx::query(
            "INSERT INTO users (id, email, password_hash, username, joined, recipes_created) VALUES (?, ?, ?, ?, ?, 0)",
        )
        .bind(&id)
        .bind(email)
        .bind(password_hash)
        .bind(username)
        .bind(joined)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => {}
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                return Err(AppError::Conflict(
                    "An account with this email already exists".to_string(),
                ));
            }
            Err(e) => return Err(e.into()),
        }

        Ok(User {
            id,
            email: email.to_string(),
            username: username.to_string(),
            joined,
            recipes_created: 0,
        })
    }

    /// Get a user by ID.
    pub async fn get_user(&self, id: &str) -> Result<Option<User>, AppError> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(user_from_row))
    }

    /// Get a user and their password hash by email.
    pub async fn find_credentials(&self, email: &str) -> Result<Option<(User, String)>, AppError> {
        let row = sqlx::query(&format!(
            "SELECT {USER_COLUMNS}, password_hash FROM users WHERE email = ?"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| (user_from_row(&r), r.get("password_hash"))))
    }

    /// Profile statistics for a user.
    pub async fn get_profile(&self, id: &str) -> Result<Option<UserProfile>, AppError> {
        let Some(user) = self.get_user(id).await? else {
            return Ok(None);
        };

        let favorites_count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM favorites WHERE user_id = ?")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;

        let most_liked_recipe = sqlx::query(&format!(
            "SELECT {RECIPE_COLUMNS} FROM recipes WHERE author_id = ? ORDER BY favorite_counter DESC, rowid ASC LIMIT 1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .as_ref()
        .map(recipe_from_row);

        Ok(Some(UserProfile {
            id: user.id,
            username: user.username,
            joined: user.joined,
            recipes_created: user.recipes_created,
            favorites_count,
            most_liked_recipe,
        }))
    }

    // ==================== SESSION OPERATIONS ====================

    /// Open a session for a user and return its bearer token.
    pub async fn create_session(&self, user_id: &str) -> Result<String, AppError> {
        let token = uuid::Uuid::new_v4().simple().to_string();
        sqlx::query("INSERT INTO sessions (token, user_id, created_at) VALUES (?, ?, ?)")
            .bind(&token)
            .bind(user_id)
            .bind(Utc::now().to_rfc3339())
            .execute(&self.pool)
            .await?;
        Ok(token)
    }

    /// Resolve a bearer token to its user.
    pub async fn user_for_session(&self, token: &str) -> Result<Option<User>, AppError> {
        let row = sqlx::query(
            "SELECT u.id, u.email, u.username, u.joined, u.recipes_created FROM sessions s INNER JOIN users u ON u.id = s.user_id WHERE s.token = ?",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(user_from_row))
    }

    /// Close a session. Returns whether it existed.
    pub async fn delete_session(&self, token: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM sessions WHERE token = ?")
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // ==================== RECIPE OPERATIONS ====================

    /// List all recipes in creation order.
    pub async fn list_recipes(&self) -> Result<Vec<Recipe>, AppError> {
        let rows = sqlx::query(&format!(
            "SELECT {RECIPE_COLUMNS} FROM recipes ORDER BY rowid"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(recipe_from_row).collect())
    }

    /// Get a recipe by ID.
    pub async fn get_recipe(&self, id: &str) -> Result<Option<Recipe>, AppError> {
        let row = sqlx::query(&format!("SELECT {RECIPE_COLUMNS} FROM recipes WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(recipe_from_row))
    }

    /// Add a recipe and count it towards its author's recipes.
    pub async fn add_recipe(&self, author_id: &str, draft: &RecipeDraft) -> Result<Recipe, AppError> {
        if author_id.trim().is_empty() {
            return Err(AppError::Validation("Author is required".to_string()));
        }

        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO recipes (id, title, description, ingredients, categories, image_url, author_id, calories, difficulty, time, favorite_counter, directions, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 0, ?, ?)",
        )
        .bind(&id)
        .bind(&draft.title)
        .bind(&draft.description)
        .bind(serde_json::to_string(&draft.ingredients)?)
        .bind(serde_json::to_string(&draft.categories)?)
        .bind(&draft.image_url)
        .bind(author_id)
        .bind(draft.calories)
        .bind(draft.difficulty)
        .bind(&draft.time)
        .bind(serde_json::to_string(&draft.directions)?)
        .bind(&now)
        .execute(&mut *tx)
        .await?;

        let adjusted = adjust_recipes_created(&mut tx, author_id, 1).await?;
        if !adjusted {
            tracing::warn!("Recipe {} added for unknown author {}", id, author_id);
        }

        bump_revision(&mut tx).await?;
        tx.commit().await?;

        Ok(Recipe {
            id,
            title: draft.title.clone(),
            description: draft.description.clone(),
            ingredients: draft.ingredients.clone(),
            categories: draft.categories.clone(),
            image_url: draft.image_url.clone(),
            author_id: author_id.to_string(),
            calories: draft.calories,
            difficulty: draft.difficulty,
            time: draft.time.clone(),
            favorite_counter: 0,
            directions: draft.directions.clone(),
            updated_at: now,
        })
    }

    /// Overwrite a recipe's content. Last write wins.
    ///
    /// Author and favorite counter are owned by the store and are kept.
    pub async fn update_recipe(&self, id: &str, draft: &RecipeDraft) -> Result<Recipe, AppError> {
        if id.trim().is_empty() {
            return Err(AppError::Validation("Recipe ID is required".to_string()));
        }

        let now = Utc::now().to_rfc3339();
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"UPDATE recipes SET
                title = ?, description = ?, ingredients = ?, categories = ?, image_url = ?,
                calories = ?, difficulty = ?, time = ?, directions = ?, updated_at = ?
            WHERE id = ?"#,
        )
        .bind(&draft.title)
        .bind(&draft.description)
        .bind(serde_json::to_string(&draft.ingredients)?)
        .bind(serde_json::to_string(&draft.categories)?)
        .bind(&draft.image_url)
        .bind(draft.calories)
        .bind(draft.difficulty)
        .bind(&draft.time)
        .bind(serde_json::to_string(&draft.directions)?)
        .bind(&now)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Recipe {} not found", id)));
        }

        let row = sqlx::query(&format!("SELECT {RECIPE_COLUMNS} FROM recipes WHERE id = ?"))
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

        bump_revision(&mut tx).await?;
        tx.commit().await?;

        Ok(recipe_from_row(&row))
    }

    /// Delete a recipe, its favorite markers, and uncount it from its author.
    ///
    /// Returns the removed recipe. A second delete of the same ID is `NotFound`.
    pub async fn delete_recipe(&self, id: &str) -> Result<Recipe, AppError> {
        if id.trim().is_empty() {
            return Err(AppError::Validation("Recipe ID is required".to_string()));
        }

        let mut tx = self.pool.begin().await?;

        // Delete first so the transaction takes the write lock up front.
        let row = sqlx::query(&format!(
            "DELETE FROM recipes WHERE id = ? RETURNING {RECIPE_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            return Err(AppError::NotFound(format!("Recipe {} not found", id)));
        };
        let recipe = recipe_from_row(&row);

        sqlx::query("DELETE FROM favorites WHERE recipe_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        adjust_recipes_created(&mut tx, &recipe.author_id, -1).await?;

        bump_revision(&mut tx).await?;
        tx.commit().await?;

        Ok(recipe)
    }

    // ==================== FAVORITE OPERATIONS ====================

    /// IDs of the recipes a user has marked favorite, oldest first.
    pub async fn list_favorite_ids(&self, user_id: &str) -> Result<Vec<String>, AppError> {
        let ids = sqlx::query_scalar(
            "SELECT recipe_id FROM favorites WHERE user_id = ? ORDER BY created_at, rowid",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }

    /// Mark or unmark a recipe as a user's favorite.
    ///
    /// The recipe's counter only moves when the marker actually changes, and
    /// never drops below zero. Returns the counter after the change.
    pub async fn set_favorite(
        &self,
        user_id: &str,
        recipe_id: &str,
        is_favorite: bool,
    ) -> Result<i64, AppError> {
        if user_id.trim().is_empty() || recipe_id.trim().is_empty() {
            return Err(AppError::Validation(
                "User and recipe are required".to_string(),
            ));
        }

        let mut tx = self.pool.begin().await?;

        let marker = if is_favorite {
            sqlx::query(
                "INSERT OR IGNORE INTO favorites (user_id, recipe_id, created_at) VALUES (?, ?, ?)",
            )
            .bind(user_id)
            .bind(recipe_id)
            .bind(Utc::now().to_rfc3339())
            .execute(&mut *tx)
            .await?
        } else {
            sqlx::query("DELETE FROM favorites WHERE user_id = ? AND recipe_id = ?")
                .bind(user_id)
                .bind(recipe_id)
                .execute(&mut *tx)
                .await?
        };

        if marker.rows_affected() > 0 {
            let delta = if is_favorite { 1 } else { -1 };
            sqlx::query(
                "UPDATE recipes SET favorite_counter = MAX(favorite_counter + ?, 0) WHERE id = ?",
            )
            .bind(delta)
            .bind(recipe_id)
            .execute(&mut *tx)
            .await?;
        }

        let counter: Option<i64> =
            sqlx::query_scalar("SELECT favorite_counter FROM recipes WHERE id = ?")
                .bind(recipe_id)
                .fetch_optional(&mut *tx)
                .await?;

        // Dropping the transaction rolls the marker back.
        let Some(counter) = counter else {
            return Err(AppError::NotFound(format!("Recipe {} not found", recipe_id)));
        };

        if marker.rows_affected() > 0 {
            bump_revision(&mut tx).await?;
        }
        tx.commit().await?;

        Ok(counter)
    }

    // ==================== MAINTENANCE ====================

    /// Recompute both denormalized counters from the records they summarize.
    ///
    /// Also drops favorite markers pointing at missing recipes. Returns the
    /// number of rows corrected.
    pub async fn reconcile_counters(&self) -> Result<u64, AppError> {
        let mut tx = self.pool.begin().await?;

        let dangling = sqlx::query(
            "DELETE FROM favorites WHERE recipe_id NOT IN (SELECT id FROM recipes)",
        )
        .execute(&mut *tx)
        .await?
        .rows_affected();

        let favorites = sqlx::query(
            r#"UPDATE recipes SET favorite_counter = (
                   SELECT COUNT(*) FROM favorites f WHERE f.recipe_id = recipes.id
               )
               WHERE favorite_counter != (
                   SELECT COUNT(*) FROM favorites f WHERE f.recipe_id = recipes.id
               )"#,
        )
        .execute(&mut *tx)
        .await?
        .rows_affected();

        let created = sqlx::query(
            r#"UPDATE users SET recipes_created = (
                   SELECT COUNT(*) FROM recipes r WHERE r.author_id = users.id
               )
               WHERE recipes_created != (
                   SELECT COUNT(*) FROM recipes r WHERE r.author_id = users.id
               )"#,
        )
        .execute(&mut *tx)
        .await?
        .rows_affected();

        let corrected = dangling + favorites + created;
        if corrected > 0 {
            bump_revision(&mut tx).await?;
        }
        tx.commit().await?;

        Ok(corrected)
    }
}

// Helper functions for writes inside a transaction

async fn bump_revision(conn: &mut SqliteConnection) -> Result<(), AppError> {
    let now = Utc::now().to_rfc3339();
    sqlx::query("UPDATE meta SET revision_id = revision_id + 1, generated_at = ? WHERE id = 1")
        .bind(&now)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// Atomically adjust a user's recipe count, clamped at zero.
/// Returns false when the user does not exist.
async fn adjust_recipes_created(
    conn: &mut SqliteConnection,
    user_id: &str,
    delta: i64,
) -> Result<bool, AppError> {
    let result =
        sqlx::query("UPDATE users SET recipes_created = MAX(recipes_created + ?, 0) WHERE id = ?")
            .bind(delta)
            .bind(user_id)
            .execute(&mut *conn)
            .await?;
    Ok(result.rows_affected() > 0)
}

// Helper functions for row conversion

fn user_from_row(row: &SqliteRow) -> User {
    User {
        id: row.get("id"),
        email: row.get("email"),
        username: row.get("username"),
        joined: row.get("joined"),
        recipes_created: row.get("recipes_created"),
    }
}

fn recipe_from_row(row: &SqliteRow) -> Recipe {
    let ingredients: String = row.get("ingredients");
    let categories: String = row.get("categories");
    let directions: String = row.get("directions");

    Recipe {
        id: row.get("id"),
        title: row.get("title"),
        description: row.get("description"),
        ingredients: parse_json_list(&ingredients),
        categories: parse_json_list(&categories),
        image_url: row.get("image_url"),
        author_id: row.get("author_id"),
        calories: row.get("calories"),
        difficulty: row.get("difficulty"),
        time: row.get("time"),
        favorite_counter: row.get("favorite_counter"),
        directions: parse_json_list(&directions),
        updated_at: row.get("updated_at"),
    }
}

fn parse_json_list<T: DeserializeOwned>(s: &str) -> Vec<T> {
    serde_json::from_str(s).unwrap_or_default()
}
