//! User account and profile models.

use serde::{Deserialize, Serialize};

use super::Recipe;

/// A registered user.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    pub username: String,
    /// Registration time in epoch milliseconds.
    pub joined: i64,
    pub recipes_created: i64,
}

/// Profile statistics shown on the profile screen.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub username: String,
    pub joined: i64,
    pub recipes_created: i64,
    pub favorites_count: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub most_liked_recipe: Option<Recipe>,
}

/// Request body for account registration.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub username: String,
}

/// Request body for sign-in.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Session issued on register or login.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthSession {
    pub token: String,
    pub user: User,
}
