//! In-memory state holder for the live recipe list and per-user favorites.
//!
//! The recipe list is re-pulled in full after every mutation and published
//! through a `watch` channel, so subscribers always see a complete snapshot.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{watch, RwLock};

use crate::db::Repository;
use crate::models::Recipe;

/// Upper bound on users whose favorite lists are cached at once.
pub const MAX_CACHED_FAVORITES: usize = 1024;

/// A full copy of the recipe collection at one revision.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeSnapshot {
    pub revision_id: i64,
    pub recipes: Arc<Vec<Recipe>>,
}

/// Cached recipe list plus the favorite-ID lists of recently seen users.
pub struct RecipeState {
    repo: Arc<Repository>,
    recipes: watch::Sender<RecipeSnapshot>,
    favorites: RwLock<HashMap<String, Arc<Vec<String>>>>,
    favorites_capacity: usize,
}

impl RecipeState {
    pub fn new(repo: Arc<Repository>) -> Self {
        Self::with_favorites_capacity(repo, MAX_CACHED_FAVORITES)
    }

    fn with_favorites_capacity(repo: Arc<Repository>, favorites_capacity: usize) -> Self {
        let (recipes, _) = watch::channel(RecipeSnapshot::default());
        Self {
            repo,
            recipes,
            favorites: RwLock::new(HashMap::new()),
            favorites_capacity: favorites_capacity.max(1),
        }
    }

    /// Last published snapshot.
    pub fn recipes(&self) -> RecipeSnapshot {
        self.recipes.borrow().clone()
    }

    /// Receiver that observes every published snapshot.
    pub fn subscribe_recipes(&self) -> watch::Receiver<RecipeSnapshot> {
        self.recipes.subscribe()
    }

    /// Re-pull the whole recipe list and publish it.
    ///
    /// A failed read publishes an empty list. A snapshot older than the one
    /// already published is dropped, so racing refreshes cannot go backwards.
    pub async fn refresh_recipes(&self) -> RecipeSnapshot {
        let revision_id = match self.repo.get_revision_id().await {
            Ok(revision_id) => revision_id,
            Err(e) => {
                tracing::warn!("Failed to read revision, keeping current: {}", e);
                self.recipes.borrow().revision_id
            }
        };

        let recipes = match self.repo.list_recipes().await {
            Ok(recipes) => recipes,
            Err(e) => {
                tracing::warn!("Failed to load recipes, publishing empty list: {}", e);
                Vec::new()
            }
        };

        let snapshot = RecipeSnapshot {
            revision_id,
            recipes: Arc::new(recipes),
        };

        self.recipes.send_if_modified(|current| {
            if snapshot.revision_id >= current.revision_id {
                *current = snapshot.clone();
                true
            } else {
                false
            }
        });

        self.recipes()
    }

    /// Cached favorite IDs for a user, loading them on first use.
    pub async fn favorites(&self, user_id: &str) -> Arc<Vec<String>> {
        if let Some(ids) = self.favorites.read().await.get(user_id) {
            return Arc::clone(ids);
        }
        self.refresh_favorites(user_id).await
    }

    /// Re-pull a user's favorite IDs. A failed read caches an empty list.
    ///
    /// When the cache is full another user's entry is evicted; it is
    /// reloaded from the store on its next use.
    pub async fn refresh_favorites(&self, user_id: &str) -> Arc<Vec<String>> {
        let ids = match self.repo.list_favorite_ids(user_id).await {
            Ok(ids) => ids,
            Err(e) => {
                tracing::warn!("Failed to load favorites for {}: {}", user_id, e);
                Vec::new()
            }
        };

        let ids = Arc::new(ids);
        let mut favorites = self.favorites.write().await;
        if favorites.len() >= self.favorites_capacity && !favorites.contains_key(user_id) {
            let evicted = favorites.keys().next().cloned();
            if let Some(evicted) = evicted {
                tracing::debug!("Favorites cache full, evicting {}", evicted);
                favorites.remove(&evicted);
            }
        }
        favorites.insert(user_id.to_string(), Arc::clone(&ids));
        ids
    }

    pub async fn is_favorite(&self, user_id: &str, recipe_id: &str) -> bool {
        self.favorites(user_id)
            .await
            .iter()
            .any(|id| id == recipe_id)
    }

    /// Drop every cached favorite list, e.g. after a recipe and its markers
    /// were removed.
    pub async fn clear_favorites(&self) {
        self.favorites.write().await.clear();
    }

    /// Forget one user's cached favorites, e.g. on sign-out.
    pub async fn forget_favorites(&self, user_id: &str) {
        self.favorites.write().await.remove(user_id);
    }
}
