//! Integration tests for the Spoonful backend.

use std::sync::Arc;

use axum::{routing::get, Json, Router};
use reqwest::Client;
use serde_json::{json, Value};
use tempfile::TempDir;

use crate::catalog::Catalog;
use crate::config::Config;
use crate::db::{init_database, Repository};
use crate::photos::PhotoClient;
use crate::state::RecipeState;
use crate::{create_router, AppState};

const PLACEHOLDER: &str = "https://example.com/placeholder.png";

const INGREDIENTS: &str = "\
Egg|1.5|70|1.5|0.5|x|60
Sugar|4|x|48|16|x|774
Butter|7.2|x|102|34|x|1628
";

const CATEGORIES: &str = "Dinner\nDessert\nBreakfast\nVegan\n";

/// Test fixture for integration tests.
struct TestFixture {
    client: Client,
    base_url: String,
    _temp_dir: TempDir,
}

impl TestFixture {
    async fn new() -> Self {
        Self::build(Some("test-app-key".to_string()), None).await
    }

    async fn with_photo_service(api_url: String) -> Self {
        Self::build(Some("test-app-key".to_string()), Some(api_url)).await
    }

    async fn build(app_key: Option<String>, photo_api_url: Option<String>) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.sqlite");

        // Initialize database
        let pool = init_database(&db_path).await.expect("Failed to init DB");
        let repo = Arc::new(Repository::new(pool));

        // Unreachable photo service unless a stub is supplied
        let unsplash_access_key = photo_api_url.as_ref().map(|_| "test-access".to_string());
        let unsplash_api_url = photo_api_url.unwrap_or_else(|| "http://127.0.0.1:9".to_string());

        // Create config
        let config = Config {
            app_key: app_key.clone(),
            db_path,
            assets_dir: temp_dir.path().to_path_buf(),
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            log_level: "warn".to_string(),
            log_json: false,
            unsplash_access_key,
            unsplash_api_url,
            placeholder_image: PLACEHOLDER.to_string(),
        };

        let photos = PhotoClient::new(
            config.unsplash_api_url.clone(),
            config.unsplash_access_key.clone(),
            config.placeholder_image.clone(),
        )
        .expect("Failed to build photo client");

        let recipes = Arc::new(RecipeState::new(Arc::clone(&repo)));
        recipes.refresh_recipes().await;

        let state = AppState {
            repo,
            recipes,
            catalog: Arc::new(Catalog::from_sources(INGREDIENTS, CATEGORIES)),
            photos,
            config: Arc::new(config),
        };

        let app = create_router(state);

        // Bind to random port
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().expect("Failed to get addr");
        let base_url = format!("http://{}", addr);

        // Spawn server
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Wait for server to start
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

        let mut client_builder = Client::builder();
        if let Some(key) = app_key {
            let mut headers = reqwest::header::HeaderMap::new();
            headers.insert("x-app-key", key.parse().unwrap());
            client_builder = client_builder.default_headers(headers);
        }

        TestFixture {
            client: client_builder.build().unwrap(),
            base_url,
            _temp_dir: temp_dir,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Register an account and return `(token, user_id)`.
    async fn register(&self, email: &str) -> (String, String) {
        let resp = self
            .client
            .post(self.url("/api/auth/register"))
            .json(&json!({
                "email": email,
                "password": "secret1",
                "username": email.split('@').next().unwrap()
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);

        let body: Value = resp.json().await.unwrap();
        (
            body["data"]["token"].as_str().unwrap().to_string(),
            body["data"]["user"]["id"].as_str().unwrap().to_string(),
        )
    }

    async fn create_recipe(&self, token: &str, recipe: Value) -> Value {
        let resp = self
            .client
            .post(self.url("/api/recipes"))
            .bearer_auth(token)
            .json(&recipe)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);

        let body: Value = resp.json().await.unwrap();
        body["data"].clone()
    }

    async fn get_json(&self, path: &str, token: Option<&str>) -> (u16, Value) {
        let mut req = self.client.get(self.url(path));
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }
        let resp = req.send().await.unwrap();
        let status = resp.status().as_u16();
        (status, resp.json().await.unwrap())
    }

    async fn set_favorite(&self, token: &str, recipe_id: &str, favorite: bool) -> (u16, Value) {
        let resp = self
            .client
            .put(self.url(&format!("/api/recipes/{}/favorite", recipe_id)))
            .bearer_auth(token)
            .json(&json!({ "favorite": favorite }))
            .send()
            .await
            .unwrap();
        let status = resp.status().as_u16();
        (status, resp.json().await.unwrap())
    }
}

fn soup() -> Value {
    json!({
        "title": "Soup",
        "description": "Warm tomato broth",
        "ingredients": [{ "name": "Egg", "amount": 2, "unit": "piece" }],
        "categories": ["dinner"],
        "difficulty": 3,
        "time": "20",
        "directions": ["Boil", "Serve"]
    })
}

fn cake() -> Value {
    json!({
        "title": "Cake",
        "description": "Sweet sponge",
        "ingredients": ["Sugar (2 tbsp)", "Butter (1 tbsp)"],
        "categories": ["Dessert"],
        "difficulty": 1,
        "time": "90",
        "imageUrl": "https://img.example.com/cake.jpg"
    })
}

#[tokio::test]
async fn test_health_check() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .get(fixture.url("/health"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "OK");
}

#[tokio::test]
async fn test_app_key_missing_and_invalid() {
    let fixture = TestFixture::new().await;
    let bare = Client::new();

    let resp = bare
        .get(fixture.url("/api/recipes"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");

    let resp = bare
        .get(fixture.url("/api/recipes"))
        .header("x-app-key", "wrong-key")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);

    // Health stays open
    let resp = bare.get(fixture.url("/health")).send().await.unwrap();
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn test_app_key_disabled_in_dev_mode() {
    let fixture = TestFixture::build(None, None).await;

    let (status, body) = fixture.get_json("/api/recipes", None).await;
    assert_eq!(status, 200);
    assert_eq!(body["success"], true);
}

#[tokio::test]
async fn test_register_login_logout() {
    let fixture = TestFixture::new().await;
    let (token, user_id) = fixture.register("ann@example.com").await;

    let (status, body) = fixture.get_json("/api/me", Some(&token)).await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["id"], user_id.as_str());
    assert_eq!(body["data"]["username"], "ann");
    assert_eq!(body["data"]["recipesCreated"], 0);
    assert!(body["data"]["joined"].as_i64().unwrap() > 0);

    // Duplicate email
    let resp = fixture
        .client
        .post(fixture.url("/api/auth/register"))
        .json(&json!({ "email": "ANN@example.com", "password": "secret1", "username": "x" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 409);

    // Short password
    let resp = fixture
        .client
        .post(fixture.url("/api/auth/register"))
        .json(&json!({ "email": "bob@example.com", "password": "123", "username": "bob" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    // Wrong password
    let resp = fixture
        .client
        .post(fixture.url("/api/auth/login"))
        .json(&json!({ "email": "ann@example.com", "password": "nope-nope" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);

    // Good login opens a second session
    let resp = fixture
        .client
        .post(fixture.url("/api/auth/login"))
        .json(&json!({ "email": "ann@example.com", "password": "secret1" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    let second = body["data"]["token"].as_str().unwrap().to_string();
    assert_ne!(second, token);

    // Logout closes only that session
    let resp = fixture
        .client
        .post(fixture.url("/api/auth/logout"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let (status, _) = fixture.get_json("/api/me", Some(&token)).await;
    assert_eq!(status, 401);
    let (status, _) = fixture.get_json("/api/me", Some(&second)).await;
    assert_eq!(status, 200);
}

#[tokio::test]
async fn test_create_recipe_requires_session() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .post(fixture.url("/api/recipes"))
        .json(&soup())
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);

    let resp = fixture
        .client
        .post(fixture.url("/api/recipes"))
        .bearer_auth("not-a-session")
        .json(&soup())
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn test_create_recipe_computes_calories_and_cover() {
    let fixture = TestFixture::new().await;
    let (token, user_id) = fixture.register("ann@example.com").await;

    let recipe = fixture.create_recipe(&token, soup()).await;
    assert_eq!(recipe["title"], "Soup");
    assert_eq!(recipe["authorId"], user_id.as_str());
    assert_eq!(recipe["calories"], 140);
    assert_eq!(recipe["favoriteCounter"], 0);
    assert_eq!(recipe["categories"], json!(["Dinner"]));
    // Photo service is unreachable
    assert_eq!(recipe["imageUrl"], PLACEHOLDER);

    // Legacy display strings and an explicit image
    let cake = fixture.create_recipe(&token, cake()).await;
    assert_eq!(cake["calories"], 2 * 48 + 102);
    assert_eq!(cake["imageUrl"], "https://img.example.com/cake.jpg");
    assert_eq!(cake["ingredients"][0]["name"], "Sugar");
    assert_eq!(cake["ingredients"][0]["unit"], "tbsp");

    let (_, me) = fixture.get_json("/api/me", Some(&token)).await;
    assert_eq!(me["data"]["recipesCreated"], 2);

    let id = recipe["id"].as_str().unwrap();
    let (status, body) = fixture
        .get_json(&format!("/api/recipes/{}", id), None)
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["directions"], json!(["Boil", "Serve"]));
}

#[tokio::test]
async fn test_create_recipe_validation() {
    let fixture = TestFixture::new().await;
    let (token, _) = fixture.register("ann@example.com").await;

    let mut invalid = vec![];
    let mut blank_title = soup();
    blank_title["title"] = json!("  ");
    invalid.push(blank_title);
    let mut no_categories = soup();
    no_categories["categories"] = json!([]);
    invalid.push(no_categories);
    let mut unknown_category = soup();
    unknown_category["categories"] = json!(["Seafood"]);
    invalid.push(unknown_category);
    let mut too_hard = soup();
    too_hard["difficulty"] = json!(6);
    invalid.push(too_hard);
    let mut no_amount = soup();
    no_amount["ingredients"] = json!(["Salt to taste"]);
    invalid.push(no_amount);

    for body in invalid {
        let resp = fixture
            .client
            .post(fixture.url("/api/recipes"))
            .bearer_auth(&token)
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 400, "accepted {}", body);
    }

    let (_, list) = fixture.get_json("/api/recipes", None).await;
    assert_eq!(list["data"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_cover_from_photo_service() {
    let photo_router = Router::new().route(
        "/photos/random",
        get(|| async { Json(json!({ "urls": { "regular": "https://img.example.com/soup.jpg" } })) }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let photo_addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, photo_router).await.unwrap();
    });

    let fixture = TestFixture::with_photo_service(format!("http://{}", photo_addr)).await;
    let (token, _) = fixture.register("ann@example.com").await;

    let recipe = fixture.create_recipe(&token, soup()).await;
    assert_eq!(recipe["imageUrl"], "https://img.example.com/soup.jpg");
}

#[tokio::test]
async fn test_update_recipe_author_only() {
    let fixture = TestFixture::new().await;
    let (ann, _) = fixture.register("ann@example.com").await;
    let (bob, _) = fixture.register("bob@example.com").await;

    let recipe = fixture.create_recipe(&ann, cake()).await;
    let id = recipe["id"].as_str().unwrap();

    let mut edit = cake();
    edit["title"] = json!("Butter cake");
    edit["ingredients"] = json!([{ "name": "Butter", "amount": 2, "unit": "tbsp" }]);
    edit.as_object_mut().unwrap().remove("imageUrl");

    let resp = fixture
        .client
        .put(fixture.url(&format!("/api/recipes/{}", id)))
        .bearer_auth(&bob)
        .json(&edit)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);

    let resp = fixture
        .client
        .put(fixture.url(&format!("/api/recipes/{}", id)))
        .bearer_auth(&ann)
        .json(&edit)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["title"], "Butter cake");
    assert_eq!(body["data"]["calories"], 204);
    // Existing image kept
    assert_eq!(body["data"]["imageUrl"], "https://img.example.com/cake.jpg");

    let resp = fixture
        .client
        .put(fixture.url("/api/recipes/missing"))
        .bearer_auth(&ann)
        .json(&edit)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn test_delete_recipe() {
    let fixture = TestFixture::new().await;
    let (ann, ann_id) = fixture.register("ann@example.com").await;
    let (bob, _) = fixture.register("bob@example.com").await;

    let recipe = fixture.create_recipe(&ann, soup()).await;
    let id = recipe["id"].as_str().unwrap();
    fixture.set_favorite(&bob, id, true).await;

    let resp = fixture
        .client
        .delete(fixture.url(&format!("/api/recipes/{}", id)))
        .bearer_auth(&bob)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);

    let resp = fixture
        .client
        .delete(fixture.url(&format!("/api/recipes/{}", id)))
        .bearer_auth(&ann)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let (status, _) = fixture
        .get_json(&format!("/api/recipes/{}", id), None)
        .await;
    assert_eq!(status, 404);

    let (_, profile) = fixture
        .get_json(&format!("/api/users/{}", ann_id), None)
        .await;
    assert_eq!(profile["data"]["recipesCreated"], 0);

    // Markers went with the recipe
    let (_, favorites) = fixture.get_json("/api/me/favorites", Some(&bob)).await;
    assert_eq!(favorites["data"], json!([]));

    let resp = fixture
        .client
        .delete(fixture.url(&format!("/api/recipes/{}", id)))
        .bearer_auth(&ann)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn test_favorite_toggle_updates_counter() {
    let fixture = TestFixture::new().await;
    let (ann, _) = fixture.register("ann@example.com").await;
    let (bob, _) = fixture.register("bob@example.com").await;

    let recipe = fixture.create_recipe(&ann, soup()).await;
    let id = recipe["id"].as_str().unwrap();

    let (status, body) = fixture.set_favorite(&bob, id, true).await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["favorite"], true);
    assert_eq!(body["data"]["favoriteCounter"], 1);

    // Repeating the same toggle changes nothing
    let (_, body) = fixture.set_favorite(&bob, id, true).await;
    assert_eq!(body["data"]["favoriteCounter"], 1);

    let (_, body) = fixture.set_favorite(&ann, id, true).await;
    assert_eq!(body["data"]["favoriteCounter"], 2);

    let (_, favorites) = fixture.get_json("/api/me/favorites", Some(&bob)).await;
    assert_eq!(favorites["data"], json!([id]));

    let (status, body) = fixture
        .get_json(&format!("/api/recipes/{}/favorite", id), Some(&bob))
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["favorite"], true);
    assert_eq!(body["data"]["favoriteCounter"], 2);

    let (_, list) = fixture
        .get_json("/api/me/favorites/recipes", Some(&bob))
        .await;
    assert_eq!(list["data"][0]["id"], id);
    assert_eq!(list["data"][0]["favoriteCounter"], 2);

    let (_, body) = fixture.set_favorite(&bob, id, false).await;
    assert_eq!(body["data"]["favoriteCounter"], 1);
    let (_, body) = fixture.set_favorite(&bob, id, false).await;
    assert_eq!(body["data"]["favoriteCounter"], 1);

    let (_, list) = fixture
        .get_json("/api/me/favorites/recipes", Some(&bob))
        .await;
    assert_eq!(list["data"], json!([]));

    let (status, _) = fixture.set_favorite(&bob, "missing", true).await;
    assert_eq!(status, 404);
}

#[tokio::test]
async fn test_favorite_recipes_are_not_cut_to_popular() {
    let fixture = TestFixture::new().await;
    let (ann, _) = fixture.register("ann@example.com").await;

    let mut created = Vec::new();
    for i in 0..12 {
        let mut recipe = soup();
        recipe["title"] = json!(format!("Soup {}", i));
        let recipe = fixture.create_recipe(&ann, recipe).await;
        created.push(recipe["id"].as_str().unwrap().to_string());
    }
    // Favorite newest first; the view still follows the recipe list order
    for id in created.iter().rev() {
        let (status, _) = fixture.set_favorite(&ann, id, true).await;
        assert_eq!(status, 200);
    }

    let (_, ids) = fixture.get_json("/api/me/favorites", Some(&ann)).await;
    assert_eq!(ids["data"].as_array().unwrap().len(), 12);

    let (status, list) = fixture
        .get_json("/api/me/favorites/recipes", Some(&ann))
        .await;
    assert_eq!(status, 200);
    let listed: Vec<&str> = list["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["id"].as_str().unwrap())
        .collect();
    assert_eq!(listed, created);

    let (_, refined) = fixture
        .get_json("/api/me/favorites/recipes?search=soup%201", Some(&ann))
        .await;
    // "Soup 1", "Soup 10" and "Soup 11"
    assert_eq!(refined["data"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_list_recipes_filters() {
    let fixture = TestFixture::new().await;
    let (ann, _) = fixture.register("ann@example.com").await;
    let (bob, _) = fixture.register("bob@example.com").await;

    let soup = fixture.create_recipe(&ann, soup()).await;
    let cake = fixture.create_recipe(&bob, cake()).await;
    let cake_id = cake["id"].as_str().unwrap();
    fixture.set_favorite(&ann, cake_id, true).await;

    // Popular view: most favorited first
    let (_, body) = fixture.get_json("/api/recipes", None).await;
    let titles: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["Cake", "Soup"]);

    let (_, body) = fixture
        .get_json("/api/recipes?maxDifficulty=3&maxTime=30", None)
        .await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["title"], "Soup");

    let (_, body) = fixture.get_json("/api/recipes?search=TOMATO", None).await;
    assert_eq!(body["data"][0]["id"], soup["id"]);

    let (_, body) = fixture
        .get_json("/api/recipes?categories=vegan,dessert", None)
        .await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["id"], cake_id);

    let (_, body) = fixture.get_json("/api/recipes?category=Dinner", None).await;
    assert_eq!(body["data"][0]["title"], "Soup");

    let (_, body) = fixture.get_json("/api/recipes?mine=true", Some(&bob)).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["id"], cake_id);
}

#[tokio::test]
async fn test_user_profile_stats() {
    let fixture = TestFixture::new().await;
    let (ann, ann_id) = fixture.register("ann@example.com").await;
    let (bob, _) = fixture.register("bob@example.com").await;

    fixture.create_recipe(&ann, soup()).await;
    let cake = fixture.create_recipe(&ann, cake()).await;
    fixture
        .set_favorite(&bob, cake["id"].as_str().unwrap(), true)
        .await;

    let (status, body) = fixture
        .get_json(&format!("/api/users/{}", ann_id), None)
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["username"], "ann");
    assert_eq!(body["data"]["recipesCreated"], 2);
    assert_eq!(body["data"]["mostLikedRecipe"]["title"], "Cake");
    assert!(body["data"].get("email").is_none());

    let (_, bob_profile) = fixture.get_json("/api/me", Some(&bob)).await;
    assert_eq!(bob_profile["data"]["favoritesCount"], 1);
    assert!(bob_profile["data"].get("mostLikedRecipe").is_none());

    let (status, _) = fixture.get_json("/api/users/nobody", None).await;
    assert_eq!(status, 404);
}

#[tokio::test]
async fn test_catalog_endpoints() {
    let fixture = TestFixture::new().await;

    let (status, body) = fixture
        .get_json("/api/catalog/ingredients?q=EG", None)
        .await;
    assert_eq!(status, 200);
    let options = body["data"].as_array().unwrap();
    assert_eq!(options.len(), 1);
    assert_eq!(options[0]["name"], "Egg");
    assert_eq!(options[0]["caloriesPerMl"], -1.0);
    assert_eq!(
        options[0]["units"],
        json!(["g", "piece", "tbsp", "tsp", "cup"])
    );

    let (_, body) = fixture.get_json("/api/catalog/categories", None).await;
    assert_eq!(
        body["data"],
        json!(["Breakfast", "Dessert", "Dinner", "Vegan"])
    );

    let resp = fixture
        .client
        .post(fixture.url("/api/catalog/calories"))
        .json(&json!({
            "ingredients": [
                { "name": "Egg", "amount": 1, "unit": "piece" },
                "Sugar (1 tsp)",
                { "name": "Egg", "amount": 1, "unit": "ml" },
                "Salt to taste"
            ]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["total"], 86);
    assert_eq!(body["data"]["lines"][1]["display"], "Sugar (1 tsp)");
    assert_eq!(body["data"]["lines"][2]["calories"], 0.0);

    let resp = fixture
        .client
        .post(fixture.url("/api/catalog/calories"))
        .json(&json!({
            "ingredients": [
                "Egg (inf g)",
                { "name": "Egg", "amount": -5, "unit": "piece" },
                { "name": "Egg", "amount": 1, "unit": "piece" }
            ]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["lines"][0]["calories"], 0.0);
    assert_eq!(body["data"]["lines"][1]["calories"], 0.0);
    assert_eq!(body["data"]["total"], 70);
}

#[tokio::test]
async fn test_revision_increments_on_writes() {
    let fixture = TestFixture::new().await;
    let (ann, _) = fixture.register("ann@example.com").await;

    let (_, before) = fixture.get_json("/api/datastore/revision", None).await;
    let before = before["data"]["revisionId"].as_i64().unwrap();

    let recipe = fixture.create_recipe(&ann, soup()).await;
    fixture
        .set_favorite(&ann, recipe["id"].as_str().unwrap(), true)
        .await;

    let (_, after) = fixture.get_json("/api/datastore/revision", None).await;
    assert_eq!(after["data"]["revisionId"].as_i64().unwrap(), before + 2);
    assert_eq!(after["revisionId"], after["data"]["revisionId"]);
}

#[tokio::test]
async fn test_recipe_stream_sends_snapshots() {
    let fixture = TestFixture::new().await;
    let (ann, _) = fixture.register("ann@example.com").await;

    let mut resp = fixture
        .client
        .get(fixture.url("/api/recipes/stream"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert!(resp.headers()["content-type"]
        .to_str()
        .unwrap()
        .starts_with("text/event-stream"));

    fixture.create_recipe(&ann, soup()).await;

    let mut received = String::new();
    let deadline = tokio::time::Instant::now() + tokio::time::Duration::from_secs(5);
    while !received.contains("Warm tomato broth") {
        let chunk = tokio::time::timeout_at(deadline, resp.chunk())
            .await
            .expect("timed out waiting for snapshot")
            .unwrap()
            .expect("stream ended");
        received.push_str(&String::from_utf8_lossy(&chunk));
    }

    assert!(received.contains("event: recipes"));
}
