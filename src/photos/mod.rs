//! Unsplash photo search used to pick recipe cover images.

use std::time::Duration;

use serde::Deserialize;

use crate::errors::AppError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
struct UnsplashPhoto {
    urls: UnsplashUrls,
}

#[derive(Debug, Deserialize)]
struct UnsplashUrls {
    regular: String,
}

/// Client for the "random photo for a query" endpoint.
#[derive(Clone)]
pub struct PhotoClient {
    http: reqwest::Client,
    api_url: String,
    access_key: Option<String>,
    placeholder: String,
}

impl PhotoClient {
    pub fn new(
        api_url: impl Into<String>,
        access_key: Option<String>,
        placeholder: impl Into<String>,
    ) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            access_key,
            placeholder: placeholder.into(),
        })
    }

    /// Fetch a random photo URL matching `query`.
    pub async fn random_photo(&self, query: &str) -> Result<String, AppError> {
        let Some(key) = self.access_key.as_deref() else {
            return Err(AppError::Upstream(
                "No photo service access key configured".to_string(),
            ));
        };

        let photo: UnsplashPhoto = self
            .http
            .get(format!("{}/photos/random", self.api_url))
            .header(reqwest::header::AUTHORIZATION, format!("Client-ID {}", key))
            .query(&[("query", query)])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if photo.urls.regular.trim().is_empty() {
            return Err(AppError::Upstream("Photo service returned no URL".to_string()));
        }

        Ok(photo.urls.regular)
    }

    /// Cover image for a recipe title; any failure yields the placeholder.
    pub async fn cover_for(&self, query: &str) -> String {
        match self.random_photo(query).await {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!("Using placeholder cover for {:?}: {}", query, e);
                self.placeholder.clone()
            }
        }
    }
}
