use reqwest::Method;

use crate::api::{ApiError, HttpClient, RequestOptions};
use crate::models::{Category, CategoryDraft, CategoryId};

#[derive(Debug, Clone)]
pub struct CategoriesClient {
    http: HttpClient,
}

impl CategoriesClient {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    pub async fn list(&self) -> Result<Vec<Category>, ApiError> {
        self.http
            .request_json("/categories/", RequestOptions::get())
            .await
    }

    pub async fn get(&self, id: CategoryId) -> Result<Category, ApiError> {
        self.http
            .request_json(&format!("/categories/{}/", id), RequestOptions::get())
            .await
    }

    pub async fn create(&self, draft: &CategoryDraft) -> Result<Category, ApiError> {
        let options = RequestOptions::json(Method::POST, draft)?;
        self.http.request_json("/categories/", options).await
    }

    pub async fn update(&self, id: CategoryId, draft: &CategoryDraft) -> Result<Category, ApiError> {
        let options = RequestOptions::json(Method::PUT, draft)?;
        self.http
            .request_json(&format!("/categories/{}/", id), options)
            .await
    }

    pub async fn delete(&self, id: CategoryId) -> Result<(), ApiError> {
        self.http
            .request(&format!("/categories/{}/", id), RequestOptions::delete())
            .await?;
        Ok(())
    }
}
