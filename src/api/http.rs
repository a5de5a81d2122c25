use crate::api::PropertyApi;
use crate::config::ApiConfig;
use crate::error::{AppError, Result};
use crate::filters::url::filter_params;
use crate::models::{
    FavoriteToggle, FilterState, FilteredResponse, Property, PropertyId, SavedSearch, SearchCriteria,
    SearchRequest, SearchResponse, Suggestion,
};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

/// Listing API client over HTTP/JSON
#[derive(Clone)]
pub struct HttpPropertyApi {
    client: Client,
    base_url: String,
    auth_token: Option<String>,
    timeout_secs: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SaveSearchPayload<'a> {
    name: &'a str,
    criteria: &'a SearchCriteria,
}

impl HttpPropertyApi {
    /// Create a new client from API configuration
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .user_agent(concat!("listing-search/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AppError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            auth_token: config.auth_token.clone(),
            timeout_secs: config.request_timeout_secs,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.auth_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Send a request and return the response if its status is 2xx
    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AppError::Timeout(format!(
                        "Listing API request timed out after {} seconds",
                        self.timeout_secs
                    ))
                } else if e.is_connect() {
                    AppError::Network(format!("Failed to connect to listing API: {}", e))
                } else {
                    AppError::Network(format!("Listing API request failed: {}", e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), body = %body, "Listing API returned an error");
            return Err(AppError::Api {
                status: status.as_u16(),
                message: if body.is_empty() {
                    status.to_string()
                } else {
                    body
                },
            });
        }

        Ok(response)
    }

    async fn fetch_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = self.send(request).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| AppError::Serialization(format!("Invalid listing API response: {}", e)))
    }

    fn paged_params(filters: &FilterState, page: u32, limit: u32) -> Vec<(String, String)> {
        let mut params = filter_params(filters, &FilterState::default());
        params.push(("page".to_string(), page.to_string()));
        params.push(("limit".to_string(), limit.to_string()));
        params
    }
}

#[async_trait]
impl PropertyApi for HttpPropertyApi {
    async fn search_properties(&self, request: &SearchRequest) -> Result<SearchResponse> {
        let mut params = Self::paged_params(&request.filters, request.page, request.limit);
        params.insert(0, ("q".to_string(), request.query.clone()));

        debug!(query = %request.query, page = request.page, "Searching properties");
        self.fetch_json(self.client.get(self.url("properties/search")).query(&params))
            .await
    }

    async fn get_filtered_properties(
        &self,
        filters: &FilterState,
        page: u32,
        limit: u32,
    ) -> Result<FilteredResponse> {
        let params = Self::paged_params(filters, page, limit);

        debug!(page, limit, "Listing filtered properties");
        self.fetch_json(self.client.get(self.url("properties")).query(&params))
            .await
    }

    async fn get_property_suggestions(&self, query: &str) -> Result<Vec<Suggestion>> {
        self.fetch_json(
            self.client
                .get(self.url("properties/suggestions"))
                .query(&[("q", query)]),
        )
        .await
    }

    async fn save_search(&self, criteria: &SearchCriteria, name: &str) -> Result<SavedSearch> {
        let payload = SaveSearchPayload { name, criteria };
        self.fetch_json(self.client.post(self.url("saved-searches")).json(&payload))
            .await
    }

    async fn get_saved_searches(&self) -> Result<Vec<SavedSearch>> {
        self.fetch_json(self.client.get(self.url("saved-searches")))
            .await
    }

    async fn delete_saved_search(&self, id: &str) -> Result<()> {
        self.send(self.client.delete(self.url(&format!("saved-searches/{}", id))))
            .await?;
        Ok(())
    }

    async fn toggle_favorite(&self, property_id: PropertyId) -> Result<FavoriteToggle> {
        self.fetch_json(
            self.client
                .post(self.url(&format!("favorites/{}/toggle", property_id))),
        )
        .await
    }

    async fn get_favorite_properties(&self) -> Result<Vec<Property>> {
        self.fetch_json(self.client.get(self.url("favorites"))).await
    }
}
