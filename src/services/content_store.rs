use moka::future::Cache;
use reqwest::Client;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::config::ContentStoreSettings;
use crate::models::{CategoryRef, DirectoryCopy, ProviderRecord, RawCategory, RawProviderDocument, RawSiteSettings};

/// Published listings in display order
pub const PROVIDERS_QUERY: &str = r#"*[_type == "directoryEntry" && isPublished == true] | order(displayPriority asc, serviceName asc) {
  _id, serviceName, slug, shortDescription, serviceArea, town, website, phone, email,
  serviceCategories[]-> { categoryName, slug }, fundingTypes, isPublished, location
}"#;

/// Published listings that can be plotted
pub const MAP_QUERY: &str = r#"*[_type == "directoryEntry" && isPublished == true && defined(location)] {
  _id, serviceName, slug, shortDescription, serviceArea, town, website, phone, email,
  serviceCategories[]-> { categoryName, slug }, fundingTypes, isPublished, location
}"#;

pub const PROVIDER_BY_SLUG_QUERY: &str = r#"*[_type == "directoryEntry" && slug.current == $slug && isPublished == true][0] {
  _id, serviceName, slug, shortDescription, serviceArea, town, website, phone, email,
  serviceCategories[]-> { categoryName, slug }, fundingTypes, isPublished, location
}"#;

pub const CATEGORIES_QUERY: &str =
    r#"*[_type == "category"] | order(displayOrder asc, categoryName asc) { _id, categoryName, slug }"#;

pub const SITE_SETTINGS_QUERY: &str =
    r#"*[_type == "siteSettings"][0] { directoryPageTitle, directoryPageSubtitle }"#;

/// Errors that can occur when querying the content store
#[derive(Debug, Error)]
pub enum ContentStoreError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned error: {0}")]
    ApiError(String),

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

/// Read-only client for the headless content store's query API
///
/// Queries are GROQ strings sent as `GET .../data/query/{dataset}?query=...`;
/// the store answers `{ "result": ... }`. With `use_cdn` set, responses are
/// also kept in a short-lived in-process cache keyed by the request URL.
pub struct ContentStoreClient {
    query_url: String,
    token: Option<String>,
    client: Client,
    cache: Option<Cache<String, Arc<Value>>>,
}

impl ContentStoreClient {
    /// Create a new content store client
    pub fn new(settings: &ContentStoreSettings) -> Result<Self, ContentStoreError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;

        let base_url = match &settings.base_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => {
                let host = if settings.use_cdn { "apicdn" } else { "api" };
                format!("https://{}.{}.sanity.io", settings.project_id, host)
            }
        };

        let query_url = format!(
            "{}/v{}/data/query/{}",
            base_url,
            settings.api_version.trim_start_matches('v'),
            settings.dataset
        );

        let cache = settings.use_cdn.then(|| {
            Cache::builder()
                .max_capacity(settings.cache_size)
                .time_to_live(Duration::from_secs(settings.cache_ttl_secs))
                .build()
        });

        Ok(Self {
            query_url,
            token: settings.token.clone(),
            client,
            cache,
        })
    }

    /// Run a GROQ query and return the `result` member of the response
    ///
    /// `params` are bound as string parameters (`$name` in the query).
    pub async fn query(&self, groq: &str, params: &[(&str, &str)]) -> Result<Value, ContentStoreError> {
        let mut url = format!("{}?query={}", self.query_url, urlencoding::encode(groq));
        for (name, value) in params {
            let literal = Value::String(value.to_string()).to_string();
            url.push_str(&format!(
                "&{}={}",
                urlencoding::encode(&format!("${}", name)),
                urlencoding::encode(&literal)
            ));
        }

        if let Some(cache) = &self.cache {
            if let Some(hit) = cache.get(&url).await {
                tracing::trace!("Content store cache hit");
                return Ok((*hit).clone());
            }
        }

        tracing::debug!("Querying content store: {}", url);

        let mut request = self.client.get(&url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_else(|_| "Unable to read body".to_string());
            tracing::error!("Content store query failed: {} - {}", status, body);
            return Err(ContentStoreError::ApiError(format!("Query failed: {}", status)));
        }

        let mut json: Value = response.json().await?;
        let result = json
            .get_mut("result")
            .map(Value::take)
            .ok_or_else(|| ContentStoreError::InvalidResponse("Missing result field".into()))?;

        if let Some(cache) = &self.cache {
            cache.insert(url, Arc::new(result.clone())).await;
        }

        Ok(result)
    }

    /// Published providers ordered by display priority then name
    pub async fn fetch_published_providers(&self) -> Result<Vec<ProviderRecord>, ContentStoreError> {
        let result = self.query(PROVIDERS_QUERY, &[]).await?;
        let providers = decode_providers(result)?;
        tracing::debug!("Fetched {} published providers", providers.len());
        Ok(providers)
    }

    /// Published providers that carry a location
    pub async fn fetch_map_providers(&self) -> Result<Vec<ProviderRecord>, ContentStoreError> {
        let result = self.query(MAP_QUERY, &[]).await?;
        decode_providers(result)
    }

    /// One published provider by slug
    pub async fn fetch_provider_by_slug(&self, slug: &str) -> Result<Option<ProviderRecord>, ContentStoreError> {
        let result = self.query(PROVIDER_BY_SLUG_QUERY, &[("slug", slug)]).await?;
        if result.is_null() {
            return Ok(None);
        }

        let raw: RawProviderDocument = serde_json::from_value(result)
            .map_err(|e| ContentStoreError::InvalidResponse(format!("Failed to parse provider: {}", e)))?;
        raw.into_record()
            .map(Some)
            .map_err(|e| ContentStoreError::InvalidResponse(e.to_string()))
    }

    /// All categories in display order
    pub async fn fetch_categories(&self) -> Result<Vec<CategoryRef>, ContentStoreError> {
        let result = self.query(CATEGORIES_QUERY, &[]).await?;
        let categories = documents(result)?
            .into_iter()
            .filter_map(|doc| serde_json::from_value::<RawCategory>(doc).ok())
            .filter_map(RawCategory::into_category)
            .collect();
        Ok(categories)
    }

    /// Listing page headings, with blanks filled from `defaults`
    pub async fn fetch_directory_copy(&self, defaults: &DirectoryCopy) -> Result<DirectoryCopy, ContentStoreError> {
        let result = self.query(SITE_SETTINGS_QUERY, &[]).await?;
        if result.is_null() {
            return Ok(defaults.clone());
        }

        let raw: RawSiteSettings = serde_json::from_value(result)
            .map_err(|e| ContentStoreError::InvalidResponse(format!("Failed to parse site settings: {}", e)))?;
        Ok(raw.into_copy(defaults))
    }
}

fn documents(result: Value) -> Result<Vec<Value>, ContentStoreError> {
    match result {
        Value::Array(docs) => Ok(docs),
        Value::Null => Ok(Vec::new()),
        other => Err(ContentStoreError::InvalidResponse(format!(
            "Expected an array of documents, got {}",
            other
        ))),
    }
}

/// Decode provider documents, dropping the ones that fail validation
fn decode_providers(result: Value) -> Result<Vec<ProviderRecord>, ContentStoreError> {
    let providers = documents(result)?
        .into_iter()
        .filter_map(|doc| {
            let raw: RawProviderDocument = match serde_json::from_value(doc) {
                Ok(raw) => raw,
                Err(e) => {
                    tracing::warn!("Skipping unparseable provider document: {}", e);
                    return None;
                }
            };
            match raw.into_record() {
                Ok(record) => Some(record),
                Err(e) => {
                    tracing::warn!("Skipping provider document: {}", e);
                    None
                }
            }
        })
        .collect();

    Ok(providers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    const QUERY_PATH: &str = "/v2025-01-01/data/query/production";

    fn client_for(server: &mockito::Server) -> ContentStoreClient {
        ContentStoreClient::new(&ContentStoreSettings::with_base_url(server.url(), "test", "production")).unwrap()
    }

    #[test]
    fn test_query_url_from_project() {
        let mut settings = ContentStoreSettings::with_base_url("unused", "abc123", "production");
        settings.base_url = None;
        settings.api_version = "v2024-06-01".to_string();

        let client = ContentStoreClient::new(&settings).unwrap();
        assert_eq!(client.query_url, "https://abc123.api.sanity.io/v2024-06-01/data/query/production");
        assert!(client.cache.is_none());

        settings.use_cdn = true;
        let client = ContentStoreClient::new(&settings).unwrap();
        assert_eq!(client.query_url, "https://abc123.apicdn.sanity.io/v2024-06-01/data/query/production");
        assert!(client.cache.is_some());
    }

    #[tokio::test]
    async fn test_fetch_providers_skips_invalid_documents() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", QUERY_PATH)
            .match_query(Matcher::UrlEncoded("query".into(), PROVIDERS_QUERY.into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"result":[
                    {"_id":"a","serviceName":"Alpha","slug":{"current":"alpha"},"serviceArea":"Colchester",
                     "serviceCategories":[{"categoryName":"Home Care","slug":{"current":"home-care"}}],
                     "isPublished":true,"location":{"lat":51.8959,"lng":0.9034}},
                    {"_id":"b","serviceName":"No Slug"},
                    {"_id":"c","serviceName":"Charlie","slug":{"current":"charlie"},"serviceArea":"Tendring","isPublished":true},
                    {"_id":"d","serviceName":"Delta","slug":{"current":"delta"},"isPublished":true,
                     "location":{"lat":"51.9","lng":0.9}}
                ]}"#,
            )
            .create_async()
            .await;

        let providers = client_for(&server).fetch_published_providers().await.unwrap();

        let ids: Vec<_> = providers.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c", "d"]);
        assert!(providers[0].has_category("home-care"));
        assert!(providers[1].location.is_none());
        assert!(providers[2].location.is_none());
    }

    #[tokio::test]
    async fn test_server_error_is_reported() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", QUERY_PATH)
            .match_query(Matcher::Any)
            .with_status(503)
            .create_async()
            .await;

        let err = client_for(&server).fetch_published_providers().await.unwrap_err();
        assert!(matches!(err, ContentStoreError::ApiError(_)));
    }

    #[tokio::test]
    async fn test_provider_by_slug_binds_parameter() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", QUERY_PATH)
            .match_query(Matcher::UrlEncoded("$slug".into(), r#""alpha""#.into()))
            .with_status(200)
            .with_body(r#"{"result":{"_id":"a","serviceName":"Alpha","slug":{"current":"alpha"}}}"#)
            .create_async()
            .await;

        let provider = client_for(&server).fetch_provider_by_slug("alpha").await.unwrap();
        assert_eq!(provider.map(|p| p.name), Some("Alpha".to_string()));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_missing_provider_is_none() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", QUERY_PATH)
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"result":null}"#)
            .create_async()
            .await;

        let provider = client_for(&server).fetch_provider_by_slug("nobody").await.unwrap();
        assert!(provider.is_none());
    }

    #[tokio::test]
    async fn test_cdn_mode_caches_responses() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", QUERY_PATH)
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"result":[{"categoryName":"Home Care","slug":{"current":"home-care"}},{"categoryName":"Orphan"}]}"#)
            .expect(1)
            .create_async()
            .await;

        let mut settings = ContentStoreSettings::with_base_url(server.url(), "test", "production");
        settings.use_cdn = true;
        let client = ContentStoreClient::new(&settings).unwrap();

        let first = client.fetch_categories().await.unwrap();
        let second = client.fetch_categories().await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first.len(), 1);
        mock.assert_async().await;
    }
}
