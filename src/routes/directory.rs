use actix_web::{web, HttpResponse, Responder};
use std::sync::Arc;
use validator::Validate;

use crate::core::{distinct_category_names, restrict_to_ids, CategoryFilter, DirectorySearch, MapView};
use crate::models::requests::search_postcode;
use crate::models::{
    Coordinate, DirectoryCopy, DirectoryQuery, DirectoryResponse, ErrorResponse, HealthResponse, MapQuery,
    MapResponse, ProviderRecord,
};
use crate::services::{ContentStoreClient, PostcodeGeocoder};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub content_store: Arc<ContentStoreClient>,
    pub geocoder: Arc<PostcodeGeocoder>,
    pub search: DirectorySearch,
    pub default_copy: DirectoryCopy,
}

/// Configure all directory routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/categories", web::get().to(list_categories))
        .route("/directory", web::get().to(list_directory))
        .route("/directory/map", web::get().to(directory_map))
        .route("/directory/{slug}", web::get().to(get_entry));
}

/// Health check endpoint
async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Directory listing endpoint
///
/// GET /api/v1/directory?postcode={postcode}&category={slug|all}
///
/// A store outage yields an empty listing with the default headings rather
/// than an error, and a postcode that cannot be geocoded leaves the listing
/// in store order.
async fn list_directory(
    state: web::Data<AppState>,
    query: web::Query<DirectoryQuery>,
) -> impl Responder {
    if let Err(errors) = query.validate() {
        return validation_failed(errors);
    }

    let filter = CategoryFilter::from_query(query.category.as_deref());
    let postcode = search_postcode(&query.postcode);

    tracing::info!("Directory search: category={:?}, postcode={:?}", filter, postcode);

    let (providers, copy) = tokio::join!(
        state.content_store.fetch_published_providers(),
        state.content_store.fetch_directory_copy(&state.default_copy),
    );

    let providers = match providers {
        Ok(providers) => providers,
        Err(e) => {
            tracing::warn!("Failed to load directory entries, serving empty listing: {}", e);
            return HttpResponse::Ok().json(DirectoryResponse {
                title: state.default_copy.title.clone(),
                subtitle: state.default_copy.subtitle.clone(),
                entries: vec![],
                categories: vec![],
                origin: None,
                total_results: 0,
            });
        }
    };

    let copy = copy.unwrap_or_else(|e| {
        tracing::warn!("Failed to load directory headings, using defaults: {}", e);
        state.default_copy.clone()
    });

    let categories = distinct_category_names(&providers);
    let origin = resolve_origin(&state.geocoder, postcode, &providers, &filter).await;
    let result = state.search.run(providers, &filter, origin);

    tracing::info!(
        "Returning {} entries (from {} fetched, ranked by distance: {})",
        result.entries.len(),
        result.total_fetched,
        result.ranked_by_distance
    );

    HttpResponse::Ok().json(DirectoryResponse {
        title: copy.title,
        subtitle: copy.subtitle,
        total_results: result.entries.len(),
        entries: result.entries,
        categories,
        origin,
    })
}

/// Map view endpoint
///
/// GET /api/v1/directory/map?postcode={postcode}&category={slug|all}&selected={id}
///
/// Markers come from the located subset of the store. When the list search
/// matches anything, markers are limited to the listed providers.
async fn directory_map(
    state: web::Data<AppState>,
    query: web::Query<MapQuery>,
) -> impl Responder {
    if let Err(errors) = query.validate() {
        return validation_failed(errors);
    }

    let filter = CategoryFilter::from_query(query.category.as_deref());
    let postcode = search_postcode(&query.postcode);

    let (map_data, providers) = tokio::join!(
        state.content_store.fetch_map_providers(),
        state.content_store.fetch_published_providers(),
    );

    let map_data = match map_data {
        Ok(records) => records,
        Err(e) => {
            tracing::error!("Error fetching map data: {}", e);
            return HttpResponse::InternalServerError().json(ErrorResponse {
                error: "Failed to fetch map data".to_string(),
                message: e.to_string(),
                status_code: 500,
            });
        }
    };

    let providers = providers.unwrap_or_else(|e| {
        tracing::warn!("Failed to load directory entries for map filtering: {}", e);
        vec![]
    });

    // Without the listing, the located dataset decides whether to geocode
    let candidates = if providers.is_empty() { &map_data } else { &providers };
    let origin = resolve_origin(&state.geocoder, postcode, candidates, &filter).await;
    let listed = state.search.run(providers, &filter, origin);

    let map_records = restrict_to_ids(map_data, &listed.entries);
    let plotted = state.search.run(map_records, &CategoryFilter::All, origin);

    let view = MapView::build(plotted.entries, query.selected.as_deref());

    tracing::debug!("Returning {} map markers", view.markers.len());

    HttpResponse::Ok().json(MapResponse { view, origin })
}

/// Single entry endpoint
///
/// GET /api/v1/directory/{slug}
async fn get_entry(
    state: web::Data<AppState>,
    slug: web::Path<String>,
) -> impl Responder {
    match state.content_store.fetch_provider_by_slug(&slug).await {
        Ok(Some(entry)) => HttpResponse::Ok().json(entry),
        Ok(None) => HttpResponse::NotFound().json(ErrorResponse {
            error: "Entry not found".to_string(),
            message: format!("No published entry with slug {}", slug),
            status_code: 404,
        }),
        Err(e) => {
            tracing::error!("Failed to fetch entry {}: {}", slug, e);
            HttpResponse::InternalServerError().json(ErrorResponse {
                error: "Failed to fetch entry".to_string(),
                message: e.to_string(),
                status_code: 500,
            })
        }
    }
}

/// Category list endpoint
///
/// GET /api/v1/categories
async fn list_categories(state: web::Data<AppState>) -> impl Responder {
    match state.content_store.fetch_categories().await {
        Ok(categories) => {
            tracing::debug!("Fetched {} categories", categories.len());
            HttpResponse::Ok()
                .insert_header(("Cache-Control", "no-store, no-cache, must-revalidate, proxy-revalidate"))
                .insert_header(("Pragma", "no-cache"))
                .insert_header(("Expires", "0"))
                .json(categories)
        }
        Err(e) => {
            tracing::error!("Failed to fetch categories: {}", e);
            HttpResponse::InternalServerError().json(ErrorResponse {
                error: "Failed to fetch categories".to_string(),
                message: e.to_string(),
                status_code: 500,
            })
        }
    }
}

/// Geocode the search postcode, but only when something is left to rank
async fn resolve_origin(
    geocoder: &PostcodeGeocoder,
    postcode: Option<&str>,
    providers: &[ProviderRecord],
    filter: &CategoryFilter,
) -> Option<Coordinate> {
    let postcode = postcode?;
    if !providers.iter().any(|p| filter.matches(p)) {
        return None;
    }
    geocoder.lookup(postcode).await
}

fn validation_failed(errors: validator::ValidationErrors) -> HttpResponse {
    tracing::info!("Validation failed for directory request: {:?}", errors);
    HttpResponse::BadRequest().json(ErrorResponse {
        error: "Validation failed".to_string(),
        message: errors.to_string(),
        status_code: 400,
    })
}
