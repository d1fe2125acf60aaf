//! Categories and breeds. Reference data, retained for an hour once unused.

use crate::config::cache_time;
use crate::models::{Breed, BreedCharacteristicsFilter, Category};
use crate::query::Tag;
use crate::transport::Request;

use super::{QueryEndpoint, segment};

pub const CATEGORY_TAG: &str = "Category";
pub const BREED_TAG: &str = "Breed";

const DEFAULT_POPULAR_LIMIT: u32 = 10;

/// `GET /categories`, tagged `{Category, LIST}`.
#[must_use]
pub fn categories() -> QueryEndpoint<Vec<Category>> {
    QueryEndpoint::single(Request::get("/categories"))
        .tags([Tag::list(CATEGORY_TAG)])
        .keep_unused_for(cache_time::LONG)
}

/// Active categories only, tagged `{Category, ACTIVE}`.
#[must_use]
pub fn active_categories() -> QueryEndpoint<Vec<Category>> {
    QueryEndpoint::single(Request::get("/categories").param("is_active", true))
        .tags([Tag::new(CATEGORY_TAG, "ACTIVE")])
        .keep_unused_for(cache_time::LONG)
}

/// `GET /breeds`, optionally within a category. Tagged `CATEGORY_<name>` or `LIST`.
#[must_use]
pub fn breeds(category: Option<&str>) -> QueryEndpoint<Vec<Breed>> {
    let tag = category.map_or_else(
        || Tag::list(BREED_TAG),
        |c| Tag::new(BREED_TAG, format!("CATEGORY_{c}")),
    );
    QueryEndpoint::single(Request::get("/breeds").param_opt("category", category))
        .tags([tag])
        .keep_unused_for(cache_time::LONG)
}

/// `GET /breeds/{id}`.
#[must_use]
pub fn breed_by_id(id: &str) -> QueryEndpoint<Breed> {
    QueryEndpoint::single(Request::get(format!("/breeds/{}", segment(id))))
        .tags([Tag::new(BREED_TAG, id)])
        .keep_unused_for(cache_time::LONG)
}

/// Breeds by popularity rank, tagged `POPULAR`.
#[must_use]
pub fn popular_breeds(limit: Option<u32>) -> QueryEndpoint<Vec<Breed>> {
    let request = Request::get("/breeds")
        .param("ordering", "popularity_rank")
        .param("limit", limit.unwrap_or(DEFAULT_POPULAR_LIMIT));
    QueryEndpoint::single(request)
        .tags([Tag::new(BREED_TAG, "POPULAR")])
        .keep_unused_for(cache_time::MEDIUM)
}

/// Breed name search, tagged `SEARCH`.
#[must_use]
pub fn search_breeds(query: &str) -> QueryEndpoint<Vec<Breed>> {
    QueryEndpoint::single(Request::get("/breeds").param("search", query))
        .tags([Tag::new(BREED_TAG, "SEARCH")])
        .keep_unused_for(cache_time::SHORT)
}

/// Breeds matching size and temperament filters, tagged `FILTERED`.
#[must_use]
pub fn breeds_by_characteristics(filter: &BreedCharacteristicsFilter) -> QueryEndpoint<Vec<Breed>> {
    QueryEndpoint::single(Request::get("/breeds").params(filter.to_params()))
        .tags([Tag::new(BREED_TAG, "FILTERED")])
        .keep_unused_for(cache_time::MEDIUM)
}
