//! Pet listings.

use crate::envelope::Paginated;
use crate::list_state::{FilterSchema, PetSort, ViewState};
use crate::models::{Pet, PetFilters, PetSearchParams};
use crate::query::Tag;
use crate::transport::Request;

use super::{QueryEndpoint, item_tags, segment};

pub const TAG: &str = "Pet";

const DEFAULT_FEATURED_LIMIT: u32 = 6;
const DEFAULT_SIMILAR_LIMIT: u32 = 4;

fn pet_tags(pets: &[Pet]) -> Vec<Tag> {
    item_tags(TAG, pets, |pet| pet.id.as_str())
}

/// `GET /pets`: paginated listing. Provides every pet id and `{Pet, LIST}`.
#[must_use]
pub fn list(params: &PetSearchParams) -> QueryEndpoint<Paginated<Pet>> {
    QueryEndpoint::page(Request::get("/pets").params(params.to_params()))
        .tags([Tag::list(TAG)])
        .provides(|page: &Paginated<Pet>| pet_tags(&page.data))
}

/// `GET /pets` for a URL-backed listing view. Tagged like [`list`].
#[must_use]
pub fn list_view(view: &ViewState<PetSort>, schema: &FilterSchema) -> QueryEndpoint<Paginated<Pet>> {
    QueryEndpoint::page(Request::get("/pets").params(view.to_query_params(schema)))
        .tags([Tag::list(TAG)])
        .provides(|page: &Paginated<Pet>| pet_tags(&page.data))
}

/// `GET /pets/{id}`.
#[must_use]
pub fn by_id(id: &str) -> QueryEndpoint<Pet> {
    QueryEndpoint::single(Request::get(format!("/pets/{}", segment(id)))).tags([Tag::new(TAG, id)])
}

/// `GET /pets/featured`. Provides every pet id and `{Pet, FEATURED}`.
#[must_use]
pub fn featured(limit: Option<u32>) -> QueryEndpoint<Vec<Pet>> {
    QueryEndpoint::single(
        Request::get("/pets/featured").param("limit", limit.unwrap_or(DEFAULT_FEATURED_LIMIT)),
    )
    .tags([Tag::new(TAG, "FEATURED")])
    .provides(|pets: &Vec<Pet>| pet_tags(pets))
}

/// `GET /pets/search`. Provides every pet id and `{Pet, SEARCH}`.
#[must_use]
pub fn search(query: &str, filters: &PetFilters) -> QueryEndpoint<Paginated<Pet>> {
    let mut filters = filters.clone();
    filters.search = Some(query.to_string());
    QueryEndpoint::page(Request::get("/pets/search").params(filters.to_params()))
        .tags([Tag::new(TAG, "SEARCH")])
        .provides(|page: &Paginated<Pet>| pet_tags(&page.data))
}

/// `GET /pets/{id}/similar`. Provides every pet id and `{Pet, SIMILAR_<id>}`.
#[must_use]
pub fn similar(pet_id: &str, limit: Option<u32>) -> QueryEndpoint<Vec<Pet>> {
    QueryEndpoint::single(
        Request::get(format!("/pets/{}/similar", segment(pet_id)))
            .param("limit", limit.unwrap_or(DEFAULT_SIMILAR_LIMIT)),
    )
    .tags([Tag::new(TAG, format!("SIMILAR_{pet_id}"))])
    .provides(|pets: &Vec<Pet>| pet_tags(pets))
}
