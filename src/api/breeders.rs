//! Breeder profiles.

use crate::config::cache_time;
use crate::envelope::Paginated;
use crate::models::{Breeder, BreederFilters, BreederStats, BreederVerification, Pet};
use crate::query::Tag;
use crate::transport::Request;

use super::{QueryEndpoint, item_tags, pets, segment};

pub const TAG: &str = "Breeder";

/// `GET /breeders`. Provides every breeder id and `{Breeder, LIST}`.
#[must_use]
pub fn list(
    filters: &BreederFilters,
    page: Option<u32>,
    limit: Option<u32>,
) -> QueryEndpoint<Paginated<Breeder>> {
    let request = Request::get("/breeders")
        .param_opt("page", page)
        .param_opt("limit", limit)
        .params(filters.to_params());
    QueryEndpoint::page(request)
        .tags([Tag::list(TAG)])
        .provides(|page: &Paginated<Breeder>| item_tags(TAG, &page.data, |b| b.id.as_str()))
        .keep_unused_for(cache_time::MEDIUM)
}

/// `GET /breeders/{id}`.
#[must_use]
pub fn by_id(id: &str) -> QueryEndpoint<Breeder> {
    QueryEndpoint::single(Request::get(format!("/breeders/{}", segment(id))))
        .tags([Tag::new(TAG, id)])
        .keep_unused_for(cache_time::LONG)
}

/// `GET /breeders/{id}/verification`, tagged `VERIFICATION_<id>`.
#[must_use]
pub fn verification(id: &str) -> QueryEndpoint<BreederVerification> {
    let path = format!("/breeders/{}/verification", segment(id));
    QueryEndpoint::single(Request::get(path))
        .tags([Tag::new(TAG, format!("VERIFICATION_{id}"))])
        .keep_unused_for(cache_time::LONG)
}

/// `GET /breeders/{id}/pets`. Provides every pet id and `{Breeder, PETS_<id>}`.
#[must_use]
pub fn pets_of(id: &str, page: Option<u32>, limit: Option<u32>) -> QueryEndpoint<Paginated<Pet>> {
    let request = Request::get(format!("/breeders/{}/pets", segment(id)))
        .param_opt("page", page)
        .param_opt("limit", limit);
    QueryEndpoint::page(request)
        .tags([Tag::new(TAG, format!("PETS_{id}"))])
        .provides(|page: &Paginated<Pet>| item_tags(pets::TAG, &page.data, |p| p.id.as_str()))
        .keep_unused_for(cache_time::MEDIUM)
}

/// `GET /breeders?search=..`, tagged `SEARCH`.
#[must_use]
pub fn search(query: &str, filters: &BreederFilters) -> QueryEndpoint<Paginated<Breeder>> {
    let mut filters = filters.clone();
    filters.search = Some(query.to_string());
    QueryEndpoint::page(Request::get("/breeders").params(filters.to_params()))
        .tags([Tag::new(TAG, "SEARCH")])
        .keep_unused_for(cache_time::SHORT)
}

/// `GET /breeders/{id}/stats`, tagged `STATS_<id>`.
#[must_use]
pub fn stats(id: &str) -> QueryEndpoint<BreederStats> {
    QueryEndpoint::single(Request::get(format!("/breeders/{}/stats", segment(id))))
        .tags([Tag::new(TAG, format!("STATS_{id}"))])
        .keep_unused_for(cache_time::MEDIUM)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::VerificationStatus;

    #[test]
    fn test_list_request() {
        let filters = BreederFilters {
            verification_status: Some(VerificationStatus::Verified),
            ..BreederFilters::default()
        };
        assert_eq!(
            list(&filters, Some(1), Some(12)).request().to_string(),
            "GET /breeders?limit=12&page=1&verification_status=verified"
        );
    }

    #[test]
    fn test_search_and_list_have_distinct_keys() {
        let filters = BreederFilters::default();
        assert_ne!(list(&filters, None, None).key(), search("", &filters).key());
    }
}
