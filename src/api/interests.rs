//! Buyer interest submissions and the admin workflow around them.

use crate::config::cache_time;
use crate::envelope::Paginated;
use crate::error::AppError;
use crate::models::{
    ContactedUpdate, Interest, InterestFormData, InterestStats, InterestStatus,
    InterestStatusUpdate, StatsPeriod, SubmittedInterest, WhatsAppMessage,
};
use crate::query::Tag;
use crate::transport::Request;

use super::{MutationEndpoint, QueryEndpoint, item_tags, segment, with_json};

pub const TAG: &str = "Interest";

const DEFAULT_PENDING_LIMIT: u32 = 20;
const DEFAULT_RELATED_LIMIT: u32 = 10;

fn tag(id: &str) -> Tag {
    Tag::new(TAG, id)
}

/// Filters for the admin interest listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InterestListParams {
    pub status: Option<InterestStatus>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub ordering: Option<String>,
}

/// `POST /interests/submit`. Invalidates `LIST`, `ADMIN_LIST` and `PENDING`.
///
/// # Errors
///
/// Returns `UNKNOWN_ERROR` if the form cannot be encoded.
pub fn submit(form: &InterestFormData) -> Result<MutationEndpoint<SubmittedInterest>, AppError> {
    let request = with_json(Request::post("/interests/submit"), form)?;
    Ok(MutationEndpoint::new(request, [
        Tag::list(TAG),
        tag("ADMIN_LIST"),
        tag("PENDING"),
    ]))
}

/// `GET /interests`. Provides every interest id, `LIST` and `ADMIN_LIST`.
#[must_use]
pub fn list(params: &InterestListParams) -> QueryEndpoint<Paginated<Interest>> {
    let request = Request::get("/interests")
        .param_opt("status", params.status.map(InterestStatus::as_str))
        .param_opt("page", params.page)
        .param_opt("limit", params.limit)
        .param_opt("ordering", params.ordering.as_deref());
    QueryEndpoint::page(request)
        .tags([Tag::list(TAG), tag("ADMIN_LIST")])
        .provides(|page: &Paginated<Interest>| item_tags(TAG, &page.data, |i| i.id.as_str()))
        .keep_unused_for(cache_time::SHORT)
}

/// `GET /interests/{id}`.
#[must_use]
pub fn by_id(id: &str) -> QueryEndpoint<Interest> {
    QueryEndpoint::single(Request::get(format!("/interests/{}", segment(id))))
        .tags([tag(id)])
        .keep_unused_for(cache_time::MEDIUM)
}

/// Newest pending interests, tagged `PENDING`.
#[must_use]
pub fn pending(limit: Option<u32>) -> QueryEndpoint<Paginated<Interest>> {
    let request = Request::get("/interests")
        .param("status", InterestStatus::Pending.as_str())
        .param("ordering", "-created_at")
        .param("limit", limit.unwrap_or(DEFAULT_PENDING_LIMIT));
    QueryEndpoint::page(request)
        .tags([tag("PENDING")])
        .keep_unused_for(cache_time::SHORT)
}

/// Interests in one pet, tagged `PET_<id>`.
#[must_use]
pub fn by_pet(pet_id: &str, limit: Option<u32>) -> QueryEndpoint<Paginated<Interest>> {
    let request = Request::get("/interests")
        .param("pet_id", pet_id)
        .param("ordering", "-created_at")
        .param("limit", limit.unwrap_or(DEFAULT_RELATED_LIMIT));
    QueryEndpoint::page(request)
        .tags([tag(&format!("PET_{pet_id}"))])
        .keep_unused_for(cache_time::MEDIUM)
}

/// Interests in one breeder's pets, tagged `BREEDER_<id>`.
#[must_use]
pub fn by_breeder(
    breeder_id: &str,
    status: Option<InterestStatus>,
    limit: Option<u32>,
) -> QueryEndpoint<Paginated<Interest>> {
    let request = Request::get("/interests")
        .param("breeder_id", breeder_id)
        .param_opt("status", status.map(InterestStatus::as_str))
        .param("limit", limit.unwrap_or(DEFAULT_RELATED_LIMIT));
    QueryEndpoint::page(request)
        .tags([tag(&format!("BREEDER_{breeder_id}"))])
        .keep_unused_for(cache_time::MEDIUM)
}

/// `PATCH /interests/{id}/status`. Invalidates the interest, `LIST`,
/// `PENDING` and `ADMIN_LIST`.
///
/// # Errors
///
/// Returns `UNKNOWN_ERROR` if the update cannot be encoded.
pub fn update_status(
    id: &str,
    update: &InterestStatusUpdate,
) -> Result<MutationEndpoint<Interest>, AppError> {
    let path = format!("/interests/{}/status", segment(id));
    let request = with_json(Request::patch(path), update)?;
    Ok(MutationEndpoint::new(request, [
        tag(id),
        Tag::list(TAG),
        tag("PENDING"),
        tag("ADMIN_LIST"),
    ]))
}

/// `POST /interests/{id}/contacted`. Invalidates the interest, `LIST` and `PENDING`.
///
/// # Errors
///
/// Returns `UNKNOWN_ERROR` if the update cannot be encoded.
pub fn mark_contacted(
    id: &str,
    update: &ContactedUpdate,
) -> Result<MutationEndpoint<Interest>, AppError> {
    let path = format!("/interests/{}/contacted", segment(id));
    let request = with_json(Request::post(path), update)?;
    Ok(MutationEndpoint::new(request, [
        tag(id),
        Tag::list(TAG),
        tag("PENDING"),
    ]))
}

/// `GET /interests/stats`, tagged `STATS`.
#[must_use]
pub fn stats(period: StatsPeriod) -> QueryEndpoint<InterestStats> {
    QueryEndpoint::single(Request::get("/interests/stats").param("period", period.as_str()))
        .tags([tag("STATS")])
        .keep_unused_for(cache_time::MEDIUM)
}

/// `GET /interests/{id}/whatsapp-message`. Never retained once unused.
#[must_use]
pub fn whatsapp_message(id: &str) -> QueryEndpoint<WhatsAppMessage> {
    let path = format!("/interests/{}/whatsapp-message", segment(id));
    QueryEndpoint::single(Request::get(path)).keep_unused_for(std::time::Duration::ZERO)
}
