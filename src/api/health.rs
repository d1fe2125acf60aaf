//! Health and vaccination records of a pet.

use crate::config::cache_time;
use crate::envelope::Paginated;
use crate::models::{
    HealthCertificate, HealthRecord, HealthRecordType, HealthSummary, VaccinationRecord,
};
use crate::query::Tag;
use crate::transport::Request;

use super::{QueryEndpoint, segment};

pub const HEALTH_TAG: &str = "HealthRecord";
pub const VACCINATION_TAG: &str = "VaccinationRecord";

const DEFAULT_DAYS_AHEAD: u32 = 30;

/// `GET /health-records?pet_id=..`, tagged `{HealthRecord, PET_<id>}`.
#[must_use]
pub fn records(
    pet_id: &str,
    record_type: Option<HealthRecordType>,
    is_public: Option<bool>,
) -> QueryEndpoint<Paginated<HealthRecord>> {
    let request = Request::get("/health-records")
        .param("pet_id", pet_id)
        .param_opt("record_type", record_type.map(HealthRecordType::as_str))
        .param_opt("is_public", is_public);
    QueryEndpoint::page(request)
        .tags([Tag::new(HEALTH_TAG, format!("PET_{pet_id}"))])
        .keep_unused_for(cache_time::MEDIUM)
}

/// `GET /health-records/{id}`.
#[must_use]
pub fn record_by_id(id: &str) -> QueryEndpoint<HealthRecord> {
    QueryEndpoint::single(Request::get(format!("/health-records/{}", segment(id))))
        .tags([Tag::new(HEALTH_TAG, id)])
        .keep_unused_for(cache_time::LONG)
}

/// `GET /vaccinations?pet_id=..`, tagged `{VaccinationRecord, PET_<id>}`.
#[must_use]
pub fn vaccinations(
    pet_id: &str,
    is_current: Option<bool>,
) -> QueryEndpoint<Paginated<VaccinationRecord>> {
    let request = Request::get("/vaccinations")
        .param("pet_id", pet_id)
        .param_opt("is_current", is_current);
    QueryEndpoint::page(request)
        .tags([Tag::new(VACCINATION_TAG, format!("PET_{pet_id}"))])
        .keep_unused_for(cache_time::MEDIUM)
}

/// `GET /vaccinations/{id}`.
#[must_use]
pub fn vaccination_by_id(id: &str) -> QueryEndpoint<VaccinationRecord> {
    QueryEndpoint::single(Request::get(format!("/vaccinations/{}", segment(id))))
        .tags([Tag::new(VACCINATION_TAG, id)])
        .keep_unused_for(cache_time::LONG)
}

/// Vaccinations still in effect, tagged `CURRENT_<id>`.
#[must_use]
pub fn current_vaccinations(pet_id: &str) -> QueryEndpoint<Vec<VaccinationRecord>> {
    let request = Request::get("/vaccinations")
        .param("pet_id", pet_id)
        .param("is_current", true);
    QueryEndpoint::single(request)
        .tags([Tag::new(VACCINATION_TAG, format!("CURRENT_{pet_id}"))])
        .keep_unused_for(cache_time::MEDIUM)
}

/// Vaccinations due within `days_ahead` days (30 by default), tagged `UPCOMING`.
#[must_use]
pub fn upcoming_vaccinations(
    pet_id: Option<&str>,
    days_ahead: Option<u32>,
) -> QueryEndpoint<Vec<VaccinationRecord>> {
    let request = Request::get("/vaccinations/upcoming")
        .param_opt("pet_id", pet_id)
        .param("days_ahead", days_ahead.unwrap_or(DEFAULT_DAYS_AHEAD));
    QueryEndpoint::single(request)
        .tags([Tag::new(VACCINATION_TAG, "UPCOMING")])
        .keep_unused_for(cache_time::SHORT)
}

/// `GET /health-records/certificate/{pet_id}`, tagged `CERTIFICATE_<id>`.
#[must_use]
pub fn certificate(pet_id: &str) -> QueryEndpoint<HealthCertificate> {
    let path = format!("/health-records/certificate/{}", segment(pet_id));
    QueryEndpoint::single(Request::get(path))
        .tags([Tag::new(HEALTH_TAG, format!("CERTIFICATE_{pet_id}"))])
        .keep_unused_for(cache_time::MEDIUM)
}

/// `GET /health-records/summary/{pet_id}`, tagged `SUMMARY_<id>`.
#[must_use]
pub fn summary(pet_id: &str) -> QueryEndpoint<HealthSummary> {
    let path = format!("/health-records/summary/{}", segment(pet_id));
    QueryEndpoint::single(Request::get(path))
        .tags([Tag::new(HEALTH_TAG, format!("SUMMARY_{pet_id}"))])
        .keep_unused_for(cache_time::MEDIUM)
}
