//! Resources served by the marketplace API.
//!
//! Structs are lenient on input: missing fields fall back to their defaults
//! so older or partial server payloads still decode.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    #[default]
    Male,
    Female,
}

impl Gender {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgeUnit {
    Months,
    #[default]
    Years,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgeRange {
    Puppy,
    Adult,
    Senior,
}

impl AgeRange {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Puppy => "puppy",
            Self::Adult => "adult",
            Self::Senior => "senior",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Currency {
    #[default]
    #[serde(rename = "KES")]
    Kes,
    #[serde(rename = "USD")]
    Usd,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PetImage {
    pub id: String,
    pub url: String,
    pub alt_text: String,
    pub is_primary: bool,
    pub order: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthRecordType {
    #[default]
    Checkup,
    Vaccination,
    Treatment,
    Certificate,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthRecord {
    pub id: String,
    pub pet_id: String,
    pub record_type: HealthRecordType,
    pub title: String,
    pub description: String,
    pub date: String,
    pub veterinarian: String,
    pub clinic: String,
    pub document_url: Option<String>,
    pub is_public: bool,
    pub created_at: String,
}

impl HealthRecordType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Checkup => "checkup",
            Self::Vaccination => "vaccination",
            Self::Treatment => "treatment",
            Self::Certificate => "certificate",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VaccinationRecord {
    pub id: String,
    pub pet_id: String,
    pub vaccine_name: String,
    pub vaccine_type: String,
    pub administered_date: String,
    pub next_due_date: Option<String>,
    pub veterinarian: String,
    pub clinic: String,
    pub batch_number: Option<String>,
    pub certificate_url: Option<String>,
    pub is_current: bool,
    pub created_at: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CertificateStatus {
    Valid,
    Expired,
    #[default]
    Pending,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthCertificate {
    pub pet_id: String,
    pub certificate_url: String,
    pub issued_date: String,
    pub valid_until: String,
    pub veterinarian: String,
    pub clinic: String,
    pub status: CertificateStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Excellent,
    #[default]
    Good,
    Fair,
    Poor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VaccinationStatus {
    UpToDate,
    Overdue,
}

/// Buyer-facing health overview of one pet.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthSummary {
    pub total_records: u32,
    pub vaccinations_up_to_date: bool,
    pub last_checkup: String,
    pub next_vaccination_due: Option<String>,
    pub health_status: HealthStatus,
    pub recent_issues: Vec<String>,
}

impl HealthSummary {
    #[must_use]
    pub const fn vaccination_status(&self) -> VaccinationStatus {
        if self.vaccinations_up_to_date {
            VaccinationStatus::UpToDate
        } else {
            VaccinationStatus::Overdue
        }
    }

    /// Pets in excellent or good health come with a health guarantee.
    #[must_use]
    pub const fn has_health_guarantee(&self) -> bool {
        matches!(self.health_status, HealthStatus::Excellent | HealthStatus::Good)
    }
}

/// A pet listing.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Pet {
    pub id: String,
    pub name: String,
    pub breed: String,
    pub age: u32,
    pub age_unit: AgeUnit,
    pub gender: Gender,
    pub price: f64,
    pub currency: Currency,
    pub description: String,
    pub images: Vec<PetImage>,
    pub breeder_id: String,
    pub breeder: Option<Breeder>,
    pub category: String,
    pub location: String,
    pub is_available: bool,
    pub is_featured: bool,
    pub health_records: Vec<HealthRecord>,
    pub vaccinations: Vec<VaccinationRecord>,
    pub created_at: String,
    pub updated_at: String,
    pub display_age: String,
    pub formatted_price: String,
    pub primary_image: String,
}

/// Server-side filters for pet listings. Every field is optional.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PetFilters {
    pub search: Option<String>,
    pub breed: Option<String>,
    pub location: Option<String>,
    pub min_price: Option<u64>,
    pub max_price: Option<u64>,
    pub age_range: Option<AgeRange>,
    pub gender: Option<Gender>,
    pub breeder_id: Option<String>,
    pub is_available: Option<bool>,
    pub is_featured: Option<bool>,
}

impl PetFilters {
    /// Query parameters in a fixed order, skipping unset fields.
    #[must_use]
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        let mut push = |key: &'static str, value: Option<String>| {
            if let Some(value) = value {
                params.push((key, value));
            }
        };
        push("search", self.search.clone());
        push("breed", self.breed.clone());
        push("location", self.location.clone());
        push("min_price", self.min_price.map(|v| v.to_string()));
        push("max_price", self.max_price.map(|v| v.to_string()));
        push("age_range", self.age_range.map(|v| v.as_str().to_string()));
        push("gender", self.gender.map(|v| v.as_str().to_string()));
        push("breeder_id", self.breeder_id.clone());
        push("is_available", self.is_available.map(|v| v.to_string()));
        push("is_featured", self.is_featured.map(|v| v.to_string()));
        params
    }
}

/// Parameters of the paginated pet listing.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PetSearchParams {
    #[serde(flatten)]
    pub filters: PetFilters,
    pub page: Option<u32>,
    pub limit: Option<u32>,
    /// Server ordering token, e.g. `-created_at` or `price`.
    pub ordering: Option<String>,
}

impl PetSearchParams {
    #[must_use]
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(page) = self.page {
            params.push(("page", page.to_string()));
        }
        if let Some(limit) = self.limit {
            params.push(("limit", limit.to_string()));
        }
        if let Some(ordering) = &self.ordering {
            params.push(("ordering", ordering.clone()));
        }
        params.extend(self.filters.to_params());
        params
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationStatus {
    #[default]
    Pending,
    Verified,
    Rejected,
    Suspended,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BreederBadge {
    pub id: String,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub color: String,
    pub awarded_at: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Breeder {
    pub id: String,
    pub name: String,
    pub business_name: Option<String>,
    pub email: String,
    pub phone: String,
    pub location: String,
    pub description: String,
    pub profile_image: Option<String>,
    pub years_experience: u32,
    pub specializes_in: Vec<String>,
    pub verification_status: VerificationStatus,
    pub verification_badges: Vec<BreederBadge>,
    pub rating: f64,
    pub total_reviews: u32,
    pub total_pets_sold: u32,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
    pub website: Option<String>,
    pub facebook: Option<String>,
    pub instagram: Option<String>,
    pub whatsapp: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BreederFilters {
    pub search: Option<String>,
    pub location: Option<String>,
    pub specializes_in: Option<String>,
    pub verification_status: Option<VerificationStatus>,
    pub min_rating: Option<f64>,
}

impl BreederFilters {
    #[must_use]
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(search) = &self.search {
            params.push(("search", search.clone()));
        }
        if let Some(location) = &self.location {
            params.push(("location", location.clone()));
        }
        if let Some(specializes_in) = &self.specializes_in {
            params.push(("specializes_in", specializes_in.clone()));
        }
        if let Some(status) = self.verification_status {
            let token = match status {
                VerificationStatus::Pending => "pending",
                VerificationStatus::Verified => "verified",
                VerificationStatus::Rejected => "rejected",
                VerificationStatus::Suspended => "suspended",
            };
            params.push(("verification_status", token.to_string()));
        }
        if let Some(min_rating) = self.min_rating {
            params.push(("min_rating", min_rating.to_string()));
        }
        params
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VerificationDocument {
    pub name: String,
    pub url: String,
    pub verified: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BreederVerification {
    pub status: String,
    pub badges: Vec<BreederBadge>,
    pub verification_date: Option<String>,
    pub documents: Vec<VerificationDocument>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BreederStats {
    pub total_pets: u64,
    pub available_pets: u64,
    pub sold_pets: u64,
    pub avg_rating: f64,
    pub total_reviews: u64,
    pub response_time: f64,
    pub success_rate: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterestStatus {
    #[default]
    Pending,
    Contacted,
    Negotiating,
    Accepted,
    Rejected,
    Completed,
}

impl InterestStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Contacted => "contacted",
            Self::Negotiating => "negotiating",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
            Self::Completed => "completed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContactMethod {
    #[default]
    Whatsapp,
    Email,
    Phone,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExperienceLevel {
    #[default]
    FirstTime,
    Experienced,
    Professional,
}

/// A buyer's expression of interest in a pet.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Interest {
    pub id: String,
    pub pet_id: String,
    pub pet: Option<Pet>,
    pub buyer_name: String,
    pub buyer_email: String,
    pub buyer_phone: String,
    pub buyer_location: String,
    pub message: String,
    pub status: InterestStatus,
    pub preferred_contact_method: ContactMethod,
    pub budget_range: Option<String>,
    pub timeline: Option<String>,
    pub experience_level: ExperienceLevel,
    pub created_at: String,
    pub updated_at: String,
    pub admin_notes: Option<String>,
    pub contacted_at: Option<String>,
    /// Hours until first contact.
    pub response_time: Option<f64>,
}

/// Body of the interest submission form.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InterestFormData {
    pub pet_id: String,
    pub buyer_name: String,
    pub buyer_email: String,
    pub buyer_phone: String,
    pub buyer_location: String,
    pub message: String,
    pub preferred_contact_method: ContactMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget_range: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeline: Option<String>,
    pub experience_level: ExperienceLevel,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SubmittedInterest {
    pub id: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterestStatusUpdate {
    pub status: InterestStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactedUpdate {
    pub contact_method: ContactMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PopularPet {
    pub pet_name: String,
    pub interest_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DailyCount {
    pub date: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InterestStats {
    pub total_interests: u64,
    pub pending_interests: u64,
    pub contacted_interests: u64,
    pub conversion_rate: f64,
    pub avg_response_time: f64,
    pub popular_pets: Vec<PopularPet>,
    pub daily_interests: Vec<DailyCount>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatsPeriod {
    Week,
    #[default]
    Month,
    Year,
}

impl StatsPeriod {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Week => "week",
            Self::Month => "month",
            Self::Year => "year",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WhatsAppMessage {
    pub message: String,
    pub phone: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub description: String,
    pub image_url: Option<String>,
    pub pet_count: u64,
    pub is_active: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BreedSize {
    Small,
    #[default]
    Medium,
    Large,
    Giant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LifeSpan {
    pub min: u32,
    pub max: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BreedCharacteristics {
    pub size: BreedSize,
    /// 1 to 5.
    pub energy_level: u8,
    pub grooming_needs: u8,
    pub training_difficulty: u8,
    pub good_with_children: bool,
    pub good_with_pets: bool,
    pub apartment_friendly: bool,
    pub life_span: LifeSpan,
}

impl BreedSize {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Large => "large",
            Self::Giant => "giant",
        }
    }
}

/// Breed lookup by temperament and size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BreedCharacteristicsFilter {
    pub size: Option<BreedSize>,
    pub energy_level: Option<u8>,
    pub good_with_children: Option<bool>,
    pub apartment_friendly: Option<bool>,
}

impl BreedCharacteristicsFilter {
    #[must_use]
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(size) = self.size {
            params.push(("size", size.as_str().to_string()));
        }
        if let Some(level) = self.energy_level {
            params.push(("energy_level", level.to_string()));
        }
        if let Some(flag) = self.good_with_children {
            params.push(("good_with_children", flag.to_string()));
        }
        if let Some(flag) = self.apartment_friendly {
            params.push(("apartment_friendly", flag.to_string()));
        }
        params
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PriceRange {
    pub min: f64,
    pub max: f64,
    pub currency: Currency,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Breed {
    pub id: String,
    pub name: String,
    pub category: String,
    pub description: String,
    pub characteristics: BreedCharacteristics,
    pub average_price_range: PriceRange,
    pub popularity_rank: u32,
    pub image_url: Option<String>,
    pub is_active: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    #[default]
    InterestSubmitted,
    PetAdded,
    BreederVerified,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminActivity {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ActivityType,
    pub description: String,
    pub timestamp: String,
    pub related_id: Option<String>,
    pub amount: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BreedCount {
    pub breed: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminDashboard {
    pub total_pets: u64,
    pub active_pets: u64,
    pub total_breeders: u64,
    pub verified_breeders: u64,
    pub pending_interests: u64,
    pub monthly_revenue: f64,
    pub recent_activities: Vec<AdminActivity>,
    pub top_breeders: Vec<Breeder>,
    pub popular_breeds: Vec<BreedCount>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_pet_decodes_partial_payload() {
        let pet: Pet = serde_json::from_value(json!({
            "id": "42",
            "name": "Rex",
            "gender": "female",
            "currency": "USD",
            "price": 1200.0,
        }))
        .expect("partial pet should decode");

        assert_eq!(pet.id, "42");
        assert_eq!(pet.gender, Gender::Female);
        assert_eq!(pet.currency, Currency::Usd);
        assert!(pet.images.is_empty());
        assert!(pet.breeder.is_none());
    }

    #[test]
    fn test_interest_form_serializes_snake_case() {
        let form = InterestFormData {
            pet_id: "42".to_string(),
            buyer_name: "Ann".to_string(),
            experience_level: ExperienceLevel::FirstTime,
            preferred_contact_method: ContactMethod::Email,
            ..InterestFormData::default()
        };
        let value = serde_json::to_value(&form).expect("form should serialize");
        assert_eq!(value["experience_level"], "first_time");
        assert_eq!(value["preferred_contact_method"], "email");
        assert!(value.get("budget_range").is_none());
    }

    #[test]
    fn test_pet_search_params_order() {
        let params = PetSearchParams {
            filters: PetFilters {
                breed: Some("Poodle".to_string()),
                is_available: Some(true),
                ..PetFilters::default()
            },
            page: Some(2),
            limit: None,
            ordering: Some("-price".to_string()),
        };
        assert_eq!(
            params.to_params(),
            vec![
                ("page", "2".to_string()),
                ("ordering", "-price".to_string()),
                ("breed", "Poodle".to_string()),
                ("is_available", "true".to_string()),
            ]
        );
    }

    #[test]
    fn test_health_summary_derived_fields() {
        let summary: HealthSummary = serde_json::from_value(json!({
            "total_records": 3,
            "vaccinations_up_to_date": false,
            "last_checkup": "2024-05-01",
            "health_status": "fair",
            "recent_issues": ["ear infection"],
        }))
        .expect("summary should decode");

        assert_eq!(summary.vaccination_status(), VaccinationStatus::Overdue);
        assert!(!summary.has_health_guarantee());
        assert_eq!(summary.next_vaccination_due, None);
    }

    #[test]
    fn test_admin_activity_type_field() {
        let activity: AdminActivity = serde_json::from_value(json!({
            "id": "9",
            "type": "breeder_verified",
            "description": "Sunny Kennels verified",
        }))
        .expect("activity should decode");
        assert_eq!(activity.kind, ActivityType::BreederVerified);
        assert_eq!(activity.amount, None);
    }
}
