//! Admin dashboard.

use crate::config::cache_time;
use crate::models::{AdminActivity, AdminDashboard, StatsPeriod};
use crate::query::Tag;
use crate::transport::Request;

use super::QueryEndpoint;

pub const TAG: &str = "Dashboard";

const DEFAULT_ACTIVITY_LIMIT: u32 = 10;

/// `GET /admin/dashboard?period=..`, tagged `{Dashboard, MAIN}`.
#[must_use]
pub fn dashboard(period: StatsPeriod) -> QueryEndpoint<AdminDashboard> {
    QueryEndpoint::single(Request::get("/admin/dashboard").param("period", period.as_str()))
        .tags([Tag::new(TAG, "MAIN")])
        .keep_unused_for(cache_time::SHORT)
}

/// Latest marketplace activity, tagged `{Dashboard, ACTIVITIES}`.
#[must_use]
pub fn recent_activities(limit: Option<u32>) -> QueryEndpoint<Vec<AdminActivity>> {
    let request = Request::get("/admin/dashboard/activities")
        .param("limit", limit.unwrap_or(DEFAULT_ACTIVITY_LIMIT));
    QueryEndpoint::single(request)
        .tags([Tag::new(TAG, "ACTIVITIES")])
        .keep_unused_for(cache_time::SHORT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dashboard_defaults_to_month() {
        let endpoint = dashboard(StatsPeriod::default());
        assert_eq!(endpoint.request().to_string(), "GET /admin/dashboard?period=month");
        assert_eq!(endpoint.options().static_tags(), &[Tag::new(TAG, "MAIN")]);
        assert_eq!(endpoint.options().retention(), Some(cache_time::SHORT));
    }

    #[test]
    fn test_recent_activities() {
        let endpoint = recent_activities(None);
        assert_eq!(
            endpoint.request().to_string(),
            "GET /admin/dashboard/activities?limit=10"
        );
        assert_eq!(endpoint.options().static_tags(), &[Tag::new(TAG, "ACTIVITIES")]);

        assert_eq!(
            recent_activities(Some(3)).request().to_string(),
            "GET /admin/dashboard/activities?limit=3"
        );
    }
}
