use std::collections::BTreeMap;

use serde::Deserialize;
use tracing::debug;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{AdminError, PlatformAnalytics};

#[derive(Debug, Deserialize)]
struct RoleRow {
    role: String,
}

#[derive(Debug, Deserialize)]
struct StatusRow {
    status: String,
}

#[derive(Debug, Deserialize)]
struct AnyRow {}

pub struct AnalyticsService {
    supabase: SupabaseClient,
}

impl AnalyticsService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    pub async fn overview(&self, auth_token: &str) -> Result<PlatformAnalytics, AdminError> {
        let (users, appointments, labs, hospitals) = tokio::try_join!(
            self.supabase.select::<RoleRow>("/rest/v1/users?select=role", auth_token),
            self.supabase.select::<StatusRow>("/rest/v1/appointments?select=status", auth_token),
            self.supabase.select::<AnyRow>("/rest/v1/labs?select=id", auth_token),
            self.supabase.select::<AnyRow>("/rest/v1/hospitals?select=id", auth_token),
        )?;

        debug!(
            "Analytics over {} users, {} appointments",
            users.len(),
            appointments.len()
        );

        Ok(summarize(
            users.iter().map(|u| u.role.as_str()),
            appointments.iter().map(|a| a.status.as_str()),
            labs.len(),
            hospitals.len(),
        ))
    }
}

fn tally<'a>(values: impl Iterator<Item = &'a str>) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for value in values {
        *counts.entry(value.to_string()).or_insert(0) += 1;
    }
    counts
}

pub fn summarize<'a>(
    roles: impl Iterator<Item = &'a str>,
    statuses: impl Iterator<Item = &'a str>,
    total_labs: usize,
    total_hospitals: usize,
) -> PlatformAnalytics {
    let users_by_role = tally(roles);
    let appointments_by_status = tally(statuses);

    PlatformAnalytics {
        total_users: users_by_role.values().sum(),
        total_appointments: appointments_by_status.values().sum(),
        pending_appointments: appointments_by_status.get("Pending").copied().unwrap_or(0),
        users_by_role,
        appointments_by_status,
        total_labs,
        total_hospitals,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summarize() {
        let roles = ["Patient", "Patient", "Doctor", "Admin"];
        let statuses = ["Pending", "Confirmed", "Pending", "Cancelled"];

        let analytics = summarize(roles.into_iter(), statuses.into_iter(), 3, 2);

        assert_eq!(analytics.total_users, 4);
        assert_eq!(analytics.users_by_role["Patient"], 2);
        assert_eq!(analytics.total_appointments, 4);
        assert_eq!(analytics.pending_appointments, 2);
        assert_eq!(analytics.total_labs, 3);
        assert_eq!(analytics.total_hospitals, 2);
    }

    #[test]
    fn test_empty_platform() {
        let analytics = summarize(std::iter::empty(), std::iter::empty(), 0, 0);
        assert_eq!(analytics, PlatformAnalytics::default());
    }
}
