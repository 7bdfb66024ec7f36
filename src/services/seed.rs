// Bundled seed data for the in-memory stores

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::errors::ServiceError;
use super::inspectors::Inspector;
use super::logs::LogEntry;
use super::users::User;

const INSPECTIONS_JSON: &str = include_str!("../../data/inspections.json");
const INSPECTORS_JSON: &str = include_str!("../../data/inspectors.json");
const USERS_JSON: &str = include_str!("../../data/users.json");
const LOGS_JSON: &str = include_str!("../../data/logs.json");

/// A completed inspection as recorded by the field team. Visits and the
/// dashboard aggregations are both derived from these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InspectionRecord {
    pub id: u32,
    pub visit_date_time: NaiveDateTime,
    #[serde(default)]
    pub violation_type: Option<String>,
    pub facility_name: String,
    pub facility_code: String,
    #[serde(default)]
    pub branch: Option<String>,
    pub facility_type: String,
    pub activity_type: String,
    pub region: String,
    pub city: String,
    pub compliance_status: String,
    pub visit_type: String,
    pub sector: String,
    #[serde(default)]
    pub device_count: u32,
    #[serde(default)]
    pub total_samples: u32,
    #[serde(default)]
    pub total_fine: f64,
    pub main_inspector_name: String,
    pub main_inspector_title: String,
    #[serde(default)]
    pub main_inspector_id: Option<String>,
}

pub fn inspections() -> Result<Vec<InspectionRecord>, ServiceError> {
    Ok(serde_json::from_str(INSPECTIONS_JSON)?)
}

pub fn inspectors() -> Result<Vec<Inspector>, ServiceError> {
    Ok(serde_json::from_str(INSPECTORS_JSON)?)
}

pub fn users() -> Result<Vec<User>, ServiceError> {
    Ok(serde_json::from_str(USERS_JSON)?)
}

pub fn logs() -> Result<Vec<LogEntry>, ServiceError> {
    Ok(serde_json::from_str(LOGS_JSON)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_seeds_decode() {
        assert_eq!(inspections().unwrap().len(), 8);
        assert_eq!(inspectors().unwrap().len(), 5);
        assert_eq!(users().unwrap().len(), 3);
        assert_eq!(logs().unwrap().len(), 10);
    }
}
