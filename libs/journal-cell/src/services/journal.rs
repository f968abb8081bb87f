use std::collections::BTreeMap;

use chrono::{Days, Months, NaiveDate, Utc};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::{representation_headers, SupabaseClient};

use crate::models::{DailyEntry, JournalError, SubmitOutcome};

const ENTRIES_TABLE: &str = "/rest/v1/daily_entries";

pub struct JournalService {
    supabase: SupabaseClient,
}

/// Validated field set for an insert-or-overwrite of one calendar day.
pub struct EntryFields {
    pub period_day: String,
    pub pain: String,
    pub pain_level: Option<i32>,
    pub side: Option<String>,
    pub left_locations: Vec<String>,
    pub right_locations: Vec<String>,
}

impl JournalService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    pub async fn submit(
        &self,
        patient_id: Uuid,
        date: &str,
        fields: EntryFields,
        auth_token: &str,
    ) -> Result<SubmitOutcome, JournalError> {
        let existing = self.find_entry(patient_id, date, auth_token).await?;

        let now = Utc::now();
        if let Some(entry) = existing {
            let update_data = json!({
                "period_day": fields.period_day,
                "pain": fields.pain,
                "pain_level": fields.pain_level,
                "side": fields.side,
                "left_locations": fields.left_locations,
                "right_locations": fields.right_locations,
                "updated_at": now.to_rfc3339()
            });
            let path = format!("{}?id=eq.{}", ENTRIES_TABLE, entry.id);
            let _: Vec<DailyEntry> = self
                .supabase
                .request_with_headers(
                    Method::PATCH,
                    &path,
                    Some(auth_token),
                    Some(update_data),
                    Some(representation_headers()),
                )
                .await
                .map_err(|e| JournalError::Database(e.to_string()))?;

            info!("Daily entry for {} on {} overwritten", patient_id, date);
            return Ok(SubmitOutcome::Updated);
        }

        let entry_data = json!({
            "patient_id": patient_id,
            "date": date,
            "period_day": fields.period_day,
            "pain": fields.pain,
            "pain_level": fields.pain_level,
            "side": fields.side,
            "left_locations": fields.left_locations,
            "right_locations": fields.right_locations,
            "created_at": now.to_rfc3339(),
            "updated_at": now.to_rfc3339()
        });
        let _: Vec<DailyEntry> = self
            .supabase
            .request_with_headers(
                Method::POST,
                ENTRIES_TABLE,
                Some(auth_token),
                Some(entry_data),
                Some(representation_headers()),
            )
            .await
            .map_err(|e| JournalError::Database(e.to_string()))?;

        info!("Daily entry for {} on {} saved", patient_id, date);
        Ok(SubmitOutcome::Saved)
    }

    pub async fn record_feedback(
        &self,
        patient_id: Uuid,
        date: &str,
        feedback: &str,
        auth_token: &str,
    ) -> Result<(), JournalError> {
        let entry = self
            .find_entry(patient_id, date, auth_token)
            .await?
            .ok_or_else(|| {
                JournalError::NotFound("No entry found for the specified date".to_string())
            })?;

        let update_data = json!({
            "feedback": feedback,
            "updated_at": Utc::now().to_rfc3339()
        });
        let path = format!("{}?id=eq.{}", ENTRIES_TABLE, entry.id);
        let _: Vec<DailyEntry> = self
            .supabase
            .request_with_headers(
                Method::PATCH,
                &path,
                Some(auth_token),
                Some(update_data),
                Some(representation_headers()),
            )
            .await
            .map_err(|e| JournalError::Database(e.to_string()))?;

        Ok(())
    }

    /// Entries for one patient, date ascending, optionally clipped to a
    /// trailing window.
    pub async fn list(
        &self,
        patient_id: Uuid,
        start: Option<NaiveDate>,
        auth_token: &str,
    ) -> Result<Vec<DailyEntry>, JournalError> {
        let mut path = format!("{}?patient_id=eq.{}", ENTRIES_TABLE, patient_id);
        if let Some(start) = start {
            path.push_str(&format!("&date=gte.{}", start.format("%Y-%m-%d")));
        }
        path.push_str("&order=date.asc");

        self.supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| JournalError::Database(e.to_string()))
    }

    async fn find_entry(
        &self,
        patient_id: Uuid,
        date: &str,
        auth_token: &str,
    ) -> Result<Option<DailyEntry>, JournalError> {
        let path = format!(
            "{}?patient_id=eq.{}&date=eq.{}&limit=1",
            ENTRIES_TABLE, patient_id, date
        );
        let rows: Vec<DailyEntry> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| JournalError::Database(e.to_string()))?;
        Ok(rows.into_iter().next())
    }
}

/// Accepts the client's long form ("January 05, 2025") as well as ISO input
/// and hands back the ISO form the store is keyed by.
pub fn parse_entry_date(raw: &str) -> Option<String> {
    let parsed = NaiveDate::parse_from_str(raw, "%B %d, %Y")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d"))
        .ok()?;
    Some(parsed.format("%Y-%m-%d").to_string())
}

/// Start of the trailing window a duration keyword selects, relative to
/// `today`. Unknown keywords select everything.
pub fn duration_start(duration: &str, today: NaiveDate) -> Option<NaiveDate> {
    match duration {
        "10days" => today.checked_sub_days(Days::new(10)),
        "1month" => today.checked_sub_months(Months::new(1)),
        "6months" => today.checked_sub_months(Months::new(6)),
        "1year" => today.checked_sub_months(Months::new(12)),
        _ => None,
    }
}

/// Pie-chart aggregation: entry count per pain level, levels ascending with
/// the level-less group first.
pub fn pain_level_counts(entries: &[DailyEntry]) -> Vec<Value> {
    let mut counts: BTreeMap<Option<i32>, u64> = BTreeMap::new();
    for entry in entries {
        *counts.entry(entry.pain_level).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .map(|(level, count)| json!({ "painLevel": level, "count": count }))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn entry(date: &str, pain_level: Option<i32>) -> DailyEntry {
        DailyEntry {
            id: Uuid::new_v4(),
            patient_id: Uuid::new_v4(),
            date: date.to_string(),
            period_day: "day 3".to_string(),
            pain: "Yes".to_string(),
            pain_level,
            side: Some("Left".to_string()),
            left_locations: vec!["Upper".to_string()],
            right_locations: vec![],
            feedback: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn entry_date_accepts_both_client_formats() {
        assert_eq!(parse_entry_date("January 05, 2025").as_deref(), Some("2025-01-05"));
        assert_eq!(parse_entry_date("2025-01-05").as_deref(), Some("2025-01-05"));
        assert_eq!(parse_entry_date("05/01/2025"), None);
    }

    #[test]
    fn duration_windows() {
        let today = NaiveDate::from_ymd_opt(2025, 6, 15).unwrap();
        assert_eq!(
            duration_start("10days", today),
            NaiveDate::from_ymd_opt(2025, 6, 5)
        );
        assert_eq!(
            duration_start("6months", today),
            NaiveDate::from_ymd_opt(2024, 12, 15)
        );
        assert_eq!(duration_start("forever", today), None);
    }

    #[test]
    fn pain_levels_grouped_and_sorted() {
        let entries = vec![
            entry("2025-01-01", Some(7)),
            entry("2025-01-02", Some(3)),
            entry("2025-01-03", Some(7)),
            entry("2025-01-04", None),
        ];
        let counts = pain_level_counts(&entries);
        assert_eq!(counts.len(), 3);
        assert!(counts[0]["painLevel"].is_null());
        assert_eq!(counts[1]["painLevel"], 3);
        assert_eq!(counts[2]["painLevel"], 7);
        assert_eq!(counts[2]["count"], 2);
    }
}
