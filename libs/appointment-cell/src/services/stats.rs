use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use reqwest::Method;
use serde_json::Value;
use tracing::warn;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{AppointmentError, LocationStat, MonthlyStat};

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

pub struct StatsService {
    supabase: SupabaseClient,
}

impl StatsService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    pub async fn location_statistics(
        &self,
        doctor_id: Uuid,
        auth_token: &str,
    ) -> Result<Vec<LocationStat>, AppointmentError> {
        let rows = self.fetch_bookings(doctor_id, auth_token).await?;
        Ok(location_statistics(&rows))
    }

    pub async fn monthly_statistics(
        &self,
        doctor_id: Uuid,
        auth_token: &str,
    ) -> Result<Vec<MonthlyStat>, AppointmentError> {
        let rows = self.fetch_bookings(doctor_id, auth_token).await?;
        Ok(monthly_statistics(&rows))
    }

    async fn fetch_bookings(
        &self,
        doctor_id: Uuid,
        auth_token: &str,
    ) -> Result<Vec<Value>, AppointmentError> {
        let path = format!("/rest/v1/slot_bookings?doctor_id=eq.{}", doctor_id);
        self.supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| AppointmentError::Database(e.to_string()))
    }
}

/// Accepts the snapshot format and the long form some clients submit.
pub fn parse_booking_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%B %d, %Y"))
        .ok()
}

/// Groups raw booking rows by place. `cancels` counts rows whose status is
/// the literal "canceled"; the lifecycle only ever writes "cancel", so the
/// count stays zero. Kept as stored-document arithmetic on purpose.
pub fn location_statistics(rows: &[Value]) -> Vec<LocationStat> {
    let mut groups: BTreeMap<String, Vec<&Value>> = BTreeMap::new();
    for row in rows {
        let place = row["place"].as_str().unwrap_or("").to_string();
        groups.entry(place).or_default().push(row);
    }

    groups
        .into_iter()
        .map(|(location, rows)| {
            let appointment = rows.len() as u64;
            let confirmed = rows
                .iter()
                .filter(|r| r["booking_status"].as_str() == Some("booked"))
                .count() as u64;
            let cancels = rows
                .iter()
                .filter(|r| r["booking_status"].as_str() == Some("canceled"))
                .count() as u64;

            let max_patient_day = rows
                .iter()
                .filter(|r| r["booking_status"].as_str() == Some("booked"))
                .filter_map(|r| {
                    let raw = r["date"].as_str()?;
                    parse_booking_date(raw).map(|parsed| (parsed, raw.to_string()))
                })
                .max_by_key(|(parsed, _)| *parsed)
                .map(|(_, raw)| raw);

            LocationStat {
                location,
                appointment,
                requests: confirmed + cancels,
                confirmed,
                cancels,
                visited: confirmed,
                max_patient_day,
            }
        })
        .collect()
}

/// Groups raw booking rows by calendar month, newest first. `visits` and
/// `cancellations` read `active_status` off the booking rows; bookings do
/// not store that field (slots do), so both counts stay zero. Kept as
/// stored-document arithmetic on purpose.
pub fn monthly_statistics(rows: &[Value]) -> Vec<MonthlyStat> {
    let mut groups: BTreeMap<(i32, u32), Vec<(&Value, NaiveDate)>> = BTreeMap::new();
    for row in rows {
        let raw = row["date"].as_str().unwrap_or("");
        match parse_booking_date(raw) {
            Some(date) => {
                groups
                    .entry((date.year(), date.month()))
                    .or_default()
                    .push((row, date));
            }
            None => {
                warn!("Skipping booking with unparseable date {:?}", raw);
            }
        }
    }

    groups
        .into_iter()
        .rev()
        .map(|((year, month), rows)| {
            let total_booked = rows.len() as u64;
            let visits = rows
                .iter()
                .filter(|(r, _)| r["active_status"].as_bool() == Some(true))
                .count() as u64;
            let cancellations = rows
                .iter()
                .filter(|(r, _)| r["active_status"].as_bool() == Some(false))
                .count() as u64;

            let mut daily_counts: BTreeMap<u32, u64> = BTreeMap::new();
            for (_, date) in &rows {
                *daily_counts.entry(date.day()).or_insert(0) += 1;
            }

            let (max_patient_date, max_patient_count) = daily_counts
                .iter()
                .max_by_key(|(_, count)| **count)
                .map(|(day, count)| (Some(*day), *count))
                .unwrap_or((None, 0));

            MonthlyStat {
                month: format!("{} {}", MONTH_NAMES[(month - 1) as usize], year),
                total_booked,
                booked_per_day: total_booked as f64 / 30.0,
                appointments: daily_counts.len(),
                visits,
                cancellations,
                max_patient_count,
                max_patient_date,
            }
        })
        .collect()
}
