//! Offline sample itinerary generator.
//!
//! Used when no remote generator endpoint is configured. It reads a
//! destination and a day count out of the request text, falls back to the
//! prior draft and then to fixed defaults, and lays out a morning and an
//! afternoon activity per day.

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use vibecation_application::{CandidateGenerator, GeneratorError};
use vibecation_domain::{Activity, ActivityType, CandidateSet, ItineraryDay};

const DEFAULT_DESTINATION: &str = "Barcelona";
const DEFAULT_DAYS: u32 = 3;
const MAX_DAYS: u32 = 14;

// Barcelona city centre
const DEFAULT_LAT: f64 = 41.4036;
const DEFAULT_LON: f64 = 2.1744;

#[derive(Debug, Clone, Default)]
pub struct SampleItineraryGenerator {
    /// Fixed first day; today (UTC) when unset
    start_date: Option<NaiveDate>,
}

impl SampleItineraryGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_start_date(mut self, date: NaiveDate) -> Self {
        self.start_date = Some(date);
        self
    }

    fn build(&self, query: &str, prior: &CandidateSet) -> CandidateSet {
        let destination = destination_from_query(query)
            .or_else(|| prior_destination(prior))
            .unwrap_or_else(|| DEFAULT_DESTINATION.to_string());
        let day_count = days_from_query(query)
            .or_else(|| u32::try_from(prior.days.len()).ok().filter(|n| *n > 0))
            .unwrap_or(DEFAULT_DAYS)
            .min(MAX_DAYS);
        let start = self
            .start_date
            .or_else(|| prior_start(prior))
            .unwrap_or_else(|| Utc::now().date_naive());

        let days = (1..=day_count)
            .map(|day| ItineraryDay {
                day,
                activities: day_activities(&destination, start, day),
            })
            .collect();

        let cuisines = if prior.cuisines.is_empty() {
            vec![format!("{} local cuisine", destination)]
        } else {
            prior.cuisines.clone()
        };

        CandidateSet {
            summary: format!("{} Adventure: {}", destination, query.trim()),
            days,
            cuisines,
        }
    }
}

#[async_trait]
impl CandidateGenerator for SampleItineraryGenerator {
    async fn generate(
        &self,
        query: &str,
        prior: &CandidateSet,
    ) -> Result<CandidateSet, GeneratorError> {
        Ok(self.build(query, prior))
    }
}

fn day_activities(destination: &str, start: NaiveDate, day: u32) -> Vec<Activity> {
    let date = start + Duration::days(i64::from(day) - 1);
    let slot = |hour: u32, hours: i64| -> (DateTime<Utc>, DateTime<Utc>) {
        let from = date
            .and_time(NaiveTime::from_hms_opt(hour, 0, 0).unwrap_or(NaiveTime::MIN))
            .and_utc();
        (from, from + Duration::hours(hours))
    };

    let (morning_from, morning_to) = slot(10, 2);
    let (afternoon_from, afternoon_to) = slot(14, 3);

    vec![
        Activity {
            activity_id: format!("activity_{}_morning", day),
            activity_name: format!("{} Day {} - Morning Exploration", destination, day),
            activity_type: ActivityType::Attraction,
            activity_description: format!("Explore {} on day {}", destination, day),
            from_date_time: morning_from,
            to_date_time: morning_to,
            start_location: destination.to_string(),
            start_lat: DEFAULT_LAT,
            start_lon: DEFAULT_LON,
            end_location: destination.to_string(),
            end_lat: DEFAULT_LAT,
            end_lon: DEFAULT_LON,
        },
        Activity {
            activity_id: format!("activity_{}_afternoon", day),
            activity_name: format!("{} Day {} - Afternoon Activity", destination, day),
            activity_type: ActivityType::Entertainment,
            activity_description: format!("Afternoon activity in {}", destination),
            from_date_time: afternoon_from,
            to_date_time: afternoon_to,
            start_location: destination.to_string(),
            start_lat: DEFAULT_LAT,
            start_lon: DEFAULT_LON,
            end_location: destination.to_string(),
            end_lat: DEFAULT_LAT,
            end_lon: DEFAULT_LON,
        },
    ]
}

/// Word after the first "to" or "in", e.g. "3 days in lisbon" -> "Lisbon".
fn destination_from_query(query: &str) -> Option<String> {
    let words: Vec<&str> = query.split_whitespace().collect();
    words
        .windows(2)
        .find(|pair| matches!(pair[0].to_lowercase().as_str(), "to" | "in"))
        .map(|pair| pair[1].trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|word| !word.is_empty())
        .map(capitalize)
}

/// Number directly before "day" or "days".
fn days_from_query(query: &str) -> Option<u32> {
    let words: Vec<&str> = query.split_whitespace().collect();
    words.windows(2).find_map(|pair| {
        let unit = pair[1]
            .trim_matches(|c: char| !c.is_alphanumeric())
            .to_lowercase();
        if unit == "day" || unit == "days" {
            pair[0].parse::<u32>().ok().filter(|n| *n > 0)
        } else {
            None
        }
    })
}

fn prior_destination(prior: &CandidateSet) -> Option<String> {
    prior
        .days
        .iter()
        .flat_map(|d| d.activities.iter())
        .map(|a| a.start_location.trim())
        .find(|loc| !loc.is_empty())
        .map(str::to_string)
}

fn prior_start(prior: &CandidateSet) -> Option<NaiveDate> {
    prior
        .days
        .iter()
        .flat_map(|d| d.activities.iter())
        .map(|a| a.from_date_time.date_naive())
        .min()
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}
