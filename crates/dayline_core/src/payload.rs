//! Typed payload shapes for every synchronizable kind.
//!
//! A payload is the kind-specific `data` object a client pushes. The
//! server stores it as the record body and echoes it back, together with
//! the common columns, in snapshot and delta buckets.

use crate::date;
use crate::error::{CoreError, CoreResult};
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Natural-key values carried by a payload.
///
/// Which of these participate in a kind's uniqueness constraint is
/// decided by the kind's table layout; identity-addressed kinds leave
/// them all empty.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NaturalKey {
    /// Parent record (habit or medication).
    pub parent_id: Option<Uuid>,
    /// Calendar date.
    pub date: Option<NaiveDate>,
    /// Dose index within a day.
    pub dose_number: Option<i64>,
}

/// A decoded, validated `data` object.
pub trait Payload: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Checks field-level constraints the JSON shape cannot express.
    fn validate(&self) -> CoreResult<()> {
        Ok(())
    }

    /// Returns the natural-key values this payload addresses.
    fn natural_key(&self) -> NaturalKey {
        NaturalKey::default()
    }
}

const WEEKDAYS: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

fn require_non_empty(field: &'static str, value: &str) -> CoreResult<()> {
    if value.trim().is_empty() {
        return Err(CoreError::validation(field, "must not be empty"));
    }
    Ok(())
}

fn require_weekdays(field: &'static str, days: &[String]) -> CoreResult<()> {
    match days.iter().find(|day| !WEEKDAYS.contains(&day.as_str())) {
        Some(day) => Err(CoreError::validation(
            field,
            format!("unknown weekday {day:?}"),
        )),
        None => Ok(()),
    }
}

fn default_true() -> bool {
    true
}

fn default_one() -> i64 {
    1
}

/// A habit to track on scheduled weekdays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HabitPayload {
    /// Display name.
    pub name: String,
    /// Icon identifier.
    #[serde(default)]
    pub icon: String,
    /// Weekday names ("Sunday" … "Saturday").
    #[serde(default)]
    pub scheduled_days: Vec<String>,
}

impl Payload for HabitPayload {
    fn validate(&self) -> CoreResult<()> {
        require_non_empty("name", &self.name)?;
        require_weekdays("scheduled_days", &self.scheduled_days)
    }
}

/// Whether a habit was completed on a given day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HabitCompletionPayload {
    /// The habit this completion belongs to.
    pub habit_id: Uuid,
    /// Completion state for the day.
    #[serde(default)]
    pub completed: bool,
    /// Day of the completion.
    #[serde(with = "date")]
    pub date: NaiveDate,
}

impl Payload for HabitCompletionPayload {
    fn natural_key(&self) -> NaturalKey {
        NaturalKey {
            parent_id: Some(self.habit_id),
            date: Some(self.date),
            dose_number: None,
        }
    }
}

/// A medication schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicationPayload {
    /// Display name.
    pub name: String,
    /// Free-form dosage ("10mg").
    #[serde(default)]
    pub dosage: String,
    /// Weekday names.
    #[serde(default)]
    pub scheduled_days: Vec<String>,
    /// Doses per scheduled day.
    #[serde(default = "default_one")]
    pub times_per_day: i64,
    /// `lifetime` or `limited`.
    #[serde(default = "MedicationPayload::default_duration")]
    pub duration_type: String,
    /// First day of a limited course.
    #[serde(default, with = "date::option")]
    pub start_date: Option<NaiveDate>,
    /// Last day of a limited course.
    #[serde(default, with = "date::option")]
    pub end_date: Option<NaiveDate>,
    /// Free-form notes.
    #[serde(default)]
    pub notes: String,
    /// Icon identifier.
    #[serde(default)]
    pub icon: String,
    /// Whether the schedule is currently followed.
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl MedicationPayload {
    fn default_duration() -> String {
        "lifetime".to_string()
    }
}

impl Payload for MedicationPayload {
    fn validate(&self) -> CoreResult<()> {
        require_non_empty("name", &self.name)?;
        require_weekdays("scheduled_days", &self.scheduled_days)?;
        if self.times_per_day < 1 {
            return Err(CoreError::validation("times_per_day", "must be at least 1"));
        }
        if !matches!(self.duration_type.as_str(), "lifetime" | "limited") {
            return Err(CoreError::validation(
                "duration_type",
                format!("expected lifetime or limited, got {:?}", self.duration_type),
            ));
        }
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if end < start {
                return Err(CoreError::validation("end_date", "precedes start_date"));
            }
        }
        Ok(())
    }
}

/// Whether one dose of a medication was taken on a given day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicationLogPayload {
    /// The medication this log belongs to.
    pub medication_id: Uuid,
    /// Whether the dose was taken.
    #[serde(default)]
    pub taken: bool,
    /// Which dose of the day (1-based).
    #[serde(default = "default_one")]
    pub dose_number: i64,
    /// Day of the dose.
    #[serde(with = "date")]
    pub date: NaiveDate,
}

impl Payload for MedicationLogPayload {
    fn validate(&self) -> CoreResult<()> {
        if self.dose_number < 1 {
            return Err(CoreError::validation("dose_number", "must be at least 1"));
        }
        Ok(())
    }

    fn natural_key(&self) -> NaturalKey {
        NaturalKey {
            parent_id: Some(self.medication_id),
            date: Some(self.date),
            dose_number: Some(self.dose_number),
        }
    }
}

/// A task for a day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TodoPayload {
    /// Task text.
    pub text: String,
    /// Whether the task is done.
    #[serde(default)]
    pub completed: bool,
    /// Day the task is planned for.
    #[serde(with = "date")]
    pub date: NaiveDate,
}

impl Payload for TodoPayload {
    fn validate(&self) -> CoreResult<()> {
        require_non_empty("text", &self.text)
    }
}

/// The quick note for a day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotePayload {
    /// Note text. May be empty to clear the day.
    #[serde(default)]
    pub text: String,
    /// Day of the note.
    #[serde(with = "date")]
    pub date: NaiveDate,
}

impl Payload for NotePayload {
    fn natural_key(&self) -> NaturalKey {
        NaturalKey {
            date: Some(self.date),
            ..NaturalKey::default()
        }
    }
}

/// The mood rating for a day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoodPayload {
    /// Rating from 1 to 5.
    pub rating: i64,
    /// Day of the rating.
    #[serde(with = "date")]
    pub date: NaiveDate,
}

impl Payload for MoodPayload {
    fn validate(&self) -> CoreResult<()> {
        if !(1..=5).contains(&self.rating) {
            return Err(CoreError::validation("rating", "must be between 1 and 5"));
        }
        Ok(())
    }

    fn natural_key(&self) -> NaturalKey {
        NaturalKey {
            date: Some(self.date),
            ..NaturalKey::default()
        }
    }
}

/// A calendar event (birthday, travel, holiday, anniversary, general).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarEventPayload {
    /// Event title.
    pub title: String,
    /// Event category.
    #[serde(default = "CalendarEventPayload::default_type")]
    pub event_type: String,
    /// First day of the event.
    #[serde(with = "date")]
    pub event_date: NaiveDate,
    /// Last day, for multi-day events.
    #[serde(default, with = "date::option")]
    pub end_date: Option<NaiveDate>,
    /// Repeats yearly.
    #[serde(default)]
    pub is_recurring: bool,
    /// Free-form notes.
    #[serde(default)]
    pub notes: String,
}

impl CalendarEventPayload {
    const TYPES: [&'static str; 5] = ["birthday", "travel", "holiday", "anniversary", "general"];

    fn default_type() -> String {
        "general".to_string()
    }
}

impl Payload for CalendarEventPayload {
    fn validate(&self) -> CoreResult<()> {
        require_non_empty("title", &self.title)?;
        if !Self::TYPES.contains(&self.event_type.as_str()) {
            return Err(CoreError::validation(
                "event_type",
                format!("unknown event type {:?}", self.event_type),
            ));
        }
        if let Some(end) = self.end_date {
            if end < self.event_date {
                return Err(CoreError::validation("end_date", "precedes event_date"));
            }
        }
        Ok(())
    }
}

/// One exercise in a workout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exercise {
    /// Position in the workout.
    #[serde(default)]
    pub order: i64,
    /// Exercise name.
    pub name: String,
}

/// One cardio activity in a workout log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cardio {
    /// Activity name.
    pub name: String,
    /// Duration in minutes.
    #[serde(default)]
    pub minutes: i64,
}

/// A reusable workout template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutPayload {
    /// Template name.
    pub name: String,
    /// Weekday the template is planned for.
    #[serde(default)]
    pub day: String,
    /// Exercises in order.
    #[serde(default)]
    pub exercises: Vec<Exercise>,
    /// Position in the template list.
    #[serde(default)]
    pub display_order: i64,
}

impl Payload for WorkoutPayload {
    fn validate(&self) -> CoreResult<()> {
        require_non_empty("name", &self.name)
    }
}

/// The workout performed on a day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutLogPayload {
    /// Name of the workout performed.
    #[serde(default)]
    pub workout_name: String,
    /// Exercises completed.
    #[serde(default)]
    pub completed_exercises: Vec<Exercise>,
    /// Cardio performed.
    #[serde(default)]
    pub cardio: Vec<Cardio>,
    /// Body weight recorded that day.
    #[serde(default)]
    pub weight: f64,
    /// Day of the workout.
    #[serde(with = "date")]
    pub date: NaiveDate,
}

impl Payload for WorkoutLogPayload {
    fn validate(&self) -> CoreResult<()> {
        if !self.weight.is_finite() || self.weight < 0.0 {
            return Err(CoreError::validation("weight", "must be a non-negative number"));
        }
        Ok(())
    }

    fn natural_key(&self) -> NaturalKey {
        NaturalKey {
            date: Some(self.date),
            ..NaturalKey::default()
        }
    }
}

/// A long-form markdown post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkdownNotePayload {
    /// Post title.
    pub title: String,
    /// Markdown body.
    #[serde(default)]
    pub content: String,
    /// Right-to-left rendering.
    #[serde(default)]
    pub is_rtl: bool,
}

impl Payload for MarkdownNotePayload {
    fn validate(&self) -> CoreResult<()> {
        require_non_empty("title", &self.title)
    }
}

/// Visibility and order of one dashboard section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionConfig {
    /// Section identifier.
    pub id: String,
    /// Whether the section is shown.
    #[serde(default = "default_true")]
    pub is_visible: bool,
    /// Position on the dashboard.
    #[serde(default)]
    pub order: i64,
}

/// Per-owner dashboard settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSettingsPayload {
    /// Section layout.
    #[serde(default)]
    pub section_configs: Vec<SectionConfig>,
}

impl Payload for UserSettingsPayload {
    fn validate(&self) -> CoreResult<()> {
        let mut seen = std::collections::HashSet::new();
        for section in &self.section_configs {
            require_non_empty("section_configs.id", &section.id)?;
            if !seen.insert(section.id.as_str()) {
                return Err(CoreError::validation(
                    "section_configs",
                    format!("duplicate section {:?}", section.id),
                ));
            }
        }
        Ok(())
    }
}
