//! The built-in kinds.

use crate::catalog::Catalog;
use crate::error::EngineResult;
use crate::strategy::{IdentityAddressed, NaturalKeyUpsert};
use dayline_core::payload::{
    CalendarEventPayload, HabitCompletionPayload, HabitPayload, MarkdownNotePayload,
    MedicationLogPayload, MedicationPayload, MoodPayload, NotePayload, TodoPayload,
    UserSettingsPayload, WorkoutLogPayload, WorkoutPayload,
};
use dayline_store::tables;
use tracing::error;

/// Type tags of the built-in kinds.
pub mod tags {
    /// Habits.
    pub const HABIT: &str = "habit";
    /// Habit completions.
    pub const HABIT_COMPLETION: &str = "habitCompletion";
    /// Medications.
    pub const MEDICATION: &str = "medication";
    /// Medication logs.
    pub const MEDICATION_LOG: &str = "medicationLog";
    /// Todos.
    pub const TODO: &str = "todo";
    /// Daily notes.
    pub const NOTE: &str = "note";
    /// Mood ratings.
    pub const MOOD: &str = "mood";
    /// Calendar events.
    pub const EVENT: &str = "event";
    /// Workout templates.
    pub const WORKOUT: &str = "workout";
    /// Workout logs.
    pub const WORKOUT_LOG: &str = "workoutLog";
    /// Long-form posts.
    pub const MARKDOWN_NOTE: &str = "markdownNote";
    /// User settings.
    pub const USER_SETTINGS: &str = "userSettings";
}

impl Catalog {
    /// Returns a catalog with every built-in kind registered.
    ///
    /// Every identity-addressed kind soft-deletes.
    pub fn standard() -> Self {
        let mut catalog = Catalog::new();
        let registered = register_standard(&mut catalog);
        debug_assert!(registered.is_ok(), "built-in kinds collide: {registered:?}");
        if let Err(err) = registered {
            error!(error = %err, kinds = catalog.len(), "Built-in catalog is incomplete");
        }
        catalog
    }

    /// Like [`Catalog::standard`], but reports a registration conflict
    /// instead of returning the kinds registered before it.
    pub fn try_standard() -> EngineResult<Self> {
        let mut catalog = Catalog::new();
        register_standard(&mut catalog)?;
        Ok(catalog)
    }
}

fn register_standard(catalog: &mut Catalog) -> EngineResult<()> {
    catalog.register(IdentityAddressed::<HabitPayload>::new(
        tags::HABIT,
        "habits",
        tables::HABITS,
    ))?;
    catalog.register(NaturalKeyUpsert::<HabitCompletionPayload>::new(
        tags::HABIT_COMPLETION,
        "habitCompletions",
        tables::HABIT_COMPLETIONS,
    ))?;
    catalog.register(IdentityAddressed::<MedicationPayload>::new(
        tags::MEDICATION,
        "medications",
        tables::MEDICATIONS,
    ))?;
    catalog.register(NaturalKeyUpsert::<MedicationLogPayload>::new(
        tags::MEDICATION_LOG,
        "medicationLogs",
        tables::MEDICATION_LOGS,
    ))?;
    catalog.register(IdentityAddressed::<TodoPayload>::new(
        tags::TODO,
        "todos",
        tables::TODOS,
    ))?;
    catalog.register(NaturalKeyUpsert::<NotePayload>::new(
        tags::NOTE,
        "dailyNotes",
        tables::DAILY_NOTES,
    ))?;
    catalog.register(NaturalKeyUpsert::<MoodPayload>::new(
        tags::MOOD,
        "moodRatings",
        tables::MOOD_RATINGS,
    ))?;
    catalog.register(IdentityAddressed::<CalendarEventPayload>::new(
        tags::EVENT,
        "events",
        tables::CALENDAR_EVENTS,
    ))?;
    catalog.register(IdentityAddressed::<WorkoutPayload>::new(
        tags::WORKOUT,
        "workoutTemplates",
        tables::WORKOUT_TEMPLATES,
    ))?;
    catalog.register(NaturalKeyUpsert::<WorkoutLogPayload>::new(
        tags::WORKOUT_LOG,
        "workoutLogs",
        tables::WORKOUT_LOGS,
    ))?;
    catalog.register(IdentityAddressed::<MarkdownNotePayload>::new(
        tags::MARKDOWN_NOTE,
        "markdownNotes",
        tables::MARKDOWN_NOTES,
    ))?;
    catalog.register(IdentityAddressed::<UserSettingsPayload>::new(
        tags::USER_SETTINGS,
        "userSettings",
        tables::USER_SETTINGS,
    ))?;
    Ok(())
}
