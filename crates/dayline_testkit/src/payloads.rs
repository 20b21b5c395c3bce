//! Payload builders for every built-in kind.
//!
//! Each builder returns the `data` object in the exact form the server
//! stores and echoes back, with every defaulted field spelled out.

use serde_json::{json, Value};

/// A `YYYY-MM-DD` date in June 2024.
pub fn day(d: u32) -> String {
    format!("2024-06-{d:02}")
}

/// A habit scheduled on Mondays and Wednesdays.
pub fn habit(name: &str) -> Value {
    json!({
        "name": name,
        "icon": "",
        "scheduled_days": ["Monday", "Wednesday"],
    })
}

/// A habit completion.
pub fn habit_completion(habit_id: &str, date: &str, completed: bool) -> Value {
    json!({
        "habit_id": habit_id,
        "completed": completed,
        "date": date,
    })
}

/// A lifetime medication taken once a day.
pub fn medication(name: &str) -> Value {
    json!({
        "name": name,
        "dosage": "10mg",
        "scheduled_days": [],
        "times_per_day": 1,
        "duration_type": "lifetime",
        "start_date": null,
        "end_date": null,
        "notes": "",
        "icon": "",
        "is_active": true,
    })
}

/// A medication dose log.
pub fn medication_log(medication_id: &str, date: &str, dose_number: i64, taken: bool) -> Value {
    json!({
        "medication_id": medication_id,
        "taken": taken,
        "dose_number": dose_number,
        "date": date,
    })
}

/// An open todo.
pub fn todo(text: &str, date: &str) -> Value {
    json!({
        "text": text,
        "completed": false,
        "date": date,
    })
}

/// A daily note.
pub fn note(text: &str, date: &str) -> Value {
    json!({
        "text": text,
        "date": date,
    })
}

/// A mood rating.
pub fn mood(rating: i64, date: &str) -> Value {
    json!({
        "rating": rating,
        "date": date,
    })
}

/// A single-day general event.
pub fn event(title: &str, date: &str) -> Value {
    json!({
        "title": title,
        "event_type": "general",
        "event_date": date,
        "end_date": null,
        "is_recurring": false,
        "notes": "",
    })
}

/// A one-exercise workout template.
pub fn workout(name: &str) -> Value {
    json!({
        "name": name,
        "day": "Monday",
        "exercises": [{"order": 1, "name": "Squat"}],
        "display_order": 0,
    })
}

/// A workout log.
pub fn workout_log(workout_name: &str, date: &str, weight: f64) -> Value {
    json!({
        "workout_name": workout_name,
        "completed_exercises": [{"order": 1, "name": "Squat"}],
        "cardio": [{"name": "Rowing", "minutes": 10}],
        "weight": weight,
        "date": date,
    })
}

/// A left-to-right markdown post.
pub fn markdown_note(title: &str, content: &str) -> Value {
    json!({
        "title": title,
        "content": content,
        "is_rtl": false,
    })
}

/// Dashboard settings with sections in the given order.
pub fn user_settings(sections: &[(&str, bool)]) -> Value {
    let configs: Vec<Value> = sections
        .iter()
        .enumerate()
        .map(|(order, (id, visible))| json!({"id": id, "is_visible": visible, "order": order}))
        .collect();
    json!({ "section_configs": configs })
}
