//! Property-based test generators using proptest.

use crate::payloads;
use chrono::{Duration, NaiveDate};
use dayline_sync_protocol::PushItem;
use proptest::prelude::*;
use serde_json::Value;

/// Strategy for dates in the first quarter of 2024, as `YYYY-MM-DD`.
pub fn date_strategy() -> impl Strategy<Value = String> {
    (0i64..91).prop_map(|offset| {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default();
        (start + Duration::days(offset)).format("%Y-%m-%d").to_string()
    })
}

/// Strategy for valid mood ratings.
pub fn rating_strategy() -> impl Strategy<Value = i64> {
    1i64..=5
}

/// Strategy for client-local identifiers.
pub fn local_id_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("local-[a-z0-9]{6}").expect("Invalid regex")
}

/// Strategy for non-empty display text.
pub fn text_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[A-Za-z][A-Za-z0-9 ]{0,23}").expect("Invalid regex")
}

/// Strategy for `(rating, date)` pairs over a small set of dates, so
/// sequences revisit the same key.
pub fn mood_write_strategy() -> impl Strategy<Value = (i64, String)> {
    (rating_strategy(), (1u32..=4).prop_map(payloads::day))
}

/// Strategy for create items of identity-addressed kinds.
pub fn identity_create_strategy() -> impl Strategy<Value = PushItem> {
    (local_id_strategy(), text_strategy(), date_strategy(), 0usize..4).prop_map(
        |(local_id, text, date, kind)| {
            let (tag, data): (&str, Value) = match kind {
                0 => ("habit", payloads::habit(&text)),
                1 => ("todo", payloads::todo(&text, &date)),
                2 => ("event", payloads::event(&text, &date)),
                _ => ("markdownNote", payloads::markdown_note(&text, "body")),
            };
            PushItem::new(local_id, tag, data)
        },
    )
}
