// SQLite schema definitions
// This file mirrors schema.rs but uses SQLite-compatible types

diesel::table! {
    processed_events (id) {
        id -> Integer,
        event_id -> Text,
        text -> Text,
        processed_at -> Text,
    }
}

diesel::table! {
    synonyms (id) {
        id -> Integer,
        canonical_term -> Text,
        raw_term -> Text,
    }
}

diesel::table! {
    answers (id) {
        id -> Integer,
        canonical_term -> Text,
        answer_text -> Text,
    }
}

diesel::allow_tables_to_appear_in_same_query!(processed_events, synonyms, answers,);
