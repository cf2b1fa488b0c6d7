diesel::table! {
    processed_events (id) {
        id -> BigInt,
        event_id -> Text,
        text -> Text,
        processed_at -> Timestamptz,
    }
}

diesel::table! {
    synonyms (id) {
        id -> BigInt,
        canonical_term -> Text,
        raw_term -> Text,
    }
}

diesel::table! {
    answers (id) {
        id -> BigInt,
        canonical_term -> Text,
        answer_text -> Text,
    }
}

diesel::allow_tables_to_appear_in_same_query!(processed_events, synonyms, answers,);
