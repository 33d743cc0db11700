//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `backend/migrations` exactly.

diesel::table! {
    /// Registered users.
    users (id) {
        id -> Int4,
        name -> Varchar,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Segment catalogue; `slug` is unique.
    segments (id) {
        id -> Int4,
        slug -> Varchar,
        description -> Varchar,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Current memberships, at most one row per (user, segment).
    user_segments (user_id, segment_id) {
        user_id -> Int4,
        segment_id -> Int4,
        expiration_time -> Timestamptz,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Append-only membership audit trail.
    ///
    /// `(user_id, segment_id, action, created_at)` is unique.
    user_segment_history (id) {
        id -> Int8,
        user_id -> Int4,
        segment_id -> Int4,
        action -> Varchar,
        created_at -> Timestamptz,
    }
}

diesel::joinable!(user_segments -> users (user_id));
diesel::joinable!(user_segments -> segments (segment_id));
diesel::joinable!(user_segment_history -> users (user_id));
diesel::joinable!(user_segment_history -> segments (segment_id));

diesel::allow_tables_to_appear_in_same_query!(users, segments, user_segments, user_segment_history);
