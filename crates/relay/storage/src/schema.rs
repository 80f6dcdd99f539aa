//! Diesel schema definitions.

diesel::table! {
    push_notifications (id) {
        id -> Text,
        title -> Text,
        body -> Text,
        destination_token -> Text,
        payload -> Text,
        status -> Text,
        created_at -> Timestamp,
        sent_at -> Nullable<Timestamp>,
        failed_at -> Nullable<Timestamp>,
        message_id -> Nullable<Text>,
        error_detail -> Nullable<Text>,
    }
}
