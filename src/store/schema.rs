diesel::table! {
    users (id) {
        id -> Integer,
        platform -> Text,
        platform_id -> Text,
        created_at -> BigInt,
    }
}

diesel::table! {
    reminders (id) {
        id -> Integer,
        user_id -> Integer,
        title -> Text,
        interval_minutes -> Nullable<BigInt>,
        scheduled_at -> Nullable<BigInt>,
        is_recurring -> Bool,
        is_active -> Bool,
        last_sent_at -> Nullable<BigInt>,
        next_send_at -> Nullable<BigInt>,
        created_at -> BigInt,
    }
}

diesel::table! {
    reminder_logs (id) {
        id -> Integer,
        user_id -> Integer,
        reminder_id -> Nullable<Integer>,
        action -> Text,
        reminder_title -> Nullable<Text>,
        note -> Nullable<Text>,
        timestamp -> BigInt,
    }
}

diesel::joinable!(reminders -> users (user_id));
diesel::joinable!(reminder_logs -> users (user_id));

diesel::allow_tables_to_appear_in_same_query!(users, reminders, reminder_logs);
