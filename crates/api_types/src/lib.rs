use serde::{Deserialize, Deserializer, Serialize};

/// Wraps a present JSON value in `Some`, so that `null` and a missing key can
/// be told apart on `Option<Option<T>>` fields.
fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

pub mod habit {
    use chrono::NaiveTime;
    use uuid::Uuid;

    use super::*;

    /// Body of `POST /habits` and `PUT /habits/{id}`.
    ///
    /// Omitted optional fields take their defaults.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct HabitNew {
        pub place: String,
        /// Time of day, `HH:MM[:SS]`.
        pub time: NaiveTime,
        pub action: String,
        #[serde(default)]
        pub is_pleasant: bool,
        #[serde(default)]
        pub related_habit: Option<Uuid>,
        #[serde(default = "default_frequency")]
        pub frequency: i32,
        #[serde(default)]
        pub reward: Option<String>,
        pub duration: i32,
        #[serde(default)]
        pub is_public: bool,
    }

    fn default_frequency() -> i32 {
        1
    }

    /// Body of `PATCH /habits/{id}`.
    ///
    /// `related_habit: null` clears the relation, a missing key keeps it.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct HabitPatch {
        pub place: Option<String>,
        pub time: Option<NaiveTime>,
        pub action: Option<String>,
        pub is_pleasant: Option<bool>,
        #[serde(
            default,
            deserialize_with = "deserialize_some",
            skip_serializing_if = "Option::is_none"
        )]
        pub related_habit: Option<Option<Uuid>>,
        pub frequency: Option<i32>,
        pub reward: Option<String>,
        pub duration: Option<i32>,
        pub is_public: Option<bool>,
    }

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct Habit {
        pub id: Uuid,
        pub user: String,
        pub place: String,
        pub time: NaiveTime,
        pub action: String,
        pub is_pleasant: bool,
        pub related_habit: Option<Uuid>,
        pub frequency: i32,
        pub reward: Option<String>,
        pub duration: i32,
        pub is_public: bool,
    }
}

pub mod page {
    use super::*;

    /// `?page=&page_size=` query of the listing endpoints.
    #[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
    pub struct PageQuery {
        pub page: Option<u64>,
        pub page_size: Option<u64>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Page<T> {
        pub count: u64,
        pub page: u64,
        pub page_size: u64,
        pub results: Vec<T>,
    }
}

pub mod user {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Register {
        pub username: String,
        pub password: String,
        pub email: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Registered {
        pub username: String,
    }

    /// Body of `POST /set-telegram-chat-id`.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct ChatId {
        pub chat_id: Option<String>,
    }
}
