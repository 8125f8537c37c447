use std::collections::HashMap;

use chrono::{NaiveTime, Timelike};
use sea_orm::{QueryFilter, QueryOrder, prelude::*};

use crate::{Notification, ResultEngine, habits, reminders::reminder_message, user_profiles};

use super::Engine;

/// First and last instant of the minute `now` falls in.
fn minute_window(now: NaiveTime) -> Option<(NaiveTime, NaiveTime)> {
    let start = NaiveTime::from_hms_opt(now.hour(), now.minute(), 0)?;
    let end = NaiveTime::from_hms_micro_opt(now.hour(), now.minute(), 59, 999_999)?;
    Some((start, end))
}

impl Engine {
    /// Reminders due in the minute of `now`.
    ///
    /// Seconds are ignored on both sides: a habit stored at 09:00:30 matches
    /// any `now` between 09:00:00 and 09:00:59. Habits whose owner has no
    /// linked chat are skipped.
    pub async fn due_reminders(&self, now: NaiveTime) -> ResultEngine<Vec<Notification>> {
        let Some((start, end)) = minute_window(now) else {
            return Ok(Vec::new());
        };

        let due = habits::Entity::find()
            .filter(habits::Column::Time.between(start, end))
            .order_by_asc(habits::Column::Id)
            .all(&self.database)
            .await?;
        if due.is_empty() {
            return Ok(Vec::new());
        }

        let mut owners: Vec<&str> = due.iter().map(|habit| habit.user_id.as_str()).collect();
        owners.sort_unstable();
        owners.dedup();
        let profiles: HashMap<String, user_profiles::Model> = user_profiles::Entity::find()
            .filter(user_profiles::Column::UserId.is_in(owners))
            .all(&self.database)
            .await?
            .into_iter()
            .map(|profile| (profile.user_id.clone(), profile))
            .collect();

        let mut notifications = Vec::with_capacity(due.len());
        for habit in &due {
            match profiles.get(&habit.user_id).and_then(|p| p.chat_id()) {
                Some(chat_id) => {
                    notifications.push(Notification::new(chat_id, &reminder_message(&habit.action)))
                }
                None => tracing::debug!(
                    "skipping habit {}: {} has no linked chat",
                    habit.id,
                    habit.user_id
                ),
            }
        }
        Ok(notifications)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_covers_the_whole_minute() {
        let now = NaiveTime::from_hms_milli_opt(12, 34, 56, 789).unwrap();
        let (start, end) = minute_window(now).unwrap();
        assert_eq!(start, NaiveTime::from_hms_opt(12, 34, 0).unwrap());
        assert_eq!(end, NaiveTime::from_hms_micro_opt(12, 34, 59, 999_999).unwrap());
    }

    #[test]
    fn window_at_end_of_day() {
        let now = NaiveTime::from_hms_opt(23, 59, 10).unwrap();
        let (start, end) = minute_window(now).unwrap();
        assert!(start < end);
        assert_eq!(start.hour(), 23);
        assert_eq!(end.minute(), 59);
    }
}
