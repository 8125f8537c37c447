use std::sync::{Arc, Mutex};

use chrono::NaiveTime;
use sea_orm::Database;

use engine::{
    DispatchError, Dispatcher, Engine, HabitDraft, Notification, NotificationChannel,
    ReminderScheduler, RetryPolicy,
};
use migration::MigratorTrait;

#[derive(Clone, Default)]
struct Recording {
    sent: Arc<Mutex<Vec<Notification>>>,
}

impl NotificationChannel for Recording {
    async fn send(&self, destination: &str, message: &str) -> Result<(), DispatchError> {
        self.sent
            .lock()
            .unwrap()
            .push(Notification::new(destination, message));
        Ok(())
    }
}

async fn engine_with_db() -> Engine {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder().database(db).build().await.unwrap();
    for user in ["alice", "bob"] {
        engine.register_user(user, "password", None).await.unwrap();
    }
    engine
}

fn at(hour: u32, minute: u32, second: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, second).unwrap()
}

async fn add_habit(engine: &Engine, user: &str, time: NaiveTime, action: &str) {
    engine
        .create_habit(user, HabitDraft::new("Home", time, action, 60))
        .await
        .unwrap();
}

#[tokio::test]
async fn due_habit_with_linked_chat_is_reminded() {
    let engine = engine_with_db().await;
    engine.set_telegram_chat_id("alice", "12345").await.unwrap();
    add_habit(&engine, "alice", at(9, 0, 0), "Read a book").await;
    add_habit(&engine, "alice", at(9, 1, 0), "Stretch").await;

    let due = engine.due_reminders(at(9, 0, 0)).await.unwrap();
    assert_eq!(
        due,
        vec![Notification::new(
            "12345",
            "Reminder: time for habit 'Read a book'"
        )]
    );
}

#[tokio::test]
async fn owner_without_chat_is_skipped() {
    let engine = engine_with_db().await;
    engine.set_telegram_chat_id("alice", "12345").await.unwrap();
    add_habit(&engine, "alice", at(9, 0, 0), "Read a book").await;
    add_habit(&engine, "bob", at(9, 0, 0), "Run").await;

    let due = engine.due_reminders(at(9, 0, 0)).await.unwrap();
    assert_eq!(due.len(), 1);
    assert_eq!(due[0].destination, "12345");
}

#[tokio::test]
async fn nothing_due_yields_no_reminders() {
    let engine = engine_with_db().await;
    engine.set_telegram_chat_id("alice", "12345").await.unwrap();
    add_habit(&engine, "alice", at(9, 0, 0), "Read a book").await;

    assert!(engine.due_reminders(at(10, 0, 0)).await.unwrap().is_empty());
}

#[tokio::test]
async fn seconds_are_ignored() {
    let engine = engine_with_db().await;
    engine.set_telegram_chat_id("alice", "12345").await.unwrap();
    add_habit(&engine, "alice", at(9, 0, 30), "Read a book").await;

    assert_eq!(engine.due_reminders(at(9, 0, 0)).await.unwrap().len(), 1);
    assert_eq!(engine.due_reminders(at(9, 0, 59)).await.unwrap().len(), 1);
    assert!(engine.due_reminders(at(9, 1, 0)).await.unwrap().is_empty());
}

#[tokio::test]
async fn run_once_hands_reminders_to_the_dispatcher() {
    let engine = engine_with_db().await;
    engine.set_telegram_chat_id("alice", "12345").await.unwrap();
    engine.set_telegram_chat_id("bob", "@bob_channel").await.unwrap();
    add_habit(&engine, "alice", at(7, 30, 0), "Meditate").await;
    add_habit(&engine, "bob", at(7, 30, 0), "Run").await;

    let channel = Recording::default();
    let sent = Arc::clone(&channel.sent);
    let (dispatcher, worker) = Dispatcher::spawn(channel, RetryPolicy::default());
    let scheduler = ReminderScheduler::new(engine, dispatcher);

    let queued = scheduler.run_once(at(7, 30, 42)).await.unwrap();
    assert_eq!(queued, 2);

    drop(scheduler);
    worker.await.unwrap();

    let mut sent = sent.lock().unwrap().clone();
    sent.sort_by(|a, b| a.destination.cmp(&b.destination));
    assert_eq!(
        sent,
        vec![
            Notification::new("12345", "Reminder: time for habit 'Meditate'"),
            Notification::new("@bob_channel", "Reminder: time for habit 'Run'"),
        ]
    );
}
