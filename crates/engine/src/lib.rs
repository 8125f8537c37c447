//! Habit tracking engine.
//!
//! The crate holds the habit records and their consistency rules, the
//! user notification profiles and the reminder pipeline (scheduler and
//! dispatcher). Storage goes through sea-orm.

pub use error::{DispatchError, EngineError, ValidationErrors};
pub use habits::{Habit, HabitDraft, HabitPatch};
pub use notify::{Dispatcher, Notification, NotificationChannel, RetryPolicy};
pub use ops::{DEFAULT_PAGE_SIZE, Engine, EngineBuilder, MAX_PAGE_SIZE, Page, PageRequest};
pub use reminders::ReminderScheduler;

mod error;
pub mod habits;
pub mod notify;
mod ops;
mod password;
pub mod reminders;
pub mod user_profiles;
pub mod users;
pub mod validation;

type ResultEngine<T> = Result<T, EngineError>;
