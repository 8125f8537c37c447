use std::{error::Error, io::Write, time::Duration};

use chrono::NaiveTime;
use chrono_tz::Tz;
use clap::{Args, Parser, Subcommand};
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    style::Print,
    terminal,
    terminal::ClearType,
};
use engine::{Dispatcher, Engine, EngineError, ReminderScheduler, RetryPolicy};
use migration::MigratorTrait;
use sea_orm::{Database, DatabaseConnection};
use telegram_bot::{TelegramChannel, TelegramConfig};

#[derive(Parser, Debug)]
#[command(name = "habits_admin")]
#[command(about = "Admin utilities for the habit tracker (users, reminder passes)")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "sqlite:./habits.db?mode=rwc"
    )]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    User(User),
    Reminders(Reminders),
}

#[derive(Args, Debug)]
struct User {
    #[command(subcommand)]
    command: UserCommand,
}

#[derive(Subcommand, Debug)]
enum UserCommand {
    Create(UserCreateArgs),
    /// Link a Telegram chat to an existing user.
    LinkTelegram(LinkTelegramArgs),
}

#[derive(Args, Debug)]
struct UserCreateArgs {
    #[arg(long)]
    username: String,
    #[arg(long)]
    email: Option<String>,
}

#[derive(Args, Debug)]
struct LinkTelegramArgs {
    #[arg(long)]
    username: String,
    #[arg(long)]
    chat_id: String,
}

#[derive(Args, Debug)]
struct Reminders {
    #[command(subcommand)]
    command: RemindersCommand,
}

#[derive(Subcommand, Debug)]
enum RemindersCommand {
    /// Run a single reminder pass and wait for its deliveries.
    RunOnce(RunOnceArgs),
}

#[derive(Args, Debug)]
struct RunOnceArgs {
    /// Telegram bot token (also read from `TELEGRAM_TOKEN`).
    #[arg(long, env = "TELEGRAM_TOKEN", hide_env_values = true)]
    token: String,
    /// Minute to run the pass for (`HH:MM`); defaults to now.
    #[arg(long)]
    at: Option<NaiveTime>,
    #[arg(long, default_value = "UTC")]
    timezone: Tz,
    #[arg(long, default_value_t = 3)]
    max_attempts: u32,
    #[arg(long, default_value_t = 5)]
    backoff_secs: u64,
}

struct RawModeGuard;

impl RawModeGuard {
    fn enter() -> Result<Self, Box<dyn Error + Send + Sync>> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

fn prompt_password(prompt: &str) -> Result<String, Box<dyn Error + Send + Sync>> {
    let _raw = RawModeGuard::enter()?;

    let mut out = std::io::stderr();
    execute!(
        out,
        cursor::MoveToColumn(0),
        terminal::Clear(ClearType::CurrentLine),
        Print(prompt)
    )?;
    out.flush()?;

    let mut buf = String::new();
    loop {
        let Event::Key(KeyEvent {
            code, modifiers, ..
        }) = event::read()?
        else {
            continue;
        };

        match code {
            KeyCode::Enter => {
                execute!(out, Print("\r\n"))?;
                out.flush()?;
                break;
            }
            KeyCode::Backspace => {
                if buf.pop().is_some() {
                    execute!(out, cursor::MoveLeft(1), Print(" "), cursor::MoveLeft(1))?;
                    out.flush()?;
                }
            }
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                execute!(out, Print("\r\n"))?;
                out.flush()?;
                return Err("interrupted".into());
            }
            KeyCode::Char(ch) if !modifiers.contains(KeyModifiers::CONTROL) => {
                buf.push(ch);
                execute!(out, Print("*"))?;
                out.flush()?;
            }
            _ => {}
        }
    }

    Ok(buf)
}

fn prompt_password_twice() -> Result<String, Box<dyn Error + Send + Sync>> {
    let mut out = std::io::stderr();
    for _ in 0..3 {
        let p1 = prompt_password("Password: ")?;
        if p1.is_empty() {
            execute!(
                out,
                cursor::MoveToColumn(0),
                terminal::Clear(ClearType::CurrentLine),
                Print("Password must not be empty.\r\n")
            )?;
            continue;
        }

        let p2 = prompt_password("Confirm password: ")?;
        if p1 == p2 {
            return Ok(p1);
        }

        execute!(
            out,
            cursor::MoveToColumn(0),
            terminal::Clear(ClearType::CurrentLine),
            Print("Passwords do not match. Try again.\r\n")
        )?;
    }

    Err("too many attempts".into())
}

async fn connect_db(
    database_url: &str,
) -> Result<DatabaseConnection, Box<dyn Error + Send + Sync>> {
    let db = Database::connect(database_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

async fn run_once(
    engine: Engine,
    args: RunOnceArgs,
) -> Result<usize, Box<dyn Error + Send + Sync>> {
    let config = TelegramConfig::new(&args.token);
    let policy = RetryPolicy {
        max_attempts: args.max_attempts,
        backoff: Duration::from_secs(args.backoff_secs),
    };
    let (dispatcher, worker) = Dispatcher::spawn(TelegramChannel::new(&config), policy);

    let scheduler = ReminderScheduler::new(engine, dispatcher).timezone(args.timezone);
    let now = args.at.unwrap_or_else(|| scheduler.local_now());
    let queued = scheduler.run_once(now).await?;

    drop(scheduler);
    worker.await?;
    Ok(queued)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter("habits_admin=info,engine=info,telegram_bot=info")
        .with_writer(std::io::stderr)
        .init();

    let db = connect_db(&cli.database_url).await?;
    let engine = Engine::builder().database(db).build().await?;

    match cli.command {
        Command::User(User {
            command: UserCommand::Create(args),
        }) => {
            let password = prompt_password_twice()?;

            match engine
                .register_user(&args.username, &password, args.email.as_deref())
                .await
            {
                Ok(()) => println!("created user: {}", args.username),
                Err(EngineError::ExistingKey(username)) => {
                    eprintln!("user already exists: {username}");
                    std::process::exit(1);
                }
                Err(err) => return Err(err.into()),
            }
        }
        Command::User(User {
            command: UserCommand::LinkTelegram(args),
        }) => {
            if let Err(err) = engine
                .set_telegram_chat_id(&args.username, &args.chat_id)
                .await
            {
                eprintln!("{err}");
                std::process::exit(1);
            }
            println!("linked chat {} to {}", args.chat_id.trim(), args.username);
        }
        Command::Reminders(Reminders {
            command: RemindersCommand::RunOnce(args),
        }) => {
            let queued = run_once(engine, args).await?;
            println!("reminder pass done: {queued} notifications queued");
        }
    }

    Ok(())
}
