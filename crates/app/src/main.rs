use migration::{Migrator, MigratorTrait};
use settings::Database;

mod settings;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let settings = settings::Settings::new()?;
    let mut tasks = tokio::task::JoinSet::new();

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "habits={level},telegram_bot={level},server={level},engine={level}",
            level = settings.app.level
        ))
        .init();

    let Some(server) = settings.server else {
        tracing::error!("no [server] settings found, nothing to run");
        return Ok(());
    };

    // Checked before any task starts.
    let telegram = match settings.telegram {
        Some(telegram) => {
            tracing::info!("Found telegram settings...");
            let config = telegram_bot::TelegramConfig::new(&telegram.token);
            let bot = telegram_bot::Bot::builder().token(&config.token).build()?;
            let timezone = settings.scheduler.timezone()?;
            Some((config, bot, timezone))
        }
        None => None,
    };

    tracing::info!("Found server settings...");
    let db = parse_database(&server.database).await?;
    let engine = engine::Engine::builder().database(db).build().await?;

    let bind = server.bind.unwrap_or_else(|| "127.0.0.1".to_string());
    let addr = format!("{}:{}", bind, server.port);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let server_engine = engine.clone();
    tasks.spawn(async move {
        if let Err(err) = server::run_with_listener(server_engine, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    if let Some((config, bot, timezone)) = telegram {
        let (dispatcher, worker) = engine::Dispatcher::spawn(
            telegram_bot::TelegramChannel::new(&config),
            settings.scheduler.retry_policy(),
        );
        let scheduler = engine::ReminderScheduler::new(engine, dispatcher).timezone(timezone);
        tasks.spawn(scheduler.run());
        tasks.spawn(async move {
            if let Err(err) = worker.await {
                tracing::error!("notification dispatcher failed: {err}");
            }
        });
        tasks.spawn(async move { bot.run().await });
    } else {
        tracing::warn!("no [telegram] settings found, reminders are disabled");
    }

    while tasks.join_next().await.is_some() {
        tasks.shutdown().await;
    }

    Ok(())
}

async fn parse_database(
    config: &settings::Database,
) -> Result<sea_orm::DatabaseConnection, Box<dyn std::error::Error + Send + Sync>> {
    let url = match config {
        Database::Memory => String::from("sqlite::memory:"),
        Database::Sqlite(path) => format!("sqlite:{}?mode=rwc", path),
    };

    let database = sea_orm::Database::connect(url).await?;
    Migrator::up(&database, None).await?;
    Ok(database)
}
