use sea_orm::{Database, EntityTrait};

use engine::{Engine, EngineError, users};
use migration::MigratorTrait;

async fn engine_with_db() -> Engine {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    Engine::builder().database(db).build().await.unwrap()
}

#[tokio::test]
async fn register_and_authenticate() {
    let engine = engine_with_db().await;
    engine
        .register_user(" alice ", "secret", Some("alice@example.com"))
        .await
        .unwrap();

    let user = engine.authenticate("alice", "secret").await.unwrap().unwrap();
    assert_eq!(user.username, "alice");
    assert_eq!(user.email.as_deref(), Some("alice@example.com"));

    assert!(engine.authenticate("alice", "wrong").await.unwrap().is_none());
    assert!(engine.authenticate("bob", "secret").await.unwrap().is_none());
}

#[tokio::test]
async fn duplicate_username_is_rejected() {
    let engine = engine_with_db().await;
    engine.register_user("alice", "secret", None).await.unwrap();

    assert_eq!(
        engine.register_user("alice", "other", None).await,
        Err(EngineError::ExistingKey("alice".to_string()))
    );
}

#[tokio::test]
async fn empty_credentials_are_rejected() {
    let engine = engine_with_db().await;
    assert!(matches!(
        engine.register_user("  ", "secret", None).await,
        Err(EngineError::InvalidInput(_))
    ));
    assert!(matches!(
        engine.register_user("alice", "", None).await,
        Err(EngineError::InvalidInput(_))
    ));
}

#[tokio::test]
async fn telegram_chat_id_is_upserted() {
    let engine = engine_with_db().await;
    engine.register_user("alice", "secret", None).await.unwrap();
    assert_eq!(engine.profile("alice").await.unwrap(), None);

    engine.set_telegram_chat_id("alice", "12345").await.unwrap();
    let profile = engine.profile("alice").await.unwrap().unwrap();
    assert_eq!(profile.chat_id(), Some("12345"));

    engine.set_telegram_chat_id("alice", " 67890 ").await.unwrap();
    let profile = engine.profile("alice").await.unwrap().unwrap();
    assert_eq!(profile.chat_id(), Some("67890"));
}

#[tokio::test]
async fn telegram_chat_id_must_not_be_empty() {
    let engine = engine_with_db().await;
    engine.register_user("alice", "secret", None).await.unwrap();

    assert!(matches!(
        engine.set_telegram_chat_id("alice", "   ").await,
        Err(EngineError::InvalidInput(_))
    ));
    assert_eq!(
        engine.set_telegram_chat_id("ghost", "12345").await,
        Err(EngineError::KeyNotFound("user not exists".to_string()))
    );
}

#[tokio::test]
async fn password_is_stored_hashed() {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder().database(db.clone()).build().await.unwrap();
    engine.register_user("alice", "hunter2", None).await.unwrap();

    let stored = users::Entity::find_by_id("alice".to_string())
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert_ne!(stored.password, "hunter2");
    assert!(stored.password.starts_with("$argon2id$"));

    assert!(engine.authenticate("alice", "hunter2").await.unwrap().is_some());
    assert!(engine.authenticate("alice", &stored.password).await.unwrap().is_none());
}
