//! Initial schema migration.
//!
//! - `users`: authentication
//! - `habits`: habit records, with an optional self-reference to a pleasant habit
//! - `user_profiles`: per-user notification settings (Telegram chat id)

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// ─────────────────────────────────────────────────────────────────────────────
// Table identifiers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Iden)]
enum Users {
    Table,
    Username,
    Password,
    Email,
}

#[derive(Iden)]
enum Habits {
    Table,
    Id,
    UserId,
    Place,
    Time,
    Action,
    IsPleasant,
    RelatedHabitId,
    Frequency,
    Reward,
    Duration,
    IsPublic,
}

#[derive(Iden)]
enum UserProfiles {
    Table,
    UserId,
    TelegramChatId,
}

// ─────────────────────────────────────────────────────────────────────────────
// Migration implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // 1. Users
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Users::Username)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Users::Password).string().not_null())
                    .col(ColumnDef::new(Users::Email).string())
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 2. Habits
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Habits::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Habits::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Habits::UserId).string().not_null())
                    .col(ColumnDef::new(Habits::Place).string_len(100).not_null())
                    .col(ColumnDef::new(Habits::Time).time().not_null())
                    .col(ColumnDef::new(Habits::Action).string_len(255).not_null())
                    .col(
                        ColumnDef::new(Habits::IsPleasant)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Habits::RelatedHabitId).uuid())
                    .col(
                        ColumnDef::new(Habits::Frequency)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(
                        ColumnDef::new(Habits::Reward)
                            .string_len(255)
                            .not_null()
                            .default(""),
                    )
                    .col(ColumnDef::new(Habits::Duration).integer().not_null())
                    .col(
                        ColumnDef::new(Habits::IsPublic)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-habits-user_id")
                            .from(Habits::Table, Habits::UserId)
                            .to(Users::Table, Users::Username)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-habits-related_habit_id")
                            .from(Habits::Table, Habits::RelatedHabitId)
                            .to(Habits::Table, Habits::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-habits-user_id")
                    .table(Habits::Table)
                    .col(Habits::UserId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-habits-time")
                    .table(Habits::Table)
                    .col(Habits::Time)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-habits-is_public")
                    .table(Habits::Table)
                    .col(Habits::IsPublic)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 3. User profiles
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(UserProfiles::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(UserProfiles::UserId)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(UserProfiles::TelegramChatId).string_len(100))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-user_profiles-user_id")
                            .from(UserProfiles::Table, UserProfiles::UserId)
                            .to(Users::Table, Users::Username)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop in reverse order of creation (respecting FK dependencies)
        manager
            .drop_table(Table::drop().table(UserProfiles::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Habits::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;
        Ok(())
    }
}
