//! Users table.
//!
//! Habits and profiles reference a user by `username`.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub username: String,
    pub password: String,
    pub email: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::habits::Entity")]
    Habits,
    #[sea_orm(has_one = "super::user_profiles::Entity")]
    Profile,
}

impl Related<super::habits::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Habits.def()
    }
}

impl Related<super::user_profiles::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Profile.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
