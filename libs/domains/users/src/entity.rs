use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Sea-ORM Entity for the users table
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub user_name: String,
    pub email: String,
    pub password: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

// Conversion from Sea-ORM Model to domain User
impl From<Model> for crate::models::User {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            first_name: model.first_name,
            last_name: model.last_name,
            user_name: model.user_name,
            email: model.email,
            password: model.password,
        }
    }
}

// Conversion from domain CreateUser to Sea-ORM ActiveModel
// The id stays unset so the database assigns the next sequence value
impl From<crate::models::CreateUser> for ActiveModel {
    fn from(input: crate::models::CreateUser) -> Self {
        ActiveModel {
            id: NotSet,
            first_name: Set(input.first_name),
            last_name: Set(input.last_name),
            user_name: Set(input.user_name),
            email: Set(input.email),
            password: Set(input.password),
        }
    }
}
