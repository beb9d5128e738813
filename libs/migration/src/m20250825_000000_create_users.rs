use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create users table
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(pk_auto(Users::Id))
                    .col(string_null(Users::FirstName))
                    .col(string_null(Users::LastName))
                    .col(string(Users::UserName))
                    .col(string(Users::Email))
                    .col(string(Users::Password))
                    .to_owned(),
            )
            .await?;

        // Non-unique lookup index; usernames are not required to be unique
        manager
            .create_index(
                Index::create()
                    .name("idx_users_user_name")
                    .table(Users::Table)
                    .col(Users::UserName)
                    .to_owned(),
            )
            .await?;

        // Case-insensitive uniqueness on email. Expression indexes are not
        // expressible through the schema builder, so use raw SQL.
        manager
            .get_connection()
            .execute_unprepared(
                "CREATE UNIQUE INDEX IF NOT EXISTS idx_users_email_lower ON users ((LOWER(email)))",
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    FirstName,
    LastName,
    UserName,
    Email,
    Password,
}
