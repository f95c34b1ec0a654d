use hiibox_db_entity::db::*;
use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20250901_000003_create_table"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(user_social::Entity)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(user_social::Column::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(user_social::Column::UserId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(user_social::Column::Platform)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(user_social::Column::Handle)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(user_social::Column::CreatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(user_social::Column::Deleted)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_social_user_id")
                            .from(user_social::Entity, user_social::Column::UserId)
                            .to(users::Entity, users::Column::Id),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(user_social::Entity).to_owned())
            .await
    }
}
