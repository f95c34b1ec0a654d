use hiibox_db_entity::db::*;
use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20250901_000002_create_table"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(user_nft::Entity)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(user_nft::Column::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(user_nft::Column::UserId).integer().not_null())
                    .col(
                        ColumnDef::new(user_nft::Column::NftCollection)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(user_nft::Column::NftId).string().not_null())
                    .col(
                        ColumnDef::new(user_nft::Column::Used)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(user_nft::Column::CreatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(user_nft::Column::Deleted)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_nft_user_id")
                            .from(user_nft::Entity, user_nft::Column::UserId)
                            .to(users::Entity, users::Column::Id),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(user_nft::Entity).to_owned())
            .await
    }
}
