use hiibox_db_entity::db::*;
use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20250901_000004_create_table"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(reward_box::Entity)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(reward_box::Column::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(reward_box::Column::Position)
                            .integer()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(reward_box::Column::RewardType)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(reward_box::Column::RewardTier).string())
                    .col(
                        ColumnDef::new(reward_box::Column::RewardData)
                            .json_binary()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(reward_box::Column::RewardDescription)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(reward_box::Column::Claimed)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(reward_box::Column::ClaimedByUserId).integer())
                    .col(ColumnDef::new(reward_box::Column::ClaimedAt).big_integer())
                    .col(
                        ColumnDef::new(reward_box::Column::CreatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(reward_box::Column::Deleted)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_reward_box_claimed_by_user_id")
                            .from(reward_box::Entity, reward_box::Column::ClaimedByUserId)
                            .to(users::Entity, users::Column::Id),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(reward_box::Entity).to_owned())
            .await
    }
}
