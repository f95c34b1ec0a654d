use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "reward_box", schema_name = "public")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub position: i32,
    pub reward_type: String,
    pub reward_tier: Option<String>,
    #[sea_orm(column_type = "JsonBinary")]
    pub reward_data: Json,
    pub reward_description: String,
    pub claimed: bool,
    pub claimed_by_user_id: Option<i32>,
    pub claimed_at: Option<i64>,
    pub created_at: i64,
    pub deleted: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::ClaimedByUserId",
        to = "super::users::Column::Id"
    )]
    ClaimedBy,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ClaimedBy.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
