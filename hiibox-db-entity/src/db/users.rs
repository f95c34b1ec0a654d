use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users", schema_name = "public")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub wallet_address: String,
    // running counter, decremented once per opened box
    pub key_count: i32,
    pub created_at: i64,
    pub updated_at: Option<i64>,
    pub deleted: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::user_nft::Entity")]
    UserNft,
    #[sea_orm(has_many = "super::user_social::Entity")]
    UserSocial,
}

impl Related<super::user_nft::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UserNft.def()
    }
}

impl Related<super::user_social::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UserSocial.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
