//! Key balance derived from a user's social links and unused NFT records.
//! Nothing here writes; `users.key_count` is the counter claims spend.

use hiibox_db_entity::db::user_social::{Column as SocialColumn, Entity as UserSocial};
use sea_orm::{ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter};
use std::collections::BTreeSet;
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter};

use crate::accounts::count_unused_nfts;

const NFT_KEY_FLOOR: i32 = 2;
const NFT_KEY_CAP: i32 = 10;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Display, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum RequiredPlatform {
    Twitter,
    Discord,
    Telegram,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyBalance {
    pub social_keys: i32,
    pub nft_keys: i32,
    pub total: i32,
    pub detail: KeyDetail,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyDetail {
    pub linked_platforms: Vec<String>,
    pub required_platforms: Vec<String>,
    pub social_task_complete: bool,
    pub unused_nfts: i64,
}

impl KeyBalance {
    pub fn new<I, S>(platforms: I, unused_nfts: i64) -> KeyBalance
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let linked: BTreeSet<String> = platforms
            .into_iter()
            .map(|platform| platform.as_ref().trim().to_lowercase())
            .collect();
        let social_keys = social_keys(&linked);
        let nft_keys = nft_keys(unused_nfts);
        KeyBalance {
            social_keys,
            nft_keys,
            total: social_keys + nft_keys,
            detail: KeyDetail {
                linked_platforms: linked.into_iter().collect(),
                required_platforms: RequiredPlatform::iter()
                    .map(|platform| platform.to_string())
                    .collect(),
                social_task_complete: social_keys > 0,
                unused_nfts,
            },
        }
    }
}

/// One key once every required platform is linked, none before.
pub fn social_keys(linked: &BTreeSet<String>) -> i32 {
    let complete = RequiredPlatform::iter().all(|platform| linked.contains(&platform.to_string()));
    i32::from(complete)
}

pub fn nft_keys(unused_nfts: i64) -> i32 {
    match unused_nfts {
        n if n <= 0 => 0,
        1 => NFT_KEY_FLOOR,
        n => n.min(NFT_KEY_CAP as i64) as i32,
    }
}

pub async fn available_keys<C>(db: &C, user_id: i32) -> Result<KeyBalance, DbErr>
where
    C: ConnectionTrait,
{
    let platforms: Vec<String> = UserSocial::find()
        .filter(SocialColumn::UserId.eq(user_id))
        .filter(SocialColumn::Deleted.eq(false))
        .all(db)
        .await?
        .into_iter()
        .map(|social| social.platform)
        .collect();
    let unused_nfts = count_unused_nfts(db, user_id).await?;

    Ok(KeyBalance::new(platforms, unused_nfts))
}

#[cfg(test)]
mod tests {
    use super::*;
    use hiibox_db_entity::db::user_social::Model as UserSocialModel;
    use sea_orm::{DatabaseBackend, MockDatabase, Value};
    use std::collections::BTreeMap;

    fn social(id: i32, platform: &str) -> UserSocialModel {
        UserSocialModel {
            id,
            user_id: 7,
            platform: platform.to_owned(),
            handle: format!("hii_{}", id),
            created_at: 1_700_000_000,
            deleted: false,
        }
    }

    #[test]
    fn social_key_is_a_step_function() {
        assert_eq!(KeyBalance::new(["twitter", "discord"], 0).social_keys, 0);
        assert_eq!(
            KeyBalance::new(["twitter", "discord", "telegram"], 0).social_keys,
            1
        );
        assert_eq!(
            KeyBalance::new(["twitter", "discord", "telegram", "instagram"], 0).social_keys,
            1
        );
    }

    #[test]
    fn duplicate_platforms_count_once() {
        let balance = KeyBalance::new(["twitter", "Twitter", "discord", "discord"], 0);
        assert_eq!(balance.social_keys, 0);
        assert_eq!(balance.detail.linked_platforms, vec!["discord", "twitter"]);
    }

    #[test]
    fn nft_keys_have_floor_and_cap() {
        assert_eq!(nft_keys(0), 0);
        assert_eq!(nft_keys(1), 2);
        assert_eq!(nft_keys(2), 2);
        assert_eq!(nft_keys(5), 5);
        assert_eq!(nft_keys(15), 10);
    }

    #[test]
    fn total_adds_both_sources() {
        let balance = KeyBalance::new(["twitter", "discord", "telegram"], 1);
        assert_eq!(balance.total, 3);
        assert!(balance.detail.social_task_complete);
        assert_eq!(
            balance.detail.required_platforms,
            vec!["twitter", "discord", "telegram"]
        );
    }

    #[tokio::test]
    async fn reads_links_and_unused_nfts() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![vec![
                social(1, "twitter"),
                social(2, "discord"),
                social(3, "telegram"),
            ]])
            .append_query_results(vec![vec![BTreeMap::from([(
                "unused_count",
                Value::BigInt(Some(4)),
            )])]])
            .into_connection();

        let balance = available_keys(&db, 7).await.unwrap();
        assert_eq!(balance.social_keys, 1);
        assert_eq!(balance.nft_keys, 4);
        assert_eq!(balance.total, 5);
    }
}
