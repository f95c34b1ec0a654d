use hiibox_db_entity::db::reward_box::Model as RewardBoxModel;
use hiibox_db_entity::db::user_nft::Model as UserNftModel;
use hiibox_db_entity::db::user_social::Model as UserSocialModel;
use hiibox_db_entity::db::users::Model as UserModel;
use rocket::serde::json::Value;
use rocket::serde::{Deserialize, Serialize};

use crate::accounts::ActivityCounts;
use crate::claim::ClaimReceipt;
use crate::ledger::KeyBalance;
use crate::reward_pool::AvailableRewards;

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(crate = "rocket::serde")]
pub struct RewardDetails {
    pub position: i32,
    pub reward_type: Option<String>,
    pub reward_tier: Option<String>,
    pub reward_data: Option<Value>,
    pub reward_description: Option<String>,
    pub claimed: bool,
    pub claimed_at: Option<i64>,
}

impl RewardDetails {
    /// Contents are only filled in when `reveal` is set; other callers just
    /// learn whether the box is still closed.
    pub fn new(reward: &RewardBoxModel, reveal: bool) -> RewardDetails {
        if !reveal {
            return RewardDetails {
                position: reward.position,
                reward_type: None,
                reward_tier: None,
                reward_data: None,
                reward_description: None,
                claimed: reward.claimed,
                claimed_at: reward.claimed_at,
            };
        }
        RewardDetails {
            position: reward.position,
            reward_type: Some(reward.reward_type.to_owned()),
            reward_tier: reward.reward_tier.to_owned(),
            reward_data: Some(reward.reward_data.to_owned()),
            reward_description: Some(reward.reward_description.to_owned()),
            claimed: reward.claimed,
            claimed_at: reward.claimed_at,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(crate = "rocket::serde")]
pub struct KeyBalanceData {
    pub key_count: i32,
    pub social_keys: i32,
    pub nft_keys: i32,
    pub total: i32,
    pub linked_platforms: Vec<String>,
    pub required_platforms: Vec<String>,
    pub social_task_complete: bool,
    pub unused_nfts: i64,
}

impl KeyBalanceData {
    pub fn new(key_count: i32, balance: KeyBalance) -> KeyBalanceData {
        KeyBalanceData {
            key_count,
            social_keys: balance.social_keys,
            nft_keys: balance.nft_keys,
            total: balance.total,
            linked_platforms: balance.detail.linked_platforms,
            required_platforms: balance.detail.required_platforms,
            social_task_complete: balance.detail.social_task_complete,
            unused_nfts: balance.detail.unused_nfts,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(crate = "rocket::serde")]
pub struct ClaimReceiptData {
    pub reward: RewardDetails,
    pub key_source: String,
    pub consumed_nft_id: Option<i32>,
    pub keys_remaining: i32,
    pub balance: KeyBalanceData,
}

impl ClaimReceiptData {
    pub fn new(receipt: ClaimReceipt) -> ClaimReceiptData {
        ClaimReceiptData {
            reward: RewardDetails::new(&receipt.reward, true),
            key_source: receipt.key_source.to_string(),
            consumed_nft_id: receipt.consumed_nft_id,
            keys_remaining: receipt.keys_remaining,
            balance: KeyBalanceData::new(receipt.keys_remaining, receipt.balance),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(crate = "rocket::serde")]
pub struct MyRewardsData {
    pub total: usize,
    pub rewards: Vec<RewardDetails>,
}

impl MyRewardsData {
    pub fn new(rewards: &[RewardBoxModel]) -> MyRewardsData {
        MyRewardsData {
            total: rewards.len(),
            rewards: rewards
                .iter()
                .map(|reward| RewardDetails::new(reward, true))
                .collect(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(crate = "rocket::serde")]
pub struct AvailableRewardsData {
    pub positions: Vec<i32>,
    pub total_available: i64,
}

impl AvailableRewardsData {
    pub fn new(available: AvailableRewards) -> AvailableRewardsData {
        AvailableRewardsData {
            positions: available.positions,
            total_available: available.total_available,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(crate = "rocket::serde")]
pub struct CampaignStatus {
    pub user_id: i32,
    pub wallet_address: String,
    pub key_count: i32,
    pub nft_count: i64,
    pub unused_nft_count: i64,
    pub social_count: i64,
    pub boxes_opened: i64,
    pub social_verified: bool,
    pub nft_verified: bool,
    pub created_at: i64,
    pub updated_at: Option<i64>,
}

impl CampaignStatus {
    pub fn new(user: &UserModel, counts: ActivityCounts) -> CampaignStatus {
        CampaignStatus {
            user_id: user.id,
            wallet_address: user.wallet_address.to_owned(),
            key_count: user.key_count,
            nft_count: counts.nft_count,
            unused_nft_count: counts.unused_nft_count,
            social_count: counts.social_count,
            boxes_opened: counts.boxes_opened,
            social_verified: counts.social_count > 0,
            nft_verified: counts.nft_count > 0,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(crate = "rocket::serde")]
pub struct UserProfile {
    pub id: i32,
    pub wallet_address: String,
    pub key_count: i32,
    pub created_at: i64,
}

impl UserProfile {
    pub fn new(user: &UserModel) -> UserProfile {
        UserProfile {
            id: user.id,
            wallet_address: user.wallet_address.to_owned(),
            key_count: user.key_count,
            created_at: user.created_at,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(crate = "rocket::serde")]
pub struct NftRecord {
    pub id: i32,
    pub nft_collection: String,
    pub nft_id: String,
    pub used: bool,
    pub created_at: i64,
}

impl NftRecord {
    pub fn new(nft: &UserNftModel) -> NftRecord {
        NftRecord {
            id: nft.id,
            nft_collection: nft.nft_collection.to_owned(),
            nft_id: nft.nft_id.to_owned(),
            used: nft.used,
            created_at: nft.created_at,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(crate = "rocket::serde")]
pub struct SocialLink {
    pub id: i32,
    pub platform: String,
    pub handle: String,
    pub created_at: i64,
}

impl SocialLink {
    pub fn new(social: &UserSocialModel) -> SocialLink {
        SocialLink {
            id: social.id,
            platform: social.platform.to_owned(),
            handle: social.handle.to_owned(),
            created_at: social.created_at,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(crate = "rocket::serde")]
pub struct LinkSocialRequest {
    pub platform: String,
    pub handle: String,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(crate = "rocket::serde")]
pub struct HandleAvailability {
    pub platform: String,
    pub handle: String,
    pub available: bool,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(crate = "rocket::serde")]
pub struct ResponseData<T> {
    pub code: Option<u16>,
    #[serde(rename = "statusCode")]
    pub status_code: Option<u16>,
    pub message: String,
    pub data: Option<T>,
}

impl<T> ResponseData<T> {
    pub fn new(code: u16, message: String, data: Option<T>) -> ResponseData<T> {
        ResponseData {
            code: Some(code),
            status_code: None,
            message,
            data,
        }
    }
}

pub const RESPONSE_OK: u16 = 200;
pub const RESPONSE_BAD_REQUEST: u16 = 400;
pub const RESPONSE_UNAUTHORIZED: u16 = 401;
pub const RESPONSE_INSUFFICIENT_KEYS: u16 = 403;
pub const RESPONSE_NOT_FOUND: u16 = 404;
pub const RESPONSE_CONFLICT: u16 = 409;
pub const RESPONSE_GONE: u16 = 410;
pub const RESPONSE_INTERNAL_ERROR: u16 = 500;
pub const RESPONSE_UNAVAILABLE: u16 = 503;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reward_pool::tests::reward;

    #[test]
    fn hides_contents_from_other_users() {
        let details = RewardDetails::new(&reward(5, 5, Some(7)), false);
        assert_eq!(details.position, 5);
        assert!(details.claimed);
        assert_eq!(details.reward_type, None);
        assert_eq!(details.reward_data, None);

        let details = RewardDetails::new(&reward(5, 5, Some(7)), true);
        assert_eq!(details.reward_type.as_deref(), Some("standard_nft"));
        assert_eq!(
            details.reward_data,
            Some(rocket::serde::json::json!({ "nft_id": "standard_00005" }))
        );
    }

    #[test]
    fn campaign_status_flags_follow_counts() {
        let user = UserModel {
            id: 7,
            wallet_address: "0x7e57000000000000000000000000000000000007".to_owned(),
            key_count: 1,
            created_at: 1_690_000_000,
            updated_at: None,
            deleted: false,
        };
        let status = CampaignStatus::new(
            &user,
            ActivityCounts {
                nft_count: 0,
                unused_nft_count: 0,
                social_count: 3,
                boxes_opened: 2,
            },
        );
        assert!(status.social_verified);
        assert!(!status.nft_verified);
        assert_eq!(status.boxes_opened, 2);
        assert_eq!(status.key_count, 1);
    }

    #[test]
    fn envelope_uses_status_code_key() {
        let response = ResponseData::<String>::new(RESPONSE_GONE, "gone".to_owned(), None);
        let body = rocket::serde::json::to_string(&response).unwrap();
        assert!(body.contains("\"statusCode\":null"));
        assert!(body.contains("\"code\":410"));
    }
}
