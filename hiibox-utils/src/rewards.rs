//! The fixed prize table and the seeded shuffle that assigns prizes to
//! box positions.

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use thiserror::Error;

pub const POOL_SIZE: usize = 50_000;
pub const DEFAULT_SEED: u64 = 42;

pub const STANDARD_NFT: &str = "standard_nft";
pub const APECOIN: &str = "apecoin";
pub const RARE_NFT: &str = "rare_nft";
pub const APEFEST_TICKET: &str = "apefest_ticket";

const STANDARD_NFT_QUANTITY: usize = 45_000;
const RARE_NFT_QUANTITY: usize = 999;
const APEFEST_TICKET_QUANTITY: usize = 1;

pub struct ApecoinTier {
    pub tier: &'static str,
    pub quantity: usize,
    pub amount: u32,
}

pub const APECOIN_TIERS: [ApecoinTier; 4] = [
    ApecoinTier {
        tier: "tier1",
        quantity: 2_000,
        amount: 10,
    },
    ApecoinTier {
        tier: "tier2",
        quantity: 1_200,
        amount: 25,
    },
    ApecoinTier {
        tier: "tier3",
        quantity: 600,
        amount: 50,
    },
    ApecoinTier {
        tier: "tier4",
        quantity: 200,
        amount: 100,
    },
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RewardTableError {
    #[error("Expected {expected} rewards, got {actual}")]
    WrongTotal { expected: usize, actual: usize },
}

#[derive(Clone, Debug, PartialEq)]
pub struct RewardSpec {
    pub reward_type: &'static str,
    pub reward_tier: Option<String>,
    pub reward_data: Value,
    pub reward_description: String,
}

pub fn build_rewards() -> Vec<RewardSpec> {
    let mut rewards = Vec::with_capacity(POOL_SIZE);

    for n in 1..=STANDARD_NFT_QUANTITY {
        rewards.push(RewardSpec {
            reward_type: STANDARD_NFT,
            reward_tier: None,
            reward_data: json!({ "nft_id": format!("standard_{:05}", n) }),
            reward_description: "Standard NFT from Hii Box collection".to_owned(),
        });
    }

    for tier in APECOIN_TIERS.iter() {
        for _ in 0..tier.quantity {
            rewards.push(RewardSpec {
                reward_type: APECOIN,
                reward_tier: Some(tier.tier.to_owned()),
                reward_data: json!({
                    "amount": tier.amount,
                    "currency": "APE",
                    "tier": tier.tier,
                }),
                reward_description: format!("{} ApeCoin", tier.amount),
            });
        }
    }

    for n in 1..=RARE_NFT_QUANTITY {
        rewards.push(RewardSpec {
            reward_type: RARE_NFT,
            reward_tier: None,
            reward_data: json!({ "nft_id": format!("rare_{:03}", n) }),
            reward_description: "Rare limited edition NFT".to_owned(),
        });
    }

    for _ in 0..APEFEST_TICKET_QUANTITY {
        rewards.push(RewardSpec {
            reward_type: APEFEST_TICKET,
            reward_tier: Some("vip".to_owned()),
            reward_data: json!({
                "event": "ApeFest Las Vegas 2025",
                "location": "Las Vegas, Nevada",
                "ticket_type": "VIP Access",
                "transferable": true,
            }),
            reward_description: "Exclusive ApeFest Las Vegas Ticket - Ultra Rare!".to_owned(),
        });
    }

    rewards
}

/// Full prize table in box order: index 0 goes to position 1.
pub fn shuffled_rewards(seed: u64) -> Result<Vec<RewardSpec>, RewardTableError> {
    let mut rewards = build_rewards();
    if rewards.len() != POOL_SIZE {
        return Err(RewardTableError::WrongTotal {
            expected: POOL_SIZE,
            actual: rewards.len(),
        });
    }
    let mut rng = StdRng::seed_from_u64(seed);
    rewards.shuffle(&mut rng);
    Ok(rewards)
}

/// Expected box count per `(reward_type, reward_tier)`.
pub fn expected_distribution() -> BTreeMap<(String, Option<String>), i64> {
    let mut expected = BTreeMap::new();
    expected.insert((STANDARD_NFT.to_owned(), None), STANDARD_NFT_QUANTITY as i64);
    for tier in APECOIN_TIERS.iter() {
        expected.insert(
            (APECOIN.to_owned(), Some(tier.tier.to_owned())),
            tier.quantity as i64,
        );
    }
    expected.insert((RARE_NFT.to_owned(), None), RARE_NFT_QUANTITY as i64);
    expected.insert(
        (APEFEST_TICKET.to_owned(), Some("vip".to_owned())),
        APEFEST_TICKET_QUANTITY as i64,
    );
    expected
}
