pub mod reward_box;
pub mod user_nft;
pub mod user_social;
pub mod users;
