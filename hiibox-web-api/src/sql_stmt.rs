use sea_orm::{DbBackend, Statement, Value};

pub const DB_BACKEND: DbBackend = DbBackend::Postgres;

pub fn statement<I>(sql: &str, values: I) -> Statement
where
    I: IntoIterator<Item = Value>,
{
    Statement::from_sql_and_values(DB_BACKEND, sql, values)
}

// Skips rows another claim is holding so concurrent openers fan out over the pool.
pub const CLAIM_NEXT_REWARD: &str = r#"UPDATE public.reward_box
    SET claimed = TRUE, claimed_by_user_id = $1, claimed_at = $2
    WHERE id = (SELECT reward_box.id FROM public.reward_box
        WHERE reward_box.claimed = FALSE AND reward_box.deleted = FALSE
        ORDER BY reward_box.position ASC
        LIMIT 1
        FOR UPDATE SKIP LOCKED)
    AND claimed = FALSE
    RETURNING *"#;

// Waits on the lowest unclaimed row instead of skipping it.
pub const CLAIM_NEXT_REWARD_WAIT: &str = r#"UPDATE public.reward_box
    SET claimed = TRUE, claimed_by_user_id = $1, claimed_at = $2
    WHERE id = (SELECT reward_box.id FROM public.reward_box
        WHERE reward_box.claimed = FALSE AND reward_box.deleted = FALSE
        ORDER BY reward_box.position ASC
        LIMIT 1
        FOR UPDATE)
    AND claimed = FALSE
    RETURNING *"#;

pub const UNCLAIMED_REWARD_EXISTS: &str = r#"SELECT EXISTS (
    SELECT 1 FROM public.reward_box
    WHERE claimed = FALSE AND deleted = FALSE) AS available"#;

pub const COUNT_UNCLAIMED_REWARDS: &str = r#"SELECT COUNT(*) AS available_count
    FROM public.reward_box
    WHERE claimed = FALSE AND deleted = FALSE"#;

// Bounds every row-lock wait inside a claim transaction.
pub const SET_CLAIM_LOCK_TIMEOUT: &str = "SET LOCAL lock_timeout = '2s'";

pub const CLAIM_REWARD_AT_POSITION: &str = r#"UPDATE public.reward_box
    SET claimed = TRUE, claimed_by_user_id = $1, claimed_at = $2
    WHERE position = $3 AND claimed = FALSE AND deleted = FALSE
    RETURNING *"#;

pub const LOCK_USER: &str = r#"SELECT * FROM public.users
    WHERE id = $1 AND deleted = FALSE
    FOR UPDATE"#;

pub const DECREMENT_USER_KEYS: &str = r#"UPDATE public.users
    SET key_count = key_count - 1, updated_at = $2
    WHERE id = $1 AND key_count > 0
    RETURNING key_count"#;

pub const COUNT_UNUSED_NFTS: &str = r#"SELECT COUNT(*) AS unused_count
    FROM public.user_nft
    WHERE user_id = $1 AND used = FALSE AND deleted = FALSE"#;

pub const CONSUME_OLDEST_NFT: &str = r#"UPDATE public.user_nft
    SET used = TRUE
    WHERE id = (SELECT user_nft.id FROM public.user_nft
        WHERE user_nft.user_id = $1 AND user_nft.used = FALSE AND user_nft.deleted = FALSE
        ORDER BY user_nft.created_at ASC, user_nft.id ASC
        LIMIT 1
        FOR UPDATE SKIP LOCKED)
    AND used = FALSE
    RETURNING id"#;

pub const USER_ACTIVITY_COUNTS: &str = r#"SELECT
    (SELECT COUNT(*) FROM public.user_nft
        WHERE user_id = $1 AND deleted = FALSE) AS nft_count,
    (SELECT COUNT(*) FROM public.user_nft
        WHERE user_id = $1 AND used = FALSE AND deleted = FALSE) AS unused_nft_count,
    (SELECT COUNT(*) FROM public.user_social
        WHERE user_id = $1 AND deleted = FALSE) AS social_count,
    (SELECT COUNT(*) FROM public.reward_box
        WHERE claimed_by_user_id = $1 AND claimed = TRUE AND deleted = FALSE) AS boxes_opened"#;

pub const POOL_TOTALS: &str = r#"SELECT COUNT(*) AS total,
    COUNT(*) FILTER (WHERE claimed = TRUE) AS claimed
    FROM public.reward_box
    WHERE deleted = FALSE"#;

pub const CLAIMED_DISTRIBUTION: &str = r#"SELECT reward_type, COUNT(*) AS claimed_count
    FROM public.reward_box
    WHERE claimed = TRUE AND deleted = FALSE
    GROUP BY reward_type
    ORDER BY reward_type ASC"#;
