use sea_orm_migration::{
    prelude::*,
    sea_orm::{ConnectionTrait, DbBackend, Statement},
};

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20250901_000005_create_index"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let conn = manager.get_connection();
        for sql in UP_STATEMENTS {
            conn.execute(Statement::from_string(DbBackend::Postgres, sql.to_string()))
                .await?;
        }
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let conn = manager.get_connection();
        for sql in DOWN_STATEMENTS {
            conn.execute(Statement::from_string(DbBackend::Postgres, sql.to_string()))
                .await?;
        }
        Ok(())
    }
}

const UP_STATEMENTS: [&str; 12] = [
    r#"ALTER TABLE public.users
    ADD CONSTRAINT chk_users_key_count_non_negative CHECK (key_count >= 0);"#,
    r#"CREATE INDEX IF NOT EXISTS idx_users_wallet_address ON public.users (wallet_address);"#,
    r#"CREATE INDEX IF NOT EXISTS idx_users_deleted ON public.users (deleted);"#,
    r#"CREATE INDEX IF NOT EXISTS idx_user_nft_user_id ON public.user_nft (user_id);"#,
    // oldest unused record first when a key is paid with an NFT
    r#"CREATE INDEX IF NOT EXISTS idx_user_nft_unused ON public.user_nft (user_id, created_at, id)
    WHERE used = FALSE AND deleted = FALSE;"#,
    r#"CREATE INDEX IF NOT EXISTS idx_user_social_user_id ON public.user_social (user_id);"#,
    r#"CREATE UNIQUE INDEX IF NOT EXISTS uq_user_social_user_platform
    ON public.user_social (user_id, platform) WHERE deleted = FALSE;"#,
    r#"CREATE INDEX IF NOT EXISTS idx_user_social_platform_handle
    ON public.user_social (platform, handle) WHERE deleted = FALSE;"#,
    r#"CREATE INDEX IF NOT EXISTS idx_reward_box_unclaimed ON public.reward_box (position)
    WHERE claimed = FALSE AND deleted = FALSE;"#,
    r#"CREATE INDEX IF NOT EXISTS idx_reward_box_claimed_by_user_id
    ON public.reward_box (claimed_by_user_id);"#,
    r#"CREATE INDEX IF NOT EXISTS idx_reward_box_reward_type ON public.reward_box (reward_type);"#,
    r#"CREATE INDEX IF NOT EXISTS idx_reward_box_created_at ON public.reward_box (created_at);"#,
];

const DOWN_STATEMENTS: [&str; 12] = [
    r#"DROP INDEX IF EXISTS public.idx_reward_box_created_at;"#,
    r#"DROP INDEX IF EXISTS public.idx_reward_box_reward_type;"#,
    r#"DROP INDEX IF EXISTS public.idx_reward_box_claimed_by_user_id;"#,
    r#"DROP INDEX IF EXISTS public.idx_reward_box_unclaimed;"#,
    r#"DROP INDEX IF EXISTS public.idx_user_social_platform_handle;"#,
    r#"DROP INDEX IF EXISTS public.uq_user_social_user_platform;"#,
    r#"DROP INDEX IF EXISTS public.idx_user_social_user_id;"#,
    r#"DROP INDEX IF EXISTS public.idx_user_nft_unused;"#,
    r#"DROP INDEX IF EXISTS public.idx_user_nft_user_id;"#,
    r#"DROP INDEX IF EXISTS public.idx_users_deleted;"#,
    r#"DROP INDEX IF EXISTS public.idx_users_wallet_address;"#,
    r#"ALTER TABLE public.users DROP CONSTRAINT IF EXISTS chk_users_key_count_non_negative;"#,
];
