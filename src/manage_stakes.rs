use serde_json::json;

use crate::logging::log_action;
use crate::services::{
    AdminContext, PlatformService, ServiceResult, StakeTier, ensure_permission,
};
use crate::stake_config::validate_tier;

pub const MANAGE_PERMISSION: &str = "manage_staking";

pub fn list_stake_tiers<S: PlatformService>(
    service: &S,
    ctx: &mut AdminContext,
) -> ServiceResult<()> {
    ensure_permission(ctx, MANAGE_PERMISSION)?;
    let tiers = service.list_stake_tiers()?;
    ctx.context.set(
        "stake_tiers",
        tiers
            .iter()
            .map(|tier| {
                json!({
                    "id": tier.id,
                    "min": tier.min,
                    "max": tier.max,
                    "price": tier.price,
                    "cycle": tier.cycle,
                })
            })
            .collect::<Vec<_>>(),
    );
    Ok(())
}

pub fn save_stake_tier<S: PlatformService>(
    service: &S,
    ctx: &mut AdminContext,
    tier: StakeTier,
) -> ServiceResult<StakeTier> {
    ensure_permission(ctx, MANAGE_PERMISSION)?;
    if let Err(err) = validate_tier(&tier) {
        ctx.context.set("error_message", err.to_string());
        return Err(err);
    }
    let saved = service.save_stake_tier(tier)?;
    log_action(
        service,
        ctx,
        "save_stake_tier",
        json!({ "id": saved.id, "min": saved.min, "max": saved.max, "price": saved.price }),
    )?;
    Ok(saved)
}

pub fn delete_stake_tier<S: PlatformService>(
    service: &S,
    ctx: &mut AdminContext,
    tier_id: &str,
) -> ServiceResult<()> {
    ensure_permission(ctx, MANAGE_PERMISSION)?;
    service.delete_stake_tier(tier_id)?;
    log_action(service, ctx, "delete_stake_tier", json!({ "id": tier_id }))
}
