use serde_json::json;

use crate::logging::log_action;
use crate::services::{
    AdminContext, AdminError, PlatformService, ServiceResult, TraderProfile, ensure,
    ensure_permission,
};

pub const MANAGE_PERMISSION: &str = "manage_traders";

pub fn list_traders<S: PlatformService>(service: &S, ctx: &mut AdminContext) -> ServiceResult<()> {
    ensure_permission(ctx, MANAGE_PERMISSION)?;
    let traders = service.list_traders()?;
    ctx.context.set(
        "traders",
        traders
            .iter()
            .map(|trader| {
                json!({
                    "id": trader.id,
                    "name": trader.name,
                    "win_rate": trader.win_rate,
                    "profit_share": trader.profit_share,
                })
            })
            .collect::<Vec<_>>(),
    );
    Ok(())
}

pub fn save_trader<S: PlatformService>(
    service: &S,
    ctx: &mut AdminContext,
    trader: TraderProfile,
) -> ServiceResult<TraderProfile> {
    ensure_permission(ctx, MANAGE_PERMISSION)?;
    if let Err(err) = validate_trader(&trader) {
        ctx.context.set("error_message", err.to_string());
        return Err(err);
    }
    let saved = service.save_trader(trader)?;
    log_action(
        service,
        ctx,
        "save_trader",
        json!({ "id": saved.id, "name": saved.name }),
    )?;
    Ok(saved)
}

pub fn delete_trader<S: PlatformService>(
    service: &S,
    ctx: &mut AdminContext,
    trader_id: &str,
) -> ServiceResult<()> {
    ensure_permission(ctx, MANAGE_PERMISSION)?;
    service.delete_trader(trader_id)?;
    log_action(service, ctx, "delete_trader", json!({ "id": trader_id }))
}

fn validate_trader(trader: &TraderProfile) -> ServiceResult<()> {
    ensure(
        !trader.name.trim().is_empty(),
        AdminError::Validation("trader name is required".into()),
    )?;
    ensure(
        (0.0..=100.0).contains(&trader.win_rate),
        AdminError::Validation("win rate must be within 0..=100".into()),
    )
}
