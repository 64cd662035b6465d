use serde_json::json;

use crate::logging::log_action;
use crate::services::{
    AdminContext, AdminError, PlatformService, ServiceResult, WalletOption, ensure,
    ensure_permission,
};

pub const MANAGE_PERMISSION: &str = "manage_wallets";

pub fn list_wallet_options<S: PlatformService>(
    service: &S,
    ctx: &mut AdminContext,
) -> ServiceResult<()> {
    ensure_permission(ctx, MANAGE_PERMISSION)?;
    let wallets = service.list_wallet_options()?;
    ctx.context.set(
        "wallet_options",
        wallets
            .iter()
            .map(|wallet| {
                json!({
                    "id": wallet.id,
                    "name": wallet.name,
                    "address": wallet.address,
                    "network": wallet.network,
                })
            })
            .collect::<Vec<_>>(),
    );
    Ok(())
}

pub fn save_wallet_option<S: PlatformService>(
    service: &S,
    ctx: &mut AdminContext,
    wallet: WalletOption,
) -> ServiceResult<WalletOption> {
    ensure_permission(ctx, MANAGE_PERMISSION)?;
    if let Err(err) = validate_wallet(&wallet) {
        ctx.context.set("error_message", err.to_string());
        return Err(err);
    }
    let saved = service.save_wallet_option(wallet)?;
    log_action(
        service,
        ctx,
        "save_wallet_option",
        json!({ "id": saved.id, "name": saved.name }),
    )?;
    Ok(saved)
}

pub fn delete_wallet_option<S: PlatformService>(
    service: &S,
    ctx: &mut AdminContext,
    wallet_id: &str,
) -> ServiceResult<()> {
    ensure_permission(ctx, MANAGE_PERMISSION)?;
    service.delete_wallet_option(wallet_id)?;
    log_action(service, ctx, "delete_wallet_option", json!({ "id": wallet_id }))
}

fn validate_wallet(wallet: &WalletOption) -> ServiceResult<()> {
    ensure(
        !wallet.name.trim().is_empty(),
        AdminError::Validation("wallet name is required".into()),
    )?;
    ensure(
        !wallet.address.trim().is_empty(),
        AdminError::Validation("wallet address is required".into()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::InMemoryService;

    fn manager() -> AdminContext {
        let mut ctx = AdminContext::default();
        ctx.user.id = "admin-1".into();
        ctx.user.permissions.insert(MANAGE_PERMISSION.into());
        ctx
    }

    #[test]
    fn empty_address_is_rejected_before_dispatch() {
        let service = InMemoryService::default();
        let mut ctx = manager();
        let err = save_wallet_option(
            &service,
            &mut ctx,
            WalletOption {
                id: None,
                name: "ETH Treasury".into(),
                address: "  ".into(),
                network: "ethereum".into(),
            },
        )
        .unwrap_err();
        assert!(matches!(err, AdminError::Validation(_)));
        assert!(service.list_wallet_options().unwrap().is_empty());
        assert!(ctx.context.string("error_message").is_some());
    }

    #[test]
    fn wallet_round_trip() {
        let service = InMemoryService::new_with_sample();
        let mut ctx = manager();
        let saved = save_wallet_option(
            &service,
            &mut ctx,
            WalletOption {
                id: None,
                name: "ETH Treasury".into(),
                address: "0xabc123".into(),
                network: "ethereum".into(),
            },
        )
        .unwrap();
        assert_eq!(service.list_wallet_options().unwrap().len(), 2);
        delete_wallet_option(&service, &mut ctx, saved.id.as_deref().unwrap()).unwrap();
        list_wallet_options(&service, &mut ctx).unwrap();
        let wallets = ctx
            .context
            .get("wallet_options")
            .unwrap()
            .as_array()
            .unwrap()
            .clone();
        assert_eq!(wallets.len(), 1);
    }
}
