use serde_json::json;

use crate::logging::log_action;
use crate::services::{
    AdminContext, AdminError, PlatformService, ServiceResult, StakeTier, TransactionKind,
    TransactionRecord, TransactionStatus, ensure, ensure_permission,
};
use crate::stake_config::{require_tier, resolve_tier};

pub const MODERATE_PERMISSION: &str = "moderate_transactions";

pub fn action_key(operation: &str, id: &str) -> String {
    format!("{operation}:{id}")
}

/// Approves a pending transaction. Staking transactions are priced through
/// the tier configuration first; everything else completes with its original
/// amount. Refused locally, before any backend call, when the tier lookup
/// fails or the transaction is already terminal.
pub fn accept_transaction<S: PlatformService>(
    service: &S,
    ctx: &mut AdminContext,
    tx_id: &str,
) -> ServiceResult<TransactionRecord> {
    ensure_permission(ctx, MODERATE_PERMISSION)?;
    let key = action_key("accept", tx_id);
    ensure(
        ctx.begin_action(&key),
        AdminError::Validation("action_in_flight".into()),
    )?;
    let result = accept_inner(service, &ctx.user.id, tx_id);
    ctx.finish_action(&key);
    result
}

fn accept_inner<S: PlatformService>(
    service: &S,
    actor: &str,
    tx_id: &str,
) -> ServiceResult<TransactionRecord> {
    let tx = service
        .get_transaction(tx_id)?
        .ok_or_else(|| AdminError::NotFound(format!("transaction {tx_id}")))?;
    ensure(
        !tx.status.is_terminal(),
        AdminError::Validation("already_resolved".into()),
    )?;

    let amount = if tx.kind == TransactionKind::Staking {
        let tiers = service.list_stake_tiers()?;
        require_tier(tx.amount, &tiers)?.price
    } else {
        tx.amount
    };

    let updated = service.update_transaction(tx_id, TransactionStatus::Completed, amount)?;
    service.log_action(
        "accept_transaction",
        Some(actor),
        &json!({ "id": tx_id, "amount": amount, "kind": tx.kind }),
    )?;
    Ok(updated)
}

/// Rejects a pending transaction; amount is never touched.
pub fn decline_transaction<S: PlatformService>(
    service: &S,
    ctx: &mut AdminContext,
    tx_id: &str,
) -> ServiceResult<TransactionRecord> {
    ensure_permission(ctx, MODERATE_PERMISSION)?;
    let key = action_key("decline", tx_id);
    ensure(
        ctx.begin_action(&key),
        AdminError::Validation("action_in_flight".into()),
    )?;
    let result = decline_inner(service, &ctx.user.id, tx_id);
    ctx.finish_action(&key);
    result
}

fn decline_inner<S: PlatformService>(
    service: &S,
    actor: &str,
    tx_id: &str,
) -> ServiceResult<TransactionRecord> {
    let tx = service
        .get_transaction(tx_id)?
        .ok_or_else(|| AdminError::NotFound(format!("transaction {tx_id}")))?;
    ensure(
        !tx.status.is_terminal(),
        AdminError::Validation("already_resolved".into()),
    )?;
    let updated = service.update_transaction(tx_id, TransactionStatus::Failed, tx.amount)?;
    service.log_action(
        "decline_transaction",
        Some(actor),
        &json!({ "id": tx_id }),
    )?;
    Ok(updated)
}

/// Permanently removes a transaction. The caller must have set the `confirm`
/// request flag; without it the delete is refused before dispatch.
pub fn delete_transaction<S: PlatformService>(
    service: &S,
    ctx: &mut AdminContext,
    tx_id: &str,
) -> ServiceResult<()> {
    ensure_permission(ctx, MODERATE_PERMISSION)?;
    ensure(
        ctx.request.bool("confirm"),
        AdminError::Validation("confirm_required".into()),
    )?;
    let key = action_key("delete", tx_id);
    ensure(
        ctx.begin_action(&key),
        AdminError::Validation("action_in_flight".into()),
    )?;
    let result = service.delete_transaction(tx_id).and_then(|()| {
        log_action(service, ctx, "delete_transaction", json!({ "id": tx_id }))
    });
    ctx.finish_action(&key);
    result
}

/// Whether the accept control may be enabled for this transaction: pending,
/// and for staking transactions backed by a resolvable tier.
pub fn can_accept(tx: &TransactionRecord, tiers: &[StakeTier]) -> bool {
    if tx.status.is_terminal() {
        return false;
    }
    tx.kind != TransactionKind::Staking || resolve_tier(tx.amount, tiers).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{InMemoryService, PlatformService};

    fn moderator() -> AdminContext {
        let mut ctx = AdminContext::default();
        ctx.user.id = "admin-1".into();
        ctx.user.permissions.insert(MODERATE_PERMISSION.into());
        ctx
    }

    #[test]
    fn accept_requires_permission() {
        let service = InMemoryService::new_with_sample();
        let mut ctx = AdminContext::default();
        let err = accept_transaction(&service, &mut ctx, "tx-1").unwrap_err();
        assert!(matches!(err, AdminError::PermissionDenied(_)));
    }

    #[test]
    fn staking_accept_overrides_amount_with_tier_price() {
        let service = InMemoryService::new_with_sample();
        let mut ctx = moderator();
        // tx-2: STAKING, amount 500 -> tier-a [100, 500] wins over tier-b
        let updated = accept_transaction(&service, &mut ctx, "tx-2").unwrap();
        assert_eq!(updated.status, TransactionStatus::Completed);
        assert_eq!(updated.amount, 10.0);
    }

    #[test]
    fn deposit_accept_preserves_amount() {
        let service = InMemoryService::new_with_sample();
        let mut ctx = moderator();
        let updated = accept_transaction(&service, &mut ctx, "tx-1").unwrap();
        assert_eq!(updated.status, TransactionStatus::Completed);
        assert_eq!(updated.amount, 250.0);
    }

    #[test]
    fn staking_accept_without_tier_is_refused_locally() {
        let service = InMemoryService::new_with_sample();
        let mut ctx = moderator();
        // tx-4: STAKING, amount 49 below every configured band
        let err = accept_transaction(&service, &mut ctx, "tx-4").unwrap_err();
        assert!(matches!(err, AdminError::Configuration(_)));
        let tx = service.get_transaction("tx-4").unwrap().unwrap();
        assert_eq!(tx.status, TransactionStatus::Pending);
        assert_eq!(tx.amount, 49.0);
    }

    #[test]
    fn terminal_transaction_cannot_be_reaccepted() {
        let service = InMemoryService::new_with_sample();
        let mut ctx = moderator();
        // tx-3 is already COMPLETED
        let err = accept_transaction(&service, &mut ctx, "tx-3").unwrap_err();
        assert!(matches!(err, AdminError::Validation(ref reason) if reason == "already_resolved"));
        let err = decline_transaction(&service, &mut ctx, "tx-3").unwrap_err();
        assert!(matches!(err, AdminError::Validation(ref reason) if reason == "already_resolved"));
    }

    #[test]
    fn decline_fails_transaction_and_keeps_amount() {
        let service = InMemoryService::new_with_sample();
        let mut ctx = moderator();
        let updated = decline_transaction(&service, &mut ctx, "tx-2").unwrap();
        assert_eq!(updated.status, TransactionStatus::Failed);
        assert_eq!(updated.amount, 500.0);
    }

    #[test]
    fn delete_requires_confirmation() {
        let service = InMemoryService::new_with_sample();
        let mut ctx = moderator();
        let err = delete_transaction(&service, &mut ctx, "tx-1").unwrap_err();
        assert!(matches!(err, AdminError::Validation(ref reason) if reason == "confirm_required"));
        assert!(service.get_transaction("tx-1").unwrap().is_some());

        ctx.request.set("confirm", true);
        delete_transaction(&service, &mut ctx, "tx-1").unwrap();
        assert!(service.get_transaction("tx-1").unwrap().is_none());
    }

    #[test]
    fn duplicate_dispatch_is_suppressed() {
        let service = InMemoryService::new_with_sample();
        let mut ctx = moderator();
        ctx.begin_action(&action_key("accept", "tx-1"));
        let err = accept_transaction(&service, &mut ctx, "tx-1").unwrap_err();
        assert!(matches!(err, AdminError::Validation(ref reason) if reason == "action_in_flight"));
        // a different transaction is not affected
        accept_transaction(&service, &mut ctx, "tx-2").unwrap();
    }

    #[test]
    fn in_flight_key_released_after_failure() {
        let service = InMemoryService::new_with_sample();
        let mut ctx = moderator();
        accept_transaction(&service, &mut ctx, "tx-missing").unwrap_err();
        assert!(!ctx.action_in_flight(&action_key("accept", "tx-missing")));
    }

    #[test]
    fn successful_actions_are_audited() {
        let service = InMemoryService::new_with_sample();
        let mut ctx = moderator();
        accept_transaction(&service, &mut ctx, "tx-1").unwrap();
        let logs = service.action_logs();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].action, "accept_transaction");
        assert_eq!(logs[0].actor.as_deref(), Some("admin-1"));
    }

    #[test]
    fn can_accept_reflects_tier_resolution() {
        let service = InMemoryService::new_with_sample();
        let tiers = service.list_stake_tiers().unwrap();
        let staking = service.get_transaction("tx-2").unwrap().unwrap();
        let unpriced = service.get_transaction("tx-4").unwrap().unwrap();
        let terminal = service.get_transaction("tx-3").unwrap().unwrap();
        assert!(can_accept(&staking, &tiers));
        assert!(!can_accept(&unpriced, &tiers));
        assert!(!can_accept(&terminal, &tiers));
    }
}
