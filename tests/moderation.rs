use trade_admin_rust::manage_transactions::TransactionBrowser;
use trade_admin_rust::services::{
    AdminContext, AdminError, InMemoryService, PlatformService, StakeTier, TransactionStatus,
};
use trade_admin_rust::stake_config::resolve_tier;

fn moderator() -> AdminContext {
    let mut ctx = AdminContext::default();
    ctx.user.id = "admin-1".into();
    ctx.user
        .permissions
        .insert("moderate_transactions".into());
    ctx
}

fn tier(id: &str, min: f64, max: f64, price: f64) -> StakeTier {
    StakeTier {
        id: Some(id.into()),
        min,
        max,
        price,
        cycle: "monthly".into(),
    }
}

fn tier_less_specific() -> StakeTier {
    tier("tier-a", 100.0, 500.0, 10.0)
}

fn tier_more_specific() -> StakeTier {
    tier("tier-b", 500.0, 1000.0, 25.0)
}

#[test]
fn boundary_amount_completes_with_first_listed_tier_price() {
    // amount 500 sits in both bands; the first listed one wins
    let tiers = vec![tier_less_specific(), tier_more_specific()];
    let resolved = resolve_tier(500.0, &tiers).unwrap();
    assert_eq!(resolved.id.as_deref(), Some("tier-a"));
    assert_eq!(resolved.price, 10.0);

    let service = InMemoryService::new_with_sample();
    let mut ctx = moderator();
    let mut browser = TransactionBrowser::new(service.clone());
    browser.refresh(&mut ctx).unwrap();
    // tx-2 is the STAKING transaction with amount 500
    browser.accept(&mut ctx, "tx-2").unwrap();
    let tx = service.get_transaction("tx-2").unwrap().unwrap();
    assert_eq!(tx.status, TransactionStatus::Completed);
    assert_eq!(tx.amount, 10.0);
}

#[test]
fn mid_band_amount_completes_with_second_tier_price() {
    let tiers = vec![tier_less_specific(), tier_more_specific()];
    let resolved = resolve_tier(750.0, &tiers).unwrap();
    assert_eq!(resolved.id.as_deref(), Some("tier-b"));
    assert_eq!(resolved.price, 25.0);
}

#[test]
fn unpriced_amount_blocks_accept_without_dispatch() {
    let service = InMemoryService::new_with_sample();
    let mut ctx = moderator();
    let mut browser = TransactionBrowser::new(service.clone());
    browser.refresh(&mut ctx).unwrap();

    // tx-4: staking amount 49, below every configured band
    let err = browser.accept(&mut ctx, "tx-4").unwrap_err();
    assert!(matches!(err, AdminError::Configuration(_)));

    // the backend was never touched: status and amount are unchanged,
    // and no action was audited
    let tx = service.get_transaction("tx-4").unwrap().unwrap();
    assert_eq!(tx.status, TransactionStatus::Pending);
    assert_eq!(tx.amount, 49.0);
    assert!(service.action_logs().is_empty());
}

#[test]
fn deposit_accept_never_consults_tiers() {
    // a service with no tiers at all: deposits must still complete
    let service = InMemoryService::new_with_sample();
    for tier in service.list_stake_tiers().unwrap() {
        service
            .delete_stake_tier(tier.id.as_deref().unwrap())
            .unwrap();
    }
    let mut ctx = moderator();
    let mut browser = TransactionBrowser::new(service.clone());
    browser.refresh(&mut ctx).unwrap();
    browser.accept(&mut ctx, "tx-1").unwrap();
    let tx = service.get_transaction("tx-1").unwrap().unwrap();
    assert_eq!(tx.status, TransactionStatus::Completed);
    assert_eq!(tx.amount, 250.0);
}

#[test]
fn decline_then_reaccept_is_refused() {
    let service = InMemoryService::new_with_sample();
    let mut ctx = moderator();
    let mut browser = TransactionBrowser::new(service.clone());
    browser.refresh(&mut ctx).unwrap();

    browser.decline(&mut ctx, "tx-1").unwrap();
    let err = browser.accept(&mut ctx, "tx-1").unwrap_err();
    assert!(matches!(err, AdminError::Validation(ref reason) if reason == "already_resolved"));
    let tx = service.get_transaction("tx-1").unwrap().unwrap();
    assert_eq!(tx.status, TransactionStatus::Failed);
}

#[test]
fn cache_patch_mirrors_backend_after_moderation() {
    let service = InMemoryService::new_with_sample();
    let mut ctx = moderator();
    let mut browser = TransactionBrowser::new(service.clone());
    browser.refresh(&mut ctx).unwrap();

    browser.accept(&mut ctx, "tx-2").unwrap();
    browser.decline(&mut ctx, "tx-4").unwrap();
    ctx.request.set("confirm", true);
    browser.delete(&mut ctx, "tx-1").unwrap();

    let cached = browser.list().items().to_vec();
    let backend = service.list_transactions().unwrap();
    assert_eq!(cached, backend);
    assert_eq!(cached.len(), 3);
}
