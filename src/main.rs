use trade_admin_rust::manage_stakes;
use trade_admin_rust::manage_transactions::TransactionBrowser;
use trade_admin_rust::services::{AdminContext, InMemoryService};

fn main() {
    let service = InMemoryService::new_with_sample();
    let mut browser = TransactionBrowser::new(service.clone());

    let mut ctx = AdminContext::default();
    ctx.user.id = "admin-1".into();
    ctx.user.name = "CLI admin".into();
    ctx.user
        .permissions
        .extend(["moderate_transactions".to_string(), "manage_staking".to_string()]);

    if let Err(error) = browser.refresh(&mut ctx) {
        eprintln!("refresh() -> {error}");
    }
    browser.set_status("PENDING");
    if let Err(error) = browser.publish(&mut ctx) {
        eprintln!("publish() -> {error}");
    }
    if let Some(rows) = ctx.context.get("transaction_rows") {
        println!(
            "pending transactions:\n{}",
            serde_json::to_string_pretty(rows).unwrap_or_default()
        );
    }

    // price the pending staking transaction through the tier table
    if let Err(error) = browser.open_review(&mut ctx, "tx-2") {
        eprintln!("open_review() -> {error}");
    }
    if let Some(review) = ctx.context.get("transaction_review") {
        println!(
            "review:\n{}",
            serde_json::to_string_pretty(review).unwrap_or_default()
        );
    }
    if let Err(error) = browser.accept(&mut ctx, "tx-2") {
        eprintln!("accept() -> {error}");
    }

    if let Err(error) = manage_stakes::list_stake_tiers(&service, &mut ctx) {
        eprintln!("list_stake_tiers() -> {error}");
    }
    if let Some(tiers) = ctx.context.get("stake_tiers") {
        println!(
            "stake tiers:\n{}",
            serde_json::to_string_pretty(tiers).unwrap_or_default()
        );
    }
}
