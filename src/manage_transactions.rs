use serde_json::json;

use crate::listing::ListController;
use crate::logging::log_action;
use crate::moderation::{self, can_accept};
use crate::services::{
    AdminContext, AdminError, PlatformService, ServiceResult, TransactionKind, TransactionRecord,
};
use crate::stake_config::resolve_tier;

const PAGE_SIZE: usize = 10;
const PAGE_WINDOW: usize = 7;

/// Transaction review screen: a cached copy of the full backend collection
/// with client-side filtering and pagination, plus moderation actions that
/// patch the cache in place after the backend confirms.
pub struct TransactionBrowser<S: PlatformService> {
    service: S,
    list: ListController<TransactionRecord>,
}

impl<S: PlatformService> TransactionBrowser<S> {
    pub fn new(service: S) -> Self {
        Self {
            service,
            list: ListController::new(PAGE_SIZE),
        }
    }

    pub fn list(&self) -> &ListController<TransactionRecord> {
        &self.list
    }

    /// Refetches the whole collection from the backend.
    pub fn refresh(&mut self, ctx: &mut AdminContext) -> ServiceResult<()> {
        match self.service.list_transactions() {
            Ok(transactions) => {
                self.list.replace(transactions);
                Ok(())
            }
            Err(err) => {
                ctx.context.set("error_message", err.to_string());
                Err(err)
            }
        }
    }

    pub fn set_search(&mut self, search: &str) {
        self.list.set_search(search);
    }

    pub fn set_status(&mut self, status: &str) {
        self.list.set_status(status);
    }

    pub fn set_kind(&mut self, kind: &str) {
        self.list.set_kind(kind);
    }

    pub fn set_page(&mut self, page: usize) {
        self.list.set_page(page);
    }

    /// Writes the visible slice and pagination controls into the context for
    /// the rendering layer.
    pub fn publish(&self, ctx: &mut AdminContext) -> ServiceResult<()> {
        let tiers = match self.service.list_stake_tiers() {
            Ok(tiers) => tiers,
            Err(err) => {
                ctx.context.set("error_message", err.to_string());
                return Err(err);
            }
        };
        let rows: Vec<_> = self
            .list
            .visible()
            .into_iter()
            .map(|tx| {
                json!({
                    "id": tx.id,
                    "user_id": tx.user_id,
                    "amount": tx.amount,
                    "type": tx.kind,
                    "status": tx.status,
                    "created_at": tx.created_at,
                    "can_accept": can_accept(tx, &tiers),
                })
            })
            .collect();
        ctx.context.set("transaction_rows", rows);
        ctx.context.set("transaction_total", self.list.filtered().len());
        ctx.context.set("total_pages", self.list.total_pages());
        ctx.context.set("current_page", self.list.page());
        ctx.context.set("page_index", self.list.page_index(PAGE_WINDOW));
        Ok(())
    }

    /// Opens one transaction for review. For staking transactions the tier
    /// binding is recomputed here, every time, and never persisted.
    pub fn open_review(&self, ctx: &mut AdminContext, tx_id: &str) -> ServiceResult<()> {
        let tx = self
            .list
            .items()
            .iter()
            .find(|tx| tx.id == tx_id)
            .cloned()
            .map(Ok)
            .unwrap_or_else(|| {
                self.service
                    .get_transaction(tx_id)?
                    .ok_or_else(|| AdminError::NotFound(format!("transaction {tx_id}")))
            })?;

        let mut review = json!({
            "id": tx.id,
            "user_id": tx.user_id,
            "amount": tx.amount,
            "type": tx.kind,
            "status": tx.status,
        });
        if tx.kind == TransactionKind::Staking {
            let tiers = self.service.list_stake_tiers()?;
            match resolve_tier(tx.amount, &tiers) {
                Some(tier) => {
                    review["resolved_tier"] = json!({
                        "id": tier.id,
                        "price": tier.price,
                        "cycle": tier.cycle,
                    });
                }
                None => {
                    review["tier_missing"] = json!(true);
                }
            }
        }
        ctx.context.set("transaction_review", review);
        Ok(())
    }

    /// Accepts the transaction and patches the cached row with the confirmed
    /// status and amount. The cache is only touched after backend success.
    pub fn accept(&mut self, ctx: &mut AdminContext, tx_id: &str) -> ServiceResult<()> {
        match moderation::accept_transaction(&self.service, ctx, tx_id) {
            Ok(updated) => {
                self.list.patch(tx_id, |tx| {
                    tx.status = updated.status;
                    tx.amount = updated.amount;
                });
                ctx.context.set("success_message", "transaction accepted");
                Ok(())
            }
            Err(err) => {
                ctx.context.set("error_message", err.to_string());
                Err(err)
            }
        }
    }

    pub fn decline(&mut self, ctx: &mut AdminContext, tx_id: &str) -> ServiceResult<()> {
        match moderation::decline_transaction(&self.service, ctx, tx_id) {
            Ok(updated) => {
                self.list.patch(tx_id, |tx| {
                    tx.status = updated.status;
                });
                ctx.context.set("success_message", "transaction declined");
                Ok(())
            }
            Err(err) => {
                ctx.context.set("error_message", err.to_string());
                Err(err)
            }
        }
    }

    pub fn delete(&mut self, ctx: &mut AdminContext, tx_id: &str) -> ServiceResult<()> {
        match moderation::delete_transaction(&self.service, ctx, tx_id) {
            Ok(()) => {
                self.list.remove(tx_id);
                ctx.context.set("success_message", "transaction deleted");
                Ok(())
            }
            Err(err) => {
                ctx.context.set("error_message", err.to_string());
                Err(err)
            }
        }
    }

    /// CSV dump of the currently filtered rows.
    pub fn export_csv(&self, ctx: &mut AdminContext) -> ServiceResult<String> {
        let mut out = String::from("id,user_id,amount,type,status,created_at\n");
        for tx in self.list.filtered() {
            out.push_str(&format!(
                "{},{},{},{},{},{}\n",
                tx.id,
                tx.user_id,
                tx.amount,
                tx.kind,
                tx.status,
                tx.created_at.to_rfc3339()
            ));
        }
        log_action(
            &self.service,
            ctx,
            "export_transactions",
            json!({ "rows": self.list.filtered().len() }),
        )?;
        Ok(out)
    }
}
