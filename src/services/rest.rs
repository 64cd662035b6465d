use serde_json::Value;
use tracing::info;

use crate::rest::ApiClient;
use crate::services::{
    AdminError, PlatformAsset, PlatformService, ServiceResult, StakeTier, SubscriptionPlan,
    TraderProfile, TransactionRecord, TransactionStatus, WalletOption,
};

/// REST-backed `PlatformService`. Bridges the synchronous service trait onto
/// the async client with a per-call runtime; callers already inside a tokio
/// runtime should use `ApiClient` directly instead.
#[derive(Clone)]
pub struct RestService {
    client: ApiClient,
}

impl RestService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    fn runtime() -> ServiceResult<tokio::runtime::Runtime> {
        tokio::runtime::Runtime::new()
            .map_err(|err| AdminError::Internal(format!("runtime init failed: {err}")))
    }
}

impl PlatformService for RestService {
    fn list_transactions(&self) -> ServiceResult<Vec<TransactionRecord>> {
        Self::runtime()?.block_on(self.client.fetch_all_transactions())
    }

    fn get_transaction(&self, id: &str) -> ServiceResult<Option<TransactionRecord>> {
        // The backend exposes no single-transaction read; scan the listing.
        let transactions = self.list_transactions()?;
        Ok(transactions.into_iter().find(|tx| tx.id == id))
    }

    fn update_transaction(
        &self,
        id: &str,
        status: TransactionStatus,
        amount: f64,
    ) -> ServiceResult<TransactionRecord> {
        Self::runtime()?.block_on(self.client.update_transaction(id, status, amount))
    }

    fn delete_transaction(&self, id: &str) -> ServiceResult<()> {
        Self::runtime()?.block_on(self.client.delete_transaction(id))
    }

    fn list_stake_tiers(&self) -> ServiceResult<Vec<StakeTier>> {
        Self::runtime()?.block_on(self.client.list_records("/stake"))
    }

    fn save_stake_tier(&self, tier: StakeTier) -> ServiceResult<StakeTier> {
        let runtime = Self::runtime()?;
        match tier.id.as_deref() {
            Some(id) => runtime.block_on(self.client.patch_record(&format!("/stake/{id}"), &tier)),
            None => runtime.block_on(self.client.create_record("/stake", &tier)),
        }
    }

    fn delete_stake_tier(&self, id: &str) -> ServiceResult<()> {
        Self::runtime()?.block_on(self.client.delete_record(&format!("/stake/{id}")))
    }

    fn list_subscription_plans(&self) -> ServiceResult<Vec<SubscriptionPlan>> {
        Self::runtime()?.block_on(self.client.list_records("/subscription"))
    }

    fn save_subscription_plan(&self, plan: SubscriptionPlan) -> ServiceResult<SubscriptionPlan> {
        let runtime = Self::runtime()?;
        match plan.id.as_deref() {
            Some(id) => {
                runtime.block_on(self.client.patch_record(&format!("/subscription/{id}"), &plan))
            }
            None => runtime.block_on(self.client.create_record("/subscription", &plan)),
        }
    }

    fn delete_subscription_plan(&self, id: &str) -> ServiceResult<()> {
        Self::runtime()?.block_on(self.client.delete_record(&format!("/subscription/{id}")))
    }

    fn list_traders(&self) -> ServiceResult<Vec<TraderProfile>> {
        Self::runtime()?.block_on(self.client.list_records("/trader"))
    }

    fn save_trader(&self, trader: TraderProfile) -> ServiceResult<TraderProfile> {
        let runtime = Self::runtime()?;
        match trader.id.as_deref() {
            Some(id) => {
                runtime.block_on(self.client.patch_record(&format!("/trader/{id}"), &trader))
            }
            None => runtime.block_on(self.client.create_record("/trader", &trader)),
        }
    }

    fn delete_trader(&self, id: &str) -> ServiceResult<()> {
        Self::runtime()?.block_on(self.client.delete_record(&format!("/trader/{id}")))
    }

    fn list_wallet_options(&self) -> ServiceResult<Vec<WalletOption>> {
        Self::runtime()?.block_on(self.client.list_records("/wallet-connect"))
    }

    fn save_wallet_option(&self, wallet: WalletOption) -> ServiceResult<WalletOption> {
        let runtime = Self::runtime()?;
        match wallet.id.as_deref() {
            Some(id) => runtime
                .block_on(self.client.patch_record(&format!("/wallet-connect/{id}"), &wallet)),
            None => runtime.block_on(self.client.create_record("/wallet-connect", &wallet)),
        }
    }

    fn delete_wallet_option(&self, id: &str) -> ServiceResult<()> {
        Self::runtime()?.block_on(self.client.delete_record(&format!("/wallet-connect/{id}")))
    }

    fn list_platform_assets(&self) -> ServiceResult<Vec<PlatformAsset>> {
        Self::runtime()?.block_on(self.client.list_records("/platform-asset"))
    }

    fn log_action(&self, action: &str, actor: Option<&str>, details: &Value) -> ServiceResult<()> {
        // No audit endpoint on the backend; keep the trail in structured logs.
        info!(action, actor, %details, "admin action");
        Ok(())
    }
}
