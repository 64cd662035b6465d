use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, Mutex};
use thiserror::Error;

pub mod rest;

pub type ServiceResult<T> = Result<T, AdminError>;

#[derive(Debug, Error)]
pub enum AdminError {
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("not authenticated")]
    Unauthenticated,
    #[error("validation error: {0}")]
    Validation(String),
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("backend returned HTTP {status}: {message}")]
    Http { status: u16, message: String },
    #[error("internal error: {0}")]
    Internal(String),
}

#[derive(Clone, Debug, Default)]
pub struct DataBag {
    inner: HashMap<String, Value>,
}

impl DataBag {
    pub fn new() -> Self {
        Self {
            inner: HashMap::new(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.inner.get(key)
    }

    pub fn set<T: Serialize>(&mut self, key: &str, value: T) {
        self.inner.insert(
            key.to_string(),
            serde_json::to_value(value).unwrap_or(Value::Null),
        );
    }

    pub fn remove(&mut self, key: &str) {
        self.inner.remove(key);
    }

    pub fn bool(&self, key: &str) -> bool {
        self.inner
            .get(key)
            .and_then(|value| value.as_bool())
            .unwrap_or(false)
    }

    pub fn int(&self, key: &str) -> Option<i64> {
        self.inner.get(key).and_then(|value| value.as_i64())
    }

    pub fn float(&self, key: &str) -> Option<f64> {
        self.inner.get(key).and_then(|value| value.as_f64())
    }

    pub fn string(&self, key: &str) -> Option<String> {
        self.inner
            .get(key)
            .and_then(|value| value.as_str().map(|s| s.to_string()))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.inner.contains_key(key)
    }
}

#[derive(Clone, Debug, Default)]
pub struct RequestVars {
    data: DataBag,
}

impl RequestVars {
    pub fn new() -> Self {
        Self {
            data: DataBag::new(),
        }
    }

    pub fn bool(&self, key: &str) -> bool {
        self.data.bool(key)
    }

    pub fn int(&self, key: &str) -> Option<i64> {
        self.data.int(key)
    }

    pub fn float(&self, key: &str) -> Option<f64> {
        self.data.float(key)
    }

    pub fn string(&self, key: &str) -> Option<String> {
        self.data.string(key)
    }

    pub fn set<T: Serialize>(&mut self, key: &str, value: T) {
        self.data.set(key, value);
    }

    pub fn remove(&mut self, key: &str) {
        self.data.remove(key);
    }

    pub fn contains(&self, key: &str) -> bool {
        self.data.contains(key)
    }
}

#[derive(Clone, Debug)]
pub struct AdminUser {
    pub id: String,
    pub name: String,
    pub permissions: HashSet<String>,
}

impl Default for AdminUser {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: String::from("Guest"),
            permissions: HashSet::new(),
        }
    }
}

/// Per-view working context: request variables coming in, rendered view data
/// going out, plus the in-flight action keys used to suppress duplicate
/// dispatch of the same mutation.
#[derive(Clone, Debug, Default)]
pub struct AdminContext {
    pub context: DataBag,
    pub request: RequestVars,
    pub settings: DataBag,
    pub user: AdminUser,
    in_flight: HashSet<String>,
}

impl AdminContext {
    /// Marks `key` as in flight. Returns false when an action with the same
    /// key is already outstanding, in which case the caller must refuse.
    pub fn begin_action(&mut self, key: &str) -> bool {
        self.in_flight.insert(key.to_string())
    }

    pub fn finish_action(&mut self, key: &str) {
        self.in_flight.remove(key);
    }

    pub fn action_in_flight(&self, key: &str) -> bool {
        self.in_flight.contains(key)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionKind {
    Deposit,
    Withdrawal,
    Staking,
    Signals,
    Subscription,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Deposit => "DEPOSIT",
            TransactionKind::Withdrawal => "WITHDRAWAL",
            TransactionKind::Staking => "STAKING",
            TransactionKind::Signals => "SIGNALS",
            TransactionKind::Subscription => "SUBSCRIPTION",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    Pending,
    Completed,
    Failed,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "PENDING",
            TransactionStatus::Completed => "COMPLETED",
            TransactionStatus::Failed => "FAILED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, TransactionStatus::Pending)
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    #[serde(default, alias = "_id")]
    pub id: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub platform_asset_id: Option<String>,
    pub amount: f64,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub status: TransactionStatus,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

/// Admin-authored staking price band: transactions with an amount inside
/// `[min, max]` are charged `price` on approval. Bands may overlap; listing
/// order decides which one wins.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StakeTier {
    #[serde(default, alias = "_id")]
    pub id: Option<String>,
    pub min: f64,
    pub max: f64,
    pub price: f64,
    #[serde(default)]
    pub cycle: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionPlan {
    #[serde(default, alias = "_id")]
    pub id: Option<String>,
    pub name: String,
    pub price: f64,
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub min_profit: f64,
    #[serde(default)]
    pub max_profit: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraderProfile {
    #[serde(default, alias = "_id")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub win_rate: f64,
    #[serde(default)]
    pub profit_share: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletOption {
    #[serde(default, alias = "_id")]
    pub id: Option<String>,
    pub name: String,
    pub address: String,
    #[serde(default)]
    pub network: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformAsset {
    #[serde(default, alias = "_id")]
    pub id: String,
    pub symbol: String,
    pub name: String,
}

#[derive(Clone, Debug)]
pub struct ActionLogEntry {
    pub id: i64,
    pub action: String,
    pub actor: Option<String>,
    pub details: Value,
    pub logged_at: DateTime<Utc>,
}

/// Backend abstraction: the REST API in production, `InMemoryService` in
/// tests and demos. One method per endpoint family; save with an id updates,
/// without an id creates.
pub trait PlatformService {
    fn list_transactions(&self) -> ServiceResult<Vec<TransactionRecord>>;
    fn get_transaction(&self, id: &str) -> ServiceResult<Option<TransactionRecord>>;
    fn update_transaction(
        &self,
        id: &str,
        status: TransactionStatus,
        amount: f64,
    ) -> ServiceResult<TransactionRecord>;
    fn delete_transaction(&self, id: &str) -> ServiceResult<()>;
    fn list_stake_tiers(&self) -> ServiceResult<Vec<StakeTier>>;
    fn save_stake_tier(&self, tier: StakeTier) -> ServiceResult<StakeTier>;
    fn delete_stake_tier(&self, id: &str) -> ServiceResult<()>;
    fn list_subscription_plans(&self) -> ServiceResult<Vec<SubscriptionPlan>>;
    fn save_subscription_plan(&self, plan: SubscriptionPlan) -> ServiceResult<SubscriptionPlan>;
    fn delete_subscription_plan(&self, id: &str) -> ServiceResult<()>;
    fn list_traders(&self) -> ServiceResult<Vec<TraderProfile>>;
    fn save_trader(&self, trader: TraderProfile) -> ServiceResult<TraderProfile>;
    fn delete_trader(&self, id: &str) -> ServiceResult<()>;
    fn list_wallet_options(&self) -> ServiceResult<Vec<WalletOption>>;
    fn save_wallet_option(&self, wallet: WalletOption) -> ServiceResult<WalletOption>;
    fn delete_wallet_option(&self, id: &str) -> ServiceResult<()>;
    fn list_platform_assets(&self) -> ServiceResult<Vec<PlatformAsset>>;
    fn log_action(&self, action: &str, actor: Option<&str>, details: &Value) -> ServiceResult<()>;
}

pub fn ensure(condition: bool, error: AdminError) -> ServiceResult<()> {
    if condition { Ok(()) } else { Err(error) }
}

pub fn ensure_permission(ctx: &AdminContext, permission: &str) -> ServiceResult<()> {
    ensure(
        ctx.user.permissions.contains(permission),
        AdminError::PermissionDenied(permission.into()),
    )
}

#[derive(Default)]
struct InMemoryState {
    transactions: Vec<TransactionRecord>,
    stake_tiers: Vec<StakeTier>,
    subscription_plans: Vec<SubscriptionPlan>,
    traders: Vec<TraderProfile>,
    wallet_options: Vec<WalletOption>,
    platform_assets: Vec<PlatformAsset>,
    action_logs: Vec<ActionLogEntry>,
    next_id: i64,
}

impl InMemoryState {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}-{}", self.next_id)
    }
}

#[derive(Clone)]
pub struct InMemoryService {
    state: Arc<Mutex<InMemoryState>>,
}

impl InMemoryService {
    pub fn new_with_sample() -> Self {
        let service = Self::default();
        {
            let mut state = service.state.lock().expect("state poisoned");
            state.next_id = 100;
            state.stake_tiers = vec![
                StakeTier {
                    id: Some("tier-a".into()),
                    min: 100.0,
                    max: 500.0,
                    price: 10.0,
                    cycle: "monthly".into(),
                },
                StakeTier {
                    id: Some("tier-b".into()),
                    min: 500.0,
                    max: 1000.0,
                    price: 25.0,
                    cycle: "monthly".into(),
                },
                StakeTier {
                    id: Some("tier-c".into()),
                    min: 1000.0,
                    max: 10_000.0,
                    price: 60.0,
                    cycle: "quarterly".into(),
                },
            ];
            state.transactions = vec![
                TransactionRecord {
                    id: "tx-1".into(),
                    user_id: "user-7".into(),
                    platform_asset_id: Some("asset-btc".into()),
                    amount: 250.0,
                    kind: TransactionKind::Deposit,
                    status: TransactionStatus::Pending,
                    created_at: Utc::now(),
                },
                TransactionRecord {
                    id: "tx-2".into(),
                    user_id: "user-7".into(),
                    platform_asset_id: Some("asset-usdt".into()),
                    amount: 500.0,
                    kind: TransactionKind::Staking,
                    status: TransactionStatus::Pending,
                    created_at: Utc::now(),
                },
                TransactionRecord {
                    id: "tx-3".into(),
                    user_id: "user-9".into(),
                    platform_asset_id: Some("asset-eth".into()),
                    amount: 1200.0,
                    kind: TransactionKind::Withdrawal,
                    status: TransactionStatus::Completed,
                    created_at: Utc::now(),
                },
                TransactionRecord {
                    id: "tx-4".into(),
                    user_id: "user-3".into(),
                    platform_asset_id: None,
                    amount: 49.0,
                    kind: TransactionKind::Staking,
                    status: TransactionStatus::Pending,
                    created_at: Utc::now(),
                },
            ];
            state.subscription_plans = vec![SubscriptionPlan {
                id: Some("plan-1".into()),
                name: "Pro Signals".into(),
                price: 99.0,
                duration: "30d".into(),
                min_profit: 5.0,
                max_profit: 18.0,
            }];
            state.traders = vec![
                TraderProfile {
                    id: Some("trader-1".into()),
                    name: "Nova Desk".into(),
                    win_rate: 72.5,
                    profit_share: 20.0,
                },
                TraderProfile {
                    id: Some("trader-2".into()),
                    name: "Atlas Macro".into(),
                    win_rate: 64.0,
                    profit_share: 15.0,
                },
            ];
            state.wallet_options = vec![WalletOption {
                id: Some("wallet-1".into()),
                name: "BTC Treasury".into(),
                address: "bc1q9h7fj3m2xw4l5t8".into(),
                network: "bitcoin".into(),
            }];
            state.platform_assets = vec![
                PlatformAsset {
                    id: "asset-btc".into(),
                    symbol: "BTC".into(),
                    name: "Bitcoin".into(),
                },
                PlatformAsset {
                    id: "asset-eth".into(),
                    symbol: "ETH".into(),
                    name: "Ethereum".into(),
                },
                PlatformAsset {
                    id: "asset-usdt".into(),
                    symbol: "USDT".into(),
                    name: "Tether".into(),
                },
            ];
        }
        service
    }

    pub fn action_logs(&self) -> Vec<ActionLogEntry> {
        self.state
            .lock()
            .expect("state poisoned")
            .action_logs
            .clone()
    }
}

impl Default for InMemoryService {
    fn default() -> Self {
        Self {
            state: Arc::new(Mutex::new(InMemoryState::default())),
        }
    }
}

impl PlatformService for InMemoryService {
    fn list_transactions(&self) -> ServiceResult<Vec<TransactionRecord>> {
        Ok(self
            .state
            .lock()
            .expect("state poisoned")
            .transactions
            .clone())
    }

    fn get_transaction(&self, id: &str) -> ServiceResult<Option<TransactionRecord>> {
        let state = self.state.lock().expect("state poisoned");
        Ok(state.transactions.iter().find(|tx| tx.id == id).cloned())
    }

    fn update_transaction(
        &self,
        id: &str,
        status: TransactionStatus,
        amount: f64,
    ) -> ServiceResult<TransactionRecord> {
        let mut state = self.state.lock().expect("state poisoned");
        let tx = state
            .transactions
            .iter_mut()
            .find(|tx| tx.id == id)
            .ok_or_else(|| AdminError::NotFound(format!("transaction {id}")))?;
        tx.status = status;
        tx.amount = amount;
        Ok(tx.clone())
    }

    fn delete_transaction(&self, id: &str) -> ServiceResult<()> {
        let mut state = self.state.lock().expect("state poisoned");
        let before = state.transactions.len();
        state.transactions.retain(|tx| tx.id != id);
        ensure(
            state.transactions.len() < before,
            AdminError::NotFound(format!("transaction {id}")),
        )
    }

    fn list_stake_tiers(&self) -> ServiceResult<Vec<StakeTier>> {
        Ok(self
            .state
            .lock()
            .expect("state poisoned")
            .stake_tiers
            .clone())
    }

    fn save_stake_tier(&self, mut tier: StakeTier) -> ServiceResult<StakeTier> {
        let mut state = self.state.lock().expect("state poisoned");
        match tier.id.clone() {
            Some(id) => {
                let existing = state
                    .stake_tiers
                    .iter_mut()
                    .find(|candidate| candidate.id.as_deref() == Some(id.as_str()))
                    .ok_or_else(|| AdminError::NotFound(format!("stake tier {id}")))?;
                *existing = tier.clone();
            }
            None => {
                tier.id = Some(state.next_id("tier"));
                state.stake_tiers.push(tier.clone());
            }
        }
        Ok(tier)
    }

    fn delete_stake_tier(&self, id: &str) -> ServiceResult<()> {
        let mut state = self.state.lock().expect("state poisoned");
        let before = state.stake_tiers.len();
        state
            .stake_tiers
            .retain(|tier| tier.id.as_deref() != Some(id));
        ensure(
            state.stake_tiers.len() < before,
            AdminError::NotFound(format!("stake tier {id}")),
        )
    }

    fn list_subscription_plans(&self) -> ServiceResult<Vec<SubscriptionPlan>> {
        Ok(self
            .state
            .lock()
            .expect("state poisoned")
            .subscription_plans
            .clone())
    }

    fn save_subscription_plan(&self, mut plan: SubscriptionPlan) -> ServiceResult<SubscriptionPlan> {
        let mut state = self.state.lock().expect("state poisoned");
        match plan.id.clone() {
            Some(id) => {
                let existing = state
                    .subscription_plans
                    .iter_mut()
                    .find(|candidate| candidate.id.as_deref() == Some(id.as_str()))
                    .ok_or_else(|| AdminError::NotFound(format!("subscription plan {id}")))?;
                *existing = plan.clone();
            }
            None => {
                plan.id = Some(state.next_id("plan"));
                state.subscription_plans.push(plan.clone());
            }
        }
        Ok(plan)
    }

    fn delete_subscription_plan(&self, id: &str) -> ServiceResult<()> {
        let mut state = self.state.lock().expect("state poisoned");
        let before = state.subscription_plans.len();
        state
            .subscription_plans
            .retain(|plan| plan.id.as_deref() != Some(id));
        ensure(
            state.subscription_plans.len() < before,
            AdminError::NotFound(format!("subscription plan {id}")),
        )
    }

    fn list_traders(&self) -> ServiceResult<Vec<TraderProfile>> {
        Ok(self.state.lock().expect("state poisoned").traders.clone())
    }

    fn save_trader(&self, mut trader: TraderProfile) -> ServiceResult<TraderProfile> {
        let mut state = self.state.lock().expect("state poisoned");
        match trader.id.clone() {
            Some(id) => {
                let existing = state
                    .traders
                    .iter_mut()
                    .find(|candidate| candidate.id.as_deref() == Some(id.as_str()))
                    .ok_or_else(|| AdminError::NotFound(format!("trader {id}")))?;
                *existing = trader.clone();
            }
            None => {
                trader.id = Some(state.next_id("trader"));
                state.traders.push(trader.clone());
            }
        }
        Ok(trader)
    }

    fn delete_trader(&self, id: &str) -> ServiceResult<()> {
        let mut state = self.state.lock().expect("state poisoned");
        let before = state.traders.len();
        state
            .traders
            .retain(|trader| trader.id.as_deref() != Some(id));
        ensure(
            state.traders.len() < before,
            AdminError::NotFound(format!("trader {id}")),
        )
    }

    fn list_wallet_options(&self) -> ServiceResult<Vec<WalletOption>> {
        Ok(self
            .state
            .lock()
            .expect("state poisoned")
            .wallet_options
            .clone())
    }

    fn save_wallet_option(&self, mut wallet: WalletOption) -> ServiceResult<WalletOption> {
        let mut state = self.state.lock().expect("state poisoned");
        match wallet.id.clone() {
            Some(id) => {
                let existing = state
                    .wallet_options
                    .iter_mut()
                    .find(|candidate| candidate.id.as_deref() == Some(id.as_str()))
                    .ok_or_else(|| AdminError::NotFound(format!("wallet option {id}")))?;
                *existing = wallet.clone();
            }
            None => {
                wallet.id = Some(state.next_id("wallet"));
                state.wallet_options.push(wallet.clone());
            }
        }
        Ok(wallet)
    }

    fn delete_wallet_option(&self, id: &str) -> ServiceResult<()> {
        let mut state = self.state.lock().expect("state poisoned");
        let before = state.wallet_options.len();
        state
            .wallet_options
            .retain(|wallet| wallet.id.as_deref() != Some(id));
        ensure(
            state.wallet_options.len() < before,
            AdminError::NotFound(format!("wallet option {id}")),
        )
    }

    fn list_platform_assets(&self) -> ServiceResult<Vec<PlatformAsset>> {
        Ok(self
            .state
            .lock()
            .expect("state poisoned")
            .platform_assets
            .clone())
    }

    fn log_action(&self, action: &str, actor: Option<&str>, details: &Value) -> ServiceResult<()> {
        let mut state = self.state.lock().expect("state poisoned");
        let id = state.action_logs.len() as i64 + 1;
        state.action_logs.push(ActionLogEntry {
            id,
            action: action.to_string(),
            actor: actor.map(|actor| actor.to_string()),
            details: details.clone(),
            logged_at: Utc::now(),
        });
        Ok(())
    }
}
