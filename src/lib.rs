pub mod auth;
pub mod gateway;
pub mod listing;
pub mod logging;
pub mod manage_stakes;
pub mod manage_subscriptions;
pub mod manage_traders;
pub mod manage_transactions;
pub mod manage_wallets;
pub mod moderation;
pub mod rest;
pub mod services;
pub mod stake_config;
