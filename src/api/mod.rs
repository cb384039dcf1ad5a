// API module - HTTP endpoints

pub mod coupons;
pub mod health;
pub mod reward_accounts;
pub mod rewards;
pub mod statistics;
pub mod submissions;

use sqlx::PgPool;

use crate::clock::Clock;
use crate::config::Config;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Config,
    pub clock: Clock,
    pub cipher_key: [u8; 32],
}
