// Background jobs

pub mod reward_expirer;
