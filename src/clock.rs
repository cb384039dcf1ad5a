use chrono::{DateTime, Utc};

/// Injectable time source. All "now" timestamps written by the engine come
/// from one of these so tests can pin the clock.
#[derive(Debug, Clone, Copy)]
pub enum Clock {
    System,
    Fixed(DateTime<Utc>),
}

impl Clock {
    pub fn now(&self) -> DateTime<Utc> {
        match self {
            Clock::System => Utc::now(),
            Clock::Fixed(at) => *at,
        }
    }
}

impl Default for Clock {
    fn default() -> Self {
        Clock::System
    }
}
