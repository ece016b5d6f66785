//! PostgreSQL repository implementations

mod payment_event;
mod story;
mod user;

pub use payment_event::PgPaymentEventRepository;
pub use story::PgStoryRepository;
pub use user::PgUserRepository;

use crate::DbPool;

/// All repositories bundled together
#[derive(Clone)]
pub struct Repositories {
    pub users: PgUserRepository,
    pub stories: PgStoryRepository,
    pub payment_events: PgPaymentEventRepository,
}

impl Repositories {
    /// Create all repositories from a database pool
    pub fn new(pool: DbPool) -> Self {
        Self {
            users: PgUserRepository::new(pool.clone()),
            stories: PgStoryRepository::new(pool.clone()),
            payment_events: PgPaymentEventRepository::new(pool),
        }
    }
}
