use std::sync::Arc;

use crate::{
    config::Config,
    db::connection::{DbPool, HealthProbe},
    middleware::rate_limit::UserRateLimiter,
    repositories::{SessionRepository, SessionRepositoryTrait, UserDirectory, UserRepository},
    services::{ScheduleService, TimeService},
    utils::time::{Clock, SystemClock},
};

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub time_service: TimeService,
    pub schedule_service: ScheduleService,
    pub rate_limiter: Arc<UserRateLimiter>,
    pub health: Arc<dyn HealthProbe>,
}

impl AppState {
    pub fn new(
        config: Config,
        sessions: Arc<dyn SessionRepositoryTrait>,
        users: Arc<dyn UserDirectory>,
        clock: Arc<dyn Clock>,
        health: Arc<dyn HealthProbe>,
    ) -> Self {
        let rate_limiter = Arc::new(UserRateLimiter::new(
            config.rate_limit_user_max_requests,
            config.rate_limit_window(),
        ));
        Self {
            time_service: TimeService::new(sessions.clone(), users.clone(), clock.clone()),
            schedule_service: ScheduleService::new(sessions, users, clock),
            rate_limiter,
            health,
            config,
        }
    }

    /// Production wiring: Postgres stores and the system clock.
    pub fn from_pool(pool: DbPool, config: Config) -> Self {
        Self::new(
            config,
            Arc::new(SessionRepository::new(pool.clone())),
            Arc::new(UserRepository::new(pool.clone())),
            Arc::new(SystemClock),
            Arc::new(pool),
        )
    }
}
