//! Business logic services

pub mod availability;
pub mod barbers;
pub mod booking;
pub mod cache;
pub mod redis;
pub mod retry;
pub mod schedule;
pub mod working_hours;

use std::sync::Arc;

use crate::{config::BookingConfig, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub availability: availability::AvailabilityService,
    pub booking: booking::BookingService,
    pub barbers: barbers::BarbersService,
    pub working_hours: working_hours::WorkingHoursService,
    pub repository: Repository,
}

impl Services {
    /// Wire every service onto the Postgres repositories and the given cache
    pub fn new(repository: Repository, config: &BookingConfig, cache: Arc<dyn cache::AvailabilityCache>) -> Self {
        let retry = retry::RetryPolicy::from_config(config);
        let resolver = schedule::ScheduleResolver::new(Arc::new(repository.working_hours.clone()), retry);
        let appointments = Arc::new(repository.appointments.clone());

        Self {
            availability: availability::AvailabilityService::new(
                resolver.clone(),
                appointments.clone(),
                cache.clone(),
                config,
            ),
            booking: booking::BookingService::new(
                resolver.clone(),
                appointments,
                Arc::new(repository.barbers.clone()),
                cache.clone(),
                config,
            ),
            barbers: barbers::BarbersService::new(repository.clone()),
            working_hours: working_hours::WorkingHoursService::new(
                Arc::new(repository.working_hours.clone()),
                resolver,
                cache,
            ),
            repository,
        }
    }
}
