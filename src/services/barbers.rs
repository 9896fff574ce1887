//! Barbers service

use uuid::Uuid;

use crate::{error::AppResult, models::barber::Barber, repository::Repository};

#[derive(Clone)]
pub struct BarbersService {
    repository: Repository,
}

impl BarbersService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Barbers open for booking
    pub async fn list_active(&self) -> AppResult<Vec<Barber>> {
        self.repository.barbers.list_active().await
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Barber> {
        self.repository.barbers.get_by_id(id).await
    }
}
