//! Derived slot availability (never persisted)

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// One candidate slot and whether it can still be booked
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SlotAvailability {
    /// Slot start (HH:MM)
    #[schema(example = "09:00")]
    pub time: String,
    pub is_available: bool,
}

/// Query parameters for availability
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct AvailabilityQuery {
    /// Barber ID
    pub barber_id: Option<String>,
    /// Date (YYYY-MM-DD)
    pub date: Option<String>,
}
