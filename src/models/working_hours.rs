//! Working-hours models (recurring availability windows)

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::slots::TimeOfDay;

// ---------------------------------------------------------------------------
// RuleScope
// ---------------------------------------------------------------------------

/// Owner of a working-hours rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleScope {
    /// Applies to every barber without rules of their own
    BusinessDefault,
    Barber(Uuid),
}

impl RuleScope {
    pub fn barber_id(self) -> Option<Uuid> {
        match self {
            RuleScope::BusinessDefault => None,
            RuleScope::Barber(id) => Some(id),
        }
    }
}

impl From<Option<Uuid>> for RuleScope {
    fn from(barber_id: Option<Uuid>) -> Self {
        barber_id.map_or(RuleScope::BusinessDefault, RuleScope::Barber)
    }
}

// ---------------------------------------------------------------------------
// WorkingHoursRule
// ---------------------------------------------------------------------------

/// A recurring availability window for one day of the week
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct WorkingHoursRule {
    pub id: Uuid,
    /// Owning barber, `null` for business-default hours
    pub barber_id: Option<Uuid>,
    /// Day of week (0=Sunday, 6=Saturday)
    pub day_of_week: i16,
    /// First slot start (HH:MM)
    #[schema(value_type = String, example = "08:00")]
    pub start_time: TimeOfDay,
    /// Window end, exclusive (HH:MM)
    #[schema(value_type = String, example = "18:00")]
    pub end_time: TimeOfDay,
    /// Slot length in minutes
    pub interval_minutes: i32,
    pub is_active: bool,
    pub created_at: Option<DateTime<Utc>>,
}

/// Row as stored in `working_hours`
#[derive(Debug, Clone, FromRow)]
pub struct WorkingHoursRow {
    pub id: Uuid,
    pub barber_id: Option<Uuid>,
    pub day_of_week: i16,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub interval_minutes: i32,
    pub is_active: bool,
    pub created_at: Option<DateTime<Utc>>,
}

impl From<WorkingHoursRow> for WorkingHoursRule {
    fn from(row: WorkingHoursRow) -> Self {
        Self {
            id: row.id,
            barber_id: row.barber_id,
            day_of_week: row.day_of_week,
            start_time: row.start_time.into(),
            end_time: row.end_time.into(),
            interval_minutes: row.interval_minutes,
            is_active: row.is_active,
            created_at: row.created_at,
        }
    }
}

impl WorkingHoursRule {
    pub fn scope(&self) -> RuleScope {
        self.barber_id.into()
    }
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// One window of a rule set
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct RuleWindow {
    /// Start time (HH:MM)
    #[schema(value_type = String, example = "08:00")]
    pub start_time: TimeOfDay,
    /// End time, exclusive (HH:MM)
    #[schema(value_type = String, example = "12:00")]
    pub end_time: TimeOfDay,
    /// Slot length in minutes
    #[validate(range(min = 5, max = 240))]
    pub interval_minutes: i32,
}

/// Create working-hours rule request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateWorkingHoursRule {
    /// Barber ID, omit for business-default hours
    pub barber_id: Option<Uuid>,
    /// Day of week (0=Sunday, 6=Saturday)
    #[validate(range(min = 0, max = 6))]
    pub day_of_week: i16,
    #[serde(flatten)]
    #[validate(nested)]
    pub window: RuleWindow,
}

/// Replace every active rule of a (scope, day) with a new set
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ReplaceWorkingHours {
    /// Barber ID, omit for business-default hours
    pub barber_id: Option<Uuid>,
    /// Day of week (0=Sunday, 6=Saturday)
    #[validate(range(min = 0, max = 6))]
    pub day_of_week: i16,
    /// New windows; an empty list closes the day for this scope
    #[validate(nested)]
    pub windows: Vec<RuleWindow>,
}

/// Toggle a rule on or off
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UpdateRuleActive {
    pub is_active: bool,
}

/// Query parameters for listing rules
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct WorkingHoursQuery {
    /// Barber ID; business-default rules when omitted
    pub barber_id: Option<Uuid>,
    /// Include deactivated rules
    #[serde(default)]
    pub include_inactive: bool,
}

/// Query parameters for the schedule preview
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct SchedulePreviewQuery {
    /// Date (YYYY-MM-DD)
    pub date: String,
}

// ---------------------------------------------------------------------------
// Resolved schedule
// ---------------------------------------------------------------------------

/// Which configuration tier produced a slot list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleSource {
    BarberRules,
    BusinessDefault,
    FallbackTemplate,
}

impl ScheduleSource {
    /// Evaluation order of the resolver; the first tier with rules wins
    pub const PRECEDENCE: [ScheduleSource; 3] = [
        ScheduleSource::BarberRules,
        ScheduleSource::BusinessDefault,
        ScheduleSource::FallbackTemplate,
    ];
}

/// Structural slots for a barber on a date, before bookings are considered
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ResolvedSchedule {
    pub barber_id: Uuid,
    pub date: NaiveDate,
    pub source: ScheduleSource,
    #[schema(value_type = Vec<String>)]
    pub slots: Vec<TimeOfDay>,
}
