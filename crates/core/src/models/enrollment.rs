//! Course selections made by students

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnrollmentState {
    /// Student takes the course; it appears on their schedule
    Taken,
    /// Student hid the course from the pick list
    Declined,
}

impl EnrollmentState {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnrollmentState::Taken => "taken",
            EnrollmentState::Declined => "declined",
        }
    }
}

/// A student's decision about one course session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enrollment {
    pub session_id: Uuid,
    pub student_id: Uuid,
    pub state: EnrollmentState,
    pub decided_at: DateTime<Utc>,
}

impl Enrollment {
    pub fn new(session_id: Uuid, student_id: Uuid, state: EnrollmentState) -> Self {
        Self {
            session_id,
            student_id,
            state,
            decided_at: Utc::now(),
        }
    }
}
