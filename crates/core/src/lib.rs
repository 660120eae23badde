//! Siakad Core Library
//!
//! Data models, the academic calendar / attendance engine, and storage for
//! the Siakad course-management system.

pub mod attendance;
pub mod error;
pub mod invariants;
pub mod meetings;
pub mod models;
pub mod storage;

pub use attendance::{evaluate, AttendanceOutcome, WindowPhase};
pub use error::{Error, Result};
pub use models::*;
pub use storage::{
    AccountRepository, AccountStore, AttendanceRepository, AttendanceStore, CalendarRepository,
    CalendarStore, CourseRepository, CourseStore, Database, EnrollmentStore, Storage,
};
