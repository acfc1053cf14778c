//! Permission constants.
//!
//! Route declarations and the default role catalogue reference these instead
//! of string literals so a typo cannot silently widen or narrow access.
//!
//! # Example
//!
//! ```ignore
//! use scolaguard_core::permissions;
//!
//! let route = RouteMeta::scoped().permissions([permissions::STUDENTS_MANAGE]);
//! ```

// =============================================================================
// Module administration
// =============================================================================

/// Permission to list modules and inspect their dependency status
pub const MODULES_READ: &str = "modules.read";
/// Permission to initialize, enable, disable or change module status
pub const MODULES_MANAGE: &str = "modules.manage";

// =============================================================================
// Scolarite
// =============================================================================

/// Permission to read students and classes
pub const STUDENTS_READ: &str = "students.read";
/// Permission to create, update and delete students
pub const STUDENTS_MANAGE: &str = "students.manage";

// =============================================================================
// Finances
// =============================================================================

/// Permission to read fees, invoices and payments
pub const FINANCES_READ: &str = "finances.read";
/// Permission to record payments and edit fee schedules
pub const FINANCES_MANAGE: &str = "finances.manage";

// =============================================================================
// Examens
// =============================================================================

/// Permission to read exams and grades
pub const EXAMS_READ: &str = "exams.read";
/// Permission to create exams and enter grades
pub const EXAMS_MANAGE: &str = "exams.manage";

// =============================================================================
// Presences
// =============================================================================

pub const ATTENDANCE_READ: &str = "attendance.read";
pub const ATTENDANCE_MANAGE: &str = "attendance.manage";

// =============================================================================
// Other modules
// =============================================================================

pub const TIMETABLE_READ: &str = "timetable.read";
pub const TIMETABLE_MANAGE: &str = "timetable.manage";
pub const ADMISSIONS_MANAGE: &str = "admissions.manage";
pub const COMMUNICATION_SEND: &str = "communication.send";
pub const STAFF_MANAGE: &str = "staff.manage";
pub const REPORTS_READ: &str = "reports.read";
pub const SETTINGS_MANAGE: &str = "settings.manage";

// =============================================================================
// Audit
// =============================================================================

/// Permission to read the audit trail
pub const AUDIT_READ: &str = "audit.read";

/// Every permission known to the platform, in declaration order.
pub const ALL: &[&str] = &[
    MODULES_READ,
    MODULES_MANAGE,
    STUDENTS_READ,
    STUDENTS_MANAGE,
    FINANCES_READ,
    FINANCES_MANAGE,
    EXAMS_READ,
    EXAMS_MANAGE,
    ATTENDANCE_READ,
    ATTENDANCE_MANAGE,
    TIMETABLE_READ,
    TIMETABLE_MANAGE,
    ADMISSIONS_MANAGE,
    COMMUNICATION_SEND,
    STAFF_MANAGE,
    REPORTS_READ,
    SETTINGS_MANAGE,
    AUDIT_READ,
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_permissions_are_unique() {
        let unique: HashSet<_> = ALL.iter().collect();
        assert_eq!(unique.len(), ALL.len());
    }

    #[test]
    fn test_permissions_use_dot_notation() {
        for perm in ALL {
            let (resource, action) = perm.split_once('.').unwrap();
            assert!(!resource.is_empty());
            assert!(!action.is_empty());
        }
    }
}
