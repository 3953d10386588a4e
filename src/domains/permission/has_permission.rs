use serde::{Deserialize, Serialize};
use uuid::Uuid;

// --- User Role Definition ---

/// Organisational role of an employee, used for authorization and reporting scope
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub enum UserRole {
    #[serde(rename = "CEO")]
    Ceo,
    #[serde(rename = "Program Head")]
    ProgramHead,
    #[serde(rename = "Program Manager")]
    ProgramManager,
    #[serde(rename = "Business Manager")]
    BusinessManager,
    #[serde(rename = "Manager")]
    Manager,
    #[default]
    #[serde(rename = "Executives/Associates")]
    ExecutiveAssociate,
    #[serde(rename = "Admin")]
    Admin,
}

// --- Permission Enum Definition ---

/// Permission enum representing individual permissions in the system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Permission {
    // Employee directory
    ViewEmployees,
    ManageEmployees,
    ViewEmployeeCounts,

    // KPI permissions
    ViewKpis,
    CreateKpis,

    // Performance permissions
    ViewPerformance,
    RecordPerformance,
    SubmitSelfReview,
    SubmitManagerReview,

    // Course permissions
    ViewCourses,
    ManageCourses,
    TrackCourseProgress,
    ViewCourseAnalytics,
}

/// Which slice of the employee population a caller may aggregate over
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportingScope {
    /// Every employee in the organisation
    Organization,
    /// Employees whose manager is the given id
    DirectReports(Uuid),
    /// Nobody; the role has no subordinates to report on
    NoReports,
}

// --- UserRole Implementation ---

impl UserRole {
    pub const ALL: [UserRole; 7] = [
        UserRole::Ceo,
        UserRole::ProgramHead,
        UserRole::ProgramManager,
        UserRole::BusinessManager,
        UserRole::Manager,
        UserRole::ExecutiveAssociate,
        UserRole::Admin,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Ceo => "CEO",
            UserRole::ProgramHead => "Program Head",
            UserRole::ProgramManager => "Program Manager",
            UserRole::BusinessManager => "Business Manager",
            UserRole::Manager => "Manager",
            UserRole::ExecutiveAssociate => "Executives/Associates",
            UserRole::Admin => "Admin",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "CEO" => Some(UserRole::Ceo),
            "Program Head" => Some(UserRole::ProgramHead),
            "Program Manager" => Some(UserRole::ProgramManager),
            "Business Manager" => Some(UserRole::BusinessManager),
            "Manager" => Some(UserRole::Manager),
            "Executives/Associates" => Some(UserRole::ExecutiveAssociate),
            "Admin" => Some(UserRole::Admin),
            _ => None,
        }
    }

    /// Roles that can have people reporting to them
    pub fn is_people_manager(&self) -> bool {
        matches!(
            self,
            UserRole::Ceo
                | UserRole::ProgramHead
                | UserRole::ProgramManager
                | UserRole::BusinessManager
                | UserRole::Manager
        )
    }

    /// Single dispatch point for role-dependent aggregation
    pub fn reporting_scope(&self, acting_user_id: Uuid) -> ReportingScope {
        match self {
            UserRole::Ceo | UserRole::Admin => ReportingScope::Organization,
            UserRole::ProgramHead
            | UserRole::ProgramManager
            | UserRole::BusinessManager
            | UserRole::Manager => ReportingScope::DirectReports(acting_user_id),
            UserRole::ExecutiveAssociate => ReportingScope::NoReports,
        }
    }

    /// Check if the user has a specific permission
    pub fn has_permission(&self, permission: Permission) -> bool {
        match self {
            UserRole::Admin | UserRole::Ceo => true,
            UserRole::ProgramHead | UserRole::ProgramManager => true,
            UserRole::BusinessManager | UserRole::Manager => {
                match permission {
                    // Course catalogue and analytics stay with program leadership
                    Permission::ManageCourses | Permission::ViewCourseAnalytics => false,
                    _ => true,
                }
            }
            UserRole::ExecutiveAssociate => {
                match permission {
                    Permission::ViewKpis
                    | Permission::ViewPerformance
                    | Permission::SubmitSelfReview
                    | Permission::ViewCourses
                    | Permission::TrackCourseProgress
                    | Permission::ViewEmployeeCounts => true,

                    Permission::ViewEmployees
                    | Permission::ManageEmployees
                    | Permission::CreateKpis
                    | Permission::RecordPerformance
                    | Permission::SubmitManagerReview
                    | Permission::ManageCourses
                    | Permission::ViewCourseAnalytics => false,
                }
            }
        }
    }

    /// Check if the user has all of the specified permissions
    pub fn has_permissions(&self, permissions: &[Permission]) -> bool {
        permissions.iter().all(|p| self.has_permission(*p))
    }
}

// --- Permission Implementation (String Conversions & Listing) ---

impl Permission {
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::ViewEmployees => "view_employees",
            Permission::ManageEmployees => "manage_employees",
            Permission::ViewEmployeeCounts => "view_employee_counts",
            Permission::ViewKpis => "view_kpis",
            Permission::CreateKpis => "create_kpis",
            Permission::ViewPerformance => "view_performance",
            Permission::RecordPerformance => "record_performance",
            Permission::SubmitSelfReview => "submit_self_review",
            Permission::SubmitManagerReview => "submit_manager_review",
            Permission::ViewCourses => "view_courses",
            Permission::ManageCourses => "manage_courses",
            Permission::TrackCourseProgress => "track_course_progress",
            Permission::ViewCourseAnalytics => "view_course_analytics",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Self::all().into_iter().find(|p| p.as_str() == s)
    }

    /// Get all permissions in the system
    pub fn all() -> Vec<Permission> {
        vec![
            Permission::ViewEmployees, Permission::ManageEmployees, Permission::ViewEmployeeCounts,
            Permission::ViewKpis, Permission::CreateKpis,
            Permission::ViewPerformance, Permission::RecordPerformance,
            Permission::SubmitSelfReview, Permission::SubmitManagerReview,
            Permission::ViewCourses, Permission::ManageCourses,
            Permission::TrackCourseProgress, Permission::ViewCourseAnalytics,
        ]
    }
}
