use super::Role;
use serde::Serialize;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Operation {
    ViewJobs,
    PostJob,
    ManageOwnJobs,
    ApplyToJob,
    ViewOwnApplications,
    ManageJobApplications,
    ReviewWorker,
    ViewWorkerReviews,
    DeleteAnyJob,
    ManageUsers,
    ViewAnalytics,
    ManageOwnProfile,
}

impl Operation {
    pub const ALL: [Operation; 12] = [
        Operation::ViewJobs,
        Operation::PostJob,
        Operation::ManageOwnJobs,
        Operation::ApplyToJob,
        Operation::ViewOwnApplications,
        Operation::ManageJobApplications,
        Operation::ReviewWorker,
        Operation::ViewWorkerReviews,
        Operation::DeleteAnyJob,
        Operation::ManageUsers,
        Operation::ViewAnalytics,
        Operation::ManageOwnProfile,
    ];
}

const ANY: &[Role] = &[Role::Worker, Role::Hirer, Role::Admin];

/// Allowed roles per operation. Anything not listed is denied.
const CAPABILITIES: &[(Operation, &[Role])] = &[
    (Operation::ViewJobs, ANY),
    (Operation::PostJob, &[Role::Hirer]),
    (Operation::ManageOwnJobs, &[Role::Hirer]),
    (Operation::ApplyToJob, &[Role::Worker]),
    (Operation::ViewOwnApplications, &[Role::Worker]),
    (Operation::ManageJobApplications, &[Role::Hirer]),
    (Operation::ReviewWorker, &[Role::Hirer]),
    (Operation::ViewWorkerReviews, ANY),
    (Operation::DeleteAnyJob, &[Role::Admin]),
    (Operation::ManageUsers, &[Role::Admin]),
    (Operation::ViewAnalytics, &[Role::Admin]),
    (Operation::ManageOwnProfile, ANY),
];

pub fn is_allowed(role: Role, operation: Operation) -> bool {
    CAPABILITIES
        .iter()
        .find(|(op, _)| *op == operation)
        .map(|(_, roles)| roles.contains(&role))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_operation_has_a_table_entry() {
        for op in Operation::ALL {
            assert!(
                CAPABILITIES.iter().any(|(entry, _)| *entry == op),
                "missing capability entry for {:?}",
                op
            );
        }
    }

    #[test]
    fn hirer_only_operations() {
        for op in [
            Operation::PostJob,
            Operation::ManageOwnJobs,
            Operation::ManageJobApplications,
            Operation::ReviewWorker,
        ] {
            assert!(is_allowed(Role::Hirer, op));
            assert!(!is_allowed(Role::Worker, op));
            assert!(!is_allowed(Role::Admin, op));
        }
    }

    #[test]
    fn worker_only_operations() {
        assert!(is_allowed(Role::Worker, Operation::ApplyToJob));
        assert!(is_allowed(Role::Worker, Operation::ViewOwnApplications));
        assert!(!is_allowed(Role::Hirer, Operation::ApplyToJob));
    }

    #[test]
    fn admin_panel_is_admin_only() {
        for op in [
            Operation::DeleteAnyJob,
            Operation::ManageUsers,
            Operation::ViewAnalytics,
        ] {
            assert!(is_allowed(Role::Admin, op));
            assert!(!is_allowed(Role::Worker, op));
            assert!(!is_allowed(Role::Hirer, op));
        }
    }

    #[test]
    fn shared_operations_are_open_to_all_roles() {
        for role in [Role::Worker, Role::Hirer, Role::Admin] {
            assert!(is_allowed(role, Operation::ViewJobs));
            assert!(is_allowed(role, Operation::ViewWorkerReviews));
            assert!(is_allowed(role, Operation::ManageOwnProfile));
        }
    }
}
