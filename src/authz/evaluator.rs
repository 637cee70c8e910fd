use super::{PermissionTable, Role};

/// Paths under this prefix never fall back to a base-path match.
pub const API_PREFIX: &str = "/api";

/// Decides whether `role` may open `path`.
///
/// Evaluation order:
/// 1. role missing from the table -> deny
/// 2. exact match in the role's allow-list -> allow
/// 3. nested action path (`/resource/add`) -> deny, these are opt-in per role
/// 4. API path -> deny, API paths only ever match exactly
/// 5. base path (`/resource`) in the allow-list -> allow
pub fn is_allowed(table: &PermissionTable, role: Role, path: &str) -> bool {
    let Some(allowed) = table.allowed_paths(role) else {
        tracing::debug!(role = %role, path, "role has no permission entry");
        return false;
    };

    if allowed.iter().any(|entry| entry == path) {
        return true;
    }

    let mut segments = path.split('/').skip(1);
    let first = segments.next().unwrap_or_default();

    if segments.next().is_some_and(|second| !second.is_empty()) {
        return false;
    }

    if path.starts_with(API_PREFIX) {
        return false;
    }

    let base = format!("/{first}");
    allowed.iter().any(|entry| *entry == base)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> PermissionTable {
        PermissionTable::new()
            .with_role(Role::Staff, ["/profile", "/manage-course", "/manage-staff", "/api/reports"])
            .with_role(Role::Admin, ["/manage-course", "/manage-course/add"])
    }

    #[test]
    fn exact_entries_are_allowed() {
        let table = table();
        assert!(is_allowed(&table, Role::Staff, "/profile"));
        assert!(is_allowed(&table, Role::Staff, "/api/reports"));
        assert!(is_allowed(&table, Role::Admin, "/manage-course/add"));
    }

    #[test]
    fn nested_action_paths_need_their_own_entry() {
        let table = table();
        assert!(is_allowed(&table, Role::Staff, "/manage-course"));
        assert!(!is_allowed(&table, Role::Staff, "/manage-course/add"));
        assert!(!is_allowed(&table, Role::Staff, "/manage-course/edit"));
        assert!(!is_allowed(&table, Role::Staff, "/profile/settings/security"));
    }

    #[test]
    fn api_paths_never_match_by_prefix() {
        let table = PermissionTable::new().with_role(Role::Staff, ["/api"]);
        assert!(is_allowed(&table, Role::Staff, "/api"));
        assert!(!is_allowed(&table, Role::Staff, "/api/staff"));
        assert!(!is_allowed(&table, Role::Staff, "/api/"));
        assert!(!is_allowed(&table, Role::Staff, "/apis"));
    }

    #[test]
    fn single_segment_paths_fall_back_to_base() {
        let table = table();
        assert!(is_allowed(&table, Role::Staff, "/profile/"));
        assert!(!is_allowed(&table, Role::Staff, "/profile?tab=1"));
        assert!(!is_allowed(&table, Role::Staff, "/results"));
        assert!(!is_allowed(&table, Role::Staff, "/"));
    }

    #[test]
    fn root_is_allowed_only_when_listed() {
        let table = PermissionTable::new().with_role(Role::Student, ["/"]);
        assert!(is_allowed(&table, Role::Student, "/"));
        assert!(!is_allowed(&table, Role::Student, "/dashboard"));
    }

    #[test]
    fn roles_without_entry_are_always_denied() {
        let table = table();
        for path in ["/", "/profile", "/manage-course", "/manage-course/add", "/api/reports", ""] {
            assert!(!is_allowed(&table, Role::Student, path), "student allowed {path}");
            assert!(!is_allowed(&table, Role::SuperAdmin, path), "super admin allowed {path}");
        }
    }

    #[test]
    fn decisions_are_deterministic() {
        let table = table();
        for role in Role::ALL {
            for path in ["/profile", "/manage-course/add", "/api/reports", "/x"] {
                assert_eq!(is_allowed(&table, role, path), is_allowed(&table, role, path));
            }
        }
    }
}
