use serde::Serialize;

use super::AuthError;

/// `domain:action` permission string, e.g. `order:edit`
pub type Permission = &'static str;

/// One catalog group as served by `GET /api/roles/permissions`
#[derive(Debug, Clone, Serialize)]
pub struct PermissionGroup {
    pub domain: &'static str,
    pub actions: &'static [&'static str],
}

const CRUD: &[&str] = &["view", "create", "edit", "delete"];

pub const CATALOG: &[PermissionGroup] = &[
    PermissionGroup { domain: "client", actions: CRUD },
    PermissionGroup { domain: "employee", actions: &["view", "create", "edit", "delete", "payroll"] },
    PermissionGroup { domain: "user", actions: CRUD },
    PermissionGroup { domain: "role", actions: CRUD },
    PermissionGroup { domain: "order", actions: CRUD },
    PermissionGroup { domain: "invoice", actions: CRUD },
    PermissionGroup { domain: "notice", actions: CRUD },
    PermissionGroup { domain: "schedule", actions: CRUD },
    PermissionGroup { domain: "report", actions: CRUD },
    PermissionGroup { domain: "approval", actions: &["view", "create", "review"] },
    PermissionGroup { domain: "file", actions: &["view", "upload", "delete"] },
];

pub const CLIENT_VIEW: Permission = "client:view";
pub const CLIENT_CREATE: Permission = "client:create";
pub const CLIENT_EDIT: Permission = "client:edit";
pub const CLIENT_DELETE: Permission = "client:delete";
pub const EMPLOYEE_VIEW: Permission = "employee:view";
pub const EMPLOYEE_CREATE: Permission = "employee:create";
pub const EMPLOYEE_EDIT: Permission = "employee:edit";
pub const EMPLOYEE_DELETE: Permission = "employee:delete";
pub const EMPLOYEE_PAYROLL: Permission = "employee:payroll";
pub const USER_VIEW: Permission = "user:view";
pub const USER_CREATE: Permission = "user:create";
pub const USER_EDIT: Permission = "user:edit";
pub const USER_DELETE: Permission = "user:delete";
pub const ROLE_VIEW: Permission = "role:view";
pub const ROLE_CREATE: Permission = "role:create";
pub const ROLE_EDIT: Permission = "role:edit";
pub const ROLE_DELETE: Permission = "role:delete";
pub const ORDER_VIEW: Permission = "order:view";
pub const ORDER_CREATE: Permission = "order:create";
pub const ORDER_EDIT: Permission = "order:edit";
pub const ORDER_DELETE: Permission = "order:delete";
pub const INVOICE_VIEW: Permission = "invoice:view";
pub const INVOICE_CREATE: Permission = "invoice:create";
pub const INVOICE_EDIT: Permission = "invoice:edit";
pub const INVOICE_DELETE: Permission = "invoice:delete";
pub const NOTICE_VIEW: Permission = "notice:view";
pub const NOTICE_CREATE: Permission = "notice:create";
pub const NOTICE_EDIT: Permission = "notice:edit";
pub const NOTICE_DELETE: Permission = "notice:delete";
pub const SCHEDULE_VIEW: Permission = "schedule:view";
pub const SCHEDULE_CREATE: Permission = "schedule:create";
pub const SCHEDULE_EDIT: Permission = "schedule:edit";
pub const SCHEDULE_DELETE: Permission = "schedule:delete";
pub const REPORT_VIEW: Permission = "report:view";
pub const REPORT_CREATE: Permission = "report:create";
pub const REPORT_EDIT: Permission = "report:edit";
pub const REPORT_DELETE: Permission = "report:delete";
pub const APPROVAL_VIEW: Permission = "approval:view";
pub const APPROVAL_CREATE: Permission = "approval:create";
pub const APPROVAL_REVIEW: Permission = "approval:review";
pub const FILE_VIEW: Permission = "file:view";
pub const FILE_UPLOAD: Permission = "file:upload";
pub const FILE_DELETE: Permission = "file:delete";

/// Every permission string in catalog order
pub fn all() -> Vec<String> {
    CATALOG
        .iter()
        .flat_map(|group| group.actions.iter().map(move |action| format!("{}:{}", group.domain, action)))
        .collect()
}

pub fn is_known(permission: &str) -> bool {
    match permission.split_once(':') {
        Some((domain, action)) => CATALOG
            .iter()
            .any(|group| group.domain == domain && group.actions.contains(&action)),
        None => false,
    }
}

/// Reject any permission string the catalog does not define
pub fn validate(permissions: &[String]) -> Result<(), AuthError> {
    let unknown: Vec<String> = permissions.iter().filter(|p| !is_known(p)).cloned().collect();
    if unknown.is_empty() {
        Ok(())
    } else {
        Err(AuthError::UnknownPermission(unknown))
    }
}

pub fn has_permission(granted: &[String], required: &str) -> bool {
    granted.iter().any(|p| p == required)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_contains_named_constants() {
        let all = all();
        for perm in [CLIENT_VIEW, EMPLOYEE_PAYROLL, APPROVAL_REVIEW, FILE_UPLOAD, ROLE_DELETE] {
            assert!(all.iter().any(|p| p == perm), "{} missing from catalog", perm);
            assert!(is_known(perm));
        }
    }

    #[test]
    fn unknown_permissions_are_listed() {
        let perms = vec!["order:view".to_string(), "order:fly".to_string(), "nonsense".to_string()];
        match validate(&perms) {
            Err(AuthError::UnknownPermission(unknown)) => assert_eq!(unknown, vec!["order:fly", "nonsense"]),
            other => panic!("unexpected: {:?}", other),
        }
        assert!(validate(&["invoice:create".to_string()]).is_ok());
    }

    #[test]
    fn membership_is_exact() {
        let granted = vec!["order:view".to_string()];
        assert!(has_permission(&granted, ORDER_VIEW));
        assert!(!has_permission(&granted, ORDER_EDIT));
        assert!(!has_permission(&granted, "order"));
    }
}
