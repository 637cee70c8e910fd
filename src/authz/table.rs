use std::collections::HashMap;
use std::path::Path;

use super::{evaluator, Role};
use crate::errors::AppError;

/// Static role -> allowed route paths mapping. Built once at startup and
/// shared read-only behind an `Arc`.
#[derive(Debug, Clone, Default)]
pub struct PermissionTable {
    entries: HashMap<Role, Vec<String>>,
}

impl PermissionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `paths` to the allow-list of `role`, keeping first-seen order.
    pub fn with_role<I, P>(mut self, role: Role, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        let entry = self.entries.entry(role).or_default();
        for path in paths {
            let path = path.into();
            if !entry.contains(&path) {
                entry.push(path);
            }
        }
        self
    }

    pub fn allowed_paths(&self, role: Role) -> Option<&[String]> {
        self.entries.get(&role).map(Vec::as_slice)
    }

    pub fn is_allowed(&self, role: Role, path: &str) -> bool {
        evaluator::is_allowed(self, role, path)
    }

    /// The route table shipped with the application.
    pub fn standard() -> Self {
        const COMMON: [&str; 4] = ["/", "/dashboard", "/profile", "/access-denied"];

        Self::new()
            .with_role(Role::SuperAdmin, COMMON)
            .with_role(
                Role::SuperAdmin,
                [
                    "/manage-organization",
                    "/manage-organization/add",
                    "/manage-admin",
                    "/manage-admin/add",
                    "/manage-staff",
                    "/manage-student",
                    "/manage-course",
                    "/leave",
                    "/results",
                ],
            )
            .with_role(Role::Admin, COMMON)
            .with_role(
                Role::Admin,
                [
                    "/manage-admin",
                    "/manage-staff",
                    "/manage-staff/add",
                    "/manage-student",
                    "/manage-student/add",
                    "/manage-course",
                    "/manage-course/add",
                    "/attendance",
                    "/attendance/mark",
                    "/leave",
                    "/results",
                    "/results/add",
                ],
            )
            .with_role(Role::Staff, COMMON)
            .with_role(
                Role::Staff,
                [
                    "/manage-staff",
                    "/manage-student",
                    "/manage-course",
                    "/attendance",
                    "/attendance/mark",
                    "/leave",
                    "/leave/apply",
                    "/results",
                    "/results/add",
                ],
            )
            .with_role(Role::Student, COMMON)
            .with_role(
                Role::Student,
                ["/manage-course", "/attendance", "/leave", "/leave/apply", "/results"],
            )
    }

    /// Parses a `{ "ROLE": ["/path", ...] }` document.
    pub fn from_json_str(raw: &str) -> Result<Self, AppError> {
        let parsed: HashMap<String, Vec<String>> = serde_json::from_str(raw)
            .map_err(|err| AppError::configuration(format!("invalid permission table: {err}")))?;

        let mut table = Self::new();
        for (role_name, paths) in parsed {
            let role = role_name
                .parse::<Role>()
                .map_err(|err| AppError::configuration(err.to_string()))?;

            if let Some(bad) = paths.iter().find(|path| !path.starts_with('/')) {
                return Err(AppError::configuration(format!(
                    "permission path for {role} must start with '/': {bad}"
                )));
            }

            table = table.with_role(role, paths);
        }

        Ok(table)
    }

    pub fn from_file(path: &Path) -> Result<Self, AppError> {
        let raw = std::fs::read_to_string(path).map_err(|err| {
            AppError::configuration(format!("cannot read permission table {}: {err}", path.display()))
        })?;
        Self::from_json_str(&raw)
    }

    /// Uses `PERMISSIONS_FILE` when set, the standard table otherwise.
    pub fn from_env() -> Result<Self, AppError> {
        match std::env::var("PERMISSIONS_FILE") {
            Ok(file) if !file.trim().is_empty() => {
                tracing::info!(file = %file, "loading permission table from file");
                Self::from_file(Path::new(file.trim()))
            }
            _ => {
                tracing::info!("using standard permission table");
                Ok(Self::standard())
            }
        }
    }
}
