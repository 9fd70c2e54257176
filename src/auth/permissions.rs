//! Static permission catalog.
//!
//! Permission strings have the form `resource:action`. The catalog is the
//! source of truth for what exists; the database copies of permissions and
//! permission groups are seeded from it so role assignments can reference
//! them by id.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// The role whose members bypass permission checks. It cannot be renamed
/// or deleted.
pub const ADMIN_ROLE: &str = "admin";

/// A permission definition from the static catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Permission {
    pub name: String,
    pub description: String,
    pub group: String,
}

/// Standard actions that can be performed on resources
pub struct Actions;

impl Actions {
    pub const CREATE: &'static str = "create";
    pub const READ: &'static str = "read";
    pub const UPDATE: &'static str = "update";
    pub const DELETE: &'static str = "delete";
}

/// Resources that permissions apply to
pub struct Resources;

impl Resources {
    pub const PRODUCTS: &'static str = "products";
    pub const CATEGORIES: &'static str = "categories";
    pub const WHOLESALERS: &'static str = "wholesalers";
    pub const GOLD_RATES: &'static str = "gold-rates";
    pub const SCENARIOS: &'static str = "scenarios";
    pub const ORDERS: &'static str = "orders";
    pub const SUPPLIES: &'static str = "supplies";
    pub const USERS: &'static str = "users";
    pub const ROLES: &'static str = "roles";
    pub const PERMISSIONS: &'static str = "permissions";
    pub const PERMISSION_GROUPS: &'static str = "permission-groups";
}

/// Permission group names, in display order
pub mod groups {
    pub const CATALOG: &str = "Catalog";
    pub const PARTNERS: &str = "Partners";
    pub const RATES: &str = "Rates";
    pub const DOCUMENTS: &str = "Documents";
    pub const ADMINISTRATION: &str = "Administration";
}

/// Well-known permission strings, for wiring routes and seeding roles
pub mod consts {
    // Catalog
    pub const PRODUCTS_READ: &str = "products:read";
    pub const PRODUCTS_CREATE: &str = "products:create";
    pub const PRODUCTS_UPDATE: &str = "products:update";
    pub const PRODUCTS_DELETE: &str = "products:delete";
    pub const CATEGORIES_READ: &str = "categories:read";
    pub const CATEGORIES_CREATE: &str = "categories:create";
    pub const CATEGORIES_UPDATE: &str = "categories:update";
    pub const CATEGORIES_DELETE: &str = "categories:delete";

    // Partners
    pub const WHOLESALERS_READ: &str = "wholesalers:read";
    pub const WHOLESALERS_CREATE: &str = "wholesalers:create";
    pub const WHOLESALERS_UPDATE: &str = "wholesalers:update";
    pub const WHOLESALERS_DELETE: &str = "wholesalers:delete";

    // Rates
    pub const GOLD_RATES_READ: &str = "gold-rates:read";
    pub const GOLD_RATES_CREATE: &str = "gold-rates:create";
    pub const GOLD_RATES_UPDATE: &str = "gold-rates:update";
    pub const GOLD_RATES_DELETE: &str = "gold-rates:delete";

    // Documents
    pub const SCENARIOS_READ: &str = "scenarios:read";
    pub const SCENARIOS_CREATE: &str = "scenarios:create";
    pub const SCENARIOS_UPDATE: &str = "scenarios:update";
    pub const SCENARIOS_DELETE: &str = "scenarios:delete";
    pub const ORDERS_READ: &str = "orders:read";
    pub const ORDERS_CREATE: &str = "orders:create";
    pub const ORDERS_UPDATE: &str = "orders:update";
    pub const ORDERS_DELETE: &str = "orders:delete";
    pub const SUPPLIES_READ: &str = "supplies:read";
    pub const SUPPLIES_CREATE: &str = "supplies:create";
    pub const SUPPLIES_UPDATE: &str = "supplies:update";
    pub const SUPPLIES_DELETE: &str = "supplies:delete";

    // Administration
    pub const USERS_READ: &str = "users:read";
    pub const USERS_CREATE: &str = "users:create";
    pub const USERS_UPDATE: &str = "users:update";
    pub const USERS_DELETE: &str = "users:delete";
    pub const ROLES_READ: &str = "roles:read";
    pub const ROLES_CREATE: &str = "roles:create";
    pub const ROLES_UPDATE: &str = "roles:update";
    pub const ROLES_DELETE: &str = "roles:delete";
    pub const PERMISSIONS_READ: &str = "permissions:read";
    pub const PERMISSIONS_CREATE: &str = "permissions:create";
    pub const PERMISSIONS_UPDATE: &str = "permissions:update";
    pub const PERMISSIONS_DELETE: &str = "permissions:delete";
    pub const PERMISSION_GROUPS_READ: &str = "permission-groups:read";
    pub const PERMISSION_GROUPS_CREATE: &str = "permission-groups:create";
    pub const PERMISSION_GROUPS_UPDATE: &str = "permission-groups:update";
    pub const PERMISSION_GROUPS_DELETE: &str = "permission-groups:delete";
}

/// Group layout of the catalog, in seed order
static CATALOG_LAYOUT: &[(&str, &[&str])] = &[
    (groups::CATALOG, &[Resources::PRODUCTS, Resources::CATEGORIES]),
    (groups::PARTNERS, &[Resources::WHOLESALERS]),
    (groups::RATES, &[Resources::GOLD_RATES]),
    (
        groups::DOCUMENTS,
        &[Resources::SCENARIOS, Resources::ORDERS, Resources::SUPPLIES],
    ),
    (
        groups::ADMINISTRATION,
        &[
            Resources::USERS,
            Resources::ROLES,
            Resources::PERMISSIONS,
            Resources::PERMISSION_GROUPS,
        ],
    ),
];

/// The full permission catalog, grouped and ordered for seeding
pub static PERMISSIONS: Lazy<Vec<Permission>> = Lazy::new(|| {
    let actions = [
        Actions::READ,
        Actions::CREATE,
        Actions::UPDATE,
        Actions::DELETE,
    ];
    let mut catalog = Vec::new();
    for (group, resources) in CATALOG_LAYOUT {
        for resource in *resources {
            for action in actions {
                catalog.push(Permission {
                    name: format_permission(resource, action),
                    description: describe_permission(resource, action),
                    group: group.to_string(),
                });
            }
        }
    }
    catalog
});

/// Format a permission string from a resource and action
pub fn format_permission(resource: &str, action: &str) -> String {
    format!("{}:{}", resource, action)
}

fn describe_permission(resource: &str, action: &str) -> String {
    let verb = match action {
        Actions::READ => "View",
        Actions::CREATE => "Create",
        Actions::UPDATE => "Update",
        Actions::DELETE => "Delete",
        other => other,
    };
    format!("{} {}", verb, resource.replace('-', " "))
}

/// Group names in seed order, for assigning sort positions
pub fn group_names() -> Vec<&'static str> {
    CATALOG_LAYOUT.iter().map(|(group, _)| *group).collect()
}

/// Whether a permission name exists in the catalog
pub fn permission_exists(name: &str) -> bool {
    PERMISSIONS.iter().any(|p| p.name == name)
}

/// Whether a granted permission satisfies a required one.
///
/// Wildcards: `resource:*` grants every action on the resource, `admin:*`
/// and the bare `*` grant everything.
pub fn permission_implies(granted: &str, required: &str) -> bool {
    if granted == required || granted == "*" || granted == "admin:*" {
        return true;
    }
    if let Some((resource, _)) = required.split_once(':') {
        if let Some((granted_resource, granted_action)) = granted.split_once(':') {
            return granted_resource == resource && granted_action == "*";
        }
    }
    false
}

/// Permission checks over a set of granted permission names
pub struct PermissionService;

impl PermissionService {
    /// Check whether any granted permission implies the required one
    pub fn is_permission_implied(granted: &[String], required: &str) -> bool {
        granted.iter().any(|g| permission_implies(g, required))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_covers_every_resource_and_action() {
        // 11 resources x 4 actions
        assert_eq!(PERMISSIONS.len(), 44);
        assert!(permission_exists(consts::PRODUCTS_READ));
        assert!(permission_exists(consts::GOLD_RATES_DELETE));
        assert!(permission_exists(consts::SUPPLIES_UPDATE));
        assert!(permission_exists(consts::PERMISSION_GROUPS_CREATE));
        assert!(!permission_exists("products:frobnicate"));
    }

    #[test]
    fn catalog_names_are_unique() {
        let mut names: Vec<&str> = PERMISSIONS.iter().map(|p| p.name.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), PERMISSIONS.len());
    }

    #[test]
    fn every_permission_belongs_to_a_known_group() {
        let groups = group_names();
        for permission in PERMISSIONS.iter() {
            assert!(
                groups.contains(&permission.group.as_str()),
                "unknown group {} for {}",
                permission.group,
                permission.name
            );
        }
    }

    #[test]
    fn wildcard_implication() {
        assert!(permission_implies("orders:read", "orders:read"));
        assert!(permission_implies("orders:*", "orders:delete"));
        assert!(permission_implies("admin:*", "users:delete"));
        assert!(permission_implies("*", "gold-rates:create"));
        assert!(!permission_implies("orders:read", "orders:delete"));
        assert!(!permission_implies("orders:*", "supplies:read"));
    }

    #[test]
    fn implied_over_a_permission_set() {
        let granted = vec!["products:read".to_string(), "documents:*".to_string()];
        assert!(PermissionService::is_permission_implied(
            &granted,
            "products:read"
        ));
        assert!(PermissionService::is_permission_implied(
            &granted,
            "documents:delete"
        ));
        assert!(!PermissionService::is_permission_implied(
            &granted,
            "users:read"
        ));
    }
}
