use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Aurum API",
        version = "1.0.0",
        description = r#"
# Aurum Gold Trading Back Office API

REST API for a gold trading desk: product and wholesaler catalogs, a daily
gold rate history, and three transactional document collections whose lines
are valued server-side.

## Documents

- **Scenarios**: what-if calculations with no operational consequence
- **Orders**: customer orders whose outgoing product lines move through a fulfillment pipeline
- **Supplies**: stock movements against wholesalers

Every document pins the gold rate it was saved with; recording a new rate
never re-values existing documents. Submitting an unchanged document back is
detected and skipped without a write.

## Authentication

All endpoints require a JWT bearer token obtained from `/auth/login`:

```
Authorization: Bearer <your-jwt-token>
```

Access tokens are short-lived; use `/auth/refresh` with the refresh token to
rotate the pair.

## Pagination

List endpoints accept the following query parameters:
- `page`: Page number (default: 1)
- `pageSize`: Items per page (default: 20, max: 100)
- `search`: Search term for filtering results, where the resource supports it
        "#,
        contact(
            name = "Aurum Support"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "categories", description = "Product category endpoints"),
        (name = "products", description = "Product catalog endpoints"),
        (name = "wholesalers", description = "Wholesaler endpoints"),
        (name = "gold_rates", description = "Gold rate history endpoints"),
        (name = "documents", description = "Scenario, order and supply documents"),
        (name = "users", description = "User account endpoints"),
        (name = "access", description = "Role, permission and permission group endpoints")
    ),
    paths(
        // Categories
        crate::handlers::categories::list_categories,
        crate::handlers::categories::get_category,
        crate::handlers::categories::create_category,
        crate::handlers::categories::update_category,
        crate::handlers::categories::delete_category,

        // Products
        crate::handlers::products::list_products,
        crate::handlers::products::get_product,
        crate::handlers::products::create_product,
        crate::handlers::products::update_product,
        crate::handlers::products::delete_product,

        // Wholesalers
        crate::handlers::wholesalers::list_wholesalers,
        crate::handlers::wholesalers::get_wholesaler,
        crate::handlers::wholesalers::create_wholesaler,
        crate::handlers::wholesalers::update_wholesaler,
        crate::handlers::wholesalers::delete_wholesaler,

        // Gold rates
        crate::handlers::gold_rates::list_gold_rates,
        crate::handlers::gold_rates::latest_gold_rate,
        crate::handlers::gold_rates::get_gold_rate,
        crate::handlers::gold_rates::record_gold_rate,
        crate::handlers::gold_rates::update_gold_rate,
        crate::handlers::gold_rates::delete_gold_rate,

        // Scenarios
        crate::handlers::documents::list_scenarios,
        crate::handlers::documents::get_scenario,
        crate::handlers::documents::create_scenario,
        crate::handlers::documents::update_scenario,
        crate::handlers::documents::delete_scenario,

        // Orders
        crate::handlers::documents::list_orders,
        crate::handlers::documents::get_order,
        crate::handlers::documents::create_order,
        crate::handlers::documents::update_order,
        crate::handlers::documents::delete_order,
        crate::handlers::documents::update_order_line_status,

        // Supplies
        crate::handlers::documents::list_supplies,
        crate::handlers::documents::get_supply,
        crate::handlers::documents::create_supply,
        crate::handlers::documents::update_supply,
        crate::handlers::documents::delete_supply,

        // Users
        crate::handlers::users::list_users,
        crate::handlers::users::get_user,
        crate::handlers::users::create_user,
        crate::handlers::users::update_user,
        crate::handlers::users::delete_user,

        // Roles
        crate::handlers::access::list_roles,
        crate::handlers::access::get_role,
        crate::handlers::access::create_role,
        crate::handlers::access::update_role,
        crate::handlers::access::delete_role,

        // Permissions
        crate::handlers::access::list_permissions,
        crate::handlers::access::get_permission,
        crate::handlers::access::create_permission,
        crate::handlers::access::update_permission,
        crate::handlers::access::delete_permission,

        // Permission groups
        crate::handlers::access::list_permission_groups,
        crate::handlers::access::get_permission_group,
        crate::handlers::access::create_permission_group,
        crate::handlers::access::update_permission_group,
        crate::handlers::access::delete_permission_group,

        // Status and health intentionally omitted from OpenAPI paths
    ),
    components(
        schemas(
            // Common types
            crate::ApiResponse<serde_json::Value>,
            crate::PaginatedResponse<serde_json::Value>,
            crate::ListQuery,

            // Catalog types
            crate::services::categories::CategoryResponse,
            crate::services::categories::CreateCategoryRequest,
            crate::services::categories::UpdateCategoryRequest,
            crate::services::products::ProductResponse,
            crate::services::products::CreateProductRequest,
            crate::services::products::UpdateProductRequest,
            crate::services::wholesalers::WholesalerResponse,
            crate::services::wholesalers::CreateWholesalerRequest,
            crate::services::wholesalers::UpdateWholesalerRequest,

            // Gold rate types
            crate::services::gold_rates::GoldRateResponse,
            crate::services::gold_rates::RecordGoldRateRequest,
            crate::services::gold_rates::UpdateGoldRateRequest,

            // Document types
            crate::services::documents::DocumentResponse,
            crate::services::documents::LineResponse,
            crate::services::documents::LinePayload,
            crate::services::documents::CreateDocumentRequest,
            crate::services::documents::UpdateDocumentRequest,
            crate::services::documents::UpdateLineStatusRequest,

            // Account types
            crate::services::users::UserResponse,
            crate::services::users::RoleSummary,
            crate::services::users::CreateUserRequest,
            crate::services::users::UpdateUserRequest,

            // Access control types
            crate::services::access::RoleResponse,
            crate::services::access::CreateRoleRequest,
            crate::services::access::UpdateRoleRequest,
            crate::services::access::PermissionResponse,
            crate::services::access::CreatePermissionRequest,
            crate::services::access::UpdatePermissionRequest,
            crate::services::access::PermissionGroupResponse,
            crate::services::access::CreatePermissionGroupRequest,
            crate::services::access::UpdatePermissionGroupRequest,

            // Error types
            crate::errors::ErrorResponse
        )
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDocV1;

/// Registers the bearer scheme every protected path references.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "Bearer",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDocV1::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_document_covers_the_api_surface() {
        let openapi = ApiDocV1::openapi();
        let json = serde_json::to_string_pretty(&openapi).unwrap();
        assert!(json.contains("Aurum API"));
        assert!(json.contains("/api/v1/scenarios"));
        assert!(json.contains("/api/v1/orders/{id}/lines/{line_id}/status"));
        assert!(json.contains("/api/v1/gold-rates/latest"));
    }

    #[test]
    fn bearer_scheme_is_registered() {
        let openapi = ApiDocV1::openapi();
        let components = openapi.components.expect("components expected");
        assert!(components.security_schemes.contains_key("Bearer"));
    }
}
