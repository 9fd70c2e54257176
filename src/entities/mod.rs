pub mod category;
pub mod document;
pub mod gold_rate;
pub mod permission;
pub mod permission_group;
pub mod product;
pub mod refresh_token;
pub mod role;
pub mod role_permission;
pub mod transaction_line;
pub mod user;
pub mod user_role;
pub mod wholesaler;
