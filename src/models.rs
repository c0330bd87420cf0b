pub mod auth;
pub mod inventory;
pub mod money;
pub mod rbac;
pub mod sales;
pub mod stats;
