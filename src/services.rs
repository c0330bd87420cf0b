pub mod auth;
pub mod inventory_service;
pub mod rbac_service;
pub mod sales_service;
pub mod stats_service;
