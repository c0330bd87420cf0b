pub mod auth;
pub mod inventory;
pub mod sales;
pub mod users;
