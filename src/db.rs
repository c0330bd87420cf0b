pub mod user_repo;
pub use user_repo::UserRepository;
pub mod inventory_repo;
pub use inventory_repo::InventoryRepository;
pub mod sales_repo;
pub use sales_repo::SalesRepository;
pub mod stats_repo;
pub use stats_repo::StatsRepository;
