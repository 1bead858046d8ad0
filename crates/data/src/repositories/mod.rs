pub mod blacklist_repo;
pub mod order_repo;
pub mod signal_repo;
