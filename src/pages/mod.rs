pub mod explore;
pub mod not_found;
pub mod transactions;
