pub mod accounts;
pub mod logging;
pub mod transactions;
