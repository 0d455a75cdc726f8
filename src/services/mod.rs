pub mod auth_service;
pub mod forum_service;
pub mod transaction_service;
pub mod voucher_service;
