pub mod notification;
pub mod search_alert;
pub mod train;
