pub mod lifecycle;
pub mod messages;
pub mod responses;
pub mod sweep;
