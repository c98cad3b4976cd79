pub mod dispatch;
pub mod send;
