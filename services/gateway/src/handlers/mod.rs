pub mod files;
pub mod homework;
pub mod payment;
pub mod schedule;
pub mod users;
