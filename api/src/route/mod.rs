pub mod admin;
pub mod attendee;
pub mod event;
pub mod health;
pub mod meeting;
pub mod room;
pub mod v1;
