pub mod attendee;
pub mod availability;
pub mod calendar;
pub mod event;
pub mod id;
pub mod meeting;
pub mod role;
pub mod room;
pub mod settings;
pub mod suggestion;
pub mod time;
pub mod transfer;
pub mod user;
