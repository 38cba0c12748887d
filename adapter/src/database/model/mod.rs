pub mod attendee;
pub mod event;
pub mod meeting;
pub mod room;
pub mod settings;
