pub mod database;
pub mod enrichment;
pub mod mail;
pub mod memory;
pub mod outbox;
pub mod repository;
pub mod storage;
