pub mod db;
pub mod hasher;

pub use db::PgStore;
pub use hasher::Argon2Hasher;
