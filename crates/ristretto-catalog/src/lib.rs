pub mod db;
pub mod key;

pub use db::SqliteSessionStore;
pub use key::{session_key_for, session_key_for_file};
