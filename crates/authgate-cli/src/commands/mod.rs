//! CLI 명령어.

pub mod health;
pub mod token;
pub mod users;

pub use health::check_health;
pub use token::{inspect_token, Inspection};
pub use users::{delete_user, format_users, list_users};
