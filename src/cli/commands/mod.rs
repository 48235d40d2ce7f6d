pub mod migrate;
pub mod reminders;
pub mod tokens;
pub mod users;
