pub mod prediction;
pub mod user;

pub use prediction::{top_prediction, Prediction};
pub use user::{NewUser, User};

/// Balance granted to every newly registered user.
pub const STARTING_TOKENS: i64 = 4;

/// Minimum password length, counted in characters.
pub const MIN_PASSWORD_LEN: usize = 8;
