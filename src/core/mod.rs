pub mod game;
pub mod outcome;
pub mod platforms;

pub use game::GameRecord;
pub use outcome::ImportOutcome;
pub use platforms::{gamesdb_platform, title_id};
