pub mod align;
pub mod blocks;
pub mod error;
pub mod events;
pub mod pipeline;
pub mod plot;
pub mod ratings;
pub mod score;
pub mod writer;

pub use blocks::{Block, Condition};
pub use error::TaskError;
pub use events::{parse_log, ParsedLog, PictureEvent, VideoEvent};
pub use pipeline::{process_log, run_id, LogOutcome};
pub use ratings::{extract_ratings, Rating, RatingTrace};
pub use score::BlockResult;
