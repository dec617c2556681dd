mod models;
mod schema;
mod store;
mod trait_def;

pub use models::*;
pub use schema::EMOTIONS_SCHEMA;
pub use store::SqliteEmotionLogStore;
pub use trait_def::EmotionLogStore;
