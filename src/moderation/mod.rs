pub mod client;
pub mod prompt;
pub mod reply;
pub mod turn;

pub use client::{HttpModerationClient, ModerationClient};
pub use prompt::PASS_SENTINEL;
pub use reply::UNEXPECTED_SHAPE_REPLY;
pub use turn::TurnOrchestrator;
