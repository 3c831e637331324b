//! Domain entities - Core game objects with identity

mod scene;
mod session;

pub use scene::Scene;
pub use session::{Session, SessionStatus};
