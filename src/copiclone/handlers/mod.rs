pub mod health;
pub use self::health::health;

pub mod clone;
pub use self::clone::clone_copilot;
