//! HTTP endpoints

pub mod events;
pub mod health;
pub mod models;
pub mod training;

pub use events::events_routes;
pub use health::health_routes;
pub use models::model_routes;
pub use training::training_routes;
