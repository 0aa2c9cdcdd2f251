pub mod generations;
pub mod health;
pub mod videos;
