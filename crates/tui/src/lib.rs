pub mod app;
pub mod config;
pub mod favorites;
pub mod input;
pub mod keybinds;
pub mod onboarding;
pub mod resource;

pub use config::Config;
