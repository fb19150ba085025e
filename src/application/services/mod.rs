//! Application services - wiring of the messaging core

pub mod bot_service;

pub use bot_service::BotService;
