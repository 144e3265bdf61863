pub mod game_service;
pub mod notifier;
pub mod stats_service;
pub mod timer;
