pub mod services;

pub use services::streak_service::StreakSignalEngine;
