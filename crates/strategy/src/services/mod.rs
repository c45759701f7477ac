pub mod streak_service;
