pub mod console_presenter;
