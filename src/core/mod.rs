pub mod engine;
pub mod events;
pub mod order_manager;
pub mod price_window;
