pub mod bias;
pub mod engine;
pub mod factory;
pub mod resize;
pub mod scheduler;
pub mod window;
