pub mod common;
pub mod config;

pub mod market {
    pub mod entity;
    pub mod error;
    pub mod port;
}

#[cfg(feature = "test-utils")]
pub mod testing;
