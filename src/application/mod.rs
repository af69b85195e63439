pub mod builder;
pub mod dto;
pub mod encoder;
pub mod lifecycle;
pub mod ports;
pub mod use_cases;
