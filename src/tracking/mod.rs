//! Service route tracking core

pub mod coordinate;
pub mod eta;
pub mod ingestor;
pub mod options;
pub mod route;
pub mod sample;
pub mod session;
