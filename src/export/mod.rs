//! Session history export

pub mod gpx;
pub mod tracker;

#[cfg(test)]
mod tests;
