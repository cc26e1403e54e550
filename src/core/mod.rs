pub mod bins;
pub mod engine;
pub mod error;
pub mod model;
pub mod params;
