//! Stream adapters over a live session

mod drain;

pub use drain::DrainStream;
