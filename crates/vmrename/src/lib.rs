pub mod cli;
pub mod features;
pub mod shared;
