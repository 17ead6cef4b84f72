pub mod error;
#[cfg(test)]
pub(crate) mod fixtures;
pub mod types;
