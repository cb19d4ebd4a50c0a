pub mod error;
pub mod export;
pub mod generation;
pub mod provider;
pub mod test_case;
pub mod transcript;
