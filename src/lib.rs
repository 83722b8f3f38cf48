pub mod bot;
pub mod config;
pub mod indicators;
pub mod llm;
pub mod market;
pub mod models;
#[cfg(test)]
pub mod test_helpers;
pub mod trading;
