pub mod blocks;
pub mod export;
pub mod health;
pub mod reports;
