pub mod health;
pub mod loot;
pub mod reports;
pub mod roster;
