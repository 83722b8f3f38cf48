pub mod memory;
pub mod news;
pub mod paper_trader;
pub mod risk;

pub use memory::{DecisionJournal, MemoryStore};
pub use news::NewsFeed;
pub use paper_trader::{PaperTrader, Position};
pub use risk::{RiskManager, RiskRejection, VettedOrder};
