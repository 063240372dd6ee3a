pub mod balance_service;
pub mod claim_service;
pub mod game_service;

pub use balance_service::{BalanceService, FinancialSummary, PlayerBalance};
pub use claim_service::{ClaimService, CommonFundClaimResult, SeasonalClaimResult};
pub use game_service::{CreateGameParams, GameService};
