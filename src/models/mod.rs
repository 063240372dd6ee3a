//! Domain models for the GameBank backend.
//!
//! This module contains all database-backed models representing
//! the core entities of the shared-game money tracker.

pub mod claim;
pub mod game;
pub mod game_player;
pub mod transaction;
pub mod user;

// Re-export all models for convenient access
pub use claim::{
    ClaimStatus, CommonFundClaim, CommonFundClaimWithRequester, SeasonalCollectionClaim,
    SeasonalCollectionClaimWithRequester,
};
pub use game::{Game, GameStatus};
pub use game_player::{GamePlayer, PlayerWithUser};
pub use transaction::{GameTransactionView, Transaction, TransactionType};
pub use user::User;
