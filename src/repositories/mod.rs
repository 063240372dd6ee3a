pub mod balance_repository;
pub mod claim_repository;
pub mod game_player_repository;
pub mod game_repository;
pub mod user_repository;

// Re-export all repositories for convenient access
pub use balance_repository::BalanceRepository;
pub use claim_repository::ClaimRepository;
pub use game_player_repository::GamePlayerRepository;
pub use game_repository::GameRepository;
pub use user_repository::UserRepository;
