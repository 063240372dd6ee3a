use gamebank_backend::config::DatabaseConfig;
use gamebank_backend::database::{create_pool, run_migrations};
use gamebank_backend::models::*;
use gamebank_backend::repositories::*;
use gamebank_backend::services::*;
use rust_decimal::Decimal;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

/// Test database connection with wired repositories and services
pub struct TestDatabase {
    pub pool: PgPool,
    pub user_repo: Arc<UserRepository>,
    pub game_repo: Arc<GameRepository>,
    pub player_repo: Arc<GamePlayerRepository>,
    pub balance_repo: Arc<BalanceRepository>,
    pub claim_repo: Arc<ClaimRepository>,
    pub game_service: GameService,
    pub balance_service: BalanceService,
    pub claim_service: ClaimService,
}

impl TestDatabase {
    /// Connect to the database named by TEST_DATABASE_URL and run
    /// migrations. Returns None when the variable is unset so the suite
    /// can run without a database; callers skip in that case.
    pub async fn try_new() -> Option<Self> {
        let database_url = std::env::var("TEST_DATABASE_URL").ok()?;

        let config = DatabaseConfig {
            url: database_url,
            max_connections: 5,
            acquire_timeout_secs: 10,
            idle_timeout_secs: 300,
            max_lifetime_secs: 600,
            test_before_acquire: true,
        };

        let pool = create_pool(&config)
            .await
            .expect("Failed to create test database pool");

        run_migrations(&pool, None)
            .await
            .expect("Failed to run migrations");

        Some(Self::from_pool(pool))
    }

    /// Create TestDatabase from an existing pool
    pub fn from_pool(pool: PgPool) -> Self {
        let user_repo = Arc::new(UserRepository::new(pool.clone()));
        let game_repo = Arc::new(GameRepository::new(pool.clone()));
        let player_repo = Arc::new(GamePlayerRepository::new(pool.clone()));
        let balance_repo = Arc::new(BalanceRepository::new(pool.clone()));
        let claim_repo = Arc::new(ClaimRepository::new(pool.clone()));

        let game_service = GameService::new(
            game_repo.clone(),
            player_repo.clone(),
            user_repo.clone(),
        );
        let balance_service = BalanceService::new(
            game_repo.clone(),
            player_repo.clone(),
            balance_repo.clone(),
        );
        let claim_service = ClaimService::new(
            game_repo.clone(),
            player_repo.clone(),
            balance_repo.clone(),
            claim_repo.clone(),
        );

        Self {
            pool,
            user_repo,
            game_repo,
            player_repo,
            balance_repo,
            claim_repo,
            game_service,
            balance_service,
            claim_service,
        }
    }

}

/// Test data fixtures: a creator and two players in one game with a
/// common fund, everyone seeded with 100.
pub struct TestFixtures {
    pub creator: User,
    pub player2: User,
    pub player3: User,
    pub game: Game,
}

impl TestFixtures {
    pub async fn create(db: &TestDatabase) -> Self {
        let creator = create_test_user(db, "creator").await;
        let player2 = create_test_user(db, "player_two").await;
        let player3 = create_test_user(db, "player_three").await;

        let game = db
            .game_service
            .create_game(
                creator.id,
                CreateGameParams {
                    name: "Friday night game".to_string(),
                    description: None,
                    initial_balance: Decimal::from(100),
                    max_players: 4,
                    max_transfer: None,
                    seasonal_collection: Some(Decimal::from(30)),
                    has_common_fund: true,
                },
            )
            .await
            .expect("Failed to create test game");

        db.game_service
            .join_game(player2.id, &game.pin)
            .await
            .expect("player2 failed to join");
        db.game_service
            .join_game(player3.id, &game.pin)
            .await
            .expect("player3 failed to join");

        Self {
            creator,
            player2,
            player3,
            game,
        }
    }
}

/// Helper function to create a test user with a unique name
pub async fn create_test_user(db: &TestDatabase, name: &str) -> User {
    let username = format!("{}_{}", name, &Uuid::new_v4().to_string()[..8]);
    db.user_repo
        .create(&username, None)
        .await
        .expect("Failed to create test user")
}

/// Sum of player balances + bank + fund; must be invariant across transfers
pub async fn total_money(db: &TestDatabase, game_id: Uuid) -> Decimal {
    let players = db
        .player_repo
        .sum_balances(game_id)
        .await
        .expect("Failed to sum balances");
    let bank = db
        .balance_repo
        .bank_balance(game_id)
        .await
        .expect("Failed to get bank balance");
    let fund = db
        .balance_repo
        .common_fund_balance(game_id)
        .await
        .expect("Failed to get fund balance");
    players + bank + fund
}
