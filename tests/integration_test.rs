//! Transfer and lifecycle tests against a real database.
//!
//! These tests need TEST_DATABASE_URL pointing at a disposable PostgreSQL
//! database; without it every test skips.

mod helpers;

use gamebank_backend::error::AppError;
use gamebank_backend::models::{GameStatus, TransactionType};
use gamebank_backend::services::CreateGameParams;
use helpers::*;
use rust_decimal::Decimal;

#[tokio::test]
async fn test_player_transfer_updates_balances_and_ledger() {
    let Some(db) = TestDatabase::try_new().await else {
        eprintln!("TEST_DATABASE_URL not set, skipping");
        return;
    };
    let f = TestFixtures::create(&db).await;

    let before = total_money(&db, f.game.id).await;

    let entry = db
        .balance_service
        .transfer_player_to_player(
            f.game.id,
            f.player2.id,
            f.player3.id,
            Decimal::from(30),
            Some("rent"),
        )
        .await
        .expect("transfer failed");

    assert_eq!(entry.tx_type(), Some(TransactionType::PlayerToPlayer));
    assert_eq!(entry.amount, Decimal::from(30));
    assert_eq!(entry.from_user_id, Some(f.player2.id));
    assert_eq!(entry.to_user_id, Some(f.player3.id));

    let sender = db
        .game_service
        .get_player_balance(f.game.id, f.player2.id)
        .await
        .unwrap();
    let receiver = db
        .game_service
        .get_player_balance(f.game.id, f.player3.id)
        .await
        .unwrap();
    assert_eq!(sender, Decimal::from(70));
    assert_eq!(receiver, Decimal::from(130));

    // Money is moved, never created or destroyed
    assert_eq!(total_money(&db, f.game.id).await, before);

    let history = db
        .balance_service
        .get_game_transaction_history(f.game.id)
        .await
        .unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].tx_type, "player_to_player");
}

#[tokio::test]
async fn test_insufficient_balance_leaves_state_untouched() {
    let Some(db) = TestDatabase::try_new().await else {
        eprintln!("TEST_DATABASE_URL not set, skipping");
        return;
    };
    let f = TestFixtures::create(&db).await;

    let err = db
        .balance_service
        .transfer_player_to_player(
            f.game.id,
            f.player2.id,
            f.player3.id,
            Decimal::from(150),
            None,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InsufficientBalance { .. }));

    // A failed transfer must leave balances untouched
    let sender = db
        .game_service
        .get_player_balance(f.game.id, f.player2.id)
        .await
        .unwrap();
    assert_eq!(sender, Decimal::from(100));

    let history = db
        .balance_service
        .get_game_transaction_history(f.game.id)
        .await
        .unwrap();
    assert!(history.is_empty());
}

#[tokio::test]
async fn test_transfer_validation() {
    let Some(db) = TestDatabase::try_new().await else {
        eprintln!("TEST_DATABASE_URL not set, skipping");
        return;
    };
    let f = TestFixtures::create(&db).await;

    let err = db
        .balance_service
        .transfer_player_to_player(f.game.id, f.player2.id, f.player3.id, Decimal::ZERO, None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidArgument(_)));

    let err = db
        .balance_service
        .transfer_player_to_player(f.game.id, f.player2.id, f.player2.id, Decimal::ONE, None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidArgument(_)));

    // 600 exceeds the default per-operation limit of 500
    let err = db
        .balance_service
        .transfer_player_to_player(
            f.game.id,
            f.player2.id,
            f.player3.id,
            Decimal::from(600),
            None,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidArgument(_)));

    // Outsiders cannot transfer
    let outsider = create_test_user(&db, "outsider").await;
    let err = db
        .balance_service
        .transfer_player_to_player(f.game.id, outsider.id, f.player2.id, Decimal::ONE, None)
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_bank_flow_and_authorization() {
    let Some(db) = TestDatabase::try_new().await else {
        eprintln!("TEST_DATABASE_URL not set, skipping");
        return;
    };
    let f = TestFixtures::create(&db).await;

    db.balance_service
        .transfer_player_to_bank(f.game.id, f.player2.id, Decimal::from(40), None)
        .await
        .expect("bank payment failed");

    assert_eq!(
        db.balance_service.get_bank_balance(f.game.id).await.unwrap(),
        Decimal::from(40)
    );

    // Only the creator withdraws from the bank
    let err = db
        .balance_service
        .withdraw_from_bank(
            f.game.id,
            f.player2.id,
            f.player2.id,
            Decimal::from(10),
            None,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(_)));

    db.balance_service
        .withdraw_from_bank(
            f.game.id,
            f.creator.id,
            f.player3.id,
            Decimal::from(25),
            None,
        )
        .await
        .expect("withdrawal failed");

    assert_eq!(
        db.balance_service.get_bank_balance(f.game.id).await.unwrap(),
        Decimal::from(15)
    );
    assert_eq!(
        db.game_service
            .get_player_balance(f.game.id, f.player3.id)
            .await
            .unwrap(),
        Decimal::from(125)
    );

    // The bank has no lower bound and may go negative
    db.balance_service
        .withdraw_from_bank(
            f.game.id,
            f.creator.id,
            f.player3.id,
            Decimal::from(100),
            None,
        )
        .await
        .expect("overdraw failed");
    assert_eq!(
        db.balance_service.get_bank_balance(f.game.id).await.unwrap(),
        Decimal::from(-85)
    );
}

#[tokio::test]
async fn test_common_fund_contribution_and_feature_flag() {
    let Some(db) = TestDatabase::try_new().await else {
        eprintln!("TEST_DATABASE_URL not set, skipping");
        return;
    };
    let f = TestFixtures::create(&db).await;

    db.balance_service
        .transfer_player_to_common_fund(f.game.id, f.player2.id, Decimal::from(20), None)
        .await
        .expect("contribution failed");

    assert_eq!(
        db.balance_service
            .get_common_fund_balance(f.game.id)
            .await
            .unwrap(),
        Decimal::from(20)
    );

    // A game without a common fund rejects contributions
    let plain_game = db
        .game_service
        .create_game(
            f.creator.id,
            CreateGameParams {
                name: "No fund game".to_string(),
                description: None,
                initial_balance: Decimal::from(50),
                max_players: 4,
                max_transfer: None,
                seasonal_collection: None,
                has_common_fund: false,
            },
        )
        .await
        .unwrap();

    let err = db
        .balance_service
        .transfer_player_to_common_fund(plain_game.id, f.creator.id, Decimal::ONE, None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::FeatureDisabled(_)));

    assert_eq!(
        db.balance_service
            .get_common_fund_balance(plain_game.id)
            .await
            .unwrap(),
        Decimal::ZERO
    );
}

#[tokio::test]
async fn test_financial_summary() {
    let Some(db) = TestDatabase::try_new().await else {
        eprintln!("TEST_DATABASE_URL not set, skipping");
        return;
    };
    let f = TestFixtures::create(&db).await;

    db.balance_service
        .transfer_player_to_bank(f.game.id, f.player2.id, Decimal::from(10), None)
        .await
        .unwrap();
    db.balance_service
        .transfer_player_to_common_fund(f.game.id, f.player3.id, Decimal::from(5), None)
        .await
        .unwrap();

    let summary = db
        .balance_service
        .get_financial_summary(f.game.id)
        .await
        .unwrap();

    assert_eq!(summary.player_count, 3);
    assert_eq!(summary.bank_balance, Decimal::from(10));
    assert_eq!(summary.common_fund_balance, Decimal::from(5));
    // 3 players seeded with 100 each; transfers only move money around
    assert_eq!(summary.total_balance, Decimal::from(300));
    assert!(summary.has_common_fund);
}

#[tokio::test]
async fn test_user_transaction_history_requires_membership() {
    let Some(db) = TestDatabase::try_new().await else {
        eprintln!("TEST_DATABASE_URL not set, skipping");
        return;
    };
    let f = TestFixtures::create(&db).await;

    db.balance_service
        .transfer_player_to_player(f.game.id, f.player2.id, f.player3.id, Decimal::from(7), None)
        .await
        .unwrap();
    db.balance_service
        .transfer_player_to_bank(f.game.id, f.player3.id, Decimal::from(3), None)
        .await
        .unwrap();

    let txs = db
        .balance_service
        .get_user_transactions_in_game(f.game.id, f.player3.id)
        .await
        .unwrap();
    assert_eq!(txs.len(), 2);

    let outsider = create_test_user(&db, "outsider").await;
    let err = db
        .balance_service
        .get_user_transactions_in_game(f.game.id, outsider.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(_)));
}

#[tokio::test]
async fn test_concurrent_debits_cannot_double_spend() {
    let Some(db) = TestDatabase::try_new().await else {
        eprintln!("TEST_DATABASE_URL not set, skipping");
        return;
    };
    let f = TestFixtures::create(&db).await;

    // Two transfers of 80 from a balance of 100: exactly one must succeed.
    let a = db.balance_service.transfer_player_to_player(
        f.game.id,
        f.player2.id,
        f.player3.id,
        Decimal::from(80),
        None,
    );
    let b = db.balance_service.transfer_player_to_player(
        f.game.id,
        f.player2.id,
        f.creator.id,
        Decimal::from(80),
        None,
    );

    let (res_a, res_b) = tokio::join!(a, b);
    let successes = [&res_a, &res_b].iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1, "exactly one concurrent debit may pass");

    let failed = if res_a.is_err() { res_a } else { res_b };
    assert!(matches!(
        failed.unwrap_err(),
        AppError::InsufficientBalance { .. }
    ));

    assert_eq!(
        db.game_service
            .get_player_balance(f.game.id, f.player2.id)
            .await
            .unwrap(),
        Decimal::from(20)
    );
}

#[tokio::test]
async fn test_game_lifecycle_is_forward_only() {
    let Some(db) = TestDatabase::try_new().await else {
        eprintln!("TEST_DATABASE_URL not set, skipping");
        return;
    };
    let f = TestFixtures::create(&db).await;

    // Only the creator can change status
    let err = db
        .game_service
        .update_game_status(f.game.id, f.player2.id, GameStatus::Active)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(_)));

    let game = db
        .game_service
        .update_game_status(f.game.id, f.creator.id, GameStatus::Active)
        .await
        .unwrap();
    assert_eq!(game.status, "active");

    // No reverse transition
    let err = db
        .game_service
        .update_game_status(f.game.id, f.creator.id, GameStatus::Pending)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    // Finishing removes players and claims but keeps the game row
    let game = db
        .game_service
        .update_game_status(f.game.id, f.creator.id, GameStatus::Finished)
        .await
        .unwrap();
    assert_eq!(game.status, "finished");
    assert_eq!(db.player_repo.count_by_game(f.game.id).await.unwrap(), 0);
    assert!(db.game_repo.find_by_id(f.game.id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_leave_game_semantics() {
    let Some(db) = TestDatabase::try_new().await else {
        eprintln!("TEST_DATABASE_URL not set, skipping");
        return;
    };
    let f = TestFixtures::create(&db).await;

    // A non-creator leaving removes only their membership
    db.game_service
        .leave_game(f.player3.id, f.game.id)
        .await
        .unwrap();
    assert_eq!(db.player_repo.count_by_game(f.game.id).await.unwrap(), 2);
    assert!(db.game_repo.find_by_id(f.game.id).await.unwrap().is_some());

    // The creator leaving deletes the entire game
    db.game_service
        .leave_game(f.creator.id, f.game.id)
        .await
        .unwrap();
    assert!(db.game_repo.find_by_id(f.game.id).await.unwrap().is_none());
    assert_eq!(db.player_repo.count_by_game(f.game.id).await.unwrap(), 0);
}

#[tokio::test]
async fn test_join_game_capacity_and_idempotency() {
    let Some(db) = TestDatabase::try_new().await else {
        eprintln!("TEST_DATABASE_URL not set, skipping");
        return;
    };

    let creator = create_test_user(&db, "creator").await;
    let game = db
        .game_service
        .create_game(
            creator.id,
            CreateGameParams {
                name: "Tiny game".to_string(),
                description: None,
                initial_balance: Decimal::from(10),
                max_players: 2,
                max_transfer: None,
                seasonal_collection: None,
                has_common_fund: false,
            },
        )
        .await
        .unwrap();

    // Joining your own game again is a no-op
    db.game_service.join_game(creator.id, &game.pin).await.unwrap();
    assert_eq!(db.player_repo.count_by_game(game.id).await.unwrap(), 1);

    let second = create_test_user(&db, "second").await;
    db.game_service.join_game(second.id, &game.pin).await.unwrap();

    let third = create_test_user(&db, "third").await;
    let err = db
        .game_service
        .join_game(third.id, &game.pin)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    // New members are seeded with the initial balance
    assert_eq!(
        db.game_service
            .get_player_balance(game.id, second.id)
            .await
            .unwrap(),
        Decimal::from(10)
    );
}
