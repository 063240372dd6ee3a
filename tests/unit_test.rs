use gamebank_backend::error::{option_to_result, AppError, RepositoryError};
use gamebank_backend::models::{ClaimStatus, GameStatus, TransactionType};
use rust_decimal::Decimal;
use uuid::Uuid;

/// Unit tests for ledger type discriminators
#[test]
fn test_transaction_type_conversion() {
    let types = [
        (TransactionType::PlayerToPlayer, "player_to_player"),
        (TransactionType::PlayerToBank, "player_to_bank"),
        (TransactionType::BankToPlayer, "bank_to_player"),
        (TransactionType::PlayerToCommonFund, "player_to_common_fund"),
        (TransactionType::CommonFundToPlayer, "common_fund_to_player"),
    ];

    for (tx_type, s) in types {
        assert_eq!(tx_type.as_str(), s);
        assert_eq!(TransactionType::from_str(s), Some(tx_type));
    }
}

#[test]
fn test_transaction_type_unknown_string() {
    assert_eq!(TransactionType::from_str("bank_to_bank"), None);
    assert_eq!(TransactionType::from_str(""), None);
}

/// Unit tests for the game lifecycle state machine
#[test]
fn test_game_status_conversion() {
    assert_eq!(GameStatus::Pending.as_str(), "pending");
    assert_eq!(GameStatus::Active.as_str(), "active");
    assert_eq!(GameStatus::Finished.as_str(), "finished");

    assert_eq!(GameStatus::from_str("ACTIVE"), Ok(GameStatus::Active));
    assert!(GameStatus::from_str("paused").is_err());
}

#[test]
fn test_game_status_transitions_are_forward_only() {
    assert!(GameStatus::Pending.can_transition_to(GameStatus::Active));
    assert!(GameStatus::Pending.can_transition_to(GameStatus::Finished));
    assert!(GameStatus::Active.can_transition_to(GameStatus::Finished));

    assert!(!GameStatus::Active.can_transition_to(GameStatus::Pending));
    assert!(!GameStatus::Finished.can_transition_to(GameStatus::Active));
    assert!(!GameStatus::Finished.can_transition_to(GameStatus::Pending));
    assert!(!GameStatus::Pending.can_transition_to(GameStatus::Pending));
}

/// Unit tests for the claim state machine
#[test]
fn test_claim_status_conversion() {
    assert_eq!(ClaimStatus::from_str("pending"), Ok(ClaimStatus::Pending));
    assert_eq!(ClaimStatus::from_str("Approved"), Ok(ClaimStatus::Approved));
    assert!(ClaimStatus::from_str("cancelled").is_err());
}

#[test]
fn test_claim_status_terminality() {
    assert!(!ClaimStatus::Pending.is_terminal());
    assert!(ClaimStatus::Approved.is_terminal());
    assert!(ClaimStatus::Rejected.is_terminal());
}

/// Unit tests for the error taxonomy
#[test]
fn test_error_codes_are_stable() {
    assert_eq!(AppError::NotFound("x".into()).code(), "not_found");
    assert_eq!(AppError::InvalidArgument("x".into()).code(), "invalid_argument");
    assert_eq!(AppError::Unauthorized("x".into()).code(), "unauthorized");
    assert_eq!(AppError::Conflict("x".into()).code(), "conflict");
    assert_eq!(AppError::FeatureDisabled("x".into()).code(), "feature_disabled");
    assert_eq!(AppError::EmptyFund.code(), "empty_fund");
    assert_eq!(
        AppError::InsufficientBalance {
            available: Decimal::from(10),
            requested: Decimal::from(20),
        }
        .code(),
        "insufficient_balance"
    );
}

#[test]
fn test_error_status_codes() {
    assert_eq!(AppError::NotFound("x".into()).status_code(), 404);
    assert_eq!(AppError::Unauthorized("x".into()).status_code(), 401);
    assert_eq!(AppError::InvalidArgument("x".into()).status_code(), 400);
    assert_eq!(AppError::EmptyFund.status_code(), 400);
    assert_eq!(AppError::Conflict("x".into()).status_code(), 409);
    assert_eq!(
        AppError::InsufficientBalance {
            available: Decimal::ZERO,
            requested: Decimal::ONE,
        }
        .status_code(),
        409
    );
}

#[test]
fn test_repository_error_mapping() {
    let err: AppError = RepositoryError::Duplicate("dup".into()).into();
    assert!(matches!(err, AppError::Conflict(_)));

    let err: AppError = RepositoryError::AlreadyResolved("done".into()).into();
    assert!(matches!(err, AppError::Conflict(_)));

    let err: AppError = RepositoryError::EmptyFund.into();
    assert!(matches!(err, AppError::EmptyFund));

    let err: AppError = RepositoryError::NotFound("missing".into()).into();
    assert!(err.is_not_found());

    let err: AppError = RepositoryError::InsufficientBalance {
        available: Decimal::from(70),
        requested: Decimal::from(100),
    }
    .into();
    match err {
        AppError::InsufficientBalance {
            available,
            requested,
        } => {
            assert_eq!(available, Decimal::from(70));
            assert_eq!(requested, Decimal::from(100));
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn test_option_to_result() {
    assert_eq!(option_to_result(Some(5), "missing").unwrap(), 5);
    let err = option_to_result::<i32>(None, "Game not found").unwrap_err();
    assert!(err.is_not_found());
}

/// Unit tests for Decimal money arithmetic
#[test]
fn test_decimal_precision() {
    let a = Decimal::new(1050, 2); // 10.50
    let b = Decimal::new(25, 1); // 2.5
    assert_eq!(a + b, Decimal::new(1300, 2));
    assert_eq!(a - b, Decimal::new(800, 2));
}

/// Unit tests for UUID generation
#[test]
fn test_uuid_generation() {
    let id1 = Uuid::new_v4();
    let id2 = Uuid::new_v4();
    assert_ne!(id1, id2);
}
