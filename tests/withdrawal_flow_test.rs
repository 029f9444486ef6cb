mod common;

use common::*;
use restake_client::datasource::MockSubmitter;
use restake_client::domain::request::{CreateIntentArgs, RequestWithdrawalArgs, RestakeArgs};
use restake_client::orchestration::{WithdrawalOutcome, WithdrawalState};
use restake_client::{ClientError, Cooldown, Intent, RequestKind};
use std::sync::Arc;

fn cooldown(unlock_ts: i64) -> Cooldown {
    Cooldown {
        owner: owner(),
        lockup_id: 0,
        deposit_id: 0,
        receipt_amount: 100,
        unlock_ts,
        rewards: 0,
    }
}

#[tokio::test]
async fn test_restake_previews_receipt_and_next_deposit() {
    let mut fixture = Fixture::new(700, 300, 1_000);
    fixture.add_deposit(0, owner(), 250, 250);

    let restake = fixture.builder().restake(&owner(), 0, 100).await.unwrap();
    assert_eq!(restake.deposit_id, 1);
    assert_eq!(
        restake.deposit,
        fixture.deriver.deposit(&fixture.lockup_address, 1).unwrap().address
    );
    assert_eq!(restake.expected_receipt, 100);

    let args: RestakeArgs = restake.request.decode_args().unwrap();
    assert_eq!(args.amount, 100);
    assert_eq!(args.min_receipt_amount, 100);
    assert_eq!(restake.request.kind, RequestKind::Restake);
    assert!(restake.request.accounts[0].is_signer);
}

#[tokio::test]
async fn test_restake_into_empty_pool_mints_one_to_one() {
    let fixture = Fixture::new(0, 0, 0);
    let restake = fixture.builder().restake(&owner(), 0, 500).await.unwrap();
    assert_eq!(restake.expected_receipt, 500);
}

#[tokio::test]
async fn test_restake_prechecks() {
    let mut fixture = Fixture::new(700, 300, 1_000);
    let builder = fixture.builder();

    assert!(matches!(
        builder.restake(&owner(), 0, 5).await,
        Err(ClientError::BelowMinimum { amount: 5, minimum: 10 })
    ));
    assert!(matches!(
        builder.restake(&owner(), 0, 0).await,
        Err(ClientError::InvalidAmount(_))
    ));

    fixture.update_lockup(|l| l.deposit_cap = 1_050);
    assert!(matches!(
        builder.restake(&owner(), 0, 100).await,
        Err(ClientError::DepositCapExceeded { cap: 1_050, current: 1_000, amount: 100 })
    ));

    fixture.update_settings(|s| s.frozen = true);
    assert!(matches!(
        builder.restake(&owner(), 0, 20).await,
        Err(ClientError::ProtocolFrozen)
    ));
}

#[tokio::test]
async fn test_request_withdrawal_within_claim() {
    let mut fixture = Fixture::new(700, 300, 1_000);
    let deposit = fixture.add_deposit(0, owner(), 250, 250);

    let request = fixture
        .builder()
        .request_withdrawal(&owner(), 0, 0, 250, None)
        .await
        .unwrap();
    let args: RequestWithdrawalArgs = request.decode_args().unwrap();
    assert_eq!(args.receipt_amount, 250);
    assert_eq!(args.reward_boost_id, None);

    let cooldown = fixture.deriver.cooldown(&deposit).unwrap().address;
    assert!(request.writable_accounts().any(|a| *a == cooldown));
}

#[tokio::test]
async fn test_request_withdrawal_beyond_claim_fails() {
    let mut fixture = Fixture::new(700, 300, 1_000);
    fixture.add_deposit(0, owner(), 250, 250);

    let err = fixture
        .builder()
        .request_withdrawal(&owner(), 0, 0, 300, None)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ClientError::InsufficientClaim { requested: 300, claim: 250 }
    ));
}

#[tokio::test]
async fn test_request_withdrawal_rounds_receipt_up() {
    // rate = 1500 * 10000 / 1000 = 15000 bps
    let mut fixture = Fixture::new(1_000, 500, 1_000);
    fixture.add_deposit(0, owner(), 100, 100);

    let request = fixture
        .builder()
        .request_withdrawal(&owner(), 0, 0, 100, None)
        .await
        .unwrap();
    let args: RequestWithdrawalArgs = request.decode_args().unwrap();
    // 100 * 10000 / 15000 = 66.67
    assert_eq!(args.receipt_amount, 67);
}

#[tokio::test]
async fn test_request_withdrawal_gating() {
    let mut fixture = Fixture::new(700, 300, 1_000);
    let deposit = fixture.add_deposit(0, owner(), 250, 250);
    let builder = fixture.builder();

    assert!(matches!(
        builder.request_withdrawal(&stranger(), 0, 0, 10, None).await,
        Err(ClientError::Unauthorized { .. })
    ));

    let cooldown_address = fixture.deriver.cooldown(&deposit).unwrap().address;
    fixture.ledger.set_account(cooldown_address, cooldown(NOW + 100));
    match builder.request_withdrawal(&owner(), 0, 0, 10, None).await {
        Err(ClientError::AlreadyInCooldown { deposit: d }) => assert_eq!(d, deposit),
        other => panic!("Expected AlreadyInCooldown, got {:?}", other),
    }
}

#[tokio::test]
async fn test_request_withdrawal_from_empty_pool() {
    let mut fixture = Fixture::new(700, 300, 0);
    fixture.add_deposit(0, owner(), 250, 250);
    assert!(matches!(
        fixture
            .builder()
            .request_withdrawal(&owner(), 0, 0, 10, None)
            .await,
        Err(ClientError::EmptyPool)
    ));
}

#[tokio::test]
async fn test_auto_withdrawal_attaches_best_boost() {
    let mut fixture = Fixture::new(700, 300, 1_000);
    fixture.add_deposit(0, owner(), 250, 2_000);
    fixture.add_boost(0, 0, 100);
    fixture.add_boost(1, 1_000, 300);
    fixture.add_boost(2, 10_000, 900);

    let request = fixture
        .builder()
        .request_withdrawal_auto(&owner(), 0, 0, 100)
        .await
        .unwrap();
    let args: RequestWithdrawalArgs = request.decode_args().unwrap();
    assert_eq!(args.reward_boost_id, Some(1));

    let boost = fixture
        .deriver
        .reward_boost(&fixture.lockup_address, 1)
        .unwrap()
        .address;
    assert_eq!(request.accounts.last().map(|m| m.pubkey), Some(boost));
}

#[tokio::test]
async fn test_request_withdrawal_rejects_unqualified_boost() {
    let mut fixture = Fixture::new(700, 300, 1_000);
    fixture.add_deposit(0, owner(), 250, 250);
    let small = fixture.add_boost(0, 100, 200);
    let large = fixture.add_boost(1, 10_000, 900);
    let builder = fixture.builder();

    match builder.request_withdrawal(&owner(), 0, 0, 100, Some(&large)).await {
        Err(ClientError::InvalidAmount(reason)) => assert!(reason.contains("10000")),
        other => panic!("Expected InvalidAmount, got {:?}", other),
    }

    let request = builder
        .request_withdrawal(&owner(), 0, 0, 100, Some(&small))
        .await
        .unwrap();
    let args: RequestWithdrawalArgs = request.decode_args().unwrap();
    assert_eq!(args.reward_boost_id, Some(0));
}

#[tokio::test]
async fn test_reward_boost_lookup_checks_stored_index() {
    let mut fixture = Fixture::new(700, 300, 1_000);
    fixture.add_deposit(0, owner(), 250, 250);
    let stored = fixture.add_boost(0, 0, 200);
    let misplaced = fixture
        .deriver
        .reward_boost(&fixture.lockup_address, 1)
        .unwrap()
        .address;
    fixture.ledger.set_account(misplaced, stored);

    assert!(matches!(
        fixture.reader().reward_boost(&fixture.lockup_address, 1).await,
        Err(ClientError::MalformedAddress(_))
    ));
}

#[tokio::test]
async fn test_create_intent_prechecks_existing_records() {
    let mut fixture = Fixture::new(700, 300, 1_000);
    let deposit = fixture.add_deposit(0, owner(), 250, 250);
    let builder = fixture.builder();

    let request = builder.create_intent(&owner(), 0, 0, 200).await.unwrap();
    assert_eq!(request.kind, RequestKind::CreateIntent);

    let intent_address = fixture.deriver.intent(&deposit).unwrap().address;
    fixture.ledger.set_account(
        intent_address,
        Intent {
            lockup: fixture.lockup_address,
            deposit,
            amount: 200,
        },
    );
    match builder.create_intent(&owner(), 0, 0, 200).await {
        Err(ClientError::IntentPending { deposit: d }) => assert_eq!(d, deposit),
        other => panic!("Expected IntentPending, got {:?}", other),
    }

    fixture.ledger.remove_account(&intent_address);
    let cooldown_address = fixture.deriver.cooldown(&deposit).unwrap().address;
    fixture.ledger.set_account(cooldown_address, cooldown(NOW + 60));
    match builder.create_intent(&owner(), 0, 0, 200).await {
        Err(ClientError::AlreadyInCooldown { deposit: d }) => assert_eq!(d, deposit),
        other => panic!("Expected AlreadyInCooldown, got {:?}", other),
    }
}

#[tokio::test]
async fn test_withdraw_waits_for_cooldown() {
    let mut fixture = Fixture::new(700, 300, 1_000);
    let deposit = fixture.add_deposit(0, owner(), 250, 250);
    let builder = fixture.builder();

    assert!(matches!(
        builder.withdraw(&owner(), 0, 0, NOW).await,
        Err(ClientError::NotFound { .. })
    ));

    let cooldown_address = fixture.deriver.cooldown(&deposit).unwrap().address;
    fixture.ledger.set_account(cooldown_address, cooldown(NOW + 60));
    assert!(matches!(
        builder.withdraw(&owner(), 0, 0, NOW).await,
        Err(ClientError::CooldownNotElapsed { .. })
    ));

    let request = builder.withdraw(&owner(), 0, 0, NOW + 60).await.unwrap();
    assert_eq!(request.kind, RequestKind::Withdraw);
}

#[tokio::test]
async fn test_withdrawal_state_transitions() {
    let mut fixture = Fixture::new(700, 300, 1_000);
    let deposit_address = fixture.add_deposit(0, owner(), 250, 250);
    let reader = fixture.reader();
    let (_, deposit) = reader.deposit(&fixture.lockup_address, 0).await.unwrap();

    assert_eq!(
        reader.withdrawal_state(&deposit_address, &deposit).await.unwrap(),
        WithdrawalState::Deposited
    );

    let intent_address = fixture.deriver.intent(&deposit_address).unwrap().address;
    fixture.ledger.set_account(
        intent_address,
        Intent {
            lockup: fixture.lockup_address,
            deposit: deposit_address,
            amount: 200,
        },
    );
    assert_eq!(
        reader.withdrawal_state(&deposit_address, &deposit).await.unwrap(),
        WithdrawalState::IntentPending { amount: 200 }
    );

    fixture.ledger.remove_account(&intent_address);
    let cooldown_address = fixture.deriver.cooldown(&deposit_address).unwrap().address;
    fixture
        .ledger
        .set_account(cooldown_address, cooldown(NOW + 60));
    assert_eq!(
        reader.withdrawal_state(&deposit_address, &deposit).await.unwrap(),
        WithdrawalState::CooldownRequested { unlock_ts: NOW + 60 }
    );
}

#[tokio::test]
async fn test_submit_withdrawal_confirms_cooldown() {
    let mut fixture = Fixture::new(700, 300, 1_000);
    fixture.add_deposit(0, owner(), 250, 250);
    let submitter = Arc::new(MockSubmitter::new());

    let outcome = fixture
        .orchestrator(submitter.clone())
        .submit_withdrawal_request(&owner(), 0, 0, 100)
        .await
        .unwrap();
    assert!(matches!(outcome, WithdrawalOutcome::CooldownRequested(_)));
    assert_eq!(submitter.submitted().len(), 1);
}

#[tokio::test]
async fn test_submit_withdrawal_falls_back_to_intent() {
    let mut fixture = Fixture::new(700, 300, 1_000);
    fixture.add_deposit(0, owner(), 250, 250);
    let submitter = Arc::new(
        MockSubmitter::new().with_rejection("custom program error: IntentRequired"),
    );

    let outcome = fixture
        .orchestrator(submitter.clone())
        .submit_withdrawal_request(&owner(), 0, 0, 200)
        .await
        .unwrap();
    assert!(matches!(outcome, WithdrawalOutcome::IntentCreated(_)));

    let submitted = submitter.submitted();
    assert_eq!(submitted.len(), 2);
    assert_eq!(submitted[0].kind, RequestKind::RequestWithdrawal);
    assert_eq!(submitted[1].kind, RequestKind::CreateIntent);
    let args: CreateIntentArgs = submitted[1].decode_args().unwrap();
    assert_eq!(args.amount, 200);
}

#[tokio::test]
async fn test_submit_withdrawal_surfaces_other_rejections() {
    let mut fixture = Fixture::new(700, 300, 1_000);
    let deposit = fixture.add_deposit(0, owner(), 250, 250);

    let submitter = Arc::new(
        MockSubmitter::new().with_rejection("custom program error: AlreadyInCooldown"),
    );
    match fixture
        .orchestrator(submitter)
        .submit_withdrawal_request(&owner(), 0, 0, 100)
        .await
    {
        Err(ClientError::AlreadyInCooldown { deposit: d }) => assert_eq!(d, deposit),
        other => panic!("Expected AlreadyInCooldown, got {:?}", other),
    }

    let submitter = Arc::new(MockSubmitter::new().with_rejection("custom program error: 0x1771"));
    match fixture
        .orchestrator(submitter.clone())
        .submit_withdrawal_request(&owner(), 0, 0, 100)
        .await
    {
        Err(ClientError::Rejected(reason)) => assert!(reason.contains("0x1771")),
        other => panic!("Expected Rejected, got {:?}", other),
    }
    // No automatic retry.
    assert_eq!(submitter.submitted().len(), 1);
}

#[tokio::test]
async fn test_submit_withdrawal_maps_allocation_collisions() {
    let mut fixture = Fixture::new(700, 300, 1_000);
    let deposit = fixture.add_deposit(0, owner(), 250, 250);

    let submitter = Arc::new(
        MockSubmitter::new().with_rejection("Allocate: account Address { .. } already in use"),
    );
    let err = fixture
        .orchestrator(submitter)
        .submit_withdrawal_request(&owner(), 0, 0, 100)
        .await
        .unwrap_err();
    assert!(!err.is_retryable());
    match err {
        ClientError::AlreadyInCooldown { deposit: d } => assert_eq!(d, deposit),
        other => panic!("Expected AlreadyInCooldown, got {:?}", other),
    }

    let submitter = Arc::new(
        MockSubmitter::new()
            .with_rejection("custom program error: IntentRequired")
            .with_rejection("Allocate: account Address { .. } already in use"),
    );
    match fixture
        .orchestrator(submitter.clone())
        .submit_withdrawal_request(&owner(), 0, 0, 200)
        .await
    {
        Err(ClientError::IntentPending { deposit: d }) => assert_eq!(d, deposit),
        other => panic!("Expected IntentPending, got {:?}", other),
    }
    assert_eq!(submitter.submitted().len(), 2);
}

#[tokio::test]
async fn test_stale_rejection_is_retryable() {
    let mut fixture = Fixture::new(700, 300, 1_000);
    fixture.add_deposit(0, owner(), 250, 250);
    let submitter = Arc::new(MockSubmitter::new().with_rejection("AccountNotInitialized"));

    let err = fixture
        .orchestrator(submitter)
        .submit_withdrawal_request(&owner(), 0, 0, 100)
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::StaleRead(_)));
    assert!(err.is_retryable());
}
