mod common;

use common::*;
use proptest::prelude::*;
use restake_client::engine::exchange_rate::{check_claim, deposit_value, rate};
use restake_client::engine::PoolBalances;
use restake_client::ClientError;

fn pool(hot: u64, cold: u64, supply: u64) -> PoolBalances {
    PoolBalances {
        hot_vault: hot,
        cold_vault: cold,
        receipt_supply: supply,
    }
}

#[test]
fn test_one_to_one_pool_scenario() {
    let rate = rate(&pool(700, 300, 1_000)).unwrap();
    assert_eq!(rate, 10_000);
    assert_eq!(deposit_value(250, rate).unwrap(), 250);

    match check_claim(300, 250, rate) {
        Err(ClientError::InsufficientClaim { requested, claim }) => {
            assert_eq!(requested, 300);
            assert_eq!(claim, 250);
        }
        other => panic!("Expected InsufficientClaim, got {:?}", other),
    }
    assert_eq!(check_claim(250, 250, rate).unwrap(), 250);
}

#[test]
fn test_empty_pool_fails_fast() {
    assert!(matches!(rate(&pool(500, 0, 0)), Err(ClientError::EmptyPool)));
}

#[test]
fn test_rate_truncates_toward_zero() {
    // 1000 * 10000 / 3 = 3_333_333.33...
    assert_eq!(rate(&pool(1_000, 0, 3)).unwrap(), 3_333_333);
}

#[tokio::test]
async fn test_reader_rate_matches_live_balances() {
    let fixture = Fixture::new(700, 300, 1_000);
    let reader = fixture.reader();
    let rate = reader
        .exchange_rate(&fixture.lockup_address, &fixture.lockup)
        .await
        .unwrap();
    assert_eq!(rate, 10_000);
}

#[tokio::test]
async fn test_reader_rate_reflects_slashed_vault() {
    let fixture = Fixture::new(700, 300, 1_000);
    let cold = fixture
        .deriver
        .vault(
            restake_client::engine::VaultKind::Cold,
            &fixture.lockup_address,
            &asset_mint(),
        )
        .unwrap()
        .address;
    fixture.ledger.set_token_balance(cold, 100);

    let rate = fixture
        .reader()
        .exchange_rate(&fixture.lockup_address, &fixture.lockup)
        .await
        .unwrap();
    assert_eq!(rate, 8_000);
}

proptest! {
    #[test]
    fn rate_monotone_in_assets(
        hot in 0u64..u32::MAX as u64,
        cold in 0u64..u32::MAX as u64,
        extra in 0u64..u32::MAX as u64,
        supply in 1u64..u32::MAX as u64,
    ) {
        let before = rate(&pool(hot, cold, supply)).unwrap();
        let after = rate(&pool(hot + extra, cold, supply)).unwrap();
        prop_assert!(after >= before);
    }

    #[test]
    fn rate_antitone_in_supply(
        hot in 0u64..u32::MAX as u64,
        supply in 1u64..u32::MAX as u64,
        extra in 0u64..u32::MAX as u64,
    ) {
        let before = rate(&pool(hot, 0, supply)).unwrap();
        let after = rate(&pool(hot, 0, supply + extra)).unwrap();
        prop_assert!(after <= before);
    }

    #[test]
    fn claim_never_exceeds_deposit_value(
        balance in 0u64..u32::MAX as u64,
        requested in 0u64..u32::MAX as u64,
        rate_bps in 0u64..100_000,
    ) {
        let value = deposit_value(balance, rate_bps).unwrap();
        match check_claim(requested, balance, rate_bps) {
            Ok(_) => prop_assert!(requested <= value),
            Err(ClientError::InsufficientClaim { .. }) => prop_assert!(requested > value),
            Err(e) => prop_assert!(false, "unexpected error {:?}", e),
        }
    }
}
