//! Integration tests for the transfer orchestrator.
//!
//! Run with: `cargo test --test test_transfer`

mod common;

use std::{str::FromStr, sync::Arc};

use alloy::primitives::{TxHash, U256};
use common::{connected, coordinator, wait_for_view, Call, FakeWallet, ACCOUNT, RECIPIENT};
use otoshidama::{
    error::AppError,
    services::TransferService,
    types::{NoticeKind, SessionPhase, TransferRejection, TransferRequest},
    JPYC_ETHEREUM_ADDRESS,
};
use rust_decimal::Decimal;

fn request(to: &str, amount: &str) -> TransferRequest {
    TransferRequest::new(to, Decimal::from_str(amount).unwrap())
}

fn recipient() -> String {
    RECIPIENT.to_checksum(None)
}

#[tokio::test]
async fn test_successful_transfer() {
    let wallet = Arc::new(FakeWallet::new());
    let (session, transfers) = connected(&wallet).await;

    let outcome = transfers.send(request(&recipient(), "1.234567891")).await.unwrap();

    assert_eq!(outcome.destination, recipient());
    assert_eq!(outcome.amount, "1.234567891");
    assert_eq!(outcome.token_symbol, "JPYC");
    assert_eq!(outcome.receipt.tx_hash, TxHash::repeat_byte(1));

    // Submission uses the unrounded amount
    assert_eq!(
        wallet.transfers(),
        vec![Call::Transfer {
            token: JPYC_ETHEREUM_ADDRESS,
            to: RECIPIENT,
            amount: U256::from(1_234_567_891_000_000_000u64),
        }]
    );
    assert!(wallet.calls().contains(&Call::WaitForReceipt(TxHash::repeat_byte(1))));

    // 5 - 1.234567891 = 3.765432109, shown rounded
    let view = session.view();
    assert_eq!(view.balance.as_deref(), Some("3.76543"));
    assert!(!view.is_sending);
    assert!(view.can_send);

    let notices = session.notifications().active();
    let confirmed = notices.iter().find(|n| n.kind == NoticeKind::TransferConfirmed).unwrap();
    assert_eq!(confirmed.description.as_deref(), Some(TxHash::repeat_byte(1).to_string().as_str()));
}

#[tokio::test]
async fn test_over_balance_is_rejected_without_wallet_call() {
    let wallet = Arc::new(FakeWallet::new());
    let (session, transfers) = connected(&wallet).await;
    let calls_before = wallet.calls().len();

    let err = transfers.send(request(&recipient(), "5.1")).await.unwrap_err();

    assert!(matches!(
        err,
        AppError::InvalidTransfer(TransferRejection::InsufficientBalance { .. })
    ));
    assert_eq!(wallet.calls().len(), calls_before);
    assert_eq!(wallet.balance(ACCOUNT), common::five_tokens());
    assert_eq!(session.notifications().active()[0].kind, NoticeKind::InvalidTransfer);
    assert!(!session.is_sending());
}

#[tokio::test]
async fn test_not_connected_is_rejected() {
    let wallet = Arc::new(FakeWallet::new());
    let session = coordinator(&wallet);
    let transfers = TransferService::new(session.clone());

    let err = transfers.send(request(&recipient(), "1")).await.unwrap_err();

    assert!(matches!(err, AppError::InvalidTransfer(TransferRejection::NotReady)));
    assert!(wallet.transfers().is_empty());
}

#[tokio::test]
async fn test_unsupported_network_is_rejected_and_notified() {
    let wallet = Arc::new(FakeWallet::new().on_chain(999));
    let (session, transfers) = connected(&wallet).await;

    let err = transfers.send(request(&recipient(), "1")).await.unwrap_err();

    assert!(matches!(err, AppError::InvalidTransfer(TransferRejection::UnsupportedNetwork)));
    assert!(wallet.transfers().is_empty());
    assert_eq!(session.notifications().active()[0].kind, NoticeKind::UnsupportedNetwork);
}

#[tokio::test]
async fn test_invalid_inputs_are_rejected() {
    let wallet = Arc::new(FakeWallet::new());
    let (_session, transfers) = connected(&wallet).await;

    let cases = [
        (request("", "1"), TransferRejection::EmptyDestination),
        (request(&recipient(), "0"), TransferRejection::NonPositiveAmount),
        (request(&recipient(), "-2"), TransferRejection::NonPositiveAmount),
        (
            request("not-an-address", "1"),
            TransferRejection::InvalidDestination("not-an-address".to_string()),
        ),
    ];

    for (invalid, expected) in cases {
        match transfers.send(invalid).await {
            Err(AppError::InvalidTransfer(rejection)) => assert_eq!(rejection, expected),
            other => panic!("expected {expected:?}, got {other:?}"),
        }
    }
    assert!(wallet.transfers().is_empty());
}

#[tokio::test]
async fn test_name_destination_is_resolved() {
    let wallet = Arc::new(FakeWallet::new().with_name(RECIPIENT, "otoshidama.eth"));
    let (_session, transfers) = connected(&wallet).await;

    let outcome = transfers.send(request("otoshidama.eth", "1")).await.unwrap();

    assert_eq!(outcome.destination, recipient());
    assert!(wallet.calls().contains(&Call::ResolveName("otoshidama.eth".to_string())));
    assert_eq!(wallet.balance(RECIPIENT), U256::from(1_000_000_000_000_000_000u64));
}

#[tokio::test]
async fn test_unknown_name_is_rejected() {
    let wallet = Arc::new(FakeWallet::new());
    let (_session, transfers) = connected(&wallet).await;

    let err = transfers.send(request("nobody.eth", "1")).await.unwrap_err();

    assert!(matches!(
        err,
        AppError::InvalidTransfer(TransferRejection::InvalidDestination(_))
    ));
    assert!(wallet.transfers().is_empty());
}

#[tokio::test]
async fn test_network_switch_during_name_resolution_is_refused() {
    let wallet = Arc::new(
        FakeWallet::new().with_name(RECIPIENT, "otoshidama.eth").switching_on_resolve(137),
    );
    let (session, transfers) = connected(&wallet).await;
    let mut views = session.subscribe();

    let err = transfers.send(request("otoshidama.eth", "1")).await.unwrap_err();

    assert!(matches!(err, AppError::InvalidTransfer(TransferRejection::NetworkChanged)));
    assert!(wallet.transfers().is_empty());
    assert_eq!(wallet.balance(ACCOUNT), common::five_tokens());
    assert!(session
        .notifications()
        .active()
        .iter()
        .any(|n| n.kind == NoticeKind::InvalidTransfer));
    assert!(!session.is_sending());

    // The session follows the wallet onto the new network
    let view =
        wait_for_view(&mut views, |v| v.phase == SessionPhase::Ready && v.chain_id == Some(137))
            .await;
    assert_eq!(view.network_label.as_deref(), Some("Polygon"));
}

#[tokio::test]
async fn test_signature_rejected() {
    let wallet = Arc::new(FakeWallet::new().rejecting_signature());
    let (session, transfers) = connected(&wallet).await;

    let err = transfers.send(request(&recipient(), "1")).await.unwrap_err();

    assert!(matches!(err, AppError::TransferRejected(_)));
    assert_eq!(session.notifications().active()[0].kind, NoticeKind::TransferRejected);
    assert!(!session.is_sending());
    assert_eq!(session.view().balance.as_deref(), Some("5"));
}

#[tokio::test]
async fn test_reverted_transfer() {
    let wallet = Arc::new(FakeWallet::new().reverting());
    let (session, transfers) = connected(&wallet).await;

    let err = transfers.send(request(&recipient(), "1")).await.unwrap_err();

    assert!(matches!(err, AppError::TransferFailed(_)));
    assert_eq!(session.notifications().active()[0].kind, NoticeKind::TransferFailed);
    assert!(session.view().can_send);
}

#[tokio::test]
async fn test_one_transfer_at_a_time() {
    let wallet = Arc::new(FakeWallet::new());
    let (session, transfers) = connected(&wallet).await;

    let guard = session.begin_sending().unwrap();
    assert!(!session.view().can_send);

    let err = transfers.send(request(&recipient(), "1")).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidTransfer(TransferRejection::InProgress)));
    assert!(wallet.transfers().is_empty());

    drop(guard);
    tokio_test::assert_ok!(transfers.send(request(&recipient(), "1")).await);
}

#[tokio::test]
async fn test_transfer_with_non_standard_decimals() {
    let wallet = Arc::new(FakeWallet::new().with_decimals(6).with_balance(U256::from(5_000_000u64)));
    let (_session, transfers) = connected(&wallet).await;

    transfers.send(request(&recipient(), "0.5")).await.unwrap();

    assert_eq!(
        wallet.transfers(),
        vec![Call::Transfer { token: JPYC_ETHEREUM_ADDRESS, to: RECIPIENT, amount: U256::from(500_000u64) }]
    );
}
