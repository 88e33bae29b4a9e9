mod common;

use anyhow::Result;
use common::{lend_standard, parse_date, test_service};
use mutuo::application::{AppError, PaymentPolicy};
use mutuo::domain::PaymentKind;
use uuid::Uuid;

#[tokio::test]
async fn test_payments_accumulate_and_preserve_order() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let loan = lend_standard(&service, "C1").await?;

    let first = service
        .record_payment(loan.id, 11_000, PaymentKind::Emi)
        .await?;
    assert_eq!(first.total_paid_cents, 11_000);

    let second = service
        .record_payment(loan.id, 5_000, PaymentKind::LumpSum)
        .await?;
    assert_eq!(second.total_paid_cents, 16_000);

    let third = service
        .record_payment(loan.id, 11_000, PaymentKind::Emi)
        .await?;
    assert_eq!(third.total_paid_cents, 27_000);

    let ledger = service.ledger(loan.id).await?;
    assert_eq!(ledger.payments.len(), 3);

    let amounts: Vec<i64> = ledger.payments.iter().map(|p| p.amount_cents).collect();
    assert_eq!(amounts, vec![11_000, 5_000, 11_000]);

    let kinds: Vec<PaymentKind> = ledger.payments.iter().map(|p| p.kind).collect();
    assert_eq!(
        kinds,
        vec![PaymentKind::Emi, PaymentKind::LumpSum, PaymentKind::Emi]
    );

    // Paid total always equals the sum of the log
    let paid = service.get_loan(loan.id).await?.paid_cents;
    assert_eq!(paid, amounts.iter().sum::<i64>());

    Ok(())
}

#[tokio::test]
async fn test_payment_on_unknown_loan_is_not_found() -> Result<()> {
    let (service, _temp) = test_service().await?;
    lend_standard(&service, "C1").await?;

    let result = service
        .record_payment(Uuid::new_v4(), 11_000, PaymentKind::Emi)
        .await;
    assert!(matches!(result, Err(AppError::LoanNotFound(_))));

    Ok(())
}

#[tokio::test]
async fn test_negative_amount_accepted_by_default() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let loan = lend_standard(&service, "C1").await?;

    // The permissive default records the amount as submitted
    let result = service
        .record_payment(loan.id, -5_000, PaymentKind::LumpSum)
        .await?;
    assert_eq!(result.total_paid_cents, -5_000);

    let ledger = service.ledger(loan.id).await?;
    assert_eq!(ledger.balance_cents, 137_000);

    Ok(())
}

#[tokio::test]
async fn test_reject_negative_policy() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let service = service.with_policy(PaymentPolicy {
        reject_negative: true,
        ..Default::default()
    });
    let loan = lend_standard(&service, "C1").await?;

    let result = service
        .record_payment(loan.id, -5_000, PaymentKind::LumpSum)
        .await;
    assert!(matches!(result, Err(AppError::InvalidAmount { .. })));

    // Nothing was recorded
    let ledger = service.ledger(loan.id).await?;
    assert!(ledger.payments.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_cap_to_balance_policy() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let service = service.with_policy(PaymentPolicy {
        cap_to_balance: true,
        ..Default::default()
    });
    let loan = lend_standard(&service, "C1").await?;

    // Attempt to overpay: clamped to the outstanding balance
    let result = service
        .record_payment(loan.id, 200_000, PaymentKind::LumpSum)
        .await?;
    assert_eq!(result.payment.amount_cents, 132_000);
    assert_eq!(result.total_paid_cents, 132_000);

    let ledger = service.ledger(loan.id).await?;
    assert_eq!(ledger.balance_cents, 0);
    assert_eq!(ledger.emi_left, 0);

    // A fully-paid loan accepts further payments at zero
    let extra = service
        .record_payment(loan.id, 11_000, PaymentKind::Emi)
        .await?;
    assert_eq!(extra.payment.amount_cents, 0);
    assert_eq!(extra.total_paid_cents, 132_000);

    Ok(())
}

#[tokio::test]
async fn test_payment_timestamp_can_be_injected() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let loan = lend_standard(&service, "C1").await?;

    let recorded_at = parse_date("2024-03-01");
    service
        .record_payment_at(loan.id, 11_000, PaymentKind::Emi, recorded_at)
        .await?;

    let ledger = service.ledger(loan.id).await?;
    assert_eq!(ledger.payments[0].recorded_at, recorded_at);

    Ok(())
}
