mod common;

use std::sync::Arc;

use anyhow::Result;
use common::{lend_standard, test_service};
use mutuo::domain::PaymentKind;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_payments_do_not_lose_updates() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let loan = lend_standard(&service, "C1").await?;
    let service = Arc::new(service);

    let mut handles = Vec::new();
    for _ in 0..8 {
        let service = Arc::clone(&service);
        let loan_id = loan.id;
        handles.push(tokio::spawn(async move {
            for _ in 0..5 {
                service
                    .record_payment(loan_id, 1_000, PaymentKind::Emi)
                    .await?;
            }
            anyhow::Ok(())
        }));
    }
    for handle in handles {
        handle.await??;
    }

    // Every payment landed: the paid total and the log agree
    let ledger = service.ledger(loan.id).await?;
    assert_eq!(ledger.payments.len(), 40);
    assert_eq!(ledger.balance_cents, loan.total_cents - 40_000);

    let paid = service.get_loan(loan.id).await?.paid_cents;
    assert_eq!(paid, 40_000);

    // Sequence numbers are unique and strictly increasing
    let sequences: Vec<i64> = ledger.payments.iter().map(|p| p.sequence).collect();
    assert!(sequences.windows(2).all(|w| w[0] < w[1]));

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_lends_attach_all_loans() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let service = Arc::new(service);

    let mut handles = Vec::new();
    for _ in 0..8 {
        let service = Arc::clone(&service);
        handles.push(tokio::spawn(async move {
            service.lend("C1", 120_000, 1, 1000).await?;
            anyhow::Ok(())
        }));
    }
    for handle in handles {
        handle.await??;
    }

    let customer = service.get_customer("C1").await?;
    assert_eq!(customer.loan_ids.len(), 8);

    let summaries = service.overview("C1").await?;
    assert_eq!(summaries.len(), 8);

    Ok(())
}
