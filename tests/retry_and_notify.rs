use anyhow::bail;
use choptym_payments::domain::notification::{Customer, PaymentNotification, WebhookStatus};
use choptym_payments::notify::disabled::DisabledNotifier;
use choptym_payments::notify::templates;
use choptym_payments::notify::Notifier;
use choptym_payments::service::retry::{with_retry, RetryPolicy};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

fn policy(max_attempts: u32) -> RetryPolicy {
    RetryPolicy {
        max_attempts,
        base_backoff: Duration::from_millis(1),
        call_timeout: Duration::from_millis(50),
    }
}

#[tokio::test]
async fn retry_recovers_after_one_failure() {
    let calls = AtomicU32::new(0);
    let out = with_retry("flaky", policy(2), || async {
        if calls.fetch_add(1, Ordering::SeqCst) == 0 {
            bail!("first call fails");
        }
        Ok(7)
    })
    .await
    .unwrap();
    assert_eq!(out, 7);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn retry_gives_up_after_max_attempts() {
    let calls = AtomicU32::new(0);
    let err = with_retry("down", policy(2), || async {
        calls.fetch_add(1, Ordering::SeqCst);
        Err::<(), _>(anyhow::anyhow!("still down"))
    })
    .await
    .unwrap_err();
    assert_eq!(err.to_string(), "still down");
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn slow_calls_time_out() {
    let err = with_retry("slow", policy(1), || async {
        tokio::time::sleep(Duration::from_millis(500)).await;
        Ok(())
    })
    .await
    .unwrap_err();
    assert!(err.to_string().contains("timed out"));
}

#[test]
fn backoff_doubles() {
    let p = RetryPolicy {
        max_attempts: 3,
        base_backoff: Duration::from_millis(200),
        call_timeout: Duration::from_secs(5),
    };
    assert_eq!(p.backoff_for(1), Duration::from_millis(200));
    assert_eq!(p.backoff_for(2), Duration::from_millis(400));
}

#[test]
fn backoff_saturates_on_huge_base() {
    let p = RetryPolicy {
        max_attempts: 8,
        base_backoff: Duration::from_millis(u64::MAX),
        call_timeout: Duration::from_secs(5),
    };
    assert_eq!(p.backoff_for(7), Duration::MAX);
}

fn notification() -> PaymentNotification {
    PaymentNotification {
        reference: "CHT-001".to_string(),
        status: WebhookStatus::Success,
        amount: 5000.0,
        currency: "XAF".to_string(),
        customer: Some(Customer {
            name: Some("Ama & Kofi".to_string()),
            phone: None,
            email: Some("a@b.com".to_string()),
        }),
        transaction_id: None,
        payment_method: None,
    }
}

#[test]
fn templates_escape_and_mention_reference() {
    let n = notification();
    let email = templates::customer_confirmation(&n);
    assert!(email.subject.contains("CHT-001"));
    assert!(email.html.contains("Ama &amp; Kofi"));
    assert!(email.html.contains("5000 XAF"));

    let pending = templates::admin_payment_pending(&n);
    assert!(pending.subject.starts_with("Payment pending"));
}

#[tokio::test]
async fn disabled_notifier_reports_success() {
    let out = DisabledNotifier
        .send_email("a@b.com", "subject", "<p>hi</p>")
        .await
        .unwrap();
    assert!(out.success);
    assert_eq!(out.provider.as_deref(), Some("disabled"));
}

#[test]
fn subjects_drop_header_breaking_characters() {
    let mut n = notification();
    n.reference = "CHT-001\r\nBcc: x@evil.test".to_string();
    let email = templates::admin_payment_received(&n);
    assert!(!email.subject.contains('\r'));
    assert!(!email.subject.contains('\n'));
    assert!(email.subject.ends_with("CHT-001Bcc: x@evil.test"));
    assert!(email.html.contains("CHT-001"));
}

#[test]
fn conflict_alert_names_the_current_status() {
    let n = notification();
    let email = templates::admin_status_conflict(&n, "cancelled");
    assert_eq!(
        email.subject,
        "Action needed: success payment on cancelled order - CHT-001"
    );
    assert!(email.html.contains("already marked cancelled"));
}
