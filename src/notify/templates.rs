use crate::domain::notification::{PaymentNotification, WebhookStatus};

pub struct Email {
    pub subject: String,
    pub html: String,
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Subjects are a plain-text header: HTML entities would show literally, so
/// control characters and angle brackets are dropped instead.
fn subject_text(s: &str) -> String {
    s.chars()
        .filter(|c| !c.is_control() && *c != '<' && *c != '>')
        .collect()
}

fn amount_line(n: &PaymentNotification) -> String {
    if n.amount.fract() == 0.0 {
        format!("{:.0} {}", n.amount, escape(&n.currency))
    } else {
        format!("{:.2} {}", n.amount, escape(&n.currency))
    }
}

fn customer_rows(n: &PaymentNotification) -> String {
    let Some(c) = &n.customer else {
        return String::new();
    };
    [("Customer", &c.name), ("Phone", &c.phone), ("Email", &c.email)]
        .iter()
        .filter_map(|(label, value)| {
            value
                .as_deref()
                .map(|v| format!("<tr><td>{label}</td><td>{}</td></tr>", escape(v)))
        })
        .collect()
}

fn layout(title: &str, intro: &str, n: &PaymentNotification) -> String {
    format!(
        "<!DOCTYPE html><html><body style=\"font-family:Arial,sans-serif;color:#222\">\
         <h2 style=\"color:#e85d04\">ChopTym</h2><h3>{title}</h3><p>{intro}</p>\
         <table cellpadding=\"6\">\
         <tr><td>Order reference</td><td><strong>{reference}</strong></td></tr>\
         <tr><td>Amount</td><td>{amount}</td></tr>\
         <tr><td>Status</td><td>{status}</td></tr>{customer}</table>\
         </body></html>",
        title = escape(title),
        intro = intro,
        reference = escape(&n.reference),
        amount = amount_line(n),
        status = n.status.as_str(),
        customer = customer_rows(n),
    )
}

pub fn customer_confirmation(n: &PaymentNotification) -> Email {
    let name = n
        .customer
        .as_ref()
        .and_then(|c| c.name.as_deref())
        .map(escape)
        .unwrap_or_else(|| "there".to_string());
    Email {
        subject: format!("Payment confirmed - Order {}", subject_text(&n.reference)),
        html: layout(
            "Payment confirmed",
            &format!("Hi {name}, we received your payment. Your order is confirmed and the kitchen is on it."),
            n,
        ),
    }
}

pub fn admin_payment_received(n: &PaymentNotification) -> Email {
    Email {
        subject: format!("New payment received - {}", subject_text(&n.reference)),
        html: layout("Payment received", "A customer payment was confirmed by the provider.", n),
    }
}

pub fn admin_payment_failed(n: &PaymentNotification) -> Email {
    Email {
        subject: format!("Payment failed - {}", subject_text(&n.reference)),
        html: layout("Payment failed", "The provider reported a failed payment. The order was marked failed.", n),
    }
}

pub fn admin_payment_pending(n: &PaymentNotification) -> Email {
    Email {
        subject: format!("Payment pending - {}", subject_text(&n.reference)),
        html: layout("Payment pending", "The provider reported the payment as pending. No order changes were made.", n),
    }
}

/// Admin alert for a webhook that arrived after the order was already closed
/// with a different outcome, e.g. money captured on a cancelled order.
pub fn admin_status_conflict(n: &PaymentNotification, current: &str) -> Email {
    let intro = match n.status {
        WebhookStatus::Success => format!(
            "The provider captured a payment for an order already marked {}. \
             The order was left unchanged; review it and refund or reopen as needed.",
            escape(current)
        ),
        _ => format!(
            "The provider reported a {} payment for an order already marked {}. \
             The order was left unchanged.",
            n.status.as_str(),
            escape(current)
        ),
    };
    Email {
        subject: format!(
            "Action needed: {} payment on {} order - {}",
            n.status.as_str(),
            subject_text(current),
            subject_text(&n.reference)
        ),
        html: layout("Payment on a closed order", &intro, n),
    }
}
