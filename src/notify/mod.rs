//! Receipt notification
//!
//! Email delivery is an external collaborator with no retry or delivery
//! guarantee: the pay path dispatches a receipt after a successful
//! `NEW → PAYED` transition and never rolls the transition back if sending
//! fails. The trait abstracts over the actual delivery service; the
//! implementations here log instead of sending.

use anyhow::Result;
use async_trait::async_trait;
use tera::Tera;
use tracing::info;

use crate::entities::{Order, User};

/// Outbound receipt channel.
#[async_trait]
pub trait ReceiptSender: Send + Sync {
    /// Send a receipt for a freshly paid order.
    ///
    /// # Errors
    ///
    /// Returns an error when the delivery service rejects the message.
    /// Callers treat this as best-effort: failures are logged, not
    /// propagated.
    async fn send_receipt(&self, order: &Order, customer: &User) -> Result<()>;
}

const RECEIPT_TEMPLATE: &str = "\
Thanks for your order, {{ name }}!

Order {{ order_id }}
{% for item in items -%}
  {{ item.quantity }} x {{ item.size }} @ {{ item.price }}
{% endfor -%}
Total: {{ total }}
";

/// Receipt sender that renders the email and writes it to the log.
///
/// Used in development and wherever real delivery is handled out of
/// process.
pub struct ConsoleReceiptSender {
    templates: Tera,
}

impl ConsoleReceiptSender {
    pub fn new() -> Result<Self> {
        let mut templates = Tera::default();
        templates.add_raw_template("receipt.txt", RECEIPT_TEMPLATE)?;
        Ok(Self { templates })
    }

    fn render(&self, order: &Order, customer: &User) -> Result<String> {
        let mut context = tera::Context::new();
        context.insert("name", &customer.name);
        context.insert("order_id", &order.id);
        context.insert("items", &order.items);
        context.insert("total", &order.total_price);
        Ok(self.templates.render("receipt.txt", &context)?)
    }
}

#[async_trait]
impl ReceiptSender for ConsoleReceiptSender {
    async fn send_receipt(&self, order: &Order, customer: &User) -> Result<()> {
        let body = self.render(order, customer)?;
        info!(
            to = %customer.email,
            order = %order.id,
            "receipt email (console mode)\n{}",
            body
        );
        Ok(())
    }
}

/// Receipt sender that drops everything. Used in tests and when receipts
/// are disabled by configuration.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopReceiptSender;

#[async_trait]
impl ReceiptSender for NoopReceiptSender {
    async fn send_receipt(&self, _order: &Order, _customer: &User) -> Result<()> {
        Ok(())
    }
}
