use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvoiceStatus {
    Pending,
    Paid,
    Cancelled,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Pending => "Pending",
            InvoiceStatus::Paid => "Paid",
            InvoiceStatus::Cancelled => "Cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Pending" => Some(InvoiceStatus::Pending),
            "Paid" => Some(InvoiceStatus::Paid),
            "Cancelled" => Some(InvoiceStatus::Cancelled),
            _ => None,
        }
    }
}

/// One purchased product on an invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceLine {
    pub name: String,
    pub price: i64,
    pub quantity: i64,
    pub total: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: Uuid,
    pub user_email: String,
    pub items: Vec<InvoiceLine>,
    pub total_amount: i64,
    pub status: InvoiceStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Invoice {
    /// Create a pending invoice.
    pub fn pending(user_email: String, items: Vec<InvoiceLine>, total_amount: i64) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_email,
            items,
            total_amount,
            status: InvoiceStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }
}
