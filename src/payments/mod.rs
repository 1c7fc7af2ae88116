mod rupantorpay;

pub use rupantorpay::*;

/// Payment methods offered at checkout. Manual methods are settled by the
/// customer sending money directly and quoting a transaction id; the
/// gateway method goes through the hosted RupantorPay checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentMethod {
    Bkash,
    Nagad,
    Rocket,
    RupantorPay,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Bkash => "bkash",
            PaymentMethod::Nagad => "nagad",
            PaymentMethod::Rocket => "rocket",
            PaymentMethod::RupantorPay => "rupantorpay",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "bkash" => Some(PaymentMethod::Bkash),
            "nagad" => Some(PaymentMethod::Nagad),
            "rocket" => Some(PaymentMethod::Rocket),
            "rupantorpay" => Some(PaymentMethod::RupantorPay),
            _ => None,
        }
    }

    /// Manual methods require the customer-quoted transaction id at
    /// checkout; the gateway supplies its own.
    pub fn requires_transaction_id(&self) -> bool {
        !matches!(self, PaymentMethod::RupantorPay)
    }
}
