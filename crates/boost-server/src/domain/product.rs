//! The single subscription product sold at checkout.

pub struct Product {
    pub name: &'static str,
    pub description: &'static str,
    pub unit_amount_cents: i64,
    pub currency: &'static str,
    pub interval: &'static str,
    pub payment_method_types: &'static [&'static str],
    pub locale: &'static str,
}

pub const SUBSCRIPTION_PRODUCT: Product = Product {
    name: "BewertungenBoost Monatlich",
    description: "NFC-Stand + 3x Acryl-Sticker + 10x Google Sticker + Dashboard-Zugang",
    unit_amount_cents: 5000,
    currency: "eur",
    interval: "month",
    payment_method_types: &["card", "sepa_debit"],
    locale: "de",
};

impl Product {
    /// Whole currency units per billing interval, used for ROI figures.
    pub fn monthly_price(&self) -> i64 {
        self.unit_amount_cents / 100
    }
}
