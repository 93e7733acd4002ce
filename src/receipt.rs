//! Receipt

use std::io;

use tabled::{
    builder::Builder,
    grid::config::HorizontalLine,
    settings::{
        Alignment, Color, Style, Theme,
        object::{Columns, Rows},
    },
};
use thiserror::Error;

use crate::{
    currencies::{Price, StoreCurrency},
    items::VariantKey,
    ledger::CartLedger,
    orders::OrderSnapshot,
    pricing::{PricingResolver, TotalPriceError},
    promotions::PromoCode,
};

/// Errors that can occur when building or writing a receipt.
#[derive(Debug, Error)]
pub enum ReceiptError {
    /// Totals could not be computed
    #[error(transparent)]
    Pricing(#[from] TotalPriceError),

    /// Output could not be written
    #[error("failed to write receipt: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Clone)]
struct ReceiptRow {
    name: String,
    variant: Option<VariantKey>,
    quantity: u32,
    unit_price: Price,
    line_total: Price,
}

/// A priced cart, ready to print.
#[derive(Debug, Clone)]
pub struct Receipt {
    rows: Vec<ReceiptRow>,
    subtotal: Price,
    discount: Price,
    promo_code: Option<PromoCode>,
    delivery_fee: Option<Price>,
    total: Price,
    currency: StoreCurrency,
}

impl Receipt {
    /// Price the ledger's cart in its checkout currency. Only a promo that still matches the
    /// cart is shown.
    ///
    /// # Errors
    ///
    /// Returns a [`ReceiptError`] if a total overflows.
    pub fn from_ledger(ledger: &CartLedger) -> Result<Self, ReceiptError> {
        let currency = ledger.currency();
        let quotes = ledger.quotes(currency)?;

        let rows = ledger
            .items()
            .iter()
            .zip(quotes)
            .map(|(item, quote)| ReceiptRow {
                name: item.product.name.clone(),
                variant: item.variant.clone(),
                quantity: item.quantity,
                unit_price: quote.unit_price,
                line_total: quote.line_total,
            })
            .collect();

        let promo = ledger.applied_promo();
        let subtotal = ledger.total_price(currency)?;
        let total = PricingResolver::new().order_total(subtotal, promo)?;

        Ok(Self {
            rows,
            subtotal,
            discount: subtotal.sub(total).map_err(TotalPriceError::from)?,
            promo_code: promo.map(|promo| promo.code.clone()),
            delivery_fee: None,
            total,
            currency,
        })
    }

    /// The receipt for a checkout snapshot, including its delivery fee.
    #[must_use]
    pub fn from_snapshot(snapshot: &OrderSnapshot) -> Self {
        Self {
            rows: snapshot
                .lines
                .iter()
                .map(|line| ReceiptRow {
                    name: line.name.clone(),
                    variant: line.variant.clone(),
                    quantity: line.quantity,
                    unit_price: line.unit_price,
                    line_total: line.line_total,
                })
                .collect(),
            subtotal: snapshot.subtotal,
            discount: snapshot.discount,
            promo_code: snapshot.promo_code.clone(),
            delivery_fee: Some(snapshot.delivery_fee),
            total: snapshot.total,
            currency: snapshot.currency,
        }
    }

    /// Total cost before the discount
    pub fn subtotal(&self) -> Price {
        self.subtotal
    }

    /// Amount payable
    pub fn total(&self) -> Price {
        self.total
    }

    /// Currency used for all monetary values
    pub fn currency(&self) -> StoreCurrency {
        self.currency
    }

    /// Writes the receipt as a table followed by its totals.
    ///
    /// # Errors
    ///
    /// Returns an error if the receipt cannot be written.
    pub fn write_to(&self, mut out: impl io::Write) -> Result<(), ReceiptError> {
        if self.rows.is_empty() {
            writeln!(out, "\nYour cart is empty.")?;
            return Ok(());
        }

        let mut builder = Builder::default();

        builder.push_record(["", "Item", "Option", "Qty", "Unit Price", "Line Total"]);

        for (idx, row) in self.rows.iter().enumerate() {
            builder.push_record([
                format!("#{:<3}", idx + 1),
                row.name.clone(),
                row.variant.as_ref().map(ToString::to_string).unwrap_or_default(),
                row.quantity.to_string(),
                row.unit_price.to_string(),
                row.line_total.to_string(),
            ]);
        }

        let mut table = builder.build();
        let mut theme = Theme::from(Style::modern_rounded());

        theme.remove_horizontal_lines();
        theme.insert_horizontal_line(
            1,
            HorizontalLine::new(Some('─'), Some('┼'), Some('├'), Some('┤')),
        );

        table.with(theme);
        table.modify(Rows::first(), Color::BOLD);
        table.modify(Columns::new(3..6), Alignment::right());

        writeln!(out, "\n{table}")?;

        self.write_summary(&mut out)
    }

    fn write_summary(&self, out: &mut impl io::Write) -> Result<(), ReceiptError> {
        writeln!(out, " Subtotal: {}", self.subtotal)?;

        if let Some(code) = &self.promo_code {
            writeln!(out, " Discount ({code}): -{}", self.discount)?;
        }

        if let Some(fee) = &self.delivery_fee {
            writeln!(out, " Delivery: {fee}")?;
        }

        writeln!(out, " Total: {} ({})", self.total, self.currency)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use jiff::Timestamp;
    use testresult::TestResult;

    use crate::{
        fixtures::{InMemoryRemoteCart, gummies, lemon_haze},
        items::LineItem,
        ledger::MemoryCartStore,
        promotions::{MockPromoValidator, PromoVerdict},
    };

    use super::*;

    fn ledger(currency: StoreCurrency) -> CartLedger {
        CartLedger::new(
            Arc::new(MemoryCartStore::new()),
            Arc::new(InMemoryRemoteCart::new()),
            currency,
        )
    }

    #[tokio::test]
    async fn write_to_renders_lines_and_totals() -> TestResult {
        let mut ledger = ledger(StoreCurrency::Usd);

        ledger.add_item(&lemon_haze(), 2, VariantKey::parse("sativa")).await?;
        ledger.add_item(&gummies(), 1, None).await?;

        let receipt = Receipt::from_ledger(&ledger)?;

        let mut out = Vec::new();
        receipt.write_to(&mut out)?;

        let output = String::from_utf8(out)?;
        assert!(output.contains("Lemon Haze"), "{output}");
        assert!(output.contains("sativa"), "{output}");
        assert!(output.contains("Mango Gummies"), "{output}");
        assert!(output.contains("Subtotal:"), "{output}");
        assert!(output.contains("Total:"), "{output}");
        assert!(output.contains("USD"), "{output}");
        assert!(!output.contains("Discount"), "{output}");

        Ok(())
    }

    #[tokio::test]
    async fn applied_promo_is_shown_as_a_discount() -> TestResult {
        let mut ledger = ledger(StoreCurrency::Thb);
        let mut validator = MockPromoValidator::new();
        validator.expect_validate().returning(|request| {
            Ok(PromoVerdict::Valid {
                discount: request.currency.minor(50_00),
            })
        });

        ledger.add_item(&gummies(), 2, None).await?;
        ledger.apply_promo("fifty", &validator).await?;

        let receipt = Receipt::from_ledger(&ledger)?;

        assert_eq!(receipt.subtotal(), StoreCurrency::Thb.minor(700_00));
        assert_eq!(receipt.total(), StoreCurrency::Thb.minor(650_00));

        let mut out = Vec::new();
        receipt.write_to(&mut out)?;

        let output = String::from_utf8(out)?;
        assert!(output.contains("Discount (FIFTY)"), "{output}");

        Ok(())
    }

    #[test]
    fn snapshot_receipt_includes_delivery() -> TestResult {
        let snapshot = OrderSnapshot::assemble(
            &[LineItem::new(gummies(), 1, None)],
            StoreCurrency::Thb,
            &PricingResolver::new(),
            None,
            StoreCurrency::Thb.minor(40_00),
        )?;

        let receipt = Receipt::from_snapshot(&snapshot);

        assert_eq!(receipt.total(), StoreCurrency::Thb.minor(390_00));
        assert!(snapshot.assembled_at <= Timestamp::now(), "snapshot time is in the past");

        let mut out = Vec::new();
        receipt.write_to(&mut out)?;

        let output = String::from_utf8(out)?;
        assert!(output.contains("Delivery:"), "{output}");

        Ok(())
    }

    #[test]
    fn empty_cart_is_reported_without_a_table() -> TestResult {
        let receipt = Receipt::from_ledger(&ledger(StoreCurrency::Thb))?;

        let mut out = Vec::new();
        receipt.write_to(&mut out)?;

        assert_eq!(String::from_utf8(out)?.trim(), "Your cart is empty.");

        Ok(())
    }
}
