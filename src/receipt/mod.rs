//! Receipt
//!
//! Console rendering of the price list, cart quotes and order status.

use std::{io, ops::Range};

use rust_decimal::Decimal;
use tabled::{
    builder::Builder,
    settings::{
        Alignment, Color, Style, Theme,
        object::{Columns, Rows},
    },
};
use thiserror::Error;

use crate::{
    api::BookingRecord,
    catalog::Catalog,
    pricing::{PricedLine, PricingResult, format_amount, format_compact, to_money},
    promotions::Promotion,
};

/// Errors that can occur when writing a receipt.
#[derive(Debug, Error)]
pub enum ReceiptError {
    /// Writing to the output failed.
    #[error("failed to write receipt: {0}")]
    Io(#[from] io::Error),
}

/// A priced cart ready to be shown to the customer.
#[derive(Debug, Clone)]
pub struct Quote<'a> {
    lines: Vec<PricedLine<'a>>,
    totals: PricingResult,
    promotion: Option<&'a Promotion>,
}

impl<'a> Quote<'a> {
    /// Create a quote from priced lines, their totals and the applied promotion.
    pub fn new(
        lines: Vec<PricedLine<'a>>,
        totals: PricingResult,
        promotion: Option<&'a Promotion>,
    ) -> Self {
        Self {
            lines,
            totals,
            promotion,
        }
    }

    /// Write the quote as a table followed by the order summary.
    ///
    /// # Errors
    ///
    /// Returns an error if the output cannot be written.
    pub fn write_to(&self, mut out: impl io::Write) -> Result<(), ReceiptError> {
        if self.lines.is_empty() {
            writeln!(out, "Your cart is empty.")?;

            return Ok(());
        }

        let mut builder = Builder::default();

        builder.push_record(["Serial", "Product", "Qty", "Price", "Discount", "Amount"]);

        for line in &self.lines {
            builder.push_record([
                line.product.serial_number.clone(),
                line.product.name.clone(),
                line.quantity.to_string(),
                format!("{} / {}", format_amount(line.product.unit_price), line.product.per),
                discount_cell(line),
                format_amount(line.total),
            ]);
        }

        write_table(&mut out, builder, Columns::new(2..6))?;

        self.write_summary(&mut out)
    }

    fn write_summary(&self, out: &mut impl io::Write) -> Result<(), ReceiptError> {
        let promo_label = match self.promotion {
            Some(promotion) => format!(
                "Promo {} ({}%):",
                promotion.code,
                format_compact(promotion.discount_percent)
            ),
            None => "Promo discount:".to_string(),
        };

        let rows = [
            ("Net:".to_string(), self.totals.net),
            ("Product discount:".to_string(), self.totals.product_discount),
            (promo_label, self.totals.promo_discount),
            ("You save:".to_string(), self.totals.save),
            ("Total:".to_string(), self.totals.total),
        ];

        let label_width = rows.iter().map(|(label, _)| label.len()).max().unwrap_or(0);

        let values: Vec<String> = rows
            .iter()
            .map(|(_, amount)| to_money(*amount).to_string())
            .collect();

        let value_width = values.iter().map(|value| value.chars().count()).max().unwrap_or(0);

        writeln!(out)?;

        for ((label, _), value) in rows.iter().zip(values) {
            writeln!(out, " {label:>label_width$}  {value:>value_width$}")?;
        }

        Ok(())
    }
}

/// Write the catalog grouped by product type.
///
/// # Errors
///
/// Returns an error if the output cannot be written.
pub fn write_price_list(catalog: &Catalog, mut out: impl io::Write) -> Result<(), ReceiptError> {
    if catalog.is_empty() {
        writeln!(out, "No products are available right now.")?;

        return Ok(());
    }

    let mut builder = Builder::default();

    builder.push_record(["Serial", "Product", "Per", "Price", "Discount", "Offer price"]);

    for (section, products) in catalog.sections() {
        builder.push_record([
            String::new(),
            section.replace('_', " ").to_uppercase(),
            String::new(),
            String::new(),
            String::new(),
            String::new(),
        ]);

        for product in products {
            builder.push_record([
                product.serial_number.clone(),
                product.name.clone(),
                product.per.clone(),
                format_amount(product.unit_price),
                percent_cell(product.discount_percent),
                format_amount(product.discounted_unit_price()),
            ]);
        }
    }

    write_table(&mut out, builder, Columns::new(3..6))
}

/// Write the status of a submitted order.
///
/// # Errors
///
/// Returns an error if the output cannot be written.
pub fn write_booking(record: &BookingRecord, mut out: impl io::Write) -> Result<(), ReceiptError> {
    let mut builder = Builder::default();

    builder.push_record(["Order", "Status", "Customer", "Total", "Placed"]);
    builder.push_record([
        record.order_id.to_string(),
        record.status.clone(),
        record.customer_name.clone().unwrap_or_default(),
        record.total.map(format_amount).unwrap_or_default(),
        record
            .created_at
            .map(|created| created.strftime("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default(),
    ]);

    write_table(&mut out, builder, Columns::new(3..4))
}

fn discount_cell(line: &PricedLine<'_>) -> String {
    let discount = line.net - line.total;

    if discount.is_zero() {
        String::new()
    } else {
        format!("-{}", format_amount(discount))
    }
}

fn percent_cell(percent: Decimal) -> String {
    if percent.is_zero() {
        String::new()
    } else {
        format!("{}%", format_compact(percent))
    }
}

fn write_table(
    out: &mut impl io::Write,
    builder: Builder,
    amounts: Columns<Range<usize>>,
) -> Result<(), ReceiptError> {
    let mut table = builder.build();
    let mut theme = Theme::from(Style::modern_rounded());

    theme.remove_horizontal_lines();

    table.with(theme);
    table.modify(Rows::first(), Color::BOLD);
    table.modify(amounts, Alignment::right());

    writeln!(out, "{table}")?;

    Ok(())
}
