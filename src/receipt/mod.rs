//! Receipt

use std::{fmt::Write, io};

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
    checkout::{DeliveryMode, format_phone},
    options::SelectedOption,
    orders::{OrderLine, OrderPayload},
    prices::Price,
    pricing::{PricingError, options_total},
};

/// Errors that can occur when rendering an order summary.
#[derive(Debug, Error)]
pub enum ReceiptError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// A line's unit price could not be computed.
    #[error(transparent)]
    Pricing(#[from] PricingError),
}

/// Plain-text summary of an order, as shown before confirming.
#[derive(Debug, Clone, Copy)]
pub struct OrderSummary<'a> {
    order: &'a OrderPayload,
    colored: bool,
}

impl<'a> OrderSummary<'a> {
    /// Summary of `order` with colored borders.
    pub fn new(order: &'a OrderPayload) -> Self {
        Self {
            order,
            colored: true,
        }
    }

    /// Summary without ANSI escapes, for logs and plain files.
    #[must_use]
    pub fn plain(mut self) -> Self {
        self.colored = false;
        self
    }

    /// The summarized order
    pub fn order(&self) -> &'a OrderPayload {
        self.order
    }

    /// Writes the items table, totals, delivery and payment details.
    ///
    /// # Errors
    ///
    /// Returns an error if a unit price cannot be computed or the output cannot be
    /// written.
    pub fn write_to(&self, mut out: impl io::Write) -> Result<(), ReceiptError> {
        let mut builder = Builder::default();

        builder.push_record(["Qtd", "Item", "Opções", "Unitário", "Total"]);

        for line in &self.order.items {
            append_line_row(&mut builder, line)?;
        }

        let mut table = builder.build();
        let mut theme = Theme::from(Style::modern_rounded());
        let separator = HorizontalLine::new(Some('─'), Some('┼'), Some('├'), Some('┤'));

        theme.remove_horizontal_lines();
        theme.insert_horizontal_line(1, separator);

        table.with(theme);
        table.modify(Columns::new(3..5), Alignment::right());
        table.modify(Columns::first(), Alignment::right());

        if self.colored {
            table.modify(Rows::first(), Color::BOLD);
        }

        let table_str = if self.colored {
            colorize_borders(&table.to_string())
        } else {
            table.to_string()
        };

        writeln!(out, "\n{table_str}")?;

        self.write_totals(&mut out)?;
        self.write_details(&mut out)?;

        Ok(())
    }

    fn write_totals(&self, out: &mut impl io::Write) -> Result<(), ReceiptError> {
        let order = self.order;

        let mut lines: Vec<(String, String)> = vec![(
            " Subtotal:".to_string(),
            format!("{}  ", order.subtotal),
        )];

        if order.delivery_type == DeliveryMode::Delivery {
            lines.push((" Entrega:".to_string(), format!("{}  ", order.delivery_fee)));
        }

        if self.colored {
            lines.push((
                " \x1b[1mTotal:\x1b[0m".to_string(),
                format!("\x1b[1m{}  \x1b[0m", order.total),
            ));
        } else {
            lines.push((" Total:".to_string(), format!("{}  ", order.total)));
        }

        let label_width = lines
            .iter()
            .map(|(label, _)| visible_width(label))
            .max()
            .unwrap_or_default();

        let value_width = lines
            .iter()
            .map(|(_, value)| visible_width(value))
            .max()
            .unwrap_or_default();

        for (label, value) in &lines {
            write_summary_line(out, label, value, label_width, value_width)?;
        }

        writeln!(out)?;

        Ok(())
    }

    fn write_details(&self, out: &mut impl io::Write) -> Result<(), ReceiptError> {
        let order = self.order;
        let customer = &order.customer;

        writeln!(
            out,
            " Cliente: {} {}",
            customer.name,
            format_phone(&customer.phone)
        )?;

        match order.delivery_type {
            DeliveryMode::Delivery => {
                let address = customer.address.as_deref().unwrap_or_default();

                match customer.address_complement.as_deref() {
                    Some(complement) => writeln!(out, " Entrega: {address} ({complement})")?,
                    None => writeln!(out, " Entrega: {address}")?,
                }
            }
            DeliveryMode::Pickup => writeln!(out, " Retirada no local")?,
        }

        writeln!(out, " Pagamento: {}", order.payment_method_name)?;

        if let Some(change_for) = order.payment_change_for {
            writeln!(out, " Troco para {change_for}")?;
        }

        if let Some(notes) = customer.notes.as_deref() {
            writeln!(out, " Observações: {notes}")?;
        }

        Ok(())
    }
}

fn append_line_row(builder: &mut Builder, line: &OrderLine) -> Result<(), ReceiptError> {
    let item = match line.notes.as_deref() {
        Some(notes) => format!("{}\nObs: {notes}", line.name),
        None => line.name.clone(),
    };

    builder.push_record([
        format!("{}x", line.quantity),
        item,
        options_display(&line.options),
        format!("{}", unit_price_with_options(line)?),
        format!("{}", line.total_price),
    ]);

    Ok(())
}

/// The line's base price plus its option modifiers.
fn unit_price_with_options(line: &OrderLine) -> Result<Price, PricingError> {
    let modifiers = options_total(&line.options, line.unit_price.currency())?;

    Ok(line.unit_price.add(modifiers)?)
}

/// One line per group: `Calda: Caramelo, Morango`.
fn options_display(options: &[SelectedOption]) -> String {
    options
        .iter()
        .map(|option| {
            let values: Vec<&str> = option
                .values
                .iter()
                .map(|value| value.value_name.as_str())
                .collect();

            format!("{}: {}", option.option_name, values.join(", "))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Wraps runs of UTF-8 box-drawing characters in ANSI dark-grey escape codes.
fn colorize_borders(table: &str) -> String {
    let mut out = String::with_capacity(table.len() + 256);
    let mut in_run = false;

    for ch in table.chars() {
        let box_char = ('\u{2500}'..='\u{257F}').contains(&ch);

        if box_char && !in_run {
            _ = out.write_str("\x1b[90m");
            in_run = true;
        } else if !box_char && in_run {
            _ = out.write_str("\x1b[0m");
            in_run = false;
        }

        out.push(ch);
    }

    if in_run {
        _ = out.write_str("\x1b[0m");
    }

    out
}

/// Returns the visible (non-ANSI) width of a string.
fn visible_width(s: &str) -> usize {
    let mut width = 0usize;
    let mut in_escape = false;

    for ch in s.chars() {
        if in_escape {
            if ch.is_ascii_alphabetic() {
                in_escape = false;
            }
        } else if ch == '\x1b' {
            in_escape = true;
        } else {
            width += 1;
        }
    }

    width
}

/// Writes a summary line with a right-aligned label and a fixed-width value column.
fn write_summary_line(
    out: &mut impl io::Write,
    label: &str,
    value: &str,
    label_col_width: usize,
    value_col_width: usize,
) -> Result<(), ReceiptError> {
    let label_pad = label_col_width.saturating_sub(visible_width(label));
    let value_pad = value_col_width.saturating_sub(visible_width(value));

    writeln!(
        out,
        "{:>label_pad$}{label}  {value_pad}{value}",
        "",
        value_pad = " ".repeat(value_pad)
    )?;

    Ok(())
}
