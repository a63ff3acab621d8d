//! Plain-text documents: the printable bill, the cart share message and the order
//! confirmation. Every amount is printed with its currency symbol and exactly two decimals.

use std::io;

use tabled::{
    builder::Builder,
    settings::{Alignment, Style, object::Columns},
};

use crate::{
    billing::{BillBreakdown, FulfillmentEstimate, FulfillmentMode},
    cart::{Cart, CartEntry},
    pricing::{format_price, percent_points},
    receipt::{CustomerIdentity, Receipt, ReceiptError},
};

/// Render the printable bill for `receipt`.
///
/// # Errors
///
/// Returns a [`ReceiptError`] if a line total cannot be computed.
pub fn render_receipt(receipt: &Receipt) -> Result<String, ReceiptError> {
    let mut out = Vec::new();

    write_receipt(&mut out, receipt)?;

    String::from_utf8(out).map_err(|_err| ReceiptError::Io)
}

/// Write the printable bill for `receipt` to `out`.
///
/// # Errors
///
/// Returns [`ReceiptError::Io`] if writing fails, or [`ReceiptError::Pricing`] if a line total
/// cannot be computed.
pub fn write_receipt(mut out: impl io::Write, receipt: &Receipt) -> Result<(), ReceiptError> {
    let store = receipt.store();
    let customer = receipt.customer();

    writeln!(out, "{}", store.name).map_err(|_err| ReceiptError::Io)?;
    writeln!(out, "{}", store.address).map_err(|_err| ReceiptError::Io)?;
    writeln!(out, "Phone: {}", store.phone).map_err(|_err| ReceiptError::Io)?;
    writeln!(out).map_err(|_err| ReceiptError::Io)?;

    writeln!(out, "Bill No: {}", receipt.order_id()).map_err(|_err| ReceiptError::Io)?;
    writeln!(
        out,
        "Date: {}",
        receipt.timestamp().strftime("%Y-%m-%d %H:%M:%S UTC")
    )
    .map_err(|_err| ReceiptError::Io)?;
    writeln!(out).map_err(|_err| ReceiptError::Io)?;

    writeln!(out, "Customer: {}", customer.display_name()).map_err(|_err| ReceiptError::Io)?;

    let contact = [
        ("Email", customer.email()),
        ("Phone", customer.phone()),
        ("Address", customer.address()),
    ];

    for (label, value) in contact {
        if let Some(value) = value {
            writeln!(out, "{label}: {value}").map_err(|_err| ReceiptError::Io)?;
        }
    }

    write_items_table(&mut out, receipt.items())?;

    let bill = receipt.bill();
    let delivery = delivery_label(bill, receipt.fulfillment().mode);

    let mut lines = vec![("Subtotal:".to_string(), format_price(&bill.subtotal()))];

    if bill.discount().is_positive() {
        let label = receipt
            .promo_code()
            .map_or_else(|| "Discount:".to_string(), |code| format!("Discount ({code}):"));

        lines.push((label, format!("-{}", format_price(&bill.discount()))));
    }

    lines.push(("Delivery Charges:".to_string(), delivery));
    lines.push((
        format!("Tax ({}%):", percent_points(bill.tax_rate())),
        format_price(&bill.tax()),
    ));
    lines.push(("TOTAL AMOUNT:".to_string(), format_price(&bill.total())));

    write_summary(&mut out, &lines)?;

    writeln!(out).map_err(|_err| ReceiptError::Io)?;
    writeln!(out, "Payment Method: {}", receipt.payment()).map_err(|_err| ReceiptError::Io)?;
    writeln!(out, "Payment Status: {}", receipt.payment().status())
        .map_err(|_err| ReceiptError::Io)?;
    writeln!(out, "Estimated {}", receipt.fulfillment()).map_err(|_err| ReceiptError::Io)?;
    writeln!(out).map_err(|_err| ReceiptError::Io)?;
    writeln!(out, "Thank you for your order!").map_err(|_err| ReceiptError::Io)?;

    Ok(())
}

/// Render a short message describing the cart, for sharing.
///
/// # Errors
///
/// Returns a [`ReceiptError`] if a line total cannot be computed.
pub fn render_share_summary(cart: &Cart, bill: &BillBreakdown) -> Result<String, ReceiptError> {
    use std::fmt::Write;

    let mut out = String::new();

    writeln!(out, "Check out my pizza cart!").map_err(|_err| ReceiptError::Io)?;

    for entry in cart.iter() {
        writeln!(out).map_err(|_err| ReceiptError::Io)?;
        writeln!(out, "- {} ({})", entry.item().name, entry.size())
            .map_err(|_err| ReceiptError::Io)?;
        writeln!(out, "  Quantity: {}", entry.quantity()).map_err(|_err| ReceiptError::Io)?;
        writeln!(out, "  Price: {}", format_price(&entry.line_total()?))
            .map_err(|_err| ReceiptError::Io)?;

        if let Some(note) = entry.customization() {
            writeln!(out, "  Special: {note}").map_err(|_err| ReceiptError::Io)?;
        }
    }

    writeln!(out).map_err(|_err| ReceiptError::Io)?;
    writeln!(out, "Subtotal: {}", format_price(&bill.subtotal()))
        .map_err(|_err| ReceiptError::Io)?;

    if bill.discount().is_positive() {
        writeln!(out, "Discount: -{}", format_price(&bill.discount()))
            .map_err(|_err| ReceiptError::Io)?;
    }

    if bill.delivery_charge().is_positive() {
        writeln!(out, "Delivery: {}", format_price(&bill.delivery_charge()))
            .map_err(|_err| ReceiptError::Io)?;
    }

    writeln!(out, "Tax: {}", format_price(&bill.tax())).map_err(|_err| ReceiptError::Io)?;
    write!(out, "Total: {}", format_price(&bill.total())).map_err(|_err| ReceiptError::Io)?;

    Ok(out)
}

/// Render the confirmation shown before an order is placed.
///
/// # Errors
///
/// Returns a [`ReceiptError`] if a line total cannot be computed.
pub fn render_order_confirmation(
    cart: &Cart,
    bill: &BillBreakdown,
    customer: &CustomerIdentity,
    promo_code: Option<&str>,
    estimate: FulfillmentEstimate,
) -> Result<String, ReceiptError> {
    use std::fmt::Write;

    let mut out = String::new();

    writeln!(out, "Confirm your order").map_err(|_err| ReceiptError::Io)?;
    writeln!(out, "Customer: {}", customer.display_name()).map_err(|_err| ReceiptError::Io)?;
    writeln!(out, "Fulfillment: {}", estimate.mode).map_err(|_err| ReceiptError::Io)?;
    writeln!(out).map_err(|_err| ReceiptError::Io)?;

    for entry in cart.iter() {
        writeln!(
            out,
            "{} ({}) x{} @ {} = {}",
            entry.item().name,
            entry.size(),
            entry.quantity(),
            format_price(&entry.item().unit_price),
            format_price(&entry.line_total()?)
        )
        .map_err(|_err| ReceiptError::Io)?;
    }

    writeln!(out).map_err(|_err| ReceiptError::Io)?;
    writeln!(out, "Subtotal: {}", format_price(&bill.subtotal()))
        .map_err(|_err| ReceiptError::Io)?;

    if bill.discount().is_positive() {
        let label = promo_code.map_or_else(
            || "Discount".to_string(),
            |code| format!("Discount ({code})"),
        );

        writeln!(out, "{label}: -{}", format_price(&bill.discount()))
            .map_err(|_err| ReceiptError::Io)?;
    }

    writeln!(out, "Delivery: {}", delivery_label(bill, estimate.mode))
        .map_err(|_err| ReceiptError::Io)?;
    writeln!(
        out,
        "Tax ({}%): {}",
        percent_points(bill.tax_rate()),
        format_price(&bill.tax())
    )
    .map_err(|_err| ReceiptError::Io)?;
    writeln!(out, "Total: {}", format_price(&bill.total())).map_err(|_err| ReceiptError::Io)?;
    write!(out, "Estimated {estimate}").map_err(|_err| ReceiptError::Io)?;

    Ok(out)
}

fn delivery_label(bill: &BillBreakdown, mode: FulfillmentMode) -> String {
    match mode {
        FulfillmentMode::Pickup => "Free".to_string(),
        FulfillmentMode::Delivery => format_price(&bill.delivery_charge()),
    }
}

fn write_items_table(out: &mut impl io::Write, items: &[CartEntry]) -> Result<(), ReceiptError> {
    let mut builder = Builder::default();

    builder.push_record(["Item", "Size", "Qty", "Price", "Amount"]);

    for entry in items {
        let name = match entry.customization() {
            Some(note) => format!("{}\nNote: {note}", entry.item().name),
            None => entry.item().name.clone(),
        };

        builder.push_record([
            name,
            entry.size().to_string(),
            entry.quantity().to_string(),
            format_price(&entry.item().unit_price),
            format_price(&entry.line_total()?),
        ]);
    }

    let mut table = builder.build();

    table.with(Style::ascii());
    table.modify(Columns::new(2..5), Alignment::right());

    writeln!(out, "\n{table}\n").map_err(|_err| ReceiptError::Io)
}

fn write_summary(
    out: &mut impl io::Write,
    lines: &[(String, String)],
) -> Result<(), ReceiptError> {
    let label_width = lines
        .iter()
        .map(|(label, _)| label.chars().count())
        .max()
        .unwrap_or_default();

    let value_width = lines
        .iter()
        .map(|(_, value)| value.chars().count())
        .max()
        .unwrap_or_default();

    for (label, value) in lines {
        // Pad by char count: currency symbols are multi-byte.
        let label_pad = label_width.saturating_sub(label.chars().count());
        let value_pad = value_width.saturating_sub(value.chars().count());

        writeln!(
            out,
            "{label}{}  {}{value}",
            " ".repeat(label_pad),
            " ".repeat(value_pad)
        )
        .map_err(|_err| ReceiptError::Io)?;
    }

    Ok(())
}
