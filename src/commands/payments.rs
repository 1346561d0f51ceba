// Bills, payments and online payment orders.

use serde_json::{json, Value};

use super::{hint_next_page, nodes, opt_str, tri_state, variables, App};
use crate::cli::{MonthlyBillArgs, PaymentArgs, PaymentOrderArgs, PaymentSummaryArgs};
use crate::dates;
use crate::error::Result;
use crate::queries;
use crate::table::{cell, full_name, yes_no, Table};

pub fn monthly_bills(app: &App, args: &MonthlyBillArgs) -> Result<()> {
    let client = app.connect()?;
    let response = app.fetch(
        &client,
        queries::MONTHLY_BILLS,
        variables([
            ("year", json!(args.year)),
            ("child", opt_str(args.child.as_deref())),
            ("isPaid", tri_state(args.paid, args.unpaid)),
            ("first", json!(args.first)),
            ("after", opt_str(args.after.as_deref())),
        ]),
    )?;
    let connection = response.field("monthlyBills");
    app.emit(&response, |_| {
        let mut table = Table::new(
            format!("Monthly bills (total balance: {})", cell(&connection["totalBalance"])),
            &["Payment due", "Child", "Full amount", "Paid amount", "Balance"],
        );
        for node in nodes(connection) {
            table.push(vec![
                cell(&node["paymentDueTo"]),
                full_name(&node["child"]),
                cell(&node["fullAmount"]),
                cell(&node["paidAmount"]),
                cell(&node["balance"]),
            ]);
        }
        table
    })?;
    hint_next_page(app, connection);
    Ok(())
}

pub fn payments(app: &App, args: &PaymentArgs) -> Result<()> {
    let today = dates::today();
    let date_from = match args.date_from.as_deref() {
        Some(d) => json!(dates::normalize(d, today)?),
        None => Value::Null,
    };
    let date_to = match args.date_to.as_deref() {
        Some(d) => json!(dates::normalize(d, today)?),
        None => Value::Null,
    };

    let client = app.connect()?;
    let response = app.fetch(
        &client,
        queries::PAYMENTS,
        variables([
            ("first", json!(args.first)),
            ("after", opt_str(args.after.as_deref())),
            ("dateFrom", date_from),
            ("dateTo", date_to),
            ("child", opt_str(args.child.as_deref())),
            ("type", opt_str(args.kind.as_deref())),
            ("isBooked", tri_state(args.booked, args.not_booked)),
        ]),
    )?;
    let connection = response.field("payments");
    app.emit(&response, |_| {
        let mut table = Table::new(
            "Payments",
            &["Title", "Amount", "Date", "Type", "Booked", "Child"],
        );
        for node in nodes(connection) {
            table.push(vec![
                cell(&node["title"]),
                cell(&node["amount"]),
                cell(&node["paymentDate"]),
                cell(&node["type"]),
                yes_no(node["isBooked"] == Value::Bool(true)).to_string(),
                full_name(&node["child"]),
            ]);
        }
        table
    })?;
    hint_next_page(app, connection);
    Ok(())
}

pub fn summary(app: &App, args: &PaymentSummaryArgs) -> Result<()> {
    let groups = if args.groups_ids.is_empty() {
        Value::Null
    } else {
        json!(args.groups_ids)
    };
    let client = app.connect()?;
    let response = app.fetch(
        &client,
        queries::PAYMENTS_SUMMARY,
        variables([
            ("search", opt_str(args.search.as_deref())),
            ("groupsIds", groups),
            ("balanceGte", json!(args.balance_gte)),
            ("balanceLte", json!(args.balance_lte)),
            ("paidMonthlyBillsCountGte", json!(args.paid_bills_gte)),
            ("paidMonthlyBillsCountLte", json!(args.paid_bills_lte)),
            ("childrenFirst", json!(args.first)),
            ("childrenAfter", opt_str(args.after.as_deref())),
        ]),
    )?;
    let summary = response.field("paymentsSummary");
    app.emit(&response, |_| {
        let mut table = Table::new(
            format!("Payments summary (full balance: {})", cell(&summary["fullBalance"])),
            &["Child", "Amount", "Paid", "Balance", "Paid bills"],
        );
        for node in nodes(&summary["children"]) {
            table.push(vec![
                full_name(node),
                cell(&node["amount"]),
                cell(&node["paidAmount"]),
                cell(&node["balance"]),
                cell(&node["paidMonthlyBillsCount"]),
            ]);
        }
        table
    })?;
    hint_next_page(app, &summary["children"]);
    Ok(())
}

pub fn orders(app: &App, args: &PaymentOrderArgs) -> Result<()> {
    let client = app.connect()?;
    let response = app.fetch(
        &client,
        queries::PAYMENT_ORDERS,
        variables([
            ("first", json!(args.first)),
            ("after", opt_str(args.after.as_deref())),
            ("before", opt_str(args.before.as_deref())),
            ("offset", json!(args.offset)),
        ]),
    )?;
    let connection = response.field("paymentOrders");
    app.emit(&response, |_| {
        let mut table = Table::new(
            "Payment orders",
            &["ID", "Created", "Amount", "Status", "Booking date"],
        );
        for node in nodes(connection)
            .into_iter()
            .filter(|n| order_matches(n, args))
        {
            table.push(vec![
                cell(&node["id"]),
                cell(&node["created"]),
                cell(&node["amount"]),
                cell(&node["bluemediaPaymentStatus"]),
                cell(&node["bookingDate"]),
            ]);
        }
        table
    })?;
    hint_next_page(app, connection);
    Ok(())
}

/// Client-side filters. Dates compare as strings, which works for the ISO
/// timestamps the platform returns.
fn order_matches(node: &Value, args: &PaymentOrderArgs) -> bool {
    let created = cell(&node["created"]);
    if let Some(status) = &args.status {
        if !cell(&node["bluemediaPaymentStatus"]).eq_ignore_ascii_case(status) {
            return false;
        }
    }
    if let Some(from) = &args.created_from {
        if created.as_str() < from.as_str() {
            return false;
        }
    }
    if let Some(to) = &args.created_to {
        // A bare date covers the whole day.
        if created.get(..to.len()).map_or(true, |prefix| prefix > to.as_str()) {
            return false;
        }
    }
    true
}
