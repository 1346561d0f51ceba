// Calendar, quick calendar and group schedule.

use serde_json::{json, Value};

use super::{opt_str, variables, App};
use crate::cli::{CalendarArgs, RangeFlags};
use crate::dates::{self, RangeArgs};
use crate::error::Result;
use crate::queries;
use crate::table::{cell, yes_no, Table};

fn flag(value: &Value) -> String {
    yes_no(*value == Value::Bool(true)).to_string()
}

fn id_list(ids: &[String]) -> Value {
    if ids.is_empty() {
        Value::Null
    } else {
        json!(ids)
    }
}

/// Only send a boolean filter when it is switched on.
fn only_if(enabled: bool) -> Value {
    if enabled {
        Value::Bool(true)
    } else {
        Value::Null
    }
}

pub fn calendar(app: &App, args: &CalendarArgs) -> Result<()> {
    let (date_from, date_to) = dates::resolve_range(&RangeArgs::from(&args.range), dates::today())?;
    let client = app.connect()?;
    let response = app.fetch(
        &client,
        queries::CALENDAR,
        variables([
            ("dateFrom", json!(date_from)),
            ("dateTo", json!(date_to)),
            ("groupsIds", id_list(&args.groups_ids)),
            ("activityTypes", json!(args.activity_types)),
            ("showCanceledActivities", only_if(args.show_canceled)),
            ("forSchedule", only_if(args.for_schedule)),
            ("activityId", opt_str(args.activity_id.as_deref())),
        ]),
    )?;
    app.emit(&response, |data| {
        let mut table = Table::new(
            format!("Calendar {date_from} .. {date_to}"),
            &["Title", "Start", "End", "Type", "All day", "Reported by"],
        );
        for event in data["calendar"].as_array().into_iter().flatten() {
            table.push(vec![
                cell(&event["title"]),
                cell(&event["startDate"]),
                cell(&event["endDate"]),
                cell(&event["type"]),
                flag(&event["allDay"]),
                cell(&event["absenceReportedBy"]["fullName"]),
            ]);
        }
        table
    })
}

pub fn quick_calendar(app: &App, range: &RangeFlags, groups_ids: &[String]) -> Result<()> {
    let (date_from, date_to) = dates::resolve_range(&RangeArgs::from(range), dates::today())?;
    let client = app.connect()?;
    let response = app.fetch(
        &client,
        queries::QUICK_CALENDAR,
        variables([
            ("dateFrom", json!(date_from)),
            ("dateTo", json!(date_to)),
            ("groupsIds", id_list(groups_ids)),
        ]),
    )?;
    app.emit(&response, |data| {
        let mut table = Table::new(
            format!("Quick calendar {date_from} .. {date_to}"),
            &["Date", "Has events", "New events", "Holiday", "Absent", "Meals modified"],
        );
        for day in data["quickCalendar"].as_array().into_iter().flatten() {
            table.push(vec![
                cell(&day["date"]),
                flag(&day["hasEvents"]),
                flag(&day["hasNewEvents"]),
                flag(&day["holiday"]),
                flag(&day["absent"]),
                flag(&day["mealsModified"]),
            ]);
        }
        table
    })
}

pub fn schedule(app: &App, group_id: &str) -> Result<()> {
    let client = app.connect()?;
    let response = app.fetch(&client, queries::SCHEDULE, json!({ "group": group_id }))?;
    app.emit(&response, |data| {
        let mut table = Table::new(
            "Schedule",
            &["Title", "Start", "End", "All day", "Type", "Groups"],
        );
        for entry in data["schedule"].as_array().into_iter().flatten() {
            let groups = match &entry["groupsNames"] {
                Value::Array(names) => names.iter().map(cell).collect::<Vec<_>>().join(", "),
                other => cell(other),
            };
            table.push(vec![
                cell(&entry["title"]),
                cell(&entry["startDate"]),
                cell(&entry["endDate"]),
                flag(&entry["allDay"]),
                cell(&entry["type"]),
                groups,
            ]);
        }
        table
    })
}
