// Announcements, notifications and the child's day: meals, observations,
// applications.

use serde_json::{json, Value};

use super::{hint_next_page, next_cursor, nodes, opt_str, print_json, print_table, variables, App};
use crate::api::GraphQLClient;
use crate::cli::{AnnouncementArgs, NotificationArgs};
use crate::error::{Error, Result};
use crate::queries;
use crate::table::{cell, key_values, truncate, yes_no, Table};
use crate::ui;

pub fn announcements(app: &App, args: &AnnouncementArgs) -> Result<()> {
    let client = app.connect()?;
    let response = app.fetch(
        &client,
        queries::ANNOUNCEMENTS,
        variables([
            ("first", json!(args.first)),
            ("after", opt_str(args.after.as_deref())),
            ("status", json!(args.status)),
            ("phrase", json!(args.phrase)),
        ]),
    )?;
    let connection = response.field("announcements");
    app.emit(&response, |_| {
        let mut table = Table::new("Announcements", &["Title", "Text", "Created", "Author"]);
        for node in nodes(connection) {
            table.push(vec![
                cell(&node["title"]),
                truncate(&cell(&node["text"]), 120),
                cell(&node["created"]),
                cell(&node["createdBy"]["fullName"]),
            ]);
        }
        table
    })?;
    hint_next_page(app, connection);
    Ok(())
}

pub fn notifications(app: &App, args: &NotificationArgs) -> Result<()> {
    let client = app.connect()?;
    let mut after = args.after.clone();
    let mut collected: Vec<Value> = Vec::new();
    let mut page_info = Value::Null;
    loop {
        let response = app.fetch(
            &client,
            queries::NOTIFICATIONS,
            variables([
                ("first", json!(args.first)),
                ("after", opt_str(after.as_deref())),
                ("pending", args.pending.map_or(Value::Null, Value::Bool)),
            ]),
        )?;
        let connection = response.field("notifications");
        collected.extend(nodes(connection).into_iter().cloned());
        page_info = connection["pageInfo"].clone();
        match next_cursor(connection) {
            Some(cursor) if args.all_pages => after = Some(cursor.to_string()),
            _ => break,
        }
    }

    let selected: Vec<Value> = collected
        .into_iter()
        .filter(|n| matches_type(n, args.kind.as_deref()))
        .filter(|n| !args.only_unread || n["isRead"] != Value::Bool(true))
        .collect();

    if args.mark_read {
        let marked = mark_read(&client, &selected)?;
        ui::success(&format!("Marked {marked} notification(s) as read."));
    }

    if app.json() {
        let edges: Vec<Value> = selected.iter().map(|n| json!({ "node": n })).collect();
        return print_json(&json!({
            "data": { "notifications": { "edges": edges, "pageInfo": page_info } }
        }));
    }

    let mut table = Table::new("Notifications", &["ID", "Text", "Created", "Type", "On date"]);
    for node in &selected {
        table.push(vec![
            cell(&node["id"]),
            truncate(&cell(&node["text"]), 120),
            cell(&node["created"]),
            cell(&node["type"]),
            event_date(&node["data"]),
        ]);
    }
    print_table(&table)?;
    if !args.all_pages {
        hint_next_page(app, &json!({ "pageInfo": page_info }));
    }
    Ok(())
}

fn matches_type(node: &Value, kind: Option<&str>) -> bool {
    match kind {
        Some(kind) => node["type"]
            .as_str()
            .is_some_and(|t| t.eq_ignore_ascii_case(kind)),
        None => true,
    }
}

/// `date` carried in the notification payload. The platform sends the
/// payload as a JSON-encoded string.
fn event_date(data: &Value) -> String {
    let parsed;
    let data = match data {
        Value::String(raw) => {
            parsed = serde_json::from_str::<Value>(raw).unwrap_or(Value::Null);
            &parsed
        }
        other => other,
    };
    cell(&data["date"])
}

fn mark_read(client: &GraphQLClient, selected: &[Value]) -> Result<usize> {
    let ids: Vec<&str> = selected
        .iter()
        .filter_map(|n| n["notification"]["id"].as_str())
        .collect();
    let bar = ui::progress_bar(ids.len() as u64, "Marking read");
    for id in &ids {
        client.execute(queries::SET_NOTIFICATION_READ, json!({ "notificationId": id }))?;
        bar.inc(1);
    }
    bar.finish_and_clear();
    tracing::debug!(count = ids.len(), "notifications marked read");
    Ok(ids.len())
}

pub fn notification_read(app: &App, id: &str) -> Result<()> {
    let client = app.connect()?;
    let response = app.fetch(
        &client,
        queries::SET_NOTIFICATION_READ,
        json!({ "notificationId": id }),
    )?;
    if app.json() {
        return print_json(response.envelope());
    }
    if response.field("setNotificationRead")["success"] == Value::Bool(true) {
        ui::success("Notification marked as read.");
        Ok(())
    } else {
        Err(Error::UnexpectedResponse(format!(
            "notification {id} was not marked as read"
        )))
    }
}

/// Preference changes in the shape the mutation takes. Types are upper-cased.
fn preference_changes(enable: &[String], disable: &[String]) -> Vec<Value> {
    let change = |name: &String, enabled: bool| {
        json!({ "notificationType": name.trim().to_uppercase(), "enabled": enabled })
    };
    enable
        .iter()
        .map(|n| change(n, true))
        .chain(disable.iter().map(|n| change(n, false)))
        .collect()
}

pub fn notification_prefs(app: &App, enable: &[String], disable: &[String]) -> Result<()> {
    let client = app.connect()?;
    let changes = preference_changes(enable, disable);
    if !changes.is_empty() {
        app.fetch(
            &client,
            queries::SET_USER_NOTIFICATION_PREFERENCES,
            json!({ "preferences": changes }),
        )?;
        if !app.json() {
            ui::success(&format!("Updated {} preference(s).", changes.len()));
        }
    }

    let response = app.fetch(&client, queries::USER_NOTIFICATION_PREFERENCES, json!({}))?;
    app.emit(&response, |data| {
        let mut table = Table::new("Notification preferences", &["Type", "Name", "Enabled"]);
        for pref in data["userNotificationPreferences"].as_array().into_iter().flatten() {
            table.push(vec![
                cell(&pref["type"]),
                cell(&pref["name"]),
                yes_no(pref["enabled"] == Value::Bool(true)).to_string(),
            ]);
        }
        table
    })
}

pub fn meals(app: &App) -> Result<()> {
    let client = app.connect()?;
    let response = app.fetch(&client, queries::CURRENT_DIET, json!({}))?;
    app.emit(&response, |data| key_values("Meals", &data["currentDietForChild"]))
}

pub fn observations(app: &App, child_id: Option<&str>, activity_id: Option<&str>) -> Result<()> {
    let client = app.connect()?;
    let child_id = match child_id {
        Some(id) => id.to_string(),
        None => client
            .context()
            .and_then(|c| c.child_id.clone())
            .ok_or_else(|| {
                Error::InvalidInput("no child selected; pass --child-id".into())
            })?,
    };
    let response = app.fetch(
        &client,
        queries::ADDITIONAL_ACTIVITY_OBSERVATIONS,
        variables([("childId", json!(child_id)), ("id", opt_str(activity_id))]),
    )?;
    app.emit(&response, |data| key_values("Observations", data))
}

pub fn applications(app: &App, phrase: Option<&str>, status: Option<&str>) -> Result<()> {
    let client = app.connect()?;
    let response = app.fetch(
        &client,
        queries::APPLICATIONS,
        json!({ "phrase": opt_str(phrase), "status": opt_str(status) }),
    )?;
    app.emit(&response, |data| {
        let mut table = Table::new("Applications", &["ID", "Form", "Status", "Created", "Deadline"]);
        for node in nodes(&data["applications"]) {
            table.push(vec![
                cell(&node["id"]),
                cell(&node["applicationForm"]["name"]),
                cell(&node["status"]),
                cell(&node["created"]),
                cell(&node["applicationForm"]["applicationSubmissionDeadline"]),
            ]);
        }
        table
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_date_reads_encoded_payload() {
        assert_eq!(event_date(&json!(r#"{"date":"2025-03-04","x":1}"#)), "2025-03-04");
        assert_eq!(event_date(&json!({ "date": "2025-03-05" })), "2025-03-05");
        assert_eq!(event_date(&json!("not json")), "");
        assert_eq!(event_date(&Value::Null), "");
    }

    #[test]
    fn type_filter_ignores_case() {
        let node = json!({ "type": "NEW_GALLERY" });
        assert!(matches_type(&node, Some("new_gallery")));
        assert!(!matches_type(&node, Some("NEW_EVENT")));
        assert!(matches_type(&node, None));
        assert!(!matches_type(&json!({}), Some("NEW_EVENT")));
    }

    #[test]
    fn preference_changes_upper_case_types() {
        let changes = preference_changes(&["new_event".into()], &[" New_Gallery ".into()]);
        assert_eq!(
            changes,
            vec![
                json!({ "notificationType": "NEW_EVENT", "enabled": true }),
                json!({ "notificationType": "NEW_GALLERY", "enabled": false }),
            ]
        );
    }
}
