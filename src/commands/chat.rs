// Chat: threads, messages, recipients and new threads.

use serde_json::{json, Value};

use super::{hint_next_page, nodes, opt_str, print_json, variables, App};
use crate::cli::ChatThreadArgs;
use crate::error::{Error, Result};
use crate::queries;
use crate::table::{cell, full_name, truncate, yes_no, Table};
use crate::ui;

const LAST_MESSAGE_PREVIEW: usize = 50;
const TEXT_PREVIEW: usize = 80;
/// Threads offered by the picker when no thread id is given.
const PICKER_THREADS: u32 = 20;

fn recipients(node: &Value) -> String {
    node["recipients"]
        .as_array()
        .map(|list| {
            list.iter()
                .map(|r| cell(&r["fullName"]))
                .collect::<Vec<_>>()
                .join(", ")
        })
        .unwrap_or_default()
}

pub fn threads(app: &App, args: &ChatThreadArgs) -> Result<()> {
    let client = app.connect()?;
    let response = app.fetch(
        &client,
        queries::CHAT_THREADS,
        variables([
            ("first", json!(args.first)),
            ("after", opt_str(args.after.as_deref())),
            ("type", opt_str(args.kind.as_deref())),
            ("child", opt_str(args.child.as_deref())),
            ("preschool", opt_str(args.preschool.as_deref())),
            ("search", opt_str(args.search.as_deref())),
        ]),
    )?;
    let connection = response.field("threads");
    app.emit(&response, |_| {
        let mut table = Table::new(
            "Threads",
            &["Name", "Child", "Recipients", "Last message", "Type", "Modified"],
        );
        for node in nodes(connection) {
            table.push(vec![
                cell(&node["name"]),
                full_name(&node["child"]),
                recipients(node),
                truncate(&cell(&node["lastMessage"]), LAST_MESSAGE_PREVIEW),
                cell(&node["type"]),
                cell(&node["modified"]),
            ]);
        }
        table
    })?;
    hint_next_page(app, connection);
    Ok(())
}

pub fn messages(
    app: &App,
    thread_id: Option<String>,
    first: u32,
    after: Option<&str>,
) -> Result<()> {
    let client = app.connect()?;
    let thread_id = match thread_id {
        Some(id) => id,
        None => {
            let response = app.fetch(
                &client,
                queries::CHAT_THREADS,
                json!({ "first": PICKER_THREADS }),
            )?;
            let threads = nodes(response.field("threads"));
            if threads.is_empty() {
                return Err(Error::InvalidInput("no chat threads to choose from".into()));
            }
            let labels: Vec<String> = threads
                .iter()
                .map(|t| {
                    format!(
                        "{} | {} | {}",
                        cell(&t["name"]),
                        recipients(t),
                        truncate(&cell(&t["lastMessage"]), LAST_MESSAGE_PREVIEW)
                    )
                })
                .collect();
            let index = app.picker().pick_one("Select thread", &labels)?;
            threads
                .get(index)
                .map(|t| cell(&t["id"]))
                .ok_or_else(|| Error::InvalidInput("no such thread".into()))?
        }
    };

    let response = app.fetch(
        &client,
        queries::CHAT_MESSAGES,
        variables([
            ("id", json!(thread_id)),
            ("first", json!(first)),
            ("after", opt_str(after)),
        ]),
    )?;
    let thread = response.field("thread");
    app.emit(&response, |_| {
        let mut table = Table::new(
            format!("Messages in {}", cell(&thread["name"])),
            &["ID", "Created", "Sender", "Read", "Text"],
        );
        for node in nodes(&thread["messages"]) {
            table.push(vec![
                cell(&node["id"]),
                cell(&node["created"]),
                cell(&node["sender"]["fullName"]),
                yes_no(node["read"] == Value::Bool(true)).to_string(),
                truncate(&cell(&node["text"]), TEXT_PREVIEW),
            ]);
        }
        table
    })?;
    hint_next_page(app, &thread["messages"]);
    Ok(())
}

pub fn users(app: &App, user_types: &[String]) -> Result<()> {
    let types = if user_types.is_empty() {
        Value::Null
    } else {
        json!(user_types)
    };
    let client = app.connect()?;
    let response = app.fetch(
        &client,
        queries::USERS_FOR_CHAT,
        variables([("userTypes", types)]),
    )?;
    app.emit(&response, |data| {
        let mut table = Table::new("Chat users", &["Name", "Type", "Position", "Role"]);
        for user in data["usersForChat"].as_array().into_iter().flatten() {
            table.push(vec![
                cell(&user["chatDisplayName"]),
                cell(&user["userType"]),
                cell(&user["chatUserPosition"]),
                cell(&user["roleName"]),
            ]);
        }
        table
    })
}

/// Display names of every parent of every child in a chat group.
fn group_parents(group: &Value) -> String {
    let mut parents = Vec::new();
    for child in group["children"].as_array().into_iter().flatten() {
        for parent in child["parents"].as_array().into_iter().flatten() {
            parents.push(cell(&parent["chatDisplayName"]));
        }
    }
    parents.join(", ")
}

pub fn search(app: &App, phrase: &str) -> Result<()> {
    let client = app.connect()?;
    let response = app.fetch(
        &client,
        queries::GROUPS_FOR_CHAT,
        json!({ "search": phrase }),
    )?;
    app.emit(&response, |data| {
        let mut table = Table::new("Chat search", &["ID", "Name", "Parents"]);
        for group in data["groupsForChat"].as_array().into_iter().flatten() {
            table.push(vec![cell(&group["id"]), cell(&group["name"]), group_parents(group)]);
        }
        table
    })
}

/// `CreateThreadInput` for a new thread with a single text message.
fn thread_input(recipients: &[String], text: &str, name: Option<&str>, parents_visible: bool) -> Value {
    let recipients: Vec<&str> = recipients
        .iter()
        .map(|r| r.trim())
        .filter(|r| !r.is_empty())
        .collect();
    json!({
        "input": {
            "message": { "text": text, "attachment": null },
            "recipients": recipients,
            "name": name,
            "parentsMutualVisibility": parents_visible,
        }
    })
}

pub fn send(
    app: &App,
    recipients: &[String],
    text: &str,
    name: Option<&str>,
    parents_visible: bool,
) -> Result<()> {
    let input = thread_input(recipients, text, name, parents_visible);
    if input["input"]["recipients"].as_array().map_or(true, Vec::is_empty) {
        return Err(Error::InvalidInput("--recipients needs at least one id".into()));
    }

    let client = app.connect()?;
    let response = app.fetch(&client, queries::CREATE_THREAD, input)?;
    if app.json() {
        return print_json(response.envelope());
    }
    let result = response.field("createThread");
    if result["success"] == Value::Bool(true) {
        ui::success(&format!("Message sent (thread {}).", cell(&result["id"])));
        Ok(())
    } else {
        Err(Error::InvalidInput(format!(
            "message not sent: {}",
            cell(&result["error"])
        )))
    }
}
