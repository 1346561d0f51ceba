// Session, context and profile commands.

use std::fs;
use std::io;

use clap::CommandFactory;
use clap_complete::Shell;
use serde_json::{json, Value};

use super::{print_json, App};
use crate::auth::{AuthClient, Credentials, IdentityProvider};
use crate::cli::{Cli, ContextArgs};
use crate::context::Context;
use crate::dates;
use crate::error::{Error, Result};
use crate::queries;
use crate::resolver::ContextResolver;
use crate::session::{now, SessionStore};
use crate::table::{cell, key_values, Table};
use crate::ui;

pub fn login(
    app: &App,
    username: Option<String>,
    password: Option<String>,
    no_save: bool,
) -> Result<()> {
    let credentials = match (username, password) {
        (Some(username), Some(password)) => Credentials { username, password },
        _ if !app.interactive() => {
            return Err(Error::InvalidInput(
                "--username and --password (or KIDSVIEW_USERNAME and KIDSVIEW_PASSWORD) \
                 are required without a terminal"
                    .into(),
            ))
        }
        (username, _) => app.credential_prompt().credentials(username.as_deref())?,
    };

    let auth = AuthClient::new(app.settings())?;
    let spinner = ui::spinner("Logging in...");
    let result = auth.login(&credentials.username, &credentials.password);
    spinner.finish_and_clear();
    let tokens = result?;

    if !no_save {
        let store = SessionStore::new(&app.settings().session_file);
        store.save(&tokens)?;
        ui::success(&format!(
            "Authenticated. Tokens saved to {}",
            store.path().display()
        ));
    }
    if app.json() || no_save {
        print_json(&tokens)?;
    }
    Ok(())
}

pub fn refresh(app: &App) -> Result<()> {
    let client = app.client()?;
    let tokens = client.refresh_session()?;
    ui::success(&format!(
        "Tokens refreshed. Saved to {}",
        client.sessions().path().display()
    ));
    if app.json() {
        print_json(&tokens)?;
    }
    Ok(())
}

pub fn session(app: &App, show_tokens: bool) -> Result<()> {
    let store = SessionStore::new(&app.settings().session_file);
    let path = store.path().display().to_string();
    let report = match store.load() {
        None => json!({ "session_file": path, "logged_in": false }),
        Some(tokens) => {
            let mut report = json!({
                "session_file": path,
                "logged_in": true,
                "expires_at": format_timestamp(tokens.expires_at),
                "expired": tokens.is_expired(now()),
                "has_refresh_token": tokens.refresh_token.is_some(),
            });
            if show_tokens {
                report["tokens"] = serde_json::to_value(&tokens)?;
            }
            report
        }
    };

    if app.json() {
        return print_json(&report);
    }
    super::print_table(&key_values("Session", &report))?;
    if report["logged_in"] == Value::Bool(false) {
        ui::warn("No cached tokens. Run `kidsview-cli login`.");
    }
    Ok(())
}

fn format_timestamp(secs: i64) -> String {
    chrono::DateTime::<chrono::Utc>::from_timestamp(secs, 0)
        .map(|t| t.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| secs.to_string())
}

pub fn logout(app: &App, all: bool) -> Result<()> {
    SessionStore::new(&app.settings().session_file).delete()?;
    if all {
        app.context_store().clear()?;
        ui::success("Logged out. Session and context removed.");
    } else {
        ui::success("Logged out. Session removed.");
    }
    Ok(())
}

pub fn context(app: &App, args: &ContextArgs) -> Result<()> {
    let store = app.context_store();
    if args.clear {
        store.clear()?;
        ui::success("Context cleared.");
        return Ok(());
    }

    let manual = Context {
        child_id: args.child_id.clone(),
        preschool_id: args.preschool_id.clone(),
        year_id: args.year_id.clone(),
    };
    let context = if !manual.is_empty() {
        let merged = store
            .load()
            .unwrap_or_default()
            .overlay(&manual)
            .require_complete()?;
        store.save(&merged)?;
        merged
    } else if args.auto || args.change {
        let client = app.client()?;
        client.ensure_session()?;
        // `--change` forgets the saved selection before choosing again.
        let existing = if args.change {
            store.clear()?;
            None
        } else {
            store.load()
        };
        ContextResolver::new(&store, app.chooser()).resolve(&client, existing, args.change)?
    } else {
        match store.load() {
            Some(context) => context,
            None => {
                ui::warn("No context saved. Run `kidsview-cli context --auto` to select one.");
                return Ok(());
            }
        }
    };

    let report = json!({ "context": context });
    if app.json() {
        print_json(&report)
    } else {
        super::print_table(&key_values("Context", &report["context"]))
    }
}

pub fn graphql(app: &App, query: &str, variables: Option<&str>) -> Result<()> {
    let document = match query.strip_prefix('@') {
        Some(path) => fs::read_to_string(path).map_err(|e| {
            Error::InvalidInput(format!("cannot read query file {path}: {e}"))
        })?,
        None => query.to_string(),
    };
    let variables = match variables {
        Some(raw) => {
            let parsed: Value = serde_json::from_str(raw)
                .map_err(|e| Error::InvalidInput(format!("--vars is not valid JSON: {e}")))?;
            if !parsed.is_object() {
                return Err(Error::InvalidInput("--vars must be a JSON object".into()));
            }
            parsed
        }
        None => json!({}),
    };

    let client = app.connect_as_is()?;
    let response = app.fetch_raw(&client, &document, variables)?;
    print_json(response.envelope())
}

pub fn completion(shell: Shell) -> Result<()> {
    let mut command = Cli::command();
    let name = command.get_name().to_string();
    clap_complete::generate(shell, &mut command, name, &mut io::stdout());
    Ok(())
}

pub fn me(app: &App) -> Result<()> {
    let client = app.connect()?;
    let response = app.fetch(&client, queries::ME, json!({}))?;
    app.emit(&response, |data| key_values("Me", &data["me"]))
}

pub fn unread(app: &App) -> Result<()> {
    let client = app.connect()?;
    let response = app.fetch(&client, queries::UNREAD_COUNTS, json!({}))?;
    app.emit(&response, |data| {
        let me = &data["me"];
        let mut table = Table::new("Unread", &["Kind", "Count"]);
        table.push(vec!["Notifications".into(), cell(&me["unreadNotificationsCount"])]);
        table.push(vec!["Messages".into(), cell(&me["unreadMessagesCount"])]);
        table
    })
}

pub fn colors(app: &App) -> Result<()> {
    let client = app.connect()?;
    let response = app.fetch(&client, queries::COLORS, json!({}))?;
    app.emit(&response, |data| {
        key_values("Colors", &data["me"]["availablePreschools"])
    })
}

pub fn active_child(
    app: &App,
    detailed: bool,
    date_from: Option<&str>,
    date_to: Option<&str>,
) -> Result<()> {
    let (query, variables) = if detailed {
        let today = dates::today();
        let (Some(from), Some(to)) = (date_from, date_to) else {
            return Err(Error::InvalidInput(
                "--detailed needs --date-from and --date-to".into(),
            ));
        };
        (
            queries::ACTIVE_CHILD_DETAIL,
            json!({
                "dateFrom": dates::normalize(from, today)?,
                "dateTo": dates::normalize(to, today)?,
            }),
        )
    } else {
        (queries::ACTIVE_CHILD_SUMMARY, json!({}))
    };

    let client = app.connect()?;
    let response = app.fetch(&client, query, variables)?;
    app.emit(&response, |data| key_values("Active child", &data["activeChild"]))
}
