// Command handlers. Each handler turns its flags into a GraphQL document and
// variables, runs it through the client and prints either the raw envelope
// (`--json`) or a table.

mod account;
mod calendar;
mod chat;
mod feed;
mod galleries;
mod payments;

use std::io::{self, Write};

use serde::Serialize;
use serde_json::{Map, Value};

use crate::api::{GraphQLClient, Response};
use crate::auth::{AuthClient, CredentialPrompt};
use crate::cli::{Cli, Command};
use crate::config::Settings;
use crate::context::{Context, ContextStore};
use crate::error::{Error, Result};
use crate::resolver::{Chooser, ContextResolver};
use crate::table::Table;
use crate::ui::{self, Headless, Picker, Terminal};

/// Per-run state shared by all handlers.
pub struct App {
    settings: Settings,
    json: bool,
    interactive: bool,
    overrides: Context,
}

impl App {
    pub fn new(settings: Settings, cli: &Cli) -> Self {
        App {
            settings,
            json: cli.json,
            interactive: ui::is_interactive(cli.no_interactive),
            overrides: Context {
                child_id: cli.ctx_child.clone(),
                preschool_id: cli.ctx_preschool.clone(),
                year_id: cli.ctx_year.clone(),
            },
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn json(&self) -> bool {
        self.json
    }

    pub fn interactive(&self) -> bool {
        self.interactive
    }

    pub fn context_store(&self) -> ContextStore {
        ContextStore::new(&self.settings.context_file)
    }

    pub fn chooser(&self) -> &'static dyn Chooser {
        if self.interactive {
            &Terminal
        } else {
            &Headless
        }
    }

    pub fn picker(&self) -> &'static dyn Picker {
        if self.interactive {
            &Terminal
        } else {
            &Headless
        }
    }

    pub fn credential_prompt(&self) -> Box<dyn CredentialPrompt> {
        if self.interactive {
            Box::new(Terminal)
        } else {
            Box::new(Headless)
        }
    }

    /// Client without any context attached.
    pub fn client(&self) -> Result<GraphQLClient> {
        let identity = AuthClient::new(&self.settings)?;
        GraphQLClient::new(
            self.settings.clone(),
            Box::new(identity),
            self.credential_prompt(),
        )
    }

    /// Client with a session and a context, ready for data commands. The
    /// cookie override skips context handling altogether. `--ctx-*` flags
    /// are laid over the saved context for this run only: nothing is
    /// resolved or saved, and whatever ids result are sent.
    pub fn connect(&self) -> Result<GraphQLClient> {
        let mut client = self.client()?;
        client.ensure_session()?;
        if self.settings.cookies.is_some() {
            tracing::debug!("cookie override set, not resolving context");
            return Ok(client);
        }

        let store = self.context_store();
        let context = if self.overrides.is_empty() {
            ContextResolver::new(&store, self.chooser()).resolve(&client, store.load(), false)?
        } else {
            let context = store.load().unwrap_or_default().overlay(&self.overrides);
            if !context.is_complete() {
                tracing::debug!(missing = ?context.missing(), "sending partial context from --ctx-* flags");
            }
            context
        };
        client.set_context(Some(context));
        Ok(client)
    }

    /// Client with a session and whatever context is saved, possibly none.
    /// Nothing is resolved or prompted for.
    pub fn connect_as_is(&self) -> Result<GraphQLClient> {
        let mut client = self.client()?;
        client.ensure_session()?;
        let stored = self.context_store().load().unwrap_or_default();
        let context = stored.overlay(&self.overrides);
        client.set_context((!context.is_empty()).then_some(context));
        Ok(client)
    }

    /// Execute with a spinner on stderr. With `--json`, an envelope that
    /// carries GraphQL errors is still printed before the error is returned.
    pub fn fetch(&self, client: &GraphQLClient, query: &str, variables: Value) -> Result<Response> {
        self.fetch_printing_errors(client, query, variables, self.json)
    }

    /// Like `fetch`, but the envelope of a failed query is always printed.
    pub fn fetch_raw(&self, client: &GraphQLClient, query: &str, variables: Value) -> Result<Response> {
        self.fetch_printing_errors(client, query, variables, true)
    }

    fn fetch_printing_errors(
        &self,
        client: &GraphQLClient,
        query: &str,
        variables: Value,
        print_errors: bool,
    ) -> Result<Response> {
        let spinner = ui::spinner("Talking to Kidsview...");
        let result = client.execute(query, variables);
        spinner.finish_and_clear();
        if print_errors {
            if let Err(Error::GraphQL { envelope, .. }) = &result {
                print_json(envelope)?;
            }
        }
        result
    }

    /// Print the envelope as JSON, or the table built from `data`.
    pub fn emit(&self, response: &Response, table: impl FnOnce(&Value) -> Table) -> Result<()> {
        if self.json {
            print_json(response.envelope())
        } else {
            print_table(&table(response.data()))
        }
    }
}

pub fn print_json(value: &impl Serialize) -> Result<()> {
    let mut out = io::stdout().lock();
    serde_json::to_writer_pretty(&mut out, value)?;
    writeln!(out)?;
    Ok(())
}

pub fn print_table(table: &Table) -> Result<()> {
    let mut out = io::stdout().lock();
    table.write_to(&mut out)?;
    if table.is_empty() {
        writeln!(out, "(no results)")?;
    }
    Ok(())
}

/// JSON object with the `null` entries left out, so optional flags the user
/// did not pass are not sent.
pub fn variables<const N: usize>(pairs: [(&str, Value); N]) -> Value {
    let map: Map<String, Value> = pairs
        .into_iter()
        .filter(|(_, v)| !v.is_null())
        .map(|(k, v)| (k.to_string(), v))
        .collect();
    Value::Object(map)
}

/// `node` objects of a connection (`{ edges: [ { node } ] }`).
pub fn nodes(connection: &Value) -> Vec<&Value> {
    connection
        .get("edges")
        .and_then(Value::as_array)
        .map(|edges| edges.iter().filter_map(|e| e.get("node")).collect())
        .unwrap_or_default()
}

/// Cursor of the next page, when the connection says there is one.
pub fn next_cursor(connection: &Value) -> Option<&str> {
    let info = connection.get("pageInfo")?;
    if info.get("hasNextPage").and_then(Value::as_bool) != Some(true) {
        return None;
    }
    info.get("endCursor").and_then(Value::as_str)
}

/// Tell the user how to fetch the next page. Stderr, so tables stay clean.
pub fn hint_next_page(app: &App, connection: &Value) {
    if app.json {
        return;
    }
    if let Some(cursor) = next_cursor(connection) {
        eprintln!("More results available: --after {cursor}");
    }
}

/// `s` as a JSON string, or `null` when absent or blank.
pub fn opt_str(s: Option<&str>) -> Value {
    match s.map(str::trim) {
        Some(s) if !s.is_empty() => Value::String(s.to_string()),
        _ => Value::Null,
    }
}

/// `true`/`false` from a pair of mutually exclusive flags, `null` for neither.
pub fn tri_state(yes: bool, no: bool) -> Value {
    match (yes, no) {
        (true, _) => Value::Bool(true),
        (_, true) => Value::Bool(false),
        _ => Value::Null,
    }
}

pub fn run(cli: Cli, settings: Settings) -> Result<()> {
    let app = App::new(settings, &cli);
    match cli.command {
        Command::Login {
            username,
            password,
            no_save,
        } => account::login(&app, username, password, no_save),
        Command::Refresh => account::refresh(&app),
        Command::Session { show_tokens } => account::session(&app, show_tokens),
        Command::Logout { all } => account::logout(&app, all),
        Command::Context(args) => account::context(&app, &args),
        Command::Graphql { query, variables } => {
            account::graphql(&app, &query, variables.as_deref())
        }
        Command::Completion { shell } => account::completion(shell),
        Command::Me => account::me(&app),
        Command::Unread => account::unread(&app),
        Command::Colors => account::colors(&app),
        Command::ActiveChild {
            detailed,
            date_from,
            date_to,
        } => account::active_child(&app, detailed, date_from.as_deref(), date_to.as_deref()),

        Command::Announcements(args) => feed::announcements(&app, &args),
        Command::Notifications(args) => feed::notifications(&app, &args),
        Command::NotificationRead { id } => feed::notification_read(&app, &id),
        Command::NotificationPrefs { enable, disable } => {
            feed::notification_prefs(&app, &enable, &disable)
        }
        Command::Meals => feed::meals(&app),
        Command::Observations {
            child_id,
            activity_id,
        } => feed::observations(&app, child_id.as_deref(), activity_id.as_deref()),
        Command::Applications { phrase, status } => {
            feed::applications(&app, phrase.as_deref(), status.as_deref())
        }

        Command::MonthlyBills(args) => payments::monthly_bills(&app, &args),
        Command::Payments(args) => payments::payments(&app, &args),
        Command::PaymentsSummary(args) => payments::summary(&app, &args),
        Command::PaymentOrders(args) => payments::orders(&app, &args),

        Command::Galleries(args) => galleries::list(&app, &args),
        Command::GalleryDownload {
            ids,
            all,
            output_dir,
        } => galleries::download(&app, ids, all, output_dir),
        Command::GalleryLike { id } => galleries::like(&app, &id),
        Command::GalleryComment { id, content } => galleries::comment(&app, &id, &content),

        Command::ChatThreads(args) => chat::threads(&app, &args),
        Command::ChatMessages {
            thread_id,
            first,
            after,
        } => chat::messages(&app, thread_id, first, after.as_deref()),
        Command::ChatUsers { user_types } => chat::users(&app, &user_types),
        Command::ChatSearch { search } => chat::search(&app, &search),
        Command::ChatSend {
            recipients,
            text,
            name,
            parents_visible,
        } => chat::send(&app, &recipients, &text, name.as_deref(), parents_visible),

        Command::Calendar(args) => calendar::calendar(&app, &args),
        Command::QuickCalendar { range, groups_ids } => {
            calendar::quick_calendar(&app, &range, &groups_ids)
        }
        Command::Schedule { group_id } => calendar::schedule(&app, &group_id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn variables_drop_nulls() {
        let vars = variables([
            ("first", json!(10)),
            ("after", opt_str(None)),
            ("phrase", opt_str(Some("  "))),
            ("status", opt_str(Some("ACTIVE"))),
            ("isPaid", tri_state(false, true)),
        ]);
        assert_eq!(vars, json!({ "first": 10, "status": "ACTIVE", "isPaid": false }));
    }

    #[test]
    fn next_cursor_needs_has_next_page() {
        let more = json!({ "pageInfo": { "hasNextPage": true, "endCursor": "YXJyYXk6OQ==" } });
        let last = json!({ "pageInfo": { "hasNextPage": false, "endCursor": "x" } });
        assert_eq!(next_cursor(&more), Some("YXJyYXk6OQ=="));
        assert_eq!(next_cursor(&last), None);
        assert_eq!(next_cursor(&json!({})), None);
    }

    #[test]
    fn nodes_skip_edges_without_node() {
        let conn = json!({ "edges": [ { "node": { "id": 1 } }, { "cursor": "c" } ] });
        assert_eq!(nodes(&conn), vec![&json!({ "id": 1 })]);
        assert!(nodes(&Value::Null).is_empty());
    }

    #[test]
    fn tri_state_is_null_without_flags() {
        assert_eq!(tri_state(false, false), Value::Null);
        assert_eq!(tri_state(true, false), json!(true));
    }
}
