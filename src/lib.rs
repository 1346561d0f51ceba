// Library root
// -----------
// The binary (`main.rs`) parses arguments and hands them to `commands`;
// everything below it lives here so it can be tested without a terminal.
//
// Module responsibilities:
// - `config`: `Settings` resolved from `KIDSVIEW_*` environment variables.
// - `store`, `session`, `context`: JSON files for tokens and the selected
//   child/preschool/year.
// - `srp`, `auth`: Cognito login (SRP) and token refresh.
// - `resolver`: picks the active context from the account's profile.
// - `api`: the GraphQL client with the refresh-and-retry-once policy.
// - `queries`: GraphQL documents used by the commands.
// - `cli`, `commands`: argument parsing and one handler per subcommand.
// - `ui`, `table`, `dates`, `download`: prompts, progress, tables, date
//   arguments and gallery downloads.
// - `error`: the shared error type and its exit codes.
pub mod api;
pub mod auth;
pub mod cli;
pub mod commands;
pub mod config;
pub mod context;
pub mod dates;
pub mod download;
pub mod error;
pub mod queries;
pub mod resolver;
pub mod session;
pub mod srp;
pub mod store;
pub mod table;
pub mod ui;
