// Command-line surface. Parsing only: every subcommand is handled in
// `commands`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

use crate::dates::RangeArgs;

/// Command-line client for the Kidsview preschool platform.
///
/// Log in once with `kidsview-cli login`; the session and the selected
/// child/preschool/year are cached under ~/.config/kidsview-cli.
#[derive(Parser, Debug)]
#[command(name = "kidsview-cli", version, about, long_about = None)]
pub struct Cli {
    /// Print the raw GraphQL envelope as JSON instead of a table
    #[arg(long, global = true)]
    pub json: bool,

    /// Debug logging on stderr (also KIDSVIEW_DEBUG=1)
    #[arg(long, global = true)]
    pub debug: bool,

    /// Never prompt; fail with a distinct exit code instead
    #[arg(long, global = true)]
    pub no_interactive: bool,

    /// Child id for this run only (not saved)
    #[arg(long, global = true, value_name = "ID")]
    pub ctx_child: Option<String>,

    /// Preschool id for this run only (not saved)
    #[arg(long, global = true, value_name = "ID")]
    pub ctx_preschool: Option<String>,

    /// School-year id for this run only (not saved)
    #[arg(long, global = true, value_name = "ID")]
    pub ctx_year: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Log in with username and password and cache the tokens
    Login {
        /// Kidsview username (email)
        #[arg(long, env = "KIDSVIEW_USERNAME")]
        username: Option<String>,

        /// Password; prompted for when omitted
        #[arg(long, env = "KIDSVIEW_PASSWORD", hide_env_values = true)]
        password: Option<String>,

        /// Do not write the session file; print the tokens instead
        #[arg(long)]
        no_save: bool,
    },

    /// Exchange the cached refresh token for new tokens
    Refresh,

    /// Show where the session lives and whether it is still valid
    Session {
        /// Include the raw tokens
        #[arg(long)]
        show_tokens: bool,
    },

    /// Delete the cached session
    Logout {
        /// Also forget the selected context
        #[arg(long)]
        all: bool,
    },

    /// Show, select, set or clear the active child/preschool/year
    Context(ContextArgs),

    /// Run a raw GraphQL query
    Graphql {
        /// Query document, or @path to read it from a file
        #[arg(long, short = 'q')]
        query: String,

        /// Variables as a JSON object
        #[arg(long = "vars", value_name = "JSON")]
        variables: Option<String>,
    },

    /// Print a shell completion script
    Completion {
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Current user, preschools and children
    Me,

    /// Unread notification and message counts
    Unread,

    /// Preschool color themes
    Colors,

    /// Active child, optionally with daily activities
    ActiveChild {
        /// Include balances, meals and daily activities
        #[arg(long, requires_all = ["date_from", "date_to"])]
        detailed: bool,

        /// First day of daily activities
        #[arg(long)]
        date_from: Option<String>,

        /// Last day of daily activities
        #[arg(long)]
        date_to: Option<String>,
    },

    /// Announcements from the preschool
    Announcements(AnnouncementArgs),

    /// Notifications
    Notifications(NotificationArgs),

    /// Mark one notification as read
    NotificationRead {
        /// Notification id
        #[arg(long)]
        id: String,
    },

    /// Show or change which notification types are delivered
    NotificationPrefs {
        /// Notification type to turn on (repeatable)
        #[arg(long, value_name = "TYPE")]
        enable: Vec<String>,

        /// Notification type to turn off (repeatable)
        #[arg(long, value_name = "TYPE")]
        disable: Vec<String>,
    },

    /// Monthly bills
    MonthlyBills(MonthlyBillArgs),

    /// Booked and pending payments
    Payments(PaymentArgs),

    /// Balance summary per child
    PaymentsSummary(PaymentSummaryArgs),

    /// Online payment orders
    PaymentOrders(PaymentOrderArgs),

    /// Photo galleries
    Galleries(GalleryArgs),

    /// Download gallery images
    GalleryDownload {
        /// Gallery ids, comma separated
        #[arg(long = "id", alias = "ids", value_delimiter = ',')]
        ids: Vec<String>,

        /// Every gallery that has not been downloaded yet
        #[arg(long, conflicts_with = "ids")]
        all: bool,

        /// Target directory (default KIDSVIEW_DOWNLOAD_DIR or ~/Pictures/Kidsview)
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },

    /// Like or unlike a gallery
    GalleryLike {
        /// Gallery id
        #[arg(long)]
        id: String,
    },

    /// Comment on a gallery
    GalleryComment {
        /// Gallery id
        #[arg(long)]
        id: String,

        /// Comment text
        #[arg(long)]
        content: String,
    },

    /// Chat threads
    ChatThreads(ChatThreadArgs),

    /// Messages of one chat thread
    ChatMessages {
        /// Thread id; pick from recent threads when omitted
        #[arg(long)]
        thread_id: Option<String>,

        #[arg(long, default_value_t = 20)]
        first: u32,

        /// Cursor for pagination
        #[arg(long)]
        after: Option<String>,
    },

    /// People that can be messaged
    ChatUsers {
        /// User types, comma separated; all when omitted
        #[arg(long = "type", value_delimiter = ',')]
        user_types: Vec<String>,
    },

    /// Search chat groups, children and parents
    ChatSearch {
        #[arg(long, default_value = "")]
        search: String,
    },

    /// Start a new chat thread
    ChatSend {
        /// Recipient user ids, comma separated
        #[arg(long, value_delimiter = ',', required = true)]
        recipients: Vec<String>,

        /// Message text
        #[arg(long)]
        text: String,

        /// Thread name
        #[arg(long)]
        name: Option<String>,

        /// Let the parents in the thread see each other
        #[arg(long)]
        parents_visible: bool,
    },

    /// Calendar events
    Calendar(CalendarArgs),

    /// Per-day calendar overview
    QuickCalendar {
        #[command(flatten)]
        range: RangeFlags,

        /// Group ids, comma separated
        #[arg(long, value_delimiter = ',')]
        groups_ids: Vec<String>,
    },

    /// Weekly schedule of a group
    Schedule {
        /// Group id
        #[arg(long)]
        group_id: String,
    },

    /// Current diet of the active child
    Meals,

    /// Additional activity observations
    Observations {
        /// Child id; defaults to the context child
        #[arg(long)]
        child_id: Option<String>,

        /// Only this additional activity
        #[arg(long)]
        activity_id: Option<String>,
    },

    /// Applications for additional activities
    Applications {
        #[arg(long)]
        phrase: Option<String>,

        #[arg(long)]
        status: Option<String>,
    },
}

#[derive(Args, Debug)]
pub struct ContextArgs {
    /// Select from the account's children, preschools and years; levels with
    /// a single option are picked without asking
    #[arg(long)]
    pub auto: bool,

    /// Select again even when a context is saved
    #[arg(long)]
    pub change: bool,

    /// Forget the saved context
    #[arg(long, conflicts_with_all = ["auto", "change"])]
    pub clear: bool,

    #[arg(long)]
    pub child_id: Option<String>,

    #[arg(long)]
    pub preschool_id: Option<String>,

    #[arg(long)]
    pub year_id: Option<String>,
}

#[derive(Args, Debug)]
pub struct AnnouncementArgs {
    #[arg(long, default_value_t = 10)]
    pub first: u32,

    /// Cursor for pagination
    #[arg(long)]
    pub after: Option<String>,

    /// AnnouncementStatus value
    #[arg(long, default_value = "ACTIVE")]
    pub status: String,

    /// Search phrase
    #[arg(long, default_value = "")]
    pub phrase: String,
}

#[derive(Args, Debug)]
pub struct NotificationArgs {
    #[arg(long, default_value_t = 20)]
    pub first: u32,

    /// Cursor for pagination
    #[arg(long)]
    pub after: Option<String>,

    /// Only postponed (true) or only delivered (false) notifications
    #[arg(long)]
    pub pending: Option<bool>,

    /// Only this notification type (case-insensitive)
    #[arg(long = "type")]
    pub kind: Option<String>,

    /// Hide notifications already read
    #[arg(long)]
    pub only_unread: bool,

    /// Follow pagination until the last page
    #[arg(long)]
    pub all_pages: bool,

    /// Mark the listed notifications as read
    #[arg(long)]
    pub mark_read: bool,
}

#[derive(Args, Debug)]
pub struct MonthlyBillArgs {
    /// School-year id
    #[arg(long, default_value = "")]
    pub year: String,

    /// Child id
    #[arg(long)]
    pub child: Option<String>,

    /// Only paid bills
    #[arg(long, conflicts_with = "unpaid")]
    pub paid: bool,

    /// Only unpaid bills
    #[arg(long)]
    pub unpaid: bool,

    #[arg(long, default_value_t = 10)]
    pub first: u32,

    #[arg(long)]
    pub after: Option<String>,
}

#[derive(Args, Debug)]
pub struct PaymentArgs {
    #[arg(long)]
    pub date_from: Option<String>,

    #[arg(long)]
    pub date_to: Option<String>,

    #[arg(long = "child-id")]
    pub child: Option<String>,

    /// Payment type
    #[arg(long = "type")]
    pub kind: Option<String>,

    /// Only booked payments
    #[arg(long, conflicts_with = "not_booked")]
    pub booked: bool,

    /// Only payments not booked yet
    #[arg(long)]
    pub not_booked: bool,

    #[arg(long, default_value_t = 20)]
    pub first: u32,

    #[arg(long)]
    pub after: Option<String>,
}

#[derive(Args, Debug)]
pub struct PaymentSummaryArgs {
    /// Search phrase (child name)
    #[arg(long)]
    pub search: Option<String>,

    /// Group ids, comma separated
    #[arg(long, value_delimiter = ',')]
    pub groups_ids: Vec<String>,

    #[arg(long)]
    pub balance_gte: Option<f64>,

    #[arg(long)]
    pub balance_lte: Option<f64>,

    #[arg(long)]
    pub paid_bills_gte: Option<i64>,

    #[arg(long)]
    pub paid_bills_lte: Option<i64>,

    #[arg(long, default_value_t = 50)]
    pub first: u32,

    #[arg(long)]
    pub after: Option<String>,
}

#[derive(Args, Debug)]
pub struct PaymentOrderArgs {
    #[arg(long, default_value_t = 20)]
    pub first: u32,

    #[arg(long)]
    pub after: Option<String>,

    #[arg(long)]
    pub before: Option<String>,

    #[arg(long)]
    pub offset: Option<u32>,

    /// Only orders with this payment status (case-insensitive)
    #[arg(long)]
    pub status: Option<String>,

    /// Only orders created on or after this date
    #[arg(long)]
    pub created_from: Option<String>,

    /// Only orders created on or before this date
    #[arg(long)]
    pub created_to: Option<String>,
}

#[derive(Args, Debug)]
pub struct GalleryArgs {
    #[arg(long)]
    pub group_id: Option<String>,

    #[arg(long, default_value_t = 3)]
    pub first: u32,

    #[arg(long)]
    pub after: Option<String>,

    #[arg(long, default_value = "")]
    pub search: String,

    #[arg(long)]
    pub order: Option<String>,
}

#[derive(Args, Debug)]
pub struct ChatThreadArgs {
    /// Thread type
    #[arg(long = "type")]
    pub kind: Option<String>,

    #[arg(long)]
    pub child: Option<String>,

    #[arg(long)]
    pub preschool: Option<String>,

    #[arg(long)]
    pub search: Option<String>,

    #[arg(long, default_value_t = 20)]
    pub first: u32,

    #[arg(long)]
    pub after: Option<String>,
}

/// `--date-from/--date-to` or one of the shortcuts.
#[derive(Args, Debug, Clone, Default)]
pub struct RangeFlags {
    /// First day (YYYY-MM-DD, today, tomorrow, yesterday)
    #[arg(long)]
    pub date_from: Option<String>,

    /// Last day (YYYY-MM-DD, today, tomorrow, yesterday)
    #[arg(long)]
    pub date_to: Option<String>,

    /// Monday to Sunday of the current week
    #[arg(long, conflicts_with_all = ["date_from", "date_to"])]
    pub week: bool,

    /// The current month
    #[arg(long, conflicts_with_all = ["date_from", "date_to", "week"])]
    pub month: bool,

    /// Today and the next N days
    #[arg(long, value_name = "N", conflicts_with_all = ["date_from", "date_to", "week", "month"])]
    pub days: Option<u32>,
}

impl From<&RangeFlags> for RangeArgs {
    fn from(flags: &RangeFlags) -> Self {
        RangeArgs {
            date_from: flags.date_from.clone(),
            date_to: flags.date_to.clone(),
            week: flags.week,
            month: flags.month,
            days: flags.days,
        }
    }
}

#[derive(Args, Debug)]
pub struct CalendarArgs {
    #[command(flatten)]
    pub range: RangeFlags,

    /// Group ids, comma separated
    #[arg(long, value_delimiter = ',')]
    pub groups_ids: Vec<String>,

    /// Activity types, comma separated
    #[arg(long, value_delimiter = ',', default_value = "0,1,5,9")]
    pub activity_types: Vec<i64>,

    /// Include canceled activities
    #[arg(long)]
    pub show_canceled: bool,

    #[arg(long)]
    pub for_schedule: bool,

    /// Only this activity
    #[arg(long)]
    pub activity_id: Option<String>,
}
