//! CLI command definitions and argument parsing.

use clap::{Parser, Subcommand};

/// Liaison CLI - Manage relationships between people and organizations.
#[derive(Debug, Parser)]
#[command(name = "liaison")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file path
    #[arg(short, long, global = true, env = "LIAISON_CONFIG")]
    pub config: Option<String>,

    /// Database file path (overrides the configured one)
    #[arg(long, global = true, env = "LIAISON_DB")]
    pub db: Option<String>,

    /// Log engine activity to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
    /// Quiet format (IDs only)
    Quiet,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Register or inspect actors
    Actor(ActorArgs),

    /// Link two actors
    Link(LinkArgs),

    /// Change a relationship's sub-type
    Reclassify(ReclassifyArgs),

    /// End a relationship
    End(EndArgs),

    /// Soft-delete a relationship
    Remove(IdArgs),

    /// Show a relationship in any state (audit)
    Show(IdArgs),

    /// List an actor's relationships
    List(ListArgs),

    /// Assign a share to an actor
    Assign(AssignArgs),

    /// End a share assignment
    Unassign(EndArgs),

    /// Manage a single share assignment
    Assignment(AssignmentArgs),

    /// List share assignments by actor or share
    Assignments(AssignmentsArgs),
}

/// Arguments for actor management.
#[derive(Debug, Parser)]
pub struct ActorArgs {
    #[command(subcommand)]
    pub action: ActorAction,
}

/// Actor management actions.
#[derive(Debug, Subcommand)]
pub enum ActorAction {
    /// Register a person or organization
    Add {
        /// Display name
        name: String,

        /// Kind of actor
        #[arg(short, long, value_enum, default_value = "person")]
        kind: KindArg,

        /// Gender (male, female); drives role labels
        #[arg(short, long)]
        gender: Option<String>,
    },

    /// Show an actor
    Show {
        /// Actor ID
        id: String,
    },

    /// List live actors
    List,

    /// Soft-delete an actor
    Remove {
        /// Actor ID
        id: String,
    },
}

/// Actor kind argument.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum KindArg {
    /// A natural person
    Person,
    /// A company or other organization
    Organization,
}

/// Arguments for the link command.
#[derive(Debug, Parser)]
pub struct LinkArgs {
    /// Origin actor ID
    pub origin: String,

    /// Destination actor ID
    pub destination: String,

    /// Relationship category (family, employment, referral, membership, commercial, other)
    #[arg(short = 't', long = "type", default_value = "family")]
    pub relationship_type: String,

    /// What the destination is to the origin (e.g. spouse, child, parent)
    #[arg(short, long)]
    pub sub_type: Option<String>,

    /// Free-text notes
    #[arg(short, long)]
    pub notes: Option<String>,

    /// Store the link as one-way
    #[arg(long)]
    pub one_way: bool,
}

/// Arguments for the reclassify command.
#[derive(Debug, Parser)]
pub struct ReclassifyArgs {
    /// Relationship ID
    pub id: String,

    /// New sub-type
    pub sub_type: String,
}

/// Arguments for end-style commands.
#[derive(Debug, Parser)]
pub struct EndArgs {
    /// Record ID
    pub id: String,

    /// End time in Unix seconds (defaults to now)
    #[arg(long)]
    pub at: Option<u64>,
}

/// A single record ID.
#[derive(Debug, Parser)]
pub struct IdArgs {
    /// Record ID
    pub id: String,
}

/// Arguments for the list command.
#[derive(Debug, Parser)]
pub struct ListArgs {
    /// Actor ID
    pub actor: String,

    /// Include ended relationships
    #[arg(short, long)]
    pub all: bool,

    /// Only this category
    #[arg(short = 't', long = "type")]
    pub relationship_type: Option<String>,
}

/// Arguments for the assign command.
#[derive(Debug, Parser)]
pub struct AssignArgs {
    /// Actor ID
    pub actor: String,

    /// Share ID
    pub share: String,

    /// Assignment type
    #[arg(short = 't', long = "type", value_enum, default_value = "owner")]
    pub assignment_type: AssignmentTypeArg,

    /// Percentage held (0-100)
    #[arg(short, long)]
    pub percentage: Option<f64>,

    /// Free-text notes
    #[arg(short, long)]
    pub notes: Option<String>,

    /// Close other active holders of this type on the share
    #[arg(long)]
    pub exclusive: bool,
}

/// Arguments for single-assignment management.
#[derive(Debug, Parser)]
pub struct AssignmentArgs {
    #[command(subcommand)]
    pub action: AssignmentAction,
}

/// Single-assignment actions.
#[derive(Debug, Subcommand)]
pub enum AssignmentAction {
    /// Show an assignment in any state (audit)
    Show {
        /// Assignment ID
        id: String,
    },

    /// Soft-delete an assignment
    Remove {
        /// Assignment ID
        id: String,
    },
}

/// Arguments for the assignments command.
#[derive(Debug, Parser)]
pub struct AssignmentsArgs {
    /// Filter by holder
    #[arg(long, conflicts_with = "share", required_unless_present = "share")]
    pub actor: Option<String>,

    /// Filter by share
    #[arg(long)]
    pub share: Option<String>,

    /// Include ended assignments
    #[arg(short, long)]
    pub all: bool,
}

/// Assignment type argument.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum AssignmentTypeArg {
    /// Legal owner
    Owner,
    /// Registered titleholder
    Titleholder,
    /// Beneficiary
    Beneficiary,
}

impl From<CliFormat> for crate::config::OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => crate::config::OutputFormat::Table,
            CliFormat::Json => crate::config::OutputFormat::Json,
            CliFormat::Quiet => crate::config::OutputFormat::Quiet,
        }
    }
}

impl From<KindArg> for liaison_domain::ActorKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Person => liaison_domain::ActorKind::Person,
            KindArg::Organization => liaison_domain::ActorKind::Organization,
        }
    }
}

impl From<AssignmentTypeArg> for liaison_domain::AssignmentType {
    fn from(kind: AssignmentTypeArg) -> Self {
        match kind {
            AssignmentTypeArg::Owner => liaison_domain::AssignmentType::Owner,
            AssignmentTypeArg::Titleholder => liaison_domain::AssignmentType::Titleholder,
            AssignmentTypeArg::Beneficiary => liaison_domain::AssignmentType::Beneficiary,
        }
    }
}
