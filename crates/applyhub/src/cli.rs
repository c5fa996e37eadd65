use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use serde_json::{json, Value};

use applyhub::workflows::{ApplicationWorkflow, PostWorkflow};
use applyhub_core::models::{keys, Language};
use applyhub_core::storage::CreatedRange;

/// Months listed by `applications list` when no window is given.
const DEFAULT_LIST_MONTHS: u32 = 6;

/// applyhub - Administer applications and posts
#[derive(Parser, Debug)]
#[command(name = "applyhub")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Manage applications
    #[command(subcommand)]
    Applications(ApplicationsCommand),
    /// Manage posts
    #[command(subcommand)]
    Posts(PostsCommand),
}

#[derive(Subcommand, Debug)]
pub enum ApplicationsCommand {
    /// List applications created in a window, newest first
    List {
        /// Window start, RFC 3339 (default: six months before --end)
        #[arg(long)]
        start: Option<DateTime<Utc>>,
        /// Window end, RFC 3339 (default: now)
        #[arg(long)]
        end: Option<DateTime<Utc>>,
    },
    /// Show an application with its documents and messages
    Get { id: String },
    /// Delete an application and everything stored under it
    Delete { id: String },
    /// Link an external identity to an application
    Link { id: String, identity: String },
    /// Find the application registered with an email
    ByEmail { email: String },
}

#[derive(Subcommand, Debug)]
pub enum PostsCommand {
    /// List posts in a language (en, de, tl, at), newest first
    List { language: Language },
    /// Show a post with its documents
    Get { id: String },
    /// Replace a post's title and content
    Update {
        id: String,
        #[arg(long)]
        title: String,
        #[arg(long)]
        content: String,
    },
    /// Delete a post and its documents
    Delete { id: String },
}

/// Window for `applications list`.
pub fn list_range(
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> anyhow::Result<CreatedRange> {
    let end = end.unwrap_or(now);
    let range = match start {
        Some(start) => CreatedRange::new(start, end)?,
        None => CreatedRange::last_months(end, DEFAULT_LIST_MONTHS),
    };
    Ok(range)
}

/// Runs one command, returning its JSON output.
pub async fn run(
    command: Command,
    applications: &ApplicationWorkflow,
    posts: &PostWorkflow,
) -> anyhow::Result<Value> {
    let output = match command {
        Command::Applications(command) => match command {
            ApplicationsCommand::List { start, end } => {
                let range = list_range(start, end, Utc::now())?;
                serde_json::to_value(applications.list(&range).await?)?
            }
            ApplicationsCommand::Get { id } => {
                let pk = keys::application_pk_from_id(&id);
                serde_json::to_value(applications.get(&pk).await?)?
            }
            ApplicationsCommand::Delete { id } => {
                let pk = keys::application_pk_from_id(&id);
                applications.delete(&pk).await?;
                json!({ "deleted": pk })
            }
            ApplicationsCommand::Link { id, identity } => {
                let pk = keys::application_pk_from_id(&id);
                applications.link_identity(&pk, &identity).await?;
                json!({ "linked": pk, "identity": identity })
            }
            ApplicationsCommand::ByEmail { email } => {
                serde_json::to_value(applications.by_email(&email).await?)?
            }
        },
        Command::Posts(command) => match command {
            PostsCommand::List { language } => {
                serde_json::to_value(posts.by_language(language).await?)?
            }
            PostsCommand::Get { id } => {
                let pk = keys::post_pk_from_id(&id);
                serde_json::to_value(posts.get(&pk).await?)?
            }
            PostsCommand::Update { id, title, content } => {
                let pk = keys::post_pk_from_id(&id);
                serde_json::to_value(posts.update(&pk, &title, &content).await?)?
            }
            PostsCommand::Delete { id } => {
                let pk = keys::post_pk_from_id(&id);
                posts.delete(&pk).await?;
                json!({ "deleted": pk })
            }
        },
    };
    Ok(output)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_parse_applications_list() {
        let cli = Cli::try_parse_from([
            "applyhub",
            "applications",
            "list",
            "--start",
            "2024-01-01T00:00:00Z",
        ])
        .unwrap();

        match cli.command {
            Command::Applications(ApplicationsCommand::List { start, end }) => {
                assert_eq!(start, Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()));
                assert_eq!(end, None);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_posts_list_language() {
        let cli = Cli::try_parse_from(["applyhub", "posts", "list", "de"]).unwrap();

        assert!(matches!(
            cli.command,
            Command::Posts(PostsCommand::List {
                language: Language::German
            })
        ));
        assert!(Cli::try_parse_from(["applyhub", "posts", "list", "fr"]).is_err());
    }

    #[test]
    fn test_parse_posts_update() {
        let cli = Cli::try_parse_from([
            "applyhub", "posts", "update", "abc", "--title", "New", "--content", "Text",
        ])
        .unwrap();

        assert!(matches!(
            cli.command,
            Command::Posts(PostsCommand::Update { ref id, ref title, ref content })
                if id == "abc" && title == "New" && content == "Text"
        ));
        assert!(Cli::try_parse_from(["applyhub", "posts", "update", "abc"]).is_err());
    }

    #[test]
    fn test_parse_link() {
        let cli =
            Cli::try_parse_from(["applyhub", "applications", "link", "abc", "sub-1"]).unwrap();

        assert!(matches!(
            cli.command,
            Command::Applications(ApplicationsCommand::Link { ref id, ref identity })
                if id == "abc" && identity == "sub-1"
        ));
    }

    #[test]
    fn test_list_range_defaults_to_six_months() {
        let now = Utc.with_ymd_and_hms(2024, 7, 15, 12, 0, 0).unwrap();

        let range = list_range(None, None, now).unwrap();

        assert_eq!(range.start, Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap());
        assert_eq!(range.end, now);
    }

    #[test]
    fn test_list_range_rejects_inverted_window() {
        let now = Utc.with_ymd_and_hms(2024, 7, 15, 12, 0, 0).unwrap();

        assert!(list_range(Some(now), Some(now - chrono::Duration::days(1)), now).is_err());
    }
}
