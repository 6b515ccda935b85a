//! # Console Request Loop
//!
//! A line-oriented stand-in for the chat transport. One request per input
//! line, one JSON outcome per output line.
//!
//! ## Line Format
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  <external_user_id> <payload>                                           │
//! │      42 lib:0                 → Navigate(Library, 0)                   │
//! │      42 sttoggle:read:17      → ToggleStatus(Read, 17)                 │
//! │      42 nonsense              → Noop (nothing printed)                 │
//! │                                                                         │
//! │  <external_user_id> add <name>|<author>|<genre>[|<photo>]               │
//! │      42 add Dune|Frank Herbert|SciFi                                   │
//! │                                → AddBook (result of the input wizard)  │
//! │                                                                         │
//! │  Output:                                                                │
//! │      {"user":42,"view_id":8,"replaces":7,"outcome":"carousel",...}     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Outcomes that show a screen get a fresh view id and name the view they
//! replace. Alerts (not found, invalid input, store failure) carry neither;
//! the screen underneath stays as it was.

use serde::Serialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::debug;

use crate::error::AppResult;
use crate::state::{ViewRef, ViewRegistry};
use shelf_core::{Action, NewBook, Request};
use shelf_db::{ActionHandler, Outcome};

/// Keyword introducing an add-book line.
const ADD_KEYWORD: &str = "add";

// =============================================================================
// Parsing
// =============================================================================

/// Splits an input line into the acting user and their request.
///
/// Returns `None` for blank lines and lines without a numeric user id.
pub fn parse_line(line: &str) -> Option<(i64, Request)> {
    let line = line.trim();
    let (user, rest) = line.split_once(char::is_whitespace)?;
    let external_user_id = user.parse::<i64>().ok()?;
    let rest = rest.trim();

    let request = match rest.split_once(char::is_whitespace) {
        Some((ADD_KEYWORD, fields)) => Request::Action(Action::AddBook {
            external_user_id,
            book: parse_new_book(fields),
        }),
        _ if rest == ADD_KEYWORD => Request::Action(Action::AddBook {
            external_user_id,
            book: parse_new_book(""),
        }),
        _ => Request::from_payload(rest),
    };

    Some((external_user_id, request))
}

/// `name|author|genre[|photo]`. Missing fields come through empty and are
/// rejected by validation downstream.
fn parse_new_book(fields: &str) -> NewBook {
    let mut parts = fields.split('|').map(str::trim);
    let name = parts.next().unwrap_or_default();
    let author = parts.next().unwrap_or_default();
    let genre = parts.next().unwrap_or_default();

    let book = NewBook::new(name, author, genre);
    match parts.next().filter(|photo| !photo.is_empty()) {
        Some(photo) => book.with_photo(photo),
        None => book,
    }
}

// =============================================================================
// Rendering
// =============================================================================

/// One output line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rendered {
    pub user: i64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub view_id: Option<u64>,

    /// The view this one should replace.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replaces: Option<u64>,

    #[serde(flatten)]
    pub outcome: Outcome,
}

/// Whether `outcome` takes over the user's screen.
fn shows_view(outcome: &Outcome) -> bool {
    !matches!(
        outcome,
        Outcome::Noop | Outcome::NotFound { .. } | Outcome::Invalid { .. } | Outcome::Failed { .. }
    )
}

// =============================================================================
// Console
// =============================================================================

/// Feeds parsed lines to the [`ActionHandler`] and tracks views per user.
#[derive(Debug, Clone)]
pub struct Console {
    handler: ActionHandler,
    registry: ViewRegistry,
}

impl Console {
    pub fn new(handler: ActionHandler, registry: ViewRegistry) -> Self {
        Console { handler, registry }
    }

    pub fn registry(&self) -> &ViewRegistry {
        &self.registry
    }

    /// Handles one input line. `None` means there is nothing to print.
    pub async fn handle_line(&self, line: &str) -> Option<Rendered> {
        let Some((user, request)) = parse_line(line) else {
            if !line.trim().is_empty() {
                debug!(line = %line.trim(), "Ignoring malformed request line");
            }
            return None;
        };

        let outcome = self.handler.handle_request(user, request).await;
        if matches!(outcome, Outcome::Noop) {
            return None;
        }

        let (view_id, replaces) = if shows_view(&outcome) {
            let view = self.registry.next_view();
            let replaced = self.registry.record(user, view);
            (Some(view.view_id), replaced.map(|ViewRef { view_id }| view_id))
        } else {
            (None, None)
        };

        Some(Rendered {
            user,
            view_id,
            replaces,
            outcome,
        })
    }

    /// Reads requests until end of input, writing one JSON line per outcome.
    ///
    /// Returns the number of outcomes written.
    pub async fn serve<R, W>(&self, reader: R, mut writer: W) -> AppResult<u64>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = reader.lines();
        let mut written = 0;

        while let Some(line) = lines.next_line().await? {
            let Some(rendered) = self.handle_line(&line).await else {
                continue;
            };

            let mut json = serde_json::to_string(&rendered)?;
            json.push('\n');
            writer.write_all(json.as_bytes()).await?;
            writer.flush().await?;
            written += 1;
        }

        Ok(written)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use shelf_core::{ReadingStatus, Scope};
    use shelf_db::{Database, DbConfig};

    async fn setup() -> (Database, Console) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let console = Console::new(db.handler(), ViewRegistry::new());
        (db, console)
    }

    #[test]
    fn test_parse_payload_lines() {
        assert_eq!(
            parse_line("42 lib:3"),
            Some((
                42,
                Request::Action(Action::Navigate {
                    scope: Scope::Library,
                    index: 3
                })
            ))
        );
        assert_eq!(
            parse_line("  7   sttoggle:read:9  "),
            Some((
                7,
                Request::Action(Action::ToggleStatus {
                    status: ReadingStatus::Read,
                    book_id: 9
                })
            ))
        );
        assert_eq!(parse_line("42 garbage"), Some((42, Request::Noop)));
    }

    #[test]
    fn test_parse_rejects_lines_without_user() {
        assert_eq!(parse_line(""), None);
        assert_eq!(parse_line("   "), None);
        assert_eq!(parse_line("42"), None);
        assert_eq!(parse_line("bob lib:0"), None);
    }

    #[test]
    fn test_parse_add_line() {
        let (user, request) = parse_line("42 add Dune | Frank Herbert | SciFi | photo-1").unwrap();
        assert_eq!(user, 42);
        assert_eq!(
            request,
            Request::Action(Action::AddBook {
                external_user_id: 42,
                book: NewBook::new("Dune", "Frank Herbert", "SciFi").with_photo("photo-1"),
            })
        );

        // Missing fields are passed through empty for validation to reject
        let (_, request) = parse_line("42 add Dune").unwrap();
        assert_eq!(
            request,
            Request::Action(Action::AddBook {
                external_user_id: 42,
                book: NewBook::new("Dune", "", ""),
            })
        );
        let (_, request) = parse_line("42 add").unwrap();
        assert!(matches!(request, Request::Action(Action::AddBook { .. })));
    }

    #[tokio::test]
    async fn test_views_replace_previous_ones() {
        let (_db, console) = setup().await;

        let first = console.handle_line("42 book_list").await.unwrap();
        assert_eq!((first.view_id, first.replaces), (Some(1), None));
        assert!(matches!(first.outcome, Outcome::Carousel { .. }));

        let second = console.handle_line("42 back_main").await.unwrap();
        assert_eq!((second.view_id, second.replaces), (Some(2), Some(1)));
        assert_eq!(second.outcome, Outcome::Menu);

        // Another user's views are tracked separately
        let other = console.handle_line("7 back_main").await.unwrap();
        assert_eq!((other.view_id, other.replaces), (Some(3), None));
    }

    #[tokio::test]
    async fn test_alerts_leave_the_view_alone() {
        let (_db, console) = setup().await;
        console.handle_line("42 back_main").await.unwrap();

        let alert = console.handle_line("42 book:404").await.unwrap();
        assert_eq!(alert.outcome, Outcome::NotFound { book_id: Some(404) });
        assert_eq!((alert.view_id, alert.replaces), (None, None));
        assert_eq!(console.registry().last(42), Some(ViewRef { view_id: 1 }));
    }

    #[tokio::test]
    async fn test_noop_and_malformed_print_nothing() {
        let (_db, console) = setup().await;
        assert!(console.handle_line("42 noop").await.is_none());
        assert!(console.handle_line("42 delete:abc").await.is_none());
        assert!(console.handle_line("not a request").await.is_none());
        assert!(console.registry().is_empty());
    }

    #[tokio::test]
    async fn test_serve_writes_json_lines() {
        let (db, console) = setup().await;

        let input = b"42 add Dune|Frank Herbert|SciFi\n\
                      garbage\n\
                      42 lib:0\n\
                      42 add |Nobody|\n" as &[u8];
        let mut output = Vec::new();

        let written = console.serve(input, &mut output).await.unwrap();
        assert_eq!(written, 3);
        assert_eq!(db.books().count_all().await.unwrap(), 1);

        let lines: Vec<Value> = std::str::from_utf8(&output)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();

        assert_eq!(lines[0]["outcome"], "book_added");
        assert_eq!(lines[0]["user"], 42);

        assert_eq!(lines[1]["outcome"], "carousel");
        assert_eq!(lines[1]["replaces"], lines[0]["view_id"]);

        assert_eq!(lines[2]["outcome"], "invalid");
        assert!(lines[2].get("view_id").is_none());
    }
}
