//! # Seed Data Generator
//!
//! Fills a database with sample books for trying the carousels by hand.
//!
//! ## Usage
//! ```bash
//! # 50 books for user 1 (default)
//! cargo run -p shelf-db --bin seed
//!
//! # Custom amount, database and owner
//! cargo run -p shelf-db --bin seed -- --count 200 --db ./data/books.db --user 42
//! ```
//!
//! ## Generated Books
//! Titles cycle through a fixed catalog across genres. Every third book is
//! marked "want to read", every fifth "read" (the later toggle wins, so
//! statuses stay exclusive), and every seventh is a favorite.

use std::env;

use shelf_core::{NewBook, ReadingStatus};
use shelf_db::{Database, DbConfig};

/// (genre, [(title, author)])
const CATALOG: &[(&str, &[(&str, &str)])] = &[
    (
        "SciFi",
        &[
            ("Dune", "Frank Herbert"),
            ("Solaris", "Stanislaw Lem"),
            ("Neuromancer", "William Gibson"),
            ("Ubik", "Philip K. Dick"),
            ("Hyperion", "Dan Simmons"),
            ("The Left Hand of Darkness", "Ursula K. Le Guin"),
        ],
    ),
    (
        "Classic",
        &[
            ("Emma", "Jane Austen"),
            ("Middlemarch", "George Eliot"),
            ("Moby-Dick", "Herman Melville"),
            ("The Idiot", "Fyodor Dostoevsky"),
            ("Anna Karenina", "Leo Tolstoy"),
        ],
    ),
    (
        "Fantasy",
        &[
            ("The Hobbit", "J. R. R. Tolkien"),
            ("A Wizard of Earthsea", "Ursula K. Le Guin"),
            ("The Name of the Wind", "Patrick Rothfuss"),
            ("Jonathan Strange & Mr Norrell", "Susanna Clarke"),
        ],
    ),
    (
        "Non-fiction",
        &[
            ("Godel, Escher, Bach", "Douglas Hofstadter"),
            ("The Selfish Gene", "Richard Dawkins"),
            ("Sapiens", "Yuval Noah Harari"),
            ("Thinking, Fast and Slow", "Daniel Kahneman"),
        ],
    ),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut count: usize = 50;
    let mut db_path = String::from("./shelf_dev.db");
    let mut user: i64 = 1;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(50);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--user" | "-u" => {
                if i + 1 < args.len() {
                    user = args[i + 1].parse().unwrap_or(1);
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Shelf Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Number of books to generate (default: 50)");
                println!("  -d, --db <PATH>    Database file path (default: ./shelf_dev.db)");
                println!("  -u, --user <ID>    External user id owning the books (default: 1)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Shelf Seed Data Generator");
    println!("===========================");
    println!("Database: {}", db_path);
    println!("Books:    {}", count);
    println!("User:     {}", user);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.books().count_all().await?;
    if existing > 0 {
        println!("⚠ Database already has {} books", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    println!();
    println!("Generating books...");

    let titles: Vec<(&str, &str, &str)> = CATALOG
        .iter()
        .flat_map(|(genre, books)| {
            books
                .iter()
                .map(move |(title, author)| (*title, *author, *genre))
        })
        .collect();

    let start = std::time::Instant::now();
    let mut generated = 0;

    for n in 0..count {
        let (title, author, genre) = titles[n % titles.len()];
        let edition = n / titles.len();
        let name = if edition == 0 {
            title.to_string()
        } else {
            format!("{} (vol. {})", title, edition + 1)
        };

        let book_id = match db
            .books()
            .add_book(user, &NewBook::new(name, author, genre))
            .await
        {
            Ok(id) => id,
            Err(e) => {
                eprintln!("Failed to insert {}: {}", title, e);
                continue;
            }
        };

        if n % 3 == 0 {
            db.statuses().toggle(book_id, ReadingStatus::InProgress).await?;
        }
        if n % 5 == 0 {
            db.statuses().toggle(book_id, ReadingStatus::Read).await?;
        }
        if n % 7 == 0 {
            db.statuses().toggle_favorite(book_id).await?;
        }

        generated += 1;
        if generated % 25 == 0 {
            println!("  Generated {} books...", generated);
        }
    }

    let elapsed = start.elapsed();
    println!();
    println!("✓ Generated {} books in {:?}", generated, elapsed);

    println!();
    println!("Carousel sizes for user {}:", user);
    println!("  Library:      {}", db.books().count_all().await?);
    println!(
        "  Want to read: {}",
        db.statuses()
            .count_for_user_by_status(user, ReadingStatus::InProgress)
            .await?
    );
    println!(
        "  Read:         {}",
        db.statuses()
            .count_for_user_by_status(user, ReadingStatus::Read)
            .await?
    );
    println!(
        "  Favorites:    {}",
        db.statuses().count_user_favorites(user).await?
    );

    println!();
    println!("✓ Seed complete!");

    db.close().await;
    Ok(())
}
