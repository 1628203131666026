//! Circulation report entry point.
//!
//! # Responsibility
//! - Verify `library_core` linkage and store bootstrap from the command line.
//! - Print a deterministic summary of late loans, loans due soon and the
//!   busiest librarians.
//!
//! Usage: `library_cli [due_within_days]` with `LIBRARY_*` environment
//! variables selecting the database and logging.

use library_core::{
    BorrowRepository, CoreConfig, LibrarianRepository, SqliteBorrowRepository,
    SqliteLibrarianRepository,
};
use log::info;
use std::error::Error;

const DEFAULT_DUE_WITHIN_DAYS: i32 = 7;

fn main() -> Result<(), Box<dyn Error>> {
    let due_within_days = match std::env::args().nth(1) {
        Some(value) => value
            .parse::<i32>()
            .map_err(|err| format!("invalid due_within_days `{value}`: {err}"))?,
        None => DEFAULT_DUE_WITHIN_DAYS,
    };

    let config = CoreConfig::from_env()?;
    config.init_logging()?;
    let conn = config.open_database()?;

    println!("library_core ping={}", library_core::ping());
    println!("library_core version={}", library_core::core_version());

    let borrows = SqliteBorrowRepository::try_new(&conn)?;
    let late = borrows.found_all_late_borrow()?;
    let due_soon = borrows.find_all_borrow_that_will_late_within(due_within_days)?;
    println!("late_borrows={}", late.len());
    println!("due_within_{due_within_days}_days={}", due_soon.len());

    let librarians = SqliteLibrarianRepository::try_new(&conn)?;
    for (rank, librarian) in librarians.top3_working_librarians()?.iter().enumerate() {
        println!(
            "top_librarian rank={} id={} name={} {}",
            rank + 1,
            librarian.id,
            librarian.first_name,
            librarian.last_name
        );
    }

    info!(
        "event=cli_report module=cli status=ok late={} due_soon={}",
        late.len(),
        due_soon.len()
    );
    Ok(())
}
