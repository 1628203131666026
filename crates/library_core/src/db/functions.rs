//! Scalar SQL functions registered on every library connection.
//!
//! SQLite's built-in `lower()` and `LIKE` only fold ASCII letters, so
//! name/title searches go through `casefold(text)` instead.

use rusqlite::functions::FunctionFlags;
use rusqlite::Connection;

/// SQL name of the Unicode lower-casing function.
pub const CASEFOLD_FN: &str = "casefold";

/// Registers `casefold(text) -> text` on the connection.
///
/// `NULL` input yields `NULL`.
pub fn register_functions(conn: &Connection) -> rusqlite::Result<()> {
    conn.create_scalar_function(
        CASEFOLD_FN,
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let value = ctx.get::<Option<String>>(0)?;
            Ok(value.map(|text| text.to_lowercase()))
        },
    )
}

#[cfg(test)]
mod tests {
    use super::register_functions;
    use rusqlite::Connection;

    #[test]
    fn casefold_lowers_non_ascii_letters() {
        let conn = Connection::open_in_memory().unwrap();
        register_functions(&conn).unwrap();

        let folded: String = conn
            .query_row("SELECT casefold('ÉMILE Zola');", [], |row| row.get(0))
            .unwrap();
        assert_eq!(folded, "émile zola");

        let null: Option<String> = conn
            .query_row("SELECT casefold(NULL);", [], |row| row.get(0))
            .unwrap();
        assert_eq!(null, None);
    }
}
