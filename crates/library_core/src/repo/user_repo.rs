//! User repository contracts and SQLite implementation.
//!
//! # Invariants
//! - `all()` returns users in insertion order.
//! - Age thresholds use calendar arithmetic on the clock's current date.

use crate::clock::{Clock, SystemClock};
use crate::model::person::{User, UserId};
use crate::repo::crud::{CrudRepository, RepoError, RepoResult};
use crate::repo::support::{ensure_connection_ready, parse_uuid, TableSpec};
use chrono::{Months, NaiveDate};
use rusqlite::{params, Connection, Row};

const ENTITY: &str = "user";

const REQUIRED_TABLES: &[TableSpec] = &[("users", &["uuid", "first_name", "last_name", "birth"])];

const USER_SELECT_SQL: &str = "SELECT uuid, first_name, last_name, birth FROM users";

/// Repository interface for library members.
pub trait UserRepository: CrudRepository<Id = UserId, Entity = User> {
    /// Users born strictly before today minus `age` years.
    fn find_all_older_than(&self, age: u32) -> RepoResult<Vec<User>>;
}

/// SQLite-backed user repository.
pub struct SqliteUserRepository<'conn> {
    conn: &'conn Connection,
    clock: Box<dyn Clock>,
}

impl<'conn> SqliteUserRepository<'conn> {
    /// Creates repository from migrated connection, using the system clock.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, REQUIRED_TABLES)?;
        Ok(Self {
            conn,
            clock: Box::new(SystemClock),
        })
    }

    /// Replaces the clock used by age queries.
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    fn query_users(&self, sql: &str, bind: &[&dyn rusqlite::ToSql]) -> RepoResult<Vec<User>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(bind)?;
        let mut users = Vec::new();
        while let Some(row) = rows.next()? {
            users.push(parse_user_row(row)?);
        }
        Ok(users)
    }
}

impl CrudRepository for SqliteUserRepository<'_> {
    type Id = UserId;
    type Entity = User;

    fn save(&self, user: &User) -> RepoResult<User> {
        user.validate()?;
        self.conn.execute(
            "INSERT INTO users (uuid, first_name, last_name, birth) VALUES (?1, ?2, ?3, ?4);",
            params![
                user.id.to_string(),
                user.first_name.as_str(),
                user.last_name.as_str(),
                user.birth,
            ],
        )?;
        Ok(user.clone())
    }

    fn get(&self, id: UserId) -> RepoResult<Option<User>> {
        let users = self.query_users(
            &format!("{USER_SELECT_SQL} WHERE uuid = ?1;"),
            &[&id.to_string()],
        )?;
        Ok(users.into_iter().next())
    }

    fn update(&self, user: &User) -> RepoResult<()> {
        user.validate()?;
        let changed = self.conn.execute(
            "UPDATE users SET first_name = ?1, last_name = ?2, birth = ?3 WHERE uuid = ?4;",
            params![
                user.first_name.as_str(),
                user.last_name.as_str(),
                user.birth,
                user.id.to_string(),
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::not_found(ENTITY, user.id));
        }
        Ok(())
    }

    fn delete(&self, user: &User) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM users WHERE uuid = ?1;", [user.id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::not_found(ENTITY, user.id));
        }
        Ok(())
    }

    fn all(&self) -> RepoResult<Vec<User>> {
        self.query_users(&format!("{USER_SELECT_SQL} ORDER BY rowid ASC;"), &[])
    }
}

impl UserRepository for SqliteUserRepository<'_> {
    fn find_all_older_than(&self, age: u32) -> RepoResult<Vec<User>> {
        let Some(threshold) = birth_threshold(self.clock.today(), age) else {
            // Nobody can be born before the earliest representable date.
            return Ok(Vec::new());
        };
        self.query_users(
            &format!("{USER_SELECT_SQL} WHERE birth < ?1 ORDER BY birth ASC, rowid ASC;"),
            &[&threshold],
        )
    }
}

/// Latest birth date (exclusive) of someone older than `age` years on `today`.
pub fn birth_threshold(today: NaiveDate, age: u32) -> Option<NaiveDate> {
    let months = age.checked_mul(12)?;
    today.checked_sub_months(Months::new(months))
}

fn parse_user_row(row: &Row<'_>) -> RepoResult<User> {
    let uuid_text: String = row.get("uuid")?;
    Ok(User {
        id: parse_uuid(&uuid_text, "users.uuid")?,
        first_name: row.get("first_name")?,
        last_name: row.get("last_name")?,
        birth: row.get("birth")?,
    })
}

#[cfg(test)]
mod tests {
    use super::birth_threshold;
    use chrono::NaiveDate;

    #[test]
    fn threshold_subtracts_calendar_years() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        assert_eq!(
            birth_threshold(today, 18),
            NaiveDate::from_ymd_opt(2006, 6, 15)
        );
    }

    #[test]
    fn threshold_clamps_leap_day() {
        let today = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(
            birth_threshold(today, 1),
            NaiveDate::from_ymd_opt(2023, 2, 28)
        );
    }

    #[test]
    fn threshold_overflow_is_none() {
        let today = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert_eq!(birth_threshold(today, u32::MAX), None);
    }
}
