use chrono::{NaiveDate, TimeZone, Utc};
use library_core::db::open_db_in_memory;
use library_core::{
    CrudRepository, FixedClock, ModelValidationError, RepoError, SqliteUserRepository, User,
    UserRepository,
};
use uuid::Uuid;

#[test]
fn save_and_get_roundtrip() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::try_new(&conn).unwrap();
    let user = User::new("Jeanne", "Martin", date(1990, 4, 2));

    let saved = repo.save(&user).unwrap();

    assert_eq!(saved, user);
    assert_eq!(repo.get(user.id).unwrap(), Some(user));
    assert_eq!(repo.get(Uuid::new_v4()).unwrap(), None);
}

#[test]
fn all_returns_users_in_insertion_order() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::try_new(&conn).unwrap();
    let zoe = repo.save(&User::new("Zoe", "Blanc", date(2001, 1, 1))).unwrap();
    let adam = repo.save(&User::new("Adam", "Noir", date(1970, 1, 1))).unwrap();

    assert_eq!(repo.all().unwrap(), vec![zoe, adam]);
}

#[test]
fn find_all_older_than_excludes_exact_birthday() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::try_new(&conn)
        .unwrap()
        .with_clock(FixedClock(
            Utc.with_ymd_and_hms(2024, 6, 15, 10, 0, 0).unwrap(),
        ));

    let turns_today = repo
        .save(&User::new("Turns", "Today", date(2006, 6, 15)))
        .unwrap();
    let day_before = repo
        .save(&User::new("Day", "Before", date(2006, 6, 14)))
        .unwrap();
    let senior = repo
        .save(&User::new("Much", "Older", date(1950, 9, 30)))
        .unwrap();
    repo.save(&User::new("Still", "Minor", date(2010, 2, 1)))
        .unwrap();

    let older = repo.find_all_older_than(18).unwrap();
    assert_eq!(older, vec![senior, day_before]);
    assert!(!older.contains(&turns_today));
}

#[test]
fn find_all_older_than_zero_excludes_users_born_today() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::try_new(&conn)
        .unwrap()
        .with_clock(FixedClock(
            Utc.with_ymd_and_hms(2024, 6, 15, 23, 59, 59).unwrap(),
        ));
    repo.save(&User::new("New", "Born", date(2024, 6, 15)))
        .unwrap();
    let yesterday = repo
        .save(&User::new("Day", "Old", date(2024, 6, 14)))
        .unwrap();

    assert_eq!(repo.find_all_older_than(0).unwrap(), vec![yesterday]);
}

#[test]
fn find_all_older_than_huge_age_is_empty() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::try_new(&conn).unwrap();
    repo.save(&User::new("Very", "Old", date(1900, 1, 1)))
        .unwrap();

    assert!(repo.find_all_older_than(u32::MAX).unwrap().is_empty());
}

#[test]
fn update_writes_back_fields() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::try_new(&conn).unwrap();
    let mut saved = repo
        .save(&User::new("Jeanne", "Martin", date(1990, 4, 2)))
        .unwrap();

    saved.last_name = "Dupont".to_string();
    saved.birth = date(1991, 4, 2);
    repo.update(&saved).unwrap();

    assert_eq!(repo.get(saved.id).unwrap(), Some(saved));
}

#[test]
fn duplicate_and_nil_ids_are_rejected() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::try_new(&conn).unwrap();
    let saved = repo
        .save(&User::new("Jeanne", "Martin", date(1990, 4, 2)))
        .unwrap();

    assert!(matches!(
        repo.save(&saved),
        Err(RepoError::ConstraintViolation(_))
    ));

    let mut nil = saved.clone();
    nil.id = Uuid::nil();
    assert!(matches!(
        repo.save(&nil),
        Err(RepoError::Validation(ModelValidationError::NilUuid))
    ));
}

#[test]
fn delete_missing_user_returns_not_found() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::try_new(&conn).unwrap();
    let user = User::new("Never", "Saved", date(1990, 4, 2));

    assert!(matches!(
        repo.delete(&user),
        Err(RepoError::NotFound { entity: "user", .. })
    ));
}

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}
