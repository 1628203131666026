use library_core::db::open_db_in_memory;
use library_core::{
    Author, AuthorRepository, Book, BookRepository, CrudRepository, Language, RepoError,
    SqliteAuthorRepository, SqliteBookRepository,
};

#[test]
fn save_assigns_identity_and_get_roundtrips() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteAuthorRepository::try_new(&conn).unwrap();

    let saved = repo.save(&Author::new("Marie de France")).unwrap();
    assert!(saved.id.is_some());

    let loaded = repo.get(saved.id.unwrap()).unwrap().unwrap();
    assert_eq!(loaded, saved);
    assert!(repo.get(9_999).unwrap().is_none());
}

#[test]
fn all_is_sorted_by_name_for_any_insertion_order() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteAuthorRepository::try_new(&conn).unwrap();

    for name in [
        "William Gibson",
        "Victor Hugo",
        "Moliere",
        "Honore de Balzac",
        "Emile Zola",
        "Marie de France",
    ] {
        repo.save(&Author::new(name)).unwrap();
    }

    let names: Vec<String> = repo
        .all()
        .unwrap()
        .into_iter()
        .map(|author| author.full_name)
        .collect();
    assert_eq!(
        names,
        [
            "Emile Zola",
            "Honore de Balzac",
            "Marie de France",
            "Moliere",
            "Victor Hugo",
            "William Gibson",
        ]
    );
}

#[test]
fn search_by_name_matches_substrings_ignoring_case() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteAuthorRepository::try_new(&conn).unwrap();
    let gibson = repo.save(&Author::new("William Gibson")).unwrap();
    let hemingway = repo.save(&Author::new("Arthur Hemingway")).unwrap();

    assert_eq!(repo.search_by_name("Will").unwrap(), vec![gibson.clone()]);
    assert_eq!(repo.search_by_name("thur").unwrap(), vec![hemingway.clone()]);
    assert_eq!(repo.search_by_name("GIBSON").unwrap(), vec![gibson.clone()]);
    assert_eq!(
        repo.search_by_name("arthur hemingway").unwrap(),
        vec![hemingway.clone()]
    );
    assert!(repo.search_by_name("Zola").unwrap().is_empty());
}

#[test]
fn search_by_name_with_empty_pattern_matches_all_sorted() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteAuthorRepository::try_new(&conn).unwrap();
    let zola = repo.save(&Author::new("Emile Zola")).unwrap();
    let balzac = repo.save(&Author::new("Balzac")).unwrap();

    assert_eq!(repo.search_by_name("").unwrap(), vec![balzac, zola]);
}

#[test]
fn search_by_name_folds_non_ascii_and_ignores_wildcards() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteAuthorRepository::try_new(&conn).unwrap();
    let sagan = repo.save(&Author::new("Françoise Sagan")).unwrap();
    repo.save(&Author::new("Frank Herbert")).unwrap();

    assert_eq!(repo.search_by_name("FRANÇOISE").unwrap(), vec![sagan]);
    assert!(repo.search_by_name("Fran%").unwrap().is_empty());
    assert!(repo.search_by_name("Fr_nk").unwrap().is_empty());
}

#[test]
fn co_authored_check_distinguishes_sole_and_shared_books() {
    let conn = open_db_in_memory().unwrap();
    let authors = SqliteAuthorRepository::try_new(&conn).unwrap();
    let books = SqliteBookRepository::try_new(&conn).unwrap();

    let solo = authors.save(&Author::new("Solo Writer")).unwrap();
    let first = authors.save(&Author::new("First Partner")).unwrap();
    let second = authors.save(&Author::new("Second Partner")).unwrap();

    let mut solo_book = sample_book("Alone");
    solo_book.add_author(solo.id.unwrap());
    books.save(&solo_book).unwrap();

    let mut shared_book = sample_book("Together");
    shared_book.add_author(first.id.unwrap());
    shared_book.add_author(second.id.unwrap());
    books.save(&shared_book).unwrap();

    assert!(!authors
        .check_author_by_id_having_co_authored_books(solo.id.unwrap())
        .unwrap());
    assert!(authors
        .check_author_by_id_having_co_authored_books(first.id.unwrap())
        .unwrap());
    assert!(authors
        .check_author_by_id_having_co_authored_books(second.id.unwrap())
        .unwrap());
    assert!(!authors
        .check_author_by_id_having_co_authored_books(9_999)
        .unwrap());
}

#[test]
fn update_and_delete_require_saved_rows() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteAuthorRepository::try_new(&conn).unwrap();

    let unsaved = Author::new("Nobody");
    assert!(matches!(
        repo.update(&unsaved),
        Err(RepoError::Detached("author"))
    ));
    assert!(matches!(
        repo.delete(&unsaved),
        Err(RepoError::Detached("author"))
    ));

    let mut saved = repo.save(&Author::new("Victor Hugo")).unwrap();
    saved.full_name = "Victor-Marie Hugo".to_string();
    repo.update(&saved).unwrap();
    assert_eq!(repo.get(saved.id.unwrap()).unwrap().unwrap(), saved);

    repo.delete(&saved).unwrap();
    assert!(repo.get(saved.id.unwrap()).unwrap().is_none());
    assert!(matches!(
        repo.delete(&saved),
        Err(RepoError::NotFound { entity: "author", .. })
    ));
}

#[test]
fn saving_duplicate_identity_is_a_constraint_violation() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteAuthorRepository::try_new(&conn).unwrap();
    let saved = repo.save(&Author::new("Moliere")).unwrap();

    let err = repo.save(&saved).unwrap_err();
    assert!(matches!(err, RepoError::ConstraintViolation(_)));
}

#[test]
fn ordering_ignores_letter_case() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteAuthorRepository::try_new(&conn).unwrap();
    for name in ["bob", "Alice", "alain", "Zoe"] {
        repo.save(&Author::new(name)).unwrap();
    }

    let expected = ["alain", "Alice", "bob", "Zoe"];
    assert_eq!(names(repo.all().unwrap()), expected);
    assert_eq!(names(repo.search_by_name("").unwrap()), expected);
}

fn names(authors: Vec<Author>) -> Vec<String> {
    authors.into_iter().map(|author| author.full_name).collect()
}

fn sample_book(title: &str) -> Book {
    Book::new(title, 9782070360024, "Gallimard", 1972, Language::French)
}
