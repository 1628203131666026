use chrono::{NaiveDate, TimeZone, Utc};
use library_core::{Author, Book, Borrow, Language, Librarian, User};
use serde_json::json;
use uuid::Uuid;

#[test]
fn book_uses_snake_case_language() {
    let mut book = Book::new("Dune", 9780441013593, "Ace", 1965, Language::English);
    book.add_author(7);

    let value = serde_json::to_value(&book).unwrap();
    assert_eq!(
        value,
        json!({
            "id": null,
            "title": "Dune",
            "isbn": 9780441013593u64,
            "publisher": "Ace",
            "year": 1965,
            "language": "english",
            "authors": [7],
        })
    );

    let parsed: Book = serde_json::from_value(value).unwrap();
    assert_eq!(parsed, book);
}

#[test]
fn unknown_language_is_rejected() {
    let err = serde_json::from_value::<Language>(json!("german")).unwrap_err();
    assert!(err.to_string().contains("german"));
}

#[test]
fn borrow_serializes_ids_and_instant() {
    let borrower = Uuid::new_v4();
    let librarian = Uuid::new_v4();
    let due = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
    let borrow = Borrow::new(borrower, librarian, [3, 1], due);

    let value = serde_json::to_value(&borrow).unwrap();
    assert_eq!(value["borrower"], json!(borrower.to_string()));
    assert_eq!(value["librarian"], json!(librarian.to_string()));
    assert_eq!(value["books"], json!([1, 3]));
    assert_eq!(value["requested_return"], json!("2024-03-01T12:00:00Z"));
    assert_eq!(value["finished"], json!(false));
}

#[test]
fn people_and_authors_use_field_names() {
    let user = User::new("Jeanne", "Martin", NaiveDate::from_ymd_opt(1990, 4, 2).unwrap());
    let value = serde_json::to_value(&user).unwrap();
    assert_eq!(value["first_name"], json!("Jeanne"));
    assert_eq!(value["birth"], json!("1990-04-02"));

    let librarian = Librarian::new("Claire", "Petit");
    assert_eq!(
        serde_json::to_value(&librarian).unwrap()["last_name"],
        json!("Petit")
    );

    let author = Author::new("Victor Hugo");
    assert_eq!(
        serde_json::to_value(&author).unwrap(),
        json!({ "id": null, "full_name": "Victor Hugo" })
    );
}
