use crate::chain::Name;
use crate::cursor::{Cursor, CURSOR_MAGIC};
use crate::errors::CursorError;
use crate::Facet;

fn facet(account: &str) -> Facet {
    Facet::Account(account.parse::<Name>().unwrap())
}

#[test]
fn opaque_cursor_round_trip() {
    let cursor = Cursor::new(&facet("alice"), 2, 40);

    let opaque = cursor.to_opaque().unwrap();
    assert!(opaque
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));

    let decoded = Cursor::from_opaque_for(&opaque, &facet("alice")).unwrap();
    assert_eq!(decoded, cursor);
    assert_eq!(decoded.magic, CURSOR_MAGIC);
}

#[test]
fn cursor_with_another_magic_is_rejected() {
    let mut cursor = Cursor::new(&facet("alice"), 0, 1);
    cursor.magic = 1234;

    let opaque = cursor.to_opaque().unwrap();

    assert!(matches!(
        Cursor::from_opaque(&opaque),
        Err(CursorError::InvalidMagic(1234))
    ));
}

#[test]
fn cursor_of_another_facet_is_rejected() {
    let opaque = Cursor::new(&facet("alice"), 0, 1).to_opaque().unwrap();

    assert!(matches!(
        Cursor::from_opaque_for(&opaque, &facet("bob")),
        Err(CursorError::KeyMismatch)
    ));
}

#[test]
fn garbage_is_rejected() {
    assert!(matches!(
        Cursor::from_opaque("!!!"),
        Err(CursorError::Base64(_))
    ));
    assert!(matches!(
        Cursor::from_opaque("AAAA"),
        Err(CursorError::Malformed(_))
    ));
}
