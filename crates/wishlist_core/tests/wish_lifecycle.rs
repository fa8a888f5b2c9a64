use std::sync::{Arc, Barrier};
use std::thread;
use wishlist_core::db::{open_db, open_db_in_memory};
use wishlist_core::{
    SqliteWishRepository, WishFields, WishKey, WishService, WishServiceError, WishValidationError,
};

#[test]
fn fulfill_then_undo_reopens_and_invalidates_secret() {
    let conn = open_db_in_memory().unwrap();
    let service = WishService::new(SqliteWishRepository::try_new(&conn).unwrap());

    let wish = service.add(&WishFields::new("Buch", 3)).unwrap();
    let fulfilled = service.fulfill(wish.id(), "Anna").unwrap();
    let secret = fulfilled.secret().to_string();
    assert_eq!(service.get_id_by_secret(&secret).unwrap(), wish.id());

    let reopened = service.undo(&secret).unwrap();
    assert!(!reopened.is_fulfilled());
    assert!(!service.get_wish_by_id(wish.id()).unwrap().is_fulfilled());

    let err = service.reopen(wish.id(), &secret).unwrap_err();
    assert!(matches!(err, WishServiceError::SecretMismatch(Some(id)) if id == wish.id()));
}

#[test]
fn undo_with_used_undo_link_is_a_secret_mismatch() {
    let conn = open_db_in_memory().unwrap();
    let service = WishService::new(SqliteWishRepository::try_new(&conn).unwrap());

    let wish = service.add(&WishFields::new("Buch", 3)).unwrap();
    let secret = service.fulfill(wish.id(), "Anna").unwrap().secret().to_string();
    service.undo(&secret).unwrap();

    let err = service.undo(&secret).unwrap_err();
    assert_eq!(err.code(), "secret_mismatch");
    assert!(matches!(err, WishServiceError::SecretMismatch(None)));

    let refulfilled = service.fulfill(wish.id(), "Ben").unwrap();
    let err = service.undo(&secret).unwrap_err();
    assert_eq!(err.code(), "secret_mismatch");
    assert_eq!(
        service.get_wish_by_id(wish.id()).unwrap().secret(),
        refulfilled.secret()
    );
}

#[test]
fn undo_with_never_issued_link_is_a_secret_mismatch() {
    let conn = open_db_in_memory().unwrap();
    let service = WishService::new(SqliteWishRepository::try_new(&conn).unwrap());
    service.add(&WishFields::new("Buch", 3)).unwrap();

    for link in ["made-up-link", ""] {
        let err = service.undo(link).unwrap_err();
        assert!(matches!(err, WishServiceError::SecretMismatch(None)));
    }
}

#[test]
fn id_lookup_by_unknown_secret_stays_not_found() {
    let conn = open_db_in_memory().unwrap();
    let service = WishService::new(SqliteWishRepository::try_new(&conn).unwrap());

    let wish = service.add(&WishFields::new("Buch", 3)).unwrap();
    let secret = service.fulfill(wish.id(), "Anna").unwrap().secret().to_string();
    service.undo(&secret).unwrap();

    let err = service.get_id_by_secret(&secret).unwrap_err();
    assert!(matches!(err, WishServiceError::NotFound(WishKey::Secret(_))));
}

#[test]
fn second_fulfillment_is_rejected_and_first_giver_kept() {
    let conn = open_db_in_memory().unwrap();
    let service = WishService::new(SqliteWishRepository::try_new(&conn).unwrap());

    let wish = service.add(&WishFields::new("Buch", 3)).unwrap();
    let first = service.fulfill(wish.id(), "Anna").unwrap();

    let err = service.fulfill(wish.id(), "Ben").unwrap_err();
    assert!(matches!(err, WishServiceError::WishFulfilled(id) if id == wish.id()));
    assert_eq!(err.code(), "wish_fulfilled");

    let stored = service.get_wish_by_id(wish.id()).unwrap();
    assert_eq!(stored.giver(), "Anna");
    assert_eq!(stored.secret(), first.secret());
}

#[test]
fn reopen_with_wrong_or_empty_secret_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let service = WishService::new(SqliteWishRepository::try_new(&conn).unwrap());

    let open = service.add(&WishFields::new("offen", 2)).unwrap();
    let err = service.reopen(open.id(), "").unwrap_err();
    assert!(matches!(err, WishServiceError::SecretMismatch(_)));

    let claimed = service.add(&WishFields::new("vergeben", 2)).unwrap();
    service.fulfill(claimed.id(), "Anna").unwrap();
    let err = service.reopen(claimed.id(), "guess").unwrap_err();
    assert!(matches!(err, WishServiceError::SecretMismatch(_)));
    assert!(service.get_wish_by_id(claimed.id()).unwrap().is_fulfilled());
}

#[test]
fn endless_wishes_cannot_be_fulfilled() {
    let conn = open_db_in_memory().unwrap();
    let service = WishService::new(SqliteWishRepository::try_new(&conn).unwrap());

    let wish = service
        .add(&WishFields::new("Schokolade", 1).endless(true))
        .unwrap();
    let err = service.fulfill(wish.id(), "Anna").unwrap_err();
    assert!(matches!(err, WishServiceError::EndlessWish(_)));

    let err = service
        .add(&WishFields::new("Kaffee", 1).endless(true).with_giver("Anna"))
        .unwrap_err();
    assert!(matches!(
        err,
        WishServiceError::Validation(WishValidationError::EndlessFulfilled)
    ));
}

#[test]
fn fulfilling_missing_or_deleted_wish_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let service = WishService::new(SqliteWishRepository::try_new(&conn).unwrap());

    let err = service.fulfill(99, "Anna").unwrap_err();
    assert!(matches!(err, WishServiceError::NotFound(WishKey::Id(99))));

    let wish = service.add(&WishFields::new("weg", 2)).unwrap();
    service.soft_delete(Some(wish.id()), None).unwrap();
    let err = service.fulfill(wish.id(), "Anna").unwrap_err();
    assert!(matches!(err, WishServiceError::NotFound(_)));
}

#[test]
fn blank_giver_is_a_validation_error() {
    let conn = open_db_in_memory().unwrap();
    let service = WishService::new(SqliteWishRepository::try_new(&conn).unwrap());

    let wish = service.add(&WishFields::new("Buch", 2)).unwrap();
    let err = service.fulfill(wish.id(), "  ").unwrap_err();
    assert!(matches!(
        err,
        WishServiceError::Validation(WishValidationError::BlankGiver)
    ));
}

#[test]
fn delete_and_restore_require_exactly_one_identifier() {
    let conn = open_db_in_memory().unwrap();
    let service = WishService::new(SqliteWishRepository::try_new(&conn).unwrap());
    let wish = service.add(&WishFields::new("Buch", 2)).unwrap();

    let err = service.soft_delete(None, None).unwrap_err();
    assert!(matches!(err, WishServiceError::InvalidArgument(_)));
    let err = service.soft_delete(Some(wish.id()), Some("abc")).unwrap_err();
    assert!(matches!(err, WishServiceError::InvalidArgument(_)));
    let err = service.restore(None, Some("")).unwrap_err();
    assert!(matches!(err, WishServiceError::InvalidArgument(_)));

    assert!(!service.get_wish_by_id(wish.id()).unwrap().is_deleted());
}

#[test]
fn undo_still_works_after_soft_delete_and_restore_by_secret() {
    let conn = open_db_in_memory().unwrap();
    let service = WishService::new(SqliteWishRepository::try_new(&conn).unwrap());

    let wish = service.add(&WishFields::new("Buch", 2)).unwrap();
    let secret = service.fulfill(wish.id(), "Anna").unwrap().secret().to_string();

    service.soft_delete(None, Some(&secret)).unwrap();
    assert!(service.list_active().unwrap().is_empty());
    assert_eq!(service.list_deleted().unwrap().len(), 1);

    let reopened = service.undo(&secret).unwrap();
    assert!(reopened.is_deleted());
    assert!(!reopened.is_fulfilled());

    service.restore(Some(wish.id()), None).unwrap();
    assert_eq!(service.list_active().unwrap().len(), 1);
}

#[test]
fn seed_defaults_only_fills_empty_list() {
    let conn = open_db_in_memory().unwrap();
    let service = WishService::new(SqliteWishRepository::try_new(&conn).unwrap());

    assert_eq!(service.seed_defaults().unwrap(), 3);
    assert_eq!(service.seed_defaults().unwrap(), 0);

    let titles: Vec<String> = service
        .list_active()
        .unwrap()
        .iter()
        .map(|wish| wish.title().to_string())
        .collect();
    assert_eq!(titles, vec!["Shenanigans", "Weltfrieden", "Wäre ganz nett"]);
}

#[test]
fn concurrent_fulfillment_has_exactly_one_winner() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("wishes.sqlite3");

    let wish_id = {
        let conn = open_db(&path).unwrap();
        let service = WishService::new(SqliteWishRepository::try_new(&conn).unwrap());
        service.add(&WishFields::new("Fahrrad", 5)).unwrap().id()
    };

    let barrier = Arc::new(Barrier::new(2));
    let handles: Vec<_> = ["Anna", "Ben"]
        .into_iter()
        .map(|giver| {
            let path = path.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let conn = open_db(&path).unwrap();
                let service = WishService::new(SqliteWishRepository::try_new(&conn).unwrap());
                barrier.wait();
                service.fulfill(wish_id, giver).map(|wish| wish.giver().to_string())
            })
        })
        .collect();

    let results: Vec<_> = handles
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .collect();

    let winners: Vec<&String> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
    assert_eq!(winners.len(), 1, "results: {results:?}");
    assert!(results.iter().any(|result| matches!(
        result,
        Err(WishServiceError::WishFulfilled(id)) if *id == wish_id
    )));

    let conn = open_db(&path).unwrap();
    let service = WishService::new(SqliteWishRepository::try_new(&conn).unwrap());
    assert_eq!(
        service.get_wish_by_id(wish_id).unwrap().giver(),
        winners[0].as_str()
    );
}
