use rusqlite::Connection;
use wishlist_core::db::open_db_in_memory;
use wishlist_core::{
    KnownSecrets, SqliteWishRepository, WishFields, WishId, WishService, WishServiceError, WishStats,
    WishView,
};

struct Fixture {
    a: WishId,
    b: WishId,
    c: WishId,
    secret: String,
}

fn seed(service: &WishService<SqliteWishRepository<'_>>) -> Fixture {
    let a = service.add(&WishFields::new("A", 3)).unwrap().id();
    let b = service.add(&WishFields::new("B", 5)).unwrap().id();
    let c = service.add(&WishFields::new("C", 1)).unwrap().id();
    let secret = service.fulfill(c, "Anna").unwrap().secret().to_string();
    Fixture { a, b, c, secret }
}

fn ids(views: &[WishView]) -> Vec<WishId> {
    views.iter().map(|view| view.wish.id()).collect()
}

fn service(conn: &Connection) -> WishService<SqliteWishRepository<'_>> {
    WishService::new(SqliteWishRepository::try_new(conn).unwrap())
}

#[test]
fn regular_order_puts_fulfilled_last_regardless_of_known_secrets() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let f = seed(&service);

    let anonymous = service
        .priority_ordered_wishes(&KnownSecrets::new())
        .unwrap();
    assert_eq!(ids(&anonymous), vec![f.b, f.a, f.c]);
    assert_eq!(anonymous[2].visible_giver(), Some("Anna"));

    let known: KnownSecrets = [f.secret.as_str()].into_iter().collect();
    let own = service.priority_ordered_wishes(&known).unwrap();
    assert_eq!(ids(&own), vec![f.b, f.a, f.c]);
    assert!(own[2].is_own);
}

#[test]
fn no_spoiler_order_promotes_own_wishes_only() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let f = seed(&service);

    let anonymous = service
        .priority_ordered_wishes_no_spoiler(&KnownSecrets::new())
        .unwrap();
    assert_eq!(ids(&anonymous), vec![f.b, f.a, f.c]);
    assert!(anonymous.iter().all(|view| !view.shows_fulfillment()));

    let known: KnownSecrets = [f.secret.as_str()].into_iter().collect();
    let own = service.priority_ordered_wishes_no_spoiler(&known).unwrap();
    assert_eq!(ids(&own), vec![f.c, f.b, f.a]);
    assert_eq!(own[0].visible_giver(), Some("Anna"));
}

#[test]
fn stale_known_secret_after_undo_is_ignored() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let f = seed(&service);

    service.undo(&f.secret).unwrap();
    let known: KnownSecrets = [f.secret.as_str()].into_iter().collect();
    let ordered = service.priority_ordered_wishes_no_spoiler(&known).unwrap();
    assert_eq!(ids(&ordered), vec![f.b, f.a, f.c]);
    assert!(ordered.iter().all(|view| !view.is_own));
}

#[test]
fn deleted_wishes_are_not_listed() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let f = seed(&service);

    service.soft_delete(Some(f.b), None).unwrap();
    let known: KnownSecrets = [f.secret.as_str()].into_iter().collect();

    let regular = service.priority_ordered_wishes(&known).unwrap();
    assert_eq!(ids(&regular), vec![f.a, f.c]);
    let no_spoiler = service.priority_ordered_wishes_no_spoiler(&known).unwrap();
    assert_eq!(ids(&no_spoiler), vec![f.c, f.a]);
}

#[test]
fn stats_count_active_fulfilled_and_deleted() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let mut ids = Vec::new();
    for (title, priority) in [("a", 1), ("b", 2), ("c", 3), ("d", 4), ("e", 5), ("f", 2)] {
        ids.push(service.add(&WishFields::new(title, priority)).unwrap().id());
    }
    service.fulfill(ids[0], "Anna").unwrap();
    service.fulfill(ids[4], "Ben").unwrap();
    service.soft_delete(Some(ids[4]), None).unwrap();
    service.soft_delete(Some(ids[5]), None).unwrap();

    assert_eq!(
        service.stats().unwrap(),
        WishStats {
            count: 4,
            fulfilled: 1,
            nr_deleted: 2,
        }
    );
}

#[test]
fn single_wish_view_hides_foreign_giver() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let f = seed(&service);

    let anonymous = service.wish_view(f.c, &KnownSecrets::new()).unwrap();
    assert!(anonymous.spoiler_free);
    assert!(!anonymous.shows_fulfillment());
    assert_eq!(anonymous.visible_giver(), None);

    let known: KnownSecrets = [f.secret.as_str()].into_iter().collect();
    let own = service.wish_view(f.c, &known).unwrap();
    assert!(own.is_own);
    assert_eq!(own.visible_giver(), Some("Anna"));

    service.soft_delete(Some(f.a), None).unwrap();
    let err = service.wish_view(f.a, &KnownSecrets::new()).unwrap_err();
    assert!(matches!(err, WishServiceError::NotFound(_)));
}
