mod common;

use assert_matches::assert_matches;
use common::{day, seed_item, seed_reservation, setup};
use gearbook_api::entities::reservation::ReservationStatus;
use gearbook_api::errors::ServiceError;
use gearbook_api::services::cart::{CartLine, CartService};
use uuid::Uuid;

fn line(item_id: Uuid, quantity: i32, start: i64, end: i64) -> CartLine {
    CartLine {
        item_id,
        quantity,
        start_date: day(start),
        start_time: None,
        end_date: day(end),
        end_time: None,
    }
}

#[tokio::test]
async fn adding_within_availability_succeeds() {
    let ctx = setup().await;
    let item = seed_item(&ctx.db, "Camera X", Some(3)).await;
    let user = Uuid::new_v4();

    let cart = ctx
        .services
        .cart
        .add(user, line(item.id, 2, 1, 5))
        .await
        .unwrap();
    assert_eq!(cart.len(), 1);
    assert_eq!(cart.lines()[0].quantity, 2);
}

#[tokio::test]
async fn identical_slot_is_replaced_not_duplicated() {
    let ctx = setup().await;
    let item = seed_item(&ctx.db, "Camera X", Some(3)).await;
    let user = Uuid::new_v4();

    ctx.services.cart.add(user, line(item.id, 1, 1, 5)).await.unwrap();
    let cart = ctx
        .services
        .cart
        .add(user, line(item.id, 3, 1, 5))
        .await
        .unwrap();

    assert_eq!(cart.len(), 1);
    assert_eq!(cart.lines()[0].quantity, 3);
}

#[tokio::test]
async fn overlapping_cart_lines_share_the_budget() {
    let ctx = setup().await;
    let item = seed_item(&ctx.db, "Camera X", Some(3)).await;
    let user = Uuid::new_v4();

    ctx.services.cart.add(user, line(item.id, 2, 1, 5)).await.unwrap();

    // A second overlapping interval may only claim what is left.
    assert_matches!(
        ctx.services.cart.add(user, line(item.id, 2, 4, 8)).await,
        Err(ServiceError::InsufficientStock(_))
    );
    ctx.services.cart.add(user, line(item.id, 1, 4, 8)).await.unwrap();

    // A disjoint interval gets the full stock again.
    ctx.services.cart.add(user, line(item.id, 3, 9, 12)).await.unwrap();
}

#[tokio::test]
async fn server_reservations_reduce_what_the_cart_can_hold() {
    let ctx = setup().await;
    let item = seed_item(&ctx.db, "Camera X", Some(2)).await;
    seed_reservation(
        &ctx.db,
        Uuid::new_v4(),
        item.id,
        1,
        day(1),
        day(5),
        ReservationStatus::Approved,
    )
    .await;

    let user = Uuid::new_v4();
    assert_eq!(
        ctx.services
            .cart
            .offerable(user, item.id, day(1), day(5))
            .await
            .unwrap(),
        1
    );
    assert_matches!(
        ctx.services.cart.add(user, line(item.id, 2, 1, 5)).await,
        Err(ServiceError::InsufficientStock(_))
    );
}

#[tokio::test]
async fn carts_are_per_user() {
    let ctx = setup().await;
    let item = seed_item(&ctx.db, "Camera X", Some(2)).await;
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();

    ctx.services.cart.add(alice, line(item.id, 2, 1, 5)).await.unwrap();

    // Bob's cart does not see Alice's draft claims; the cart is advisory
    // and holds no stock server-side.
    ctx.services.cart.add(bob, line(item.id, 2, 1, 5)).await.unwrap();
    assert_eq!(ctx.services.cart.get(alice).len(), 1);
    assert_eq!(ctx.services.cart.get(bob).len(), 1);
}

#[tokio::test]
async fn remove_and_clear() {
    let ctx = setup().await;
    let item = seed_item(&ctx.db, "Camera X", Some(3)).await;
    let user = Uuid::new_v4();

    // Removing from a user with no cart is a plain miss.
    assert_matches!(
        ctx.services.cart.remove(user, item.id, day(1), day(5)),
        Err(ServiceError::NotFound(_))
    );

    ctx.services.cart.add(user, line(item.id, 1, 1, 5)).await.unwrap();
    ctx.services.cart.add(user, line(item.id, 1, 6, 8)).await.unwrap();

    let cart = ctx.services.cart.remove(user, item.id, day(1), day(5)).unwrap();
    assert_eq!(cart.len(), 1);

    assert_matches!(
        ctx.services.cart.remove(user, item.id, day(1), day(5)),
        Err(ServiceError::NotFound(_))
    );

    ctx.services.cart.clear(user);
    assert!(ctx.services.cart.get(user).is_empty());
}

#[tokio::test]
async fn snapshot_and_restore_round_trip() {
    let ctx = setup().await;
    let item = seed_item(&ctx.db, "Camera X", Some(3)).await;
    let user = Uuid::new_v4();

    ctx.services.cart.add(user, line(item.id, 2, 1, 5)).await.unwrap();
    let snapshot = ctx.services.cart.snapshot(user).unwrap();

    // Simulate a new session.
    ctx.services.cart.clear(user);
    assert!(ctx.services.cart.get(user).is_empty());

    let restored = ctx.services.cart.restore(user, snapshot).unwrap();
    assert_eq!(restored.len(), 1);
    assert_eq!(restored.lines()[0].quantity, 2);
}

#[tokio::test]
async fn malformed_snapshot_is_rejected() {
    let ctx = setup().await;
    let user = Uuid::new_v4();

    assert_matches!(
        ctx.services
            .cart
            .restore(user, serde_json::json!({"lines": "nope"})),
        Err(ServiceError::InvalidInput(_))
    );
    assert_matches!(
        ctx.services.cart.restore(
            user,
            serde_json::json!({"lines": [{"item_id": "not-a-uuid"}]})
        ),
        Err(ServiceError::InvalidInput(_))
    );
}

#[tokio::test]
async fn capacity_bounds_the_cart() {
    let ctx = setup().await;
    let item = seed_item(&ctx.db, "Camera X", Some(10)).await;
    let user = Uuid::new_v4();

    let small = CartService::new(ctx.services.availability.clone(), 2);
    small.add(user, line(item.id, 1, 1, 2)).await.unwrap();
    small.add(user, line(item.id, 1, 3, 4)).await.unwrap();

    assert_matches!(
        small.add(user, line(item.id, 1, 5, 6)).await,
        Err(ServiceError::ValidationError(_))
    );

    // Replacing an existing slot is still allowed at capacity.
    let cart = small.add(user, line(item.id, 2, 1, 2)).await.unwrap();
    assert_eq!(cart.len(), 2);
    assert_eq!(cart.lines()[0].quantity, 2);
}
