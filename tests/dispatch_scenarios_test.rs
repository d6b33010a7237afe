use anyhow::Result;
use delivery_dispatch::app::commands::{
    AssignOrdersHandler, AssignmentOutcome, MoveCouriersHandler, MovementOutcome, NothingToAssign,
};
use delivery_dispatch::domain::ports::{CourierRepository, OrderRepository, UnitOfWork};
use delivery_dispatch::{Courier, CourierStatus, InMemoryStore, Location, Order, OrderStatus, Transport};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

fn loc(x: i32, y: i32) -> Location {
    Location::new(x, y).expect("on grid")
}

async fn seed(store: &InMemoryStore, couriers: &[Courier], orders: &[Order]) -> Result<()> {
    let session = store.session();
    for courier in couriers {
        session.couriers().add(courier.clone()).await?;
    }
    for order in orders {
        session.orders().add(order.clone()).await?;
    }
    session.unit_of_work().save_all(&CancellationToken::new()).await?;
    Ok(())
}

async fn assign(store: &InMemoryStore) -> Result<AssignmentOutcome> {
    let session = store.session();
    let handler = AssignOrdersHandler::new(session.orders(), session.couriers(), session.unit_of_work());
    Ok(handler.handle(&CancellationToken::new()).await?)
}

async fn tick(store: &InMemoryStore) -> Result<MovementOutcome> {
    let session = store.session();
    let handler = MoveCouriersHandler::new(session.orders(), session.couriers(), session.unit_of_work());
    Ok(handler.handle(&CancellationToken::new()).await?)
}

/// Kate(1,1,bicycle)、Jack(2,2,car)、Bob(3,3,pedestrian)，訂單在 (5,5)：Jack 最快
#[tokio::test]
async fn test_fastest_courier_gets_the_order_and_delivers_it() -> Result<()> {
    let store = InMemoryStore::new();
    let kate = Courier::create("Kate", Transport::Bicycle, loc(1, 1))?;
    let jack = Courier::create("Jack", Transport::Car, loc(2, 2))?;
    let bob = Courier::create("Bob", Transport::Pedestrian, loc(3, 3))?;
    let order = Order::create(Uuid::new_v4(), loc(5, 5))?;
    seed(&store, &[kate.clone(), jack.clone(), bob.clone()], &[order.clone()]).await?;

    assert_eq!(assign(&store).await?.assigned_count(), 1);
    assert_eq!(
        store.committed_order(order.id()).await.map(|o| o.courier_id()),
        Some(Some(jack.id()))
    );

    // Jack: (2,2) → (5,2) → (5,5)
    let mut path = Vec::new();
    loop {
        let outcome = tick(&store).await?;
        let jack_now = store.committed_courier(jack.id()).await.expect("jack exists");
        path.push(jack_now.location());
        if outcome.delivered_count() == 1 {
            break;
        }
        assert!(path.len() < 10, "courier never arrived");
    }
    assert_eq!(path, vec![loc(5, 2), loc(5, 5)]);

    let jack = store.committed_courier(jack.id()).await.expect("jack exists");
    assert_eq!(jack.status(), CourierStatus::Free);
    assert_eq!(
        store.committed_order(order.id()).await.map(|o| o.status()),
        Some(OrderStatus::Completed)
    );

    // 其他快遞員沒被動到
    assert_eq!(store.committed_courier(kate.id()).await, Some(kate));
    assert_eq!(store.committed_courier(bob.id()).await, Some(bob));
    Ok(())
}

#[tokio::test]
async fn test_bicycle_follows_x_then_y_across_ticks() -> Result<()> {
    let store = InMemoryStore::new();
    let rider = Courier::create("Rider", Transport::Bicycle, loc(1, 1))?;
    let order = Order::create(Uuid::new_v4(), loc(5, 5))?;
    seed(&store, &[rider.clone()], &[order.clone()]).await?;
    assign(&store).await?;

    let mut path = Vec::new();
    for _ in 0..4 {
        tick(&store).await?;
        path.push(store.committed_courier(rider.id()).await.expect("rider").location());
    }
    assert_eq!(path, vec![loc(3, 1), loc(5, 1), loc(5, 3), loc(5, 5)]);
    assert_eq!(
        store.committed_order(order.id()).await.map(|o| o.status()),
        Some(OrderStatus::Completed)
    );
    assert!(tick(&store).await?.is_noop());
    Ok(())
}

#[tokio::test]
async fn test_one_courier_is_never_double_booked() -> Result<()> {
    let store = InMemoryStore::new();
    let only = Courier::create("Only", Transport::Car, loc(5, 5))?;
    let first = Order::create(Uuid::new_v4(), loc(5, 5))?;
    let second = Order::create(Uuid::new_v4(), loc(5, 6))?;
    seed(&store, &[only.clone()], &[first.clone(), second.clone()]).await?;

    let AssignmentOutcome::Committed(report) = assign(&store).await? else {
        anyhow::bail!("expected a committed cycle");
    };
    assert_eq!(report.assignments.len(), 1);
    assert_eq!(report.unmatched, vec![second.id()]);

    // 下一輪沒有空閒快遞員
    assert_eq!(
        assign(&store).await?,
        AssignmentOutcome::NothingToAssign(NothingToAssign::NoFreeCouriers)
    );

    // 送完第一單後，第二單才會被指派
    tick(&store).await?;
    assert_eq!(assign(&store).await?.assigned_count(), 1);
    assert_eq!(
        store.committed_order(second.id()).await.map(|o| o.courier_id()),
        Some(Some(only.id()))
    );
    Ok(())
}

#[tokio::test]
async fn test_assignment_and_movement_can_interleave() -> Result<()> {
    let store = InMemoryStore::new();
    let near = Courier::create("Near", Transport::Pedestrian, loc(2, 1))?;
    let far = Courier::create("Far", Transport::Car, loc(10, 10))?;
    let order_a = Order::create(Uuid::new_v4(), loc(1, 1))?;
    seed(&store, &[near.clone(), far.clone()], &[order_a.clone()]).await?;
    assign(&store).await?;

    // 新訂單在移動循環執行的同時進來
    let order_b = Order::create(Uuid::new_v4(), loc(9, 9))?;
    seed(&store, &[], &[order_b.clone()]).await?;
    let (moved, assigned) = tokio::join!(tick(&store), assign(&store));
    assert_eq!(moved?.delivered_count(), 1);
    assert_eq!(assigned?.assigned_count(), 1);

    assert_eq!(
        store.committed_order(order_a.id()).await.map(|o| o.status()),
        Some(OrderStatus::Completed)
    );
    assert_eq!(
        store.committed_order(order_b.id()).await.map(|o| o.courier_id()),
        Some(Some(far.id()))
    );
    Ok(())
}
