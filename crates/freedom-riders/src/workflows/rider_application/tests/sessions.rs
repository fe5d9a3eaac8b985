use super::common::*;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::workflows::rider_application::{FormSessionStore, SessionId};

fn store() -> FormSessionStore<StubIntake> {
    FormSessionStore::new(Arc::new(StubIntake::default()))
}

async fn opened_id(store: &FormSessionStore<StubIntake>) -> SessionId {
    let session = store.open().await;
    let id = session.lock().await.id.clone();
    id
}

fn uuid_of(id: &SessionId) -> Uuid {
    let suffix = id.0.strip_prefix("form-").expect("form- prefix");
    Uuid::parse_str(suffix).expect("uuid suffix")
}

#[tokio::test]
async fn session_ids_are_random_rather_than_sequential() {
    let store = store();
    let first = uuid_of(&opened_id(&store).await);
    let second = uuid_of(&opened_id(&store).await);

    assert_ne!(first, second);
    assert_eq!(first.get_version_num(), 4);
    assert_eq!(second.get_version_num(), 4);

    let step = first.as_u128().abs_diff(second.as_u128());
    assert!(step > 1, "ids one counter step apart: {first} / {second}");
}

#[tokio::test]
async fn purge_drops_forms_not_seen_since_the_cutoff() {
    let store = store();
    let id = opened_id(&store).await;
    opened_id(&store).await;

    assert_eq!(
        store
            .purge_idle_before(Utc::now() - chrono::Duration::minutes(5))
            .await,
        0
    );
    assert_eq!(store.len().await, 2);

    assert_eq!(
        store
            .purge_idle_before(Utc::now() + chrono::Duration::seconds(1))
            .await,
        2
    );
    assert!(store.is_empty().await);
    assert!(store.get(&id).await.is_err());
}

#[tokio::test]
async fn lookups_keep_a_form_alive() {
    let store = store();
    let touched = opened_id(&store).await;
    let abandoned = opened_id(&store).await;

    tokio::time::sleep(Duration::from_millis(20)).await;
    let midpoint = Utc::now();
    tokio::time::sleep(Duration::from_millis(20)).await;
    store.get(&touched).await.expect("open form");

    assert_eq!(store.purge_idle_before(midpoint).await, 1);
    assert!(store.get(&touched).await.is_ok());
    assert!(store.get(&abandoned).await.is_err());
}

#[tokio::test]
async fn purge_idle_measures_from_now() {
    let store = store();
    opened_id(&store).await;

    assert_eq!(store.purge_idle(Duration::from_secs(30 * 60)).await, 0);
    assert_eq!(store.len().await, 1);

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(store.purge_idle(Duration::from_millis(5)).await, 1);
    assert!(store.is_empty().await);
}
