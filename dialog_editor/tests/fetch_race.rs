//! Overlapping cursor moves whose fetches resolve out of order.

mod common;

use common::{create_detached_dialog, seed_step, GatedGateway};
use dialog_editor::{Cursor, CursorPhase, EditorSession, FetchOutcome, GatewayCall};
use dialog_model::{DialogId, NewDialog};
use std::sync::Arc;

async fn seeded_session() -> (Arc<GatedGateway>, EditorSession<GatedGateway>, DialogId) {
    let gateway = Arc::new(GatedGateway::new());
    let session = EditorSession::with_defaults(gateway.clone());
    let dialog = session
        .create_dialog(NewDialog::new("D1", "d1", "/tmp/d1", []))
        .await
        .unwrap();
    let id = dialog.id.unwrap();
    seed_step(&gateway.inner, &id, "main", 1, "step one").await;
    seed_step(&gateway.inner, &id, "main", 2, "step two").await;
    (gateway, session, id)
}

async fn wait_for_fetches(gateway: &GatedGateway, count: usize) {
    while gateway.inner.call_count(GatewayCall::TryLoadStep) < count {
        tokio::task::yield_now().await;
    }
}

#[tokio::test]
async fn test_newer_response_first_then_stale() {
    let (gateway, session, _id) = seeded_session().await;
    let fetched = gateway.inner.call_count(GatewayCall::TryLoadStep);
    gateway.hold_steps();

    let (first, second, ()) = tokio::join!(
        session.change_counter(1),
        session.change_counter(2),
        async {
            gateway.wait_for_parked(2).await;
            gateway.release_counter(2);
            wait_for_fetches(&gateway, fetched + 1).await;
            gateway.release_counter(1);
        }
    );

    assert!(matches!(first.unwrap(), FetchOutcome::Stale { .. }));
    assert!(second.unwrap().is_applied());

    let draft = session.navigator().draft();
    assert_eq!(draft.text, "step two");
    assert_eq!(draft.coordinate.unwrap().counter, 2);
    assert_eq!(session.cursor(), Some(Cursor::new("main", 2)));
    assert_eq!(session.navigator().phase(), CursorPhase::Loaded);
}

#[tokio::test]
async fn test_older_response_first_is_still_discarded() {
    let (gateway, session, _id) = seeded_session().await;
    let fetched = gateway.inner.call_count(GatewayCall::TryLoadStep);
    gateway.hold_steps();

    let (first, second, ()) = tokio::join!(
        session.change_counter(1),
        session.change_counter(2),
        async {
            gateway.wait_for_parked(2).await;
            gateway.release_counter(1);
            wait_for_fetches(&gateway, fetched + 1).await;
            gateway.release_counter(2);
        }
    );

    assert!(matches!(first.unwrap(), FetchOutcome::Stale { .. }));
    assert!(second.unwrap().is_applied());

    let draft = session.navigator().draft();
    assert_eq!(draft.text, "step two");
    assert_eq!(draft.coordinate.unwrap().counter, 2);
}

#[tokio::test]
async fn test_cursor_resets_before_new_dialog_fetch() {
    let (gateway, session, d1) = seeded_session().await;
    session.change_counter(2).await.unwrap();

    let d2 = create_detached_dialog(&gateway.inner, "D2").await;
    gateway.hold_steps();

    let (selected, ()) = tokio::join!(session.select_dialog(&d2), async {
        gateway.wait_for_parked(1).await;

        // The fetch for D2 is parked: the cursor must already be back at start.
        assert_eq!(session.cursor(), Some(Cursor::start()));
        assert!(matches!(
            session.navigator().phase(),
            CursorPhase::Pending { .. }
        ));
        let parked = gateway.parked();
        assert_eq!(parked[0].dialog_id, d2);
        assert_eq!(parked[0].label, "main");
        assert_eq!(parked[0].counter, 0);

        gateway.release_oldest();
    });

    let selected = selected.unwrap();
    assert_ne!(selected.id, Some(d1));
    let draft = session.navigator().draft();
    assert_eq!(draft.coordinate.unwrap().dialog_id, d2);
}

#[tokio::test]
async fn test_fetch_for_previous_dialog_never_lands() {
    let (gateway, session, _d1) = seeded_session().await;
    let d2 = create_detached_dialog(&gateway.inner, "D2").await;
    seed_step(&gateway.inner, &d2, "main", 0, "d2 opening").await;
    gateway.hold_steps();

    let (moved, selected, ()) = tokio::join!(
        session.change_counter(1),
        session.select_dialog(&d2),
        async {
            gateway.wait_for_parked(2).await;
            gateway.release_oldest();
            gateway.release_oldest();
        }
    );

    assert!(matches!(moved.unwrap(), FetchOutcome::Stale { .. }));
    selected.unwrap();

    let draft = session.navigator().draft();
    assert_eq!(draft.text, "d2 opening");
    assert_eq!(draft.coordinate.unwrap().dialog_id, d2);
}
