use packlist_core::gesture::{GestureConfig, GestureIntent, Point, PointerKind, Rect};
use packlist_core::item::{NO_TEMPLATE_ID, PackListState};
use packlist_core::persistence::{
    FileStorage, LoadOutcome, MemoryStorage, PersistenceGateway, STATE_KEY, Storage,
};
use packlist_core::reducer::{Action, FixedEnvironment, reduce};
use packlist_core::session::Session;
use packlist_core::template::{Template, TemplateCatalog};
use tempfile::tempdir;

fn wallet_template() -> Template {
    Template::new(
        "weekend",
        "週末",
        "",
        &[
            ("財布", "👛", "valuables"),
            ("財布", "💳", "duplicate"),
            ("スマホ", "📱", "valuables"),
        ],
    )
}

#[test]
fn template_toggle_delete_flow() {
    let mut env = FixedEnvironment::new(1_000);
    let state = PackListState::empty(env.now);

    let state = reduce(state, Action::ApplyTemplate(Some(wallet_template())), &mut env);
    let labels: Vec<&str> = state.items.iter().map(|i| i.label.as_str()).collect();
    assert_eq!(labels, vec!["財布", "スマホ"]);
    assert_eq!(state.items.iter().map(|i| i.order).collect::<Vec<_>>(), vec![10, 20]);
    assert!(state.started);
    assert_eq!(state.items[0].icon, "👛");
    assert_eq!(state.items[0].category.as_deref(), Some("valuables"));

    let wallet = state.items[0].id.clone();
    let state = reduce(state, Action::ToggleItem { id: wallet.clone() }, &mut env);
    assert_eq!(state.items.iter().map(|i| i.done).collect::<Vec<_>>(), vec![true, false]);

    let state = reduce(state, Action::DeleteItem { id: wallet }, &mut env);
    assert_eq!(state.items.len(), 1);
    assert_eq!(state.items[0].label, "スマホ");
    assert_eq!(state.items[0].order, 10);
}

#[test]
fn file_storage_round_trip_renormalizes_orders() {
    let temp = tempdir().expect("tempdir");
    let gateway = PersistenceGateway::new(FileStorage::open(temp.path()).expect("open storage"));

    let mut env = FixedEnvironment::new(5);
    let mut state = reduce(
        PackListState::empty(0),
        Action::ApplyTemplate(Some(wallet_template())),
        &mut env,
    );
    state = reduce(
        state,
        Action::AddItem {
            label: "鍵".to_string(),
            icon: "🔑".to_string(),
        },
        &mut env,
    );
    // Leave a gap so the reload has something to compact.
    state.items[2].order = 90;

    gateway.save(&state);
    let LoadOutcome::Loaded(loaded) = gateway.load() else {
        panic!("expected stored list");
    };

    let mut expected = state.clone();
    expected.items[2].order = 30;
    assert_eq!(loaded, expected);
}

#[test]
fn legacy_record_without_template_fields_loads_as_started() {
    let storage = MemoryStorage::with_entry(
        STATE_KEY,
        r#"{"version":1,"listTitle":"旅行","updatedAt":1700000000000,
            "items":[{"id":"x","label":"財布","icon":"👛","done":true,"order":10}]}"#,
    );
    let gateway = PersistenceGateway::new(storage);

    let state = gateway.load().into_state().expect("valid legacy record");
    assert!(state.started);
    assert_eq!(state.selected_template_id.as_deref(), Some(NO_TEMPLATE_ID));
    assert!(state.items[0].done);
}

#[test]
fn invalid_record_falls_back_to_template_selection() {
    let storage = MemoryStorage::with_entry(STATE_KEY, r#"{"version":1,"items":"nope"}"#);
    let session = Session::open(
        PersistenceGateway::new(storage),
        FixedEnvironment::new(0),
        TemplateCatalog::builtin(),
        GestureConfig::default(),
    );
    assert!(!session.state().started);
    assert!(session.state().items.is_empty());
}

#[test]
fn drag_that_misses_the_target_leaves_item_unchecked() {
    let mut session = Session::open(
        PersistenceGateway::new(MemoryStorage::new()),
        FixedEnvironment::new(0),
        TemplateCatalog::builtin(),
        GestureConfig::default(),
    );
    session.start(Some("daytrip")).expect("known template");
    let item_a = session.state().items[0].id.clone();
    let before = session.state().clone();

    session
        .gestures()
        .set_drop_zone(Some(Rect::new(0.0, 700.0, 400.0, 80.0)));

    let mut intents = session
        .gestures()
        .pointer_down(1, PointerKind::Touch, &item_a, Point::new(100.0, 100.0));
    intents.extend(
        session
            .gestures()
            .pointer_move(1, &item_a, Point::new(100.0, 115.0)),
    );
    assert!(intents.contains(&GestureIntent::BeginDrag(item_a.clone())));

    intents = session
        .gestures()
        .pointer_up(1, &item_a, Point::new(100.0, 115.0));
    assert!(!intents.contains(&GestureIntent::DropDelete(item_a.clone())));
    for intent in intents {
        session.handle_intent(intent);
    }

    if let Some(intent) = session.gestures().click(&item_a) {
        session.handle_intent(intent);
    }
    session.gestures().tick();

    assert_eq!(session.state(), &before);
    assert!(!session.state().items[0].done);
}

#[test]
fn drag_onto_target_deletes_and_persists() {
    let temp = tempdir().expect("tempdir");
    let open = || {
        Session::open(
            PersistenceGateway::new(FileStorage::open(temp.path()).expect("open storage")),
            FixedEnvironment::new(0),
            TemplateCatalog::builtin(),
            GestureConfig::default(),
        )
    };

    let mut session = open();
    session.start(Some("overnight")).expect("known template");
    let doomed = session.state().sorted_items()[1].id.clone();
    session
        .gestures()
        .set_drop_zone(Some(Rect::new(0.0, 700.0, 400.0, 80.0)));

    assert_eq!(
        session.gestures().drag_start(&doomed),
        vec![GestureIntent::BeginDrag(doomed.clone())]
    );
    for intent in session.gestures().drop_on_target(&doomed) {
        session.handle_intent(intent);
    }
    session.gestures().drag_end(&doomed);
    assert_eq!(session.gestures().click(&doomed), None);
    session.teardown();

    let reopened = open();
    assert!(reopened.state().find(&doomed).is_none());
    let orders: Vec<i64> = reopened.state().items.iter().map(|i| i.order).collect();
    let expected: Vec<i64> = (1..=orders.len() as i64).map(|n| n * 10).collect();
    assert_eq!(orders, expected);
    assert!(
        reopened
            .gateway()
            .storage()
            .read(STATE_KEY)
            .expect("read")
            .is_some()
    );
}
