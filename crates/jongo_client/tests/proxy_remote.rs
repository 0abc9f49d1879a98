//! Proxy and entity-level operations against the in-memory demo server.

use jongo_client::{ClientError, DynamicFinder, LifecycleState, Method, Value};
use jongo_testkit::prelude::*;
use proptest::prelude::*;

#[test]
fn read_single_row() {
    let server = demo_server();
    let proxy = car_proxy(&server);

    let car = proxy.read(&Value::Int(2)).unwrap();
    assert!(car.is_clean());
    assert_eq!(car.identity_field(), "cid");
    assert_eq!(car.get("model"), Some(&Value::from("X5")));
    assert_eq!(car.get("fuel"), Some(&Value::from("Diesel")));

    let err = proxy.read(&Value::Int(42)).unwrap_err();
    assert!(matches!(err, ClientError::RemoteOperationFailed { status: 404, .. }));
}

#[test]
fn dynamic_finders_reach_the_server() {
    let server = demo_server();
    let proxy = car_proxy(&server);

    let finder = DynamicFinder::new(
        "findAllByYearGreaterThanAndYearLessThanEquals",
        [2007, 2010],
    );
    let listing = proxy.read_all(Some(&finder)).unwrap();
    assert_eq!(listing.entities.len(), 2);
    assert_eq!(listing.count, Some(2));
    assert_eq!(
        server.requests()[0].path,
        "/jongo/demo/car/dynamic/findAllByYearGreaterThanAndYearLessThanEquals?args=2007&args=2010"
    );

    let nulls = proxy
        .read_all(Some(&DynamicFinder::new("findAllByFuelIsNull", Vec::<Value>::new())))
        .unwrap();
    assert_eq!(nulls.entities.len(), 1);
    assert_eq!(nulls.entities[0].get("model"), Some(&Value::Int(500)));

    let err = proxy
        .read_all(Some(&DynamicFinder::find_by("year")))
        .unwrap_err();
    assert_eq!(err.status(), Some(400));
}

#[test]
fn named_queries() {
    let server = demo_server();
    let proxy = car_proxy(&server);

    let old = proxy.query("carsOlderThan", &[Value::Int(2011)]).unwrap();
    assert_eq!(old.len(), 2);
    assert!(old.iter().all(|car| car.is_clean()));
    assert_eq!(
        server.requests()[0].path,
        "/jongo/demo/query/carsOlderThan?args=2011"
    );

    let err = proxy.query("noSuchQuery", &[]).unwrap_err();
    assert!(matches!(err, ClientError::RemoteOperationFailed { status: 400, .. }));
}

#[test]
fn column_find_and_count() {
    let server = demo_server();
    let proxy = user_proxy(&server);

    let found = proxy.find("name", &Value::from("bar")).unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].get("age"), Some(&Value::Int(33)));
    assert!(proxy.find("name", &Value::from("nobody")).unwrap().is_empty());

    assert_eq!(proxy.count().unwrap(), 2);
    assert_eq!(server.requests().last().unwrap().method, Method::Head);
}

#[test]
fn entity_level_operations() {
    let server = demo_server();
    let proxy = user_proxy(&server);

    let mut user = proxy.schema().instance();
    user.set("name", "solo").unwrap();
    user.bind(proxy.clone());
    user.commit().unwrap();
    assert!(user.is_clean());
    assert_eq!(server.table(DEMO_DATABASE, "user").unwrap().len(), 3);

    let mut stored = proxy.read(&Value::Int(2)).unwrap();
    assert!(matches!(
        stored.commit(),
        Err(ClientError::ProxyNotConfigured)
    ));
    stored.bind(proxy.clone());
    assert!(matches!(
        stored.commit(),
        Err(ClientError::InvalidCommitState {
            state: LifecycleState::Clean
        })
    ));

    stored.set("age", 41).unwrap();
    stored.commit().unwrap();
    let fresh = stored.fetch().unwrap();
    assert_eq!(fresh.get("age"), Some(&Value::Int(41)));
    assert!(fresh.proxy().is_some());

    stored.destroy().unwrap();
    assert!(stored.is_clean());
    assert_eq!(server.table(DEMO_DATABASE, "user").unwrap().len(), 2);
}

#[test]
fn committed_ghost_takes_server_identity() {
    let server = demo_server();
    let proxy = user_proxy(&server);

    let mut user = proxy.schema().instance();
    user.set("name", "solo").unwrap();
    user.bind(proxy.clone());
    user.commit().unwrap();
    assert!(user.is_clean());
    assert_eq!(user.identity(), Some(&Value::Int(2)));

    user.set("age", 20).unwrap();
    assert!(user.is_dirty());
    user.commit().unwrap();
    assert!(user.is_clean());

    let methods: Vec<Method> = server.requests().iter().map(|r| r.method).collect();
    assert_eq!(methods, vec![Method::Post, Method::Put]);
    let table = server.table(DEMO_DATABASE, "user").unwrap();
    assert_eq!(table.len(), 3);
    assert_eq!(table.rows()[2]["age"], 20);
}

#[test]
fn failures_report_server_message() {
    let server = demo_server();
    let proxy = user_proxy(&server);
    server.fail_next(503, "Service Unavailable");

    match proxy.read_all(None) {
        Err(ClientError::RemoteOperationFailed { message, status }) => {
            assert_eq!(status, 503);
            assert_eq!(message, "Service Unavailable");
        }
        other => panic!("unexpected result: {:?}", other),
    }
}

proptest! {
    #![proptest_config(PropTestConfig::quick().to_proptest_config())]

    #[test]
    fn path_values_survive_encoding(name in path_text_strategy()) {
        prop_assume!(name != "foo" && name != "bar");
        let server = demo_server();
        let proxy = user_proxy(&server);

        let mut user = proxy.schema().instance();
        user.set("name", name.as_str()).unwrap();
        proxy.create(&user).unwrap();

        let found = proxy.find("name", &Value::from(name.as_str())).unwrap();
        prop_assert_eq!(found.len(), 1);
        prop_assert_eq!(found[0].get("name"), Some(&Value::from(name.as_str())));

        let by_finder = proxy
            .read_all(Some(&DynamicFinder::find_all_by("name").arg(name.as_str())))
            .unwrap();
        prop_assert_eq!(by_finder.entities.len(), 1);
    }

    #[test]
    fn sync_reconciles_any_edit_sequence(ops in store_operations_strategy(1, 20)) {
        let server = demo_server();
        let mut store = Store::new(user_proxy(&server), StoreConfig::default()).unwrap();
        store.load().unwrap();

        // (ghost, dirty, dead) flags per cached row; sync deletes a row only
        // when it is dead and neither ghost nor dirty.
        let mut flags = vec![(false, false, false); store.count()];
        for (step, op) in ops.iter().enumerate() {
            match *op {
                StoreOperation::Add => {
                    let user = store
                        .schema()
                        .instance()
                        .with_attribute("name", format!("user{}", step));
                    store.add(user).unwrap();
                    flags.push((true, false, false));
                }
                StoreOperation::Edit(index) => {
                    let index = index % store.count();
                    let mut user = store.get_at(index).cloned().unwrap();
                    user.set("age", step as i64).unwrap();
                    store.update(user).unwrap();
                    flags[index].1 = true;
                }
                StoreOperation::Remove(index) => {
                    let index = index % store.count();
                    let user = store.get_at(index).cloned().unwrap();
                    store.remove(&user).unwrap();
                    flags[index].2 = true;
                }
            }
        }

        let survivors = flags
            .iter()
            .filter(|(ghost, dirty, dead)| !(*dead && !*ghost && !*dirty))
            .count();
        store.sync().unwrap();

        prop_assert_eq!(store.count(), survivors);
        prop_assert!(store.entities().iter().all(|e| e.is_clean()));
        prop_assert_eq!(server.table(DEMO_DATABASE, "user").unwrap().len(), survivors);
    }
}
