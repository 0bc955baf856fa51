use anyhow::anyhow;
use filterdag::errors::FieldFault;
use filterdag::store::FieldStore;
use filterdag::task::Capability;
use filterdag::types::FieldSet;

/// Bare capability declaration, enough to drive the store directly.
struct Declared {
    id: &'static str,
    consumes: FieldSet,
    produces: FieldSet,
}

impl Declared {
    fn loader(id: &'static str, produces: &[&str]) -> Self {
        Self {
            id,
            consumes: FieldSet::new(),
            produces: produces.iter().copied().collect(),
        }
    }

    fn reader(id: &'static str, consumes: &[&str]) -> Self {
        Self {
            id,
            consumes: consumes.iter().copied().collect(),
            produces: FieldSet::new(),
        }
    }
}

impl Capability for Declared {
    fn id(&self) -> &str {
        self.id
    }

    fn consumes(&self) -> FieldSet {
        self.consumes.clone()
    }

    fn produces(&self) -> FieldSet {
        self.produces.clone()
    }
}

#[derive(Debug, PartialEq)]
struct UserBase {
    name: String,
    age: u8,
}

#[test]
fn test_write_then_read_returns_value() {
    let store = FieldStore::new();
    let loader = Declared::loader("base_loader", &["user_base"]);
    let reader = Declared::reader("age_filter", &["user_base"]);

    store
        .write(
            &loader,
            "user_base",
            Ok(UserBase {
                name: "zhangSan".into(),
                age: 21,
            }),
        )
        .unwrap();

    let user = store.read::<UserBase>(&reader, "user_base").unwrap().unwrap();
    assert_eq!(user.age, 21);
    assert_eq!(user.name, "zhangSan");
    assert!(store.contains("user_base"));
    assert_eq!(store.len(), 1);
}

#[test]
fn test_every_reader_sees_the_same_value() {
    let store = FieldStore::new();
    let loader = Declared::loader("l", &["n"]);
    let a = Declared::reader("a", &["n"]);
    let b = Declared::reader("b", &["n"]);

    store.write(&loader, "n", Ok(7u32)).unwrap();

    assert_eq!(*store.read::<u32>(&a, "n").unwrap().unwrap(), 7);
    assert_eq!(*store.read::<u32>(&b, "n").unwrap().unwrap(), 7);
}

#[test]
fn test_business_error_reaches_consumer() {
    let store = FieldStore::new();
    let loader = Declared::loader("base_loader", &["user_base"]);
    let reader = Declared::reader("name_filter", &["user_base"]);

    store
        .write::<UserBase>(&loader, "user_base", Err(anyhow!("upstream timed out")))
        .unwrap();

    let loaded = store.read::<UserBase>(&reader, "user_base").unwrap();
    let err = loaded.unwrap_err();
    assert_eq!(err.to_string(), "upstream timed out");
    // A business error still counts as written.
    assert!(store.contains("user_base"));
}

#[test]
fn test_write_outside_produces_fails() {
    let store = FieldStore::new();
    let loader = Declared::loader("base_loader", &["user_base"]);

    let fault = store.write(&loader, "user_relation", Ok(1u8)).unwrap_err();
    assert_eq!(
        fault,
        FieldFault::NotProduced {
            task: "base_loader".into(),
            field: "user_relation".into(),
        }
    );
    assert!(store.is_empty());
}

#[test]
fn test_read_outside_consumes_fails_even_when_written() {
    let store = FieldStore::new();
    let loader = Declared::loader("base_loader", &["user_base"]);
    let reader = Declared::reader("relation_filter", &["user_relation"]);

    store.write(&loader, "user_base", Ok(1u8)).unwrap();

    let fault = store.read::<u8>(&reader, "user_base").unwrap_err();
    assert_eq!(
        fault,
        FieldFault::NotConsumed {
            task: "relation_filter".into(),
            field: "user_base".into(),
        }
    );
}

#[test]
fn test_second_write_fails_and_keeps_first_value() {
    let store = FieldStore::new();
    let loader = Declared::loader("l", &["n"]);
    let reader = Declared::reader("r", &["n"]);

    store.write(&loader, "n", Ok(1u64)).unwrap();
    let fault = store.write(&loader, "n", Ok(2u64)).unwrap_err();
    assert!(matches!(fault, FieldFault::Duplicate { ref field, .. } if field == "n"));

    assert_eq!(*store.read::<u64>(&reader, "n").unwrap().unwrap(), 1);
}

#[test]
fn test_read_before_write_fails() {
    let store = FieldStore::new();
    let reader = Declared::reader("r", &["n"]);

    let fault = store.read::<u64>(&reader, "n").unwrap_err();
    assert_eq!(
        fault,
        FieldFault::Missing {
            task: "r".into(),
            field: "n".into(),
        }
    );
}

#[test]
fn test_read_with_wrong_type_fails() {
    let store = FieldStore::new();
    let loader = Declared::loader("l", &["n"]);
    let reader = Declared::reader("r", &["n"]);

    store.write(&loader, "n", Ok(5u64)).unwrap();

    match store.read::<String>(&reader, "n").unwrap_err() {
        FieldFault::TypeMismatch {
            task,
            field,
            stored,
            requested,
        } => {
            assert_eq!(task, "r");
            assert_eq!(field, "n");
            assert_eq!(stored, "u64");
            assert!(requested.contains("String"));
        }
        other => panic!("expected type mismatch, got {other:?}"),
    }
}

#[test]
fn test_concurrent_writers_on_distinct_fields() {
    let store = std::sync::Arc::new(FieldStore::new());
    let fields: Vec<String> = (0..32).map(|i| format!("f{i}")).collect();

    std::thread::scope(|scope| {
        for field in &fields {
            let store = std::sync::Arc::clone(&store);
            scope.spawn(move || {
                let loader = Declared {
                    id: "writer",
                    consumes: FieldSet::new(),
                    produces: FieldSet::from([field.as_str()]),
                };
                store.write(&loader, field, Ok(field.len())).unwrap();
            });
        }
    });

    assert_eq!(store.len(), fields.len());
}
