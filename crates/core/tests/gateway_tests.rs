// ═══════════════════════════════════════════════════════════════════
// Gateway Tests — MemoryGateway, Subscription, LedgerFeed,
// Firestore value codec & URLs, gateway selection
// ═══════════════════════════════════════════════════════════════════

use std::sync::Arc;

use serde_json::{json, Value};

use card_tracker_core::errors::CoreError;
use card_tracker_core::gateways::feed::LedgerFeed;
use card_tracker_core::gateways::firestore::{
    decode_fields, decode_value, document_id, encode_fields, encode_value, FirestoreDocument,
    FirestoreGateway,
};
use card_tracker_core::gateways::memory::MemoryGateway;
use card_tracker_core::gateways::traits::StorageGateway;
use card_tracker_core::gateways;
use card_tracker_core::models::document::{Collection, Document, Fields};
use card_tracker_core::models::settings::{FirestoreSettings, Settings};

fn fields(value: Value) -> Fields {
    match value {
        Value::Object(map) => map,
        other => panic!("fixture must be an object, got {other}"),
    }
}

// ═══════════════════════════════════════════════════════════════════
// MemoryGateway — CRUD
// ═══════════════════════════════════════════════════════════════════

mod memory_crud {
    use super::*;

    #[tokio::test]
    async fn create_assigns_unique_ids() {
        let gateway = MemoryGateway::new();
        let a = gateway
            .create(Collection::Cards, fields(json!({ "name": "A" })))
            .await
            .unwrap();
        let b = gateway
            .create(Collection::Cards, fields(json!({ "name": "B" })))
            .await
            .unwrap();
        assert_ne!(a, b);
        assert!(uuid::Uuid::parse_str(&a).is_ok());
        assert_eq!(gateway.document_count(Collection::Cards), 2);
        assert_eq!(gateway.document_count(Collection::Supplies), 0);
    }

    #[tokio::test]
    async fn list_keeps_insertion_order() {
        let gateway = MemoryGateway::new();
        for name in ["first", "second", "third"] {
            gateway
                .create(Collection::MiscSupplies, fields(json!({ "name": name })))
                .await
                .unwrap();
        }
        let docs = gateway.list_once(Collection::MiscSupplies).await.unwrap();
        let names: Vec<&Value> = docs.iter().filter_map(|d| d.get("name")).collect();
        assert_eq!(names, vec![&json!("first"), &json!("second"), &json!("third")]);
    }

    #[tokio::test]
    async fn update_merges_fields() {
        let gateway = MemoryGateway::new();
        let id = gateway
            .create(
                Collection::Supplies,
                fields(json!({ "name": "Tape", "quantity": 1, "cost": 2.0 })),
            )
            .await
            .unwrap();
        gateway
            .update(Collection::Supplies, &id, fields(json!({ "quantity": 4 })))
            .await
            .unwrap();

        let docs = gateway.list_once(Collection::Supplies).await.unwrap();
        assert_eq!(docs[0].get("quantity"), Some(&json!(4)));
        assert_eq!(docs[0].get("name"), Some(&json!("Tape")));
        assert_eq!(docs[0].get("cost"), Some(&json!(2.0)));
    }

    #[tokio::test]
    async fn update_missing_is_not_found() {
        let gateway = MemoryGateway::new();
        let err = gateway
            .update(Collection::Cards, "nope", Fields::new())
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::NotFound { ref collection, ref id }
            if collection == "cards" && id == "nope"));
    }

    #[tokio::test]
    async fn delete_removes_and_then_not_found() {
        let gateway = MemoryGateway::new();
        let id = gateway
            .create(Collection::Cards, fields(json!({ "name": "A" })))
            .await
            .unwrap();
        gateway.delete(Collection::Cards, &id).await.unwrap();
        assert_eq!(gateway.document_count(Collection::Cards), 0);

        let err = gateway.delete(Collection::Cards, &id).await.unwrap_err();
        assert!(matches!(err, CoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn with_documents_keeps_given_ids() {
        let gateway = MemoryGateway::new().with_documents(
            Collection::Cards,
            vec![Document::new("fixed-id", fields(json!({ "name": "Mew" })))],
        );
        let docs = gateway.list_once(Collection::Cards).await.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].id, "fixed-id");
    }

    #[tokio::test]
    async fn injected_failure_hits_next_call_only() {
        let gateway = MemoryGateway::new();
        gateway.fail_next("permission denied");

        let err = gateway
            .create(Collection::Cards, fields(json!({ "name": "A" })))
            .await
            .unwrap_err();
        assert!(err.is_storage());
        assert_eq!(err.to_string(), "Storage error (Memory): permission denied");
        assert_eq!(gateway.document_count(Collection::Cards), 0);

        gateway
            .create(Collection::Cards, fields(json!({ "name": "A" })))
            .await
            .unwrap();
        assert_eq!(gateway.document_count(Collection::Cards), 1);
    }

    #[tokio::test]
    async fn injected_failures_queue_up() {
        let gateway = MemoryGateway::new();
        gateway.fail_next("one");
        gateway.fail_next("two");
        let first = gateway.list_once(Collection::Cards).await.unwrap_err();
        let second = gateway.list_once(Collection::Cards).await.unwrap_err();
        assert!(first.to_string().ends_with("one"));
        assert!(second.to_string().ends_with("two"));
        assert!(gateway.list_once(Collection::Cards).await.is_ok());
    }

    #[test]
    fn name() {
        assert_eq!(MemoryGateway::default().name(), "Memory");
    }
}

// ═══════════════════════════════════════════════════════════════════
// Subscription
// ═══════════════════════════════════════════════════════════════════

mod subscription {
    use super::*;

    #[tokio::test]
    async fn first_snapshot_is_initial_load() {
        let gateway = MemoryGateway::new().with_documents(
            Collection::Cards,
            vec![Document::new("a", fields(json!({ "name": "A" })))],
        );
        let mut sub = gateway.subscribe(Collection::Cards).await.unwrap();
        assert_eq!(sub.collection(), Collection::Cards);

        let initial = sub.next().await.unwrap();
        assert_eq!(initial.len(), 1);
        assert_eq!(initial[0].id, "a");
    }

    #[tokio::test]
    async fn writes_publish_whole_collection() {
        let gateway = MemoryGateway::new();
        let mut sub = gateway.subscribe(Collection::Supplies).await.unwrap();
        assert!(sub.next().await.unwrap().is_empty());

        gateway
            .create(Collection::Supplies, fields(json!({ "name": "Tape" })))
            .await
            .unwrap();
        let snapshot = sub.next().await.unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].get("name"), Some(&json!("Tape")));
    }

    #[tokio::test]
    async fn slow_consumer_sees_latest_snapshot() {
        let gateway = MemoryGateway::new();
        let mut sub = gateway.subscribe(Collection::Cards).await.unwrap();
        sub.next().await.unwrap();

        for name in ["A", "B", "C"] {
            gateway
                .create(Collection::Cards, fields(json!({ "name": name })))
                .await
                .unwrap();
        }
        // intermediate snapshots are skipped
        assert_eq!(sub.next().await.unwrap().len(), 3);
        assert_eq!(sub.current().len(), 3);
    }

    #[tokio::test]
    async fn other_collections_do_not_notify() {
        let gateway = MemoryGateway::new();
        let mut sub = gateway.subscribe(Collection::Cards).await.unwrap();
        sub.next().await.unwrap();

        gateway
            .create(Collection::MiscSupplies, fields(json!({ "name": "Tape" })))
            .await
            .unwrap();
        let waited =
            tokio::time::timeout(std::time::Duration::from_millis(50), sub.next()).await;
        assert!(waited.is_err(), "cards subscription must stay quiet");
    }

    #[tokio::test]
    async fn ends_when_store_is_gone() {
        let gateway = MemoryGateway::new();
        let mut sub = gateway.subscribe(Collection::Cards).await.unwrap();
        sub.next().await.unwrap();
        drop(gateway);
        assert!(sub.next().await.is_none());
    }

    #[tokio::test]
    async fn failed_subscribe() {
        let gateway = MemoryGateway::new();
        gateway.fail_next("offline");
        let err = gateway.subscribe(Collection::Cards).await.unwrap_err();
        assert!(err.is_storage());
    }

    #[tokio::test]
    async fn unsubscribe_consumes_handle() {
        let gateway = MemoryGateway::new();
        let sub = gateway.subscribe(Collection::Cards).await.unwrap();
        sub.unsubscribe();
        // the store keeps working without subscribers
        gateway
            .create(Collection::Cards, fields(json!({ "name": "A" })))
            .await
            .unwrap();
    }
}

// ═══════════════════════════════════════════════════════════════════
// LedgerFeed
// ═══════════════════════════════════════════════════════════════════

mod feed {
    use super::*;

    #[tokio::test]
    async fn yields_initial_load_of_each_collection() {
        let gateway = MemoryGateway::new().with_documents(
            Collection::Supplies,
            vec![Document::new("s", fields(json!({ "name": "Tape" })))],
        );
        let mut feed = LedgerFeed::open(&gateway).await.unwrap();

        let mut seen = Vec::new();
        for _ in 0..3 {
            let update = feed.next().await.unwrap();
            seen.push((update.collection, update.documents.len()));
        }
        assert_eq!(
            seen,
            vec![
                (Collection::Cards, 0),
                (Collection::Supplies, 1),
                (Collection::MiscSupplies, 0),
            ]
        );
    }

    #[tokio::test]
    async fn yields_changed_collection() {
        let gateway = MemoryGateway::new();
        let mut feed = LedgerFeed::open(&gateway).await.unwrap();
        for _ in 0..3 {
            feed.next().await.unwrap();
        }

        gateway
            .create(Collection::MiscSupplies, fields(json!({ "name": "Tape", "price": 2 })))
            .await
            .unwrap();
        let update = feed.next().await.unwrap();
        assert_eq!(update.collection, Collection::MiscSupplies);
        assert_eq!(update.documents.len(), 1);
    }

    #[tokio::test]
    async fn current_reports_all_collections() {
        let gateway = MemoryGateway::new().with_documents(
            Collection::Cards,
            vec![Document::new("a", Fields::new()), Document::new("b", Fields::new())],
        );
        let feed = LedgerFeed::open(&gateway).await.unwrap();
        let current = feed.current();
        assert_eq!(current.len(), 3);
        assert_eq!(current[0].collection, Collection::Cards);
        assert_eq!(current[0].documents.len(), 2);
        feed.close();
    }

    #[tokio::test]
    async fn ends_when_store_is_gone() {
        let gateway = Arc::new(MemoryGateway::new());
        let mut feed = LedgerFeed::open(gateway.as_ref()).await.unwrap();
        for _ in 0..3 {
            feed.next().await.unwrap();
        }
        drop(gateway);
        assert!(feed.next().await.is_none());
    }

    #[tokio::test]
    async fn open_fails_if_any_subscription_fails() {
        let gateway = MemoryGateway::new();
        gateway.fail_next("offline");
        assert!(LedgerFeed::open(&gateway).await.is_err());
    }
}

// ═══════════════════════════════════════════════════════════════════
// Firestore value codec
// ═══════════════════════════════════════════════════════════════════

mod firestore_codec {
    use super::*;

    #[test]
    fn encode_scalars() {
        assert_eq!(encode_value(&json!("Mew")), json!({ "stringValue": "Mew" }));
        assert_eq!(encode_value(&json!(true)), json!({ "booleanValue": true }));
        assert_eq!(encode_value(&json!(50)), json!({ "integerValue": "50" }));
        assert_eq!(encode_value(&json!(0.25)), json!({ "doubleValue": 0.25 }));
        assert_eq!(encode_value(&Value::Null), json!({ "nullValue": null }));
    }

    #[test]
    fn whole_floats_stay_doubles() {
        assert_eq!(encode_value(&json!(100.0)), json!({ "doubleValue": 100.0 }));
    }

    #[test]
    fn encode_nested() {
        assert_eq!(
            encode_value(&json!(["a", 1])),
            json!({ "arrayValue": { "values": [
                { "stringValue": "a" },
                { "integerValue": "1" }
            ] } })
        );
        assert_eq!(
            encode_value(&json!({ "k": false })),
            json!({ "mapValue": { "fields": { "k": { "booleanValue": false } } } })
        );
    }

    #[test]
    fn encode_card_fields() {
        let encoded = encode_fields(&fields(json!({
            "name": "Charizard",
            "boughtFor": 100.0,
            "isSold": false,
            "dateSold": ""
        })));
        assert_eq!(
            encoded,
            json!({
                "name": { "stringValue": "Charizard" },
                "boughtFor": { "doubleValue": 100.0 },
                "isSold": { "booleanValue": false },
                "dateSold": { "stringValue": "" }
            })
        );
    }

    #[test]
    fn decode_scalars() {
        assert_eq!(decode_value(&json!({ "stringValue": "x" })), json!("x"));
        assert_eq!(decode_value(&json!({ "booleanValue": true })), json!(true));
        assert_eq!(decode_value(&json!({ "integerValue": "42" })), json!(42));
        assert_eq!(decode_value(&json!({ "integerValue": "-7" })), json!(-7));
        assert_eq!(decode_value(&json!({ "doubleValue": 2.5 })), json!(2.5));
        assert_eq!(decode_value(&json!({ "nullValue": null })), Value::Null);
        assert_eq!(
            decode_value(&json!({ "timestampValue": "2024-03-01T10:00:00Z" })),
            json!("2024-03-01T10:00:00Z")
        );
    }

    #[test]
    fn decode_unknown_shapes_to_null() {
        assert_eq!(
            decode_value(&json!({ "geoPointValue": { "latitude": 1.0 } })),
            Value::Null
        );
        assert_eq!(decode_value(&json!("bare")), Value::Null);
        assert_eq!(decode_value(&json!({ "integerValue": "abc" })), Value::Null);
    }

    #[test]
    fn decode_nested() {
        let value = json!({ "arrayValue": { "values": [
            { "mapValue": { "fields": { "n": { "integerValue": "3" } } } }
        ] } });
        assert_eq!(decode_value(&value), json!([{ "n": 3 }]));
        assert_eq!(decode_value(&json!({ "arrayValue": {} })), json!([]));
    }

    #[test]
    fn card_fields_survive_encoding() {
        let original = fields(json!({
            "name": "Lugia",
            "boughtFor": 40.5,
            "soldFor": 60.0,
            "status": "sold",
            "isSold": true,
            "dateBought": "2023-12-01",
            "dateSold": "2024-01-02",
            "notes": ""
        }));
        let encoded = encode_fields(&original);
        let decoded = decode_fields(encoded.as_object().unwrap());
        assert_eq!(decoded, original);
    }

    #[test]
    fn document_id_is_last_segment() {
        assert_eq!(
            document_id("projects/p/databases/(default)/documents/cards/abc123"),
            "abc123"
        );
        assert_eq!(document_id("abc"), "abc");
    }

    #[test]
    fn rest_document_into_document() {
        let rest: FirestoreDocument = serde_json::from_value(json!({
            "name": "projects/p/databases/(default)/documents/supplies/s1",
            "fields": {
                "name": { "stringValue": "Top Loaders" },
                "quantity": { "integerValue": "20" },
                "cost": { "doubleValue": 0.25 }
            },
            "createTime": "2024-01-01T00:00:00Z",
            "updateTime": "2024-01-01T00:00:00Z"
        }))
        .unwrap();
        let doc = rest.into_document();
        assert_eq!(doc.id, "s1");
        assert_eq!(doc.get("quantity"), Some(&json!(20)));
        assert_eq!(doc.get("cost"), Some(&json!(0.25)));
    }

    #[test]
    fn rest_document_without_fields() {
        let rest: FirestoreDocument = serde_json::from_value(json!({
            "name": "projects/p/databases/(default)/documents/cards/empty"
        }))
        .unwrap();
        let doc = rest.into_document();
        assert_eq!(doc.id, "empty");
        assert!(doc.fields.is_empty());
    }
}

// ═══════════════════════════════════════════════════════════════════
// FirestoreGateway — endpoints & transport errors
// ═══════════════════════════════════════════════════════════════════

mod firestore_gateway {
    use super::*;

    #[test]
    fn urls() {
        let gateway = FirestoreGateway::new(FirestoreSettings::new("cards-demo")).unwrap();
        assert_eq!(
            gateway.documents_url(),
            "https://firestore.googleapis.com/v1/projects/cards-demo/databases/(default)/documents"
        );
        assert!(gateway
            .collection_url(Collection::MiscSupplies)
            .ends_with("/documents/miscSupplies"));
        assert!(gateway
            .document_url(Collection::Cards, "abc")
            .ends_with("/documents/cards/abc"));
        assert_eq!(gateway.name(), "Firestore");
    }

    #[test]
    fn invalid_settings_rejected() {
        let mut settings = FirestoreSettings::new("cards-demo");
        settings.poll_interval_secs = 0;
        let err = FirestoreGateway::new(settings).unwrap_err();
        assert!(matches!(err, CoreError::Config(ref m) if m.contains("poll_interval_secs")));

        let err = FirestoreGateway::new(FirestoreSettings::new("  ")).unwrap_err();
        assert!(matches!(err, CoreError::Config(ref m) if m.contains("project_id")));
    }

    #[test]
    fn base_url_trailing_slash_ignored() {
        let mut settings = FirestoreSettings::new("p");
        settings.base_url = "http://localhost:8080/v1/".into();
        settings.database = "cards".into();
        let gateway = FirestoreGateway::new(settings).unwrap();
        assert_eq!(
            gateway.documents_url(),
            "http://localhost:8080/v1/projects/p/databases/cards/documents"
        );
    }

    #[tokio::test]
    async fn unreachable_store_is_network_error() {
        let mut settings = FirestoreSettings::new("p");
        settings.base_url = "http://127.0.0.1:9/v1".into();
        settings.api_key = Some("secret-key".into());
        settings.timeout_secs = 2;
        let gateway = FirestoreGateway::new(settings).unwrap();

        let err = gateway.list_once(Collection::Cards).await.unwrap_err();
        assert!(err.is_storage());
        assert!(!err.to_string().contains("secret-key"));
    }
}

// ═══════════════════════════════════════════════════════════════════
// Gateway selection
// ═══════════════════════════════════════════════════════════════════

mod selection {
    use super::*;

    #[test]
    fn memory_without_remote_settings() {
        let gateway = gateways::from_settings(&Settings::default()).unwrap();
        assert_eq!(gateway.name(), "Memory");
    }

    #[test]
    fn firestore_when_configured() {
        let settings = Settings {
            firestore: Some(FirestoreSettings::new("cards-demo")),
            ..Settings::default()
        };
        let gateway = gateways::from_settings(&settings).unwrap();
        assert_eq!(gateway.name(), "Firestore");
    }
}
