use std::sync::Arc;

use bson::{Bson, Document, doc};
use duostore::{LimitedBackend, NativeBackend, Query, StoreHandle, UpdateSpec};

fn stores() -> Vec<(&'static str, StoreHandle)> {
    vec![
        ("native", StoreHandle::with_backend(Arc::new(NativeBackend::new()), "testdb")),
        ("limited", StoreHandle::with_backend(Arc::new(LimitedBackend::new(None)), "testdb")),
    ]
}

fn q(raw: &Document) -> Query {
    Query::try_from(raw).unwrap()
}

fn sorted_ids(docs: &[Document]) -> Vec<&str> {
    let mut ids: Vec<&str> = docs.iter().map(|d| d.get_str("id").unwrap()).collect();
    ids.sort_unstable();
    ids
}

#[tokio::test]
async fn upsert_by_id_overwrites_never_duplicates() {
    for (label, store) in stores() {
        let col = store.collection("equipment");
        col.insert_one(doc! { "id": "a", "estado": "activo" }).await.unwrap();
        let res = col.insert_one(doc! { "id": "a", "estado": "baja" }).await.unwrap();
        assert_eq!(res.inserted_id, "a", "{label}");
        assert_eq!(col.count_documents(&Query::Empty).await.unwrap(), 1, "{label}");
        let found = col.find_one(&q(&doc! { "id": "a" })).await.unwrap().unwrap();
        assert_eq!(found.get_str("estado").unwrap(), "baja", "{label}");
    }
}

#[tokio::test]
async fn insert_without_id_gets_a_fresh_identity() {
    for (label, store) in stores() {
        let col = store.collection("equipment");
        let res = col.insert_one(doc! { "marca": "HP" }).await.unwrap();
        assert!(!res.inserted_id.is_empty(), "{label}");
        let found =
            col.find_one(&q(&doc! { "id": res.inserted_id.clone() })).await.unwrap().unwrap();
        assert_eq!(found.get_str("marca").unwrap(), "HP", "{label}");
    }
}

#[tokio::test]
async fn single_field_scenario() {
    for (label, store) in stores() {
        let col = store.collection("equipment");
        col.insert_one(doc! { "id": "a", "type": "x" }).await.unwrap();
        col.insert_one(doc! { "id": "b", "type": "y" }).await.unwrap();
        col.insert_one(doc! { "id": "c", "type": "x" }).await.unwrap();

        let docs = col.find(q(&doc! { "type": "x" })).to_list(10).await.unwrap();
        assert_eq!(sorted_ids(&docs), ["a", "c"], "{label}");
        assert_eq!(col.count_documents(&q(&doc! { "type": "x" })).await.unwrap(), 2, "{label}");

        let mut distinct: Vec<String> = col
            .distinct("type")
            .await
            .unwrap()
            .into_iter()
            .map(|v| match v {
                Bson::String(s) => s,
                other => panic!("unexpected distinct value {other:?}"),
            })
            .collect();
        distinct.sort_unstable();
        assert_eq!(distinct, ["x", "y"], "{label}");
    }
}

#[tokio::test]
async fn pushdown_preserves_other_fields() {
    for (label, store) in stores() {
        let col = store.collection("equipment");
        let original = doc! {
            "id": "eq-1",
            "numero_serie": "SN-42",
            "specs": { "ram": 16_i32, "tags": ["ssd", "wifi"] },
        };
        col.insert_one(original.clone()).await.unwrap();
        let found = col.find_one(&q(&doc! { "numero_serie": "SN-42" })).await.unwrap().unwrap();
        assert_eq!(found, original, "{label}");
        assert!(col.find_one(&q(&doc! { "numero_serie": "SN-43" })).await.unwrap().is_none());
    }
}

#[tokio::test]
async fn find_one_degrades_unsupported_shapes_to_none() {
    for (label, store) in stores() {
        let col = store.collection("equipment");
        col.insert_one(doc! { "id": "a", "type": "x", "marca": "Dell" }).await.unwrap();
        for raw in [
            doc! {},
            doc! { "type": "x", "marca": "Dell" },
            doc! { "marca": { "$regex": "dell" } },
        ] {
            assert!(col.find_one(&q(&raw)).await.unwrap().is_none(), "{label}: {raw:?}");
        }
    }
}

#[tokio::test]
async fn or_of_regex_branches_is_complete() {
    for (label, store) in stores() {
        let col = store.collection("equipment");
        col.insert_one(doc! { "id": "a", "marca": "Dell", "modelo": "Latitude" }).await.unwrap();
        col.insert_one(doc! { "id": "b", "marca": "Lenovo", "modelo": "ThinkPad" }).await.unwrap();
        col.insert_one(doc! { "id": "c", "marca": "HP", "modelo": "EliteDell" }).await.unwrap();
        col.insert_one(doc! { "id": "d", "marca": "Apple", "modelo": "MacBook" }).await.unwrap();

        let search = doc! {
            "$or": [
                { "marca": { "$regex": "dell", "$options": "i" } },
                { "modelo": { "$regex": "dell", "$options": "i" } },
            ]
        };
        let docs = col.find(q(&search)).to_list(100).await.unwrap();
        assert_eq!(sorted_ids(&docs), ["a", "c"], "{label}");
    }
}

#[tokio::test]
async fn equality_legs_of_a_mixed_query_are_not_dropped() {
    for (label, store) in stores() {
        let col = store.collection("equipment");
        col.insert_one(doc! { "id": "a", "estado": "activo", "marca": "Dell" }).await.unwrap();
        col.insert_one(doc! { "id": "b", "estado": "baja", "marca": "Dell" }).await.unwrap();

        let search = doc! {
            "estado": "activo",
            "$or": [ { "marca": { "$regex": "dell" } } ],
        };
        let docs = col.find(q(&search)).to_list(100).await.unwrap();
        assert_eq!(sorted_ids(&docs), ["a"], "{label}");
    }
}

#[tokio::test]
async fn update_replaces_only_named_fields() {
    for (label, store) in stores() {
        let col = store.collection("equipment");
        col.insert_one(doc! { "id": "a", "estado": "activo", "marca": "Dell" }).await.unwrap();
        col.insert_one(doc! { "id": "b", "estado": "activo", "marca": "HP" }).await.unwrap();

        let upd = UpdateSpec::try_from(&doc! { "$set": { "estado": "baja" } }).unwrap();
        let res = col.update_one(&q(&doc! { "id": "a" }), &upd).await.unwrap();
        assert_eq!(res.modified_count, 1, "{label}");

        let a = col.find_one(&q(&doc! { "id": "a" })).await.unwrap().unwrap();
        assert_eq!(a.get_str("estado").unwrap(), "baja", "{label}");
        assert_eq!(a.get_str("marca").unwrap(), "Dell", "{label}");

        let b = col.find_one(&q(&doc! { "id": "b" })).await.unwrap().unwrap();
        assert_eq!(b.get_str("estado").unwrap(), "activo", "{label}");

        let missing = col.update_one(&q(&doc! { "id": "nope" }), &upd).await.unwrap();
        assert_eq!(missing.modified_count, 0, "{label}");
    }
}

#[tokio::test]
async fn delete_removes_only_the_match() {
    for (label, store) in stores() {
        let col = store.collection("equipment");
        col.insert_one(doc! { "id": "a", "type": "x" }).await.unwrap();
        col.insert_one(doc! { "id": "b", "type": "y" }).await.unwrap();

        let res = col.delete_one(&q(&doc! { "id": "a" })).await.unwrap();
        assert_eq!(res.deleted_count, 1, "{label}");
        let again = col.delete_one(&q(&doc! { "id": "a" })).await.unwrap();
        assert_eq!(again.deleted_count, 0, "{label}");
        assert_eq!(col.count_documents(&Query::Empty).await.unwrap(), 1, "{label}");
    }
}

#[tokio::test]
async fn count_answers_zero_for_unsupported_shapes() {
    for (label, store) in stores() {
        let col = store.collection("equipment");
        col.insert_one(doc! { "id": "a", "marca": "Dell" }).await.unwrap();
        let complex = q(&doc! { "marca": { "$regex": "dell" } });
        assert_eq!(col.count_documents(&complex).await.unwrap(), 0, "{label}");
    }
}

#[tokio::test]
async fn cursor_limit_caps_results() {
    for (label, store) in stores() {
        let col = store.collection("equipment");
        for i in 0..5 {
            col.insert_one(doc! { "id": format!("e{i}"), "type": "x" }).await.unwrap();
        }
        let docs = col.find(Query::Empty).limit(3).to_list(1000).await.unwrap();
        assert_eq!(docs.len(), 3, "{label}");

        // Last write wins when limit is set twice.
        let docs = col.find(Query::Empty).limit(2).limit(4).to_list(1000).await.unwrap();
        assert_eq!(docs.len(), 4, "{label}");

        // max_length bounds the result even without an explicit limit.
        let docs = col.find(Query::Empty).to_list(2).await.unwrap();
        assert_eq!(docs.len(), 2, "{label}");
    }
}

#[tokio::test]
async fn cursor_re_executes_on_each_materialization() {
    for (label, store) in stores() {
        let col = store.collection("equipment");
        col.insert_one(doc! { "id": "a", "type": "x" }).await.unwrap();
        let cursor = col.find(q(&doc! { "type": "x" }));
        assert_eq!(cursor.to_list(10).await.unwrap().len(), 1, "{label}");
        col.insert_one(doc! { "id": "b", "type": "x" }).await.unwrap();
        assert_eq!(cursor.to_list(10).await.unwrap().len(), 2, "{label}");
    }
}

#[tokio::test]
async fn timestamps_round_trip_through_both_stores() {
    let dt = bson::DateTime::from_millis(1_709_286_600_123);
    for (label, store) in stores() {
        let col = store.collection("history");
        col.insert_one(doc! { "id": "h1", "fecha": dt, "cambios": [{ "at": dt }] })
            .await
            .unwrap();
        let found = col.find_one(&q(&doc! { "id": "h1" })).await.unwrap().unwrap();
        assert_eq!(found.get("fecha"), Some(&Bson::DateTime(dt)), "{label}");
        let Some(Bson::Array(cambios)) = found.get("cambios") else {
            panic!("{label}: missing cambios")
        };
        assert_eq!(cambios[0], Bson::Document(doc! { "at": dt }), "{label}");
    }
}

#[tokio::test]
async fn equality_on_timestamp_values_matches_stored_form() {
    let dt = bson::DateTime::from_millis(86_400_000);
    for (label, store) in stores() {
        let col = store.collection("history");
        col.insert_one(doc! { "id": "h1", "fecha": dt }).await.unwrap();
        // The query value goes through the same canonical transform as the
        // stored document.
        let found = col.find_one(&q(&doc! { "fecha": dt })).await.unwrap();
        assert!(found.is_some(), "{label}");
    }
}
