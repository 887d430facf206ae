//! Tests for binding request data to declared handler parameters.

mod common;

use bounce::{
    Catalog, Container, Controller, ControllerMapping, HandlerTable, Pageable, ParamSpec,
    RequestMapping,
};
use common::{get, post_json};
use http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Order {
    item: String,
    quantity: u32,
}

struct Orders;

impl Controller for Orders {
    fn mapping() -> ControllerMapping {
        ControllerMapping::prefix("/orders")
    }

    fn handlers(table: &mut HandlerTable<Self>) {
        table
            .route(
                "search",
                RequestMapping::get("/search"),
                vec![
                    ParamSpec::query::<String>("customer"),
                    ParamSpec::optional_query::<u32>("limit"),
                ],
                |_me, mut args| async move {
                    let customer = args.require::<String>(0)?;
                    let limit = args.take::<u32>(1);
                    Ok(json!({ "customer": customer, "limit": limit }))
                },
            )
            .route(
                "item",
                RequestMapping::get("/{id}/items/{line}"),
                vec![
                    ParamSpec::path::<u64>("id"),
                    ParamSpec::path::<String>("line"),
                ],
                |_me, mut args| async move {
                    let id = args.take::<u64>(0);
                    let line = args.require::<String>(1)?;
                    Ok(json!({ "id": id, "line": line }))
                },
            )
            // declares a path variable the pattern never captures
            .route(
                "mismatched",
                RequestMapping::get("/mismatched"),
                vec![
                    ParamSpec::path::<u64>("id"),
                    ParamSpec::query::<String>("customer"),
                ],
                |_me, _args| async move { Ok(json!({ "reached": true })) },
            )
            .route(
                "strict",
                RequestMapping::get("/strict/{id}"),
                vec![ParamSpec::path::<u64>("id")],
                |_me, mut args| async move {
                    let id = args.require::<u64>(0)?;
                    Ok(json!({ "id": id }))
                },
            )
            .route(
                "page",
                RequestMapping::get("/"),
                vec![ParamSpec::pageable()],
                |_me, args| async move {
                    let pageable = args.pageable().unwrap_or_default();
                    Ok(json!({
                        "page": pageable.page(),
                        "size": pageable.size(),
                        "order": pageable.order.clone(),
                        "sql": pageable.to_sql_order(),
                    }))
                },
            )
            .route(
                "create",
                RequestMapping::post("/"),
                vec![ParamSpec::body::<Order>()],
                |_me, mut args| async move {
                    let order = args.require::<Order>(0)?;
                    Ok(order)
                },
            )
            .route(
                "filters",
                RequestMapping::get("/filters"),
                vec![ParamSpec::query_map::<BTreeMap<String, String>>()],
                |_me, mut args| async move {
                    Ok(args.take::<BTreeMap<String, String>>(0).unwrap_or_default())
                },
            )
            .route(
                "defaults",
                RequestMapping::get("/defaults"),
                vec![ParamSpec::pageable()],
                |_me, args| async move { Ok(args.pageable() == Some(Pageable::of(0, 50))) },
            );
    }
}

fn app() -> bounce::Bounce {
    let mut catalog = Catalog::new();
    catalog.controller::<Orders>();
    let container = Container::new();
    container.instance(Orders);
    common::build_app(&["parameters_tests"], catalog, container)
}

#[tokio::test]
async fn test_required_query_parameter_missing_is_400() {
    let res = get(&app(), "/orders/search").await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.message(), "Request Parameter customer is required");
}

#[tokio::test]
async fn test_query_parameters_are_decoded_and_coerced() {
    let res = get(&app(), "/orders/search?customer=Ann%20Lee&limit=5").await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json(), json!({ "customer": "Ann Lee", "limit": 5 }));
}

#[tokio::test]
async fn test_uncoercible_optional_query_is_absent() {
    let res = get(&app(), "/orders/search?customer=ann&limit=lots").await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json(), json!({ "customer": "ann", "limit": null }));
}

#[tokio::test]
async fn test_string_query_values_are_not_reinterpreted() {
    let res = get(&app(), "/orders/search?customer=%22ann%22").await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json(), json!({ "customer": "\"ann\"", "limit": null }));

    let res = get(&app(), "/orders/search?customer=null").await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json(), json!({ "customer": "null", "limit": null }));
}

#[tokio::test]
async fn test_path_variables_bind_by_name() {
    let res = get(&app(), "/orders/7/items/line%201").await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json(), json!({ "id": 7, "line": "line 1" }));
}

#[tokio::test]
async fn test_uncoercible_path_variable_is_absent() {
    let res = get(&app(), "/orders/seven/items/a").await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json(), json!({ "id": null, "line": "a" }));

    // a handler that requires it reports the missing value
    let res = get(&app(), "/orders/strict/seven").await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.message(), "Parameter id is missing or invalid");
}

#[tokio::test]
async fn test_first_declared_failure_wins() {
    let res = get(&app(), "/orders/mismatched").await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.message(), "Path Variable id is required");
}

#[tokio::test]
async fn test_pageable_defaults() {
    let res = get(&app(), "/orders/").await;
    assert_eq!(
        res.json(),
        json!({ "page": 0, "size": 50, "order": null, "sql": null })
    );
    assert_eq!(get(&app(), "/orders/defaults").await.json(), json!(true));
}

#[tokio::test]
async fn test_pageable_from_query() {
    let res = get(&app(), "/orders?page=2&size=10&order=item,desc").await;
    assert_eq!(
        res.json(),
        json!({ "page": 2, "size": 10, "order": "item,desc", "sql": " ORDER BY t.item DESC" })
    );
}

#[tokio::test]
async fn test_pageable_ignores_garbage() {
    let res = get(&app(), "/orders?page=abc&size=-1&order=item").await;
    assert_eq!(
        res.json(),
        json!({ "page": 0, "size": 50, "order": "item", "sql": null })
    );
}

#[tokio::test]
async fn test_body_is_deserialized() {
    let res = post_json(&app(), "/orders", r#"{"item":"lamp","quantity":2}"#).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json(), json!({ "item": "lamp", "quantity": 2 }));
}

#[tokio::test]
async fn test_unparsable_body_is_400() {
    let app = app();
    for body in ["{not json", "", r#"{"item":"lamp"}"#] {
        let res = post_json(&app, "/orders", body).await;
        assert_eq!(res.status, StatusCode::BAD_REQUEST, "body {body:?}");
        assert_eq!(res.message(), "Request Body could not be parsed");
    }
}

#[tokio::test]
async fn test_query_map_collects_every_parameter() {
    let res = get(&app(), "/orders/filters?color=red&size=m&color=blue").await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json(), json!({ "color": "blue", "size": "m" }));
}
