use super::{handler_fn, PathPattern, Router};
use http::Method;

#[test]
fn test_root_path() {
    let p = PathPattern::compile("/").unwrap();
    assert!(p.matches("/").is_some());
    assert!(p.matches("/x").is_none());
    assert!(p.param_names().is_empty());
}

#[test]
fn test_parameterized_path() {
    let p = PathPattern::compile("/items/{id}").unwrap();
    let params = p.matches("/items/123").unwrap();
    assert_eq!(params[0].0.as_ref(), "id");
    assert_eq!(params[0].1, "123");
    assert!(p.matches("/items").is_none());
    assert!(p.matches("/items/1/2").is_none());
}

#[test]
fn test_nested_path() {
    let p = PathPattern::compile("/a/{b}/c").unwrap();
    assert!(p.matches("/a/1/c").is_some());
    let names: Vec<&str> = p.param_names().iter().map(AsRef::as_ref).collect();
    assert_eq!(names, vec!["b"]);
}

#[test]
fn test_trailing_slash_ignored() {
    let p = PathPattern::compile("/pets/").unwrap();
    assert!(p.matches("/pets").is_some());
    assert!(p.matches("/pets/").is_some());
}

#[test]
fn test_wildcard_is_prefix_match() {
    let p = PathPattern::compile("/admin/*").unwrap();
    assert!(p.matches("/admin").is_some());
    assert!(p.matches("/admin/echo").is_some());
    assert!(p.matches("/admin/a/b").is_some());
    assert!(p.matches("/administrator").is_none());
    assert!(p.matches("/pets").is_none());

    let all = PathPattern::compile("/*").unwrap();
    assert!(all.matches("/").is_some());
    assert!(all.matches("/anything/else").is_some());
}

#[test]
fn test_literal_segments_are_escaped() {
    let p = PathPattern::compile("/files/a.b").unwrap();
    assert!(p.matches("/files/a.b").is_some());
    assert!(p.matches("/files/axb").is_none());
}

#[test]
fn test_bad_patterns_rejected() {
    assert!(PathPattern::compile("/a/{id").is_err());
    assert!(PathPattern::compile("/a/{}").is_err());
    assert!(PathPattern::compile("/a/*/b").is_err());
}

#[test]
fn test_entries_sorted_by_order_then_registration() {
    let mut router = Router::new();
    router.route("/x").name("late").order(200).handler(handler_fn(|_| {})).unwrap();
    router.route("/x").name("first").handler(handler_fn(|_| {})).unwrap();
    router.route("/x").name("early").order(-5).handler(handler_fn(|_| {})).unwrap();
    router.route("/x").name("second").handler(handler_fn(|_| {})).unwrap();

    let names: Vec<&str> = router.entries().iter().map(|e| e.name()).collect();
    assert_eq!(names, vec!["early", "first", "second", "late"]);
}

#[test]
fn test_matching_filters_verb_and_path() {
    let mut router = Router::new();
    router
        .route("/pets/{id}")
        .method(Method::GET)
        .name("get")
        .handler(handler_fn(|_| {}))
        .unwrap();
    router
        .route("/pets/{id}")
        .method(Method::DELETE)
        .name("delete")
        .handler(handler_fn(|_| {}))
        .unwrap();
    router.any().order(0).name("all").handler(handler_fn(|_| {})).unwrap();

    let hits: Vec<&str> = router
        .matching(&Method::GET, "/pets/3")
        .map(|(e, _)| e.name())
        .collect();
    assert_eq!(hits, vec!["all", "get"]);

    let hits: Vec<&str> = router
        .matching(&Method::POST, "/other")
        .map(|(e, _)| e.name())
        .collect();
    assert_eq!(hits, vec!["all"]);
}
