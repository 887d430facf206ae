//! Tests for package scanning and route table construction from a catalog.

use bounce::router::handler_fn;
use bounce::scanner::{has_request_mapping, is_controller, is_interceptor};
use bounce::{
    Bounce, Catalog, ConfigError, Container, Controller, ControllerMapping, HandlerTable,
    Interceptor, RequestMapping, Router,
};
use std::sync::Arc;

mod shop {
    use super::*;

    pub struct Cart;

    impl Controller for Cart {
        fn mapping() -> ControllerMapping {
            ControllerMapping::prefix("/cart")
        }

        fn handlers(table: &mut HandlerTable<Self>) {
            table
                .route(
                    "show",
                    RequestMapping::get("/"),
                    Vec::new(),
                    |_me, _args| async move { Ok(vec!["apple"]) },
                )
                .declare("recalculate")
                .route(
                    "clear",
                    RequestMapping::delete("/"),
                    Vec::new(),
                    |_me, _args| async move { Ok(Vec::<String>::new()) },
                );
        }
    }

    /// Both a controller and an interceptor.
    pub struct Checkout;

    impl Controller for Checkout {
        fn mapping() -> ControllerMapping {
            ControllerMapping::prefix("/checkout")
        }

        fn handlers(table: &mut HandlerTable<Self>) {
            table.route(
                "start",
                RequestMapping::post("/"),
                Vec::new(),
                |_me, _args| async move { Ok("started") },
            );
        }
    }

    impl Interceptor for Checkout {
        fn configure(self: Arc<Self>, router: &mut Router) -> Result<(), ConfigError> {
            router
                .route("/checkout")
                .order(-5)
                .name("checkout-audit")
                .handler(handler_fn(|_ctx| {}))
        }
    }
}

mod reporting {
    use super::*;

    pub struct Reports;

    impl Controller for Reports {
        fn handlers(table: &mut HandlerTable<Self>) {
            table.route(
                "daily",
                RequestMapping::get("/reports/daily"),
                Vec::new(),
                |_me, _args| async move { Ok(0_u32) },
            );
        }
    }
}

fn catalog() -> Catalog {
    let mut catalog = Catalog::new();
    catalog
        .controller::<shop::Cart>()
        .controller::<shop::Checkout>()
        .interceptor::<shop::Checkout>()
        .controller::<reporting::Reports>();
    catalog
}

#[test]
fn test_scan_filters_by_prefix() {
    let catalog = catalog();
    let found = catalog.scan(&["scanner_tests::shop"], is_controller()).unwrap();
    let names: Vec<&str> = found.iter().map(|c| c.type_name()).collect();
    assert_eq!(
        names,
        vec!["scanner_tests::shop::Cart", "scanner_tests::shop::Checkout"]
    );

    let found = catalog
        .scan(&["scanner_tests::reporting", "elsewhere"], is_controller())
        .unwrap();
    assert_eq!(found.len(), 1);

    let found = catalog.scan(&["not_a_crate"], is_controller()).unwrap();
    assert!(found.is_empty());
}

#[test]
fn test_scan_without_packages_is_an_error() {
    let empty: [&str; 0] = [];
    let err = catalog().scan(&empty, is_controller()).unwrap_err();
    assert!(matches!(err, ConfigError::NoPackages));
}

#[test]
fn test_capabilities_merge_per_type() {
    let catalog = catalog();
    assert_eq!(catalog.types().len(), 3);

    let interceptors = catalog.scan(&["scanner_tests"], is_interceptor()).unwrap();
    assert_eq!(interceptors.len(), 1);
    assert!(interceptors[0].controller().is_some());
    assert_eq!(interceptors[0].type_name(), "scanner_tests::shop::Checkout");
}

#[test]
fn test_only_mapped_methods_are_selected() {
    let catalog = catalog();
    let cart = &catalog.scan(&["scanner_tests::shop"], is_controller()).unwrap()[0];

    let all: Vec<&str> = cart.methods(|_| true).map(|m| m.name()).collect();
    assert_eq!(all, vec!["show", "recalculate", "clear"]);

    let mapped: Vec<&str> = cart.methods(has_request_mapping()).map(|m| m.name()).collect();
    assert_eq!(mapped, vec!["show", "clear"]);
}

fn container() -> Container {
    let container = Container::new();
    container
        .instance(shop::Cart)
        .instance(shop::Checkout)
        .instance(reporting::Reports);
    container
}

#[test]
fn test_build_registers_interceptors_and_mapped_methods() {
    let app = Bounce::builder()
        .packages(["scanner_tests::shop"])
        .catalog(catalog())
        .resolver(Arc::new(container()))
        .build()
        .unwrap();

    let routes: Vec<String> = app.router().entries().iter().map(ToString::to_string).collect();
    assert_eq!(
        routes,
        vec![
            "* /checkout (order -5) -> checkout-audit",
            "GET /cart/ (order 100) -> Cart::show",
            "DELETE /cart/ (order 100) -> Cart::clear",
            "POST /checkout/ (order 100) -> Checkout::start",
        ]
    );
    assert_eq!(app.config().packages, vec!["scanner_tests::shop".to_string()]);
}

#[test]
fn test_unresolvable_type_aborts_build() {
    let err = Bounce::builder()
        .packages(["scanner_tests"])
        .catalog(catalog())
        .resolver(Arc::new(Container::new()))
        .build()
        .unwrap_err();
    match err {
        ConfigError::Resolve { type_name, .. } => {
            assert_eq!(type_name, "scanner_tests::shop::Checkout");
        }
        other => panic!("expected Resolve error, got {other:?}"),
    }
}

#[test]
fn test_empty_package_list_aborts_build() {
    let err = Bounce::builder()
        .catalog(catalog())
        .resolver(Arc::new(container()))
        .build()
        .unwrap_err();
    assert!(matches!(err, ConfigError::NoPackages));
}
