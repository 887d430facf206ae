//! # Parameter Binding
//!
//! Handler parameters are declared up front as a list of [`ParamSpec`]s. At
//! request time [`bind`] resolves each one from its [`ParamSource`] and
//! coerces the raw text or bytes into the declared type:
//!
//! | Source | Missing | Coercion failure |
//! |---|---|---|
//! | `PathVariable` | 400 `Path Variable <name> is required` | absent |
//! | `QueryParam` (required) | 400 `Request Parameter <name> is required` | absent |
//! | `QueryParam` (optional) | absent | absent |
//! | `Body` | read as JSON `null` | 400 `Request Body could not be parsed` |
//! | `QueryMap` | empty object | absent |
//!
//! Text binds as-is to string targets and is parsed as JSON otherwise, so
//! `?id=7` binds to both `u64` and `String` while `?q="x"` stays quoted.
//! A body that is not JSON still binds to a string target when it is UTF-8.

mod core;

pub use self::core::{bind, Args, BoundValue, Coercer, ParamSource, ParamSpec, RawValue};
