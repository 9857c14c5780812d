//! `#[derive(Fields)]` on named, tuple, generic and unit structs.

use pretty_assertions::assert_eq;
use stackerr::prelude::*;
use stackerr::{json, Fields, Value};
use std::io;
use std::net::Ipv4Addr;

#[derive(Fields)]
struct Request<'a> {
    method: &'a str,
    #[fields(rename = "status")]
    code: u16,
    #[fields(display)]
    peer: Ipv4Addr,
    #[fields(debug)]
    kind: io::ErrorKind,
    #[fields(skip)]
    #[allow(dead_code)]
    token: String,
}

#[derive(Fields)]
struct Pair(u8, #[fields(rename = "second")] bool);

#[derive(Fields)]
struct Tagged<T, U> {
    tag: T,
    #[fields(display, rename = "shown")]
    label: U,
}

#[derive(Fields)]
struct Empty;

#[derive(Fields)]
struct Raw {
    r#type: &'static str,
}

fn request() -> Request<'static> {
    Request {
        method: "GET",
        code: 503,
        peer: Ipv4Addr::new(10, 0, 0, 7),
        kind: io::ErrorKind::TimedOut,
        token: "secret".to_string(),
    }
}

#[test]
fn named_struct() {
    assert_eq!(
        request().into_fields(),
        [
            ("method", json!("GET")),
            ("status", json!(503)),
            ("peer", json!("10.0.0.7")),
            ("kind", json!("TimedOut")),
        ]
        .into_fields()
    );
}

#[test]
fn tuple_struct() {
    assert_eq!(
        Pair(7, true).into_fields(),
        [("0", json!(7)), ("second", json!(true))].into_fields()
    );
}

#[test]
fn generic_struct() {
    let tagged = Tagged {
        tag: 42i64,
        label: 'x',
    };
    assert_eq!(
        tagged.into_fields(),
        [("tag", json!(42)), ("shown", json!("x"))].into_fields()
    );
}

#[test]
fn unit_and_raw_idents() {
    assert!(Empty.into_fields().is_empty());
    assert_eq!(
        Raw { r#type: "disk" }.into_fields(),
        [("type", "disk")].into_fields()
    );
}

#[test]
fn attach_to_error_and_generator() {
    let err = AnnotatedError::new("upstream unavailable").with_fields(request());
    assert_eq!(err.field("status"), Some(&json!(503)));
    assert_eq!(err.field("token"), None);

    let mut gateway = Generator::new("gateway");
    gateway.with_fields(Pair(1, false));
    let err = gateway.error("rejected");
    assert_eq!(err.field("second"), Some(&Value::Bool(false)));
    assert_eq!(err.to_string(), "gateway: rejected");
}
