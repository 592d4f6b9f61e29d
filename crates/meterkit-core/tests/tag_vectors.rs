//! Tag materialization vector tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::fs;

use vector_loader::TagVector;

fn load(name: &str) -> TagVector {
    let s = fs::read_to_string(format!("tests/vectors/{name}")).unwrap();
    serde_json::from_str(&s).unwrap()
}

#[test]
fn tag_vectors() {
    let files = [
        "tags_local_overrides_global.json",
        "tags_resource_layer.json",
        "tags_count_cap.json",
        "tags_blank_and_long.json",
    ];

    for f in files {
        let v = load(f);
        let out = v.config().materialize(&v.local());
        let got: Vec<(String, String)> = out.into_iter().collect();
        assert_eq!(got, v.expect, "vector={}", v.description);
    }
}
