//! Fuzz tests for the syntax parser.
//!
//! Property-based testing with bolero: the parser must never panic or
//! loop forever, and must always produce a tree rooted at `ROOT` (spec.md
//! §8 property 6, totality), no matter how malformed the input is.

use crate::kind::{Kind, NodeKind};
use crate::testing::Fixture;

#[test]
fn parse_no_crash() {
    bolero::check!().for_each(|input| {
        let input = String::from_utf8_lossy(input);
        run_test(&input);
    });
}

fn run_test(input: &str) {
    let fixture = Fixture::new();
    let parse = fixture.parse(input);

    assert_eq!(
        Kind::from_raw(parse.root.element().kind()),
        Kind::Node(NodeKind::Root),
        "parsing must always produce a Root node, even on malformed input"
    );
}
