// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[yare::parameterized(
    node = { Scope::Node, AggregateScope::NodeFanout },
    step = { Scope::Step, AggregateScope::StepSequence },
)]
fn scope_maps_to_core(scope: Scope, expected: AggregateScope) {
    assert_eq!(AggregateScope::from(scope), expected);
}

#[test]
fn unknown_token_is_an_error() {
    let args = AggregateArgs { scope: Scope::Node, statuses: vec!["SUCCEEDED".into(), "MAYBE".into()] };
    let err = handle(args, OutputFormat::Json).unwrap_err();
    assert!(err.to_string().contains("MAYBE"));
}

#[test]
fn valid_tokens_succeed() {
    let args = AggregateArgs { scope: Scope::Step, statuses: vec!["running".into(), "WAITING".into()] };
    assert!(handle(args, OutputFormat::Json).is_ok());
}
