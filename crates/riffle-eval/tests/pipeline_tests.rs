//! End-to-end pipeline tests for `riffle-eval`.
//!
//! These tests verify behavior through the public API only:
//! - Operator composition (scan, filter, project, join, concat)
//! - Window-function evaluation spliced into a streaming pipeline
//! - Locals binding and dynamic fallback
//! - Scalar-function overload dispatch
//! - Cancellation, buffering limits, and typing modes

use std::sync::Arc;

use riffle_core::{TypeTag, Value};
use riffle_eval::exec::operators::{
    ConcatOp, FilterOp, JoinKind, NestedLoopJoinOp, ProjectColumn, ProjectOp, ScanOp,
    WindowSpliceOp,
};
use riffle_eval::exec::window::{WindowAssignment, WindowFunctionRegistry};
use riffle_eval::{
    bind_locals, evaluate, Alias, BindingName, Candidate, DispatchSite, EvalConfig, EvalContext,
    EvalError, ParamType, RegisterFile, Relation, ScalarExpr, TypingMode,
};

fn int_list(ns: &[i64]) -> Value {
    Value::List(ns.iter().copied().map(Value::Int64).collect())
}

fn scan(ns: &[i64], dest: usize) -> Relation {
    ScanOp::new(int_list(ns), dest).into_relation()
}

fn drain(
    relation: &mut Relation,
    regs: &mut RegisterFile,
    ctx: &EvalContext,
    width: usize,
) -> Vec<Vec<Value>> {
    let mut rows = Vec::new();
    while relation.next_row(regs, ctx).expect("pipeline failed") {
        rows.push((0..width).map(|i| regs.value(i).clone()).collect());
    }
    rows
}

fn eq_site() -> Arc<DispatchSite> {
    Arc::new(DispatchSite::new(
        "eq",
        vec![Candidate::new(
            vec![ParamType::Any, ParamType::Any],
            |args| Ok(Value::Bool(args[0] == args[1])),
        )],
    ))
}

// ============================================================================
// Operator Composition Tests
// ============================================================================

mod pipelines {
    use super::*;

    #[test]
    fn scan_filter_project() {
        let is_even = Arc::new(DispatchSite::new(
            "is_even",
            vec![Candidate::new(
                vec![ParamType::Exact(TypeTag::Int64)],
                |args| Ok(Value::Bool(args[0].as_i64().unwrap_or_default() % 2 == 0)),
            )],
        ));
        let predicate = ScalarExpr::call(is_even, vec![ScalarExpr::register(0)]);
        let filtered = FilterOp::new(scan(&[1, 2, 3, 4, 5, 6], 0), predicate).into_relation();
        let columns = vec![ProjectColumn::new(ScalarExpr::register(0), 1).with_name("x")];
        let mut relation = ProjectOp::new(filtered, columns).into_relation();

        let mut regs = RegisterFile::new(2);
        let ctx = EvalContext::new();
        let rows = drain(&mut relation, &mut regs, &ctx, 2);

        let projected: Vec<&Value> = rows.iter().map(|row| &row[1]).collect();
        assert_eq!(
            projected,
            vec![&Value::Int64(2), &Value::Int64(4), &Value::Int64(6)]
        );
        assert_eq!(regs.name(1), Some(&Value::Str("x".to_owned())));
    }

    #[test]
    fn join_pairs_matching_rows() {
        let condition = ScalarExpr::call(
            eq_site(),
            vec![ScalarExpr::register(0), ScalarExpr::register(1)],
        );
        let join = NestedLoopJoinOp::new(
            scan(&[1, 2, 3], 0),
            scan(&[2, 3, 4], 1),
            vec![1],
            JoinKind::Inner,
        )
        .with_condition(condition);

        let mut relation = join.into_relation();
        let mut regs = RegisterFile::new(2);
        let ctx = EvalContext::new();
        let rows = drain(&mut relation, &mut regs, &ctx, 2);
        assert_eq!(
            rows,
            vec![
                vec![Value::Int64(2), Value::Int64(2)],
                vec![Value::Int64(3), Value::Int64(3)],
            ]
        );
    }

    #[test]
    fn concat_appends_every_input() {
        let concat = ConcatOp::new(vec![scan(&[1], 0), scan(&[], 0), scan(&[2, 3], 0)]);
        let mut relation = concat.into_relation();
        let mut regs = RegisterFile::new(1);
        let ctx = EvalContext::new();
        let rows = drain(&mut relation, &mut regs, &ctx, 1);
        assert_eq!(
            rows,
            vec![
                vec![Value::Int64(1)],
                vec![Value::Int64(2)],
                vec![Value::Int64(3)],
            ]
        );
        assert_eq!(relation.rows_yielded(), 3);
    }
}

// ============================================================================
// Window Function Tests
// ============================================================================

mod window {
    use super::*;

    #[test]
    fn row_number_lag_and_lead_end_to_end() {
        let registry = WindowFunctionRegistry::with_builtins();
        let x = ScalarExpr::register(0);
        let assignments = vec![
            WindowAssignment::new(
                registry.resolve("row_number", vec![]).expect("row_number"),
                1,
            ),
            WindowAssignment::new(registry.resolve("lag", vec![x.clone()]).expect("lag"), 2),
            WindowAssignment::new(registry.resolve("lead", vec![x.clone()]).expect("lead"), 3),
        ];
        let splice = WindowSpliceOp::new(scan(&[1, 2, 3], 0), assignments).with_order_by(vec![x]);

        let mut relation = splice.into_relation();
        let mut regs = RegisterFile::new(4);
        let ctx = EvalContext::new();
        let rows = drain(&mut relation, &mut regs, &ctx, 4);

        assert_eq!(
            rows,
            vec![
                vec![
                    Value::Int64(1),
                    Value::Int64(1),
                    Value::Null,
                    Value::Int64(2)
                ],
                vec![
                    Value::Int64(2),
                    Value::Int64(2),
                    Value::Int64(1),
                    Value::Int64(3)
                ],
                vec![
                    Value::Int64(3),
                    Value::Int64(3),
                    Value::Int64(2),
                    Value::Null
                ],
            ]
        );
    }

    #[test]
    fn ranking_family_over_tied_order_keys() {
        let registry = WindowFunctionRegistry::with_builtins();
        let assignments = vec![
            WindowAssignment::new(registry.resolve("rank", vec![]).expect("rank"), 1),
            WindowAssignment::new(
                registry.resolve("dense_rank", vec![]).expect("dense_rank"),
                2,
            ),
            WindowAssignment::new(
                registry.resolve("row_number", vec![]).expect("row_number"),
                3,
            ),
        ];
        let splice = WindowSpliceOp::new(scan(&[10, 10, 20, 30, 30, 30], 0), assignments)
            .with_order_by(vec![ScalarExpr::register(0)]);

        let mut relation = splice.into_relation();
        let mut regs = RegisterFile::new(4);
        let ctx = EvalContext::new();
        let rows = drain(&mut relation, &mut regs, &ctx, 4);

        let ranks: Vec<i64> = rows.iter().map(|row| as_i64(&row[1])).collect();
        let dense: Vec<i64> = rows.iter().map(|row| as_i64(&row[2])).collect();
        let numbers: Vec<i64> = rows.iter().map(|row| as_i64(&row[3])).collect();
        assert_eq!(ranks, vec![1, 1, 3, 4, 4, 4]);
        assert_eq!(dense, vec![1, 1, 2, 3, 3, 3]);
        assert_eq!(numbers, vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn partition_boundaries_reset_state() {
        let registry = WindowFunctionRegistry::with_builtins();
        let assignments = vec![WindowAssignment::new(
            registry.resolve("row_number", vec![]).expect("row_number"),
            1,
        )];
        let splice = WindowSpliceOp::new(scan(&[7, 7, 8], 0), assignments)
            .with_partition_by(vec![ScalarExpr::register(0)]);

        let mut relation = splice.into_relation();
        let mut regs = RegisterFile::new(2);
        let ctx = EvalContext::new();
        let rows = drain(&mut relation, &mut regs, &ctx, 2);

        let numbers: Vec<i64> = rows.iter().map(|row| as_i64(&row[1])).collect();
        assert_eq!(numbers, vec![1, 2, 1]);
        assert_eq!(ctx.stats().partitions_evaluated(), 2);
        assert_eq!(ctx.stats().rows_buffered(), 3);
    }

    #[test]
    fn unimplemented_and_unknown_names_fail_differently() {
        let registry = WindowFunctionRegistry::with_builtins();

        let err = registry.resolve("first_value", vec![]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "window function not implemented: first_value"
        );

        let err = registry.resolve("frobnicate", vec![]).unwrap_err();
        assert_eq!(err.to_string(), "unknown window function: frobnicate");
    }

    fn as_i64(value: &Value) -> i64 {
        value.as_i64().expect("expected an integer")
    }
}

// ============================================================================
// Locals Binding Tests
// ============================================================================

mod bindings {
    use super::*;

    #[test]
    fn aliases_resolve_by_declared_case_mode() {
        let bindings = bind_locals(&[Alias::new("Price")]);
        let mut regs = RegisterFile::new(1);
        regs.set_value(0, Value::Int64(42));

        let exact = bindings
            .get(&BindingName::sensitive("Price"), &regs)
            .expect("lookup failed");
        assert_eq!(exact, Some(Value::Int64(42)));

        let folded = bindings
            .get(&BindingName::insensitive("PRICE"), &regs)
            .expect("lookup failed");
        assert_eq!(folded, Some(Value::Int64(42)));

        let wrong_case = bindings
            .get(&BindingName::sensitive("price"), &regs)
            .expect("lookup failed");
        assert_eq!(wrong_case, None);
    }

    #[test]
    fn at_bindings_observe_synthesized_ordinals() {
        let bindings = Arc::new(bind_locals(&[Alias::with_at("item", "idx")]));
        let at = ScalarExpr::binding(Arc::clone(&bindings), BindingName::insensitive("IDX"));

        let mut relation = scan(&[50, 60], 0);
        let mut regs = RegisterFile::new(1);
        let ctx = EvalContext::new();
        let mut ordinals = Vec::new();
        while relation.next_row(&mut regs, &ctx).expect("scan failed") {
            ordinals.push(evaluate(&at, &regs, &ctx).expect("at-binding failed"));
        }
        assert_eq!(ordinals, vec![Value::Int64(0), Value::Int64(1)]);
    }

    #[test]
    fn at_binding_over_unnamed_rows_is_missing() {
        let bindings = Arc::new(bind_locals(&[Alias::with_at("item", "idx")]));
        let at = ScalarExpr::binding(Arc::clone(&bindings), BindingName::sensitive("idx"));

        let bag = Value::Bag(vec![Value::Int64(9)]);
        let mut relation = ScanOp::new(bag, 0).into_relation();
        let mut regs = RegisterFile::new(1);
        let ctx = EvalContext::new();
        assert!(relation.next_row(&mut regs, &ctx).expect("scan failed"));
        assert_eq!(
            evaluate(&at, &regs, &ctx).expect("at-binding failed"),
            Value::Missing
        );
    }

    #[test]
    fn duplicate_aliases_fail_only_when_looked_up() {
        let bindings = bind_locals(&[Alias::new("x"), Alias::new("x"), Alias::new("y")]);
        let mut regs = RegisterFile::new(3);
        regs.set_value(2, Value::Int64(3));

        let err = bindings
            .get(&BindingName::sensitive("x"), &regs)
            .unwrap_err();
        assert!(matches!(err, EvalError::AmbiguousBinding { name } if name == "x"));

        let ok = bindings
            .get(&BindingName::sensitive("y"), &regs)
            .expect("lookup failed");
        assert_eq!(ok, Some(Value::Int64(3)));
    }

    #[test]
    fn unresolved_names_fall_back_to_struct_fields() {
        let bindings = bind_locals(&[Alias::new("first"), Alias::new("second")]);
        let mut regs = RegisterFile::new(2);
        regs.set_value(
            0,
            Value::Struct(vec![("city".to_owned(), Value::Str("paris".to_owned()))]),
        );
        regs.set_value(
            1,
            Value::Struct(vec![("city".to_owned(), Value::Str("lyon".to_owned()))]),
        );

        // Earliest register in row order wins.
        let city = bindings
            .get(&BindingName::sensitive("city"), &regs)
            .expect("fallback failed");
        assert_eq!(city, Some(Value::Str("paris".to_owned())));

        let folded = bindings
            .get(&BindingName::insensitive("CITY"), &regs)
            .expect("fallback failed");
        assert_eq!(folded, Some(Value::Str("paris".to_owned())));
    }
}

// ============================================================================
// Scalar Dispatch Tests
// ============================================================================

mod dispatch {
    use super::*;

    fn tagged(tag: &'static str) -> Candidate {
        Candidate::new(vec![ParamType::Any, ParamType::Any], move |_args| {
            Ok(Value::Str(tag.to_owned()))
        })
    }

    #[test]
    fn exact_pair_beats_any_pair() {
        let exact = Candidate::new(
            vec![
                ParamType::Exact(TypeTag::Int32),
                ParamType::Exact(TypeTag::Int32),
            ],
            |_args| Ok(Value::Str("int32".to_owned())),
        );
        // Declared first, still loses to the more specific candidate.
        let site = DispatchSite::new("f", vec![tagged("any"), exact]);

        let ctx = EvalContext::new();
        let result = site
            .dispatch(&[Value::Int32(1), Value::Int32(2)], &ctx)
            .expect("dispatch failed");
        assert_eq!(result, Value::Str("int32".to_owned()));
    }

    #[test]
    fn declaration_order_breaks_exact_ties() {
        let site = DispatchSite::new("f", vec![tagged("first"), tagged("second")]);
        let ctx = EvalContext::new();
        let result = site
            .dispatch(&[Value::Null, Value::Null], &ctx)
            .expect("dispatch failed");
        assert_eq!(result, Value::Str("first".to_owned()));
    }

    #[test]
    fn widening_parameters_coerce_their_arguments() {
        let site = DispatchSite::new(
            "pass",
            vec![Candidate::new(
                vec![ParamType::Widening(TypeTag::Int64)],
                |args| Ok(args[0].clone()),
            )],
        );
        let ctx = EvalContext::new();
        let result = site
            .dispatch(&[Value::Int32(5)], &ctx)
            .expect("dispatch failed");
        // The body received the widened value.
        assert_eq!(result, Value::Int64(5));
    }

    #[test]
    fn no_matching_overload_reports_argument_types() {
        let site = DispatchSite::new(
            "f",
            vec![Candidate::new(
                vec![ParamType::Exact(TypeTag::Int64)],
                |_args| Ok(Value::Null),
            )],
        );
        let ctx = EvalContext::new();
        let err = site
            .dispatch(&[Value::Str("oops".to_owned())], &ctx)
            .unwrap_err();
        assert_eq!(err.to_string(), "no matching overload for f(STRING)");
        assert_eq!(ctx.stats().dispatch_calls(), 1);
    }
}

// ============================================================================
// Cancellation and Limit Tests
// ============================================================================

mod cancellation {
    use super::*;

    #[test]
    fn token_interrupts_between_rows() {
        let xs: Vec<i64> = (0..100).collect();
        let mut relation = scan(&xs, 0);
        let mut regs = RegisterFile::new(1);
        let ctx = EvalContext::new();
        let token = ctx.cancellation_token();

        assert!(relation.next_row(&mut regs, &ctx).expect("pull failed"));
        assert!(relation.next_row(&mut regs, &ctx).expect("pull failed"));
        token.cancel();
        assert!(matches!(
            relation.next_row(&mut regs, &ctx),
            Err(EvalError::Interrupted)
        ));
    }

    #[test]
    #[should_panic(expected = "failed relation")]
    fn pulling_after_interruption_panics() {
        let mut relation = scan(&[1, 2, 3], 0);
        let mut regs = RegisterFile::new(1);
        let ctx = EvalContext::new();
        ctx.cancel();
        let _ = relation.next_row(&mut regs, &ctx);
        let _ = relation.next_row(&mut regs, &ctx);
    }

    #[test]
    fn window_buffering_respects_the_partition_cap() {
        let registry = WindowFunctionRegistry::with_builtins();
        let assignments = vec![WindowAssignment::new(
            registry.resolve("row_number", vec![]).expect("row_number"),
            1,
        )];
        let splice = WindowSpliceOp::new(scan(&[1, 2, 3, 4], 0), assignments);

        let config = EvalConfig::new().with_max_partition_rows(3);
        let ctx = EvalContext::new().with_config(config);
        let mut relation = splice.into_relation();
        let mut regs = RegisterFile::new(2);

        let err = relation.next_row(&mut regs, &ctx).unwrap_err();
        assert_eq!(err.to_string(), "window partition exceeds 3 buffered rows");
    }
}

// ============================================================================
// Typing Mode Tests
// ============================================================================

mod typing {
    use super::*;

    #[test]
    fn strict_mode_rejects_unbound_names() {
        let bindings = Arc::new(bind_locals(&[]));
        let expr = ScalarExpr::binding(bindings, BindingName::sensitive("ghost"));
        let regs = RegisterFile::new(0);
        let ctx = EvalContext::new();

        let err = evaluate(&expr, &regs, &ctx).unwrap_err();
        assert_eq!(err.to_string(), "no such binding: ghost");
    }

    #[test]
    fn permissive_mode_yields_missing_for_unbound_names() {
        let bindings = Arc::new(bind_locals(&[]));
        let expr = ScalarExpr::binding(bindings, BindingName::sensitive("ghost"));
        let regs = RegisterFile::new(0);
        let config = EvalConfig::new().with_typing(TypingMode::Permissive);
        let ctx = EvalContext::new().with_config(config);

        assert_eq!(
            evaluate(&expr, &regs, &ctx).expect("evaluation failed"),
            Value::Missing
        );
    }

    #[test]
    fn field_access_on_non_structs_depends_on_mode() {
        let expr = ScalarExpr::field(ScalarExpr::literal(Value::Int64(1)), "x");
        let regs = RegisterFile::new(0);

        let strict = EvalContext::new();
        assert!(evaluate(&expr, &regs, &strict).is_err());

        let permissive =
            EvalContext::new().with_config(EvalConfig::new().with_typing(TypingMode::Permissive));
        assert_eq!(
            evaluate(&expr, &regs, &permissive).expect("evaluation failed"),
            Value::Missing
        );
    }

    #[test]
    fn struct_field_access_works_in_both_modes() {
        let base = ScalarExpr::literal(Value::Struct(vec![(
            "name".to_owned(),
            Value::Str("ada".to_owned()),
        )]));
        let expr = ScalarExpr::field(base, "name");
        let regs = RegisterFile::new(0);
        let ctx = EvalContext::new();

        assert_eq!(
            evaluate(&expr, &regs, &ctx).expect("evaluation failed"),
            Value::Str("ada".to_owned())
        );
    }
}
