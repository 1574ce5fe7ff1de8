//! Edge case tests for wpp-eval

#[cfg(test)]
mod tests {
    use crate::{Config, Evaluator};

    fn try_eval(source: &str) -> wpp_util::Result<Vec<u8>> {
        let mut evaluator = Evaluator::new(Config::default());
        evaluator.eval_source("<test>", source.as_bytes().to_vec())
    }

    fn eval_ok(source: &str) -> String {
        String::from_utf8(try_eval(source).expect("evaluation failure"))
            .expect("non-UTF-8 output")
    }

    // ==================== EDGE CASES ====================

    #[test]
    fn test_edge_empty_document_yields_empty() {
        assert_eq!(eval_ok(""), "");
    }

    #[test]
    fn test_edge_zero_arg_function_with_parens() {
        assert_eq!(eval_ok("let f() \"x\" f()"), "x");
    }

    #[test]
    fn test_edge_zero_arg_function_without_parens() {
        assert_eq!(eval_ok("let f() \"x\" f"), "x");
    }

    #[test]
    fn test_edge_parameter_shadows_outer_function() {
        // The parameter `v` is a variable; the nullary lookup prefers the
        // function but falls back per name, newest frame first.
        assert_eq!(eval_ok("var v \"outer\" let f(v) v f(\"arg\")"), "arg");
    }

    #[test]
    fn test_edge_function_value_used_twice() {
        assert_eq!(eval_ok("let two(x) x .. x two(two(\"a\"))"), "aaaa");
    }

    #[test]
    fn test_edge_map_scrutinee_from_call() {
        assert_eq!(
            eval_ok("let pick \"b\" map pick { \"a\" -> \"1\" \"b\" -> \"2\" }"),
            "2"
        );
    }

    #[test]
    fn test_edge_map_pattern_is_expression() {
        assert_eq!(
            eval_ok("var key \"k\" map \"k\" { key -> \"hit\" * -> \"miss\" }"),
            "hit"
        );
    }

    #[test]
    fn test_edge_empty_string_arms() {
        assert_eq!(eval_ok("map \"\" { \"\" -> \"empty\" * -> \"other\" }"), "empty");
    }

    #[test]
    fn test_edge_binary_values_compare_bytewise() {
        assert_eq!(
            eval_ok("map x\"FF\" { x\"FE\" -> \"1\" x\"FF\" -> \"2\" }"),
            "2"
        );
    }

    #[test]
    fn test_edge_length_of_hex_string() {
        // length(s) counts the bytes the evaluator produced for s.
        assert_eq!(eval_ok("length(x\"DEAD_BEEF\")"), "4");
    }

    #[test]
    fn test_edge_codeify_result_of_stringify() {
        assert_eq!(eval_ok("var greet \"hi\" = !greet"), "hi");
    }

    #[test]
    fn test_edge_meta_definitions_inside_call_are_frame_local() {
        // `source` shares the current environment, so a definition made
        // during a call lands in the call frame and dies with it.
        assert!(try_eval(
            "let def(name) source(\"let \" .. name .. \" \\\"v\\\"\") def(\"made\") made"
        )
        .is_err());
    }

    #[test]
    fn test_edge_prefix_from_variable() {
        assert_eq!(
            eval_ok("var ns \"web/\" prefix ns { let tag(x) \"<\" .. x .. \">\" } web/tag(\"p\")"),
            "<p>"
        );
    }

    #[test]
    fn test_edge_drop_inside_function_affects_caller_env() {
        assert_eq!(
            eval_ok("let v \"old\" let cleanup(x) { drop v() x } cleanup(\"done\")"),
            "done"
        );
        // `v` was dropped by the call, so reading it afterwards fails.
        assert!(try_eval("let v \"old\" let cleanup(x) { drop v() x } cleanup(\"_\") v").is_err());
    }

    #[test]
    fn test_edge_shadow_then_drop_across_meta_boundary() {
        // Definitions and drops made by `source` act on the shared
        // environment.
        assert_eq!(
            eval_ok("let f(x) \"a\" source(\"let f(x) \\\"b\\\"\") f(\"_\") .. { source(\"drop f(x)\") f(\"_\") }"),
            "ba"
        );
    }

    #[test]
    fn test_edge_output_order_is_statement_order() {
        assert_eq!(eval_ok("\"1\" log(\"side\") \"2\""), "12");
    }

    #[test]
    fn test_edge_non_utf8_output_allowed() {
        let bytes = try_eval("x\"FF_FE\"").expect("evaluation failure");
        assert_eq!(bytes, vec![0xFF, 0xFE]);
    }

    #[test]
    fn test_edge_error_aborts_without_partial_output() {
        // The document produced "before" but the error discards everything.
        assert!(try_eval("\"before\" error(\"stop\") \"after\"").is_err());
    }
}
