#[cfg(test)]
mod resolver_tests {
    use rox::error::{Failure, LoxError};
    use rox::parser::Parser;
    use rox::resolver::{Locals, Resolver};
    use rox::scanner::Scanner;

    fn resolve(source: &str) -> Result<Locals, Vec<LoxError>> {
        let (tokens, errors) = Scanner::new(source).scan_all();
        assert!(errors.is_empty(), "lexing failed: {:?}", errors);

        let mut parser = Parser::new(&tokens);
        let statements = parser.parse();
        assert!(!parser.had_error(), "unexpected errors: {:?}", parser.errors());

        Resolver::new().resolve(&statements)
    }

    fn messages(source: &str) -> Vec<String> {
        match resolve(source) {
            Ok(_) => Vec::new(),
            Err(errors) => errors.iter().map(|e| e.to_string()).collect(),
        }
    }

    fn depths(source: &str) -> Vec<usize> {
        let locals = resolve(source).expect("program should resolve");
        let mut entries: Vec<_> = locals.into_iter().collect();
        entries.sort();
        entries.into_iter().map(|(_, depth)| depth).collect()
    }

    #[test]
    fn test_self_initializer_in_local_scope() {
        assert_eq!(
            messages("{ var a = a; }"),
            vec!["[line 1] Error at 'a': Can't read local variable in its own initializer."]
        );
        assert_eq!(
            messages("fun f() { var b = b + 1; }"),
            vec!["[line 1] Error at 'b': Can't read local variable in its own initializer."]
        );
    }

    #[test]
    fn test_self_initializer_allowed_at_global_scope() {
        assert!(messages("var a = a;").is_empty());
    }

    #[test]
    fn test_shadowing_an_outer_name_in_its_initializer_is_still_an_error() {
        // The inner `a` is declared before its initializer is resolved.
        assert_eq!(messages("var a = 1; { var a = a; }").len(), 1);
    }

    #[test]
    fn test_duplicate_declaration_in_one_scope() {
        assert_eq!(
            messages("{ var a = 1;\n var a = 2; }"),
            vec!["[line 2] Error at 'a': Already a variable with this name in this scope."]
        );
        assert_eq!(
            messages("fun f(x, x) {}"),
            vec!["[line 1] Error at 'x': Already a variable with this name in this scope."]
        );
    }

    #[test]
    fn test_redeclaration_is_fine_globally_and_across_scopes() {
        assert!(messages("var a = 1; var a = 2;").is_empty());
        assert!(messages("{ var a = 1; { var a = 2; } }").is_empty());
    }

    #[test]
    fn test_top_level_return() {
        assert_eq!(
            messages("return 1;"),
            vec!["[line 1] Error at 'return': Can't return from top-level code."]
        );
        assert_eq!(messages("{ while (true) return; }").len(), 1);
        assert!(messages("fun f() { { return 1; } }").is_empty());
    }

    #[test]
    fn test_every_static_error_is_reported() {
        let errors = messages("{ var a = 1; var a = 2; }\nreturn;\n{ var b = b; }");

        assert_eq!(errors.len(), 3, "{:?}", errors);
    }

    #[test]
    fn test_globals_are_left_unresolved() {
        assert!(depths("var g = 1; print g; g = 2;").is_empty());
    }

    #[test]
    fn test_distance_counts_enclosing_scopes() {
        assert_eq!(depths("{ var a = 1; print a; }"), vec![0]);
        assert_eq!(depths("{ var a = 1; { { print a; } } }"), vec![2]);
    }

    #[test]
    fn test_function_parameters_and_captures() {
        assert_eq!(depths("fun f(x) { return x; }"), vec![0]);

        // `i` read and assigned from the inner function: one hop to `outer`'s scope.
        assert_eq!(
            depths("fun outer() { var i = 0; fun inner() { i = i + 1; } }"),
            vec![1, 1]
        );
    }

    #[test]
    fn test_function_name_is_visible_in_its_own_body() {
        // Local `fib` refers to itself one scope out from the body.
        assert_eq!(
            depths("{ fun fib(n) { return fib(n - 1); } }"),
            vec![1, 0]
        );
    }

    #[test]
    fn test_static_errors_prevent_execution() {
        let mut out = Vec::new();
        let failure = rox::run("print \"side effect\";\nreturn;", &mut out).unwrap_err();

        assert!(matches!(failure, Failure::Static(ref errors) if errors.len() == 1));
        assert_eq!(failure.exit_code(), 65);
        assert!(out.is_empty());
    }
}
