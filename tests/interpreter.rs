#[cfg(test)]
mod interpreter_tests {
    use rox::error::Failure;
    use rox::interpreter::Interpreter;
    use rox::parser::Parser;
    use rox::resolver::Resolver;
    use rox::scanner::Scanner;
    use rox::token::{Token, TokenType};
    use rox::value::Value;

    fn run_ok(source: &str) -> String {
        let mut out = Vec::new();

        if let Err(failure) = rox::run(source, &mut out) {
            let errors: Vec<String> = failure.errors().iter().map(|e| e.to_string()).collect();
            panic!("program failed: {:?}", errors);
        }

        String::from_utf8(out).unwrap()
    }

    /// Runs a program expected to hit a runtime error; returns what it printed
    /// before failing and the error message.
    fn run_err(source: &str) -> (String, String) {
        let mut out = Vec::new();

        match rox::run(source, &mut out) {
            Err(Failure::Runtime(e)) => (String::from_utf8(out).unwrap(), e.message()),
            Err(Failure::Static(errors)) => panic!("unexpected static errors: {:?}", errors),
            Ok(()) => panic!("program should have failed"),
        }
    }

    #[test]
    fn test_closures_share_their_frame() {
        let source = r#"
            fun makeCounter() {
                var i = 0;
                fun count() {
                    i = i + 1;
                    return i;
                }
                return count;
            }

            var counter = makeCounter();
            print counter();
            print counter();
        "#;

        assert_eq!(run_ok(source), "1\n2\n");
    }

    #[test]
    fn test_two_closures_over_one_frame_see_each_others_writes() {
        let source = r#"
            var get;
            var set;
            fun make() {
                var shared = "before";
                fun g() { return shared; }
                fun s(v) { shared = v; }
                get = g;
                set = s;
            }
            make();
            set("after");
            print get();
        "#;

        assert_eq!(run_ok(source), "after\n");
    }

    #[test]
    fn test_resolution_is_fixed_by_declaration_order() {
        let source = r#"
            var a = "global";
            {
                fun showA() {
                    print a;
                }

                showA();
                var a = "block";
                showA();
            }
        "#;

        assert_eq!(run_ok(source), "global\nglobal\n");
    }

    #[test]
    fn test_for_loop_counts() {
        assert_eq!(
            run_ok("for (var i = 0; i < 3; i = i + 1) print i;"),
            "0\n1\n2\n"
        );
    }

    #[test]
    fn test_for_loop_matches_explicit_while() {
        let desugared = "{ var i = 0; while (i < 3) { print i; i = i + 1; } }";

        assert_eq!(
            run_ok(desugared),
            run_ok("for (var i = 0; i < 3; i = i + 1) print i;")
        );
    }

    #[test]
    fn test_mixed_plus_is_a_runtime_error_and_aborts() {
        let (printed, message) = run_err("print \"before\";\nprint 1 + \"2\";\nprint \"after\";");

        assert_eq!(printed, "before\n");
        assert_eq!(message, "Operands must be two numbers or two strings.");
    }

    #[test]
    fn test_runtime_error_carries_location_and_exit_code() {
        let mut out = Vec::new();
        let failure = rox::run("\n\nprint -\"x\";", &mut out).unwrap_err();

        assert_eq!(failure.exit_code(), 70);
        assert_eq!(failure.to_string(), "Operand must be a number.\n[line 3]");
    }

    #[test]
    fn test_arity_mismatch_does_not_run_the_body() {
        let (printed, message) = run_err("fun f(a, b) { print \"body\"; }\nf(1);");

        assert_eq!(printed, "");
        assert_eq!(message, "Expected 2 arguments but got 1.");
    }

    #[test]
    fn test_calling_a_non_callable() {
        let (_, message) = run_err("var x = \"not a function\";\nx();");

        assert_eq!(message, "Can only call functions.");
    }

    #[test]
    fn test_undefined_variables() {
        assert_eq!(run_err("print missing;").1, "Undefined variable 'missing'.");
        assert_eq!(run_err("missing = 1;").1, "Undefined variable 'missing'.");
        // Globally, `var a = a;` resolves fine and fails at runtime.
        assert_eq!(run_err("var a = a;").1, "Undefined variable 'a'.");
    }

    #[test]
    fn test_arithmetic_type_errors() {
        assert_eq!(run_err("print 1 < \"2\";").1, "Operands must be numbers.");
        assert_eq!(run_err("print nil * 2;").1, "Operands must be numbers.");
    }

    #[test]
    fn test_return_unwinds_nested_blocks_and_loops() {
        let source = r#"
            fun find() {
                var i = 0;
                while (true) {
                    {
                        if (i == 3) return i;
                    }
                    i = i + 1;
                }
            }

            print find();
            var after = "still global";
            print after;
        "#;

        assert_eq!(run_ok(source), "3\nstill global\n");
    }

    #[test]
    fn test_function_without_return_yields_nil() {
        assert_eq!(run_ok("fun f() {} print f();"), "nil\n");
        assert_eq!(run_ok("fun g() { return; } print g();"), "nil\n");
    }

    #[test]
    fn test_recursion() {
        let source = r#"
            fun fib(n) {
                if (n < 2) return n;
                return fib(n - 1) + fib(n - 2);
            }
            print fib(10);
        "#;

        assert_eq!(run_ok(source), "55\n");
    }

    #[test]
    fn test_deep_recursion_completes() {
        let source = r#"
            fun countdown(n) {
                if (n > 0) return countdown(n - 1);
                return n;
            }
            print countdown(10000);

            fun sum(n) {
                if (n == 0) return 0;
                return n + sum(n - 1);
            }
            print sum(10000);
        "#;

        assert_eq!(run_ok(source), "0\n50005000\n");
    }

    #[test]
    fn test_deeply_nested_expression() {
        let depth = 2000;
        let source = format!("print {}1{};", "(".repeat(depth), ")".repeat(depth));

        assert_eq!(run_ok(&source), "1\n");

        let negations = format!("print {}true;", "!".repeat(depth + 1));
        assert_eq!(run_ok(&negations), "false\n");
    }

    #[test]
    fn test_number_edge_cases() {
        let source = r#"
            print 1 / 0;
            print -1 / 0;
            print 0 / 0;
            print 1000000000000000000000;
            print (0 / 0) == (0 / 0);
            print 0 == -0;
        "#;

        assert_eq!(
            run_ok(source),
            "Infinity\n-Infinity\nNaN\n1.0E21\ntrue\nfalse\n"
        );
    }

    #[test]
    fn test_logical_operators_return_operands() {
        let source = r#"
            print nil or "yes";
            print "first" or "second";
            print 0 and "zero is truthy";
            print false and 1;
            print nil and undefinedIsNeverEvaluated;
        "#;

        assert_eq!(
            run_ok(source),
            "yes\nfirst\nzero is truthy\nfalse\nnil\n"
        );
    }

    #[test]
    fn test_equality_and_truthiness() {
        let source = r#"
            print nil == nil;
            print nil == false;
            print 1 == 1;
            print "a" == "a";
            print 1 == "1";
            print !0;
            print !"";
            print !nil;
        "#;

        assert_eq!(
            run_ok(source),
            "true\nfalse\ntrue\ntrue\nfalse\nfalse\nfalse\ntrue\n"
        );
    }

    #[test]
    fn test_value_formatting() {
        let source = r#"
            print 10 / 4;
            print 3 * 2;
            print -0.5;
            print "con" + "cat";
            fun f() {}
            print f;
            print clock;
        "#;

        assert_eq!(
            run_ok(source),
            "2.5\n6\n-0.5\nconcat\n<fn f>\n<native fn>\n"
        );
    }

    #[test]
    fn test_clock_returns_a_number() {
        assert_eq!(run_ok("print clock() > 0;"), "true\n");
    }

    #[test]
    fn test_redeclaring_a_global_shadows() {
        assert_eq!(run_ok("var a = 1; var a = a + 1; print a;"), "2\n");
    }

    #[test]
    fn test_if_else_and_block_scoping() {
        let source = r#"
            var x = "outer";
            if (x == "outer") {
                var x = "inner";
                print x;
            } else print "unreachable";
            print x;
        "#;

        assert_eq!(run_ok(source), "inner\nouter\n");
    }

    #[test]
    fn test_block_frame_is_restored_after_a_runtime_error() {
        let failing = "{ var inner = 1; inner + nil; }";
        let probe = "var probe = 42;";

        let (failing_tokens, _) = Scanner::new(failing).scan_all();
        let (probe_tokens, _) = Scanner::new(probe).scan_all();
        let name = Token::new(TokenType::IDENTIFIER, "probe", 1);

        let failing_program = Parser::new(&failing_tokens).parse();
        let probe_program = Parser::new(&probe_tokens).parse();

        let mut out = Vec::new();
        let mut interpreter = Interpreter::new(&mut out);
        interpreter.load_locals(Resolver::new().resolve(&failing_program).unwrap());

        assert!(interpreter.interpret(&failing_program).is_err());

        // Had the block frame leaked, `probe` would land there instead.
        interpreter.interpret(&probe_program).unwrap();
        assert_eq!(
            interpreter.globals().borrow().get(&name).unwrap(),
            Value::Number(42.0)
        );
    }
}
