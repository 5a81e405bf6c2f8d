#[cfg(test)]
mod scanner_tests {
    use rox::error::LoxError;
    use rox::scanner::*;
    use rox::token::*;

    fn assert_token_sequence(source: &str, expected: &[(TokenType, &str)]) {
        let scanner = Scanner::new(source);
        let tokens: Vec<_> = scanner.filter_map(Result::ok).collect();

        assert_eq!(tokens.len(), expected.len());

        for (actual, (expected_type, expected_lexeme)) in tokens.iter().zip(expected.iter()) {
            assert_eq!(actual.token_type, *expected_type);
            assert_eq!(actual.lexeme, *expected_lexeme);
        }
    }

    #[test]
    fn test_scanner_01_symbols() {
        assert_token_sequence(
            "({*.,+*})",
            &[
                (TokenType::LEFT_PAREN, "("),
                (TokenType::LEFT_BRACE, "{"),
                (TokenType::STAR, "*"),
                (TokenType::DOT, "."),
                (TokenType::COMMA, ","),
                (TokenType::PLUS, "+"),
                (TokenType::STAR, "*"),
                (TokenType::RIGHT_BRACE, "}"),
                (TokenType::RIGHT_PAREN, ")"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_02_two_char_operators() {
        assert_token_sequence(
            "! != = == < <= > >= /",
            &[
                (TokenType::BANG, "!"),
                (TokenType::BANG_EQUAL, "!="),
                (TokenType::EQUAL, "="),
                (TokenType::EQUAL_EQUAL, "=="),
                (TokenType::LESS, "<"),
                (TokenType::LESS_EQUAL, "<="),
                (TokenType::GREATER, ">"),
                (TokenType::GREATER_EQUAL, ">="),
                (TokenType::SLASH, "/"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_03_keywords_and_identifiers() {
        assert_token_sequence(
            "var fun_ = fun; while orchid or",
            &[
                (TokenType::VAR, "var"),
                (TokenType::IDENTIFIER, "fun_"),
                (TokenType::EQUAL, "="),
                (TokenType::FUN, "fun"),
                (TokenType::SEMICOLON, ";"),
                (TokenType::WHILE, "while"),
                (TokenType::IDENTIFIER, "orchid"),
                (TokenType::OR, "or"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_04_literals_carry_values() {
        let tokens: Vec<_> = Scanner::new("12.5 7 \"hi there\"")
            .filter_map(Result::ok)
            .collect();

        assert_eq!(tokens[0].literal, Some(Literal::Number(12.5)));
        assert_eq!(tokens[1].literal, Some(Literal::Number(7.0)));
        assert_eq!(tokens[2].token_type, TokenType::STRING);
        assert_eq!(tokens[2].lexeme, "\"hi there\"");
        assert_eq!(tokens[2].literal, Some(Literal::Str("hi there".into())));
        assert_eq!(tokens[3].literal, None);
    }

    #[test]
    fn test_scanner_05_comments_and_lines() {
        let source = "a // ignored ( ) \nb\n\n\"multi\nline\" c";
        let tokens: Vec<_> = Scanner::new(source).filter_map(Result::ok).collect();

        let lines: Vec<(TokenType, usize)> =
            tokens.iter().map(|t| (t.token_type, t.line)).collect();

        assert_eq!(
            lines,
            vec![
                (TokenType::IDENTIFIER, 1),
                (TokenType::IDENTIFIER, 2),
                (TokenType::STRING, 5),
                (TokenType::IDENTIFIER, 5),
                (TokenType::EOF, 5),
            ]
        );
    }

    #[test]
    fn test_unexpected_chars_token_sequence() {
        let source = ",.$(#";
        let results: Vec<_> = Scanner::new(source).collect();

        // COMMA, DOT, error for '$', LEFT_PAREN, error for '#', EOF
        assert_eq!(results.len(), 6, "Expected 6 items in result");

        assert_token_matches(&results[0], TokenType::COMMA, ",");
        assert_token_matches(&results[1], TokenType::DOT, ".");
        assert_token_matches(&results[3], TokenType::LEFT_PAREN, "(");
        assert_token_matches(&results[5], TokenType::EOF, "");

        let errors: Vec<String> = results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .map(|e| e.to_string())
            .collect();

        assert_eq!(
            errors,
            vec![
                "[line 1] Error: Unexpected character: $",
                "[line 1] Error: Unexpected character: #",
            ]
        );

        fn assert_token_matches(
            result: &Result<Token, LoxError>,
            expected_type: TokenType,
            expected_lexeme: &str,
        ) {
            match result {
                Ok(token) => {
                    assert_eq!(token.token_type, expected_type);
                    assert_eq!(token.lexeme, expected_lexeme);
                }
                Err(e) => panic!("Expected token but got error: {}", e),
            }
        }
    }

    #[test]
    fn test_non_ascii_character_is_one_error() {
        let (tokens, errors) = Scanner::new("a é b").scan_all();

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message(), "Unexpected character: é");
        assert_eq!(tokens.len(), 3);
    }

    #[test]
    fn test_unterminated_string() {
        let (tokens, errors) = Scanner::new("print \"oops").scan_all();

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].to_string(), "[line 1] Error: Unterminated string.");
        assert_eq!(tokens.last().map(|t| t.token_type), Some(TokenType::EOF));
    }

    #[test]
    fn test_token_display() {
        let tokens: Vec<String> = Scanner::new("42 3.25 \"hi\" foo")
            .filter_map(Result::ok)
            .map(|t| t.to_string())
            .collect();

        assert_eq!(
            tokens,
            vec![
                "NUMBER 42 42.0",
                "NUMBER 3.25 3.25",
                "STRING \"hi\" hi",
                "IDENTIFIER foo null",
                "EOF  null",
            ]
        );
    }
}
