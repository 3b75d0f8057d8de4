//! Query compiler: turns command-line style tokens into an [`Expression`].
//!
//! ```text
//! expr    := operand { [ "-a" | "-o" ] operand }
//! operand := "(" expr ")" | [ "-i" ] term
//! term    := [ kind { "," kind } ] ( "=" | "~" ) text
//!          | text
//! ```
//!
//! Adjacent operands are ORed. `=` is a substring test, `~` a regular
//! expression; a bare token is a substring test on names and descriptions.
//! Matching ignores case unless the term is preceded by `-i`.

use crate::error::QueryError;
use crate::index::fields::{FieldTable, TypeMask};
use crate::query::expr::{Expression, Matcher, Node, NodeKind, Term};
use regex::bytes::RegexBuilder;

/// Deepest group nesting `compile` accepts
pub const MAX_DEPTH: usize = 64;

/// Compile a token sequence against a field table
pub fn compile<S: AsRef<str>>(tokens: &[S], fields: &FieldTable) -> Result<Expression, QueryError> {
    let tokens: Vec<&str> = tokens.iter().map(|t| t.as_ref()).collect();
    let mut parser = QueryParser {
        tokens: &tokens,
        pos: 0,
        seq: 0,
        depth: 0,
        fields,
    };

    let nodes = parser.parse_list(false)?;
    if nodes.is_empty() {
        return Err(QueryError::Empty);
    }
    Ok(Expression::new(nodes, parser.seq))
}

/// Compile name lookups: each argument is a case-insensitive whole-word
/// match on document names, and the arguments are ORed.
pub fn compile_simple<S: AsRef<str>>(tokens: &[S]) -> Result<Expression, QueryError> {
    if tokens.is_empty() {
        return Err(QueryError::Empty);
    }

    let mut nodes = Vec::with_capacity(tokens.len());
    for (seq, token) in tokens.iter().enumerate() {
        let name = token.as_ref();
        if name.is_empty() {
            return Err(QueryError::EmptyTerm(name.to_string()));
        }
        let matcher = regex_matcher(&word_pattern(name), false)?;
        nodes.push(Node {
            seq,
            and_with_next: false,
            kind: NodeKind::Term(Term {
                mask: TypeMask::NM,
                matcher,
            }),
        });
    }
    Ok(Expression::new(nodes, tokens.len()))
}

/// Literal pattern anchored at word boundaries where the name has word
/// characters at its ends
fn word_pattern(name: &str) -> String {
    let is_word = |c: char| c.is_alphanumeric() || c == '_';
    let mut pattern = String::with_capacity(name.len() + 8);
    if name.starts_with(is_word) {
        pattern.push_str(r"\b");
    }
    pattern.push_str(&regex::escape(name));
    if name.ends_with(is_word) {
        pattern.push_str(r"\b");
    }
    pattern
}

fn regex_matcher(pattern: &str, case_sensitive: bool) -> Result<Matcher, QueryError> {
    let regex = RegexBuilder::new(pattern)
        .case_insensitive(!case_sensitive)
        .build()
        .map_err(|source| QueryError::Regex {
            pattern: pattern.to_string(),
            source,
        })?;
    Ok(Matcher::Regex { regex, case_sensitive })
}

fn is_control(token: &str) -> bool {
    matches!(token, "(" | ")" | "-a" | "-o" | "-i")
}

struct QueryParser<'a> {
    tokens: &'a [&'a str],
    pos: usize,
    /// Next free match-flag slot
    seq: usize,
    /// Open groups around the current position
    depth: usize,
    fields: &'a FieldTable,
}

impl<'a> QueryParser<'a> {
    fn peek(&self) -> Option<&'a str> {
        self.tokens.get(self.pos).copied()
    }

    fn next_seq(&mut self) -> usize {
        let seq = self.seq;
        self.seq += 1;
        seq
    }

    /// Parse operands up to the end of input, or up to and including the
    /// `)` closing a group when `nested`
    fn parse_list(&mut self, nested: bool) -> Result<Vec<Node>, QueryError> {
        let mut nodes: Vec<Node> = Vec::new();
        let mut pending: Option<&str> = None;

        loop {
            let Some(token) = self.peek() else {
                if nested {
                    return Err(QueryError::UnbalancedParens);
                }
                break;
            };

            match token {
                ")" => {
                    if !nested {
                        return Err(QueryError::UnbalancedParens);
                    }
                    self.pos += 1;
                    break;
                }
                "-a" | "-o" => {
                    let Some(last) = nodes.last_mut() else {
                        return Err(QueryError::MissingOperand(token.to_string()));
                    };
                    if let Some(op) = pending {
                        return Err(QueryError::MissingOperand(op.to_string()));
                    }
                    last.and_with_next = token == "-a";
                    pending = Some(token);
                    self.pos += 1;
                }
                _ => {
                    nodes.push(self.parse_operand()?);
                    pending = None;
                }
            }
        }

        if let Some(op) = pending {
            return Err(QueryError::MissingOperand(op.to_string()));
        }
        if nested && nodes.is_empty() {
            return Err(QueryError::EmptyGroup);
        }
        Ok(nodes)
    }

    fn parse_operand(&mut self) -> Result<Node, QueryError> {
        let Some(token) = self.peek() else {
            return Err(QueryError::Empty);
        };
        self.pos += 1;

        match token {
            "(" => {
                if self.depth >= MAX_DEPTH {
                    return Err(QueryError::TooDeep(MAX_DEPTH));
                }
                // The group takes its slot before its children
                let seq = self.next_seq();
                self.depth += 1;
                let children = self.parse_list(true)?;
                self.depth -= 1;
                Ok(Node {
                    seq,
                    and_with_next: false,
                    kind: NodeKind::Group(children),
                })
            }
            "-i" => match self.peek() {
                Some(term) if !is_control(term) => {
                    self.pos += 1;
                    self.parse_term(term, true)
                }
                _ => Err(QueryError::DanglingCaseFlag),
            },
            _ => self.parse_term(token, false),
        }
    }

    fn parse_term(&mut self, token: &str, case_sensitive: bool) -> Result<Node, QueryError> {
        let (mask, is_regex, text) = match token.find(['=', '~']) {
            Some(at) => {
                let kinds = &token[..at];
                let mask = if kinds.is_empty() {
                    TypeMask::DEFAULT
                } else {
                    self.fields.resolve_list(kinds)
                };
                (mask, token.as_bytes()[at] == b'~', &token[at + 1..])
            }
            None => (TypeMask::DEFAULT, false, token),
        };

        if text.is_empty() {
            return Err(QueryError::EmptyTerm(token.to_string()));
        }

        let matcher = if is_regex {
            regex_matcher(text, case_sensitive)?
        } else if case_sensitive {
            Matcher::Substring {
                needle: text.as_bytes().to_vec(),
                case_sensitive,
            }
        } else {
            Matcher::Substring {
                needle: text.as_bytes().to_ascii_lowercase(),
                case_sensitive,
            }
        };

        Ok(Node {
            seq: self.next_seq(),
            and_with_next: false,
            kind: NodeKind::Term(Term { mask, matcher }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(tokens: &[&str]) -> Result<Expression, QueryError> {
        compile(tokens, &FieldTable::standard())
    }

    fn term_of(node: &Node) -> &Term {
        match &node.kind {
            NodeKind::Term(term) => term,
            NodeKind::Group(_) => panic!("expected a term"),
        }
    }

    fn eval(expr: &Expression, set: &[usize]) -> bool {
        let mut flags = vec![false; expr.term_count()];
        for &seq in set {
            flags[seq] = true;
        }
        expr.evaluate(&mut flags)
    }

    #[test]
    fn test_bare_token_is_default_substring() {
        let expr = parse(&["Foo"]).unwrap();
        assert_eq!(expr.term_count(), 1);
        let term = term_of(&expr.nodes()[0]);
        assert_eq!(term.mask, TypeMask::DEFAULT);
        assert_eq!(
            term.matcher,
            Matcher::Substring {
                needle: b"foo".to_vec(),
                case_sensitive: false
            }
        );
    }

    #[test]
    fn test_field_kinds_and_operators() {
        let expr = parse(&["Nm,Xr=ls", "Fn~^str", "Bogus=x"]).unwrap();
        let terms: Vec<&Term> = expr.nodes().iter().map(term_of).collect();

        assert_eq!(terms[0].mask, TypeMask::NM | TypeMask::XR);
        assert_eq!(terms[1].mask, TypeMask::FN);
        assert!(matches!(terms[1].matcher, Matcher::Regex { case_sensitive: false, .. }));
        assert_eq!(terms[2].mask, TypeMask::ANY);
        assert_eq!(parse(&["=x"]).unwrap().terms()[0].1.mask, TypeMask::DEFAULT);
    }

    #[test]
    fn test_precedence() {
        let expr = parse(&["A", "-a", "B", "-o", "C"]).unwrap();
        assert!(eval(&expr, &[0, 1]));
        assert!(eval(&expr, &[2]));
        assert!(!eval(&expr, &[0]));
    }

    #[test]
    fn test_implicit_or() {
        let expr = parse(&["A", "B"]).unwrap();
        assert!(eval(&expr, &[1]));
        assert!(!expr.nodes()[0].and_with_next);
    }

    #[test]
    fn test_groups_take_preorder_slots() {
        let expr = parse(&["A", "-a", "(", "B", "-o", "C", ")", "-o", "D"]).unwrap();
        assert_eq!(expr.term_count(), 5);

        let nodes = expr.nodes();
        assert_eq!(nodes[1].seq, 1);
        let NodeKind::Group(children) = &nodes[1].kind else {
            panic!("expected a group");
        };
        assert_eq!(children.iter().map(|n| n.seq).collect::<Vec<_>>(), vec![2, 3]);
        assert_eq!(nodes[2].seq, 4);

        assert!(eval(&expr, &[0, 3]));
        assert!(!eval(&expr, &[0]));
        assert!(!eval(&expr, &[2, 3]));
        assert!(eval(&expr, &[4]));
    }

    #[test]
    fn test_seq_within_term_count() {
        let expr = parse(&["(", "(", "a", ")", "-a", "b", ")", "c"]).unwrap();
        fn check(nodes: &[Node], count: usize, seen: &mut Vec<usize>) {
            for node in nodes {
                assert!(node.seq < count);
                seen.push(node.seq);
                if let NodeKind::Group(children) = &node.kind {
                    check(children, count, seen);
                }
            }
        }
        let mut seen = Vec::new();
        check(expr.nodes(), expr.term_count(), &mut seen);
        seen.sort_unstable();
        assert_eq!(seen, (0..expr.term_count()).collect::<Vec<_>>());
    }

    #[test]
    fn test_case_flag() {
        let expr = parse(&["-i", "Nm=LS", "ls"]).unwrap();
        let terms = expr.terms();
        assert_eq!(
            terms[0].1.matcher,
            Matcher::Substring {
                needle: b"LS".to_vec(),
                case_sensitive: true
            }
        );
        assert!(terms[1].1.matcher.needs_folded());

        let expr = parse(&["-i", "Nm~^LS$"]).unwrap();
        let Matcher::Regex { regex, .. } = &expr.terms()[0].1.matcher else {
            panic!("expected a regex");
        };
        assert!(regex.is_match(b"LS"));
        assert!(!regex.is_match(b"ls"));
    }

    #[test]
    fn test_regex_ignores_case_by_default() {
        let expr = parse(&["Nm~^foo$"]).unwrap();
        assert!(expr.terms()[0].1.matcher.is_match(b"FOO", b"foo"));
    }

    #[test]
    fn test_compile_is_deterministic() {
        let tokens = ["Nm~^ls", "-a", "(", "cat", "-o", "-i", "Nd=Dog", ")"];
        assert_eq!(parse(&tokens).unwrap(), parse(&tokens).unwrap());
    }

    #[test]
    fn test_malformed_expressions() {
        assert!(matches!(parse(&[]), Err(QueryError::Empty)));
        assert!(matches!(parse(&["(", ")"]), Err(QueryError::EmptyGroup)));
        assert!(matches!(parse(&["(", "a"]), Err(QueryError::UnbalancedParens)));
        assert!(matches!(parse(&["a", ")"]), Err(QueryError::UnbalancedParens)));
        assert!(matches!(parse(&["-a", "b"]), Err(QueryError::MissingOperand(op)) if op == "-a"));
        assert!(matches!(parse(&["a", "-o"]), Err(QueryError::MissingOperand(op)) if op == "-o"));
        assert!(matches!(parse(&["a", "-a", "-o", "b"]), Err(QueryError::MissingOperand(op)) if op == "-a"));
        assert!(matches!(parse(&["(", "a", "-a", ")"]), Err(QueryError::MissingOperand(_))));
        assert!(matches!(parse(&["-i"]), Err(QueryError::DanglingCaseFlag)));
        assert!(matches!(parse(&["-i", "("]), Err(QueryError::DanglingCaseFlag)));
        assert!(matches!(parse(&["Nm="]), Err(QueryError::EmptyTerm(_))));
        assert!(matches!(parse(&["Nm~("]), Err(QueryError::Regex { .. })));
    }

    #[test]
    fn test_nesting_limit() {
        let nested = |levels: usize| {
            let mut tokens = vec!["("; levels];
            tokens.push("x");
            tokens.extend(vec![")"; levels]);
            tokens
        };

        let expr = parse(&nested(MAX_DEPTH)).unwrap();
        assert_eq!(expr.term_count(), MAX_DEPTH + 1);
        assert!(eval(&expr, &[MAX_DEPTH]));

        assert!(matches!(parse(&nested(MAX_DEPTH + 1)), Err(QueryError::TooDeep(MAX_DEPTH))));
        assert!(matches!(parse(&nested(20_000)), Err(QueryError::TooDeep(_))));
    }

    #[test]
    fn test_compile_simple() {
        let expr = compile_simple(&["ls", "c++"]).unwrap();
        assert_eq!(expr.term_count(), 2);

        let terms = expr.terms();
        assert!(terms.iter().all(|(_, t)| t.mask == TypeMask::NM));
        let ls = &terms[0].1.matcher;
        assert!(ls.is_match(b"LS", b"ls"));
        assert!(ls.is_match(b"ls, dir", b"ls, dir"));
        assert!(!ls.is_match(b"lsblk", b"lsblk"));

        let cpp = &terms[1].1.matcher;
        assert!(cpp.is_match(b"c++", b"c++"));
        assert!(!cpp.is_match(b"cxx", b"cxx"));

        assert!(matches!(compile_simple::<&str>(&[]), Err(QueryError::Empty)));
        assert!(matches!(compile_simple(&[""]), Err(QueryError::EmptyTerm(_))));
    }

    #[test]
    fn test_word_pattern() {
        assert_eq!(word_pattern("ls"), r"\bls\b");
        assert_eq!(word_pattern("c++"), r"\bc\+\+");
        assert_eq!(word_pattern("."), r"\.");
    }
}
