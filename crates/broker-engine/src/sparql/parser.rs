//! Recursive-descent parser over [`super::lexer`] tokens.

use std::collections::HashMap;

use broker_core::error::AppError;
use broker_core::result::AppResult;
use broker_core::types::RdfTerm;

use super::ast::{Operation, PatternTerm, SelectQuery, Triple, TriplePattern};
use super::lexer::{Token, tokenize};

const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
const XSD: &str = "http://www.w3.org/2001/XMLSchema#";

/// Parses a `SELECT` query.
pub fn parse_query(text: &str) -> AppResult<SelectQuery> {
    let mut parser = Parser::new(text)?;
    parser.prologue()?;
    let query = parser.select()?;
    parser.expect_end()?;
    Ok(query)
}

/// Parses one or more update operations separated by `;`.
pub fn parse_update(text: &str) -> AppResult<Vec<Operation>> {
    let mut parser = Parser::new(text)?;
    let mut ops = Vec::new();

    loop {
        parser.prologue()?;
        if parser.at_end() {
            break;
        }
        ops.push(parser.operation()?);
        if !parser.eat(&Token::Semicolon) {
            break;
        }
    }
    parser.expect_end()?;

    if ops.is_empty() {
        return Err(syntax("empty update"));
    }
    Ok(ops)
}

fn syntax(msg: &str) -> AppError {
    AppError::execution(format!("SPARQL syntax error: {msg}"))
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    prefixes: HashMap<String, String>,
}

impl Parser {
    fn new(text: &str) -> AppResult<Self> {
        Ok(Self {
            tokens: tokenize(text)?,
            pos: 0,
            prefixes: HashMap::new(),
        })
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &Token) -> AppResult<()> {
        if self.eat(token) {
            Ok(())
        } else {
            Err(syntax(&format!("expected {token:?}, found {:?}", self.peek())))
        }
    }

    fn expect_end(&self) -> AppResult<()> {
        match self.peek() {
            None => Ok(()),
            Some(t) => Err(syntax(&format!("unexpected trailing {t:?}"))),
        }
    }

    fn peek_keyword(&self, kw: &str) -> bool {
        matches!(self.peek(), Some(Token::Word(w)) if w.eq_ignore_ascii_case(kw))
    }

    fn eat_keyword(&mut self, kw: &str) -> bool {
        if self.peek_keyword(kw) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect_keyword(&mut self, kw: &str) -> AppResult<()> {
        if self.eat_keyword(kw) {
            Ok(())
        } else {
            Err(syntax(&format!("expected {kw}, found {:?}", self.peek())))
        }
    }

    /// `PREFIX` and `BASE`-free prologue.
    fn prologue(&mut self) -> AppResult<()> {
        while self.eat_keyword("PREFIX") {
            let prefix = match self.next() {
                Some(Token::PrefixedName(prefix, local)) if local.is_empty() => prefix,
                other => return Err(syntax(&format!("bad PREFIX name {other:?}"))),
            };
            let iri = match self.next() {
                Some(Token::Iri(iri)) => iri,
                other => return Err(syntax(&format!("bad PREFIX IRI {other:?}"))),
            };
            self.prefixes.insert(prefix, iri);
        }
        Ok(())
    }

    fn select(&mut self) -> AppResult<SelectQuery> {
        self.expect_keyword("SELECT")?;
        let _ = self.eat_keyword("DISTINCT") || self.eat_keyword("REDUCED");

        let projection = if self.eat(&Token::Star) {
            None
        } else {
            let mut vars = Vec::new();
            while let Some(Token::Var(name)) = self.peek() {
                vars.push(name.clone());
                self.pos += 1;
            }
            if vars.is_empty() {
                return Err(syntax("SELECT needs variables or *"));
            }
            Some(vars)
        };

        let _ = self.eat_keyword("WHERE");
        let pattern = self.group(true)?;

        let limit = if self.eat_keyword("LIMIT") {
            match self.next() {
                Some(Token::Integer(n)) => Some(
                    n.parse::<usize>()
                        .map_err(|_| syntax("LIMIT must be a non-negative integer"))?,
                ),
                other => return Err(syntax(&format!("bad LIMIT {other:?}"))),
            }
        } else {
            None
        };

        Ok(SelectQuery {
            projection,
            pattern,
            limit,
        })
    }

    fn operation(&mut self) -> AppResult<Operation> {
        if self.eat_keyword("INSERT") {
            if self.eat_keyword("DATA") {
                return Ok(Operation::InsertData(self.ground_group()?));
            }
            let insert = self.group(true)?;
            self.expect_keyword("WHERE")?;
            let pattern = self.group(true)?;
            return Ok(Operation::Modify {
                delete: Vec::new(),
                insert,
                pattern,
            });
        }

        if self.eat_keyword("DELETE") {
            if self.eat_keyword("DATA") {
                return Ok(Operation::DeleteData(self.ground_group()?));
            }
            if self.eat_keyword("WHERE") {
                return Ok(Operation::DeleteWhere(self.group(true)?));
            }
            let delete = self.group(true)?;
            let insert = if self.eat_keyword("INSERT") {
                self.group(true)?
            } else {
                Vec::new()
            };
            self.expect_keyword("WHERE")?;
            let pattern = self.group(true)?;
            return Ok(Operation::Modify {
                delete,
                insert,
                pattern,
            });
        }

        if self.eat_keyword("CLEAR") {
            let _ = self.eat_keyword("SILENT");
            if !(self.eat_keyword("ALL") || self.eat_keyword("DEFAULT")) {
                return Err(syntax("only CLEAR ALL and CLEAR DEFAULT are supported"));
            }
            return Ok(Operation::Clear);
        }

        Err(syntax(&format!("unsupported operation {:?}", self.peek())))
    }

    fn ground_group(&mut self) -> AppResult<Vec<Triple>> {
        self.group(false)?
            .into_iter()
            .map(|tp| tp.ground().ok_or_else(|| syntax("variables are not allowed in DATA")))
            .collect()
    }

    /// `{ triples }` with `.`, `;` and `,` abbreviations.
    fn group(&mut self, allow_vars: bool) -> AppResult<Vec<TriplePattern>> {
        self.expect(&Token::LBrace)?;
        let mut patterns = Vec::new();

        while !self.eat(&Token::RBrace) {
            if self.at_end() {
                return Err(syntax("unterminated group"));
            }
            if self.peek_keyword("FILTER") || self.peek_keyword("OPTIONAL") {
                return Err(syntax("FILTER and OPTIONAL are not supported"));
            }

            let subject = self.term(allow_vars)?;
            loop {
                let predicate = self.predicate(allow_vars)?;
                loop {
                    let object = self.term(allow_vars)?;
                    patterns.push(TriplePattern {
                        subject: subject.clone(),
                        predicate: predicate.clone(),
                        object,
                    });
                    if !self.eat(&Token::Comma) {
                        break;
                    }
                }
                if !self.eat(&Token::Semicolon) {
                    break;
                }
                if matches!(self.peek(), Some(Token::Dot) | Some(Token::RBrace)) {
                    break;
                }
            }

            if !self.eat(&Token::Dot) && self.peek() != Some(&Token::RBrace) {
                return Err(syntax(&format!("expected . or }}, found {:?}", self.peek())));
            }
        }

        Ok(patterns)
    }

    fn predicate(&mut self, allow_vars: bool) -> AppResult<PatternTerm> {
        if matches!(self.peek(), Some(Token::Word(w)) if w == "a") {
            self.pos += 1;
            return Ok(PatternTerm::Term(RdfTerm::uri(RDF_TYPE)));
        }
        self.term(allow_vars)
    }

    fn term(&mut self, allow_vars: bool) -> AppResult<PatternTerm> {
        let token = self.next().ok_or_else(|| syntax("unexpected end of input"))?;
        let term = match token {
            Token::Var(name) if allow_vars => return Ok(PatternTerm::Var(name)),
            Token::Var(name) => return Err(syntax(&format!("variable ?{name} not allowed here"))),
            Token::Iri(iri) => RdfTerm::uri(iri),
            Token::PrefixedName(prefix, local) => RdfTerm::uri(self.expand(&prefix, &local)?),
            Token::BlankNode(label) => RdfTerm::bnode(label),
            Token::Integer(n) => RdfTerm::typed_literal(n, format!("{XSD}integer")),
            Token::Decimal(n) => RdfTerm::typed_literal(n, format!("{XSD}decimal")),
            Token::Word(w) if w == "true" || w == "false" => {
                RdfTerm::typed_literal(w, format!("{XSD}boolean"))
            }
            Token::String(value) => self.literal_suffix(value)?,
            other => return Err(syntax(&format!("unexpected {other:?}"))),
        };
        Ok(PatternTerm::Term(term))
    }

    fn literal_suffix(&mut self, value: String) -> AppResult<RdfTerm> {
        match self.peek() {
            Some(Token::LangTag(tag)) => {
                let tag = tag.clone();
                self.pos += 1;
                Ok(RdfTerm::lang_literal(value, tag))
            }
            Some(Token::DatatypeMarker) => {
                self.pos += 1;
                let dt = match self.next() {
                    Some(Token::Iri(iri)) => iri,
                    Some(Token::PrefixedName(prefix, local)) => self.expand(&prefix, &local)?,
                    other => return Err(syntax(&format!("bad datatype {other:?}"))),
                };
                Ok(RdfTerm::typed_literal(value, dt))
            }
            _ => Ok(RdfTerm::literal(value)),
        }
    }

    fn expand(&self, prefix: &str, local: &str) -> AppResult<String> {
        self.prefixes
            .get(prefix)
            .map(|ns| format!("{ns}{local}"))
            .ok_or_else(|| syntax(&format!("undeclared prefix '{prefix}:'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_star_with_prefix() {
        let q = parse_query(
            "PREFIX ex: <http://ex/> SELECT * WHERE { ?s a ex:Sensor ; ex:value ?v . }",
        )
        .expect("parse");
        assert!(q.projection.is_none());
        assert_eq!(q.pattern.len(), 2);
        assert_eq!(q.variables(), vec!["s".to_string(), "v".to_string()]);
        assert_eq!(
            q.pattern[0].predicate,
            PatternTerm::Term(RdfTerm::uri(RDF_TYPE))
        );
    }

    #[test]
    fn test_select_projection_and_limit() {
        let q = parse_query("SELECT DISTINCT ?o WHERE { <http://a> <http://p> ?o } LIMIT 3")
            .expect("parse");
        assert_eq!(q.projection, Some(vec!["o".to_string()]));
        assert_eq!(q.limit, Some(3));
    }

    #[test]
    fn test_update_sequence() {
        let ops = parse_update(
            "PREFIX ex: <http://ex/> \
             INSERT DATA { ex:a ex:p 1, 2 } ; \
             DELETE WHERE { ?s ex:p 1 } ; \
             DELETE { ?s ex:p ?o } INSERT { ?s ex:q ?o } WHERE { ?s ex:p ?o } ; \
             CLEAR ALL",
        )
        .expect("parse");
        assert_eq!(ops.len(), 4);
        match &ops[0] {
            Operation::InsertData(triples) => assert_eq!(triples.len(), 2),
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(ops[1], Operation::DeleteWhere(_)));
        assert!(matches!(ops[2], Operation::Modify { .. }));
        assert_eq!(ops[3], Operation::Clear);
    }

    #[test]
    fn test_malformed_inputs() {
        assert!(parse_update("INSERT DATA { <http://a> <http://p> ?x }").is_err());
        assert!(parse_update("INSERT DATA { <http://a> <http://p> }").is_err());
        assert!(parse_update("DROP GRAPH <http://g>").is_err());
        assert!(parse_update("").is_err());
        assert!(parse_query("SELECT WHERE { ?s ?p ?o }").is_err());
        assert!(parse_query("SELECT * WHERE { ?s ex:p ?o }").is_err());
        assert!(parse_query("SELECT * WHERE { ?s ?p ?o FILTER(?o) }").is_err());
    }

    #[test]
    fn test_literal_forms() {
        let ops = parse_update(
            r#"INSERT DATA { <http://a> <http://p> "x"@en, "5"^^<http://www.w3.org/2001/XMLSchema#int>, true }"#,
        )
        .expect("parse");
        let Operation::InsertData(triples) = &ops[0] else {
            panic!("expected insert data");
        };
        assert_eq!(triples[0].object, RdfTerm::lang_literal("x", "en"));
        assert_eq!(
            triples[1].object,
            RdfTerm::typed_literal("5", "http://www.w3.org/2001/XMLSchema#int")
        );
        assert_eq!(triples[2].object, RdfTerm::typed_literal("true", format!("{XSD}boolean")));
    }
}
