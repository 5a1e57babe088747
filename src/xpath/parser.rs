//! XPath Parser
//!
//! Recursive descent parser for XPath 1.0 expressions.

use super::lexer::{Lexer, Token};

/// XPath expression AST node
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Document node: `/` when `scoped` is false, the start of a leading
    /// `//` when it is true
    Root { scoped: bool },
    /// Union of two expressions (|)
    Union(Box<Expr>, Box<Expr>),
    /// Location step applied to every node of the base expression
    Path(Box<Expr>, Box<Step>),
    /// Filter expression with predicate
    Filter(Box<Expr>, Box<Expr>),
    /// Function call
    Function(String, Vec<Expr>),
    /// Binary operation
    Binary(Box<Expr>, BinaryOp, Box<Expr>),
    /// Unary negation
    Negate(Box<Expr>),
    /// Literal number
    Number(f64),
    /// Literal string
    String(String),
    /// First step of a relative location path
    Step(Box<Step>),
}

impl Expr {
    /// Whether the expression starts from `/` rather than the context
    pub fn is_absolute(&self) -> bool {
        match self {
            Expr::Root { scoped } => !scoped,
            Expr::Path(base, _) | Expr::Filter(base, _) => base.is_absolute(),
            Expr::Union(left, right) => left.is_absolute() && right.is_absolute(),
            _ => false,
        }
    }

    /// Whether a union reachable from the top of the expression has both
    /// absolute and relative branches
    pub fn mixes_scopes(&self) -> bool {
        match self {
            Expr::Path(base, _) | Expr::Filter(base, _) => base.mixes_scopes(),
            Expr::Union(left, right) => {
                left.is_absolute() != right.is_absolute() || left.mixes_scopes() || right.mixes_scopes()
            }
            _ => false,
        }
    }
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Or,
    And,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

/// Location step in a path
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub axis: Axis,
    pub node_test: NodeTest,
    pub predicates: Vec<Expr>,
}

impl Step {
    fn new(axis: Axis, node_test: NodeTest) -> Self {
        Step {
            axis,
            node_test,
            predicates: Vec::new(),
        }
    }
}

/// Supported XPath axes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    Child,
    Descendant,
    DescendantOrSelf,
    Parent,
    Ancestor,
    AncestorOrSelf,
    FollowingSibling,
    PrecedingSibling,
    Self_,
    Attribute,
}

impl Axis {
    pub fn from_name(s: &str) -> Option<Self> {
        match s {
            "child" => Some(Axis::Child),
            "descendant" => Some(Axis::Descendant),
            "descendant-or-self" => Some(Axis::DescendantOrSelf),
            "parent" => Some(Axis::Parent),
            "ancestor" => Some(Axis::Ancestor),
            "ancestor-or-self" => Some(Axis::AncestorOrSelf),
            "following-sibling" => Some(Axis::FollowingSibling),
            "preceding-sibling" => Some(Axis::PrecedingSibling),
            "self" => Some(Axis::Self_),
            "attribute" => Some(Axis::Attribute),
            _ => None,
        }
    }

    /// Reverse axes number their proximity positions backwards
    pub fn is_reverse(self) -> bool {
        matches!(
            self,
            Axis::Parent | Axis::Ancestor | Axis::AncestorOrSelf | Axis::PrecedingSibling
        )
    }

    /// Axes whose results all lie in the context node's subtree
    pub fn is_downward(self) -> bool {
        matches!(
            self,
            Axis::Child | Axis::Descendant | Axis::DescendantOrSelf | Axis::Self_ | Axis::Attribute
        )
    }
}

/// Node test in a location step
#[derive(Debug, Clone, PartialEq)]
pub enum NodeTest {
    /// `*`: any element, or any attribute on the attribute axis
    Any,
    /// Unprefixed name, compared literally
    Name(String),
    /// prefix:local
    QName(String, String),
    /// prefix:*
    NamespaceWildcard(String),
    /// node()
    Node,
    /// text()
    Text,
    /// comment()
    Comment,
    /// processing-instruction('target'?)
    ProcessingInstruction(Option<String>),
}

/// XPath parser
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
    peeked: Option<Token>,
}

impl<'a> Parser<'a> {
    /// Create a new parser
    pub fn new(input: &'a str) -> Self {
        let mut lexer = Lexer::new(input);
        let current = lexer.next_token();
        Parser {
            lexer,
            current,
            peeked: None,
        }
    }

    /// Parse a complete expression; trailing tokens are an error
    pub fn parse(&mut self) -> Result<Expr, String> {
        let expr = self.parse_or_expr()?;
        match &self.current {
            Token::Eof => Ok(expr),
            token => Err(self.unexpected(token)),
        }
    }

    fn advance(&mut self) {
        self.current = match self.peeked.take() {
            Some(t) => t,
            None => self.lexer.next_token(),
        };
    }

    fn peek(&mut self) -> &Token {
        self.peeked.get_or_insert_with(|| self.lexer.next_token())
    }

    fn unexpected(&self, token: &Token) -> String {
        match token {
            Token::Error(message) => message.clone(),
            Token::Eof => "unexpected end of expression".to_string(),
            token => format!("unexpected {token:?}"),
        }
    }

    fn expect(&mut self, token: Token, what: &str) -> Result<(), String> {
        if self.current == token {
            self.advance();
            Ok(())
        } else if let Token::Error(message) = &self.current {
            Err(message.clone())
        } else {
            Err(format!("expected {what}"))
        }
    }

    fn parse_binary_level(
        &mut self,
        next: fn(&mut Self) -> Result<Expr, String>,
        op_for: fn(&Token) -> Option<BinaryOp>,
    ) -> Result<Expr, String> {
        let mut left = next(self)?;
        while let Some(op) = op_for(&self.current) {
            self.advance();
            let right = next(self)?;
            left = Expr::Binary(Box::new(left), op, Box::new(right));
        }
        Ok(left)
    }

    fn parse_or_expr(&mut self) -> Result<Expr, String> {
        self.parse_binary_level(Self::parse_and_expr, |t| match t {
            Token::Or => Some(BinaryOp::Or),
            _ => None,
        })
    }

    fn parse_and_expr(&mut self) -> Result<Expr, String> {
        self.parse_binary_level(Self::parse_equality_expr, |t| match t {
            Token::And => Some(BinaryOp::And),
            _ => None,
        })
    }

    fn parse_equality_expr(&mut self) -> Result<Expr, String> {
        self.parse_binary_level(Self::parse_relational_expr, |t| match t {
            Token::Eq => Some(BinaryOp::Eq),
            Token::NotEq => Some(BinaryOp::NotEq),
            _ => None,
        })
    }

    fn parse_relational_expr(&mut self) -> Result<Expr, String> {
        self.parse_binary_level(Self::parse_additive_expr, |t| match t {
            Token::Lt => Some(BinaryOp::Lt),
            Token::LtEq => Some(BinaryOp::LtEq),
            Token::Gt => Some(BinaryOp::Gt),
            Token::GtEq => Some(BinaryOp::GtEq),
            _ => None,
        })
    }

    fn parse_additive_expr(&mut self) -> Result<Expr, String> {
        self.parse_binary_level(Self::parse_multiplicative_expr, |t| match t {
            Token::Plus => Some(BinaryOp::Add),
            Token::Minus => Some(BinaryOp::Sub),
            _ => None,
        })
    }

    fn parse_multiplicative_expr(&mut self) -> Result<Expr, String> {
        self.parse_binary_level(Self::parse_unary_expr, |t| match t {
            Token::Multiply => Some(BinaryOp::Mul),
            Token::Div => Some(BinaryOp::Div),
            Token::Mod => Some(BinaryOp::Mod),
            _ => None,
        })
    }

    fn parse_unary_expr(&mut self) -> Result<Expr, String> {
        if matches!(self.current, Token::Minus) {
            self.advance();
            let expr = self.parse_unary_expr()?;
            Ok(Expr::Negate(Box::new(expr)))
        } else {
            self.parse_union_expr()
        }
    }

    fn parse_union_expr(&mut self) -> Result<Expr, String> {
        let mut left = self.parse_path_expr()?;

        while matches!(self.current, Token::Pipe) {
            self.advance();
            let right = self.parse_path_expr()?;
            left = Expr::Union(Box::new(left), Box::new(right));
        }

        Ok(left)
    }

    fn starts_step(&self) -> bool {
        matches!(
            self.current,
            Token::Name(_)
                | Token::NameTest(_)
                | Token::NodeType(_)
                | Token::Star
                | Token::At
                | Token::Axis(_)
                | Token::Dot
                | Token::DoubleDot
        )
    }

    fn parse_path_expr(&mut self) -> Result<Expr, String> {
        // A name followed by `(` is a function call, not a step
        let is_call = matches!(self.current, Token::Name(_) | Token::NameTest(_))
            && matches!(self.peek(), Token::LeftParen);
        let expr = match &self.current {
            Token::Slash => {
                self.advance();
                let root = Expr::Root { scoped: false };
                if !self.starts_step() {
                    return Ok(root);
                }
                let step = self.parse_step()?;
                Expr::Path(Box::new(root), Box::new(step))
            }
            Token::DoubleSlash => {
                self.advance();
                self.parse_descendant_step(Expr::Root { scoped: true })?
            }
            _ if is_call => self.parse_filter_expr()?,
            _ if self.starts_step() => Expr::Step(Box::new(self.parse_step()?)),
            _ => self.parse_filter_expr()?,
        };
        self.parse_path_continuation(expr)
    }

    fn parse_path_continuation(&mut self, mut expr: Expr) -> Result<Expr, String> {
        loop {
            match &self.current {
                Token::Slash => {
                    self.advance();
                    let step = self.parse_step()?;
                    expr = Expr::Path(Box::new(expr), Box::new(step));
                }
                Token::DoubleSlash => {
                    self.advance();
                    expr = self.parse_descendant_step(expr)?;
                }
                _ => return Ok(expr),
            }
        }
    }

    /// `base//step`. A plain child step folds into one descendant step;
    /// anything else keeps the full `descendant-or-self::node()/step` form
    /// so that positional predicates see the right context.
    fn parse_descendant_step(&mut self, base: Expr) -> Result<Expr, String> {
        let step = self.parse_step()?;
        if step.axis == Axis::Child && step.predicates.is_empty() {
            let folded = Step::new(Axis::Descendant, step.node_test);
            return Ok(Expr::Path(Box::new(base), Box::new(folded)));
        }
        let any = Step::new(Axis::DescendantOrSelf, NodeTest::Node);
        Ok(Expr::Path(
            Box::new(Expr::Path(Box::new(base), Box::new(any))),
            Box::new(step),
        ))
    }

    fn parse_filter_expr(&mut self) -> Result<Expr, String> {
        let mut expr = self.parse_primary_expr()?;
        while matches!(self.current, Token::LeftBracket) {
            let pred = self.parse_predicate()?;
            expr = Expr::Filter(Box::new(expr), Box::new(pred));
        }
        Ok(expr)
    }

    fn parse_predicate(&mut self) -> Result<Expr, String> {
        self.advance();
        let pred = self.parse_or_expr()?;
        self.expect(Token::RightBracket, "`]`")?;
        Ok(pred)
    }

    fn parse_primary_expr(&mut self) -> Result<Expr, String> {
        match self.current.clone() {
            Token::Number(n) => {
                self.advance();
                Ok(Expr::Number(n))
            }
            Token::String(s) => {
                self.advance();
                Ok(Expr::String(s))
            }
            Token::LeftParen => {
                self.advance();
                let expr = self.parse_or_expr()?;
                self.expect(Token::RightParen, "`)`")?;
                Ok(expr)
            }
            Token::Name(name) | Token::NameTest(name) => {
                self.advance();
                self.expect(Token::LeftParen, "`(`")?;
                let args = self.parse_function_args()?;
                Ok(Expr::Function(name, args))
            }
            token => Err(self.unexpected(&token)),
        }
    }

    fn parse_function_args(&mut self) -> Result<Vec<Expr>, String> {
        let mut args = Vec::new();
        if matches!(self.current, Token::RightParen) {
            self.advance();
            return Ok(args);
        }
        loop {
            args.push(self.parse_or_expr()?);
            match &self.current {
                Token::Comma => self.advance(),
                Token::RightParen => {
                    self.advance();
                    return Ok(args);
                }
                Token::Error(message) => return Err(message.clone()),
                _ => return Err("expected `,` or `)` in function call".to_string()),
            }
        }
    }

    fn parse_step(&mut self) -> Result<Step, String> {
        let axis = match self.current.clone() {
            Token::Dot => {
                self.advance();
                return Ok(Step::new(Axis::Self_, NodeTest::Node));
            }
            Token::DoubleDot => {
                self.advance();
                return Ok(Step::new(Axis::Parent, NodeTest::Node));
            }
            Token::At => {
                self.advance();
                Axis::Attribute
            }
            Token::Axis(name) => {
                let axis = Axis::from_name(&name).ok_or_else(|| format!("unknown axis `{name}`"))?;
                self.advance();
                self.expect(Token::DoubleColon, "`::`")?;
                axis
            }
            _ => Axis::Child,
        };

        let node_test = self.parse_node_test()?;
        let mut step = Step::new(axis, node_test);
        while matches!(self.current, Token::LeftBracket) {
            step.predicates.push(self.parse_predicate()?);
        }
        Ok(step)
    }

    fn parse_node_test(&mut self) -> Result<NodeTest, String> {
        let test = match self.current.clone() {
            Token::Star => NodeTest::Any,
            Token::Name(name) => NodeTest::Name(name),
            Token::NameTest(qname) => match qname.split_once(':') {
                Some((prefix, "*")) => NodeTest::NamespaceWildcard(prefix.to_string()),
                Some((prefix, local)) => NodeTest::QName(prefix.to_string(), local.to_string()),
                None => NodeTest::Name(qname),
            },
            Token::NodeType(kind) => {
                self.advance();
                self.expect(Token::LeftParen, "`(`")?;
                let target = match self.current.clone() {
                    Token::String(s) if kind == "processing-instruction" => {
                        self.advance();
                        Some(s)
                    }
                    _ => None,
                };
                self.expect(Token::RightParen, "`)`")?;
                return match kind.as_str() {
                    "node" => Ok(NodeTest::Node),
                    "text" => Ok(NodeTest::Text),
                    "comment" => Ok(NodeTest::Comment),
                    _ => Ok(NodeTest::ProcessingInstruction(target)),
                };
            }
            token => {
                return Err(match token {
                    Token::Error(message) => message,
                    Token::Eof => "expected a node test".to_string(),
                    token => format!("expected a node test, found {token:?}"),
                })
            }
        };
        self.advance();
        Ok(test)
    }
}

/// Parse an expression string
pub fn parse(input: &str) -> Result<Expr, String> {
    Parser::new(input).parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(axis: Axis, test: NodeTest) -> Box<Step> {
        Box::new(Step::new(axis, test))
    }

    fn name(n: &str) -> NodeTest {
        NodeTest::Name(n.to_string())
    }

    #[test]
    fn test_relative_path() {
        let expr = parse("a/b").unwrap();
        assert_eq!(
            expr,
            Expr::Path(
                Box::new(Expr::Step(step(Axis::Child, name("a")))),
                step(Axis::Child, name("b"))
            )
        );
        assert!(!expr.is_absolute());
    }

    #[test]
    fn test_absolute_and_root() {
        assert_eq!(parse("/").unwrap(), Expr::Root { scoped: false });
        let expr = parse("/r").unwrap();
        assert!(expr.is_absolute());
        assert_eq!(
            expr,
            Expr::Path(Box::new(Expr::Root { scoped: false }), step(Axis::Child, name("r")))
        );
    }

    #[test]
    fn test_double_slash_folds_plain_child_step() {
        let expr = parse("//Name").unwrap();
        assert_eq!(
            expr,
            Expr::Path(Box::new(Expr::Root { scoped: true }), step(Axis::Descendant, name("Name")))
        );
        assert!(!expr.is_absolute());
    }

    #[test]
    fn test_double_slash_keeps_positional_context() {
        let expr = parse("//E[1]").unwrap();
        let Expr::Path(base, last) = expr else {
            panic!("expected a path");
        };
        assert_eq!(last.predicates, vec![Expr::Number(1.0)]);
        assert_eq!(
            *base,
            Expr::Path(Box::new(Expr::Root { scoped: true }), step(Axis::DescendantOrSelf, NodeTest::Node))
        );
    }

    #[test]
    fn test_abbreviations() {
        assert_eq!(parse(".").unwrap(), Expr::Step(step(Axis::Self_, NodeTest::Node)));
        assert_eq!(parse("..").unwrap(), Expr::Step(step(Axis::Parent, NodeTest::Node)));
        assert_eq!(parse("@id").unwrap(), Expr::Step(step(Axis::Attribute, name("id"))));
        assert_eq!(
            parse("a:*").unwrap(),
            Expr::Step(step(Axis::Child, NodeTest::NamespaceWildcard("a".to_string())))
        );
    }

    #[test]
    fn test_predicates_and_operators() {
        let expr = parse("e[@k = 'v' and position() < 3]").unwrap();
        let Expr::Step(s) = expr else {
            panic!("expected a step");
        };
        assert_eq!(s.predicates.len(), 1);
        assert!(matches!(s.predicates[0], Expr::Binary(_, BinaryOp::And, _)));
    }

    #[test]
    fn test_union_absoluteness() {
        assert!(parse("/a | /b").unwrap().is_absolute());
        assert!(!parse("/a | b").unwrap().is_absolute());
        assert!(!parse("//a | /b").unwrap().is_absolute());
        assert!(parse("//a | /b").unwrap().mixes_scopes());
        assert!(parse("(/a | b)[1]/c").unwrap().mixes_scopes());
        assert!(!parse("a | b").unwrap().mixes_scopes());
        assert!(!parse("/a | /b").unwrap().mixes_scopes());
        assert!(!parse("a[/b | c]").unwrap().mixes_scopes());
    }

    #[test]
    fn test_processing_instruction_target() {
        assert_eq!(
            parse("processing-instruction('x')").unwrap(),
            Expr::Step(step(
                Axis::Child,
                NodeTest::ProcessingInstruction(Some("x".to_string()))
            ))
        );
    }

    #[test]
    fn test_errors() {
        assert!(parse("").is_err());
        assert!(parse("a[").is_err());
        assert!(parse("a]").is_err());
        assert!(parse("a b").is_err());
        assert!(parse("following::a").unwrap_err().contains("unknown axis"));
        assert!(parse("namespace::a").is_err());
        assert!(parse("a/").is_err());
        assert!(parse("(a").is_err());
        assert!(parse("$v").unwrap_err().contains("variable"));
    }
}
