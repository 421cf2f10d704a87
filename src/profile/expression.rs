use crate::error::{ConfigError, Result};

/// A parsed profile expression such as `prod & (eu | us)` or `!dev`.
///
/// `&` and `|` may not be mixed at one nesting level without parentheses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileExpression {
    Name(String),
    Not(Box<ProfileExpression>),
    And(Vec<ProfileExpression>),
    Or(Vec<ProfileExpression>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Open,
    Close,
    And,
    Or,
    Not,
    Name(String),
}

fn tokenize(expression: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut name = String::new();
    for c in expression.chars() {
        let token = match c {
            '(' => Some(Token::Open),
            ')' => Some(Token::Close),
            '&' => Some(Token::And),
            '|' => Some(Token::Or),
            '!' => Some(Token::Not),
            c if c.is_whitespace() => None,
            c => {
                name.push(c);
                continue;
            }
        };
        if !name.is_empty() {
            tokens.push(Token::Name(std::mem::take(&mut name)));
        }
        if let Some(token) = token {
            tokens.push(token);
        }
    }
    if !name.is_empty() {
        tokens.push(Token::Name(name));
    }
    tokens
}

struct Parser<'a> {
    source: &'a str,
    tokens: Vec<Token>,
    position: usize,
}

impl Parser<'_> {
    fn error(&self, reason: &str) -> ConfigError {
        ConfigError::invalid_profile(self.source, reason)
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.position).cloned();
        self.position += 1;
        token
    }

    fn expression(&mut self) -> Result<ProfileExpression> {
        let first = self.unary()?;
        let mut operands = vec![first];
        let mut operator: Option<Token> = None;
        while let Some(token @ (Token::And | Token::Or)) = self.peek().cloned() {
            match &operator {
                Some(existing) if *existing != token => {
                    return Err(self.error("malformed profile expression: mixed '&' and '|'"));
                }
                _ => operator = Some(token),
            }
            self.advance();
            operands.push(self.unary()?);
        }
        Ok(match operator {
            None => operands.remove(0),
            Some(Token::And) => ProfileExpression::And(operands),
            Some(_) => ProfileExpression::Or(operands),
        })
    }

    fn unary(&mut self) -> Result<ProfileExpression> {
        match self.advance() {
            Some(Token::Not) => Ok(ProfileExpression::Not(Box::new(self.unary()?))),
            Some(Token::Open) => {
                let inner = self.expression()?;
                match self.advance() {
                    Some(Token::Close) => Ok(inner),
                    _ => Err(self.error("malformed profile expression: missing ')'")),
                }
            }
            Some(Token::Name(name)) => Ok(ProfileExpression::Name(name)),
            _ => Err(self.error("malformed profile expression")),
        }
    }
}

impl ProfileExpression {
    pub fn parse(expression: &str) -> Result<Self> {
        let mut parser = Parser {
            source: expression,
            tokens: tokenize(expression),
            position: 0,
        };
        if parser.tokens.is_empty() {
            return Err(parser.error("profile expression must contain text"));
        }
        let parsed = parser.expression()?;
        if parser.position != parser.tokens.len() {
            return Err(parser.error("malformed profile expression"));
        }
        Ok(parsed)
    }

    pub fn matches<F>(&self, is_active: &F) -> bool
    where
        F: Fn(&str) -> bool,
    {
        match self {
            ProfileExpression::Name(name) => is_active(name),
            ProfileExpression::Not(inner) => !inner.matches(is_active),
            ProfileExpression::And(operands) => operands.iter().all(|e| e.matches(is_active)),
            ProfileExpression::Or(operands) => operands.iter().any(|e| e.matches(is_active)),
        }
    }
}
