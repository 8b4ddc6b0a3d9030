//! Restricted arithmetic evaluator for formula-rule expressions like `"m_NaCl / M_NaCl"`.
//!
//! Grammar:
//! ```text
//! expr    := term (('+' | '-') term)*
//! term    := unary (('*' | '/') unary)*
//! unary   := ('-' | '+') unary | primary
//! primary := number | ident | ident '(' expr ')' | '(' expr ')'
//! ```
//! Identifiers are looked up in the supplied environment only; the sole callable names are
//! `abs` and `log10`. Brackets, calls and signs may nest at most `MAX_NESTING_DEPTH` levels.
use crate::errors::ExprError;
use std::collections::HashMap;

pub const MAX_NESTING_DEPTH: usize = 64;

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::Number(x) => x.to_string(),
            Token::Ident(name) => name.clone(),
            Token::Plus => "+".to_string(),
            Token::Minus => "-".to_string(),
            Token::Star => "*".to_string(),
            Token::Slash => "/".to_string(),
            Token::LParen => "(".to_string(),
            Token::RParen => ")".to_string(),
        }
    }
}

fn tokenize(expression: &str) -> Result<Vec<Token>, ExprError> {
    let chars: Vec<char> = expression.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        match c {
            ' ' | '\t' | '\n' | '\r' => {
                i += 1;
            }
            '+' => {
                tokens.push(Token::Plus);
                i += 1;
            }
            '-' => {
                tokens.push(Token::Minus);
                i += 1;
            }
            '*' => {
                tokens.push(Token::Star);
                i += 1;
            }
            '/' => {
                tokens.push(Token::Slash);
                i += 1;
            }
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            c if c.is_ascii_digit() || c == '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                // exponent: e / E, optional sign, at least one digit
                if i < chars.len() && (chars[i] == 'e' || chars[i] == 'E') {
                    let mut j = i + 1;
                    if j < chars.len() && (chars[j] == '+' || chars[j] == '-') {
                        j += 1;
                    }
                    if j < chars.len() && chars[j].is_ascii_digit() {
                        while j < chars.len() && chars[j].is_ascii_digit() {
                            j += 1;
                        }
                        i = j;
                    }
                }
                let literal: String = chars[start..i].iter().collect();
                let value = literal
                    .parse::<f64>()
                    .map_err(|_| ExprError::UnexpectedToken(literal.clone()))?;
                tokens.push(Token::Number(value));
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                tokens.push(Token::Ident(chars[start..i].iter().collect()));
            }
            other => return Err(ExprError::UnexpectedChar(other, i)),
        }
    }
    Ok(tokens)
}

struct Parser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
    vars: &'a HashMap<String, f64>,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn expect(&mut self, expected: Token) -> Result<(), ExprError> {
        match self.next() {
            Some(ref t) if *t == expected => Ok(()),
            Some(t) => Err(ExprError::UnexpectedToken(t.describe())),
            None => Err(ExprError::UnexpectedEnd),
        }
    }

    fn expr(&mut self) -> Result<f64, ExprError> {
        let mut value = self.term()?;
        loop {
            match self.peek() {
                Some(Token::Plus) => {
                    self.pos += 1;
                    value += self.term()?;
                }
                Some(Token::Minus) => {
                    self.pos += 1;
                    value -= self.term()?;
                }
                _ => return Ok(value),
            }
        }
    }

    fn term(&mut self) -> Result<f64, ExprError> {
        let mut value = self.unary()?;
        loop {
            match self.peek() {
                Some(Token::Star) => {
                    self.pos += 1;
                    value *= self.unary()?;
                }
                Some(Token::Slash) => {
                    self.pos += 1;
                    let divisor = self.unary()?;
                    if divisor == 0.0 {
                        return Err(ExprError::DivisionByZero);
                    }
                    value /= divisor;
                }
                _ => return Ok(value),
            }
        }
    }

    /// runs `parse` one level deeper
    fn nested(
        &mut self,
        parse: fn(&mut Self) -> Result<f64, ExprError>,
    ) -> Result<f64, ExprError> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(ExprError::TooDeep(MAX_NESTING_DEPTH));
        }
        self.depth += 1;
        let value = parse(self);
        self.depth -= 1;
        value
    }

    fn unary(&mut self) -> Result<f64, ExprError> {
        match self.peek() {
            Some(Token::Minus) => {
                self.pos += 1;
                Ok(-self.nested(Self::unary)?)
            }
            Some(Token::Plus) => {
                self.pos += 1;
                self.nested(Self::unary)
            }
            _ => self.primary(),
        }
    }

    fn primary(&mut self) -> Result<f64, ExprError> {
        match self.next() {
            Some(Token::Number(x)) => Ok(x),
            Some(Token::LParen) => {
                let value = self.nested(Self::expr)?;
                self.expect(Token::RParen)?;
                Ok(value)
            }
            Some(Token::Ident(name)) => {
                if self.peek() == Some(&Token::LParen) {
                    self.pos += 1;
                    let argument = self.nested(Self::expr)?;
                    self.expect(Token::RParen)?;
                    apply_function(&name, argument)
                } else {
                    self.vars
                        .get(&name)
                        .copied()
                        .ok_or(ExprError::MissingVariable(name))
                }
            }
            Some(t) => Err(ExprError::UnexpectedToken(t.describe())),
            None => Err(ExprError::UnexpectedEnd),
        }
    }
}

fn apply_function(name: &str, argument: f64) -> Result<f64, ExprError> {
    match name {
        "abs" => Ok(argument.abs()),
        "log10" => {
            if argument <= 0.0 {
                Err(ExprError::Domain(format!("log10({})", argument)))
            } else {
                Ok(argument.log10())
            }
        }
        other => Err(ExprError::UnknownFunction(other.to_string())),
    }
}

/// evaluate `expression` with variables taken from `vars`
pub fn evaluate(expression: &str, vars: &HashMap<String, f64>) -> Result<f64, ExprError> {
    let tokens = tokenize(expression)?;
    if tokens.is_empty() {
        return Err(ExprError::UnexpectedEnd);
    }
    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
        vars,
    };
    let value = parser.expr()?;
    match parser.next() {
        None => Ok(value),
        Some(t) => Err(ExprError::UnexpectedToken(t.describe())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn env(pairs: &[(&str, f64)]) -> HashMap<String, f64> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_precedence_and_parentheses() {
        let vars = HashMap::new();
        assert_relative_eq!(evaluate("2 + 3 * 4", &vars).unwrap(), 14.0);
        assert_relative_eq!(evaluate("(2 + 3) * 4", &vars).unwrap(), 20.0);
        assert_relative_eq!(evaluate("8 / 4 / 2", &vars).unwrap(), 1.0);
        assert_relative_eq!(evaluate("10 - 4 - 3", &vars).unwrap(), 3.0);
        assert_relative_eq!(evaluate("-3 * -(2 + 1)", &vars).unwrap(), 9.0);
        assert_relative_eq!(evaluate("1.5e2 + 2E-1", &vars).unwrap(), 150.2, epsilon = 1e-12);
    }

    #[test]
    fn test_variables_and_functions() {
        let vars = env(&[("m_NaCl", 11.7), ("M_NaCl", 58.44), ("C_H", 0.001)]);
        assert_relative_eq!(
            evaluate("m_NaCl / M_NaCl", &vars).unwrap(),
            0.2,
            epsilon = 1e-3
        );
        assert_relative_eq!(
            evaluate("-log10(C_H)", &vars).unwrap(),
            3.0,
            epsilon = 1e-12
        );
        assert_relative_eq!(evaluate("abs(1 - m_NaCl)", &vars).unwrap(), 10.7, epsilon = 1e-12);
    }

    #[test]
    fn test_errors() {
        let vars = env(&[("x", 0.0)]);
        assert_eq!(evaluate("1 / x", &vars), Err(ExprError::DivisionByZero));
        assert_eq!(
            evaluate("y + 1", &vars),
            Err(ExprError::MissingVariable("y".to_string()))
        );
        assert_eq!(
            evaluate("exp(1)", &vars),
            Err(ExprError::UnknownFunction("exp".to_string()))
        );
        assert!(matches!(evaluate("log10(x)", &vars), Err(ExprError::Domain(_))));
        assert!(matches!(
            evaluate("__import__('os')", &vars),
            Err(ExprError::UnexpectedChar('\'', _))
        ));
        assert_eq!(evaluate("(1 + 2", &vars), Err(ExprError::UnexpectedEnd));
        assert_eq!(evaluate("", &vars), Err(ExprError::UnexpectedEnd));
        assert!(matches!(evaluate("1 2", &vars), Err(ExprError::UnexpectedToken(_))));
    }

    #[test]
    fn test_nesting_depth_is_bounded() {
        let vars = env(&[("x", 2.0)]);
        let deep_brackets = format!("{}x{}", "(".repeat(10_000), ")".repeat(10_000));
        assert_eq!(
            evaluate(&deep_brackets, &vars),
            Err(ExprError::TooDeep(MAX_NESTING_DEPTH))
        );
        let deep_signs = format!("{}x", "-".repeat(10_000));
        assert_eq!(
            evaluate(&deep_signs, &vars),
            Err(ExprError::TooDeep(MAX_NESTING_DEPTH))
        );
        let deep_calls = format!("{}x{}", "abs(".repeat(10_000), ")".repeat(10_000));
        assert_eq!(
            evaluate(&deep_calls, &vars),
            Err(ExprError::TooDeep(MAX_NESTING_DEPTH))
        );
        // moderate nesting is still evaluated
        let shallow = format!("{}x{}", "(".repeat(20), ")".repeat(20));
        assert_relative_eq!(evaluate(&shallow, &vars).unwrap(), 2.0);
        assert_relative_eq!(evaluate("--x", &vars).unwrap(), 2.0);
    }
}
