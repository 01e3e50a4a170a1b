//! Utility worker: greetings, arithmetic and the clock.
//!
//! `calculate` only accepts a closed grammar:
//!
//! ```text
//! sum     := product (('+' | '-') product)*
//! product := factor (('*' | '/') factor)*
//! factor  := '-' factor | '(' sum ')' | number
//! ```
//!
//! Anything else (names, calls, exponentiation) is rejected before any
//! evaluation happens.

use async_trait::async_trait;
use wayfarer_core::error::CapabilityError;
use wayfarer_core::{Capability, CapabilitySet};
use crate::required_str;

pub fn capabilities(server_name: &str) -> CapabilitySet {
    CapabilitySet::new(server_name)
        .with(Box::new(Greet))
        .with(Box::new(Calculate))
        .with(Box::new(CurrentTime))
}

pub struct Greet;

#[async_trait]
impl Capability for Greet {
    fn name(&self) -> &str {
        "greet"
    }

    fn description(&self) -> &str {
        "Greets a person by name with a friendly hello."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "name": { "type": "string", "description": "The name of the person to greet" }
            },
            "required": ["name"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<String, CapabilityError> {
        let name = required_str(&arguments, "name")?;
        Ok(format!("Hello, {name}! Welcome aboard. Ask me about trains, hotels or a whole trip."))
    }
}

pub struct Calculate;

#[async_trait]
impl Capability for Calculate {
    fn name(&self) -> &str {
        "calculate"
    }

    fn description(&self) -> &str {
        "Evaluates an arithmetic expression with numbers, + - * / and parentheses."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "expression": {
                    "type": "string",
                    "description": "Expression to evaluate, e.g. '2 + 3 * 4'"
                }
            },
            "required": ["expression"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<String, CapabilityError> {
        let expression = required_str(&arguments, "expression")?;
        let value = evaluate(expression).map_err(|e| {
            CapabilityError::InvalidArguments(format!("cannot evaluate '{expression}': {e}"))
        })?;
        Ok(format!("The result of '{expression}' is: {}", format_number(value)))
    }
}

pub struct CurrentTime;

#[async_trait]
impl Capability for CurrentTime {
    fn name(&self) -> &str {
        "get_time"
    }

    fn description(&self) -> &str {
        "Tells the current time and date from the system clock."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({ "type": "object", "properties": {}, "required": [] })
    }

    async fn execute(&self, _arguments: serde_json::Value) -> Result<String, CapabilityError> {
        let now = chrono::Local::now();
        Ok(format!("Current date and time: {}", now.format("%Y-%m-%d %H:%M:%S")))
    }
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        let rounded = format!("{value:.10}");
        rounded.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ArithmeticError {
    #[error("unexpected '{found}' at offset {offset}")]
    Unexpected { found: char, offset: usize },

    #[error("expression ended early")]
    UnexpectedEnd,

    #[error("invalid number '{0}'")]
    InvalidNumber(String),

    #[error("division by zero")]
    DivisionByZero,

    #[error("expression is nested too deeply")]
    TooDeep,
}

const MAX_DEPTH: usize = 64;

/// Evaluate an expression in the sandboxed grammar.
pub fn evaluate(source: &str) -> Result<f64, ArithmeticError> {
    let mut scanner = Scanner {
        src: source.as_bytes(),
        pos: 0,
        depth: 0,
    };
    let value = scanner.sum()?;
    scanner.skip_whitespace();
    match scanner.peek() {
        None => Ok(value),
        Some(b) => Err(ArithmeticError::Unexpected {
            found: b as char,
            offset: scanner.pos,
        }),
    }
}

struct Scanner<'a> {
    src: &'a [u8],
    pos: usize,
    depth: usize,
}

impl Scanner<'_> {
    fn skip_whitespace(&mut self) {
        while self.src.get(self.pos).is_some_and(u8::is_ascii_whitespace) {
            self.pos += 1;
        }
    }

    fn peek(&self) -> Option<u8> {
        self.src.get(self.pos).copied()
    }

    /// Consume `op` if it is the next non-blank byte.
    fn eat(&mut self, op: u8) -> bool {
        self.skip_whitespace();
        if self.peek() == Some(op) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn sum(&mut self) -> Result<f64, ArithmeticError> {
        let mut acc = self.product()?;
        loop {
            if self.eat(b'+') {
                acc += self.product()?;
            } else if self.eat(b'-') {
                acc -= self.product()?;
            } else {
                return Ok(acc);
            }
        }
    }

    fn product(&mut self) -> Result<f64, ArithmeticError> {
        let mut acc = self.factor()?;
        loop {
            if self.eat(b'*') {
                acc *= self.factor()?;
            } else if self.eat(b'/') {
                let divisor = self.factor()?;
                if divisor == 0.0 {
                    return Err(ArithmeticError::DivisionByZero);
                }
                acc /= divisor;
            } else {
                return Ok(acc);
            }
        }
    }

    fn factor(&mut self) -> Result<f64, ArithmeticError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(ArithmeticError::TooDeep);
        }
        let value = if self.eat(b'-') {
            self.factor().map(|v| -v)
        } else if self.eat(b'(') {
            let inner = self.sum()?;
            if self.eat(b')') {
                Ok(inner)
            } else {
                Err(self.unexpected())
            }
        } else {
            self.number()
        };
        self.depth -= 1;
        value
    }

    fn number(&mut self) -> Result<f64, ArithmeticError> {
        self.skip_whitespace();
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|b| b.is_ascii_digit() || b == b'.')
        {
            self.pos += 1;
        }
        if start == self.pos {
            return Err(self.unexpected());
        }
        let text = String::from_utf8_lossy(&self.src[start..self.pos]).into_owned();
        text.parse::<f64>()
            .map_err(|_| ArithmeticError::InvalidNumber(text))
    }

    fn unexpected(&self) -> ArithmeticError {
        match self.peek() {
            Some(b) => ArithmeticError::Unexpected {
                found: b as char,
                offset: self.pos,
            },
            None => ArithmeticError::UnexpectedEnd,
        }
    }
}
