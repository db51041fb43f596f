//! Calculator tool — evaluates arithmetic expressions.
//!
//! Supports `+`, `-`, `*`, `/`, `//` (floor division), `%` (floored
//! modulo), `**` (right-associative power), parentheses, unary signs and
//! decimal numbers. Characters outside that alphabet are dropped before
//! evaluation, so `"what is 2 + 2?"` evaluates `2 + 2`.

use async_trait::async_trait;
use thoughtline_core::error::ToolError;
use thoughtline_core::tool::Tool;

pub struct CalculatorTool;

#[async_trait]
impl Tool for CalculatorTool {
    fn name(&self) -> &str {
        "Calculator"
    }

    fn description(&self) -> &str {
        "Evaluates a basic math expression and returns the result."
    }

    fn action_type(&self) -> &str {
        "calculate"
    }

    fn input_format(&self) -> &str {
        "A math expression as a string. Example: '2 + 3 * (5 - 1)'"
    }

    async fn run(&self, input: serde_json::Value) -> Result<String, ToolError> {
        let expr = match &input {
            serde_json::Value::String(s) => s.clone(),
            serde_json::Value::Number(n) => n.to_string(),
            serde_json::Value::Object(map) => match map.get("expression").and_then(|v| v.as_str()) {
                Some(s) => s.to_string(),
                None => return Ok("Error: Invalid calculation: missing 'expression'".into()),
            },
            _ => return Ok("Error: Invalid calculation: expected an expression string".into()),
        };

        let safe: String = expr.chars().filter(|c| is_expression_char(*c)).collect();
        match evaluate(&safe) {
            Ok(value) => Ok(format_number(value)),
            Err(e) => Ok(format!("Error: Invalid calculation: {e}")),
        }
    }
}

fn is_expression_char(c: char) -> bool {
    c.is_ascii_digit() || matches!(c, '+' | '-' | '*' | '/' | '%' | '(' | ')' | '.' | ' ')
}

/// Remove a trailing `.0` from integral results.
fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

// ── Recursive-descent expression evaluator ────────────────────────────────

/// Evaluate a mathematical expression string.
pub fn evaluate(expr: &str) -> Result<f64, String> {
    let tokens = tokenize(expr)?;
    let mut parser = Parser::new(&tokens);
    let result = parser.parse_expr()?;
    if parser.pos < parser.tokens.len() {
        return Err(format!(
            "Unexpected token at position {}: {:?}",
            parser.pos, parser.tokens[parser.pos]
        ));
    }
    if !result.is_finite() {
        return Err("Result is not a finite number".into());
    }
    Ok(result)
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Plus,
    Minus,
    Star,
    Slash,
    DoubleSlash,
    Percent,
    Power,
    LParen,
    RParen,
}

fn tokenize(input: &str) -> Result<Vec<Token>, String> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = input.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        let next = chars.get(i + 1).copied();
        match chars[i] {
            ' ' | '\t' | '\n' | '\r' => i += 1,
            '+' => { tokens.push(Token::Plus); i += 1; }
            '-' => { tokens.push(Token::Minus); i += 1; }
            '*' if next == Some('*') => { tokens.push(Token::Power); i += 2; }
            '*' => { tokens.push(Token::Star); i += 1; }
            '/' if next == Some('/') => { tokens.push(Token::DoubleSlash); i += 2; }
            '/' => { tokens.push(Token::Slash); i += 1; }
            '%' => { tokens.push(Token::Percent); i += 1; }
            '(' => { tokens.push(Token::LParen); i += 1; }
            ')' => { tokens.push(Token::RParen); i += 1; }
            c if c.is_ascii_digit() || c == '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                let num_str: String = chars[start..i].iter().collect();
                let num: f64 = num_str
                    .parse()
                    .map_err(|_| format!("Invalid number: {}", num_str))?;
                tokens.push(Token::Number(num));
            }
            c => return Err(format!("Unexpected character: '{}'", c)),
        }
    }

    Ok(tokens)
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Token]) -> Self {
        Self { tokens, pos: 0 }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn consume(&mut self) -> Option<&Token> {
        let tok = self.tokens.get(self.pos);
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    // expr = term (('+' | '-') term)*
    fn parse_expr(&mut self) -> Result<f64, String> {
        let mut left = self.parse_term()?;
        while let Some(op) = self.peek() {
            match op {
                Token::Plus => {
                    self.consume();
                    left += self.parse_term()?;
                }
                Token::Minus => {
                    self.consume();
                    left -= self.parse_term()?;
                }
                _ => break,
            }
        }
        Ok(left)
    }

    // term = unary (('*' | '/' | '//' | '%') unary)*
    fn parse_term(&mut self) -> Result<f64, String> {
        let mut left = self.parse_unary()?;
        while let Some(op) = self.peek().cloned() {
            match op {
                Token::Star => {
                    self.consume();
                    left *= self.parse_unary()?;
                }
                Token::Slash | Token::DoubleSlash | Token::Percent => {
                    self.consume();
                    let right = self.parse_unary()?;
                    if right == 0.0 {
                        return Err("Division by zero".into());
                    }
                    left = match op {
                        Token::Slash => left / right,
                        Token::DoubleSlash => (left / right).floor(),
                        _ => left - right * (left / right).floor(),
                    };
                }
                _ => break,
            }
        }
        Ok(left)
    }

    // unary = ('-' | '+') unary | power
    fn parse_unary(&mut self) -> Result<f64, String> {
        match self.peek() {
            Some(Token::Minus) => {
                self.consume();
                Ok(-self.parse_unary()?)
            }
            Some(Token::Plus) => {
                self.consume();
                self.parse_unary()
            }
            _ => self.parse_power(),
        }
    }

    // power = primary ('**' unary)?
    fn parse_power(&mut self) -> Result<f64, String> {
        let base = self.parse_primary()?;
        if let Some(Token::Power) = self.peek() {
            self.consume();
            let exponent = self.parse_unary()?;
            return Ok(base.powf(exponent));
        }
        Ok(base)
    }

    // primary = NUMBER | '(' expr ')'
    fn parse_primary(&mut self) -> Result<f64, String> {
        match self.consume() {
            Some(Token::Number(n)) => Ok(*n),
            Some(Token::LParen) => {
                let val = self.parse_expr()?;
                match self.consume() {
                    Some(Token::RParen) => Ok(val),
                    _ => Err("Expected closing parenthesis".into()),
                }
            }
            Some(tok) => Err(format!("Unexpected token: {:?}", tok)),
            None => Err("Unexpected end of expression".into()),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operator_precedence() {
        assert_eq!(evaluate("2 + 3 * 4").unwrap(), 14.0);
        assert_eq!(evaluate("2 + 3 * (5 - 1)").unwrap(), 14.0);
    }

    #[test]
    fn nested_parentheses() {
        assert_eq!(evaluate("((1 + 2) * (3 + 4))").unwrap(), 21.0);
    }

    #[test]
    fn division_by_zero() {
        assert!(evaluate("1 / 0").is_err());
        assert!(evaluate("1 // 0").is_err());
        assert!(evaluate("1 % 0").is_err());
    }

    #[test]
    fn floor_division_and_modulo_follow_floor_semantics() {
        assert_eq!(evaluate("7 // 2").unwrap(), 3.0);
        assert_eq!(evaluate("-7 // 2").unwrap(), -4.0);
        assert_eq!(evaluate("7 % 3").unwrap(), 1.0);
        assert_eq!(evaluate("-7 % 3").unwrap(), 2.0);
    }

    #[test]
    fn power_is_right_associative_and_binds_tighter_than_negation() {
        assert_eq!(evaluate("2 ** 3 ** 2").unwrap(), 512.0);
        assert_eq!(evaluate("-2 ** 2").unwrap(), -4.0);
        assert_eq!(evaluate("2 ** -1").unwrap(), 0.5);
    }

    #[test]
    fn unary_signs() {
        assert_eq!(evaluate("-5 + 3").unwrap(), -2.0);
        assert_eq!(evaluate("+5 - -3").unwrap(), 8.0);
    }

    #[test]
    fn complex_expression() {
        let result = evaluate("(10 + 5) / 3 - 2 * (1 + 1)").unwrap();
        assert!((result - 1.0).abs() < 1e-10);
    }

    #[test]
    fn invalid_expressions() {
        assert!(evaluate("2 +").is_err());
        assert!(evaluate("").is_err());
        assert!(evaluate("(1 + 2").is_err());
        assert!(evaluate("1.2.3").is_err());
    }

    #[test]
    fn overflow_is_rejected() {
        assert!(evaluate("10 ** 400").is_err());
    }

    #[tokio::test]
    async fn tool_formats_integers_and_decimals() {
        let tool = CalculatorTool;
        assert_eq!(tool.run(serde_json::json!("10 / 2")).await.unwrap(), "5");
        let third = tool.run(serde_json::json!("10 / 3")).await.unwrap();
        assert!(third.starts_with("3.333"));
    }

    #[tokio::test]
    async fn tool_drops_unsafe_characters() {
        let tool = CalculatorTool;
        let output = tool.run(serde_json::json!("what is 2 + 2?")).await.unwrap();
        assert_eq!(output, "4");
    }

    #[tokio::test]
    async fn tool_accepts_expression_object() {
        let tool = CalculatorTool;
        let output = tool
            .run(serde_json::json!({"expression": "(2 + 3) * 4"}))
            .await
            .unwrap();
        assert_eq!(output, "20");
    }

    #[tokio::test]
    async fn tool_reports_invalid_calculation() {
        let tool = CalculatorTool;
        let output = tool.run(serde_json::json!("2 +")).await.unwrap();
        assert!(output.starts_with("Error: Invalid calculation"));

        let output = tool.run(serde_json::json!(["2 + 2"])).await.unwrap();
        assert!(output.starts_with("Error: Invalid calculation"));
    }

    #[test]
    fn tool_descriptor() {
        let def = CalculatorTool.descriptor();
        assert_eq!(def.action_type, "calculate");
        assert_eq!(def.name, "Calculator");
    }
}
