//! Rule DSL parser.
//!
//! Recursive descent parser for signal expressions of the form
//! `FEATURE CMP NUMBER (AND FEATURE CMP NUMBER)*`, for example
//! `REL_VOLUME(20) > 2.0 AND ABS_CHANGE_PCT(1) < 2.0`. Errors carry the
//! character offset of the offending token.

use crate::domain::error::ParseError;
use crate::domain::feature::Feature;
use crate::domain::rule::{Comparator, Predicate};

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn remaining(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.peek() {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn expect_char(&mut self, expected: char) -> Result<(), ParseError> {
        self.skip_whitespace();
        match self.peek() {
            Some(ch) if ch == expected => {
                self.advance();
                Ok(())
            }
            Some(ch) => Err(ParseError {
                message: format!("expected '{}', found '{}'", expected, ch),
                position: self.pos,
            }),
            None => Err(ParseError {
                message: format!("expected '{}', found end of input", expected),
                position: self.pos,
            }),
        }
    }

    fn peek_keyword(&self, keyword: &str) -> bool {
        let remaining = self.remaining();
        remaining.starts_with(keyword)
            && (remaining.len() == keyword.len()
                || !remaining[keyword.len()..]
                    .chars()
                    .next()
                    .map(|c| c.is_alphanumeric() || c == '_')
                    .unwrap_or(false))
    }

    fn consume_keyword(&mut self, keyword: &str) -> bool {
        if self.peek_keyword(keyword) {
            self.pos += keyword.len();
            true
        } else {
            false
        }
    }

    fn consume_exact(&mut self, s: &str) -> bool {
        if self.remaining().starts_with(s) {
            self.pos += s.len();
            true
        } else {
            false
        }
    }

    fn peek_word(&self) -> String {
        let mut word = String::new();
        for ch in self.remaining().chars() {
            if ch.is_alphanumeric() || ch == '_' {
                word.push(ch);
            } else {
                break;
            }
        }
        if word.is_empty() {
            self.peek()
                .map(|c| c.to_string())
                .unwrap_or_else(|| "end of input".to_string())
        } else {
            word
        }
    }

    fn parse_number(&mut self) -> Result<f64, ParseError> {
        self.skip_whitespace();
        let start = self.pos;
        let mut has_dot = false;
        let mut digits = 0;

        if self.peek() == Some('-') {
            self.advance();
        }

        while let Some(ch) = self.peek() {
            if ch.is_ascii_digit() {
                digits += 1;
                self.advance();
            } else if ch == '.' && !has_dot {
                has_dot = true;
                self.advance();
            } else {
                break;
            }
        }

        if digits == 0 {
            return Err(ParseError {
                message: "expected number".to_string(),
                position: start,
            });
        }

        let num_str = &self.input[start..self.pos];
        num_str.parse::<f64>().map_err(|_| ParseError {
            message: format!("invalid number: {}", num_str),
            position: start,
        })
    }

    fn parse_integer(&mut self) -> Result<usize, ParseError> {
        self.skip_whitespace();
        let start = self.pos;
        let mut digits = 0;

        while let Some(ch) = self.peek() {
            if ch.is_ascii_digit() {
                digits += 1;
                self.advance();
            } else {
                break;
            }
        }

        if digits == 0 {
            return Err(ParseError {
                message: "expected integer".to_string(),
                position: start,
            });
        }

        let num_str = &self.input[start..self.pos];
        num_str.parse::<usize>().map_err(|_| ParseError {
            message: format!("invalid integer: {}", num_str),
            position: start,
        })
    }

    fn parse_period(&mut self) -> Result<usize, ParseError> {
        let period = self.parse_integer()?;
        self.expect_char(')')?;
        Ok(period)
    }

    fn parse_feature(&mut self) -> Result<Feature, ParseError> {
        self.skip_whitespace();

        if self.consume_exact("REL_VOLUME(") {
            return Ok(Feature::RelativeVolume(self.parse_period()?));
        }
        if self.consume_exact("ABS_CHANGE_PCT(") {
            return Ok(Feature::AbsChangePct(self.parse_period()?));
        }
        if self.consume_exact("CHANGE_PCT(") {
            return Ok(Feature::ChangePct(self.parse_period()?));
        }
        if self.consume_exact("RSI(") {
            return Ok(Feature::Rsi(self.parse_period()?));
        }
        if self.consume_exact("DIST_FROM_HIGH(") {
            return Ok(Feature::DistanceFromHigh(self.parse_period()?));
        }
        if self.consume_exact("UP_DOWN_VOLUME(") {
            return Ok(Feature::UpDownVolume(self.parse_period()?));
        }
        if self.consume_keyword("CLV") {
            return Ok(Feature::Clv);
        }
        if self.consume_keyword("VOLUME") {
            return Ok(Feature::Volume);
        }
        if self.consume_keyword("CLOSE") {
            return Ok(Feature::Close);
        }

        let word = self.peek_word();
        Err(ParseError {
            message: format!("expected feature, found '{}'", word),
            position: self.pos,
        })
    }

    fn parse_comparator(&mut self) -> Result<Comparator, ParseError> {
        self.skip_whitespace();
        if self.consume_exact(">=") {
            return Ok(Comparator::AtLeast);
        }
        if self.consume_exact("<=") {
            return Ok(Comparator::AtMost);
        }
        if self.consume_exact(">") {
            return Ok(Comparator::Above);
        }
        if self.consume_exact("<") {
            return Ok(Comparator::Below);
        }
        let found = self
            .peek()
            .map(|c| c.to_string())
            .unwrap_or_else(|| "end of input".to_string());
        Err(ParseError {
            message: format!("expected comparator (>, >=, <, <=), found '{}'", found),
            position: self.pos,
        })
    }

    fn parse_predicate(&mut self) -> Result<Predicate, ParseError> {
        let feature = self.parse_feature()?;
        let comparator = self.parse_comparator()?;
        let threshold = self.parse_number()?;
        Ok(Predicate::new(feature, comparator, threshold))
    }

    fn parse(&mut self) -> Result<Vec<Predicate>, ParseError> {
        let mut predicates = vec![self.parse_predicate()?];
        loop {
            self.skip_whitespace();
            if self.pos >= self.input.len() {
                break;
            }
            if !self.consume_keyword("AND") {
                return Err(ParseError {
                    message: format!("unexpected input after predicate: '{}'", self.remaining()),
                    position: self.pos,
                });
            }
            predicates.push(self.parse_predicate()?);
        }
        Ok(predicates)
    }
}

pub fn parse(input: &str) -> Result<Vec<Predicate>, ParseError> {
    let mut parser = Parser::new(input);
    parser.parse()
}
