//! The restricted expression engine run inside the worker process.
//!
//! Arithmetic over f64 plus a fixed table of math functions and constants.
//! The language has no I/O, no name binding and no way to reach back into
//! the host; the only state is `ans`, the previous result of the session.

use thiserror::Error;

/// Wire-level evaluation failures. The display form is the exact string
/// sent back over the pipe.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EvalError {
    #[error("Syntax error.")]
    Syntax,
    #[error("Evaluation error.")]
    Value,
    #[error("Type mismatch.")]
    Type,
    #[error("Overflow.")]
    Overflow,
    #[error("Division by zero.")]
    DivisionByZero,
    #[error("Key not found.")]
    KeyNotFound,
    #[error("Unknown or forbidden function.")]
    UnknownName,
    #[error("Out of memory.")]
    OutOfMemory,
    #[error("Too long result.")]
    TooLong,
    #[error("Operation timed out.")]
    TimedOut,
    #[error("Error.")]
    Other,
}

/// An evaluation result: a number or a sequence of numbers.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Num(f64),
    Seq(Vec<f64>),
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Num(n) => write!(f, "{n}"),
            Value::Seq(items) => {
                let mut first = true;
                for item in items {
                    if !first {
                        write!(f, " ")?;
                    }
                    write!(f, "{item}")?;
                    first = false;
                }
                Ok(())
            }
        }
    }
}

/// Per-worker evaluation state.
#[derive(Debug, Default)]
pub struct Session {
    /// Result of the previous successful evaluation.
    pub ans: Option<Value>,
}

/// Longest sequence `seq` will materialize.
const MAX_SEQ_LEN: usize = 100_000;
/// Nesting bound for parentheses, calls and sign chains.
const MAX_DEPTH: usize = 128;

/// Evaluates `input` against the session. Does not update `ans`; the
/// worker loop does that on success.
pub fn eval(input: &str, session: &Session) -> Result<Value, EvalError> {
    let mut parser = Parser {
        chars: input.chars().collect(),
        pos: 0,
        depth: 0,
        session,
    };
    parser.skip_ws();
    if parser.at_end() {
        return Err(EvalError::Syntax);
    }
    let value = parser.expr()?;
    parser.skip_ws();
    if !parser.at_end() {
        return Err(EvalError::Syntax);
    }
    Ok(value)
}

struct Parser<'s> {
    chars: Vec<char>,
    pos: usize,
    depth: usize,
    session: &'s Session,
}

impl Parser<'_> {
    fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.pos += 1;
        }
    }

    fn eat(&mut self, wanted: char) -> bool {
        self.skip_ws();
        if self.peek() == Some(wanted) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn descend(&mut self) -> Result<(), EvalError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(EvalError::OutOfMemory);
        }
        Ok(())
    }

    fn expr(&mut self) -> Result<Value, EvalError> {
        self.descend()?;
        let mut acc = self.term()?;
        loop {
            self.skip_ws();
            let op = match self.peek() {
                Some(op @ ('+' | '-')) => op,
                _ => break,
            };
            self.pos += 1;
            let rhs = self.term()?;
            acc = binary(op, acc, rhs)?;
        }
        self.depth -= 1;
        Ok(acc)
    }

    fn term(&mut self) -> Result<Value, EvalError> {
        let mut acc = self.unary()?;
        loop {
            self.skip_ws();
            let op = match self.peek() {
                // "**" is power, not multiplication
                Some('*') if self.chars.get(self.pos + 1) != Some(&'*') => '*',
                Some(op @ ('/' | '%')) => op,
                _ => break,
            };
            self.pos += 1;
            let rhs = self.unary()?;
            acc = binary(op, acc, rhs)?;
        }
        Ok(acc)
    }

    fn unary(&mut self) -> Result<Value, EvalError> {
        self.skip_ws();
        match self.peek() {
            Some('-') => {
                self.descend()?;
                self.pos += 1;
                let value = self.unary()?;
                self.depth -= 1;
                match value {
                    Value::Num(n) => Ok(Value::Num(-n)),
                    Value::Seq(_) => Err(EvalError::Type),
                }
            }
            Some('+') => {
                self.descend()?;
                self.pos += 1;
                let value = self.unary()?;
                self.depth -= 1;
                value.into_num().map(Value::Num)
            }
            _ => self.power(),
        }
    }

    fn power(&mut self) -> Result<Value, EvalError> {
        let base = self.atom()?;
        self.skip_ws();
        let at_power = match self.peek() {
            Some('^') => {
                self.pos += 1;
                true
            }
            Some('*') if self.chars.get(self.pos + 1) == Some(&'*') => {
                self.pos += 2;
                true
            }
            _ => false,
        };
        if !at_power {
            return Ok(base);
        }
        // Right-associative; the exponent may carry its own sign.
        let exponent = self.unary()?;
        binary('^', base, exponent)
    }

    fn atom(&mut self) -> Result<Value, EvalError> {
        self.skip_ws();
        match self.peek() {
            Some('(') => {
                self.pos += 1;
                let value = self.expr()?;
                if !self.eat(')') {
                    return Err(EvalError::Syntax);
                }
                Ok(value)
            }
            Some(c) if c.is_ascii_digit() || c == '.' => self.number(),
            Some(c) if c.is_ascii_alphabetic() || c == '_' => self.identifier(),
            _ => Err(EvalError::Syntax),
        }
    }

    fn number(&mut self) -> Result<Value, EvalError> {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_ascii_digit() || c == '.') {
            self.pos += 1;
        }
        // Scientific notation tail
        if matches!(self.peek(), Some('e' | 'E')) {
            let mark = self.pos;
            self.pos += 1;
            if matches!(self.peek(), Some('+' | '-')) {
                self.pos += 1;
            }
            if matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                    self.pos += 1;
                }
            } else {
                // Not an exponent after all (e.g. "2e" or "2*e")
                self.pos = mark;
            }
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        let n: f64 = text.parse().map_err(|_| EvalError::Syntax)?;
        if !n.is_finite() {
            return Err(EvalError::Overflow);
        }
        Ok(Value::Num(n))
    }

    fn identifier(&mut self) -> Result<Value, EvalError> {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_ascii_alphanumeric() || c == '_') {
            self.pos += 1;
        }
        let name: String = self.chars[start..self.pos].iter().collect();

        self.skip_ws();
        if self.peek() == Some('(') {
            self.pos += 1;
            let args = self.arguments()?;
            return call(&name, args);
        }

        match name.as_str() {
            "pi" => Ok(Value::Num(std::f64::consts::PI)),
            "e" => Ok(Value::Num(std::f64::consts::E)),
            "tau" => Ok(Value::Num(std::f64::consts::TAU)),
            "ans" => self.session.ans.clone().ok_or(EvalError::KeyNotFound),
            _ => Err(EvalError::UnknownName),
        }
    }

    /// Parses a parenthesized, comma-separated argument list; the opening
    /// parenthesis is already consumed.
    fn arguments(&mut self) -> Result<Vec<Value>, EvalError> {
        let mut args = Vec::new();
        if self.eat(')') {
            return Ok(args);
        }
        loop {
            args.push(self.expr()?);
            if self.eat(',') {
                continue;
            }
            if self.eat(')') {
                return Ok(args);
            }
            return Err(EvalError::Syntax);
        }
    }
}

impl Value {
    fn into_num(self) -> Result<f64, EvalError> {
        match self {
            Value::Num(n) => Ok(n),
            Value::Seq(_) => Err(EvalError::Type),
        }
    }
}

/// Applies a binary operator, mapping non-finite results of finite
/// operands to the overflow/value categories.
fn binary(op: char, lhs: Value, rhs: Value) -> Result<Value, EvalError> {
    let a = lhs.into_num()?;
    let b = rhs.into_num()?;
    let result = match op {
        '+' => a + b,
        '-' => a - b,
        '*' => a * b,
        '/' => {
            if b == 0.0 {
                return Err(EvalError::DivisionByZero);
            }
            a / b
        }
        '%' => {
            if b == 0.0 {
                return Err(EvalError::DivisionByZero);
            }
            a % b
        }
        '^' => a.powf(b),
        _ => return Err(EvalError::Other),
    };
    checked(result)
}

/// Operands are finite by construction, so a non-finite result is an
/// arithmetic failure rather than propagation.
fn checked(result: f64) -> Result<Value, EvalError> {
    if result.is_finite() {
        Ok(Value::Num(result))
    } else if result.is_nan() {
        Err(EvalError::Value)
    } else {
        Err(EvalError::Overflow)
    }
}

fn call(name: &str, args: Vec<Value>) -> Result<Value, EvalError> {
    // Sequence-aware functions first
    match name {
        "seq" => return seq(args),
        "sum" => return sum(args),
        "min" | "max" => return fold_extremum(name, args),
        _ => {}
    }

    let unary_fn: Option<fn(f64) -> f64> = match name {
        "sin" => Some(f64::sin),
        "cos" => Some(f64::cos),
        "tan" => Some(f64::tan),
        "asin" => Some(f64::asin),
        "acos" => Some(f64::acos),
        "atan" => Some(f64::atan),
        "sinh" => Some(f64::sinh),
        "cosh" => Some(f64::cosh),
        "tanh" => Some(f64::tanh),
        "exp" => Some(f64::exp),
        "ln" => Some(f64::ln),
        "log2" => Some(f64::log2),
        "log10" => Some(f64::log10),
        "sqrt" => Some(f64::sqrt),
        "cbrt" => Some(f64::cbrt),
        "abs" => Some(f64::abs),
        "floor" => Some(f64::floor),
        "ceil" => Some(f64::ceil),
        "round" => Some(f64::round),
        "trunc" => Some(f64::trunc),
        "degrees" => Some(f64::to_degrees),
        "radians" => Some(f64::to_radians),
        _ => None,
    };
    if let Some(function) = unary_fn {
        let [arg] = one_arg(args)?;
        return checked(function(arg));
    }

    let binary_fn: Option<fn(f64, f64) -> f64> = match name {
        "atan2" => Some(f64::atan2),
        "pow" => Some(f64::powf),
        "hypot" => Some(f64::hypot),
        _ => None,
    };
    if let Some(function) = binary_fn {
        let [a, b] = two_args(args)?;
        return checked(function(a, b));
    }

    Err(EvalError::UnknownName)
}

fn one_arg(args: Vec<Value>) -> Result<[f64; 1], EvalError> {
    match <[Value; 1]>::try_from(args) {
        Ok([a]) => Ok([a.into_num()?]),
        Err(_) => Err(EvalError::Type),
    }
}

fn two_args(args: Vec<Value>) -> Result<[f64; 2], EvalError> {
    match <[Value; 2]>::try_from(args) {
        Ok([a, b]) => Ok([a.into_num()?, b.into_num()?]),
        Err(_) => Err(EvalError::Type),
    }
}

/// `seq(lo, hi)` - the integers of the closed range as a sequence.
fn seq(args: Vec<Value>) -> Result<Value, EvalError> {
    let [lo, hi] = two_args(args)?;
    let (lo, hi) = (lo.trunc() as i64, hi.trunc() as i64);
    if hi < lo {
        return Ok(Value::Seq(Vec::new()));
    }
    let len = (hi as i128 - lo as i128) + 1;
    if len > MAX_SEQ_LEN as i128 {
        return Err(EvalError::OutOfMemory);
    }
    Ok(Value::Seq((lo..=hi).map(|i| i as f64).collect()))
}

/// `sum(lo, hi)` iterates the closed integer range; `sum(s)` adds up a
/// sequence. The range form is deliberately naive, so an absurd range
/// takes correspondingly absurd time - the caller's timeout covers it.
fn sum(args: Vec<Value>) -> Result<Value, EvalError> {
    match args.len() {
        1 => {
            let mut args = args;
            match args.remove(0) {
                Value::Seq(items) => checked(items.iter().sum()),
                Value::Num(_) => Err(EvalError::Type),
            }
        }
        2 => {
            let [lo, hi] = two_args(args)?;
            let (lo, hi) = (lo.trunc() as i64, hi.trunc() as i64);
            let mut acc = 0.0;
            for i in lo..=hi {
                acc += i as f64;
            }
            checked(acc)
        }
        _ => Err(EvalError::Type),
    }
}

fn fold_extremum(name: &str, args: Vec<Value>) -> Result<Value, EvalError> {
    if args.is_empty() {
        return Err(EvalError::Type);
    }
    let mut nums = Vec::with_capacity(args.len());
    for arg in args {
        nums.push(arg.into_num()?);
    }
    let folded = if name == "min" {
        nums.into_iter().fold(f64::INFINITY, f64::min)
    } else {
        nums.into_iter().fold(f64::NEG_INFINITY, f64::max)
    };
    checked(folded)
}
