//! The worker side of the evaluator pipe.

use std::io::{self, BufRead, Write};

use super::expr::{self, EvalError, Session};

/// Longest response the worker will produce, result prefix included.
const MAX_RESULT_LEN: usize = 1024;

/// The worker loop: one expression per line in, one response line out.
///
/// An evaluation failure becomes a categorized error line and never ends
/// the loop; the loop ends only when the pipe closes (or the parent kills
/// the process outright, which is how timeouts are enforced). stdout is
/// the protocol channel, so nothing else may be written to it.
pub fn run() -> io::Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut session = Session::default();

    for line in stdin.lock().lines() {
        let line = line?;
        let reply = match expr::eval(line.trim(), &session) {
            Ok(value) => {
                let text = format!("= {value}");
                session.ans = Some(value);
                if text.len() > MAX_RESULT_LEN {
                    EvalError::TooLong.to_string()
                } else {
                    text
                }
            }
            Err(category) => category.to_string(),
        };
        writeln!(stdout, "{reply}")?;
        stdout.flush()?;
    }
    Ok(())
}
