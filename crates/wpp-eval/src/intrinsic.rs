//! Intrinsic dispatch.
//!
//! Intrinsics are built-in operations the evaluator performs itself.
//! Arguments are evaluated eagerly like any call; dispatch then works on
//! the resulting byte values. `run` and `pipe` go through `sh -c` with the
//! working directory as ambient root and can be disabled wholesale via
//! [`crate::Config::allow_exec`]; a non-zero child exit is an eval error.

use std::io::Write;
use std::process::{Command, Stdio};

use wpp_par::{IntrinsicKind, NodeId};
use wpp_util::{Diagnostic, Result, Span};

use crate::Evaluator;

impl Evaluator {
    pub(crate) fn eval_intrinsic(
        &mut self,
        kind: IntrinsicKind,
        args: &[NodeId],
        span: Span,
    ) -> Result<Vec<u8>> {
        if args.len() != kind.arity() {
            return Err(Diagnostic::eval(
                format!(
                    "'{}' expects {} argument(s), found {}",
                    kind.name(),
                    kind.arity(),
                    args.len()
                ),
                span,
            ));
        }

        let mut values = Vec::with_capacity(args.len());
        for &arg in args {
            values.push(self.eval(arg)?);
        }

        match kind {
            IntrinsicKind::Source | IntrinsicKind::Eval => {
                let src = values.swap_remove(0);
                self.eval_meta(src, span)
            }

            IntrinsicKind::File => {
                let path = utf8(&values[0], "file path", span)?;
                std::fs::read(path).map_err(|e| {
                    Diagnostic::eval(format!("cannot read '{}': {}", path, e), span)
                })
            }

            IntrinsicKind::Assert => {
                if values[0] == values[1] {
                    Ok(Vec::new())
                } else {
                    Err(Diagnostic::eval(
                        format!(
                            "assertion failed: \"{}\" != \"{}\"",
                            lossy(&escape_bytes(&values[0])),
                            lossy(&escape_bytes(&values[1]))
                        ),
                        span,
                    ))
                }
            }

            IntrinsicKind::Error => Err(Diagnostic::eval(lossy(&values[0]), span)),

            IntrinsicKind::Run => self.run_command(&values[0], None, span),

            IntrinsicKind::Pipe => {
                let (command, input) = (&values[0], &values[1]);
                self.run_command(command, Some(input), span)
            }

            IntrinsicKind::Slice => intrinsic_slice(&values[0], &values[1], &values[2], span),

            IntrinsicKind::Find => Ok(intrinsic_find(&values[0], &values[1])),

            IntrinsicKind::Length => Ok(values[0].len().to_string().into_bytes()),

            IntrinsicKind::Log => {
                let mut stderr = std::io::stderr();
                let _ = stderr.write_all(&values[0]);
                let _ = stderr.write_all(b"\n");
                Ok(Vec::new())
            }

            IntrinsicKind::Escape => Ok(escape_bytes(&values[0])),
        }
    }

    fn run_command(&self, command: &[u8], input: Option<&[u8]>, span: Span) -> Result<Vec<u8>> {
        if !self.config.allow_exec {
            return Err(Diagnostic::eval("subprocess intrinsics are disabled", span));
        }
        let command = utf8(command, "command", span)?;

        let mut child = Command::new("sh")
            .arg("-c")
            .arg(command)
            .stdin(if input.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .spawn()
            .map_err(|e| Diagnostic::eval(format!("cannot spawn '{}': {}", command, e), span))?;

        if let Some(input) = input {
            if let Some(mut stdin) = child.stdin.take() {
                stdin.write_all(input).map_err(|e| {
                    Diagnostic::eval(format!("cannot write to '{}': {}", command, e), span)
                })?;
                // Dropping the handle closes the pipe.
            }
        }

        let output = child
            .wait_with_output()
            .map_err(|e| Diagnostic::eval(format!("cannot wait for '{}': {}", command, e), span))?;

        if !output.status.success() {
            return Err(Diagnostic::eval(
                format!("command '{}' exited with {}", command, output.status),
                span,
            ));
        }
        Ok(output.stdout)
    }
}

fn intrinsic_slice(haystack: &[u8], index: &[u8], length: &[u8], span: Span) -> Result<Vec<u8>> {
    let index = parse_int(index, span)?;
    let length = parse_int(length, span)?;

    if length < 0 {
        return Err(Diagnostic::eval("slice length cannot be negative", span));
    }

    // A negative index counts from the end.
    let start = if index < 0 {
        haystack.len() as i64 + index
    } else {
        index
    };

    let end = start.checked_add(length);
    if start < 0 || end.map_or(true, |end| end > haystack.len() as i64) {
        return Err(Diagnostic::eval(
            format!(
                "slice {}+{} out of range for {} byte(s)",
                index,
                length,
                haystack.len()
            ),
            span,
        ));
    }

    let start = start as usize;
    Ok(haystack[start..start + length as usize].to_vec())
}

fn intrinsic_find(haystack: &[u8], needle: &[u8]) -> Vec<u8> {
    if needle.is_empty() {
        return b"0".to_vec();
    }
    if needle.len() > haystack.len() {
        return b"-1".to_vec();
    }
    match haystack
        .windows(needle.len())
        .position(|window| window == needle)
    {
        Some(index) => index.to_string().into_bytes(),
        None => b"-1".to_vec(),
    }
}

/// Decimal ASCII integer with optional leading `-`.
fn parse_int(bytes: &[u8], span: Span) -> Result<i64> {
    std::str::from_utf8(bytes)
        .ok()
        .and_then(|s| s.parse::<i64>().ok())
        .ok_or_else(|| {
            Diagnostic::eval(
                format!("expected an integer, found \"{}\"", lossy(&escape_bytes(bytes))),
                span,
            )
        })
}

fn utf8<'a>(bytes: &'a [u8], what: &str, span: Span) -> Result<&'a str> {
    std::str::from_utf8(bytes)
        .map_err(|_| Diagnostic::eval(format!("{} is not valid UTF-8", what), span))
}

fn lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

/// Escape non-printable bytes into printable form: named escapes for quote,
/// backslash, newline, tab, and carriage return; `\xHH` for the rest.
pub fn escape_bytes(input: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(input.len());
    for &b in input {
        match b {
            b'"' => out.extend_from_slice(b"\\\""),
            b'\\' => out.extend_from_slice(b"\\\\"),
            b'\n' => out.extend_from_slice(b"\\n"),
            b'\t' => out.extend_from_slice(b"\\t"),
            b'\r' => out.extend_from_slice(b"\\r"),
            0x20..=0x7E => out.push(b),
            _ => out.extend_from_slice(format!("\\x{:02X}", b).as_bytes()),
        }
    }
    out
}
