//! Compiler flag merging
//!
//! The compiler driver keeps only the last occurrence of `-gcflags`, so every
//! codegen flag (user supplied or internally required) is folded into a
//! single combined argument.

const CODEGEN_FLAG: &str = "-gcflags";

/// Codegen flag that enables position-independent code
pub const DYNLINK_FLAG: &str = "-dynlink";

/// Merge caller flags with internally required codegen flags.
///
/// Non-codegen flags keep their order. The combined codegen flag is appended
/// last, with the position-independent flag first when enabled.
pub fn merge_build_flags(extra_flags: &[String], dynlink: bool) -> Vec<String> {
    let mut codegen: Vec<String> = Vec::new();
    if dynlink {
        codegen.push(DYNLINK_FLAG.to_string());
    }

    let mut merged = Vec::with_capacity(extra_flags.len() + 1);
    for flag in extra_flags {
        match codegen_value(flag) {
            Some(value) => {
                if !value.is_empty() {
                    codegen.push(value.to_string());
                }
            }
            None => merged.push(flag.clone()),
        }
    }

    if !codegen.is_empty() {
        merged.push(format!("{}={}", CODEGEN_FLAG, codegen.join(" ")));
    }
    merged
}

/// Extract the value of a codegen flag, accepting `-gcflags=v`,
/// `--gcflags=v` and a quoted value.
fn codegen_value(flag: &str) -> Option<&str> {
    let flag = flag.trim_start();
    let rest = flag
        .strip_prefix('-')
        .map(|f| f.strip_prefix('-').unwrap_or(f))?;
    let value = rest.strip_prefix(&CODEGEN_FLAG[1..])?;
    if value.is_empty() {
        return Some("");
    }
    let value = value.strip_prefix('=')?;
    Some(strip_quotes(value))
}

fn strip_quotes(value: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = value
            .strip_prefix(quote)
            .and_then(|v| v.strip_suffix(quote))
        {
            return inner;
        }
    }
    value
}
