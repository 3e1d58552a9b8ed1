//! Environment variable expansion for configured paths.
//!
//! # Syntax
//!
//! - `$NAME` and `${NAME}` expand to the variable's value, or to nothing when
//!   it is unset.
//! - `%NAME%` expands to the variable's value; when unset the text is kept
//!   verbatim, as `cmd.exe` does.
//! - A `$` or `%` that does not start a reference passes through unchanged,
//!   as does an unterminated `${` or `%`.
//!
//! # Example
//!
//! ```
//! use wodman_lib::env::expand_with;
//!
//! let lookup = |name: &str| (name == "LOCALAPPDATA").then(|| "C:\\Users\\me\\AppData\\Local".to_string());
//! assert_eq!(
//!   expand_with("${LOCALAPPDATA}/podman", lookup),
//!   "C:\\Users\\me\\AppData\\Local/podman"
//! );
//! ```

/// Expand references against the current process environment.
pub fn expand(input: &str) -> String {
  expand_with(input, |name| std::env::var(name).ok())
}

/// Expand references using `lookup` to resolve variable names.
pub fn expand_with<F>(input: &str, lookup: F) -> String
where
  F: Fn(&str) -> Option<String>,
{
  let mut out = String::with_capacity(input.len());
  let mut rest = input;

  while let Some(pos) = rest.find(['$', '%']) {
    out.push_str(&rest[..pos]);
    let tail = &rest[pos..];

    let consumed = if tail.starts_with('$') {
      expand_dollar(tail, &lookup, &mut out)
    } else {
      expand_percent(tail, &lookup, &mut out)
    };

    rest = &tail[consumed..];
  }

  out.push_str(rest);
  out
}

/// Handle a reference starting at `$`. Returns the number of bytes consumed.
fn expand_dollar<F>(tail: &str, lookup: &F, out: &mut String) -> usize
where
  F: Fn(&str) -> Option<String>,
{
  let body = &tail[1..];

  if let Some(braced) = body.strip_prefix('{') {
    if let Some(end) = braced.find('}') {
      let name = &braced[..end];
      if is_name(name) {
        out.push_str(&lookup(name).unwrap_or_default());
        return 1 + 1 + end + 1;
      }
    }
    out.push('$');
    return 1;
  }

  let len = name_len(body);
  if len == 0 {
    out.push('$');
    return 1;
  }
  out.push_str(&lookup(&body[..len]).unwrap_or_default());
  1 + len
}

/// Handle a reference starting at `%`. Returns the number of bytes consumed.
fn expand_percent<F>(tail: &str, lookup: &F, out: &mut String) -> usize
where
  F: Fn(&str) -> Option<String>,
{
  let body = &tail[1..];
  match body.find('%') {
    Some(end) if end > 0 && is_name(&body[..end]) => {
      match lookup(&body[..end]) {
        Some(value) => out.push_str(&value),
        None => out.push_str(&tail[..end + 2]),
      }
      end + 2
    }
    _ => {
      out.push('%');
      1
    }
  }
}

fn name_len(s: &str) -> usize {
  let mut chars = s.char_indices();
  match chars.next() {
    Some((_, c)) if c == '_' || c.is_ascii_alphabetic() => {}
    _ => return 0,
  }
  chars
    .find(|(_, c)| !(c == &'_' || c.is_ascii_alphanumeric()))
    .map(|(i, _)| i)
    .unwrap_or(s.len())
}

fn is_name(s: &str) -> bool {
  !s.is_empty() && name_len(s) == s.len()
}
