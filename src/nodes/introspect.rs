//! Function introspection for nodepack sources
//!
//! Extracts top-level function definitions from a Python `ops.py` without
//! running it. String literals and comments are masked first so brackets,
//! commas and `def` keywords inside them are never mistaken for code.

use crate::error::{RegistryError, Result};
use regex::Regex;
use std::fs;
use std::path::Path;
use tracing::debug;

/// How a parameter may be passed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    PositionalOnly,
    PositionalOrKeyword,
    VarPositional,
    KeywordOnly,
    VarKeyword,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParamDescriptor {
    pub name: String,
    /// Annotation source text, e.g. `Optional[int]`
    pub annotation: Option<String>,
    /// Default value source text, e.g. `"mean"` or `0.5`
    pub default: Option<String>,
    pub kind: ParamKind,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDescriptor {
    pub name: String,
    pub is_async: bool,
    pub params: Vec<ParamDescriptor>,
    pub returns: Option<String>,
    pub docstring: Option<String>,
    /// 1-based line of the `def`
    pub line: usize,
}

/// Enumerates the callable definitions of a source file
pub trait FunctionIntrospector: Send + Sync {
    fn functions_in_file(&self, path: &Path) -> Result<Vec<FunctionDescriptor>>;
}

/// Reads public top-level functions from Python source
#[derive(Debug, Default, Clone, Copy)]
pub struct PythonIntrospector;

impl PythonIntrospector {
    pub fn new() -> Self {
        Self
    }
}

impl FunctionIntrospector for PythonIntrospector {
    fn functions_in_file(&self, path: &Path) -> Result<Vec<FunctionDescriptor>> {
        let source = fs::read_to_string(path).map_err(|e| RegistryError::IntrospectionFailed {
            path: path.display().to_string(),
            cause: format!("Failed to read file: {}", e),
        })?;

        let functions: Vec<FunctionDescriptor> = parse_functions(&source)
            .map_err(|cause| RegistryError::IntrospectionFailed {
                path: path.display().to_string(),
                cause,
            })?
            .into_iter()
            .filter(|f| !f.name.starts_with('_'))
            .collect();

        for function in &functions {
            debug!("Found '{}' at {}:{}", function.name, path.display(), function.line);
        }
        debug!("Found {} functions in {:?}", functions.len(), path);
        Ok(functions)
    }
}

/// Parse every top-level `def` in `source`, in source order
pub fn parse_functions(source: &str) -> std::result::Result<Vec<FunctionDescriptor>, String> {
    let masked = mask_source(source);
    let def_re = Regex::new(r"(?m)^(async[ \t]+)?def[ \t]+([A-Za-z_][A-Za-z0-9_]*)[ \t]*\(")
        .map_err(|e| e.to_string())?;

    let mut functions = Vec::new();

    for cap in def_re.captures_iter(&masked) {
        let (Some(whole), Some(name)) = (cap.get(0), cap.get(2)) else {
            continue;
        };
        let name = name.as_str().to_string();
        let open = whole.end() - 1;

        let close = find_matching(&masked, open)
            .ok_or_else(|| format!("Unterminated parameter list for '{}'", name))?;

        let params = parse_params(&source[open + 1..close], &masked[open + 1..close], &name)?;

        let colon = find_signature_colon(&masked, close + 1)
            .ok_or_else(|| format!("Missing ':' after signature of '{}'", name))?;

        let tail = source[close + 1..colon].trim();
        let returns = if tail.is_empty() {
            None
        } else if let Some(annotation) = tail.strip_prefix("->") {
            Some(annotation.trim().to_string())
        } else {
            return Err(format!("Unexpected '{}' after parameters of '{}'", tail, name));
        };

        functions.push(FunctionDescriptor {
            is_async: cap.get(1).is_some(),
            params,
            returns,
            docstring: leading_docstring(source, &masked, colon + 1),
            line: source[..whole.start()].matches('\n').count() + 1,
            name,
        });
    }

    Ok(functions)
}

fn parse_params(
    src: &str,
    masked: &str,
    function: &str,
) -> std::result::Result<Vec<ParamDescriptor>, String> {
    let mut params: Vec<ParamDescriptor> = Vec::new();
    let mut keyword_only = false;

    for (start, end) in split_top_level(masked) {
        let piece_mask = &masked[start..end];
        let lead = piece_mask.len() - piece_mask.trim_start().len();
        let trail = piece_mask.len() - piece_mask.trim_end().len();
        if lead == piece_mask.len() {
            // trailing comma
            continue;
        }
        let piece = &src[start + lead..end - trail];
        let piece_mask = &masked[start + lead..end - trail];

        match piece {
            "/" => {
                for param in params.iter_mut() {
                    param.kind = ParamKind::PositionalOnly;
                }
                continue;
            }
            "*" => {
                keyword_only = true;
                continue;
            }
            _ => {}
        }

        let (kind, skip) = if piece.starts_with("**") {
            (ParamKind::VarKeyword, 2)
        } else if piece.starts_with('*') {
            keyword_only = true;
            (ParamKind::VarPositional, 1)
        } else if keyword_only {
            (ParamKind::KeywordOnly, 0)
        } else {
            (ParamKind::PositionalOrKeyword, 0)
        };

        let eq = find_default_sign(piece_mask);
        let head_end = eq.unwrap_or(piece.len());
        let colon = find_top_level(&piece_mask[..head_end], b':');

        let name = piece[skip..colon.unwrap_or(head_end)].trim();
        if !is_identifier(name) {
            return Err(format!("Invalid parameter '{}' in '{}'", piece, function));
        }

        let annotation = match colon {
            Some(c) => {
                let text = piece[c + 1..head_end].trim();
                if text.is_empty() {
                    return Err(format!("Empty annotation for '{}' in '{}'", name, function));
                }
                Some(text.to_string())
            }
            None => None,
        };

        let default = match eq {
            Some(e) => {
                let text = piece[e + 1..].trim();
                if text.is_empty() {
                    return Err(format!("Missing default for '{}' in '{}'", name, function));
                }
                Some(text.to_string())
            }
            None => None,
        };

        params.push(ParamDescriptor {
            name: name.to_string(),
            annotation,
            default,
            kind,
        });
    }

    Ok(params)
}

/// Replace string contents and comments with spaces, keeping byte offsets
/// and newlines intact. Quote characters themselves are kept.
fn mask_source(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut rest = source;

    while let Some(c) = rest.chars().next() {
        if c == '#' {
            let end = rest.find('\n').unwrap_or(rest.len());
            blank_into(&mut out, &rest[..end]);
            rest = &rest[end..];
        } else if c == '"' || c == '\'' {
            let quote = opening_quote(rest).unwrap_or("\"");
            let body = &rest[quote.len()..];
            let (content_end, close_len) = string_extent(body, quote);

            out.push_str(quote);
            blank_into(&mut out, &body[..content_end]);
            out.push_str(&body[content_end..content_end + close_len]);
            rest = &body[content_end + close_len..];
        } else {
            out.push(c);
            rest = &rest[c.len_utf8()..];
        }
    }

    out
}

fn blank_into(out: &mut String, text: &str) {
    for c in text.chars() {
        if c == '\n' {
            out.push('\n');
        } else {
            out.extend(std::iter::repeat(' ').take(c.len_utf8()));
        }
    }
}

fn opening_quote(text: &str) -> Option<&'static str> {
    ["\"\"\"", "'''", "\"", "'"]
        .into_iter()
        .find(|q| text.starts_with(q))
}

/// Length of a string literal body and of its closing quote (0 when the
/// literal is unterminated or a single-quoted literal hits end of line)
fn string_extent(body: &str, quote: &str) -> (usize, usize) {
    let mut iter = body.char_indices();
    while let Some((i, c)) = iter.next() {
        match c {
            '\\' => {
                iter.next();
            }
            '\n' if quote.len() == 1 => return (i, 0),
            _ if body[i..].starts_with(quote) => return (i, quote.len()),
            _ => {}
        }
    }
    (body.len(), 0)
}

fn find_matching(masked: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, b) in masked.bytes().enumerate().skip(open) {
        match b {
            b'(' | b'[' | b'{' => depth += 1,
            b')' | b']' | b'}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// The `:` ending a signature; the return annotation cannot span lines
/// outside brackets
fn find_signature_colon(masked: &str, from: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, b) in masked.bytes().enumerate().skip(from) {
        match b {
            b'(' | b'[' | b'{' => depth += 1,
            b')' | b']' | b'}' => depth = depth.saturating_sub(1),
            b':' if depth == 0 => return Some(i),
            b'\n' if depth == 0 => return None,
            _ => {}
        }
    }
    None
}

fn split_top_level(masked: &str) -> Vec<(usize, usize)> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;

    for (i, b) in masked.bytes().enumerate() {
        match b {
            b'(' | b'[' | b'{' => depth += 1,
            b')' | b']' | b'}' => depth = depth.saturating_sub(1),
            b',' if depth == 0 => {
                parts.push((start, i));
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push((start, masked.len()));

    parts
}

fn find_top_level(masked: &str, needle: u8) -> Option<usize> {
    let mut depth = 0usize;
    for (i, b) in masked.bytes().enumerate() {
        match b {
            b'(' | b'[' | b'{' => depth += 1,
            b')' | b']' | b'}' => depth = depth.saturating_sub(1),
            _ if b == needle && depth == 0 => return Some(i),
            _ => {}
        }
    }
    None
}

/// First top-level `=` that is not part of a comparison operator
fn find_default_sign(masked: &str) -> Option<usize> {
    let bytes = masked.as_bytes();
    let mut depth = 0usize;
    for (i, &b) in bytes.iter().enumerate() {
        match b {
            b'(' | b'[' | b'{' => depth += 1,
            b')' | b']' | b'}' => depth = depth.saturating_sub(1),
            b'=' if depth == 0 => {
                let prev = if i > 0 { bytes[i - 1] } else { b' ' };
                let next = bytes.get(i + 1).copied().unwrap_or(b' ');
                if !matches!(prev, b'=' | b'!' | b'<' | b'>') && next != b'=' {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => chars.all(|c| c.is_alphanumeric() || c == '_'),
        _ => false,
    }
}

/// The docstring opening the body that starts after `from`, if any
fn leading_docstring(source: &str, masked: &str, from: usize) -> Option<String> {
    let start = from + masked[from..].find(|c: char| !c.is_whitespace())?;
    let text = &source[start..];
    let unprefixed = text
        .strip_prefix(|c: char| matches!(c, 'r' | 'R' | 'u' | 'U'))
        .unwrap_or(text);

    let quote = opening_quote(unprefixed)?;
    let body = &unprefixed[quote.len()..];
    let (end, _) = string_extent(body, quote);

    let doc = clean_docstring(&body[..end]);
    if doc.is_empty() {
        None
    } else {
        Some(doc)
    }
}

/// Strip the first line, remove the common indentation of the remaining
/// lines and drop surrounding blank lines
fn clean_docstring(raw: &str) -> String {
    let lines: Vec<&str> = raw.lines().collect();

    let margin = lines
        .iter()
        .skip(1)
        .filter(|l| !l.trim().is_empty())
        .map(|l| ascii_indent(l))
        .min()
        .unwrap_or(0);

    let cleaned: Vec<&str> = lines
        .iter()
        .enumerate()
        .map(|(i, l)| {
            if i == 0 {
                l.trim()
            } else if l.trim().is_empty() {
                ""
            } else {
                // margin never exceeds the line's ASCII indent, so this is a char boundary
                l.get(margin..).unwrap_or(l).trim_end()
            }
        })
        .collect();

    let first = cleaned.iter().position(|l| !l.is_empty());
    let last = cleaned.iter().rposition(|l| !l.is_empty());

    match (first, last) {
        (Some(first), Some(last)) => cleaned[first..=last].join("\n"),
        _ => String::new(),
    }
}

/// Leading spaces and tabs; other Unicode whitespace counts as text
fn ascii_indent(line: &str) -> usize {
    line.bytes().take_while(|b| matches!(b, b' ' | b'\t')).count()
}
