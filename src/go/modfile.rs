//! go.mod parsing
//!
//! Parses the subset of the go.mod grammar needed to compare dependency sets:
//! `module`, `go`, `toolchain`, `require` and `replace` are kept; `exclude`,
//! `retract`, `godebug`, `tool` and `ignore` are validated for shape and dropped.
//!
//! Every directive may be written on one line (`require a v1.0.0`) or as a
//! parenthesised block:
//!
//! ```text
//! require (
//!     k8s.io/api v0.0.0
//!     github.com/google/uuid v1.6.0 // indirect
//! )
//! ```

use std::fmt;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ModFileError {
    #[error("{name}:{line}: {message}")]
    Syntax {
        name: String,
        line: usize,
        message: String,
    },
}

/// A `require` entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Require {
    pub path: String,
    pub version: String,
    /// Marked with a trailing `// indirect` comment
    pub indirect: bool,
}

/// A `replace` directive: `old [old_version] => new [new_version]`
///
/// `new_version` is absent when the replacement is a filesystem path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replace {
    pub old_path: String,
    pub old_version: Option<String>,
    pub new_path: String,
    pub new_version: Option<String>,
}

impl fmt::Display for Replace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.old_path)?;
        if let Some(version) = &self.old_version {
            write!(f, " {}", version)?;
        }
        write!(f, " => {}", self.new_path)?;
        if let Some(version) = &self.new_version {
            write!(f, " {}", version)?;
        }
        Ok(())
    }
}

/// Parsed go.mod
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ModFile {
    pub module: Option<String>,
    pub go: Option<String>,
    pub toolchain: Option<String>,
    pub require: Vec<Require>,
    pub replace: Vec<Replace>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Directive {
    Module,
    Go,
    Toolchain,
    Require,
    Replace,
    Exclude,
    Retract,
    Godebug,
    Tool,
    Ignore,
}

impl Directive {
    fn from_verb(verb: &str) -> Option<Self> {
        match verb {
            "module" => Some(Directive::Module),
            "go" => Some(Directive::Go),
            "toolchain" => Some(Directive::Toolchain),
            "require" => Some(Directive::Require),
            "replace" => Some(Directive::Replace),
            "exclude" => Some(Directive::Exclude),
            "retract" => Some(Directive::Retract),
            "godebug" => Some(Directive::Godebug),
            "tool" => Some(Directive::Tool),
            "ignore" => Some(Directive::Ignore),
            _ => None,
        }
    }

    /// `module`, `go` and `toolchain` only take the single-line form
    fn allows_block(self) -> bool {
        !matches!(
            self,
            Directive::Module | Directive::Go | Directive::Toolchain
        )
    }
}

/// Parse go.mod content.
///
/// `name` is only used to label errors, the same way a file name would be.
pub fn parse(name: &str, content: &str) -> Result<ModFile, ModFileError> {
    let mut parser = Parser {
        name,
        file: ModFile::default(),
    };
    let mut block: Option<(Directive, usize)> = None;

    for (index, raw_line) in content.lines().enumerate() {
        let line = index + 1;
        let (tokens, comment) = parser.tokenize(raw_line, line)?;
        if tokens.is_empty() {
            continue;
        }

        if let Some((directive, _)) = block {
            if tokens.len() == 1 && tokens[0] == ")" {
                block = None;
                continue;
            }
            parser.entry(directive, &tokens, comment, line)?;
            continue;
        }

        let verb = tokens[0].as_str();
        if verb == ")" {
            return Err(parser.error(line, "unexpected )"));
        }
        let Some(directive) = Directive::from_verb(verb) else {
            return Err(parser.error(line, format!("unknown directive: {}", verb)));
        };

        let args = &tokens[1..];
        if args.first().map(String::as_str) == Some("(") {
            if !directive.allows_block() {
                return Err(parser.error(line, format!("{} does not accept a block", verb)));
            }
            match &args[1..] {
                [] => block = Some((directive, line)),
                [close] if close == ")" => {}
                _ => return Err(parser.error(line, "unexpected tokens after (")),
            }
            continue;
        }

        parser.entry(directive, args, comment, line)?;
    }

    if let Some((_, opened)) = block {
        return Err(parser.error(opened, "unterminated block: missing )"));
    }

    Ok(parser.file)
}

struct Parser<'a> {
    name: &'a str,
    file: ModFile,
}

impl Parser<'_> {
    fn error(&self, line: usize, message: impl Into<String>) -> ModFileError {
        ModFileError::Syntax {
            name: self.name.to_string(),
            line,
            message: message.into(),
        }
    }

    /// Split a line into tokens and an optional trailing `//` comment.
    ///
    /// Quoted strings (`"..."` and `` `...` ``) become a single unquoted token.
    fn tokenize<'l>(
        &self,
        line: &'l str,
        lineno: usize,
    ) -> Result<(Vec<String>, Option<&'l str>), ModFileError> {
        let mut tokens = Vec::new();
        let mut rest = line;

        loop {
            rest = rest.trim_start();
            if rest.is_empty() {
                return Ok((tokens, None));
            }
            if let Some(comment) = rest.strip_prefix("//") {
                return Ok((tokens, Some(comment.trim())));
            }

            if let Some(quoted) = rest.strip_prefix('"') {
                let (token, remaining) = self.interpreted_string(quoted, lineno)?;
                tokens.push(token);
                rest = remaining;
            } else if let Some(raw) = rest.strip_prefix('`') {
                let Some(end) = raw.find('`') else {
                    return Err(self.error(lineno, "unterminated raw string"));
                };
                tokens.push(raw[..end].to_string());
                rest = &raw[end + 1..];
            } else if let Some(c) = rest.chars().next().filter(|&c| is_punctuation(c)) {
                tokens.push(c.to_string());
                rest = &rest[c.len_utf8()..];
            } else {
                let end = rest
                    .find(|c: char| c.is_whitespace() || c == '"' || is_punctuation(c))
                    .unwrap_or(rest.len());
                let end = rest[..end].find("//").unwrap_or(end);
                tokens.push(rest[..end].to_string());
                rest = &rest[end..];
            }
        }
    }

    fn interpreted_string<'l>(
        &self,
        input: &'l str,
        lineno: usize,
    ) -> Result<(String, &'l str), ModFileError> {
        let mut token = String::new();
        let mut chars = input.char_indices();
        while let Some((i, c)) = chars.next() {
            match c {
                '"' => return Ok((token, &input[i + 1..])),
                '\\' => match chars.next() {
                    Some((_, escaped @ ('"' | '\\'))) => token.push(escaped),
                    Some((_, 'n')) => token.push('\n'),
                    Some((_, 't')) => token.push('\t'),
                    _ => return Err(self.error(lineno, "invalid escape in quoted string")),
                },
                _ => token.push(c),
            }
        }
        Err(self.error(lineno, "unterminated quoted string"))
    }

    fn entry(
        &mut self,
        directive: Directive,
        args: &[String],
        comment: Option<&str>,
        line: usize,
    ) -> Result<(), ModFileError> {
        match directive {
            Directive::Module => {
                let [path] = args else {
                    return Err(self.error(line, "usage: module module/path"));
                };
                if self.file.module.is_some() {
                    return Err(self.error(line, "repeated module statement"));
                }
                self.file.module = Some(path.clone());
            }
            Directive::Go => {
                let [version] = args else {
                    return Err(self.error(line, "usage: go 1.23"));
                };
                if self.file.go.is_some() {
                    return Err(self.error(line, "repeated go statement"));
                }
                self.file.go = Some(version.clone());
            }
            Directive::Toolchain => {
                let [name] = args else {
                    return Err(self.error(line, "usage: toolchain go1.23.1"));
                };
                if self.file.toolchain.is_some() {
                    return Err(self.error(line, "repeated toolchain statement"));
                }
                self.file.toolchain = Some(name.clone());
            }
            Directive::Require => {
                let [path, version] = args else {
                    return Err(self.error(line, "usage: require module/path v1.2.3"));
                };
                self.file.require.push(Require {
                    path: path.clone(),
                    version: version.clone(),
                    indirect: is_indirect(comment),
                });
            }
            Directive::Replace => {
                let replace = self.replace(args, line)?;
                self.file.replace.push(replace);
            }
            Directive::Exclude => {
                if args.len() != 2 {
                    return Err(self.error(line, "usage: exclude module/path v1.2.3"));
                }
            }
            Directive::Retract => {
                if args.is_empty() {
                    return Err(self.error(line, "usage: retract version or retract [low, high]"));
                }
            }
            Directive::Godebug => {
                if args.len() != 1 || !args[0].contains('=') {
                    return Err(self.error(line, "usage: godebug key=value"));
                }
            }
            Directive::Tool | Directive::Ignore => {
                if args.len() != 1 {
                    return Err(self.error(line, "expected exactly one path"));
                }
            }
        }
        Ok(())
    }

    fn replace(&self, args: &[String], line: usize) -> Result<Replace, ModFileError> {
        let Some(arrow) = args.iter().position(|a| a == "=>") else {
            return Err(self.error(line, "replace is missing =>"));
        };
        let (old, new) = (&args[..arrow], &args[arrow + 1..]);

        let (old_path, old_version) = match old {
            [path] => (path.clone(), None),
            [path, version] => (path.clone(), Some(version.clone())),
            _ => {
                return Err(self.error(
                    line,
                    "usage: replace module/path [v1.2.3] => other/module v1.4 | ../local/directory",
                ));
            }
        };
        let (new_path, new_version) = match new {
            [path] => (path.clone(), None),
            [path, version] => (path.clone(), Some(version.clone())),
            _ => {
                return Err(self.error(
                    line,
                    "usage: replace module/path [v1.2.3] => other/module v1.4 | ../local/directory",
                ));
            }
        };

        Ok(Replace {
            old_path,
            old_version,
            new_path,
            new_version,
        })
    }
}

/// Characters that end an identifier and stand as tokens of their own
fn is_punctuation(c: char) -> bool {
    matches!(c, '(' | ')' | '[' | ']' | '{' | '}' | ',')
}

/// `// indirect` or `// indirect; other text`
fn is_indirect(comment: Option<&str>) -> bool {
    let Some(text) = comment else {
        return false;
    };
    let fields: Vec<&str> = text.split_whitespace().collect();
    match fields[..] {
        ["indirect"] => true,
        ["indirect;", _, ..] => true,
        _ => false,
    }
}
