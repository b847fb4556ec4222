//! Command line parsing against the registry

use crate::command::Command;
use crate::locale::Localizer;
use crate::registry::Registry;
use std::collections::HashMap;
use tracing::debug;

/// Value bound to a parsed option
#[derive(Debug, Clone, PartialEq)]
pub enum OptionValue {
    Flag,
    Text(String),
}

impl OptionValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            OptionValue::Flag => None,
            OptionValue::Text(text) => Some(text),
        }
    }
}

/// A parsed invocation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Argv {
    /// Resolved command name
    pub command: String,
    pub args: Vec<String>,
    pub options: HashMap<String, OptionValue>,
}

impl Argv {
    pub fn new(command: &str) -> Self {
        Self {
            command: command.to_string(),
            ..Default::default()
        }
    }

    pub fn arg(mut self, arg: &str) -> Self {
        self.args.push(arg.to_string());
        self
    }

    pub fn flag(mut self, name: &str) -> Self {
        self.options.insert(name.to_string(), OptionValue::Flag);
        self
    }

    pub fn value(mut self, name: &str, value: &str) -> Self {
        self.options.insert(name.to_string(), OptionValue::Text(value.to_string()));
        self
    }

    pub fn has(&self, option: &str) -> bool {
        self.options.contains_key(option)
    }

    /// Option value parsed as a number, if present and numeric
    pub fn number(&self, option: &str) -> Option<i64> {
        self.options.get(option)?.as_text()?.trim().parse().ok()
    }

    /// Parse a message such as `/admin ban -r spam alice`.
    ///
    /// A prefix is required when `prefixes` is non-empty. The longest run of
    /// leading words naming a command selects it; flags are bound to that
    /// command's options and everything else is positional.
    pub fn parse(registry: &Registry, text: &str, prefixes: &[String]) -> Option<Argv> {
        let text = text.trim();
        let body = if prefixes.is_empty() {
            text
        } else {
            let prefix = prefixes
                .iter()
                .filter(|p| text.starts_with(p.as_str()))
                .max_by_key(|p| p.len())?;
            &text[prefix.len()..]
        };

        let tokens = tokenize(body);
        let mut command = None;
        let mut consumed = 0;
        for end in 1..=tokens.len() {
            if tokens[end - 1].starts_with('-') {
                break;
            }
            match registry.resolve(&tokens[..end].join(" ")) {
                Some(found) => {
                    command = Some(found);
                    consumed = end;
                }
                None => break,
            }
        }
        let command = command?;

        Some(Self::bind(command, &tokens[consumed..]))
    }

    /// Parse a message that starts with a localized shortcut of a command,
    /// e.g. `help echo` for `foxhelp echo`.
    ///
    /// Only commands with an i18n shortcut declared in the registry take
    /// part. The shortcut text must match the leading words exactly
    /// (ignoring case); fuzzy shortcuts accept trailing arguments and flags.
    /// A configured prefix is accepted but not required.
    pub fn parse_shortcut(
        registry: &Registry,
        localizer: &dyn Localizer,
        locales: &[String],
        text: &str,
        prefixes: &[String],
    ) -> Option<Argv> {
        let text = text.trim();
        let body = prefixes
            .iter()
            .filter(|p| !p.is_empty() && text.starts_with(p.as_str()))
            .max_by_key(|p| p.len())
            .map(|p| &text[p.len()..])
            .unwrap_or(text);

        let tokens = tokenize(body);
        if tokens.is_empty() {
            return None;
        }

        for command in registry.all() {
            let Some(shortcut) = registry.get_shortcut(&command.name) else {
                continue;
            };
            if !shortcut.i18n {
                continue;
            }

            let pattern = format!("commands.{}.shortcuts.(variant)", command.name);
            for end in (1..=tokens.len()).rev() {
                if end < tokens.len() && !shortcut.fuzzy {
                    continue;
                }
                let head = tokens[..end].join(" ");
                let exact = localizer
                    .find(locales, &pattern, &head)
                    .into_iter()
                    .any(|found| found.similarity >= 1.0);
                if exact {
                    debug!("Shortcut {:?} invokes {}", head, command.name);
                    return Some(Self::bind(command, &tokens[end..]));
                }
            }
        }
        None
    }

    /// Bind flags declared by `command`; everything else is positional
    fn bind(command: &Command, tokens: &[String]) -> Argv {
        let mut argv = Argv::new(&command.name);
        let mut rest = tokens.iter();
        while let Some(token) = rest.next() {
            let option = token
                .starts_with('-')
                .then(|| command.options.iter().find(|o| o.accepts(token)))
                .flatten();
            match option {
                Some(option) if option.takes_value() => match rest.next() {
                    Some(value) => {
                        argv.options.insert(option.name.clone(), OptionValue::Text(value.clone()));
                    }
                    None => {
                        argv.options.insert(option.name.clone(), OptionValue::Flag);
                    }
                },
                Some(option) => {
                    argv.options.insert(option.name.clone(), OptionValue::Flag);
                }
                None => argv.args.push(token.clone()),
            }
        }

        argv
    }
}

/// Split on whitespace, keeping double-quoted runs together
fn tokenize(input: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut has_token = false;

    for c in input.chars() {
        match c {
            '"' => {
                quoted = !quoted;
                has_token = true;
            }
            c if c.is_whitespace() && !quoted => {
                if has_token {
                    tokens.push(std::mem::take(&mut current));
                    has_token = false;
                }
            }
            c => {
                current.push(c);
                has_token = true;
            }
        }
    }
    if has_token {
        tokens.push(current);
    }
    tokens
}
