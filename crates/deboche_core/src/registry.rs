//! Explicit command registry.
//!
//! Each command is described once (name, description, typed options) and paired
//! with a handler. The registry is built at startup and then only read: the chat
//! adapter iterates it to register slash commands and looks handlers up by name
//! for both slash and prefix-text invocations.

use std::collections::HashMap;

use crate::id::UserId;
use crate::{CoreError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    String,
    Integer,
    Boolean,
    User,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub kind: OptionKind,
    pub required: bool,
}

impl OptionSpec {
    fn new(name: &'static str, description: &'static str, kind: OptionKind) -> Self {
        Self {
            name,
            description,
            kind,
            required: false,
        }
    }

    pub fn string(name: &'static str, description: &'static str) -> Self {
        Self::new(name, description, OptionKind::String)
    }

    pub fn integer(name: &'static str, description: &'static str) -> Self {
        Self::new(name, description, OptionKind::Integer)
    }

    pub fn boolean(name: &'static str, description: &'static str) -> Self {
        Self::new(name, description, OptionKind::Boolean)
    }

    pub fn user(name: &'static str, description: &'static str) -> Self {
        Self::new(name, description, OptionKind::User)
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub category: &'static str,
    pub options: Vec<OptionSpec>,
    /// Also reachable as `<prefix>name`
    pub text_enabled: bool,
}

impl CommandDescriptor {
    pub fn new(name: &'static str, description: &'static str) -> Self {
        Self {
            name,
            description,
            category: "Geral",
            options: Vec::new(),
            text_enabled: true,
        }
    }

    pub fn category(mut self, category: &'static str) -> Self {
        self.category = category;
        self
    }

    pub fn option(mut self, option: OptionSpec) -> Self {
        self.options.push(option);
        self
    }

    pub fn slash_only(mut self) -> Self {
        self.text_enabled = false;
        self
    }

    /// `nome <obrigatório> [opcional]`
    pub fn usage(&self) -> String {
        let mut usage = self.name.to_string();
        for option in &self.options {
            if option.required {
                usage.push_str(&format!(" <{}>", option.name));
            } else {
                usage.push_str(&format!(" [{}]", option.name));
            }
        }
        usage
    }
}

pub struct RegisteredCommand<H> {
    pub descriptor: CommandDescriptor,
    pub handler: H,
}

/// Name to `(descriptor, handler)`, kept in registration order
pub struct CommandRegistry<H> {
    commands: Vec<RegisteredCommand<H>>,
    by_name: HashMap<&'static str, usize>,
}

impl<H> CommandRegistry<H> {
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
            by_name: HashMap::new(),
        }
    }

    pub fn register(&mut self, descriptor: CommandDescriptor, handler: H) -> Result<()> {
        if self.by_name.contains_key(descriptor.name) {
            return Err(CoreError::DuplicateCommand {
                name: descriptor.name.to_string(),
            });
        }
        self.by_name.insert(descriptor.name, self.commands.len());
        self.commands.push(RegisteredCommand {
            descriptor,
            handler,
        });
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&RegisteredCommand<H>> {
        self.by_name.get(name).map(|i| &self.commands[*i])
    }

    /// Like `get`, but an unknown name is an error listing what exists
    pub fn resolve(&self, name: &str) -> Result<&RegisteredCommand<H>> {
        self.get(name).ok_or_else(|| CoreError::UnknownCommand {
            name: name.to_string(),
            available: self.names().into_iter().map(String::from).collect(),
        })
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.commands.iter().map(|c| c.descriptor.name).collect()
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &CommandDescriptor> {
        self.commands.iter().map(|c| &c.descriptor)
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl<H> Default for CommandRegistry<H> {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgValue {
    String(String),
    Integer(i64),
    Boolean(bool),
    User(UserId),
}

/// Typed option values keyed by option name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandArgs {
    values: HashMap<String, ArgValue>,
}

impl CommandArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: ArgValue) {
        self.values.insert(name.into(), value);
    }

    pub fn with(mut self, name: impl Into<String>, value: ArgValue) -> Self {
        self.insert(name, value);
        self
    }

    pub fn str(&self, name: &str) -> Option<&str> {
        match self.values.get(name) {
            Some(ArgValue::String(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn integer(&self, name: &str) -> Option<i64> {
        match self.values.get(name) {
            Some(ArgValue::Integer(i)) => Some(*i),
            _ => None,
        }
    }

    pub fn boolean(&self, name: &str) -> Option<bool> {
        match self.values.get(name) {
            Some(ArgValue::Boolean(b)) => Some(*b),
            _ => None,
        }
    }

    pub fn user(&self, name: &str) -> Option<UserId> {
        match self.values.get(name) {
            Some(ArgValue::User(u)) => Some(*u),
            _ => None,
        }
    }

    pub fn require_str(&self, command: &str, name: &str) -> Result<&str> {
        self.str(name)
            .ok_or_else(|| CoreError::invalid_argument(command, name, "em falta"))
    }

    pub fn require_integer(&self, command: &str, name: &str) -> Result<i64> {
        self.integer(name)
            .ok_or_else(|| CoreError::invalid_argument(command, name, "em falta"))
    }

    pub fn require_user(&self, command: &str, name: &str) -> Result<UserId> {
        self.user(name)
            .ok_or_else(|| CoreError::invalid_argument(command, name, "em falta"))
    }

    /// Parse the text after `<prefix>command` against the descriptor's options.
    ///
    /// Options are positional. Double quotes group words. A trailing string
    /// option takes the rest of the line. Surplus words are ignored.
    pub fn parse_text(descriptor: &CommandDescriptor, input: &str) -> Result<Self> {
        let mut args = Self::new();
        let mut words = Words::new(input);
        let last = descriptor.options.len().saturating_sub(1);

        for (i, option) in descriptor.options.iter().enumerate() {
            let word = if i == last && option.kind == OptionKind::String {
                words.rest()
            } else {
                words.next_word()
            };

            let Some(word) = word else {
                if option.required {
                    return Err(CoreError::invalid_argument(
                        descriptor.name,
                        option.name,
                        format!("em falta (uso: {})", descriptor.usage()),
                    ));
                }
                continue;
            };

            let value = parse_value(descriptor.name, option, &word)?;
            args.insert(option.name, value);
        }

        Ok(args)
    }
}

fn parse_value(command: &str, option: &OptionSpec, word: &str) -> Result<ArgValue> {
    match option.kind {
        OptionKind::String => Ok(ArgValue::String(word.to_string())),
        OptionKind::Integer => word
            .parse::<i64>()
            .map(ArgValue::Integer)
            .map_err(|_| {
                CoreError::invalid_argument(command, option.name, "tem de ser um número")
            }),
        OptionKind::Boolean => parse_bool(word)
            .map(ArgValue::Boolean)
            .ok_or_else(|| CoreError::invalid_argument(command, option.name, "usa sim ou não")),
        OptionKind::User => UserId::parse_mention(word)
            .map(ArgValue::User)
            .ok_or_else(|| {
                CoreError::invalid_argument(command, option.name, "menciona um utilizador")
            }),
    }
}

fn parse_bool(word: &str) -> Option<bool> {
    match word.to_lowercase().as_str() {
        "true" | "sim" | "s" | "yes" | "y" | "1" | "on" => Some(true),
        "false" | "não" | "nao" | "n" | "no" | "0" | "off" => Some(false),
        _ => None,
    }
}

/// Cursor over a command line
struct Words<'a> {
    rest: &'a str,
}

impl<'a> Words<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            rest: input.trim(),
        }
    }

    fn next_word(&mut self) -> Option<String> {
        let input = self.rest.trim_start();
        if input.is_empty() {
            self.rest = input;
            return None;
        }

        if let Some(quoted) = input.strip_prefix('"') {
            if let Some(end) = quoted.find('"') {
                self.rest = &quoted[end + 1..];
                return Some(quoted[..end].to_string());
            }
        }

        let end = input.find(char::is_whitespace).unwrap_or(input.len());
        self.rest = &input[end..];
        Some(input[..end].to_string())
    }

    fn rest(&mut self) -> Option<String> {
        let input = self.rest.trim();
        self.rest = "";
        if input.is_empty() {
            return None;
        }
        let unquoted = input
            .strip_prefix('"')
            .and_then(|s| s.strip_suffix('"'))
            .unwrap_or(input);
        Some(unquoted.to_string())
    }
}
