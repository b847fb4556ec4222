//! Resolving a help target to a command

use super::RenderContext;
use foxhelp_core::{Command, Params, PermissionCache, Session, SuggestPrompt};
use tracing::debug;

const SHORTCUT_PATTERN: &str = "commands.(name).shortcuts.(variant)";

/// A shortcut that may refer to the requested command
#[derive(Debug, Clone)]
pub struct Candidate<'a> {
    /// Name the shortcut was declared under
    pub name: String,
    pub similarity: f64,
    pub command: &'a Command,
}

/// Outcome of [`find_command`]
#[derive(Debug)]
pub enum Resolution<'a> {
    Command(&'a Command),
    /// Possibly empty set of inexact candidates
    Candidates(Vec<Candidate<'a>>),
}

impl<'a> Resolution<'a> {
    /// Every command this resolution may end up at
    pub fn commands(&self) -> Vec<&'a Command> {
        match self {
            Resolution::Command(command) => vec![*command],
            Resolution::Candidates(candidates) => candidates.iter().map(|c| c.command).collect(),
        }
    }
}

/// Direct lookup, then localized shortcuts
pub fn find_command<'a>(ctx: &RenderContext<'a>, target: &str, session: &Session) -> Resolution<'a> {
    let host = ctx.host;
    let registry = &host.registry;
    if let Some(command) = registry.resolve(target) {
        if command.applies_to(session) {
            return Resolution::Command(command);
        }
    }

    let candidates: Vec<Candidate<'a>> = host
        .localizer
        .find(&session.locales, SHORTCUT_PATTERN, target)
        .into_iter()
        .filter_map(|found| {
            let name = found.get("name")?.to_string();
            let command = registry.resolve(&name)?;
            command.applies_to(session).then_some(Candidate {
                name,
                similarity: found.similarity,
                command,
            })
        })
        .collect();

    if let Some(perfect) = candidates.iter().find(|c| c.similarity == 1.0) {
        debug!("Shortcut {:?} resolved to {}", target, perfect.command.name);
        return Resolution::Command(perfect.command);
    }

    debug!("Target {:?} has {} shortcut candidates", target, candidates.len());
    Resolution::Candidates(candidates)
}

/// Resolve a target, asking the user to pick when it is ambiguous
pub async fn infer_command<'a>(ctx: &RenderContext<'a>, target: &str, session: &Session) -> Option<&'a Command> {
    let candidates = match find_command(ctx, target, session) {
        Resolution::Command(command) => return Some(command),
        Resolution::Candidates(candidates) => candidates,
    };

    let host = ctx.host;
    let mut expect: Vec<String> = host
        .registry
        .available(session)
        .into_iter()
        .filter(|name| !name.is_empty() && host.localizer.compare(name, target))
        .collect();
    for candidate in &candidates {
        if !expect.contains(&candidate.name) {
            expect.push(candidate.name.clone());
        }
    }

    let mut cache = PermissionCache::new();
    let mut permitted = Vec::with_capacity(expect.len());
    for name in expect {
        let Some(command) = host.registry.resolve(&name) else {
            continue;
        };
        let subject = format!("command:{}", command.name);
        if cache.test(host.permissions.as_ref(), &subject, session).await {
            permitted.push(name);
        }
    }

    let prompt = SuggestPrompt {
        expect: permitted,
        prefix: ctx.message(session, "not-found", &Params::new()),
        suffix: ctx.text_or_empty(session, &["internal.suggest-command"], &Params::new()),
    };
    let chosen = host.suggester.suggest(session, prompt).await?;
    host.registry.resolve(&chosen)
}
