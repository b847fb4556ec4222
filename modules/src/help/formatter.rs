//! Assembling help text

use super::paginator::format_commands;
use super::visibility::visible_options;
use super::{observe_fields, HelpOptions, RenderContext};
use foxhelp_core::{Command, Params, Session, Usage};

/// Wrap content in a section template; `{content}` and `{time}` are substituted
pub fn apply_formatter(template: Option<&str>, content: &str) -> String {
    match template {
        Some(template) if !template.is_empty() => {
            let time = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
            template.replace("{content}", content).replace("{time}", &time)
        }
        _ => content.to_string(),
    }
}

/// Escape text for the message element markup
pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            c => escaped.push(c),
        }
    }
    escaped
}

/// Image element for a URL
pub fn image(url: &str) -> String {
    format!("<img src=\"{}\"/>", escape(url))
}

fn join_sections(sections: Vec<String>) -> String {
    sections
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// The top-level listing
pub async fn global_help(ctx: &RenderContext<'_>, session: &Session, options: &HelpOptions) -> String {
    let host = ctx.host;
    let config = ctx.config;
    let prefix = host.display_prefix();
    let invocation = format!("{}foxhelp", prefix);

    let mut output = format_commands(
        ctx,
        "global-prolog",
        session,
        host.registry.top_level(),
        options,
        &invocation,
    )
    .await;

    if let Some(url) = &config.custom_image {
        output.insert(0, image(url));
    }

    let stats = ctx.statistics_text(session);
    if !stats.is_empty() {
        output.push(stats);
    }

    output.push(ctx.message(session, "global-epilog", &Params::positional([prefix])));

    if let Some(group) = &config.invite_group {
        output.push(ctx.message(session, "invite-group", &Params::positional([group])));
    }

    if let Some(suffix) = &config.image_suffix {
        output.push(suffix.clone());
    }

    if config.feedback {
        output.push(ctx.message(session, "feedback-prompt", &Params::new()));
    }

    join_sections(output)
}

/// The detail view of one command
pub async fn show_help(ctx: &RenderContext<'_>, command: &Command, session: &mut Session, options: &HelpOptions) -> String {
    let formatters = &ctx.config.formatters;
    let host = ctx.host;

    let title = if command.declaration.is_empty() {
        command.display_path()
    } else {
        format!("{} {}", command.display_path(), command.declaration)
    };
    let title_text = ctx.message(session, "command-title", &Params::positional([title]));
    let mut output = vec![apply_formatter(formatters.title.as_deref(), &title_text)];

    let description_key = format!("commands.{}.description", command.name);
    let description = ctx.text_or_empty(session, &[&description_key], &command.params);
    if !description.is_empty() {
        output.push(apply_formatter(formatters.description.as_deref(), &description));
    }

    observe_fields(host, session, &[command]).await;
    let session = &*session;

    if command.aliases.len() > 1 {
        let comma = ctx.text_or_empty(session, &["general.comma"], &Params::new());
        let aliases = command.aliases[1..].join(&comma);
        let text = ctx.message(session, "command-aliases", &Params::positional([aliases]));
        output.push(apply_formatter(formatters.aliases.as_deref(), &text));
    }

    ctx.events.emit_command(&mut output, command, session);

    let usage = match &command.usage {
        Some(Usage::Text(text)) => text.clone(),
        Some(Usage::Dynamic(usage)) => usage.usage(session).await,
        None => {
            let key = format!("commands.{}.usage", command.name);
            ctx.text_or_empty(session, &[&key], &command.params)
        }
    };
    if !usage.is_empty() {
        output.push(apply_formatter(formatters.usage.as_deref(), &usage));
    }

    let option_lines = format_options(ctx, command, session, options);
    if !option_lines.is_empty() {
        output.push(apply_formatter(formatters.options.as_deref(), &option_lines.join("\n")));
    }

    if !command.examples.is_empty() {
        let mut lines = vec![ctx.message(session, "command-examples", &Params::new())];
        lines.extend(command.examples.iter().map(|example| format!("    {}", example)));
        output.push(apply_formatter(formatters.examples.as_deref(), &lines.join("\n")));
    } else {
        let key = format!("commands.{}.examples", command.name);
        let text = ctx.text_or_empty(session, &[&key], &command.params);
        if !text.is_empty() {
            let lines: Vec<String> = text.split('\n').map(|line| format!("    {}", line)).collect();
            output.push(apply_formatter(formatters.examples.as_deref(), &lines.join("\n")));
        }
    }

    let invocation = format!("{}foxhelp {}", host.display_prefix(), command.display_path());
    let subcommands = format_commands(
        ctx,
        "subcommand-prolog",
        session,
        host.registry.children(&command.name),
        options,
        &invocation,
    )
    .await;
    if !subcommands.is_empty() {
        output.push(apply_formatter(formatters.subcommands.as_deref(), &subcommands.join("\n")));
    }

    if let Some(footer) = formatters.footer.as_deref() {
        output.push(apply_formatter(Some(footer), ""));
    }

    join_sections(output)
}

fn format_options(ctx: &RenderContext<'_>, command: &Command, session: &Session, options: &HelpOptions) -> Vec<String> {
    let visible = visible_options(command, session, options);
    if visible.is_empty() {
        return Vec::new();
    }

    let mut output = vec![ctx.message(session, "available-options", &Params::new())];
    for (name, variant) in visible {
        let default_key = format!("commands.{}.options.{}", command.name, name);
        let keys: Vec<&str> = match &variant.desc_path {
            Some(path) => vec![path.as_str()],
            None => vec![default_key.as_str()],
        };

        let mut line = escape(&variant.syntax);
        let description = ctx.text_or_empty(session, &keys, &variant.params);
        if !description.is_empty() {
            line.push_str("  ");
            line.push_str(&description);
        }
        let line = ctx.events.chain_option(line, variant, command, session);
        output.push(format!("    {}", line));
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_formatter() {
        assert_eq!(apply_formatter(None, "body"), "body");
        assert_eq!(apply_formatter(Some(""), "body"), "body");
        assert_eq!(apply_formatter(Some("[{content}]"), "body"), "[body]");
        let stamped = apply_formatter(Some("{content} @ {time}"), "body");
        assert!(stamped.starts_with("body @ "));
        assert!(!stamped.contains("{time}"));
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape("-p <page:number>"), "-p &lt;page:number&gt;");
        assert_eq!(escape("a & \"b\""), "a &amp; &quot;b&quot;");
        assert_eq!(image("https://x/a.png?s=1&t=2"), "<img src=\"https://x/a.png?s=1&amp;t=2\"/>");
    }

    #[test]
    fn test_join_drops_empty_sections() {
        let joined = join_sections(vec!["a".to_string(), String::new(), "b".to_string()]);
        assert_eq!(joined, "a\nb");
    }
}
