//! Which commands and options a requester may see

use super::HelpOptions;
use foxhelp_core::{Command, Host, OptionVariant, PermissionCache, Registry, Session};

/// Depth-first walk yielding listable commands.
///
/// Hidden commands are skipped with their subtree unless `show_hidden`.
/// Commands that do not apply to the session, and grouping nodes, are
/// transparent: their children are visited in their place.
pub fn collect_visible<'a>(
    registry: &'a Registry,
    session: &Session,
    commands: Vec<&'a Command>,
    show_hidden: bool,
) -> Vec<&'a Command> {
    let mut output = Vec::new();
    walk(registry, session, commands, show_hidden, &mut output);
    output
}

fn walk<'a>(
    registry: &'a Registry,
    session: &Session,
    commands: Vec<&'a Command>,
    show_hidden: bool,
    output: &mut Vec<&'a Command>,
) {
    for command in commands {
        if !show_hidden && command.hidden.resolve(session) {
            continue;
        }
        if command.applies_to(session) && !command.is_group() {
            output.push(command);
        } else {
            walk(registry, session, registry.children(&command.name), show_hidden, output);
        }
    }
}

/// Keep commands passing `command:<name>`, memoized in `cache`
pub async fn filter_permitted<'a>(
    host: &Host,
    session: &Session,
    commands: Vec<&'a Command>,
    cache: &mut PermissionCache,
) -> Vec<&'a Command> {
    let mut permitted = Vec::with_capacity(commands.len());
    for command in commands {
        let subject = format!("command:{}", command.name);
        if cache.test(host.permissions.as_ref(), &subject, session).await {
            permitted.push(command);
        }
    }
    permitted
}

/// Whether an option (or variant) is visible, ignoring `show_hidden`
pub fn option_visible(option: &OptionVariant, session: &Session) -> bool {
    if let Some(user) = &session.user {
        if option.authority > user.authority {
            return false;
        }
    }
    !option.hidden.resolve(session)
}

/// Options of a command to render, as `(description name, variant)` pairs.
///
/// Empty when the command hides its options or nothing is visible.
pub fn visible_options<'a>(
    command: &'a Command,
    session: &Session,
    options: &HelpOptions,
) -> Vec<(String, &'a OptionVariant)> {
    if command.hide_options && !options.show_hidden {
        return Vec::new();
    }
    let any_visible = options.show_hidden
        || command.options.iter().any(|o| option_visible(&o.config, session));
    if !any_visible {
        return Vec::new();
    }

    let shown = |variant: &OptionVariant| options.show_hidden || option_visible(variant, session);
    let mut output = Vec::new();
    for option in &command.options {
        if !option.fixed_value && shown(&option.config) {
            output.push((option.name.clone(), &option.config));
        }
        for (name, variant) in &option.variants {
            if shown(variant) {
                output.push((format!("{}.{}", option.name, name), variant));
            }
        }
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use foxhelp_core::{CommandOption, Computed, Scope};

    fn options(show_hidden: bool) -> HelpOptions {
        HelpOptions {
            show_hidden,
            page: 1,
            page_size: 10,
            feedback: false,
        }
    }

    #[test]
    fn test_grouping_nodes_are_flattened() {
        let mut registry = Registry::new();
        registry.add(Command::new("echo"));
        registry.add(Command::new("admin.ban"));
        registry.add(Command::new("admin.kick"));
        registry.add(Command::new("secret").hidden(true));
        registry.add(Command::new("secret.inner"));

        let session = Session::direct("p", "u");
        let visible = collect_visible(&registry, &session, registry.top_level(), false);
        let names: Vec<&str> = visible.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["echo", "admin.ban", "admin.kick"]);

        let all = collect_visible(&registry, &session, registry.top_level(), true);
        assert_eq!(all.len(), 4);
        assert!(all.iter().all(|c| !c.is_group()));
    }

    #[test]
    fn test_out_of_scope_commands_expose_children() {
        let mut registry = Registry::new();
        registry.add(Command::new("guild").scope(Scope::GuildOnly));
        registry.add(Command::new("guild.info"));

        let direct = Session::direct("p", "u");
        let visible = collect_visible(&registry, &direct, registry.top_level(), false);
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].name, "guild.info");
    }

    #[test]
    fn test_option_visibility_rules() {
        let session = Session::direct("p", "u").with_authority(1);
        let command = Command::new("echo")
            .option(CommandOption::parse("loud", "-l"))
            .option(CommandOption::parse("admin", "-a").authority(3))
            .option(CommandOption::parse("debug", "-d").hidden(Computed::dynamic(|s: &Session| s.authority() < 5)));

        let shown = visible_options(&command, &session, &options(false));
        let names: Vec<&str> = shown.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["loud"]);

        let all = visible_options(&command, &session, &options(true));
        assert_eq!(all.len(), 3);
    }

    #[test]
    fn test_hide_options_suppresses_everything() {
        let session = Session::direct("p", "u");
        let command = Command::new("echo")
            .hide_options(true)
            .option(CommandOption::parse("loud", "-l"))
            .option(CommandOption::parse("help", "-h, --help"));

        assert!(visible_options(&command, &session, &options(false)).is_empty());
        assert_eq!(visible_options(&command, &session, &options(true)).len(), 2);
    }

    #[test]
    fn test_variants_render_under_dotted_names() {
        let session = Session::direct("p", "u");
        let command = Command::new("echo").option(
            CommandOption::parse("style", "--style <style>")
                .variant("bold", OptionVariant { syntax: "-b".to_string(), ..Default::default() })
                .variant(
                    "secret",
                    OptionVariant {
                        syntax: "-z".to_string(),
                        hidden: Computed::Value(true),
                        ..Default::default()
                    },
                ),
        );

        let shown = visible_options(&command, &session, &options(false));
        let names: Vec<&str> = shown.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["style.bold"]);
    }
}
