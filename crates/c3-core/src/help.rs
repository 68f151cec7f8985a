//! Help text rendering for commands and subcommands.

use std::fmt::Write;

use crate::schema::{ArgType, Argument, Command, Subcommand};

fn with_alias(name: &str, alias: Option<&str>) -> String {
    match alias {
        Some(alias) => format!("{name} ({alias})"),
        None => name.to_string(),
    }
}

/// Lists a command's subcommands.
pub fn command_help(command: &Command) -> String {
    let mut out = with_alias(&command.name, command.alias.as_deref());
    if !command.help.is_empty() {
        let _ = write!(out, " - {}", command.help);
    }

    let entries: Vec<(String, &str)> = command
        .subs()
        .iter()
        .map(|sub| (with_alias(&sub.name, sub.alias.as_deref()), sub.help.as_str()))
        .collect();
    let width = entries.iter().map(|(name, _)| name.len()).max().unwrap_or(0);

    for (name, help) in entries {
        let _ = write!(out, "\n  {name:<width$}  {help}");
    }
    out.trim_end().to_string()
}

fn usage_fragment(arg: &Argument) -> String {
    if arg.is_positional() {
        return format!("<{}>", arg.name);
    }
    let inner = if arg.flag {
        arg.name.clone()
    } else {
        format!("{} <{}>", arg.name, arg.raw_type)
    };
    if arg.required {
        inner
    } else {
        format!("[{inner}]")
    }
}

fn describe(arg: &Argument) -> String {
    let mut notes = Vec::new();
    if !arg.flag {
        notes.push(arg.raw_type.clone());
    }
    if arg.required {
        notes.push("required".to_string());
    } else if !arg.is_positional() && !arg.flag {
        let default = arg.default_value();
        if arg.kind == ArgType::String && default.is_empty() {
            notes.push("default: \"\"".to_string());
        } else {
            notes.push(format!("default: {default}"));
        }
    }
    if arg.selected {
        notes.push("selected".to_string());
    }
    notes.join(", ")
}

/// Usage line followed by one line per argument.
pub fn subcommand_help(command: &Command, sub: &Subcommand) -> String {
    let mut out = format!("usage: {} {}", command.name, sub.name);
    for arg in sub.args() {
        let _ = write!(out, " {}", usage_fragment(arg));
    }
    if !sub.help.is_empty() {
        let _ = write!(out, "\n{}", sub.help);
    }

    let entries: Vec<(String, String, &str)> = sub
        .args()
        .iter()
        .map(|arg| {
            (
                with_alias(&arg.name, arg.alias.as_deref()),
                describe(arg),
                arg.help.as_str(),
            )
        })
        .collect();
    let width = entries.iter().map(|(name, ..)| name.len()).max().unwrap_or(0);

    for (name, notes, help) in entries {
        let _ = write!(out, "\n  {name:<width$}  ({notes}) {help}");
    }
    out.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::CommandDecl;

    fn command() -> Command {
        let decl: CommandDecl = serde_json::from_value(serde_json::json!({
            "name": "c3",
            "alias": "c",
            "help": "Example commands",
            "script": "C3Commands",
            "subs": [
                {
                    "name": "heal",
                    "alias": "h",
                    "help": "Restore health",
                    "func": "Heal",
                    "args": [
                        { "name": "amount", "type": "float", "help": "How much" },
                        { "name": "--target", "alias": "-t", "type": "actor", "selected": true },
                        { "name": "--quiet", "flag": true, "type": "bool" }
                    ]
                },
                { "name": "reset", "func": "Reset" }
            ]
        }))
        .unwrap();
        decl.decode().unwrap()
    }

    #[test]
    fn test_command_help_lists_subcommands() {
        let help = command_help(&command());
        assert_eq!(
            help,
            "c3 (c) - Example commands\n  heal (h)  Restore health\n  reset"
        );
    }

    #[test]
    fn test_subcommand_help() {
        let cmd = command();
        let help = subcommand_help(&cmd, cmd.sub("heal").unwrap());
        let lines: Vec<&str> = help.lines().collect();

        assert_eq!(
            lines[0],
            "usage: c3 heal <amount> [--target <actor>] [--quiet]"
        );
        assert_eq!(lines[1], "Restore health");
        assert!(lines[2].contains("amount") && lines[2].contains("(float) How much"));
        assert!(lines[3].contains("--target (-t)") && lines[3].contains("default: none, selected"));
        assert!(lines[4].contains("--quiet") && lines[4].contains("()"));
    }
}
