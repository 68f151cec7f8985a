//! Serde representation of command declarations.
//!
//! One declaration describes one command. Declarations are decoded
//! permissively (every field optional) and validated while being turned into
//! the schema model, so a malformed entry fails on its own instead of failing
//! the whole file.
//!
//! ```yaml
//! name: c3
//! alias: c
//! script: C3Commands
//! help: Example commands
//! subs:
//!   - name: heal
//!     func: Heal
//!     args:
//!       - name: amount
//!         type: float
//!       - name: --target
//!         alias: -t
//!         type: actor
//!         selected: true
//! ```

use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

use super::{ArgType, Argument, Command, Subcommand};
use crate::error::DeclarationError;

/// Declaration of one argument.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArgumentDecl {
    pub name: Option<String>,
    pub help: Option<String>,
    /// Written as any scalar (`default: 3`) and kept as its literal text.
    #[serde(deserialize_with = "scalar_literal")]
    pub default: Option<String>,
    pub alias: Option<String>,
    pub selected: bool,
    pub flag: bool,
    pub required: bool,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

/// Declaration of one subcommand.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubcommandDecl {
    pub name: Option<String>,
    pub help: Option<String>,
    pub alias: Option<String>,
    pub func: Option<String>,
    pub close: bool,
    pub args: Vec<ArgumentDecl>,
}

/// Declaration of one command.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandDecl {
    pub name: Option<String>,
    pub help: Option<String>,
    pub alias: Option<String>,
    pub script: Option<String>,
    pub subs: Vec<SubcommandDecl>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

fn scalar_literal<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let value = Option::<Scalar>::deserialize(deserializer)?;
    Ok(value.map(|scalar| match scalar {
        Scalar::Text(text) => text,
        Scalar::Int(n) => n.to_string(),
        Scalar::Float(f) => f.to_string(),
        Scalar::Bool(b) => b.to_string(),
    }))
}

/// Treats absent and blank strings alike.
fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl ArgumentDecl {
    /// Decodes into an [`Argument`].
    pub fn decode(&self) -> Result<Argument, DeclarationError> {
        let name = non_empty(&self.name).ok_or(DeclarationError::missing("argument", "name"))?;
        let raw_type = non_empty(&self.kind).unwrap_or_else(|| ArgType::Object.to_string());

        Ok(Argument {
            name,
            alias: non_empty(&self.alias),
            help: self.help.clone().unwrap_or_default(),
            kind: ArgType::from_declared(&raw_type),
            raw_type: raw_type.to_ascii_lowercase(),
            default: self.default.clone(),
            flag: self.flag,
            required: self.required,
            selected: self.selected,
        })
    }
}

impl SubcommandDecl {
    /// Decodes into a [`Subcommand`], building its indices.
    pub fn decode(&self) -> Result<Subcommand, DeclarationError> {
        let name =
            non_empty(&self.name).ok_or(DeclarationError::missing("subcommand", "name"))?;
        let func =
            non_empty(&self.func).ok_or(DeclarationError::missing("subcommand", "func"))?;

        let args = self
            .args
            .iter()
            .map(ArgumentDecl::decode)
            .collect::<Result<Vec<_>, _>>()?;

        if let Some(arg) = args.iter().find(|a| a.selected && a.is_positional()) {
            return Err(DeclarationError::SelectedPositional {
                subcommand: name,
                argument: arg.name.clone(),
            });
        }

        Subcommand::new(
            name,
            non_empty(&self.alias),
            self.help.clone().unwrap_or_default(),
            func,
            self.close,
            args,
        )
    }
}

impl CommandDecl {
    /// Decodes into a [`Command`].
    ///
    /// Only a missing `name` or `script` fails the command. Subcommands that
    /// fail to decode are skipped with a warning.
    pub fn decode(&self) -> Result<Command, DeclarationError> {
        let name = non_empty(&self.name).ok_or(DeclarationError::missing("command", "name"))?;
        let script =
            non_empty(&self.script).ok_or(DeclarationError::missing("command", "script"))?;

        let mut command = Command::new(
            name,
            non_empty(&self.alias),
            self.help.clone().unwrap_or_default(),
            script,
        );

        for decl in &self.subs {
            match decl.decode() {
                Ok(sub) => {
                    command.insert_sub(sub);
                }
                Err(e) => {
                    warn!(command = %command.name, error = %e, "Skipping subcommand");
                }
            }
        }

        Ok(command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn heal_decl() -> CommandDecl {
        serde_json::from_value(serde_json::json!({
            "name": "c3",
            "alias": "c",
            "script": "C3Commands",
            "subs": [{
                "name": "heal",
                "alias": "h",
                "func": "Heal",
                "close": true,
                "args": [
                    { "name": "amount", "type": "FLOAT" },
                    { "name": "--target", "alias": "-t", "type": "Actor", "selected": true },
                    { "name": "--quiet", "type": "bool", "flag": true }
                ]
            }]
        }))
        .unwrap()
    }

    #[test]
    fn test_decode_full_command() {
        let cmd = heal_decl().decode().unwrap();
        assert_eq!(cmd.name, "c3");
        assert_eq!(cmd.alias.as_deref(), Some("c"));
        assert_eq!(cmd.script, "C3Commands");

        let sub = cmd.sub("heal").unwrap();
        assert!(sub.close);
        assert_eq!(sub.func, "Heal");
        assert_eq!(sub.args().len(), 3);

        let amount = &sub.args()[0];
        assert_eq!(amount.kind, ArgType::Float);
        assert!(amount.is_positional());

        let target = sub.arg("--target").unwrap();
        assert_eq!(target.kind, ArgType::Object);
        assert_eq!(target.raw_type, "actor");
        assert_eq!(sub.flag_slot("-t"), Some(1));

        assert!(sub.arg("--quiet").unwrap().flag);
    }

    #[test]
    fn test_missing_type_defaults_to_object() {
        let arg = ArgumentDecl {
            name: Some("who".into()),
            ..Default::default()
        }
        .decode()
        .unwrap();
        assert_eq!(arg.kind, ArgType::Object);
        assert_eq!(arg.raw_type, "object");
    }

    #[test]
    fn test_command_requires_name_and_script() {
        let mut decl = heal_decl();
        decl.script = None;
        assert_eq!(
            decl.decode().unwrap_err(),
            DeclarationError::missing("command", "script")
        );

        let mut decl = heal_decl();
        decl.name = Some("   ".into());
        assert_eq!(
            decl.decode().unwrap_err(),
            DeclarationError::missing("command", "name")
        );
    }

    #[test]
    fn test_bad_subcommand_is_skipped_not_fatal() {
        let mut decl = heal_decl();
        decl.subs.push(SubcommandDecl {
            name: Some("broken".into()),
            ..Default::default()
        });
        let cmd = decl.decode().unwrap();
        assert!(cmd.sub("heal").is_some());
        assert!(cmd.sub("broken").is_none());
    }

    #[test]
    fn test_selected_positional_rejected() {
        let decl = SubcommandDecl {
            name: Some("kill".into()),
            func: Some("Kill".into()),
            args: vec![ArgumentDecl {
                name: Some("target".into()),
                selected: true,
                ..Default::default()
            }],
            ..Default::default()
        };
        assert!(matches!(
            decl.decode(),
            Err(DeclarationError::SelectedPositional { .. })
        ));
    }

    #[test]
    fn test_duplicate_argument_rejected() {
        let arg = ArgumentDecl {
            name: Some("--n".into()),
            kind: Some("int".into()),
            ..Default::default()
        };
        let decl = SubcommandDecl {
            name: Some("dup".into()),
            func: Some("Dup".into()),
            args: vec![arg.clone(), arg],
            ..Default::default()
        };
        assert_eq!(
            decl.decode().unwrap_err(),
            DeclarationError::DuplicateArgument {
                subcommand: "dup".into(),
                argument: "--n".into(),
            }
        );
    }

    #[test]
    fn test_scalar_defaults_kept_as_text() {
        let decl: ArgumentDecl = serde_json::from_value(serde_json::json!({
            "name": "--n", "type": "int", "default": 3
        }))
        .unwrap();
        assert_eq!(decl.default.as_deref(), Some("3"));

        let decl: ArgumentDecl = serde_json::from_value(serde_json::json!({
            "name": "--on", "type": "bool", "default": true
        }))
        .unwrap();
        assert_eq!(decl.default.as_deref(), Some("true"));
    }
}
