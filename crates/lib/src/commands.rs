//! Slash-command descriptors pushed to the platform on registration.

use serde::Serialize;

/// Option type code for a string parameter.
pub const OPTION_TYPE_STRING: u8 = 3;

/// Declarative command descriptor: `{name, description, options}`.
/// Registration is idempotent; the same descriptor is safe to push on every
/// handshake.
#[derive(Debug, Clone, Serialize)]
pub struct CommandSpec {
    pub name: String,
    pub description: String,
    pub options: Vec<CommandOption>,
}

/// One command parameter.
#[derive(Debug, Clone, Serialize)]
pub struct CommandOption {
    #[serde(rename = "type")]
    pub kind: u8,
    pub name: String,
    pub description: String,
    pub required: bool,
}

/// The single supported command: one optional free-text `message` option.
pub fn ask_command(name: &str) -> CommandSpec {
    CommandSpec {
        name: name.to_string(),
        description: "Input what you want to know!".to_string(),
        options: vec![CommandOption {
            kind: OPTION_TYPE_STRING,
            name: "message".to_string(),
            description: "what do you want to know?".to_string(),
            required: false,
        }],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ask_command_has_one_optional_string_option() {
        let spec = ask_command("ask");
        assert_eq!(spec.name, "ask");
        assert_eq!(spec.options.len(), 1);
        let opt = &spec.options[0];
        assert_eq!(opt.name, "message");
        assert_eq!(opt.kind, OPTION_TYPE_STRING);
        assert!(!opt.required);
    }

    #[test]
    fn descriptor_serializes_option_type_as_type() {
        let v = serde_json::to_value(ask_command("ask")).unwrap();
        assert_eq!(v["options"][0]["type"].as_u64(), Some(3));
        assert_eq!(v["options"][0]["required"].as_bool(), Some(false));
    }
}
