//! `:` prompt command parsing
//!
//! Commands are a name followed by whitespace-separated arguments, each
//! typed by what it parses as: integer, decimal, then string.

/// One typed command argument
#[derive(Debug, Clone, PartialEq)]
pub enum CommandArg {
    Integer(i64),
    Decimal(f64),
    String(String),
}

impl CommandArg {
    fn parse(token: &str) -> CommandArg {
        if let Ok(integer) = token.parse::<i64>() {
            return CommandArg::Integer(integer);
        }
        if let Ok(decimal) = token.parse::<f64>() {
            return CommandArg::Decimal(decimal);
        }
        CommandArg::String(token.to_string())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            CommandArg::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            CommandArg::Integer(i) => Some(*i),
            _ => None,
        }
    }
}

/// A parsed `:` command
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    pub name: String,
    pub args: Vec<CommandArg>,
}

impl Command {
    /// Split an input line into a command; empty input parses to nothing
    pub fn parse(input: &str) -> Option<Command> {
        let mut tokens = input.split_whitespace();
        let name = tokens.next()?.to_string();
        let args = tokens.map(CommandArg::parse).collect();
        Some(Command { name, args })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_name_and_typed_args() {
        let command = Command::parse("rename foo.c").unwrap();
        assert_eq!(command.name, "rename");
        assert_eq!(command.args, vec![CommandArg::String("foo.c".into())]);

        let command = Command::parse("resize 80 2.5").unwrap();
        assert_eq!(
            command.args,
            vec![CommandArg::Integer(80), CommandArg::Decimal(2.5)]
        );
    }

    #[test]
    fn empty_input_is_no_command() {
        assert!(Command::parse("").is_none());
        assert!(Command::parse("   ").is_none());
    }
}
