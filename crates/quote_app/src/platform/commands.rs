/// One line typed by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserCommand {
    Generate,
    /// 0-based index of the chosen quote.
    Select(usize),
    Settings,
    SetKey(String),
    Refresh,
    Help,
    Quit,
}

pub const HELP: &str = "commands: g(enerate), <n> scroll to quote n, s(ettings), \
key <value>, q(uit)";

pub fn parse_command(line: &str) -> Result<UserCommand, String> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    match word.to_ascii_lowercase().as_str() {
        "" => Ok(UserCommand::Refresh),
        "g" | "generate" => Ok(UserCommand::Generate),
        "s" | "settings" => Ok(UserCommand::Settings),
        "h" | "help" | "?" => Ok(UserCommand::Help),
        "q" | "quit" | "exit" => Ok(UserCommand::Quit),
        "key" if !rest.is_empty() => Ok(UserCommand::SetKey(rest.to_string())),
        "key" => Err("usage: key <value>".to_string()),
        number => match number.parse::<usize>() {
            Ok(n) if n >= 1 => Ok(UserCommand::Select(n - 1)),
            _ => Err(format!("unknown command '{line}'; {HELP}")),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_command, UserCommand};

    #[test]
    fn words_and_abbreviations() {
        assert_eq!(parse_command("g"), Ok(UserCommand::Generate));
        assert_eq!(parse_command("  Generate "), Ok(UserCommand::Generate));
        assert_eq!(parse_command("s"), Ok(UserCommand::Settings));
        assert_eq!(parse_command("quit"), Ok(UserCommand::Quit));
        assert_eq!(parse_command(""), Ok(UserCommand::Refresh));
    }

    #[test]
    fn numbers_select_one_based() {
        assert_eq!(parse_command("1"), Ok(UserCommand::Select(0)));
        assert_eq!(parse_command("12"), Ok(UserCommand::Select(11)));
        assert!(parse_command("0").is_err());
        assert!(parse_command("-3").is_err());
    }

    #[test]
    fn key_requires_a_value() {
        assert_eq!(
            parse_command("key  abc-123 "),
            Ok(UserCommand::SetKey("abc-123".to_string()))
        );
        assert!(parse_command("key").is_err());
    }
}
