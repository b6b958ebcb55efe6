//! Line-based prompts on stdin.

use std::io::{self, BufRead, IsTerminal, Write};

pub fn is_interactive() -> bool {
    io::stdin().is_terminal()
}

/// Prints `prompt` and returns the trimmed reply; `None` on EOF.
pub fn ask(prompt: &str) -> io::Result<Option<String>> {
    let mut stdout = io::stdout();
    write!(stdout, "{}", prompt)?;
    stdout.flush()?;

    let mut line = String::new();
    if io::stdin().lock().read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

/// Asks for a 1-based choice in `1..=count`. Blank or `q` cancels.
pub fn choose(prompt: &str, count: usize) -> io::Result<Option<usize>> {
    loop {
        let Some(reply) = ask(prompt)? else {
            return Ok(None);
        };
        if reply.is_empty() || reply.eq_ignore_ascii_case("q") {
            return Ok(None);
        }
        match parse_choice(&reply, count) {
            Some(index) => return Ok(Some(index)),
            None => eprintln!("Enter a number between 1 and {}", count),
        }
    }
}

/// Zero-based index for a 1-based reply.
pub fn parse_choice(reply: &str, count: usize) -> Option<usize> {
    reply
        .trim()
        .parse::<usize>()
        .ok()
        .filter(|choice| (1..=count).contains(choice))
        .map(|choice| choice - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_choices_in_range() {
        assert_eq!(parse_choice("1", 3), Some(0));
        assert_eq!(parse_choice(" 3 ", 3), Some(2));
        assert_eq!(parse_choice("0", 3), None);
        assert_eq!(parse_choice("4", 3), None);
        assert_eq!(parse_choice("two", 3), None);
    }
}
