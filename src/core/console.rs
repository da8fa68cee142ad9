//! Line-oriented user interaction used by the REPL and the dispatcher.

use dialoguer::theme::ColorfulTheme;
use dialoguer::{Input, Password, Select};

/// Blocking console I/O. `None` from a read means end of input.
pub trait Console: Send {
    fn read_line(&mut self, prompt: &str) -> Option<String>;

    /// Read without echo; falls back to a normal read
    fn read_secret(&mut self, prompt: &str) -> Option<String> {
        self.read_line(prompt)
    }

    /// Pick one of `items`, returning its 0-based index
    fn select(&mut self, prompt: &str, items: &[String]) -> Option<usize> {
        for (i, item) in items.iter().enumerate() {
            self.say(&format!("{}. {}", i + 1, item));
        }
        let answer = self.read_line(prompt)?;
        answer
            .trim()
            .parse::<usize>()
            .ok()
            .filter(|n| (1..=items.len()).contains(n))
            .map(|n| n - 1)
    }

    fn say(&mut self, text: &str);
}

/// Interactive terminal console
#[derive(Debug, Default)]
pub struct TerminalConsole;

impl TerminalConsole {
    pub fn new() -> Self {
        Self
    }
}

impl Console for TerminalConsole {
    fn read_line(&mut self, prompt: &str) -> Option<String> {
        Input::<String>::with_theme(&ColorfulTheme::default())
            .with_prompt(prompt)
            .allow_empty(true)
            .interact_text()
            .ok()
    }

    fn read_secret(&mut self, prompt: &str) -> Option<String> {
        Password::with_theme(&ColorfulTheme::default())
            .with_prompt(prompt)
            .allow_empty_password(true)
            .interact()
            .ok()
    }

    fn select(&mut self, prompt: &str, items: &[String]) -> Option<usize> {
        Select::with_theme(&ColorfulTheme::default())
            .with_prompt(prompt)
            .items(items)
            .default(0)
            .interact_opt()
            .ok()
            .flatten()
    }

    fn say(&mut self, text: &str) {
        println!("{}", text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    struct Scripted {
        input: VecDeque<String>,
        output: Vec<String>,
    }

    impl Console for Scripted {
        fn read_line(&mut self, _prompt: &str) -> Option<String> {
            self.input.pop_front()
        }

        fn say(&mut self, text: &str) {
            self.output.push(text.to_string());
        }
    }

    #[test]
    fn test_default_select() {
        let mut console = Scripted {
            input: VecDeque::from(vec!["2".to_string(), "9".to_string()]),
            output: Vec::new(),
        };
        let items = vec!["add".to_string(), "list".to_string()];
        assert_eq!(console.select("Choose", &items), Some(1));
        assert_eq!(console.output, vec!["1. add", "2. list"]);
        assert_eq!(console.select("Choose", &items), None);
        assert_eq!(console.select("Choose", &items), None);
    }
}
