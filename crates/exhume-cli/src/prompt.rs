//! Terminal implementation of the chooser capability.

use std::io::{self, BufRead, Write};

use colored::Colorize;
use exhume_common::{Chooser, Error, Result};

/// Numbered-menu chooser over stdin/stdout.
#[derive(Default)]
pub struct TerminalChooser;

impl TerminalChooser {
    pub fn new() -> Self {
        Self
    }

    fn read_line(&self) -> Result<String> {
        let mut line = String::new();
        let bytes = io::stdin().lock().read_line(&mut line)?;
        if bytes == 0 {
            return Err(Error::Config("interactive input closed".to_string()));
        }
        Ok(line.trim().to_string())
    }

    fn print_menu(&self, prompt: &str, options: &[String]) {
        println!("{}", prompt.bold());
        for (index, option) in options.iter().enumerate() {
            println!("  {}) {option}", (index + 1).to_string().cyan());
        }
    }
}

impl Chooser for TerminalChooser {
    fn choose(&self, prompt: &str, options: &[String]) -> Result<String> {
        loop {
            self.print_menu(prompt, options);
            print!("> ");
            io::stdout().flush()?;
            let line = self.read_line()?;
            match parse_choice(&line, options.len()) {
                Some(index) => return Ok(options[index].clone()),
                None => println!("{}", "Enter one of the listed numbers.".yellow()),
            }
        }
    }

    fn multi_choose(&self, prompt: &str, options: &[String]) -> Result<Vec<String>> {
        loop {
            self.print_menu(prompt, options);
            println!("  comma-separated numbers, `a` for all, empty for none");
            print!("> ");
            io::stdout().flush()?;
            let line = self.read_line()?;
            match parse_multi_choice(&line, options.len()) {
                Some(indices) => {
                    return Ok(indices.into_iter().map(|i| options[i].clone()).collect())
                }
                None => println!("{}", "Enter listed numbers separated by commas.".yellow()),
            }
        }
    }

    fn text_input(&self, prompt: &str, default: &str) -> Result<String> {
        if default.is_empty() {
            println!("{}", prompt.bold());
        } else {
            println!("{} [{default}]", prompt.bold());
        }
        print!("> ");
        io::stdout().flush()?;
        let line = self.read_line()?;
        Ok(if line.is_empty() {
            default.to_string()
        } else {
            line
        })
    }
}

/// 1-based menu number to 0-based index.
fn parse_choice(input: &str, len: usize) -> Option<usize> {
    let number: usize = input.trim().parse().ok()?;
    (1..=len).contains(&number).then(|| number - 1)
}

/// Comma-separated 1-based numbers; `a`/`all` selects everything, empty
/// selects nothing. Duplicates collapse, order of entry is kept.
fn parse_multi_choice(input: &str, len: usize) -> Option<Vec<usize>> {
    let input = input.trim();
    if input.is_empty() {
        return Some(Vec::new());
    }
    if input.eq_ignore_ascii_case("a") || input.eq_ignore_ascii_case("all") {
        return Some((0..len).collect());
    }
    let mut indices = Vec::new();
    for part in input.split(',') {
        let number: usize = part.trim().parse().ok()?;
        if !(1..=len).contains(&number) {
            return None;
        }
        let index = number - 1;
        if !indices.contains(&index) {
            indices.push(index);
        }
    }
    Some(indices)
}
