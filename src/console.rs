use std::{
    fmt::Display,
    io::{self, BufRead, Write},
};

use prettytable::Table;

/// Line-oriented prompt over any reader/writer pair.
///
/// End of input surfaces as [`io::ErrorKind::UnexpectedEof`].
pub struct Console<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Console { input, output }
    }

    pub fn say(&mut self, line: impl Display) -> io::Result<()> {
        writeln!(self.output, "{}", line)
    }

    /// Prints `prompt` and returns the next line, trimmed.
    pub fn ask(&mut self, prompt: &str) -> io::Result<String> {
        write!(self.output, "{}", prompt)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "input closed"));
        }

        Ok(line.trim().to_owned())
    }

    /// True only for `y`/`Y`.
    pub fn confirm(&mut self, prompt: &str) -> io::Result<bool> {
        Ok(self.ask(prompt)?.eq_ignore_ascii_case("y"))
    }

    pub fn table(&mut self, table: &Table) -> io::Result<()> {
        table.print(&mut self.output)?;
        writeln!(self.output)
    }

    pub fn into_output(self) -> W {
        self.output
    }
}
