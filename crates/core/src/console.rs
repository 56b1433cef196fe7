//! Line-oriented console prompter

use std::io::{self, BufRead, Write};

use crate::backends::interactive::{Decision, Prompter};
use crate::codec::FormatError;
use crate::error::Result;
use crate::marshal::{OutputRow, ParameterTable};

const COLUMN_WIDTH: usize = 24;

/// Render the input rows as a two-column table, or nothing when there are none.
pub fn render_inputs(table: &ParameterTable) -> String {
    if table.in_args.is_empty() {
        return String::new();
    }
    let rule = "-".repeat(COLUMN_WIDTH);
    let mut out = format!("{:<COLUMN_WIDTH$} Value\n{rule} {rule}\n", "Name");
    for row in &table.in_args {
        out.push_str(&format!("{:<COLUMN_WIDTH$} {}\n", row.name, row.text));
    }
    out
}

/// Help text followed by the rendered inputs.
pub fn compose_help(help: &str, table: &ParameterTable) -> String {
    let inputs = render_inputs(table);
    if inputs.is_empty() {
        help.to_string()
    } else {
        format!("{help}\n\n{inputs}")
    }
}

pub struct ConsolePrompter {
    input: Box<dyn BufRead + Send>,
    output: Box<dyn Write + Send>,
}

impl ConsolePrompter {
    pub fn new(input: impl BufRead + Send + 'static, output: impl Write + Send + 'static) -> Self {
        Self {
            input: Box::new(input),
            output: Box::new(output),
        }
    }

    pub fn stdio() -> Self {
        Self::new(io::BufReader::new(io::stdin()), io::stdout())
    }

    fn read_answer(&mut self, prompt: &str) -> Result<String> {
        write!(self.output, "{prompt}> ")?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "input closed while waiting for an answer",
            )
            .into());
        }
        let trimmed = line.strip_suffix('\n').unwrap_or(&line);
        Ok(trimmed.strip_suffix('\r').unwrap_or(trimmed).to_string())
    }
}

impl Prompter for ConsolePrompter {
    fn show_call(&mut self, help: &str, table: &ParameterTable) -> Result<()> {
        writeln!(self.output, "{}", compose_help(help, table))?;
        Ok(())
    }

    fn decide(&mut self, allow_failure: bool) -> Result<Decision> {
        let (prompt, choices) = if allow_failure {
            ("Continue? [Y]es/[N]o/[A]bort", "Y, N or A")
        } else {
            ("Continue? [Y]es/[A]bort", "Y or A")
        };
        loop {
            let answer = self.read_answer(prompt)?;
            match answer.trim().to_ascii_lowercase().as_str() {
                "y" | "yes" => return Ok(Decision::Continue),
                "n" | "no" if allow_failure => return Ok(Decision::Fail),
                "a" | "abort" => return Ok(Decision::Abort),
                _ => writeln!(self.output, "Please answer {choices}.")?,
            }
        }
    }

    fn ask(&mut self, row: &OutputRow) -> Result<String> {
        let mut prompt = format!("{} ({})", row.name, row.ty.underlying());
        if let Some(default) = &row.default {
            prompt.push_str(&format!(" [{default}]"));
        }
        let answer = self.read_answer(&prompt)?;
        match &row.default {
            Some(default) if answer.is_empty() => Ok(default.clone()),
            _ => Ok(answer),
        }
    }

    fn reject(&mut self, _row: &OutputRow, error: &FormatError) -> Result<()> {
        writeln!(self.output, "Invalid value: {error}")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marshal;
    use crate::types::{MethodSignature, ParameterDescriptor, TypeDescriptor, Value};
    use std::io::Cursor;
    use std::sync::{Arc, Mutex};

    /// Writer whose contents stay readable after the prompter takes it.
    #[derive(Clone, Default)]
    struct Transcript(Arc<Mutex<Vec<u8>>>);

    impl Write for Transcript {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Transcript {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    fn prompter(answers: &str) -> (ConsolePrompter, Transcript) {
        let transcript = Transcript::default();
        let prompter = ConsolePrompter::new(Cursor::new(answers.to_string()), transcript.clone());
        (prompter, transcript)
    }

    #[test]
    fn test_render_inputs() {
        let sig = MethodSignature::new("Negotiate")
            .input("clientVersion", TypeDescriptor::String)
            .input("dialect", TypeDescriptor::U16);
        let table = marshal::build(&sig, &[Value::from("1.0"), Value::Null]).unwrap();

        insta::assert_snapshot!(render_inputs(&table), @r"
        Name                     Value
        ------------------------ ------------------------
        clientVersion            1.0
        dialect                  <null>
        ");
    }

    #[test]
    fn test_help_without_inputs_is_unchanged() {
        let table = marshal::build(&MethodSignature::new("Reboot"), &[]).unwrap();
        assert_eq!(compose_help("Reboot the SUT.", &table), "Reboot the SUT.");
    }

    #[test]
    fn test_decide_repeats_until_valid() {
        let (mut prompter, transcript) = prompter("maybe\nn\na\n");

        assert_eq!(prompter.decide(false).unwrap(), Decision::Abort);
        let text = transcript.text();
        assert!(text.contains("Continue? [Y]es/[A]bort> "));
        assert_eq!(text.matches("Please answer Y or A.").count(), 2);
    }

    #[test]
    fn test_ask_applies_default() {
        let sig = MethodSignature::new("Connect")
            .param(ParameterDescriptor::output("port", TypeDescriptor::U16).with_default("445"));
        let table = marshal::build(&sig, &[]).unwrap();
        let (mut prompter, transcript) = prompter("\r\n 80\n");

        assert_eq!(prompter.ask(&table.out_args[0]).unwrap(), "445");
        assert_eq!(prompter.ask(&table.out_args[0]).unwrap(), " 80");
        assert!(transcript.text().starts_with("port (u16) [445]> "));
    }

    #[test]
    fn test_end_of_input() {
        let (mut prompter, _) = prompter("");
        let err = prompter.decide(true).unwrap_err();
        assert!(err.to_string().contains("input closed"));
    }
}
