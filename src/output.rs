//! User-facing output for commands and tasks
//!
//! Progress and help go to stdout, input errors to stderr. A buffered sink
//! records both, in order, for tests and for embedding.

use std::cell::RefCell;

use serde::Serialize;

#[derive(Debug)]
enum Sink {
    Stdio,
    Buffer(RefCell<String>),
}

/// Output helper shared by every step of an invocation
#[derive(Debug)]
pub struct Output {
    sink: Sink,
}

impl Default for Output {
    fn default() -> Self {
        Self::stdio()
    }
}

impl Output {
    /// Writes to the process's stdout and stderr
    pub fn stdio() -> Self {
        Self { sink: Sink::Stdio }
    }

    /// Records everything in memory
    pub fn buffered() -> Self {
        Self {
            sink: Sink::Buffer(RefCell::new(String::new())),
        }
    }

    /// Prints a progress or informational line
    pub fn out(&self, message: impl AsRef<str>) {
        match &self.sink {
            Sink::Stdio => println!("{}", message.as_ref()),
            Sink::Buffer(buf) => push_line(buf, message.as_ref()),
        }
    }

    /// Prints a user error line
    pub fn err(&self, message: impl AsRef<str>) {
        match &self.sink {
            Sink::Stdio => eprintln!("{}", message.as_ref()),
            Sink::Buffer(buf) => push_line(buf, message.as_ref()),
        }
    }

    /// Prints structured data as pretty JSON
    pub fn data<T: Serialize>(&self, data: &T) -> serde_json::Result<()> {
        let json = serde_json::to_string_pretty(data)?;
        self.out(json);
        Ok(())
    }

    /// Everything recorded so far (empty for stdio)
    pub fn contents(&self) -> String {
        match &self.sink {
            Sink::Stdio => String::new(),
            Sink::Buffer(buf) => buf.borrow().clone(),
        }
    }

    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_string).collect()
    }
}

fn push_line(buf: &RefCell<String>, message: &str) {
    let mut buf = buf.borrow_mut();
    buf.push_str(message);
    buf.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_records_in_order() {
        let output = Output::buffered();
        output.out("task: fetch");
        output.err("please provide required parameter: <src>");
        output.out("done.");
        assert_eq!(
            output.lines(),
            ["task: fetch", "please provide required parameter: <src>", "done."]
        );
    }

    #[test]
    fn data_is_pretty_json() {
        let output = Output::buffered();
        output.data(&serde_json::json!({ "name": "build" })).unwrap();
        assert!(output.contents().contains("\"name\": \"build\""));
    }
}
