//! Review gate backed by an external classifier program.
//!
//! The program receives the review text on stdin. Exit status zero marks the
//! review genuine; any other status marks it machine-generated.

use std::io::{self, Write};
use std::process::{Command, Stdio};

use log::warn;
use savour_core::{ReviewGate, ReviewVerdict};

/// Runs one classifier process per review.
#[derive(Debug, Clone)]
pub(crate) struct CommandGate {
    program: String,
}

impl CommandGate {
    pub(crate) fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn accepts(&self, text: &str) -> io::Result<bool> {
        let mut child = Command::new(&self.program)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .spawn()?;
        if let Some(mut stdin) = child.stdin.take() {
            match stdin.write_all(text.as_bytes()) {
                // The classifier may decide before reading everything.
                Err(err) if err.kind() == io::ErrorKind::BrokenPipe => {}
                other => other?,
            }
        }
        Ok(child.wait()?.success())
    }
}

impl ReviewGate for CommandGate {
    fn classify(&self, text: &str) -> ReviewVerdict {
        match self.accepts(text) {
            Ok(true) => ReviewVerdict::Genuine,
            Ok(false) => ReviewVerdict::MachineGenerated,
            Err(err) => {
                warn!("review gate `{}` failed, refusing review: {err}", self.program);
                ReviewVerdict::MachineGenerated
            }
        }
    }
}
