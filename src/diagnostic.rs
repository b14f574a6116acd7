// Copyright 2025 Cornell University
// released under MIT License

use std::io::Write;

use codespan_reporting::diagnostic::{
    Diagnostic as CodespanDiagnostic, Label as CodespanLabel, LabelStyle, Severity,
};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{Buffer, Color, ColorChoice, ColorSpec, WriteColor};
use rustc_hash::FxHashSet;

use crate::ir::*;

/// Track reported fragments
#[derive(Hash, Eq, PartialEq, Debug)]
pub enum ReportKey {
    FragmentKey(InteractionId, FragmentId),
}

/// Severity of diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Error,
    Warning,
}

/// A label representing a part of the source code
#[derive(Debug, Clone, PartialEq, Eq)]
struct Label {
    message: Option<String>,
    range: (usize, usize),
}

impl Label {
    fn to_codespan_label(&self, fileid: usize) -> CodespanLabel<usize> {
        CodespanLabel::new(LabelStyle::Primary, fileid, self.range.0..self.range.1)
            .with_message(self.message.clone().unwrap_or_default())
    }
}

/// Diagnostic of a particular part of the specification
struct Diagnostic {
    title: String,
    message: String,
    level: Level,
    location: Option<(usize, Label)>,
}

impl Diagnostic {
    fn emit(&self, buffer: &mut Buffer, files: &SimpleFiles<String, String>) -> std::io::Result<()> {
        if let Some((fileid, label)) = &self.location {
            let severity = match self.level {
                Level::Error => Severity::Error,
                Level::Warning => Severity::Warning,
            };

            let diagnostic = CodespanDiagnostic::new(severity)
                .with_message(&self.message)
                .with_labels(vec![label.to_codespan_label(*fileid)]);

            let config = term::Config::default();
            term::emit(buffer, &config, files, &diagnostic)
                .map_err(|e| std::io::Error::other(e.to_string()))
        } else {
            // no source location, only the title
            let color = match self.level {
                Level::Error => Color::Red,
                Level::Warning => Color::Yellow,
            };
            buffer.set_color(ColorSpec::new().set_bold(true).set_fg(Some(color)))?;
            write!(buffer, "{}", self.title)?;
            buffer.set_color(&ColorSpec::new())?;
            writeln!(buffer, ": {}", self.message)
        }
    }
}

/// Collects the warnings raised while generating CSP-M. The rendered text
/// accumulates in `error_string`.
pub struct DiagnosticHandler {
    files: SimpleFiles<String, String>,
    reported: FxHashSet<ReportKey>,
    error_string: String,
    warnings: usize,
    /// `color_choice` indicates whether to emit messages w/ ANSI colors
    color_choice: ColorChoice,
}

impl Default for DiagnosticHandler {
    /// Default `DiagnosticHandler` does not emit colored messages
    fn default() -> Self {
        Self::new(ColorChoice::Never)
    }
}

impl DiagnosticHandler {
    pub fn new(color_choice: ColorChoice) -> Self {
        Self {
            files: SimpleFiles::new(),
            reported: FxHashSet::default(),
            error_string: String::new(),
            warnings: 0,
            color_choice,
        }
    }

    fn create_buffer(&self) -> Buffer {
        if self.color_choice == ColorChoice::Never {
            Buffer::no_color()
        } else {
            Buffer::ansi()
        }
    }

    pub fn add_file(&mut self, name: String, content: String) -> usize {
        self.files.add(name, content)
    }

    pub fn error_string(&self) -> &str {
        &self.error_string
    }

    /// Number of warnings emitted so far
    pub fn warnings(&self) -> usize {
        self.warnings
    }

    fn emit(&mut self, diagnostic: Diagnostic) {
        if diagnostic.level == Level::Warning {
            self.warnings += 1;
        }
        let mut buffer = self.create_buffer();
        if diagnostic.emit(&mut buffer, &self.files).is_err() {
            // unknown file ids and the like, fall back to plain text
            self.error_string
                .push_str(&format!("{}: {}\n", diagnostic.title, diagnostic.message));
            return;
        }
        self.error_string
            .push_str(&String::from_utf8_lossy(buffer.as_slice()));
    }

    /// Reports a problem with one fragment of an interaction. Every fragment
    /// is reported at most once, however often it is rendered.
    pub fn emit_diagnostic_fragment(
        &mut self,
        interaction: InteractionId,
        it: &Interaction,
        fragment: FragmentId,
        message: &str,
        level: Level,
    ) {
        if !self
            .reported
            .insert(ReportKey::FragmentKey(interaction, fragment))
        {
            return;
        }
        let location = it.get_fragment_loc(fragment).map(|(start, end, fileid)| {
            let label = Label {
                message: Some(message.to_string()),
                range: (start, end),
            };
            (fileid, label)
        });
        self.emit(Diagnostic {
            title: format!("{:?} in interaction {}", level, it.name),
            message: message.to_string(),
            level,
            location,
        });
    }

    /// Reports a problem that has no source location
    pub fn emit_diagnostic(&mut self, title: &str, message: &str, level: Level) {
        self.emit(Diagnostic {
            title: title.to_string(),
            message: message.to_string(),
            level,
            location: None,
        });
    }
}
