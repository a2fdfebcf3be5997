use crate::parse_tree::Span;

/// User-facing diagnostic classes the builder can report. Internal lowering
/// faults deliberately do not appear here; see `lower::LoweringFault`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticKind {
    UnresolvedIdentifier { name: String },
    DuplicateDeclaration { name: String },
    MalformedConstruct { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub location: Option<Span>,
}

impl Diagnostic {
    pub fn unresolved_identifier(name: &str) -> Self {
        Self {
            kind: DiagnosticKind::UnresolvedIdentifier { name: name.to_string() },
            location: None,
        }
    }

    pub fn duplicate_declaration(name: &str) -> Self {
        Self {
            kind: DiagnosticKind::DuplicateDeclaration { name: name.to_string() },
            location: None,
        }
    }

    pub fn malformed_construct(message: &str) -> Self {
        Self {
            kind: DiagnosticKind::MalformedConstruct { message: message.to_string() },
            location: None,
        }
    }

    pub fn with_location(mut self, location: Span) -> Self {
        self.location = Some(location);
        self
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let base_message = match &self.kind {
            DiagnosticKind::UnresolvedIdentifier { name } => {
                format!("Unresolved identifier '{}'", name)
            }
            DiagnosticKind::DuplicateDeclaration { name } => {
                format!("Duplicate declaration of '{}'", name)
            }
            DiagnosticKind::MalformedConstruct { message } => {
                format!("Malformed construct: {}", message)
            }
        };

        if let Some(location) = &self.location {
            write!(f, "{}..{}: {}", location.start, location.end, base_message)
        } else {
            write!(f, "{}", base_message)
        }
    }
}

/// Accumulates diagnostics across a whole build pass. The builder keeps
/// walking after a report so independent errors surface together.
#[derive(Debug, Default)]
pub struct DiagnosticSink {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn has_errors(&self) -> bool {
        !self.diagnostics.is_empty()
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }
}
