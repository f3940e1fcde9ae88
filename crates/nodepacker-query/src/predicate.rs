use crate::ast::Expression;
use crate::parser::parse;
use crate::{FilterError, Result};
use nodepacker_core::{Resource, ResourceFilter};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// A compiled filter.
///
/// Empty input compiles to [`Predicate::Always`], so commands given no filter
/// list every record.
#[derive(Debug, Clone, Default)]
pub enum Predicate {
    #[default]
    Always,
    Expression(Expression),
}

impl Predicate {
    /// Compile a single filter string
    pub fn parse(source: &str) -> Result<Self> {
        if source.trim().is_empty() {
            return Ok(Predicate::Always);
        }

        let expression = parse(source)?;
        debug!("Compiled filter: {}", expression);
        Ok(Predicate::Expression(expression))
    }

    /// Evaluate against a record
    pub fn pass(&self, resource: &Resource) -> bool {
        match self {
            Predicate::Always => true,
            Predicate::Expression(expression) => expression.evaluate(resource),
        }
    }

    pub fn is_always(&self) -> bool {
        matches!(self, Predicate::Always)
    }
}

impl ResourceFilter for Predicate {
    fn pass(&self, resource: &Resource) -> bool {
        Predicate::pass(self, resource)
    }
}

impl FromStr for Predicate {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self> {
        Predicate::parse(s)
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Always => f.write_str("<all>"),
            Predicate::Expression(expression) => write!(f, "{}", expression),
        }
    }
}

/// Compile filter arguments as given on a command line.
///
/// The arguments are joined with single spaces before parsing, so
/// `["cpu", ">", "4"]` and `["cpu > 4"]` compile to the same predicate.
pub fn compile<S: AsRef<str>>(args: &[S]) -> Result<Predicate> {
    let joined = args
        .iter()
        .map(|a| a.as_ref())
        .collect::<Vec<_>>()
        .join(" ");
    Predicate::parse(&joined)
}
