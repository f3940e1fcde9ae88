use crate::lexer::Operator;
use nodepacker_core::Resource;
use regex::Regex;
use std::fmt;

/// OR of terms; true on the first satisfied term
#[derive(Debug, Clone)]
pub struct Expression {
    pub terms: Vec<Term>,
}

/// AND of leaves; false on the first failed leaf
#[derive(Debug, Clone)]
pub struct Term {
    pub leaves: Vec<Leaf>,
}

#[derive(Debug, Clone)]
pub enum Leaf {
    Comparison(Comparison),
    Group(Box<Expression>),
}

#[derive(Debug, Clone)]
pub enum Comparison {
    /// `mem` or `cpu` against whole display units
    Numeric {
        field: NumericField,
        op: NumericOp,
        /// Literal as written, in display units
        units: u64,
        /// Literal scaled to milli-units
        threshold: i64,
    },
    /// `name` against a quoted literal
    Name { op: NameOp, literal: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericField {
    Mem,
    Cpu,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Debug, Clone)]
pub enum NameOp {
    Eq,
    Ne,
    /// Unanchored regular expression search. `None` when the literal is not
    /// a valid pattern, in which case the comparison never matches.
    Match(Option<Regex>),
}

impl Expression {
    pub fn evaluate(&self, resource: &Resource) -> bool {
        self.terms.iter().any(|term| term.evaluate(resource))
    }
}

impl Term {
    pub fn evaluate(&self, resource: &Resource) -> bool {
        self.leaves.iter().all(|leaf| leaf.evaluate(resource))
    }
}

impl Leaf {
    pub fn evaluate(&self, resource: &Resource) -> bool {
        match self {
            Leaf::Comparison(comparison) => comparison.evaluate(resource),
            Leaf::Group(expression) => expression.evaluate(resource),
        }
    }
}

impl Comparison {
    pub fn evaluate(&self, resource: &Resource) -> bool {
        match self {
            Comparison::Numeric {
                field,
                op,
                threshold,
                ..
            } => op.apply(field.value(resource), *threshold),
            Comparison::Name { op, literal } => match op {
                NameOp::Eq => resource.name == *literal,
                NameOp::Ne => resource.name != *literal,
                NameOp::Match(Some(re)) => re.is_match(&resource.name),
                NameOp::Match(None) => false,
            },
        }
    }
}

impl NumericField {
    pub fn value(&self, resource: &Resource) -> i64 {
        match self {
            NumericField::Mem => resource.memory,
            NumericField::Cpu => resource.cpu,
        }
    }
}

impl NumericOp {
    pub fn apply(&self, lhs: i64, rhs: i64) -> bool {
        match self {
            NumericOp::Eq => lhs == rhs,
            NumericOp::Ne => lhs != rhs,
            NumericOp::Lt => lhs < rhs,
            NumericOp::Le => lhs <= rhs,
            NumericOp::Gt => lhs > rhs,
            NumericOp::Ge => lhs >= rhs,
        }
    }

    /// Map a lexed operator; `~=` has no numeric meaning
    pub fn from_operator(op: Operator) -> Option<Self> {
        match op {
            Operator::Eq => Some(NumericOp::Eq),
            Operator::Ne => Some(NumericOp::Ne),
            Operator::Lt => Some(NumericOp::Lt),
            Operator::Le => Some(NumericOp::Le),
            Operator::Gt => Some(NumericOp::Gt),
            Operator::Ge => Some(NumericOp::Ge),
            Operator::Match => None,
        }
    }

    fn operator(&self) -> Operator {
        match self {
            NumericOp::Eq => Operator::Eq,
            NumericOp::Ne => Operator::Ne,
            NumericOp::Lt => Operator::Lt,
            NumericOp::Le => Operator::Le,
            NumericOp::Gt => Operator::Gt,
            NumericOp::Ge => Operator::Ge,
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, term) in self.terms.iter().enumerate() {
            if i > 0 {
                f.write_str(" | ")?;
            }
            write!(f, "{}", term)?;
        }
        Ok(())
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, leaf) in self.leaves.iter().enumerate() {
            if i > 0 {
                f.write_str(" & ")?;
            }
            write!(f, "{}", leaf)?;
        }
        Ok(())
    }
}

impl fmt::Display for Leaf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Leaf::Comparison(comparison) => write!(f, "{}", comparison),
            Leaf::Group(expression) => write!(f, "({})", expression),
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Comparison::Numeric {
                field, op, units, ..
            } => {
                let field = match field {
                    NumericField::Mem => "mem",
                    NumericField::Cpu => "cpu",
                };
                write!(f, "{} {} {}", field, op.operator(), units)
            }
            Comparison::Name { op, literal } => {
                let op = match op {
                    NameOp::Eq => Operator::Eq,
                    NameOp::Ne => Operator::Ne,
                    NameOp::Match(_) => Operator::Match,
                };
                write!(f, "name {} '{}'", op, literal)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cpu(op: NumericOp, units: u64) -> Leaf {
        Leaf::Comparison(Comparison::Numeric {
            field: NumericField::Cpu,
            op,
            units,
            threshold: units as i64 * 1000,
        })
    }

    fn name(op: NameOp, literal: &str) -> Leaf {
        Leaf::Comparison(Comparison::Name {
            op,
            literal: literal.to_string(),
        })
    }

    #[test]
    fn test_numeric_operators() {
        let r = Resource::new("x", 0, 4000);
        assert!(NumericOp::Eq.apply(r.cpu, 4000));
        assert!(NumericOp::Ne.apply(r.cpu, 3000));
        assert!(NumericOp::Lt.apply(r.cpu, 4001));
        assert!(NumericOp::Le.apply(r.cpu, 4000));
        assert!(NumericOp::Gt.apply(r.cpu, 3999));
        assert!(NumericOp::Ge.apply(r.cpu, 4000));
        assert!(!NumericOp::Gt.apply(r.cpu, 4000));
    }

    #[test]
    fn test_term_and_expression() {
        let r = Resource::new("web", 1000, 2000);

        let term = Term {
            leaves: vec![cpu(NumericOp::Gt, 1), name(NameOp::Eq, "web")],
        };
        assert!(term.evaluate(&r));

        let failing = Term {
            leaves: vec![cpu(NumericOp::Gt, 1), name(NameOp::Ne, "web")],
        };
        assert!(!failing.evaluate(&r));

        let expr = Expression {
            terms: vec![failing, term],
        };
        assert!(expr.evaluate(&r));
    }

    #[test]
    fn test_invalid_regex_never_matches() {
        let leaf = name(NameOp::Match(None), "([");
        assert!(!leaf.evaluate(&Resource::new("([", 0, 0)));
    }

    #[test]
    fn test_regex_is_unanchored() {
        let re = Regex::new("standard").unwrap();
        let leaf = name(NameOp::Match(Some(re)), "standard");
        assert!(leaf.evaluate(&Resource::new("n1-standard-4", 0, 0)));
        assert!(!leaf.evaluate(&Resource::new("n1-highmem-4", 0, 0)));
    }

    #[test]
    fn test_display() {
        let expr = Expression {
            terms: vec![
                Term {
                    leaves: vec![cpu(NumericOp::Lt, 10)],
                },
                Term {
                    leaves: vec![
                        cpu(NumericOp::Ge, 100),
                        Leaf::Group(Box::new(Expression {
                            terms: vec![Term {
                                leaves: vec![name(NameOp::Match(None), "x.*")],
                            }],
                        })),
                    ],
                },
            ],
        };
        assert_eq!(expr.to_string(), "cpu < 10 | cpu >= 100 & (name ~= 'x.*')");
    }
}
