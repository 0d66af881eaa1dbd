//! Formula Abstract Syntax Tree types

use crate::evaluator::FormulaValue;
use crate::functions::registry;
use std::fmt;

/// Formula expression AST
#[derive(Debug, Clone, PartialEq)]
pub enum FormulaExpr {
    /// Number, string or boolean literal
    Literal(FormulaValue),

    /// Reference to a field by display name
    FieldRef(String),

    /// Unary operation
    UnaryOp {
        op: UnaryOperator,
        operand: Box<FormulaExpr>,
    },

    /// Binary operation
    BinaryOp {
        op: BinaryOperator,
        left: Box<FormulaExpr>,
        right: Box<FormulaExpr>,
    },

    /// Function call (name is uppercase)
    Call { name: String, args: Vec<FormulaExpr> },
}

impl FormulaExpr {
    /// Visit every field reference in the tree, left to right
    pub fn for_each_field_ref<'a>(&'a self, f: &mut impl FnMut(&'a str)) {
        match self {
            FormulaExpr::Literal(_) => {}
            FormulaExpr::FieldRef(name) => f(name),
            FormulaExpr::UnaryOp { operand, .. } => operand.for_each_field_ref(f),
            FormulaExpr::BinaryOp { left, right, .. } => {
                left.for_each_field_ref(f);
                right.for_each_field_ref(f);
            }
            FormulaExpr::Call { args, .. } => {
                for arg in args {
                    arg.for_each_field_ref(f);
                }
            }
        }
    }

    /// Check if the tree calls a volatile function anywhere
    pub fn is_volatile(&self) -> bool {
        match self {
            FormulaExpr::Literal(_) | FormulaExpr::FieldRef(_) => false,
            FormulaExpr::UnaryOp { operand, .. } => operand.is_volatile(),
            FormulaExpr::BinaryOp { left, right, .. } => left.is_volatile() || right.is_volatile(),
            FormulaExpr::Call { name, args } => {
                registry().get(name).map_or(false, |f| f.volatile)
                    || args.iter().any(FormulaExpr::is_volatile)
            }
        }
    }
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    // Arithmetic
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Power,

    // Comparison
    Equal,
    NotEqual,
    LessThan,
    LessEqual,
    GreaterThan,
    GreaterEqual,

    // Text
    Concat,
}

impl BinaryOperator {
    /// Source symbol
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Modulo => "%",
            BinaryOperator::Power => "^",
            BinaryOperator::Equal => "=",
            BinaryOperator::NotEqual => "!=",
            BinaryOperator::LessThan => "<",
            BinaryOperator::LessEqual => "<=",
            BinaryOperator::GreaterThan => ">",
            BinaryOperator::GreaterEqual => ">=",
            BinaryOperator::Concat => "&",
        }
    }
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Negate,
}

#[cfg(test)]
mod tests {
    use crate::parser::parse_formula;

    #[test]
    fn test_field_refs_in_source_order() {
        let ast = parse_formula("IF({B} > 1, -{A}, {B} & {C})").unwrap();
        let mut names = Vec::new();
        ast.for_each_field_ref(&mut |name| names.push(name));
        assert_eq!(names, vec!["B", "A", "B", "C"]);
    }

    #[test]
    fn test_volatile_calls() {
        assert!(parse_formula("DATEDIF({Start}, TODAY(), \"d\")").unwrap().is_volatile());
        assert!(parse_formula("-(NOW() - 1)").unwrap().is_volatile());
        assert!(!parse_formula("YEAR({Start}) + 1").unwrap().is_volatile());
    }
}
