//! Solver independent description of a mixed-integer linear program.
//!
//! A [`Model`] is assembled once through a [`ModelBuilder`] and is read-only
//! afterwards. Variables are referred to by [`VarId`] handles which are only
//! meaningful for the builder that issued them.
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

use indexmap::IndexMap;

use crate::error::ModelError;

/// Handle to a column of a [`Model`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarId(usize);

impl VarId {
    /// Position of the variable in the model's variable list
    pub fn index(self) -> usize {
        self.0
    }
}

/// Domain of a decision variable
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Domain {
    /// Real valued, bounded below by zero and optionally above
    Continuous { upper: Option<f64> },
    /// Zero or one
    Binary,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariableDef {
    pub name: String,
    pub domain: Domain,
}

/// A linear expression `Σ coefficient·variable + constant`.
///
/// Terms on the same variable are merged, and insertion order is kept so a
/// constraint prints the way it was written.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinearExpr {
    terms: IndexMap<VarId, f64>,
    constant: f64,
}

impl LinearExpr {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn constant(value: f64) -> Self {
        Self {
            terms: IndexMap::new(),
            constant: value,
        }
    }

    /// Add `coefficient·var` to the expression
    pub fn add_term(&mut self, var: VarId, coefficient: f64) {
        *self.terms.entry(var).or_insert(0.0) += coefficient;
    }

    /// Builder style variant of [`LinearExpr::add_term`]
    pub fn with_term(mut self, var: VarId, coefficient: f64) -> Self {
        self.add_term(var, coefficient);
        self
    }

    pub fn terms(&self) -> impl Iterator<Item = (VarId, f64)> + '_ {
        self.terms.iter().map(|(&var, &coefficient)| (var, coefficient))
    }

    pub fn constant_term(&self) -> f64 {
        self.constant
    }

    pub fn coefficient(&self, var: VarId) -> f64 {
        self.terms.get(&var).copied().unwrap_or(0.0)
    }

    /// Evaluate the expression for an assignment indexed by [`VarId::index`]
    pub fn evaluate(&self, values: &[f64]) -> f64 {
        self.terms
            .iter()
            .map(|(var, coefficient)| coefficient * values[var.0])
            .sum::<f64>()
            + self.constant
    }

    fn is_finite(&self) -> bool {
        self.constant.is_finite() && self.terms.values().all(|c| c.is_finite())
    }
}

impl From<VarId> for LinearExpr {
    fn from(var: VarId) -> Self {
        LinearExpr::new().with_term(var, 1.0)
    }
}

impl<T: Into<LinearExpr>> AddAssign<T> for LinearExpr {
    fn add_assign(&mut self, rhs: T) {
        let rhs = rhs.into();
        for (var, coefficient) in rhs.terms {
            self.add_term(var, coefficient);
        }
        self.constant += rhs.constant;
    }
}

impl<T: Into<LinearExpr>> SubAssign<T> for LinearExpr {
    fn sub_assign(&mut self, rhs: T) {
        let rhs: LinearExpr = rhs.into();
        *self += -rhs;
    }
}

impl<T: Into<LinearExpr>> Add<T> for LinearExpr {
    type Output = LinearExpr;

    fn add(mut self, rhs: T) -> LinearExpr {
        self += rhs;
        self
    }
}

impl<T: Into<LinearExpr>> Sub<T> for LinearExpr {
    type Output = LinearExpr;

    fn sub(mut self, rhs: T) -> LinearExpr {
        self -= rhs;
        self
    }
}

impl Neg for LinearExpr {
    type Output = LinearExpr;

    fn neg(mut self) -> LinearExpr {
        self.terms.values_mut().for_each(|c| *c = -*c);
        self.constant = -self.constant;
        self
    }
}

impl Mul<f64> for LinearExpr {
    type Output = LinearExpr;

    fn mul(mut self, factor: f64) -> LinearExpr {
        self.terms.values_mut().for_each(|c| *c *= factor);
        self.constant *= factor;
        self
    }
}

impl Mul<VarId> for f64 {
    type Output = LinearExpr;

    fn mul(self, var: VarId) -> LinearExpr {
        LinearExpr::new().with_term(var, self)
    }
}

impl<T: Into<LinearExpr>> std::iter::Sum<T> for LinearExpr {
    fn sum<I: Iterator<Item = T>>(iter: I) -> Self {
        iter.fold(LinearExpr::new(), |acc, item| acc + item)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    LessEq,
    Eq,
    GreaterEq,
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Relation::LessEq => write!(f, "<="),
            Relation::Eq => write!(f, "=="),
            Relation::GreaterEq => write!(f, ">="),
        }
    }
}

/// A named row `expr (<=|==|>=) rhs`. The constant of the expression is
/// folded into `rhs` when the constraint is created.
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    pub name: String,
    pub expr: LinearExpr,
    pub relation: Relation,
    pub rhs: f64,
}

impl Constraint {
    /// Left hand side minus right hand side at the given assignment
    pub fn slack(&self, values: &[f64]) -> f64 {
        self.expr.evaluate(values) - self.rhs
    }

    /// Whether the row holds at the given assignment, up to `tolerance`
    pub fn is_satisfied(&self, values: &[f64], tolerance: f64) -> bool {
        let slack = self.slack(values);
        match self.relation {
            Relation::LessEq => slack <= tolerance,
            Relation::Eq => slack.abs() <= tolerance,
            Relation::GreaterEq => slack >= -tolerance,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Minimise,
    Maximise,
}

/// A row that does not hold at some assignment
#[derive(Debug, Clone, PartialEq)]
pub struct Violation {
    pub constraint: String,
    pub slack: f64,
}

/// A complete mixed-integer linear program
#[derive(Debug, Clone)]
pub struct Model {
    variables: Vec<VariableDef>,
    constraints: Vec<Constraint>,
    objective: LinearExpr,
    direction: Direction,
}

impl Model {
    pub fn variables(&self) -> &[VariableDef] {
        &self.variables
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn objective(&self) -> &LinearExpr {
        &self.objective
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn num_binaries(&self) -> usize {
        self.variables
            .iter()
            .filter(|v| v.domain == Domain::Binary)
            .count()
    }

    /// Look up a constraint by name
    pub fn constraint(&self, name: &str) -> Option<&Constraint> {
        self.constraints.iter().find(|c| c.name == name)
    }

    /// List every bound or row that does not hold at `values`.
    ///
    /// Binary variables must be within `tolerance` of 0 or 1.
    pub fn violations(&self, values: &[f64], tolerance: f64) -> Vec<Violation> {
        let mut violations = Vec::new();
        if values.len() != self.variables.len() {
            violations.push(Violation {
                constraint: format!(
                    "assignment has {} values for {} variables",
                    values.len(),
                    self.variables.len()
                ),
                slack: f64::NAN,
            });
            return violations;
        }

        for (def, &value) in self.variables.iter().zip(values) {
            let out_of_bounds = match def.domain {
                Domain::Continuous { upper } => {
                    value < -tolerance || upper.is_some_and(|ub| value > ub + tolerance)
                }
                Domain::Binary => value.abs() > tolerance && (value - 1.0).abs() > tolerance,
            };
            if out_of_bounds || !value.is_finite() {
                violations.push(Violation {
                    constraint: format!("bounds[{}]", def.name),
                    slack: value,
                });
            }
        }

        violations.extend(
            self.constraints
                .iter()
                .filter(|c| !c.is_satisfied(values, tolerance))
                .map(|c| Violation {
                    constraint: c.name.clone(),
                    slack: c.slack(values),
                }),
        );
        violations
    }
}

/// Incrementally declares the variables and rows of a [`Model`]
#[derive(Debug, Default)]
pub struct ModelBuilder {
    variables: Vec<VariableDef>,
    constraints: Vec<Constraint>,
}

impl ModelBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a continuous variable in `[0, upper]` (`upper = None` for no bound)
    pub fn add_continuous(
        &mut self,
        name: impl Into<String>,
        upper: Option<f64>,
    ) -> Result<VarId, ModelError> {
        let name = name.into();
        if upper.is_some_and(|ub| !ub.is_finite() || ub < 0.0) {
            return Err(ModelError::NonFiniteCoefficient(format!(
                "upper bound of {name}"
            )));
        }
        Ok(self.push_variable(name, Domain::Continuous { upper }))
    }

    pub fn add_binary(&mut self, name: impl Into<String>) -> VarId {
        self.push_variable(name.into(), Domain::Binary)
    }

    fn push_variable(&mut self, name: String, domain: Domain) -> VarId {
        let id = VarId(self.variables.len());
        self.variables.push(VariableDef { name, domain });
        id
    }

    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    /// Add the row `expr (relation) rhs`.
    ///
    /// Fails if the expression uses a handle from another builder or carries a
    /// non-finite coefficient.
    pub fn add_constraint(
        &mut self,
        name: impl Into<String>,
        expr: impl Into<LinearExpr>,
        relation: Relation,
        rhs: f64,
    ) -> Result<(), ModelError> {
        let name = name.into();
        let mut expr = expr.into();
        self.check_expr(&expr, &name)?;
        if !rhs.is_finite() {
            return Err(ModelError::NonFiniteCoefficient(name));
        }

        let rhs = rhs - expr.constant;
        expr.constant = 0.0;
        self.constraints.push(Constraint {
            name,
            expr,
            relation,
            rhs,
        });
        Ok(())
    }

    fn check_expr(&self, expr: &LinearExpr, context: &str) -> Result<(), ModelError> {
        if let Some((var, _)) = expr.terms().find(|(var, _)| var.0 >= self.variables.len()) {
            return Err(ModelError::UnknownVariable(var.0));
        }
        if !expr.is_finite() {
            return Err(ModelError::NonFiniteCoefficient(context.to_string()));
        }
        Ok(())
    }

    /// Finish the model with the given objective
    pub fn build(self, direction: Direction, objective: LinearExpr) -> Result<Model, ModelError> {
        self.check_expr(&objective, "objective")?;
        Ok(Model {
            variables: self.variables,
            constraints: self.constraints,
            objective,
            direction,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expression_merges_terms_and_folds_constant() {
        let mut builder = ModelBuilder::new();
        let x = builder.add_continuous("x", None).unwrap();
        let y = builder.add_continuous("y", Some(5.0)).unwrap();

        let expr = LinearExpr::from(x) + 2.0 * y - 0.5 * x + LinearExpr::constant(3.0);
        assert_eq!(expr.coefficient(x), 0.5);
        assert_eq!(expr.coefficient(y), 2.0);

        builder
            .add_constraint("row", expr, Relation::LessEq, 10.0)
            .unwrap();
        let model = builder
            .build(Direction::Minimise, LinearExpr::from(x))
            .unwrap();
        let row = model.constraint("row").unwrap();
        assert_eq!(row.rhs, 7.0);
        assert_eq!(row.expr.constant_term(), 0.0);
        assert!(row.is_satisfied(&[2.0, 3.0], 1e-9));
        assert!(!row.is_satisfied(&[2.0, 3.5], 1e-9));
    }

    #[test]
    fn test_foreign_variable_is_rejected() {
        let mut other = ModelBuilder::new();
        other.add_binary("a");
        let foreign = other.add_binary("b");

        let mut builder = ModelBuilder::new();
        builder.add_binary("only");
        let result = builder.add_constraint("bad", foreign, Relation::Eq, 0.0);
        assert_eq!(result, Err(ModelError::UnknownVariable(1)));
    }

    #[test]
    fn test_non_finite_coefficient_is_rejected() {
        let mut builder = ModelBuilder::new();
        let x = builder.add_continuous("x", None).unwrap();
        let result = builder.add_constraint("nan", f64::NAN * x, Relation::Eq, 0.0);
        assert!(matches!(result, Err(ModelError::NonFiniteCoefficient(_))));
        assert!(builder.add_continuous("y", Some(f64::INFINITY)).is_err());
    }

    #[test]
    fn test_violations_reports_bounds_and_rows() {
        let mut builder = ModelBuilder::new();
        let x = builder.add_continuous("x", Some(1.0)).unwrap();
        let on = builder.add_binary("on");
        builder
            .add_constraint(
                "x_gated",
                LinearExpr::from(x) - 1.0 * on,
                Relation::LessEq,
                0.0,
            )
            .unwrap();
        let model = builder
            .build(Direction::Minimise, LinearExpr::new())
            .unwrap();

        assert!(model.violations(&[0.5, 1.0], 1e-9).is_empty());

        let names: Vec<String> = model
            .violations(&[0.5, 0.0], 1e-9)
            .into_iter()
            .map(|v| v.constraint)
            .collect();
        assert_eq!(names, vec!["x_gated".to_string()]);

        let names: Vec<String> = model
            .violations(&[2.0, 0.5], 1e-9)
            .into_iter()
            .map(|v| v.constraint)
            .collect();
        assert_eq!(names, vec!["bounds[x]", "bounds[on]", "x_gated"]);
    }
}
