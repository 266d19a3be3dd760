//! Turning an utterance into an intent and, for calculations, an evaluation plan
//!
//! A calculation is split into clauses at "and"/commas. Within a clause, `*` and `/` bind
//! tighter than `+` and `-` and evaluation is left-associative. Parentheses group a
//! sub-expression into a single factor. Clauses whose quantities share a unit are summed
//! into one group; every group yields one total in the answer.

use super::quantity::{tokenize, unit_key, Token};
use crate::operations::{Operand, Operation, OperationRequest};
use regex::Regex;
use std::sync::OnceLock;

/// What the user asked for
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    Greeting,
    Capabilities,
    /// Not a calculation, or mathematics beyond the four operations
    OutOfScope,
    /// An operator without enough operands, or unbalanced parentheses
    Incomplete,
    /// A product or quotient across different kinds of items, or one kind taken away
    /// from another
    MixedUnits,
    /// A division whose divisor is literally zero; answered without any tool call
    DivisionByZero,
    Calculate(CalculationPlan),
}

/// Expression tree over literal and intermediate values
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Value(f64),
    Apply {
        operation: Operation,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
}

impl Expr {
    fn apply(operation: Operation, lhs: Expr, rhs: Expr) -> Self {
        Expr::Apply {
            operation,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    /// Value of a fully evaluated expression
    pub fn value(&self) -> Option<f64> {
        match self {
            Expr::Value(value) => Some(*value),
            Expr::Apply { .. } => None,
        }
    }

    fn ready_operands(&self) -> Option<(Operation, f64, f64)> {
        match self {
            Expr::Apply {
                operation,
                lhs,
                rhs,
            } => match (lhs.as_ref(), rhs.as_ref()) {
                (Expr::Value(a), Expr::Value(b)) => Some((*operation, *a, *b)),
                _ => None,
            },
            Expr::Value(_) => None,
        }
    }

    fn has_operation(&self) -> bool {
        matches!(self, Expr::Apply { .. })
    }

    fn has_zero_divisor(&self) -> bool {
        match self {
            Expr::Value(_) => false,
            Expr::Apply {
                operation,
                lhs,
                rhs,
            } => {
                (*operation == Operation::Divide && rhs.value() == Some(0.0))
                    || lhs.has_zero_divisor()
                    || rhs.has_zero_divisor()
            }
        }
    }

    /// Collect every node whose operands are both known, left to right
    fn collect_ready(&self, out: &mut Vec<(Operation, f64, f64)>) {
        if let Some(ready) = self.ready_operands() {
            out.push(ready);
        } else if let Expr::Apply { lhs, rhs, .. } = self {
            lhs.collect_ready(out);
            rhs.collect_ready(out);
        }
    }

    /// Replace ready nodes with values, in the order [`Expr::collect_ready`] reports them
    fn resolve_ready(&mut self, values: &mut impl Iterator<Item = f64>) {
        if self.ready_operands().is_some() {
            if let Some(value) = values.next() {
                *self = Expr::Value(value);
            }
        } else if let Expr::Apply { lhs, rhs, .. } = self {
            lhs.resolve_ready(values);
            rhs.resolve_ready(values);
        }
    }
}

/// All quantities of one kind, reduced to a single total
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    /// Singular unit key, `None` for bare numbers
    pub unit: Option<String>,
    pub expr: Expr,
}

/// Evaluation plan for a calculation request
#[derive(Debug, Clone, PartialEq)]
pub struct CalculationPlan {
    groups: Vec<Group>,
}

/// A final total of one group
#[derive(Debug, Clone, PartialEq)]
pub struct Total {
    pub value: f64,
    pub unit: Option<String>,
}

impl CalculationPlan {
    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    fn has_operations(&self) -> bool {
        self.groups.iter().any(|group| group.expr.has_operation())
    }

    fn has_zero_divisor(&self) -> bool {
        self.groups.iter().any(|group| group.expr.has_zero_divisor())
    }

    /// Operations whose inputs are all known. They are independent of each other and may
    /// be dispatched together.
    pub fn ready_requests(&self) -> Vec<OperationRequest> {
        let mut requests = Vec::new();

        for group in &self.groups {
            let mut ready = Vec::new();
            group.expr.collect_ready(&mut ready);

            requests.extend(ready.into_iter().map(|(operation, a, b)| {
                let operand = |value| match &group.unit {
                    Some(unit) => Operand::with_unit(value, unit.clone()),
                    None => Operand::new(value),
                };
                OperationRequest::new(operation, operand(a), operand(b))
            }));
        }

        requests
    }

    /// Feed back the results of the last [`CalculationPlan::ready_requests`] batch, in order
    pub fn apply_results(&mut self, values: &[f64]) {
        let mut values = values.iter().copied();
        for group in &mut self.groups {
            group.expr.resolve_ready(&mut values);
        }
    }

    pub fn is_complete(&self) -> bool {
        self.groups.iter().all(|group| group.expr.value().is_some())
    }

    /// Totals per group, once every operation has been evaluated
    pub fn totals(&self) -> Option<Vec<Total>> {
        self.groups
            .iter()
            .map(|group| {
                group.expr.value().map(|value| Total {
                    value,
                    unit: group.unit.clone(),
                })
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Item {
    Number(Operand),
    Operator(Operation),
    Separator,
    Open,
    Close,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum ParseIssue {
    Incomplete,
    MixedUnits,
}

/// An operand of a clause: a quantity or a parenthesised sub-expression
#[derive(Debug, Clone, PartialEq)]
struct Factor {
    expr: Expr,
    /// Singular unit key
    unit: Option<String>,
}

impl Factor {
    fn quantity(operand: &Operand) -> Self {
        Self {
            expr: Expr::Value(operand.value),
            unit: operand.unit.as_deref().map(unit_key),
        }
    }

    fn negated(self) -> Self {
        let expr = match self.expr {
            Expr::Value(value) => Expr::Value(-value),
            expr => Expr::apply(Operation::Subtract, Expr::Value(0.0), expr),
        };
        Self {
            expr,
            unit: self.unit,
        }
    }
}

/// One operand of a clause together with the operator that precedes it
type ClauseItem = (Option<Operation>, Factor);

/// Resolve imperative phrasing ("subtract 3 from 5") into infix items
fn normalize(tokens: &[Token]) -> Vec<Item> {
    let mut items = Vec::new();
    let mut i = 0;

    while i < tokens.len() {
        match &tokens[i] {
            Token::Verb(operation) => match imperative(tokens, i + 1, *operation) {
                Some((operands, next)) => {
                    for (position, operand) in operands.into_iter().enumerate() {
                        if position > 0 {
                            items.push(Item::Operator(*operation));
                        }
                        items.push(Item::Number(operand));
                    }
                    i = next;
                }
                None => i += 1,
            },
            Token::Quantity(operand) => {
                items.push(Item::Number(operand.clone()));
                i += 1;
            }
            Token::Operator(operation) => {
                items.push(Item::Operator(*operation));
                i += 1;
            }
            Token::And => {
                items.push(Item::Separator);
                i += 1;
            }
            Token::Open => {
                items.push(Item::Open);
                i += 1;
            }
            Token::Close => {
                items.push(Item::Close);
                i += 1;
            }
            Token::Word(_) | Token::Unsupported(_) => i += 1,
        }
    }

    items
}

/// Match `<verb> A <connector> B` starting after the verb. Sums and products keep
/// taking operands while they are joined by "and" or commas ("add 2, 3 and 4").
///
/// Returns the operands in evaluation order and the index after the last one.
fn imperative(
    tokens: &[Token],
    start: usize,
    operation: Operation,
) -> Option<(Vec<Operand>, usize)> {
    let skip_words = |mut index: usize| {
        while matches!(tokens.get(index), Some(Token::Word(w)) if !is_connector(w)) {
            index += 1;
        }
        index
    };

    let index = skip_words(start);
    let Some(Token::Quantity(a)) = tokens.get(index) else {
        return None;
    };

    let reversed = match tokens.get(index + 1)? {
        Token::Word(word) if word == "from" || word == "into" => true,
        Token::Word(word) if is_connector(word) => false,
        Token::And | Token::Operator(_) => false,
        _ => return None,
    };

    let index = skip_words(index + 2);
    let Some(Token::Quantity(b)) = tokens.get(index) else {
        return None;
    };

    let (a, b) = (a.clone(), b.clone());
    let variadic = matches!(operation, Operation::Add | Operation::Multiply);
    if reversed && !variadic {
        return Some((vec![b, a], index + 1));
    }

    let mut operands = vec![a, b];
    let mut next = index + 1;
    while variadic && matches!(tokens.get(next), Some(Token::And)) {
        let after = skip_words(next + 1);
        let Some(Token::Quantity(operand)) = tokens.get(after) else {
            break;
        };
        operands.push(operand.clone());
        next = after + 1;
    }

    Some((operands, next))
}

fn is_connector(word: &str) -> bool {
    matches!(word, "to" | "from" | "by" | "with" | "into")
}

/// Split normalized items into clauses of operator/operand pairs
fn clauses(items: &[Item]) -> Result<Vec<Vec<ClauseItem>>, ParseIssue> {
    let mut clauses = Vec::new();
    let mut current: Vec<ClauseItem> = Vec::new();
    let mut pending: Option<Operation> = None;
    let mut negate = false;
    let mut expect_operand = true;
    let mut i = 0;

    while i < items.len() {
        let factor = match &items[i] {
            Item::Number(operand) => {
                i += 1;
                Factor::quantity(operand)
            }
            Item::Open => {
                let close = matching_close(items, i).ok_or(ParseIssue::Incomplete)?;
                let factor = sub_expression(&items[i + 1..close])?;
                i = close + 1;
                factor
            }
            Item::Close => return Err(ParseIssue::Incomplete),
            Item::Operator(operation) => {
                if !expect_operand {
                    pending = Some(*operation);
                    expect_operand = true;
                } else if *operation == Operation::Subtract && !negate {
                    negate = true;
                } else if pending.is_some() {
                    return Err(ParseIssue::Incomplete);
                }
                i += 1;
                continue;
            }
            Item::Separator => {
                if pending.is_some() {
                    return Err(ParseIssue::Incomplete);
                }
                if !current.is_empty() {
                    clauses.push(std::mem::take(&mut current));
                }
                negate = false;
                expect_operand = true;
                i += 1;
                continue;
            }
        };

        if !expect_operand {
            // Two quantities side by side start a new clause
            clauses.push(std::mem::take(&mut current));
        }
        let factor = if negate { factor.negated() } else { factor };
        current.push((pending.take(), factor));
        negate = false;
        expect_operand = false;
    }

    if pending.is_some() {
        return Err(ParseIssue::Incomplete);
    }
    if !current.is_empty() {
        clauses.push(current);
    }

    Ok(clauses)
}

/// Index of the `)` closing the `(` at `open`
fn matching_close(items: &[Item], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (index, item) in items.iter().enumerate().skip(open) {
        match item {
            Item::Open => depth += 1,
            Item::Close => {
                depth -= 1;
                if depth == 0 {
                    return Some(index);
                }
            }
            _ => {}
        }
    }
    None
}

/// Reduce the inside of a pair of parentheses to one factor
fn sub_expression(items: &[Item]) -> Result<Factor, ParseIssue> {
    let mut inner = clauses(items)?;
    if inner.len() != 1 {
        return Err(ParseIssue::Incomplete);
    }

    let terms = terms(&inner.remove(0))?;
    let mut unit: Option<String> = None;
    for term_unit in terms.iter().filter_map(|term| term.unit.as_ref()) {
        match &unit {
            Some(existing) if existing != term_unit => return Err(ParseIssue::MixedUnits),
            Some(_) => {}
            None => unit = Some(term_unit.clone()),
        }
    }

    let mut terms = terms.into_iter();
    let first = terms
        .next()
        .map(|term| term.expr)
        .unwrap_or(Expr::Value(0.0));
    let expr = terms.fold(first, |acc, term| Expr::apply(term.sign, acc, term.expr));

    Ok(Factor { expr, unit })
}

struct Term {
    sign: Operation,
    unit: Option<String>,
    expr: Expr,
}

/// Split a clause into additive terms of multiplicative chains
fn terms(clause: &[ClauseItem]) -> Result<Vec<Term>, ParseIssue> {
    let mut chains: Vec<(Operation, Vec<ClauseItem>)> = Vec::new();

    for (operation, factor) in clause {
        match operation {
            Some(op) if op.is_multiplicative() => {
                if let Some((_, chain)) = chains.last_mut() {
                    chain.push((Some(*op), factor.clone()));
                }
            }
            Some(op) => chains.push((*op, vec![(None, factor.clone())])),
            None => chains.push((Operation::Add, vec![(None, factor.clone())])),
        }
    }

    chains
        .into_iter()
        .map(|(sign, chain)| {
            let mut units: Vec<String> = Vec::new();
            for key in chain.iter().filter_map(|(_, factor)| factor.unit.as_ref()) {
                if !units.contains(key) {
                    units.push(key.clone());
                }
            }
            if units.len() > 1 {
                return Err(ParseIssue::MixedUnits);
            }

            let mut factors = chain.into_iter();
            let first = factors
                .next()
                .map(|(_, factor)| factor.expr)
                .unwrap_or(Expr::Value(0.0));
            let expr = factors.fold(first, |acc, (op, factor)| {
                Expr::apply(op.unwrap_or(Operation::Multiply), acc, factor.expr)
            });

            Ok(Term {
                sign,
                unit: units.pop(),
                expr,
            })
        })
        .collect()
}

/// Build the per-unit groups of a calculation
fn build_plan(clauses: Vec<Vec<ClauseItem>>) -> Result<CalculationPlan, ParseIssue> {
    // (unit key, originating clause for bare numbers, signed terms)
    let mut groups: Vec<(Option<String>, Option<usize>, Vec<(Operation, Expr)>)> = Vec::new();

    for (clause_index, clause) in clauses.iter().enumerate() {
        let mut terms = terms(clause)?;

        let mut clause_units: Vec<&str> = terms.iter().filter_map(|t| t.unit.as_deref()).collect();
        clause_units.dedup();
        let sole_unit = match clause_units.as_slice() {
            [unit] => Some(unit.to_string()),
            _ => None,
        };
        // Bare numbers take the unit of the quantities they are combined with
        if let Some(unit) = sole_unit {
            for term in terms.iter_mut().filter(|term| term.unit.is_none()) {
                term.unit = Some(unit.clone());
            }
        }

        // Only a kind already on the table can be taken away
        let mut seen: Vec<&Option<String>> = Vec::new();
        for term in &terms {
            if term.sign == Operation::Subtract && !seen.contains(&&term.unit) {
                return Err(ParseIssue::MixedUnits);
            }
            seen.push(&term.unit);
        }

        for term in terms {
            let slot = match &term.unit {
                Some(_) => groups.iter_mut().find(|(unit, _, _)| *unit == term.unit),
                None => groups
                    .iter_mut()
                    .find(|(unit, clause, _)| unit.is_none() && *clause == Some(clause_index)),
            };

            match slot {
                Some((_, _, signed_terms)) => signed_terms.push((term.sign, term.expr)),
                None => {
                    let clause = term.unit.is_none().then_some(clause_index);
                    groups.push((term.unit, clause, vec![(term.sign, term.expr)]));
                }
            }
        }
    }

    let groups = groups
        .into_iter()
        .map(|(unit, _, signed_terms)| {
            let mut signed_terms = signed_terms.into_iter();
            let first = match signed_terms.next() {
                Some((Operation::Subtract, Expr::Value(value))) => Expr::Value(-value),
                Some((Operation::Subtract, expr)) => {
                    Expr::apply(Operation::Subtract, Expr::Value(0.0), expr)
                }
                Some((_, expr)) => expr,
                None => Expr::Value(0.0),
            };
            let expr = signed_terms.fold(first, |acc, (sign, term)| Expr::apply(sign, acc, term));
            Group { unit, expr }
        })
        .collect();

    Ok(CalculationPlan { groups })
}

fn greeting_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)^\W*(hi|hello|hey|hiya|howdy|greetings|yo|good\s+(morning|afternoon|evening|day))\b|\bwho\s+are\s+you\b",
        )
        .expect("greeting pattern is valid")
    })
}

fn capabilities_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)\bwhat\s+(can|do)\s+you\s+do\b|\bwhat\s+are\s+you\s+able\b|\bcapabilit|\bhow\s+can\s+you\s+help\b|\bwhat\s+can\s+i\s+ask\b|^\W*help\W*$",
        )
        .expect("capabilities pattern is valid")
    })
}

/// Classify an utterance and plan its calculation if it is one
pub fn interpret(utterance: &str) -> Intent {
    let tokens = tokenize(utterance);
    if tokens
        .iter()
        .any(|token| matches!(token, Token::Unsupported(_)))
    {
        return Intent::OutOfScope;
    }

    let has_operator = tokens
        .iter()
        .any(|token| matches!(token, Token::Operator(_) | Token::Verb(_)));

    match clauses(&normalize(&tokens)).and_then(build_plan) {
        Ok(plan) if plan.has_operations() => {
            return if plan.has_zero_divisor() {
                Intent::DivisionByZero
            } else {
                Intent::Calculate(plan)
            };
        }
        Ok(_) => {}
        Err(ParseIssue::MixedUnits) => return Intent::MixedUnits,
        Err(ParseIssue::Incomplete) if has_operator => return Intent::Incomplete,
        Err(ParseIssue::Incomplete) => {}
    }

    if greeting_regex().is_match(utterance) {
        Intent::Greeting
    } else if capabilities_regex().is_match(utterance) {
        Intent::Capabilities
    } else {
        Intent::OutOfScope
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan(utterance: &str) -> CalculationPlan {
        match interpret(utterance) {
            Intent::Calculate(plan) => plan,
            other => panic!("expected a calculation for {:?}, got {:?}", utterance, other),
        }
    }

    /// Run the plan to completion with local arithmetic, recording each batch
    fn evaluate(mut plan: CalculationPlan) -> (Vec<Vec<OperationRequest>>, Vec<Total>) {
        let mut rounds = Vec::new();
        while !plan.is_complete() {
            let batch = plan.ready_requests();
            let values: Vec<f64> = batch
                .iter()
                .map(|request| request.evaluate().value().expect("no failing operations"))
                .collect();
            plan.apply_results(&values);
            rounds.push(batch);
        }
        (rounds, plan.totals().expect("complete plan"))
    }

    fn total(value: f64, unit: Option<&str>) -> Total {
        Total {
            value,
            unit: unit.map(str::to_string),
        }
    }

    #[test]
    fn test_single_subtraction_with_units() {
        let (rounds, totals) = evaluate(plan("What is 15 apples minus 3 apples?"));

        assert_eq!(rounds.len(), 1);
        assert_eq!(
            rounds[0],
            vec![OperationRequest::new(
                Operation::Subtract,
                Operand::with_unit(15.0, "apple"),
                Operand::with_unit(3.0, "apple"),
            )]
        );
        assert_eq!(totals, vec![total(12.0, Some("apple"))]);
    }

    #[test]
    fn test_independent_clauses_are_one_batch() {
        let (rounds, totals) = evaluate(plan("What is 2 plus 2 and 1 times 3?"));

        assert_eq!(rounds.len(), 1);
        let operations: Vec<Operation> = rounds[0].iter().map(|r| r.operation).collect();
        assert_eq!(operations, vec![Operation::Add, Operation::Multiply]);
        assert_eq!(totals, vec![total(4.0, None), total(3.0, None)]);
    }

    #[test]
    fn test_same_unit_clauses_merge_and_others_stay_literal() {
        let (rounds, totals) = evaluate(plan("What is 12 apples plus one apple and a banana?"));

        assert_eq!(rounds.len(), 1);
        assert_eq!(rounds[0].len(), 1);
        assert_eq!(rounds[0][0].operation, Operation::Add);
        assert_eq!(
            totals,
            vec![total(13.0, Some("apple")), total(1.0, Some("banana"))]
        );
    }

    #[test]
    fn test_additive_and_for_same_unit() {
        let (_, totals) = evaluate(plan("what is 10 apples minus 2 apples and 3 apples"));
        assert_eq!(totals, vec![total(11.0, Some("apple"))]);
    }

    #[test]
    fn test_precedence_needs_two_rounds() {
        let (rounds, totals) = evaluate(plan("What is 2 plus 3 times 4?"));

        assert_eq!(rounds.len(), 2);
        assert_eq!(rounds[0][0].operation, Operation::Multiply);
        assert_eq!(rounds[1][0].operation, Operation::Add);
        assert_eq!(rounds[1][0].first.value, 2.0);
        assert_eq!(rounds[1][0].second.value, 12.0);
        assert_eq!(totals, vec![total(14.0, None)]);
    }

    #[test]
    fn test_left_associative_chain() {
        let (rounds, totals) = evaluate(plan("10 - 4 - 3"));
        assert_eq!(rounds.len(), 2);
        assert_eq!(totals, vec![total(3.0, None)]);

        let (_, totals) = evaluate(plan("24 / 4 / 2"));
        assert_eq!(totals, vec![total(3.0, None)]);
    }

    #[test]
    fn test_unitless_operand_adopts_clause_unit() {
        let (rounds, totals) = evaluate(plan("What is 3 apples times 2?"));
        assert_eq!(rounds[0][0].first, Operand::with_unit(3.0, "apple"));
        assert_eq!(rounds[0][0].second, Operand::with_unit(2.0, "apple"));
        assert_eq!(totals, vec![total(6.0, Some("apple"))]);
    }

    #[test]
    fn test_imperative_phrasing() {
        let (rounds, totals) = evaluate(plan("Subtract 3 apples from 5 apples"));
        assert_eq!(rounds[0][0].first.value, 5.0);
        assert_eq!(rounds[0][0].second.value, 3.0);
        assert_eq!(totals, vec![total(2.0, Some("apple"))]);

        let (_, totals) = evaluate(plan("Divide 10 by 4"));
        assert_eq!(totals, vec![total(2.5, None)]);

        let (_, totals) = evaluate(plan("add 2 and 3"));
        assert_eq!(totals, vec![total(5.0, None)]);

        let (_, totals) = evaluate(plan("what is the product of 6 and 7"));
        assert_eq!(totals, vec![total(42.0, None)]);
    }

    #[test]
    fn test_negative_operands() {
        let (rounds, totals) = evaluate(plan("what is -3 plus 5"));
        assert_eq!(rounds[0][0].first.value, -3.0);
        assert_eq!(totals, vec![total(2.0, None)]);

        let (_, totals) = evaluate(plan("5 minus negative 2"));
        assert_eq!(totals, vec![total(7.0, None)]);
    }

    #[test]
    fn test_literal_zero_divisor_is_guarded() {
        assert_eq!(interpret("What is 10 divided by 0?"), Intent::DivisionByZero);
        assert_eq!(interpret("1 plus 6 / 0"), Intent::DivisionByZero);
    }

    #[test]
    fn test_mixed_unit_products_are_declined() {
        assert_eq!(
            interpret("What is 3 apples times 2 bananas?"),
            Intent::MixedUnits
        );
    }

    #[test]
    fn test_mixed_unit_sums_keep_separate_totals() {
        let (rounds, totals) = evaluate(plan("What is 5 apples plus 2 bananas plus 1 apple?"));
        assert_eq!(rounds.len(), 1);
        assert_eq!(
            totals,
            vec![total(6.0, Some("apple")), total(2.0, Some("banana"))]
        );
    }

    #[test]
    fn test_parentheses_group_first() {
        let (rounds, totals) = evaluate(plan("(2 + 3) * 4"));
        assert_eq!(rounds.len(), 2);
        assert_eq!(rounds[0][0].operation, Operation::Add);
        assert_eq!(rounds[1][0].operation, Operation::Multiply);
        assert_eq!(rounds[1][0].first.value, 5.0);
        assert_eq!(totals, vec![total(20.0, None)]);

        let (_, totals) = evaluate(plan("What is 2 * (10 - (3 + 4))?"));
        assert_eq!(totals, vec![total(6.0, None)]);

        let (_, totals) = evaluate(plan("(2 apples + 3 apples) times 2"));
        assert_eq!(totals, vec![total(10.0, Some("apple"))]);
    }

    #[test]
    fn test_zero_divisor_from_a_subexpression_reaches_divide() {
        let mut plan = plan("5 divided by (3 minus 3)");

        let first = plan.ready_requests();
        assert_eq!(
            first,
            vec![OperationRequest::new(
                Operation::Subtract,
                Operand::new(3.0),
                Operand::new(3.0),
            )]
        );
        plan.apply_results(&[0.0]);

        let second = plan.ready_requests();
        assert_eq!(
            second,
            vec![OperationRequest::new(
                Operation::Divide,
                Operand::new(5.0),
                Operand::new(0.0),
            )]
        );
    }

    #[test]
    fn test_unbalanced_parentheses_are_incomplete() {
        assert_eq!(interpret("(2 + 3 * 4"), Intent::Incomplete);
        assert_eq!(interpret("2 + 3) * 4"), Intent::Incomplete);
        assert_eq!(interpret("2 * ()"), Intent::Incomplete);
    }

    #[test]
    fn test_sum_and_product_take_every_listed_operand() {
        let (rounds, totals) = evaluate(plan("add 2, 3 and 4"));
        assert_eq!(rounds.len(), 2);
        assert_eq!(totals, vec![total(9.0, None)]);

        let (_, totals) = evaluate(plan("What is the sum of 2, 3 and 4?"));
        assert_eq!(totals, vec![total(9.0, None)]);

        let (_, totals) = evaluate(plan("what is the product of 2, 3 and 4"));
        assert_eq!(totals, vec![total(24.0, None)]);

        let (_, totals) = evaluate(plan("Subtract 3 from 5 and 1"));
        assert_eq!(totals, vec![total(2.0, None), total(1.0, None)]);
    }

    #[test]
    fn test_unsupported_mathematics_is_out_of_scope() {
        assert_eq!(interpret("2 plus 3 squared"), Intent::OutOfScope);
        assert_eq!(interpret("10 percent of 50 plus 5"), Intent::OutOfScope);
        assert_eq!(interpret("what is 20% of 80"), Intent::OutOfScope);
        assert_eq!(interpret("square root of 9"), Intent::OutOfScope);
        assert_eq!(interpret("7 mod 3"), Intent::OutOfScope);
    }

    #[test]
    fn test_filler_words_do_not_become_units() {
        let (_, totals) = evaluate(plan("2 plus 2 today"));
        assert_eq!(totals, vec![total(4.0, None)]);
    }

    #[test]
    fn test_taking_one_kind_from_another_is_declined() {
        assert_eq!(
            interpret("What is 5 bananas minus 3 apples?"),
            Intent::MixedUnits
        );

        let (_, totals) = evaluate(plan("5 apples plus 2 bananas minus 1 apple"));
        assert_eq!(
            totals,
            vec![total(4.0, Some("apple")), total(2.0, Some("banana"))]
        );
    }

    #[test]
    fn test_same_kind_products_across_clauses() {
        let (rounds, totals) = evaluate(plan(
            "what is 2 apples plus 2 apples and 1 banana multiplied by 3 bananas?",
        ));
        assert_eq!(rounds.len(), 1);
        let operations: Vec<Operation> = rounds[0].iter().map(|r| r.operation).collect();
        assert_eq!(operations, vec![Operation::Add, Operation::Multiply]);
        assert_eq!(
            totals,
            vec![total(4.0, Some("apple")), total(3.0, Some("banana"))]
        );
    }

    #[test]
    fn test_dangling_operator_is_incomplete() {
        assert_eq!(interpret("What is 5 plus?"), Intent::Incomplete);
    }

    #[test]
    fn test_conversational_intents() {
        assert_eq!(interpret("Hello"), Intent::Greeting);
        assert_eq!(interpret("hi there!"), Intent::Greeting);
        assert_eq!(interpret("Who are you?"), Intent::Greeting);
        assert_eq!(interpret("What can you do?"), Intent::Capabilities);
        assert_eq!(interpret("help"), Intent::Capabilities);
        assert_eq!(interpret("What is the capital of France?"), Intent::OutOfScope);
        assert_eq!(interpret("I have 3 apples"), Intent::OutOfScope);
        assert_eq!(interpret(""), Intent::OutOfScope);
    }

    #[test]
    fn test_calculation_wins_over_greeting() {
        assert!(matches!(interpret("Hi! What is 2 plus 2?"), Intent::Calculate(_)));
    }
}
