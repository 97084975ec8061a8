//! Statement execution.

use std::rc::Rc;

use super::Interpreter;
use crate::ast::{Statement, VariableDeclaration, VariableKind};
use crate::error::{Error, Result};
use crate::runtime::{Function, Scope, ScopeRef, Value, scope};

/// How a statement finished.
#[derive(Debug)]
pub(super) enum Completion {
    Normal,
    Return(Value),
    Break,
    Continue,
}

/// Declares every `var` in `body` (outside nested functions) as undefined
/// in `scope`, unless already bound there.
pub(super) fn hoist_vars(body: &[Statement], scope: &ScopeRef) {
    let mut names = Vec::new();
    collect_var_names(body, &mut names);
    let mut frame = scope.borrow_mut();
    for name in names {
        if !frame.has_own(&name) {
            frame.declare(name, Value::Undefined, true);
        }
    }
}

/// Binds the function declarations directly in `body` so they can be
/// called before the statement that declares them.
pub(super) fn hoist_functions(body: &[Statement], scope: &ScopeRef) {
    for statement in body {
        if let Statement::FunctionDeclaration(literal) = statement {
            let function = Function::script(Rc::clone(literal), Rc::clone(scope));
            let name = literal.name.clone().unwrap_or_default();
            scope
                .borrow_mut()
                .declare(name, Value::Function(Rc::new(function)), true);
        }
    }
}

fn collect_var_names(body: &[Statement], names: &mut Vec<String>) {
    for statement in body {
        collect_statement_vars(statement, names);
    }
}

fn collect_statement_vars(statement: &Statement, names: &mut Vec<String>) {
    match statement {
        Statement::VariableDeclaration(decl) if decl.kind == VariableKind::Var => {
            names.extend(decl.declarations.iter().map(|d| d.name.clone()));
        }
        Statement::Block(body) => collect_var_names(body, names),
        Statement::If(stmt) => {
            collect_statement_vars(&stmt.consequent, names);
            if let Some(alternate) = &stmt.alternate {
                collect_statement_vars(alternate, names);
            }
        }
        Statement::While(stmt) => collect_statement_vars(&stmt.body, names),
        Statement::For(stmt) => {
            if let Some(init) = &stmt.init {
                collect_statement_vars(init, names);
            }
            collect_statement_vars(&stmt.body, names);
        }
        Statement::Try(stmt) => {
            collect_var_names(&stmt.block, names);
            if let Some(handler) = &stmt.handler {
                collect_var_names(&handler.body, names);
            }
            if let Some(finalizer) = &stmt.finalizer {
                collect_var_names(finalizer, names);
            }
        }
        _ => {}
    }
}

impl Interpreter {
    /// Executes statements in order, stopping at the first abrupt completion.
    pub(super) fn execute_all(&self, body: &[Statement], scope: &ScopeRef) -> Result<Completion> {
        for statement in body {
            match self.execute(statement, scope)? {
                Completion::Normal => {}
                abrupt => return Ok(abrupt),
            }
        }
        Ok(Completion::Normal)
    }

    /// Executes a block body in a fresh nested scope.
    fn execute_block(&self, body: &[Statement], scope: &ScopeRef) -> Result<Completion> {
        let block_scope = Scope::child(scope);
        hoist_functions(body, &block_scope);
        self.execute_all(body, &block_scope)
    }

    pub(super) fn execute(&self, statement: &Statement, scope: &ScopeRef) -> Result<Completion> {
        match statement {
            Statement::VariableDeclaration(decl) => {
                self.declare_variables(decl, scope)?;
                Ok(Completion::Normal)
            }
            // Bound when the enclosing body was entered.
            Statement::FunctionDeclaration(_) => Ok(Completion::Normal),
            Statement::Expression(expression) => {
                self.evaluate(expression, scope)?;
                Ok(Completion::Normal)
            }
            Statement::Block(body) => self.execute_block(body, scope),
            Statement::If(stmt) => {
                if self.evaluate(&stmt.test, scope)?.to_boolean() {
                    self.execute(&stmt.consequent, scope)
                } else if let Some(alternate) = &stmt.alternate {
                    self.execute(alternate, scope)
                } else {
                    Ok(Completion::Normal)
                }
            }
            Statement::While(stmt) => {
                while self.evaluate(&stmt.test, scope)?.to_boolean() {
                    match self.execute(&stmt.body, scope)? {
                        Completion::Break => break,
                        Completion::Return(value) => return Ok(Completion::Return(value)),
                        Completion::Normal | Completion::Continue => {}
                    }
                }
                Ok(Completion::Normal)
            }
            Statement::For(stmt) => {
                let loop_scope = Scope::child(scope);
                if let Some(init) = &stmt.init {
                    self.execute(init, &loop_scope)?;
                }
                loop {
                    if let Some(test) = &stmt.test {
                        if !self.evaluate(test, &loop_scope)?.to_boolean() {
                            break;
                        }
                    }
                    match self.execute(&stmt.body, &loop_scope)? {
                        Completion::Break => break,
                        Completion::Return(value) => return Ok(Completion::Return(value)),
                        Completion::Normal | Completion::Continue => {}
                    }
                    if let Some(update) = &stmt.update {
                        self.evaluate(update, &loop_scope)?;
                    }
                }
                Ok(Completion::Normal)
            }
            Statement::Return(argument) => {
                let value = match argument {
                    Some(expression) => self.evaluate(expression, scope)?,
                    None => Value::Undefined,
                };
                Ok(Completion::Return(value))
            }
            Statement::Break => Ok(Completion::Break),
            Statement::Continue => Ok(Completion::Continue),
            Statement::Throw(expression) => {
                let value = self.evaluate(expression, scope)?;
                Err(Error::Thrown(value))
            }
            Statement::Try(stmt) => {
                let outcome = match (self.execute_block(&stmt.block, scope), &stmt.handler) {
                    (Err(error), Some(handler)) => {
                        let catch_scope = Scope::child(scope);
                        if let Some(param) = &handler.param {
                            catch_scope
                                .borrow_mut()
                                .declare(param.as_str(), error.into_value(), true);
                        }
                        self.execute_block(&handler.body, &catch_scope)
                    }
                    (outcome, _) => outcome,
                };

                if let Some(finalizer) = &stmt.finalizer {
                    match self.execute_block(finalizer, scope)? {
                        Completion::Normal => {}
                        abrupt => return Ok(abrupt),
                    }
                }
                outcome
            }
            Statement::Empty => Ok(Completion::Normal),
        }
    }

    fn declare_variables(&self, decl: &VariableDeclaration, scope: &ScopeRef) -> Result<()> {
        for declarator in &decl.declarations {
            match decl.kind {
                VariableKind::Var => {
                    if let Some(init) = &declarator.init {
                        let value = self.evaluate(init, scope)?;
                        scope::assign(scope, &declarator.name, value)?;
                    }
                }
                VariableKind::Let | VariableKind::Const => {
                    let value = match &declarator.init {
                        Some(init) => self.evaluate(init, scope)?,
                        None => Value::Undefined,
                    };
                    let mutable = decl.kind == VariableKind::Let;
                    scope
                        .borrow_mut()
                        .declare(declarator.name.as_str(), value, mutable);
                }
            }
        }
        Ok(())
    }
}
