//! Expression evaluation.

use std::rc::Rc;

use super::{Interpreter, THIS_BINDING};
use crate::ast::{BinaryOp, Expression, Literal, LogicalOp, MemberProperty, UnaryOp, UpdateOp};
use crate::builtins::methods;
use crate::error::{Error, Result};
use crate::runtime::value::number_to_string;
use crate::runtime::{Function, Object, Scope, ScopeRef, Value, scope};

/// A resolved assignment target.
enum Reference {
    Binding(String),
    Property { object: Value, key: String },
}

impl Interpreter {
    pub(super) fn evaluate(&self, expression: &Expression, scope: &ScopeRef) -> Result<Value> {
        match expression {
            Expression::Literal(literal) => Ok(match literal {
                Literal::Number(n) => Value::Number(*n),
                Literal::String(s) => Value::from(s.as_str()),
                Literal::Boolean(b) => Value::Boolean(*b),
                Literal::Null => Value::Null,
                Literal::Undefined => Value::Undefined,
            }),
            Expression::Identifier(name) => {
                scope::lookup(scope, name).ok_or_else(|| Error::Reference(name.clone()))
            }
            Expression::This => Ok(scope::lookup(scope, THIS_BINDING).unwrap_or_default()),
            Expression::Array(elements) => {
                let items = elements
                    .iter()
                    .map(|element| self.evaluate(element, scope))
                    .collect::<Result<Vec<_>>>()?;
                Ok(Value::array(items))
            }
            Expression::Object(properties) => {
                let mut object = Object::new();
                for (key, value) in properties {
                    object.set(key.as_str(), self.evaluate(value, scope)?);
                }
                Ok(Value::from_object(object))
            }
            Expression::Function(literal) => Ok(self.make_closure(literal, scope)),
            Expression::Unary { op, argument } => self.evaluate_unary(*op, argument, scope),
            Expression::Update { op, prefix, target } => {
                let reference = self.resolve_reference(target, scope)?;
                let old = self.read_reference(&reference, scope)?.to_number();
                let new = match op {
                    UpdateOp::Increment => old + 1.0,
                    UpdateOp::Decrement => old - 1.0,
                };
                self.write_reference(&reference, Value::Number(new), scope)?;
                Ok(Value::Number(if *prefix { new } else { old }))
            }
            Expression::Binary { op, left, right } => {
                let left = self.evaluate(left, scope)?;
                let right = self.evaluate(right, scope)?;
                Ok(binary(*op, &left, &right))
            }
            Expression::Logical { op, left, right } => {
                let left = self.evaluate(left, scope)?;
                let short_circuit = match op {
                    LogicalOp::And => !left.to_boolean(),
                    LogicalOp::Or => left.to_boolean(),
                };
                if short_circuit {
                    Ok(left)
                } else {
                    self.evaluate(right, scope)
                }
            }
            Expression::Conditional {
                test,
                consequent,
                alternate,
            } => {
                if self.evaluate(test, scope)?.to_boolean() {
                    self.evaluate(consequent, scope)
                } else {
                    self.evaluate(alternate, scope)
                }
            }
            Expression::Assign { op, target, value } => {
                let reference = self.resolve_reference(target, scope)?;
                let value = match op.binary() {
                    None => self.evaluate(value, scope)?,
                    Some(binary_op) => {
                        let current = self.read_reference(&reference, scope)?;
                        let rhs = self.evaluate(value, scope)?;
                        binary(binary_op, &current, &rhs)
                    }
                };
                self.write_reference(&reference, value.clone(), scope)?;
                Ok(value)
            }
            Expression::Member { object, property } => {
                let object = self.evaluate(object, scope)?;
                let key = self.property_key(property, scope)?;
                get_member(&object, &key)
            }
            Expression::Call {
                callee, arguments, ..
            } => {
                let (function, this) = match callee.as_ref() {
                    Expression::Member { object, property } => {
                        let receiver = self.evaluate(object, scope)?;
                        let key = self.property_key(property, scope)?;
                        (get_member(&receiver, &key)?, receiver)
                    }
                    other => (self.evaluate(other, scope)?, Value::Undefined),
                };
                let args = self.evaluate_arguments(arguments, scope)?;
                if !function.is_callable() {
                    return Err(Error::type_error(format!(
                        "{} is not a function",
                        describe(callee)
                    )));
                }
                self.call(&function, &this, &args)
            }
            Expression::New { callee, arguments } => {
                let constructor = self.evaluate(callee, scope)?;
                let args = self.evaluate_arguments(arguments, scope)?;
                if !constructor.is_callable() {
                    return Err(Error::type_error(format!(
                        "{} is not a constructor",
                        describe(callee)
                    )));
                }
                self.construct(&constructor, &args)
            }
        }
    }

    fn evaluate_arguments(&self, arguments: &[Expression], scope: &ScopeRef) -> Result<Vec<Value>> {
        arguments
            .iter()
            .map(|argument| self.evaluate(argument, scope))
            .collect()
    }

    fn evaluate_unary(&self, op: UnaryOp, argument: &Expression, scope: &ScopeRef) -> Result<Value> {
        if op == UnaryOp::Typeof {
            if let Expression::Identifier(name) = argument {
                let kind = scope::lookup(scope, name).map_or("undefined", |v| v.type_of());
                return Ok(Value::from(kind));
            }
        }
        let value = self.evaluate(argument, scope)?;
        Ok(match op {
            UnaryOp::Not => Value::Boolean(!value.to_boolean()),
            UnaryOp::Minus => Value::Number(-value.to_number()),
            UnaryOp::Plus => Value::Number(value.to_number()),
            UnaryOp::Typeof => Value::from(value.type_of()),
        })
    }

    /// Creates a closure. Named function expressions can refer to
    /// themselves by name.
    fn make_closure(&self, literal: &Rc<crate::ast::FunctionLiteral>, scope: &ScopeRef) -> Value {
        match &literal.name {
            Some(name) => {
                let own_scope = Scope::child(scope);
                let function = Value::Function(Rc::new(Function::script(
                    Rc::clone(literal),
                    Rc::clone(&own_scope),
                )));
                own_scope
                    .borrow_mut()
                    .declare(name.as_str(), function.clone(), false);
                function
            }
            None => Value::Function(Rc::new(Function::script(
                Rc::clone(literal),
                Rc::clone(scope),
            ))),
        }
    }

    fn property_key(&self, property: &MemberProperty, scope: &ScopeRef) -> Result<String> {
        Ok(match property {
            MemberProperty::Named(name) => name.clone(),
            MemberProperty::Computed(expression) => match self.evaluate(expression, scope)? {
                Value::Number(n) => number_to_string(n),
                other => other.to_string(),
            },
        })
    }

    fn resolve_reference(&self, target: &Expression, scope: &ScopeRef) -> Result<Reference> {
        match target {
            Expression::Identifier(name) => Ok(Reference::Binding(name.clone())),
            Expression::Member { object, property } => {
                let object = self.evaluate(object, scope)?;
                let key = self.property_key(property, scope)?;
                Ok(Reference::Property { object, key })
            }
            _ => Err(Error::Syntax {
                message: "Invalid left-hand side in assignment".to_string(),
                line: 0,
                column: 0,
            }),
        }
    }

    fn read_reference(&self, reference: &Reference, scope: &ScopeRef) -> Result<Value> {
        match reference {
            Reference::Binding(name) => {
                scope::lookup(scope, name).ok_or_else(|| Error::Reference(name.clone()))
            }
            Reference::Property { object, key } => get_member(object, key),
        }
    }

    fn write_reference(&self, reference: &Reference, value: Value, scope: &ScopeRef) -> Result<()> {
        match reference {
            Reference::Binding(name) => scope::assign(scope, name, value),
            Reference::Property { object, key } => {
                if object.is_nullish() {
                    return Err(Error::type_error(format!(
                        "Cannot set properties of {} (setting '{}')",
                        object, key
                    )));
                }
                // Writes to primitives are silently dropped.
                object.try_set(key.as_str(), value)?;
                Ok(())
            }
        }
    }
}

/// Reads `object[key]`, falling back to built-in methods.
pub(crate) fn get_member(object: &Value, key: &str) -> Result<Value> {
    if object.is_nullish() {
        return Err(Error::type_error(format!(
            "Cannot read properties of {} (reading '{}')",
            object, key
        )));
    }
    let value = object.get(key);
    if value.is_undefined() {
        if let Some(method) = methods::lookup(object, key) {
            return Ok(method);
        }
    }
    Ok(value)
}

fn binary(op: BinaryOp, left: &Value, right: &Value) -> Value {
    match op {
        BinaryOp::Add => {
            if is_stringy(left) || is_stringy(right) {
                Value::from(format!("{}{}", left, right))
            } else {
                Value::Number(left.to_number() + right.to_number())
            }
        }
        BinaryOp::Sub => Value::Number(left.to_number() - right.to_number()),
        BinaryOp::Mul => Value::Number(left.to_number() * right.to_number()),
        BinaryOp::Div => Value::Number(left.to_number() / right.to_number()),
        BinaryOp::Mod => Value::Number(left.to_number() % right.to_number()),
        BinaryOp::Equal => Value::Boolean(left.loose_equals(right)),
        BinaryOp::NotEqual => Value::Boolean(!left.loose_equals(right)),
        BinaryOp::StrictEqual => Value::Boolean(left.strict_equals(right)),
        BinaryOp::StrictNotEqual => Value::Boolean(!left.strict_equals(right)),
        BinaryOp::Less => compare(left, right, |o| o.is_lt()),
        BinaryOp::LessEqual => compare(left, right, |o| o.is_le()),
        BinaryOp::Greater => compare(left, right, |o| o.is_gt()),
        BinaryOp::GreaterEqual => compare(left, right, |o| o.is_ge()),
    }
}

/// `+` concatenates when either side is a string or a reference type.
fn is_stringy(value: &Value) -> bool {
    matches!(
        value,
        Value::String(_) | Value::Object(_) | Value::Array(_) | Value::Function(_)
    )
}

fn compare(left: &Value, right: &Value, test: fn(std::cmp::Ordering) -> bool) -> Value {
    let ordering = match (left, right) {
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => left.to_number().partial_cmp(&right.to_number()),
    };
    Value::Boolean(ordering.is_some_and(test))
}

/// Source-like description of a callee for error messages.
fn describe(expression: &Expression) -> String {
    match expression {
        Expression::Identifier(name) => name.clone(),
        Expression::This => "this".to_string(),
        Expression::Member { object, property } => match property {
            MemberProperty::Named(name) => format!("{}.{}", describe(object), name),
            MemberProperty::Computed(_) => format!("{}[...]", describe(object)),
        },
        Expression::Call { callee, .. } => format!("{}(...)", describe(callee)),
        _ => "expression".to_string(),
    }
}
