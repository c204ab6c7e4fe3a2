//! Built-in query functions.

use crate::error::XPathError;
use crate::eval::{Context, Value};

fn arity(name: &str, expected: &'static str, args: &[Value], ok: bool) -> Result<(), XPathError> {
    if ok {
        Ok(())
    } else {
        Err(XPathError::Arity {
            function: name.to_string(),
            expected,
            got: args.len(),
        })
    }
}

/// Calls the built-in function `name` with already evaluated arguments.
pub fn call(name: &str, args: Vec<Value>, ctx: &Context<'_>) -> Result<Value, XPathError> {
    let doc = ctx.doc;
    match name {
        "true" | "false" | "position" | "last" => {
            arity(name, "0", &args, args.is_empty())?;
            Ok(match name {
                "true" => Value::Boolean(true),
                "false" => Value::Boolean(false),
                "position" => Value::Number(ctx.position as f64),
                _ => Value::Number(ctx.size as f64),
            })
        }
        "not" | "boolean" => {
            arity(name, "1", &args, args.len() == 1)?;
            let value = args[0].to_bool();
            Ok(Value::Boolean(if name == "not" { !value } else { value }))
        }
        "number" => {
            arity(name, "0 or 1", &args, args.len() <= 1)?;
            let n = match args.first() {
                Some(arg) => arg.to_number(doc),
                None => Value::NodeSet(vec![ctx.node]).to_number(doc),
            };
            Ok(Value::Number(n))
        }
        "count" => {
            arity(name, "1", &args, args.len() == 1)?;
            match &args[0] {
                Value::NodeSet(nodes) => Ok(Value::Number(nodes.len() as f64)),
                other => Err(XPathError::type_error(format!(
                    "count() expects a node-set, got a {}",
                    other.kind()
                ))),
            }
        }
        "string" | "string-length" => {
            arity(name, "0 or 1", &args, args.len() <= 1)?;
            let text = match args.first() {
                Some(arg) => arg.to_string_value(doc),
                None => doc.string_value(ctx.node).to_string(),
            };
            Ok(if name == "string" {
                Value::String(text)
            } else {
                Value::Number(text.chars().count() as f64)
            })
        }
        "name" => {
            arity(name, "0 or 1", &args, args.len() <= 1)?;
            let node = match args.first() {
                None => Some(ctx.node),
                Some(Value::NodeSet(nodes)) => nodes.first().copied(),
                Some(other) => {
                    return Err(XPathError::type_error(format!(
                        "name() expects a node-set, got a {}",
                        other.kind()
                    )));
                }
            };
            Ok(Value::String(
                node.map(|n| doc.name(n).to_string()).unwrap_or_default(),
            ))
        }
        "contains" | "starts-with" | "ends-with" => {
            arity(name, "2", &args, args.len() == 2)?;
            let haystack = args[0].to_string_value(doc);
            let needle = args[1].to_string_value(doc);
            Ok(Value::Boolean(match name {
                "contains" => haystack.contains(&needle),
                "starts-with" => haystack.starts_with(&needle),
                _ => haystack.ends_with(&needle),
            }))
        }
        _ => Err(XPathError::UnknownFunction(name.to_string())),
    }
}
