//! Directive evaluator.
//!
//! Walks a parsed [`Template`] against a data root. Rendering is pure:
//! the same template and data always produce the same text, nothing in the
//! template is mutated, and unresolved paths degrade to `Null` (empty
//! output, falsy in conditions) instead of failing.

use std::borrow::Cow;

use mdc_core::{
    Arg, BlockKind, BlockNode, InlineCall, LoopBinding, Node, PathExpr, PathRoot, Template, Value,
};

use crate::helpers::HelperRegistry;

/// One level of the scope chain. `with` and `each` bodies get a new scope
/// whose parent is the enclosing one; loop bindings live on the scope,
/// never on the node.
struct Scope<'s> {
    value: &'s Value,
    frame: Option<LoopFrame>,
    parent: Option<&'s Scope<'s>>,
}

#[derive(Debug, Clone, Copy)]
struct LoopFrame {
    index: usize,
    len: usize,
}

impl LoopFrame {
    fn binding(self, binding: LoopBinding) -> Value {
        match binding {
            LoopBinding::Index => Value::from(self.index as i64),
            LoopBinding::IndexOne => Value::from(self.index as i64 + 1),
            LoopBinding::First => Value::Bool(self.index == 0),
            LoopBinding::Last => Value::Bool(self.index + 1 == self.len),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Renderer<'r> {
    registry: &'r HelperRegistry,
}

impl Default for Renderer<'static> {
    fn default() -> Self {
        Renderer::new(HelperRegistry::global())
    }
}

impl<'r> Renderer<'r> {
    pub fn new(registry: &'r HelperRegistry) -> Self {
        Renderer { registry }
    }

    /// Render `template` with `data` as the root scope.
    pub fn render(&self, template: &Template, data: &Value) -> String {
        let root = Scope {
            value: data,
            frame: None,
            parent: None,
        };
        let mut out = String::new();
        self.render_nodes(&template.nodes, &root, &mut out);
        out
    }

    fn render_nodes(&self, nodes: &[Node], scope: &Scope<'_>, out: &mut String) {
        for node in nodes {
            match node {
                Node::Literal(text) => out.push_str(text),
                Node::Placeholder { path, .. } => out.push_str(&resolve(scope, path).render()),
                Node::Helper(call) => out.push_str(&self.call(call, scope).render()),
                Node::Block(block) => self.render_block(block, scope, out),
            }
        }
    }

    fn render_block(&self, block: &BlockNode, scope: &Scope<'_>, out: &mut String) {
        match block.kind {
            BlockKind::If => {
                let cond = self.first_arg(block, scope).is_truthy();
                self.branch(block, cond, scope, out);
            }
            BlockKind::Or => {
                let cond = block
                    .args
                    .iter()
                    .any(|a| self.eval_arg(a, scope).is_truthy());
                self.branch(block, cond, scope, out);
            }
            BlockKind::And => {
                let cond = block
                    .args
                    .iter()
                    .all(|a| self.eval_arg(a, scope).is_truthy());
                self.branch(block, cond, scope, out);
            }
            BlockKind::Any => {
                let cond = matches!(&*self.first_arg(block, scope), Value::List(items) if !items.is_empty());
                self.branch(block, cond, scope, out);
            }
            BlockKind::With => {
                let value = self.first_arg(block, scope);
                // Falsy values still rebind; only an unresolved path skips.
                if !value.is_null() {
                    let inner = Scope {
                        value: &*value,
                        frame: None,
                        parent: Some(scope),
                    };
                    self.render_nodes(&block.body, &inner, out);
                } else {
                    self.render_nodes(&block.inverse, scope, out);
                }
            }
            BlockKind::Each => {
                let value = self.first_arg(block, scope);
                match &*value {
                    Value::List(items) if !items.is_empty() => {
                        for (index, item) in items.iter().enumerate() {
                            let inner = Scope {
                                value: item,
                                frame: Some(LoopFrame {
                                    index,
                                    len: items.len(),
                                }),
                                parent: Some(scope),
                            };
                            self.render_nodes(&block.body, &inner, out);
                        }
                    }
                    _ => self.render_nodes(&block.inverse, scope, out),
                }
            }
        }
    }

    fn branch(&self, block: &BlockNode, cond: bool, scope: &Scope<'_>, out: &mut String) {
        let nodes = if cond { &block.body } else { &block.inverse };
        self.render_nodes(nodes, scope, out);
    }

    fn first_arg<'s>(&self, block: &BlockNode, scope: &'s Scope<'s>) -> Cow<'s, Value> {
        match block.args.first() {
            Some(arg) => self.eval_arg(arg, scope),
            None => Cow::Owned(Value::Null),
        }
    }

    fn eval_arg<'s>(&self, arg: &Arg, scope: &'s Scope<'s>) -> Cow<'s, Value> {
        match arg {
            Arg::Path(path) => resolve(scope, path),
            Arg::Literal(value) => Cow::Owned(value.clone()),
            Arg::SubExpr(call) => Cow::Owned(self.call(call, scope)),
        }
    }

    fn call(&self, call: &InlineCall, scope: &Scope<'_>) -> Value {
        let args: Vec<Value> = call
            .args
            .iter()
            .map(|a| self.eval_arg(a, scope).into_owned())
            .collect();
        self.registry.call(call.helper, &args)
    }
}

/// Resolve a path against the scope chain. Unresolved paths yield `Null`.
fn resolve<'s>(scope: &'s Scope<'s>, path: &PathExpr) -> Cow<'s, Value> {
    let mut target = scope;
    for _ in 0..path.parents {
        match target.parent {
            Some(parent) => target = parent,
            None => return unresolved(path),
        }
    }

    let start = match path.root {
        PathRoot::Scope => target.value,
        PathRoot::Root => {
            let mut root = target;
            while let Some(parent) = root.parent {
                root = parent;
            }
            root.value
        }
        PathRoot::Binding(binding) => {
            // Innermost loop at or above the target scope.
            let mut cursor = Some(target);
            while let Some(s) = cursor {
                if let Some(frame) = s.frame {
                    return Cow::Owned(frame.binding(binding));
                }
                cursor = s.parent;
            }
            return unresolved(path);
        }
    };

    let mut current = start;
    for segment in &path.segments {
        match current.get(segment) {
            Some(next) => current = next,
            None => return unresolved(path),
        }
    }
    Cow::Borrowed(current)
}

fn unresolved<'s>(path: &PathExpr) -> Cow<'s, Value> {
    tracing::trace!(?path, "unresolved path");
    Cow::Owned(Value::Null)
}
