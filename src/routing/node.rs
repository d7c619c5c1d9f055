//! Route trie node
//!
//! Each node owns its literal children, at most one dynamic child and,
//! when a registered pattern ends here, the handler for that pattern.

use super::pattern::Segment;
use crate::handler::SharedHandler;
use std::collections::HashMap;

/// Dynamic child together with the parameter name it binds
struct DynamicChild {
    param: String,
    node: RouteNode,
}

#[derive(Default)]
pub struct RouteNode {
    literals: HashMap<String, RouteNode>,
    dynamic: Option<Box<DynamicChild>>,
    handler: Option<SharedHandler>,
}

impl RouteNode {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `handler` at the node addressed by `segments`, returning the
    /// handler it replaced.
    ///
    /// A node has a single dynamic child. Registering a different parameter
    /// name at an existing dynamic position renames that child, so every
    /// route below it binds the newest name.
    pub fn insert(&mut self, segments: &[Segment<'_>], handler: SharedHandler) -> Option<SharedHandler> {
        let mut node = self;
        for segment in segments {
            node = match segment {
                Segment::Literal(text) => node.literals.entry((*text).to_string()).or_default(),
                Segment::Param(name) => {
                    let child = node.dynamic.get_or_insert_with(|| {
                        Box::new(DynamicChild {
                            param: (*name).to_string(),
                            node: Self::new(),
                        })
                    });
                    if child.param != *name {
                        child.param = (*name).to_string();
                    }
                    &mut child.node
                }
            };
        }
        node.handler.replace(handler)
    }

    /// Walk `segments` and return the handler of the landed node.
    ///
    /// A literal child, when present, is always taken; the dynamic child is
    /// used only when no literal child matches the segment. The walk never
    /// revisits a choice, so a dead end below a literal is a miss.
    pub fn find<'n, 'p>(
        &'n self,
        segments: &[&'p str],
        bindings: &mut Vec<(&'n str, &'p str)>,
    ) -> Option<&'n SharedHandler> {
        let Some((first, rest)) = segments.split_first() else {
            return self.handler.as_ref();
        };

        if let Some(child) = self.literals.get(*first) {
            return child.find(rest, bindings);
        }

        let dynamic = self.dynamic.as_ref()?;
        bindings.push((dynamic.param.as_str(), *first));
        dynamic.node.find(rest, bindings)
    }

    /// Collect `(pattern, handler)` for every terminal node below this one
    pub fn collect(&self, prefix: &str, out: &mut Vec<(String, SharedHandler)>) {
        if let Some(handler) = &self.handler {
            let pattern = if prefix.is_empty() { "/" } else { prefix };
            out.push((pattern.to_string(), handler.clone()));
        }
        for (text, child) in &self.literals {
            child.collect(&format!("{prefix}/{text}"), out);
        }
        if let Some(dynamic) = &self.dynamic {
            dynamic
                .node
                .collect(&format!("{prefix}/:{}", dynamic.param), out);
        }
    }
}
