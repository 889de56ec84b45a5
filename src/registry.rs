use std::collections::BTreeMap;

use crate::operators::{FunctionReturn, Operator};

/// Name of the provider shipping the operators in this crate.
pub const PROVIDER_NAME: &str = "cr_xmt";

/// A named group of operators. Operator names are qualified with the
/// provider name when registered, e.g. `cr_xmt/xmt/function-return`.
pub struct Provider {
    name: &'static str,
    operators: Vec<Box<dyn Operator>>,
}

impl Provider {
    pub fn new(name: &'static str, operators: Vec<Box<dyn Operator>>) -> Self {
        Provider { name, operators }
    }

    pub fn xmt() -> Self {
        Provider::new(PROVIDER_NAME, vec![Box::new(FunctionReturn)])
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// Read-only table of operators keyed by qualified name. Build it once and
/// pass it by reference.
pub struct OperatorRegistry {
    operators: BTreeMap<String, Box<dyn Operator>>,
}

impl OperatorRegistry {
    pub fn new(providers: impl IntoIterator<Item = Provider>) -> Self {
        let mut operators = BTreeMap::new();
        for Provider { name: provider, operators: ops } in providers {
            for op in ops {
                let name = qualified_name(provider, op.name());
                if operators.insert(name.clone(), op).is_some() {
                    log::warn!("operator {name} registered twice; keeping the last one");
                }
            }
        }
        OperatorRegistry { operators }
    }

    /// Registry holding this crate's operators.
    pub fn builtin() -> Self {
        OperatorRegistry::new([Provider::xmt()])
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.operators.keys().map(String::as_str)
    }

    pub fn get(&self, name: &str) -> Option<&dyn Operator> {
        self.operators.get(name).map(|op| &**op)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &dyn Operator)> {
        self.operators.iter().map(|(name, op)| (name.as_str(), &**op))
    }

    pub fn len(&self) -> usize {
        self.operators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operators.is_empty()
    }
}

pub fn qualified_name(provider: &str, operator: &str) -> String {
    format!("{provider}/{operator}")
}
