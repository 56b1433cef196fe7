use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::types::MethodSignature;

/// Method table of one adapter interface, registered up front
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AdapterInterface {
    pub name: String,
    methods: BTreeMap<String, Arc<MethodSignature>>,
}

impl AdapterInterface {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            methods: BTreeMap::new(),
        }
    }

    pub fn with_method(mut self, signature: MethodSignature) -> Self {
        self.methods
            .insert(signature.name.clone(), Arc::new(signature));
        self
    }

    pub fn method(&self, name: &str) -> Result<Arc<MethodSignature>> {
        self.methods
            .get(name)
            .cloned()
            .ok_or_else(|| Error::UnknownMethod {
                adapter: self.name.clone(),
                method: name.to_string(),
            })
    }

    pub fn methods(&self) -> impl Iterator<Item = &MethodSignature> {
        self.methods.values().map(Arc::as_ref)
    }
}
