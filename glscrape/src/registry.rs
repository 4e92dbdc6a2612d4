//! Type registry: which names are opaque handles, data structs or callbacks.
//!
//! Registration and lookup are separate types. Every source in a run is
//! scanned into a [`TypeRegistryBuilder`] first; [`TypeRegistryBuilder::freeze`]
//! then produces the read-only [`TypeRegistry`] the converter consults. Headers
//! forward-reference their own types all the time, so no conversion may start
//! before the whole input has been registered.

use std::collections::HashSet;

use tracing::{debug, warn};

use crate::model::{Signature, StructDef};

/// Collects type definitions during the registration phase.
#[derive(Debug, Default)]
pub struct TypeRegistryBuilder {
    opaque_structs: HashSet<String>,
    data_structs: HashSet<String>,
    callbacks: Vec<Signature>,
}

impl TypeRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a typedef that is only ever used through a pointer.
    pub fn register_opaque_struct(&mut self, alias: &str) {
        if self.opaque_structs.insert(alias.to_string()) {
            debug!(name = alias, "registered opaque struct");
        }
    }

    /// Record the typedef alias of every struct with a known layout.
    pub fn register_data_structs(&mut self, structs: &[StructDef]) {
        for s in structs {
            self.data_structs.insert(s.typedef_alias.clone());
        }
        debug!(count = structs.len(), "registered data structs");
    }

    /// Record a callback typedef. Order of registration is kept.
    pub fn register_callback(&mut self, signature: Signature) {
        if self.callbacks.iter().any(|c| c.name == signature.name) {
            debug!(name = %signature.name, "callback already registered");
            return;
        }
        debug!(name = %signature.name, params = signature.params.len(), "registered callback");
        self.callbacks.push(signature);
    }

    /// End the registration phase.
    ///
    /// Makes the three name sets disjoint: a forward `typedef struct X X;`
    /// followed by a full definition of `X` leaves `X` a data struct, and a
    /// callback shadowing a struct name is dropped.
    pub fn freeze(self) -> TypeRegistry {
        let TypeRegistryBuilder {
            mut opaque_structs,
            data_structs,
            callbacks,
        } = self;

        opaque_structs.retain(|name| {
            let shadowed = data_structs.contains(name);
            if shadowed {
                debug!(name = %name, "forward-declared struct has a layout, keeping it as data");
            }
            !shadowed
        });

        let callbacks = callbacks
            .into_iter()
            .filter(|cb| {
                let clash = opaque_structs.contains(&cb.name) || data_structs.contains(&cb.name);
                if clash {
                    warn!(name = %cb.name, "dropping callback typedef that collides with a struct");
                }
                !clash
            })
            .collect();

        TypeRegistry {
            opaque_structs,
            data_structs,
            callbacks,
        }
    }
}

/// Read-only registry used during conversion.
#[derive(Debug, Default)]
pub struct TypeRegistry {
    opaque_structs: HashSet<String>,
    data_structs: HashSet<String>,
    callbacks: Vec<Signature>,
}

impl TypeRegistry {
    pub fn is_opaque_struct(&self, name: &str) -> bool {
        self.opaque_structs.contains(name)
    }

    pub fn is_data_struct(&self, name: &str) -> bool {
        self.data_structs.contains(name)
    }

    pub fn callback(&self, name: &str) -> Option<&Signature> {
        self.callbacks.iter().find(|c| c.name == name)
    }

    /// Callback typedefs in the order they were declared.
    pub fn callbacks(&self) -> &[Signature] {
        &self.callbacks
    }
}
