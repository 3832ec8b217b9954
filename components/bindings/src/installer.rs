//! Dependency-ordered installation of the exposed types.

use crate::object::Property;
use crate::type_registry::{TypeRecord, TypeTable};
use crate::wrapper_types::{STANDARD_TYPES, WINDOW};
use crate::{BindingError, BindingResult, ScriptContext};
use core_types::Value;

/// Installs a table of types into a context, parents before children.
///
/// # Examples
///
/// ```
/// use bindings::{BindingInstaller, ContextOptions, ScriptContext, STANDARD_TYPES};
///
/// let installer = BindingInstaller::new(&STANDARD_TYPES).unwrap();
/// let mut ctx = ScriptContext::new(ContextOptions::default());
/// installer.install(&mut ctx).unwrap();
/// assert!(ctx.is_installed());
/// ```
#[derive(Debug, Clone)]
pub struct BindingInstaller {
    order: Vec<&'static TypeRecord>,
}

impl BindingInstaller {
    /// Validates `table` and orders its records by ancestor depth.
    ///
    /// The sort is stable, so records of equal depth keep table order.
    pub fn new(table: &TypeTable) -> BindingResult<Self> {
        table.validate()?;
        let mut order: Vec<_> = table.iter().collect();
        order.sort_by_key(|record| record.depth());
        Ok(Self { order })
    }

    /// Uses `order` as given, without validation or sorting.
    ///
    /// Installing fails with [`BindingError::ParentNotInstalled`] at the
    /// first record whose parent comes later.
    pub fn from_order(order: Vec<&'static TypeRecord>) -> Self {
        Self { order }
    }

    /// The installation order.
    pub fn order(&self) -> &[&'static TypeRecord] {
        &self.order
    }

    /// Installs every type, registers each constructor on the global object
    /// and gives the global object the `Window` prototype.
    ///
    /// A context accepts exactly one installation.
    pub fn install(&self, ctx: &mut ScriptContext) -> BindingResult<()> {
        if ctx.is_disposed() {
            return Err(BindingError::ContextDisposed);
        }
        if ctx.is_installed() {
            return Err(BindingError::AlreadyInstalled);
        }
        let global = ctx.global();
        for &record in &self.order {
            let entry = ctx.install_type(record)?;
            ctx.define_property(
                global,
                record.name,
                Property::Data(Value::Object(entry.constructor)),
            )?;
            log::debug!("installed {} (depth {})", record.name, record.depth());
        }
        if let Some(window) = ctx.type_cache().get(&WINDOW) {
            ctx.set_prototype_of(global, Some(window.prototype))?;
        }
        ctx.define_property(global, "window", Property::Data(Value::Object(global)))?;
        ctx.define_property(global, "globalThis", Property::Data(Value::Object(global)))?;
        ctx.mark_installed();
        log::debug!("installed {} types into context {:#x}", self.order.len(), ctx.id());
        Ok(())
    }
}

/// Installs every standard type into `ctx`. Call once per context, before
/// any script runs.
pub fn install_bindings(ctx: &mut ScriptContext) -> BindingResult<()> {
    BindingInstaller::new(&STANDARD_TYPES)?.install(ctx)
}
