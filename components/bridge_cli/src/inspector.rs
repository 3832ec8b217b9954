//! Inspection over a context with the standard bindings installed
//!
//! The Inspector owns one context for its lifetime:
//! - type tree and install order come from the standard table
//! - conversions run through the same encode/decode path a host uses

use crate::error::{CliError, CliResult};
use bindings::{
    from_tagged, install_bindings, to_tagged, BindingError, BindingInstaller, ContextOptions,
    ScriptContext, TypeRecord, STANDARD_TYPES,
};
use std::fmt::Write as _;
use value_bridge::{Tag, TaggedValue};

/// Owns an installed context and answers inspection queries
pub struct Inspector {
    ctx: ScriptContext,
    installer: BindingInstaller,
}

impl Inspector {
    /// Create an inspector over a freshly installed context
    ///
    /// # Example
    /// ```
    /// use bindings::ContextOptions;
    /// use bridge_cli::Inspector;
    ///
    /// let inspector = Inspector::new(ContextOptions::default()).unwrap();
    /// assert_eq!(inspector.install_order()[0], "EventTarget");
    /// ```
    pub fn new(options: ContextOptions) -> CliResult<Self> {
        let installer = BindingInstaller::new(&STANDARD_TYPES)?;
        let mut ctx = ScriptContext::new(options);
        install_bindings(&mut ctx)?;
        Ok(Self { ctx, installer })
    }

    /// The inspected context
    pub fn context(&mut self) -> &mut ScriptContext {
        &mut self.ctx
    }

    /// Type names in installation order
    pub fn install_order(&self) -> Vec<&'static str> {
        self.installer.order().iter().map(|record| record.name).collect()
    }

    /// Install order as a JSON array of `{name, class_id, parent}`
    pub fn install_order_json(&self) -> serde_json::Value {
        self.installer
            .order()
            .iter()
            .map(|record| {
                serde_json::json!({
                    "name": record.name,
                    "class_id": record.class_id.0,
                    "parent": record.parent.map(|parent| parent.name),
                })
            })
            .collect()
    }

    /// Indented inheritance tree, roots in installation order
    pub fn type_tree(&self) -> String {
        let mut out = String::new();
        for root in self.installer.order().iter().filter(|r| r.parent.is_none()) {
            write_subtree(&mut out, root, 0);
        }
        out
    }

    /// Decodes `json` as a host value, then encodes the resulting script
    /// value back and describes it
    pub fn convert(&mut self, json: &str) -> CliResult<String> {
        let value = from_tagged(&mut self.ctx, TaggedValue::from_json_text(json.to_string()))?;
        log::debug!("decoded {} value", value.type_of());
        let tagged = to_tagged(&mut self.ctx, &value)?;
        describe(tagged)
    }
}

fn write_subtree(out: &mut String, record: &'static TypeRecord, depth: usize) {
    let _ = writeln!(out, "{}{} ({})", "  ".repeat(depth), record.name, record.class_id);
    for child in STANDARD_TYPES.children_of(record) {
        write_subtree(out, child, depth + 1);
    }
}

/// Human-readable form of a tagged value. Consumes it.
pub fn describe(tagged: TaggedValue) -> CliResult<String> {
    let tag = tagged.tag().map_err(BindingError::from)?;
    let bridge = |err| CliError::Binding(BindingError::Bridge(err));
    Ok(match tag {
        Tag::Null => {
            tagged.free();
            "null".to_string()
        }
        Tag::Bool => format!("bool {}", tagged.into_bool().map_err(bridge)?),
        Tag::Int => format!("int {}", tagged.into_i64().map_err(bridge)?),
        Tag::Float64 => format!("float64 {}", tagged.into_f64().map_err(bridge)?),
        Tag::String => {
            let string = tagged.into_string().map_err(bridge)?;
            format!("string {:?}", string.to_string_lossy())
        }
        Tag::Json => format!("json {}", tagged.into_json_text().map_err(bridge)?),
        Tag::List => {
            let items = tagged.into_list().map_err(bridge)?;
            let mut parts = Vec::with_capacity(items.len());
            let mut items = items.into_iter();
            while let Some(item) = items.next() {
                match describe(item) {
                    Ok(part) => parts.push(part),
                    Err(err) => {
                        items.for_each(TaggedValue::free);
                        return Err(err);
                    }
                }
            }
            format!("list [{}]", parts.join(", "))
        }
        Tag::Pointer => {
            let (address, kind) = tagged.into_pointer().map_err(bridge)?;
            format!("pointer {:?} {:p}", kind, address)
        }
        Tag::Function => format!("function {:p}", tagged.into_function().map_err(bridge)?),
        Tag::AsyncFunction => {
            format!("async function {:p}", tagged.into_async_function().map_err(bridge)?)
        }
    })
}
