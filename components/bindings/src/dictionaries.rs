//! Dictionaries exposed by the installed types.

use crate::converter::{FromScriptValue, ToScriptValue};
use crate::dictionary::{optional_member, required_member, Dictionary};
use crate::object::Property;
use crate::ScriptContext;
use core_types::{ExceptionState, JsError, ObjectId, Value};
use memory_manager::{Trace, Visitor};

fn put(ctx: &mut ScriptContext, object: ObjectId, member: &str, value: Value) -> Result<(), JsError> {
    ctx.define_property(object, member, Property::Data(value))
}

/// `EventInit`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventInit {
    /// `bubbles`
    pub bubbles: bool,
    /// `cancelable`
    pub cancelable: bool,
    /// `composed`
    pub composed: bool,
}

impl Dictionary for EventInit {
    const NAME: &'static str = "EventInit";

    fn fill_script_object_with_members(&self, ctx: &mut ScriptContext, object: ObjectId) -> Result<(), JsError> {
        put(ctx, object, "bubbles", Value::Boolean(self.bubbles))?;
        put(ctx, object, "cancelable", Value::Boolean(self.cancelable))?;
        put(ctx, object, "composed", Value::Boolean(self.composed))
    }

    fn fill_members_from_script_object(
        &mut self,
        ctx: &mut ScriptContext,
        object: ObjectId,
        exception_state: &mut ExceptionState,
    ) -> bool {
        optional_member(ctx, object, "bubbles", &mut self.bubbles, exception_state)
            && optional_member(ctx, object, "cancelable", &mut self.cancelable, exception_state)
            && optional_member(ctx, object, "composed", &mut self.composed, exception_state)
    }
}

/// `CustomEventInit`, an [`EventInit`] plus `detail`.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomEventInit {
    /// Inherited members
    pub event_init: EventInit,
    /// `detail`
    pub detail: Value,
}

impl Default for CustomEventInit {
    fn default() -> Self {
        Self {
            event_init: EventInit::default(),
            detail: Value::Null,
        }
    }
}

impl Dictionary for CustomEventInit {
    const NAME: &'static str = "CustomEventInit";

    fn fill_script_object_with_members(&self, ctx: &mut ScriptContext, object: ObjectId) -> Result<(), JsError> {
        self.event_init.fill_script_object_with_members(ctx, object)?;
        put(ctx, object, "detail", self.detail.clone())
    }

    fn fill_members_from_script_object(
        &mut self,
        ctx: &mut ScriptContext,
        object: ObjectId,
        exception_state: &mut ExceptionState,
    ) -> bool {
        self.event_init
            .fill_members_from_script_object(ctx, object, exception_state)
            && optional_member(ctx, object, "detail", &mut self.detail, exception_state)
    }
}

impl Trace for CustomEventInit {
    fn trace(&self, visitor: &mut Visitor) {
        self.detail.trace(visitor);
    }
}

/// `AddEventListenerOptions`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AddEventListenerOptions {
    /// `capture`
    pub capture: bool,
    /// `once`
    pub once: bool,
    /// `passive`; absent means the target decides
    pub passive: Option<bool>,
}

impl Dictionary for AddEventListenerOptions {
    const NAME: &'static str = "AddEventListenerOptions";

    fn fill_script_object_with_members(&self, ctx: &mut ScriptContext, object: ObjectId) -> Result<(), JsError> {
        put(ctx, object, "capture", Value::Boolean(self.capture))?;
        put(ctx, object, "once", Value::Boolean(self.once))?;
        if let Some(passive) = self.passive {
            put(ctx, object, "passive", Value::Boolean(passive))?;
        }
        Ok(())
    }

    fn fill_members_from_script_object(
        &mut self,
        ctx: &mut ScriptContext,
        object: ObjectId,
        exception_state: &mut ExceptionState,
    ) -> bool {
        optional_member(ctx, object, "capture", &mut self.capture, exception_state)
            && optional_member(ctx, object, "once", &mut self.once, exception_state)
            && optional_member(ctx, object, "passive", &mut self.passive, exception_state)
    }
}

/// `ScrollBehavior`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ScrollBehavior {
    /// `"auto"`
    #[default]
    Auto,
    /// `"instant"`
    Instant,
    /// `"smooth"`
    Smooth,
}

impl ScrollBehavior {
    /// The enum string.
    pub fn as_str(self) -> &'static str {
        match self {
            ScrollBehavior::Auto => "auto",
            ScrollBehavior::Instant => "instant",
            ScrollBehavior::Smooth => "smooth",
        }
    }
}

impl FromScriptValue for ScrollBehavior {
    fn from_script_value(_: &mut ScriptContext, value: &Value) -> Result<Self, JsError> {
        match value.to_string().as_str() {
            "auto" => Ok(ScrollBehavior::Auto),
            "instant" => Ok(ScrollBehavior::Instant),
            "smooth" => Ok(ScrollBehavior::Smooth),
            other => Err(JsError::type_error(format!(
                "The provided value '{}' is not a valid enum value of type ScrollBehavior.",
                other
            ))),
        }
    }
}

impl ToScriptValue for ScrollBehavior {
    fn to_script_value(&self, _: &mut ScriptContext) -> Value {
        Value::string(self.as_str())
    }
}

/// `ScrollToOptions`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScrollToOptions {
    /// `left`
    pub left: Option<f64>,
    /// `top`
    pub top: Option<f64>,
    /// `behavior`
    pub behavior: ScrollBehavior,
}

impl Dictionary for ScrollToOptions {
    const NAME: &'static str = "ScrollToOptions";

    fn fill_script_object_with_members(&self, ctx: &mut ScriptContext, object: ObjectId) -> Result<(), JsError> {
        if let Some(left) = self.left {
            put(ctx, object, "left", Value::number(left))?;
        }
        if let Some(top) = self.top {
            put(ctx, object, "top", Value::number(top))?;
        }
        let behavior = self.behavior.to_script_value(ctx);
        put(ctx, object, "behavior", behavior)
    }

    fn fill_members_from_script_object(
        &mut self,
        ctx: &mut ScriptContext,
        object: ObjectId,
        exception_state: &mut ExceptionState,
    ) -> bool {
        optional_member(ctx, object, "left", &mut self.left, exception_state)
            && optional_member(ctx, object, "top", &mut self.top, exception_state)
            && optional_member(ctx, object, "behavior", &mut self.behavior, exception_state)
    }
}

/// `IntersectionObserverEntryInit`. `time`, `target` and `isIntersecting`
/// are required.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IntersectionObserverEntryInit {
    /// `time`
    pub time: f64,
    /// `target`
    pub target: Option<ObjectId>,
    /// `isIntersecting`
    pub is_intersecting: bool,
    /// `intersectionRatio`
    pub intersection_ratio: f64,
}

impl Dictionary for IntersectionObserverEntryInit {
    const NAME: &'static str = "IntersectionObserverEntryInit";
    const HAS_REQUIRED_MEMBERS: bool = true;

    fn fill_script_object_with_members(&self, ctx: &mut ScriptContext, object: ObjectId) -> Result<(), JsError> {
        put(ctx, object, "time", Value::number(self.time))?;
        let target = self.target.ok_or_else(|| {
            JsError::type_error("IntersectionObserverEntryInit.target is required")
        })?;
        put(ctx, object, "target", Value::Object(target))?;
        put(ctx, object, "isIntersecting", Value::Boolean(self.is_intersecting))?;
        put(ctx, object, "intersectionRatio", Value::number(self.intersection_ratio))
    }

    fn fill_members_from_script_object(
        &mut self,
        ctx: &mut ScriptContext,
        object: ObjectId,
        exception_state: &mut ExceptionState,
    ) -> bool {
        let Some(time) = required_member::<f64>(ctx, object, Self::NAME, "time", exception_state) else {
            return false;
        };
        let Some(target) = required_member::<ObjectId>(ctx, object, Self::NAME, "target", exception_state)
        else {
            return false;
        };
        let Some(is_intersecting) =
            required_member::<bool>(ctx, object, Self::NAME, "isIntersecting", exception_state)
        else {
            return false;
        };
        self.time = time;
        self.target = Some(target);
        self.is_intersecting = is_intersecting;
        optional_member(
            ctx,
            object,
            "intersectionRatio",
            &mut self.intersection_ratio,
            exception_state,
        )
    }
}

impl Trace for IntersectionObserverEntryInit {
    fn trace(&self, visitor: &mut Visitor) {
        self.target.trace(visitor);
    }
}
