//! Role-specific callback capability sets (§4.5, §9).
//!
//! "Void-pointer callback tables map to tagged role enums carrying a
//! capability set whose members are the per-command handlers" (§9). In
//! idiomatic Rust that capability set is a struct of optional boxed
//! closures with builder-style setters — no `void *` context pointer is
//! needed since a closure already captures whatever state it wants.
//!
//! A command whose callback slot is `None` gets the "missing callback"
//! treatment from the dispatcher: a default `ACK` with no payload
//! (§4.5: "ignoring the event silently is intentional").

use crate::wire::{BufDescriptor, BufOffsets, DeviceFeatures, DeviceParams};

/// Outcome of a command handler: success carries the value the
/// dispatcher packs into the `ACK` payload; failure carries the
/// negative error the dispatcher packs into a `NAK` (§4.5's response
/// generation policy).
pub enum Outcome<T> {
    Success(T),
    Failure(i32),
}

impl<T> Outcome<T> {
    pub fn ok(value: T) -> Self {
        Outcome::Success(value)
    }

    pub fn err(code: i32) -> Self {
        debug_assert!(code < 0, "Outcome::err expects a negative error code");
        Outcome::Failure(code)
    }
}

type Handler<A, T> = Box<dyn Fn(A) -> Outcome<T> + Send + Sync>;
type Notify<A> = Box<dyn Fn(A) + Send + Sync>;

/// Handlers a device-role instance exposes for the application-driven
/// command table, plus the response hooks for its own outbound
/// notifications (§4.5's device-role table, `icap_device_callbacks`).
#[derive(Default)]
pub struct DeviceCallbacks {
    pub(crate) get_dev_num: Option<Handler<(), u32>>,
    pub(crate) get_dev_features: Option<Handler<u32, DeviceFeatures>>,
    pub(crate) dev_init: Option<Handler<DeviceParams, ()>>,
    pub(crate) dev_deinit: Option<Handler<u32, ()>>,
    pub(crate) add_src: Option<Handler<BufDescriptor, u32>>,
    pub(crate) add_dst: Option<Handler<BufDescriptor, u32>>,
    pub(crate) remove_src: Option<Handler<u32, ()>>,
    pub(crate) remove_dst: Option<Handler<u32, ()>>,
    pub(crate) start: Option<Handler<u32, ()>>,
    pub(crate) stop: Option<Handler<u32, ()>>,
    pub(crate) pause: Option<Handler<u32, ()>>,
    pub(crate) resume: Option<Handler<u32, ()>>,
    pub(crate) buf_offsets: Option<Handler<BufOffsets, ()>>,
    /// `ERROR` is fire-and-forget on the device-role table (§4.5: "no
    /// response expected"), so this is a notify, not a `Handler`.
    pub(crate) error: Option<Notify<i32>>,
    /// Response to the device's own `FRAG_READY` notification.
    pub(crate) frag_ready_response: Option<Notify<u32>>,
    /// Response to the device's own `XRUN` notification.
    pub(crate) xrun_response: Option<Notify<u32>>,
    /// Response to the device's own `ERROR` notification.
    pub(crate) error_response: Option<Notify<i32>>,
}

macro_rules! on_handler {
    ($name:ident, $field:ident, $arg:ty, $ret:ty) => {
        pub fn $name(mut self, f: impl Fn($arg) -> Outcome<$ret> + Send + Sync + 'static) -> Self {
            self.$field = Some(Box::new(f));
            self
        }
    };
}

macro_rules! on_notify {
    ($name:ident, $field:ident, $arg:ty) => {
        pub fn $name(mut self, f: impl Fn($arg) + Send + Sync + 'static) -> Self {
            self.$field = Some(Box::new(f));
            self
        }
    };
}

impl DeviceCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    on_handler!(on_get_dev_num, get_dev_num, (), u32);
    on_handler!(on_get_dev_features, get_dev_features, u32, DeviceFeatures);
    on_handler!(on_dev_init, dev_init, DeviceParams, ());
    on_handler!(on_dev_deinit, dev_deinit, u32, ());
    on_handler!(on_add_src, add_src, BufDescriptor, u32);
    on_handler!(on_add_dst, add_dst, BufDescriptor, u32);
    on_handler!(on_remove_src, remove_src, u32, ());
    on_handler!(on_remove_dst, remove_dst, u32, ());
    on_handler!(on_start, start, u32, ());
    on_handler!(on_stop, stop, u32, ());
    on_handler!(on_pause, pause, u32, ());
    on_handler!(on_resume, resume, u32, ());
    on_handler!(on_buf_offsets, buf_offsets, BufOffsets, ());
    on_notify!(on_error, error, i32);
    on_notify!(on_frag_ready_response, frag_ready_response, u32);
    on_notify!(on_xrun_response, xrun_response, u32);
    on_notify!(on_error_response, error_response, i32);
}

/// Handlers an application-role instance exposes for the device-driven
/// notification table (§4.5's application-role table,
/// `icap_application_callbacks`, collapsed per SPEC_FULL.md §10.5).
#[derive(Default)]
pub struct ApplicationCallbacks {
    pub(crate) frag_ready: Option<Handler<crate::wire::BufFrags, u32>>,
    pub(crate) xrun: Option<Handler<crate::wire::BufFrags, u32>>,
    pub(crate) error: Option<Handler<i32, ()>>,
}

impl ApplicationCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    on_handler!(on_frag_ready, frag_ready, crate::wire::BufFrags, u32);
    on_handler!(on_xrun, xrun, crate::wire::BufFrags, u32);
    on_handler!(on_error, error, i32, ());
}
