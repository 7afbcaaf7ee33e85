//! AMQP 1.0 value algebra.
//!
//! [`Value`] covers every primitive, container, described and composite type of the AMQP
//! 1.0 type system. [`to_vec`], [`encode`], [`from_slice`] and [`decode`] convert values to
//! and from the wire encoding.

// Public mods
pub mod described;
pub mod descriptor;
pub mod dump;
pub mod error;
pub mod format_code;
pub mod primitives;
pub mod value;

pub use described::{Composite, Described};
pub use descriptor::Descriptor;
pub use error::Error;
pub use value::{
    de::{decode, from_slice, MAX_NESTING_DEPTH},
    ser::{encode, to_vec},
    AmqpType, Value,
};

pub mod prelude {
    //! Commonly used items
    pub use super::{
        from_slice, primitives::Symbol, to_vec, AmqpType, Composite, Described, Descriptor,
        Error, Value,
    };
}
