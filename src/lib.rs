//! # Single-file component documentation
//!
//! Statically extracts the public surface of a component file (props, data,
//! computed values, methods, emitted events, slots and the `v-model` binding)
//! without executing any of its code.
//!
//! ## Pipeline
//!
//! 1. **Validation**: [`ParserOptions`] are checked and the source is loaded
//!    before anything is analysed. Bad options fail with a [`ConfigError`].
//! 2. **Sections**: the file is split into its `<template>` and `<script>` blocks.
//! 3. **Script**: the exported component object is walked option by option.
//!    Identifiers are resolved through a binding table built from the
//!    declarations seen so far, so aliased constants and destructured values
//!    are followed back to their literal.
//! 4. **Template**: `<slot>` elements and `@event` bindings are collected in
//!    document order.
//! 5. **Emission**: every entry is dispatched to the listeners of its channel
//!    in a fixed category order, then `end` fires exactly once.
//!
//! Problems that do not stop the walk are reported as [`Diagnostic`]s.

mod component;
mod context;
mod emitter;
mod entry;
mod events;
mod function;
mod jsdoc;
mod parser;
mod scope;
mod sfc;
mod template;
mod validate;
mod value;
mod visitor;

#[cfg(feature = "napi")]
mod binding;


pub use emitter::{Channel, Dispatcher, EntryEvent};
pub use entry::*;
pub use jsdoc::DocComment;
pub use parser::{parse_component, ComponentDoc, Parser};
pub use scope::ScopeResolver;
pub use validate::{ConfigError, Diagnostic, FeatureSet, ParserOptions, ValidatedOptions};
pub use value::{Binding, Lookup, Properties, ResolvedValue, ScopeTable, ValueType};

#[cfg(feature = "napi")]
pub use binding::parse_component_native;
