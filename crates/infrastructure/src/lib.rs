//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod echo_submit_handler;
mod in_memory_query_navigator;
mod json_config_loader;
mod plain_text_form_renderer;

pub use echo_submit_handler::EchoSubmitHandler;
pub use in_memory_query_navigator::InMemoryQueryNavigator;
pub use json_config_loader::{load_field_set, load_param_registry, load_record};
pub use plain_text_form_renderer::PlainTextFormRenderer;
