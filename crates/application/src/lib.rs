//! Application services and ports.

#![forbid(unsafe_code)]

mod delayed_task;
mod file_staging;
mod form_engine;
mod form_ports;
mod form_render;
mod modal_state;
mod pagination_control;
mod search_ports;
mod search_sync;

pub use file_staging::FileStaging;
pub use form_engine::{DEFAULT_SUCCESS_DISMISS, FormEngine, FormOptions, FormSnapshot};
pub use form_ports::{AutoClose, FieldView, FormRenderer, SubmitHandler};
pub use form_render::render_form;
pub use modal_state::{ModalState, modal_key};
pub use pagination_control::PaginationControl;
pub use search_ports::QueryNavigator;
pub use search_sync::{DEFAULT_SEARCH_DEBOUNCE, SearchSync};
