pub mod capture;
pub mod context;
mod event_handler;
pub mod session;
mod state;
#[cfg(test)]
pub(crate) mod testing;
pub mod view;

pub use capture::{CaptureDevice, CapturePhase, CapturePipeline, DeviceEvent, DeviceHandle};
pub use context::SessionContext;
pub use event_handler::{handle_app_event, handle_device_event};
pub use session::{MessageOrigin, SessionManager};
pub use state::{AppEvent, AppState};
pub use view::{Bubble, BubbleRole, Header, View};
