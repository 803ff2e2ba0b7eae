pub mod batcher;
pub mod interactions;
pub mod notify;
pub mod policy;

pub use batcher::{ChangeBatcher, ObserveState};
pub use interactions::InteractionCapturer;
pub use notify::{ChangeNotification, InteractionDetail, InteractionNotification};
pub use policy::CapturePolicyView;
