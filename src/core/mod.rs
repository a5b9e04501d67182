//! Core modules for motionlock

pub mod capabilities;
pub mod threshold;
pub mod guard;
pub mod trigger;
pub mod registration;
pub mod binding;
pub mod service;
pub mod simulated;
pub mod script;

pub use capabilities::{
    Collaborators, FeatureFlag, LockAction, MotionSensor, PowerState, SampleCallback, ScreenState,
    SettingsStore, UserCallback, UserSessionSource,
};
pub use threshold::ThresholdEvaluator;
pub use guard::DeviceStateGuard;
pub use trigger::LockTrigger;
pub use registration::RegistrationController;
pub use binding::{SettingsBinding, desired_registration};
pub use service::{MovementLockService, ServiceHandle, Startup, ControlEvent};
pub use simulated::{SimulatedDevice, DeviceCounters};
pub use script::{ScriptParser, ScriptEvent, FailTarget};
