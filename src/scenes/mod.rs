//! Scenes and stage
//!
//! Multi-step dialogs built from named scenes. A [`Stage`] routes each update
//! into the active scene, which is tracked in the session.

pub mod context;
pub mod scene;
pub mod stage;

pub use context::{SceneContext, SceneRuntime};
pub use scene::{parse_command, ActionHandler, CallbackMatch, EventFilter, Predicate, Scene, Trigger};
pub use stage::{SceneRegistry, Stage, StageMiddleware, StageOptions};
